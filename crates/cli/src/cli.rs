use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "reel-panel",
    about = "Control panel for the video generation pipeline.",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Options for the default `serve` command.
    #[command(flatten)]
    pub serve: ServeArgs,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP control panel (default).
    Serve(ServeArgs),
    /// Print the pipeline steps and the command each one runs.
    Steps {
        /// Project root holding `backend/scripts` and `output`.
        #[arg(long, value_hint = ValueHint::DirPath)]
        root: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// First port to try; the next ones are tried while it is in use.
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Project root holding `backend/scripts` and `output`.
    ///
    /// Defaults to the current directory.
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub root: Option<PathBuf>,

    /// Configuration file; defaults to `<root>/reel-panel.toml` if present.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}
