//! Process-state signaling capability.
//!
//! Step programs are opaque, so pausing one means suspending it at the OS
//! level. This is only possible where POSIX job-control signals exist; other
//! platforms get an implementation that reports `ControlError::Unsupported`.

use super::error::ControlError;
use std::sync::Arc;

/// Delivers suspend/continue/terminate requests to a child process group.
///
/// Children are spawned as leaders of their own process group, so `pid` is
/// also the group id and the signal reaches grandchildren (encoders, ...).
pub trait ProcessSignals: Send + Sync {
    fn suspend(&self, pid: u32) -> Result<(), ControlError>;
    fn resume(&self, pid: u32) -> Result<(), ControlError>;
    /// Graceful termination request, not a forced kill.
    fn terminate(&self, pid: u32) -> Result<(), ControlError>;
}

/// Signals for the host platform.
pub fn platform_signals() -> Arc<dyn ProcessSignals> {
    #[cfg(unix)]
    {
        Arc::new(PosixSignals)
    }
    #[cfg(not(unix))]
    {
        Arc::new(UnsupportedSignals)
    }
}

#[cfg(unix)]
pub use posix::PosixSignals;

#[cfg(unix)]
mod posix {
    use super::{ControlError, ProcessSignals};
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    /// SIGSTOP / SIGCONT / SIGTERM sent to the child's process group.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PosixSignals;

    impl PosixSignals {
        fn send(pid: u32, signal: Signal, name: &'static str) -> Result<(), ControlError> {
            let raw = i32::try_from(pid).map_err(|_| ControlError::Signal {
                signal: name,
                pid,
                reason: "pid out of range".to_string(),
            })?;
            killpg(Pid::from_raw(raw), signal).map_err(|errno| match errno {
                Errno::ESRCH => ControlError::ProcessGone(pid),
                errno => ControlError::Signal {
                    signal: name,
                    pid,
                    reason: errno.desc().to_string(),
                },
            })
        }
    }

    impl ProcessSignals for PosixSignals {
        fn suspend(&self, pid: u32) -> Result<(), ControlError> {
            Self::send(pid, Signal::SIGSTOP, "SIGSTOP")
        }

        fn resume(&self, pid: u32) -> Result<(), ControlError> {
            Self::send(pid, Signal::SIGCONT, "SIGCONT")
        }

        fn terminate(&self, pid: u32) -> Result<(), ControlError> {
            Self::send(pid, Signal::SIGTERM, "SIGTERM")
        }
    }
}

/// Implementation for platforms without job-control signals.
///
/// `terminate` is also reported as unsupported; the supervisor then falls
/// back to killing the child through its handle.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedSignals;

impl ProcessSignals for UnsupportedSignals {
    fn suspend(&self, _pid: u32) -> Result<(), ControlError> {
        Err(ControlError::Unsupported("suspend"))
    }

    fn resume(&self, _pid: u32) -> Result<(), ControlError> {
        Err(ControlError::Unsupported("resume"))
    }

    fn terminate(&self, _pid: u32) -> Result<(), ControlError> {
        Err(ControlError::Unsupported("terminate"))
    }
}
