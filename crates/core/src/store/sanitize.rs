//! ANSI escape sequence removal for captured output.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// CSI sequences (colors, cursor movement), OSC sequences terminated by BEL
/// or ST, two-byte escapes and stray ESC bytes, in that order of preference.
#[allow(clippy::unwrap_used)]
static ANSI_ESCAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-Z\\-_]|\x1b").unwrap()
});

/// Strip ANSI escape sequences and trailing carriage returns from a line.
pub fn strip_ansi(line: &str) -> String {
    let trimmed = line.trim_end_matches(['\r', '\n']);
    match ANSI_ESCAPE.replace_all(trimmed, "") {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(strip_ansi("hello world"), "hello world");
        assert_eq!(strip_ansi(""), "");
    }

    #[test]
    fn test_strips_color_codes() {
        assert_eq!(strip_ansi("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_ansi("\x1b[1;32mbold green\x1b[m done"), "bold green done");
    }

    #[test]
    fn test_strips_cursor_control() {
        assert_eq!(strip_ansi("\x1b[2K\x1b[1Gprogress 50%"), "progress 50%");
        assert_eq!(strip_ansi("\x1b[?25lhidden cursor\x1b[?25h"), "hidden cursor");
    }

    #[test]
    fn test_strips_osc_sequences() {
        assert_eq!(strip_ansi("\x1b]0;window title\x07text"), "text");
        assert_eq!(strip_ansi("\x1b]8;;http://x\x1b\\link\x1b]8;;\x1b\\"), "link");
    }

    #[test]
    fn test_strips_two_byte_escapes_and_stray_esc() {
        assert_eq!(strip_ansi("a\x1bMb"), "ab");
        assert_eq!(strip_ansi("trailing\x1b"), "trailing");
    }

    #[test]
    fn test_trims_line_endings() {
        assert_eq!(strip_ansi("line\r\n"), "line");
        assert_eq!(strip_ansi("tqdm 10%\r"), "tqdm 10%");
    }
}
