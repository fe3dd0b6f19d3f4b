//! Text sanitization for log entries.
//!
//! Absolute filesystem paths must never survive into the session log, which
//! gets shipped downstream as model context. Both drive-letter style
//! (`C:\Users\...`) and POSIX style (`/home/...`) are replaced with a
//! redaction marker before an entry is stored.

use std::sync::LazyLock;

use regex::Regex;

pub const REDACTION_MARKER: &str = "[REDACTED_PATH]";

static DRIVE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[A-Za-z]:\\[^\s"'<>]*"#).expect("valid pattern"));

static POSIX_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"/(?:[^\s"'<>]+/?)+"#).expect("valid pattern"));

/// Replace absolute filesystem paths in `text` with [`REDACTION_MARKER`].
pub fn redact_paths(text: &str) -> String {
    let pass = DRIVE_PATH.replace_all(text, REDACTION_MARKER);
    POSIX_PATH.replace_all(&pass, REDACTION_MARKER).into_owned()
}
