//! Audit and state path resolution.
//!
//! Layout:
//!
//! ```text
//! audit/
//!   match-audit-YYYY-MM-DD.jsonl
//!   .state/
//!     last-run-state.json
//!     last-run-state.json.lock
//! ```

use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDate;

/// Default audit directory when neither `--audit-dir` nor `AUDIT_DIR` is set.
pub const DEFAULT_AUDIT_DIR: &str = "./audit";

/// State file path relative to the audit directory.
pub const DEFAULT_STATE_REL: &str = ".state/last-run-state.json";

/// Audit file name for a UTC day.
#[must_use]
pub fn audit_file_name(day: NaiveDate) -> String {
    format!("match-audit-{}.jsonl", day.format("%Y-%m-%d"))
}

/// Full path of the audit file for a UTC day.
#[must_use]
pub fn audit_file_for(audit_dir: &Utf8Path, day: NaiveDate) -> Utf8PathBuf {
    audit_dir.join(audit_file_name(day))
}

/// Default state file path under an audit directory.
#[must_use]
pub fn default_state_file(audit_dir: &Utf8Path) -> Utf8PathBuf {
    audit_dir.join(DEFAULT_STATE_REL)
}

/// Sidecar lock file path for a state file.
#[must_use]
pub fn lock_file_for(state_file: &Utf8Path) -> Utf8PathBuf {
    let mut name = state_file
        .file_name()
        .unwrap_or("last-run-state.json")
        .to_string();
    name.push_str(".lock");
    state_file.with_file_name(name)
}

/// Ensure a directory exists, tolerating concurrent creation.
pub fn ensure_dir_all(path: &Utf8Path) -> io::Result<()> {
    if !path.as_std_path().exists() {
        fs::create_dir_all(path.as_std_path())?;
    }
    Ok(())
}
