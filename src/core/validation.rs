//! Validation for node names
//!
//! Names are single path segments: ASCII letters, digits, `_` and `.` only.
//! The special segments `.` and `..` are reserved for path navigation.

use crate::core::error::{FsError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Pattern for valid node names
const NAME_PATTERN: &str = r"^[A-Za-z0-9_.]+$";

/// Maximum name length in bytes
pub const MAX_NAME_LENGTH: usize = 255;

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NAME_PATTERN).expect("NAME_PATTERN is a valid regex"))
}

/// Validate a file or directory name
///
/// # Examples
///
/// ```
/// use sectorfs::core::validation::validate_name;
///
/// assert!(validate_name("notes.txt").is_ok());
/// assert!(validate_name("my_dir").is_ok());
///
/// assert!(validate_name("..").is_err());
/// assert!(validate_name("a/b").is_err());
/// assert!(validate_name("has space").is_err());
/// ```
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FsError::InvalidName("name cannot be empty".to_string()));
    }

    if name == "." || name == ".." {
        return Err(FsError::InvalidName(format!("'{}' is reserved", name)));
    }

    if name.len() > MAX_NAME_LENGTH {
        return Err(FsError::InvalidName(format!(
            "name too long (max {} characters)",
            MAX_NAME_LENGTH
        )));
    }

    if !name_regex().is_match(name) {
        return Err(FsError::InvalidName(format!(
            "'{}' may only contain letters, digits, '_' and '.'",
            name
        )));
    }

    Ok(())
}
