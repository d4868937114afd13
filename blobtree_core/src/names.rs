//! File name legality and name comparison.

use crate::error::{Error, Result};

/// Maximum length of a single file name in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Characters that may not appear in a portable file name.
pub const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Returns true if `name` can be used as a single file or directory name.
///
/// Rejects empty names, `.` and `..`, names longer than [`MAX_NAME_LEN`]
/// bytes, control characters and any of [`INVALID_NAME_CHARS`].
pub fn is_legal_file_name(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }

    if name.len() > MAX_NAME_LEN {
        return false;
    }

    !name
        .chars()
        .any(|c| c.is_control() || INVALID_NAME_CHARS.contains(&c))
}

/// Fails with [`Error::IllegalFileName`] unless `name` is legal.
pub fn validate_file_name(name: &str) -> Result<()> {
    if is_legal_file_name(name) {
        Ok(())
    } else {
        Err(Error::illegal_file_name(name))
    }
}

/// Compare two names, optionally ignoring case.
pub fn names_equal(a: &str, b: &str, ignore_case: bool) -> bool {
    if ignore_case {
        a == b || a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}
