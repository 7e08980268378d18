//! Ref name validation following git-style conventions.
//!
//! Valid ref names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot)
//! - Must not start or end with `.` or `/`
//! - Must not contain consecutive slashes (`//`)
//! - Components between slashes must be non-empty and not start with `.`

use crate::error::{RefError, Result};

/// Characters that are forbidden anywhere in a ref name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

/// Validate a ref name, returning `Ok(())` if valid.
///
/// Follows git-style naming conventions to prevent ambiguity and filesystem
/// issues in file-backed ref stores.
///
/// # Examples
///
/// ```
/// use vhs_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("main").is_ok());
/// assert!(validate_ref_name("project/maps").is_ok());
/// assert!(validate_ref_name("").is_err());
/// assert!(validate_ref_name("bad..name").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RefError::InvalidName {
            name: name.to_string(),
            reason: "ref name must not be empty".into(),
        });
    }

    // Check for forbidden characters.
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(RefError::InvalidName {
                name: name.to_string(),
                reason: format!("contains forbidden character: {ch:?}"),
            });
        }
    }

    // Must not contain `..` (parent traversal).
    if name.contains("..") {
        return Err(RefError::InvalidName {
            name: name.to_string(),
            reason: "must not contain '..'".into(),
        });
    }

    // Must not start or end with `.`.
    if name.starts_with('.') || name.ends_with('.') {
        return Err(RefError::InvalidName {
            name: name.to_string(),
            reason: "must not start or end with '.'".into(),
        });
    }

    // Must not start or end with `/`.
    if name.starts_with('/') || name.ends_with('/') {
        return Err(RefError::InvalidName {
            name: name.to_string(),
            reason: "must not start or end with '/'".into(),
        });
    }

    // Must not contain consecutive slashes.
    if name.contains("//") {
        return Err(RefError::InvalidName {
            name: name.to_string(),
            reason: "must not contain consecutive slashes '//'".into(),
        });
    }

    // Path components between slashes must be non-empty and not start with `.`.
    for component in name.split('/') {
        if component.is_empty() {
            return Err(RefError::InvalidName {
                name: name.to_string(),
                reason: "path components must not be empty".into(),
            });
        }
        if component.starts_with('.') {
            return Err(RefError::InvalidName {
                name: name.to_string(),
                reason: format!("component must not start with '.': {component:?}"),
            });
        }
    }

    Ok(())
}
