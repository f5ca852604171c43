//! Field-level checks mirroring the column constraints in `migrations/`.

use crate::error::{AppError, Result};

/// Max length of a slug column
pub const SLUG_MAX_LEN: usize = 50;

/// Require a non-blank value no longer than `max` characters.
pub fn require_text(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    check_len(field, value, max)
}

/// Normalize an optional text field: blank input becomes `None`.
pub fn optional_text(field: &str, value: Option<String>, max: usize) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Ok(None),
        Some(v) => {
            check_len(field, &v, max)?;
            Ok(Some(v))
        }
        None => Ok(None),
    }
}

pub fn check_len(field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Slugs are ASCII letters, digits, hyphens and underscores.
pub fn check_slug(value: &str) -> Result<()> {
    require_text("slug", value, SLUG_MAX_LEN)?;
    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(AppError::Validation(format!(
            "slug '{}' may only contain letters, digits, hyphens and underscores",
            value
        )));
    }
    Ok(())
}

/// Minimal shape check: one `@` with a dotted domain after it.
pub fn check_email(value: &str) -> Result<()> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(AppError::Validation(format!("'{}' is not a valid email", value)));
    }
    Ok(())
}
