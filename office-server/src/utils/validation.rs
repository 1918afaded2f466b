//! Input validation helpers
//!
//! Centralized text length constants and validation functions. Limits follow
//! the original data model (names 2..100, addresses 10..200, comments ≤1000,
//! cashout reasons 3..500) — SurrealDB does not enforce lengths by itself.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: service, zone, category, role, customer
pub const MAX_NAME_LEN: usize = 100;

/// Person names (first/last)
pub const MAX_PERSON_NAME_LEN: usize = 50;

/// Notes, descriptions, cashout reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Task descriptions
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Task comments
pub const MAX_COMMENT_LEN: usize = 1000;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Addresses
pub const MAX_ADDRESS_LEN: usize = 200;

/// Phone numbers
pub const MAX_PHONE_LEN: usize = 17;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a phone number: optional leading `+`, then 1..=16 digits not
/// starting with zero (original schema rule).
pub fn validate_phone(value: &str, field: &str) -> Result<(), AppError> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let valid = !digits.is_empty()
        && digits.len() <= 16
        && !digits.starts_with('0')
        && digits.chars().all(|c| c.is_ascii_digit());
    if !valid {
        return Err(AppError::validation(format!("{field} is not valid")));
    }
    Ok(())
}

/// Minimal email shape check: `local@domain.tld`, no whitespace.
pub fn validate_email(value: &str) -> Result<(), AppError> {
    let valid = value.len() <= MAX_EMAIL_LEN
        && !value.contains(char::is_whitespace)
        && value.split('@').count() == 2
        && value
            .split('@')
            .nth(1)
            .is_some_and(|d| d.contains('.') && !d.starts_with('.') && !d.ends_with('.'));
    if !valid {
        return Err(AppError::validation("Email is not valid"));
    }
    Ok(())
}

/// Validate a password before hashing.
pub fn validate_password(value: &str) -> Result<(), AppError> {
    if value.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    if value.len() > MAX_PASSWORD_LEN {
        return Err(AppError::validation("Password is too long"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_accepts_international_format() {
        assert!(validate_phone("+96170123456", "phone").is_ok());
        assert!(validate_phone("96170123456", "phone").is_ok());
    }

    #[test]
    fn phone_rejects_garbage() {
        assert!(validate_phone("", "phone").is_err());
        assert!(validate_phone("+0123", "phone").is_err());
        assert!(validate_phone("not-a-phone", "phone").is_err());
    }

    #[test]
    fn email_shape_check() {
        assert!(validate_email("admin@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("spaces in@example.com").is_err());
    }
}
