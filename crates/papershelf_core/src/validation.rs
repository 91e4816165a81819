//! crates/papershelf_core/src/validation.rs
//!
//! Caller-side input checks. The UI layer runs these before invoking the
//! Session Manager so obviously bad input short-circuits without any remote
//! call.

use regex::Regex;
use std::sync::OnceLock;

/// Minimum password length accepted locally; the identity service applies
/// its own strength policy on top.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Input rejections, each with its fixed user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all fields.")]
    MissingFields,
    #[error("That email address is not valid.")]
    InvalidEmail,
    #[error("Password must be at least 6 characters.")]
    PasswordTooShort,
    #[error("Passwords do not match.")]
    PasswordMismatch,
}

/// Trim + lowercase. Applied identically before every remote call, and
/// idempotent under repetition.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"))
}

fn check_email(email: &str) -> Result<(), ValidationError> {
    if email_regex().is_match(&normalize_email(email)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

pub fn validate_registration(
    email: &str,
    password: &str,
    confirmation: &str,
    display_name: &str,
    grade_level: &str,
) -> Result<(), ValidationError> {
    let fields = [email, password, confirmation, display_name, grade_level];
    if fields.iter().any(|f| f.trim().is_empty()) {
        return Err(ValidationError::MissingFields);
    }
    check_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

pub fn validate_sign_in(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(ValidationError::MissingFields);
    }
    check_email(email)
}

pub fn validate_reset(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingFields);
    }
    check_email(email)
}
