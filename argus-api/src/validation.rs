//! Format checks that `validator` attributes do not cover.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,4}$").expect("email regex compiles")
});

/// Uzbek mobile numbers: `+998` followed by nine digits
static PHONE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+998[0-9]{9}$").expect("phone regex compiles"));

pub fn validate_email(email: &str) -> Result<(), String> {
    if EMAIL_REGEX.is_match(email) {
        Ok(())
    } else {
        Err("Invalid email format".to_string())
    }
}

pub fn validate_phone(phone: &str) -> Result<(), String> {
    if PHONE_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err("Invalid phone number format, expected +998XXXXXXXXX".to_string())
    }
}
