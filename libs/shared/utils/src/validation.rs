//! Field rules shared by patient and physician registration.

use std::sync::OnceLock;

use chrono::{NaiveDate, Utc};
use regex::Regex;

pub const MIN_PASSWORD_LENGTH: usize = 5;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn pt_mobile_regex() -> &'static Regex {
    static MOBILE: OnceLock<Regex> = OnceLock::new();
    MOBILE.get_or_init(|| {
        Regex::new(r"^(\+351)?9[1236]\d{7}$").expect("mobile pattern is valid")
    })
}

/// Lowercases and trims an email address before storage or lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> bool {
    email_regex().is_match(email) && email.len() <= 254
}

/// Portuguese mobile numbers, optionally prefixed with +351. Spaces are ignored.
pub fn validate_pt_mobile(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    pt_mobile_regex().is_match(&compact)
}

pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

pub fn validate_birth_date(birth_date: NaiveDate) -> bool {
    birth_date < Utc::now().date_naive()
}

/// Collects failed field checks so a request can report all of them at once.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, message: &str) {
        if !ok {
            self.errors.push(message.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), String> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors.join("; "))
        }
    }
}

/// Checks every account signup has in common; callers add role-specific fields.
pub fn account_field_errors(email: &str, password: &str, name: &str, phone_number: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.check(validate_email(&normalize_email(email)), "email must be a valid email address");
    errors.check(
        validate_password(password),
        "password must be at least 5 characters long",
    );
    errors.check(!name.trim().is_empty(), "name is required");
    errors.check(
        validate_pt_mobile(phone_number),
        "phone_number must be a Portuguese mobile number",
    );
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(validate_email("luiscor@mail.pt"));
        assert!(!validate_email("luiscor@mail"));
        assert!(!validate_email("not an email"));
        assert_eq!(normalize_email("  Luis.Cor@Mail.PT "), "luis.cor@mail.pt");
    }

    #[test]
    fn test_pt_mobile() {
        assert!(validate_pt_mobile("912345678"));
        assert!(validate_pt_mobile("+351 936 123 456"));
        assert!(!validate_pt_mobile("212345678"));
        assert!(!validate_pt_mobile("91234567"));
    }

    #[test]
    fn test_password_and_birth_date() {
        assert!(validate_password("qweasd"));
        assert!(!validate_password("qwe"));
        assert!(validate_birth_date(NaiveDate::from_ymd_opt(1995, 12, 15).unwrap()));
        assert!(!validate_birth_date(Utc::now().date_naive()));
    }

    #[test]
    fn test_field_errors_collects_all_failures() {
        let mut errors = FieldErrors::new();
        errors.check(true, "fine");
        errors.check(false, "Invalid email");
        errors.check(false, "Password too short");

        assert!(!errors.is_empty());
        assert_eq!(errors.into_result().unwrap_err(), "Invalid email; Password too short");
        assert!(FieldErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_account_field_errors() {
        assert!(account_field_errors("ana@example.pt", "segredo", "Ana", "912345678").is_empty());

        let message = account_field_errors("ana", "abc", " ", "123")
            .into_result()
            .unwrap_err();
        assert_eq!(message.split("; ").count(), 4);
        assert!(message.contains("email"));
        assert!(message.contains("phone_number"));
    }
}
