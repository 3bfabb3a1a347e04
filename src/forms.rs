//! Input checks applied where raw user input enters, before any store call.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::StoreError;
use crate::session::MIN_PASSWORD_LEN;

pub const MIN_TITLE_LEN: usize = 3;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").unwrap())
}

/// Field errors in the order they were found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    errors: Vec<(&'static str, String)>,
}

impl FormErrors {
    fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push((field, message.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, m)| m.as_str())
    }

    pub fn into_result(self) -> Result<(), StoreError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation(self.to_string()))
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|(_, m)| m.as_str()).collect();
        f.write_str(&messages.join("; "))
    }
}

pub fn validate_ticket(title: &str) -> FormErrors {
    let mut errors = FormErrors::default();
    if title.trim().is_empty() {
        errors.add("title", "Title is required");
    } else if title.chars().count() < MIN_TITLE_LEN {
        errors.add("title", format!("Title must be at least {} characters", MIN_TITLE_LEN));
    }
    errors
}

fn check_credentials(errors: &mut FormErrors, email: &str, password: &str) {
    if email.is_empty() {
        errors.add("email", "Email is required");
    } else if !email_pattern().is_match(email) {
        errors.add("email", "Email is invalid");
    }

    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        );
    }
}

pub fn validate_login(email: &str, password: &str) -> FormErrors {
    let mut errors = FormErrors::default();
    check_credentials(&mut errors, email, password);
    errors
}

pub fn validate_signup(email: &str, password: &str, confirm_password: &str) -> FormErrors {
    let mut errors = FormErrors::default();
    check_credentials(&mut errors, email, password);
    if confirm_password.is_empty() {
        errors.add("confirmPassword", "Please confirm your password");
    } else if password != confirm_password {
        errors.add("confirmPassword", "Passwords do not match");
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==================== Unit Tests ====================

    #[test]
    fn test_ticket_title_required() {
        let errors = validate_ticket("   ");
        assert_eq!(errors.get("title"), Some("Title is required"));
    }

    #[test]
    fn test_ticket_title_too_short() {
        let errors = validate_ticket("ab");
        assert_eq!(errors.get("title"), Some("Title must be at least 3 characters"));
    }

    #[test]
    fn test_ticket_title_ok() {
        assert!(validate_ticket("Bug").is_empty());
        assert!(validate_ticket("バグ修正").is_empty());
    }

    #[test]
    fn test_login_invalid_email() {
        let errors = validate_login("not-an-email", "secret1");
        assert_eq!(errors.get("email"), Some("Email is invalid"));
        assert_eq!(errors.get("password"), None);
    }

    #[test]
    fn test_login_collects_all_fields() {
        let errors = validate_login("", "");
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert_eq!(errors.to_string(), "Email is required; Password is required");
    }

    #[test]
    fn test_signup_confirm_checks() {
        let errors = validate_signup("a@x.com", "secret1", "");
        assert_eq!(errors.get("confirmPassword"), Some("Please confirm your password"));

        let errors = validate_signup("a@x.com", "secret1", "secret2");
        assert_eq!(errors.get("confirmPassword"), Some("Passwords do not match"));

        assert!(validate_signup("a@x.com", "secret1", "secret1").is_empty());
    }

    #[test]
    fn test_into_result() {
        assert!(validate_login("a@x.com", "secret1").into_result().is_ok());

        let err = validate_login("a@x.com", "short").into_result().unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
    }

    // ==================== Property-Based Tests ====================

    proptest! {
        #[test]
        fn prop_well_formed_emails_accepted(
            user in "[a-z0-9]{1,10}",
            domain in "[a-z]{1,10}",
            tld in "[a-z]{2,4}"
        ) {
            let email = format!("{}@{}.{}", user, domain, tld);
            prop_assert!(validate_login(&email, "secret1").get("email").is_none());
        }

        #[test]
        fn prop_emails_without_at_rejected(email in "[a-z0-9.]{1,20}") {
            let errors = validate_login(&email, "secret1");
            prop_assert_eq!(errors.get("email"), Some("Email is invalid"));
        }
    }
}
