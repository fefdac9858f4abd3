use std::sync::LazyLock;

use regex::Regex;

use crate::error::ApiError;

use super::types::ProfileUpdate;

const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .map_err(|err| log::error!("Invalid email pattern: {err}"))
        .ok()
});

fn invalid(message: &str) -> ApiError {
    ApiError::Validation(message.to_string())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(email))
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(invalid("Email and password are required"));
    }
    Ok(())
}

pub fn validate_signup(
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
) -> Result<(), ApiError> {
    validate_login(email, password)?;

    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(invalid("First name and last name are required"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(invalid("Password must be at least 6 characters long"));
    }
    if !is_valid_email(email.trim()) {
        return Err(invalid("Please enter a valid email address"));
    }
    Ok(())
}

pub fn build_profile_update(
    first_name: &str,
    last_name: &str,
    photo_url: &str,
    age: &str,
    gender: &str,
    about: &str,
) -> Result<ProfileUpdate, ApiError> {
    if first_name.trim().is_empty() || last_name.trim().is_empty() {
        return Err(invalid("First name and last name are required"));
    }

    let age = match age.trim() {
        "" => None,
        raw => Some(
            raw.parse::<u32>()
                .map_err(|_| invalid("Age must be a valid number"))?,
        ),
    };

    let optional = |value: &str| {
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    };

    Ok(ProfileUpdate {
        first_name: first_name.trim().to_string(),
        last_name: last_name.trim().to_string(),
        photo_url: photo_url.trim().to_string(),
        age,
        gender: optional(gender),
        about: optional(about),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        assert!(validate_login("a@b.co", "secret").is_ok());
        assert!(validate_login("  ", "secret").is_err());
        assert!(validate_login("a@b.co", "   ").is_err());
    }

    #[test]
    fn signup_checks_names_password_and_email() {
        assert!(validate_signup("Ada", "Lovelace", "ada@example.com", "secret1").is_ok());

        let err = validate_signup("", "Lovelace", "ada@example.com", "secret1").unwrap_err();
        assert_eq!(err.to_string(), "First name and last name are required");

        let err = validate_signup("Ada", "Lovelace", "ada@example.com", "short").unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters long");

        let err = validate_signup("Ada", "Lovelace", "ada@example", "secret1").unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid email address");
    }

    #[test]
    fn email_pattern_rejects_whitespace_and_missing_parts() {
        assert!(is_valid_email("dev@connect.io"));
        assert!(!is_valid_email("dev connect@io.com"));
        assert!(!is_valid_email("@connect.io"));
        assert!(!is_valid_email("dev@connect"));
    }

    #[test]
    fn profile_update_trims_and_parses_age() {
        let update =
            build_profile_update(" Ada ", "Lovelace", "", "36", "  ", "Engine notes").unwrap();
        assert_eq!(update.first_name, "Ada");
        assert_eq!(update.age, Some(36));
        assert_eq!(update.gender, None);
        assert_eq!(update.about.as_deref(), Some("Engine notes"));
    }

    #[test]
    fn profile_update_rejects_bad_age() {
        assert!(build_profile_update("Ada", "Lovelace", "", "-3", "", "").is_err());
        assert!(build_profile_update("Ada", "Lovelace", "", "old", "", "").is_err());
        assert!(build_profile_update("Ada", "", "", "", "", "").is_err());
    }
}
