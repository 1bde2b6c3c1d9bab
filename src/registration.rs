use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationErrors};

use crate::types::NewUser;

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z-]+$").unwrap();
}

/// Where a visitor lands after a successful registration.
pub const NEXT_ONBOARDING_STEP: &str = "/register/connect-calendar";
pub const ONBOARDING_STEPS: u32 = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(length(
        min = 3,
        message = "Username must have at least 3 characters.",
        code = "username-length"
    ))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username may only contain letters and hyphens.",
        code = "username-regex"
    ))]
    #[serde(default)]
    pub username: String,
    #[validate(length(
        min = 3,
        message = "Full name must have at least 3 characters.",
        code = "name-length"
    ))]
    #[serde(default)]
    pub name: String,
}

impl RegisterForm {
    /// Trims and validates the form, returning the user to create with a
    /// lowercased username.
    pub fn into_new_user(self) -> Result<NewUser, ValidationErrors> {
        let form = Self {
            username: self.username.trim().to_string(),
            name: self.name.trim().to_string(),
        };
        form.validate()?;

        Ok(NewUser {
            username: form.username.to_lowercase(),
            name: form.name,
        })
    }
}

/// First message of every failing field, keyed by field name.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errors)| {
            errors
                .first()
                .map(|error| (field.to_string(), error.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    fn form(username: &str, name: &str) -> RegisterForm {
        RegisterForm {
            username: username.into(),
            name: name.into(),
        }
    }

    #[test_case("stefan"; "lowercase letters")]
    #[test_case("Stefan-Dangl"; "mixed case with hyphen")]
    #[test_case("  stefan  "; "surrounding whitespace")]
    fn test_valid_usernames(username: &str) {
        let new_user = form(username, "Stefan Dangl").into_new_user().unwrap();
        assert_eq!(new_user.username, username.trim().to_lowercase());
        assert_eq!(new_user.name, "Stefan Dangl");
    }

    #[test_case("stefan1"; "digits")]
    #[test_case("stefan_dangl"; "underscore")]
    #[test_case("stefan dangl"; "inner whitespace")]
    #[test_case("st"; "too short")]
    #[test_case(""; "empty")]
    fn test_invalid_usernames(username: &str) {
        let errors = form(username, "Stefan Dangl").into_new_user().unwrap_err();
        let messages = field_messages(&errors);
        assert!(messages.contains_key("username"));
        assert!(!messages.contains_key("name"));
    }

    #[test]
    fn test_short_name_is_rejected() {
        let errors = form("stefan", " S ").into_new_user().unwrap_err();
        let messages = field_messages(&errors);
        assert_eq!(
            messages.get("name").map(String::as_str),
            Some("Full name must have at least 3 characters.")
        );
    }

    #[test]
    fn test_digit_message() {
        let errors = form("abc123", "Stefan").into_new_user().unwrap_err();
        assert_eq!(
            field_messages(&errors).get("username").map(String::as_str),
            Some("Username may only contain letters and hyphens.")
        );
    }
}
