//! Request body validation.
//!
//! Request DTOs deserialize every field as `Option` so that a missing field
//! becomes a per-field message instead of an opaque JSON rejection. Handlers
//! run the fields through a [`Validator`], which collects all problems and
//! then fails once with [`ApiError::Validation`].

use lazy_static::lazy_static;
use regex::Regex;
use std::str::FromStr;

use crate::error::{ApiError, FieldError};
use crate::storage::models::ParseVariantError;

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid");
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Trims the value and maps blank strings to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.add(field, message);
        }
    }

    /// Non-blank text, trimmed. Returns an empty string when rejected.
    pub fn required(&mut self, field: &str, value: Option<String>) -> String {
        match non_blank(value) {
            Some(v) => v,
            None => {
                self.add(field, format!("{} is required", field));
                String::new()
            }
        }
    }

    /// Like [`Validator::required`] but keeps the value as sent. For secrets.
    pub fn required_raw(&mut self, field: &str, value: Option<String>) -> String {
        match value.filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                self.add(field, format!("{} is required", field));
                String::new()
            }
        }
    }

    pub fn min_chars(&mut self, field: &str, value: &str, min: usize) {
        // Missing values already carry a "required" message.
        if !value.is_empty() && value.chars().count() < min {
            self.add(
                field,
                format!("{} must be at least {} characters", field, min),
            );
        }
    }

    pub fn email(&mut self, field: &str, value: Option<String>) -> String {
        let value = self.required(field, value);
        if !value.is_empty() && !is_valid_email(&value) {
            self.add(field, "Invalid email address");
        }
        value
    }

    /// Any value that must be present. Returns `T::default()` when missing.
    pub fn present<T: Default>(&mut self, field: &str, value: Option<T>) -> T {
        match value {
            Some(v) => v,
            None => {
                self.add(field, format!("{} is required", field));
                T::default()
            }
        }
    }

    /// Parses one of a closed set of variants (user type, status).
    pub fn one_of<T>(&mut self, field: &str, value: Option<String>) -> Option<T>
    where
        T: FromStr<Err = ParseVariantError>,
    {
        match self.optional_one_of(field, value) {
            Some(v) => Some(v),
            None => {
                if !self.errors.iter().any(|e| e.field == field) {
                    self.add(field, format!("{} is required", field));
                }
                None
            }
        }
    }

    pub fn optional_one_of<T>(&mut self, field: &str, value: Option<String>) -> Option<T>
    where
        T: FromStr<Err = ParseVariantError>,
    {
        let raw = non_blank(value)?;
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(err) => {
                self.add(field, err.to_string());
                None
            }
        }
    }

    pub fn range(&mut self, field: &str, value: Option<f64>, min: f64, max: f64) -> f64 {
        match value {
            Some(v) if v.is_finite() && v >= min && v <= max => v,
            Some(_) => {
                self.add(field, format!("{} must be between {} and {}", field, min, max));
                min
            }
            None => {
                self.add(field, format!("{} is required", field));
                min
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::{ProjectStatus, UserType};

    fn field_names(err: ApiError) -> Vec<String> {
        match err {
            ApiError::Validation(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_email_format() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("no-at-sign"));
        assert!(!is_valid_email("two words@example.com"));
    }

    #[test]
    fn test_collects_every_failing_field() {
        let mut v = Validator::new();
        let username = v.required("username", Some("  ".to_string()));
        let email = v.email("email", Some("bad".to_string()));
        let kind: Option<UserType> = v.one_of("userType", Some("root".to_string()));
        let full_name = v.required("fullName", Some("  Ada  ".to_string()));
        assert_eq!(username, "");
        assert_eq!(email, "bad");
        assert!(kind.is_none());
        assert_eq!(full_name, "Ada");
        assert_eq!(
            field_names(v.finish().unwrap_err()),
            vec!["username", "email", "userType"]
        );
    }

    #[test]
    fn test_one_of_reports_missing_once() {
        let mut v = Validator::new();
        let status: Option<ProjectStatus> = v.one_of("status", None);
        assert!(status.is_none());
        assert_eq!(field_names(v.finish().unwrap_err()), vec!["status"]);

        let mut v = Validator::new();
        let status: Option<ProjectStatus> = v.optional_one_of("status", None);
        assert!(status.is_none());
        assert!(v.finish().is_ok());
    }

    #[test]
    fn test_range_bounds_are_inclusive() {
        let mut v = Validator::new();
        assert_eq!(v.range("rating", Some(1.0), 1.0, 5.0), 1.0);
        assert_eq!(v.range("rating", Some(5.0), 1.0, 5.0), 5.0);
        assert!(v.finish().is_ok());

        let mut v = Validator::new();
        v.range("rating", Some(5.5), 1.0, 5.0);
        v.range("rating", Some(f64::NAN), 1.0, 5.0);
        assert_eq!(field_names(v.finish().unwrap_err()).len(), 2);
    }

    #[test]
    fn test_min_chars_skips_missing_values() {
        let mut v = Validator::new();
        let name = v.required("fullName", None);
        v.min_chars("fullName", &name, 2);
        assert_eq!(field_names(v.finish().unwrap_err()), vec!["fullName"]);
    }
}
