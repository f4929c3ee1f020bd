//! Form validation helpers on top of `validator`.

use std::borrow::Cow;
use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use validator::{ValidationError, ValidationErrors};

lazy_static! {
    /// Usernames: letters, digits and `@ . + - _`.
    /// - Valid: "leo", "leo.tolstoy", "a+b@host"
    /// - Invalid: "", "leo tolstoy", "leo/tolstoy"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[\w.@+-]+$").unwrap();

    /// Slugs: ASCII letters, digits, hyphens and underscores.
    /// - Valid: "travel", "my-trips_2024"
    /// - Invalid: "", "my trips", "путешествия"
    pub static ref SLUG_REGEX: Regex = Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap();
}

/// Field name -> messages, serialized into problem documents.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Rejects empty and whitespace-only text.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some(Cow::Borrowed("This field is required."));
        return Err(error);
    }
    Ok(())
}

/// Reads an optional text field, treating blank input as absent.
///
/// Use with `#[serde(default, deserialize_with = "blank_as_none")]` so a form
/// echoed back with `""` passes the optional-field rules.
pub fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Reads a text field, treating `null` as empty text.
pub fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Flatten `validator` output into field messages.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    for (field, errs) in errors.field_errors() {
        let messages = errs
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", e.code))
            })
            .collect();
        out.insert(field.to_string(), messages);
    }
    out
}

/// A single field error.
pub fn field_error(field: &str, message: impl Into<String>) -> FieldErrors {
    let mut out = FieldErrors::new();
    out.insert(field.to_string(), vec![message.into()]);
    out
}
