//! Data Transfer Objects - request/response types for the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{
    SLUG_REGEX, USERNAME_REGEX, blank_as_none, null_as_empty, validate_not_blank,
};

fn default_true() -> bool {
    true
}

// =============================================================================
// ACCOUNTS
// =============================================================================

/// Request to register a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may contain only letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address"))]
    #[serde(default, deserialize_with = "blank_as_none")]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub password_confirm: String,
}

impl RegisterUserRequest {
    pub fn passwords_match(&self) -> bool {
        self.password == self.password_confirm
    }
}

/// Request to login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Response containing a user's public information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: DateTime<Utc>,
}

/// Profile edit form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(max = 150, message = "First name must not exceed 150 characters"))]
    #[serde(default)]
    pub first_name: String,

    #[validate(length(max = 150, message = "Last name must not exceed 150 characters"))]
    #[serde(default)]
    pub last_name: String,

    #[validate(
        length(min = 1, max = 150, message = "Username must be 1-150 characters"),
        regex(
            path = *USERNAME_REGEX,
            message = "Username may contain only letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,

    #[validate(email(message = "Enter a valid email address"))]
    #[serde(default, deserialize_with = "blank_as_none")]
    pub email: Option<String>,
}

// =============================================================================
// POSTS AND COMMENTS
// =============================================================================

/// Post create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 256, message = "Title must not exceed 256 characters")
    )]
    pub title: String,

    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,

    #[validate(required(message = "Publication date is required."))]
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,

    #[serde(default = "default_true")]
    pub is_published: bool,

    #[serde(default)]
    pub category_id: Option<Uuid>,

    #[serde(default)]
    pub location_id: Option<Uuid>,
}

/// Comment create/edit form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[validate(custom(function = "validate_not_blank"))]
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
}

/// A selectable option of a form field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub id: Uuid,
    pub label: String,
}

/// Choices offered by the post form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormChoices {
    pub categories: Vec<Choice>,
    pub locations: Vec<Choice>,
}

// =============================================================================
// ADMINISTRATION
// =============================================================================

/// Category create/update form (staff only).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 256, message = "Title must not exceed 256 characters")
    )]
    pub title: String,

    #[validate(
        length(min = 1, max = 64, message = "Slug must be 1-64 characters"),
        regex(
            path = *SLUG_REGEX,
            message = "Slug may contain only latin letters, digits, hyphens and underscores"
        )
    )]
    pub slug: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_true")]
    pub is_published: bool,
}

/// Location create/update form (staff only).
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationForm {
    #[validate(
        custom(function = "validate_not_blank"),
        length(max = 256, message = "Name must not exceed 256 characters")
    )]
    pub name: String,

    #[serde(default = "default_true")]
    pub is_published: bool,
}

// =============================================================================
// PAGES
// =============================================================================

/// Static page content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    pub body: String,
}
