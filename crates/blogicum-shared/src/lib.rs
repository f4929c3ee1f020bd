//! # Blogicum Shared
//!
//! Request/response types and form validation shared by the server and
//! any client of the blog API.

pub mod dto;
pub mod response;
pub mod validation;

pub use response::{ApiResponse, ErrorResponse};
pub use validation::FieldErrors;
