//! # Blogicum Core
//!
//! The domain layer of the Blogicum blog.
//! This crate contains the content-visibility and ownership rules, feed
//! queries and pagination, with zero infrastructure dependencies.

pub mod authorization;
pub mod domain;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod ports;
pub mod visibility;
