//! Read models assembled by repositories for feeds and detail pages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{Category, Comment, Location, Post};
use crate::visibility;

/// Public reference to a content author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

/// A post together with its related rows and comment count.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorRef,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}

impl PostView {
    /// Whether `viewer` may read this post at `now`.
    pub fn is_visible_to(&self, viewer: Option<Uuid>, now: DateTime<Utc>) -> bool {
        visibility::can_view(viewer, &self.post, self.category.as_ref(), now)
    }
}

/// A comment with its author.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorRef,
}
