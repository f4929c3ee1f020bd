//! Feed queries: which posts a list view shows to whom.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Post};
use crate::visibility;

/// Which posts a feed is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedScope {
    /// Home page: every post.
    All,
    /// Posts of one category.
    Category(Uuid),
    /// Posts of one author.
    Author(Uuid),
}

/// Who the feed is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only publicly visible posts.
    Public,
    /// The author looking at their own profile; nothing is filtered.
    Owner,
}

/// A feed request resolved against the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedQuery {
    pub scope: FeedScope,
    pub audience: Audience,
    pub now: DateTime<Utc>,
}

impl FeedQuery {
    pub fn global(now: DateTime<Utc>) -> Self {
        Self {
            scope: FeedScope::All,
            audience: Audience::Public,
            now,
        }
    }

    pub fn category(category_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            scope: FeedScope::Category(category_id),
            audience: Audience::Public,
            now,
        }
    }

    /// Profile feed of `author_id`; unfiltered when the viewer is that author.
    pub fn profile(author_id: Uuid, viewer: Option<Uuid>, now: DateTime<Utc>) -> Self {
        let audience = if viewer == Some(author_id) {
            Audience::Owner
        } else {
            Audience::Public
        };
        Self {
            scope: FeedScope::Author(author_id),
            audience,
            now,
        }
    }

    /// Whether the visibility filter applies to this feed.
    pub fn is_filtered(&self) -> bool {
        self.audience == Audience::Public
    }

    /// Evaluate the query against a single post.
    ///
    /// `category` must be the row referenced by `post.category_id`.
    pub fn admits(&self, post: &Post, category: Option<&Category>) -> bool {
        let in_scope = match self.scope {
            FeedScope::All => true,
            FeedScope::Category(id) => post.category_id == Some(id),
            FeedScope::Author(id) => post.author_id == id,
        };

        in_scope && (!self.is_filtered() || visibility::is_publicly_visible(post, category, self.now))
    }
}
