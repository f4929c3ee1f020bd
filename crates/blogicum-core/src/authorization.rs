//! Ownership gate for editing and deleting content.

use uuid::Uuid;

use crate::domain::{Comment, Post};

/// Content that belongs to a single author.
pub trait Authored {
    fn author_id(&self) -> Uuid;

    fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id() == user_id
    }
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// Outcome of comparing a requester to the author of some content.
///
/// A `NotOwner` outcome is not an error: the caller sends the requester
/// to the read-only view of the content instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Owner,
    NotOwner,
}

impl Ownership {
    pub fn check<T: Authored + ?Sized>(item: &T, requester: Uuid) -> Self {
        if item.is_authored_by(requester) {
            Ownership::Owner
        } else {
            Ownership::NotOwner
        }
    }

    pub fn is_owner(self) -> bool {
        self == Ownership::Owner
    }
}
