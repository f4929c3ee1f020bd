//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;
mod view;

pub use category::Category;
pub use comment::Comment;
pub use location::Location;
pub use post::{Post, PostContent};
pub use user::{ProfileChanges, ROLE_STAFF, ROLE_USER, User};
pub use view::{AuthorRef, CommentView, PostView};
