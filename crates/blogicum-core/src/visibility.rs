//! Post visibility rules.
//!
//! A post is public once its publish date has passed, it is flagged as
//! published and it sits in a published category. Posts without a category
//! are never public. Authors always see their own posts.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Post};

/// Whether `post` is shown to the general public at `now`.
///
/// `category` must be the row referenced by `post.category_id`.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.pub_date <= now && post.is_published && category.is_some_and(|c| c.is_published)
}

/// Whether `viewer` (if any) may read `post` at `now`.
pub fn can_view(
    viewer: Option<Uuid>,
    post: &Post,
    category: Option<&Category>,
    now: DateTime<Utc>,
) -> bool {
    if viewer == Some(post.author_id) {
        return true;
    }
    is_publicly_visible(post, category, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PostContent;
    use chrono::TimeDelta;

    fn category(is_published: bool) -> Category {
        let mut category = Category::new("Travel".into(), "travel".into(), String::new());
        category.is_published = is_published;
        category
    }

    fn post_in(category: &Category, pub_date: DateTime<Utc>, is_published: bool) -> Post {
        Post::new(
            Uuid::new_v4(),
            PostContent {
                title: "Title".into(),
                text: "Text".into(),
                pub_date,
                is_published,
                category_id: Some(category.id),
                location_id: None,
            },
        )
    }

    #[test]
    fn test_published_post_in_published_category_is_public() {
        let now = Utc::now();
        let cat = category(true);
        let post = post_in(&cat, now - TimeDelta::hours(1), true);

        assert!(is_publicly_visible(&post, Some(&cat), now));
    }

    #[test]
    fn test_publish_date_equal_to_now_is_public() {
        let now = Utc::now();
        let cat = category(true);
        let post = post_in(&cat, now, true);

        assert!(is_publicly_visible(&post, Some(&cat), now));
    }

    #[test]
    fn test_each_flag_hides_post() {
        let now = Utc::now();
        let published = category(true);
        let hidden = category(false);

        let future = post_in(&published, now + TimeDelta::minutes(5), true);
        let unpublished = post_in(&published, now - TimeDelta::days(1), false);
        let in_hidden_category = post_in(&hidden, now - TimeDelta::days(1), true);

        assert!(!is_publicly_visible(&future, Some(&published), now));
        assert!(!is_publicly_visible(&unpublished, Some(&published), now));
        assert!(!is_publicly_visible(&in_hidden_category, Some(&hidden), now));
    }

    #[test]
    fn test_post_without_category_is_never_public() {
        let now = Utc::now();
        let cat = category(true);
        let mut post = post_in(&cat, now - TimeDelta::days(1), true);
        post.category_id = None;

        assert!(!is_publicly_visible(&post, None, now));
    }

    #[test]
    fn test_author_always_sees_own_post() {
        let now = Utc::now();
        let hidden = category(false);
        let post = post_in(&hidden, now + TimeDelta::days(3), false);

        assert!(can_view(Some(post.author_id), &post, Some(&hidden), now));
        assert!(!can_view(Some(Uuid::new_v4()), &post, Some(&hidden), now));
        assert!(!can_view(None, &post, Some(&hidden), now));
    }
}
