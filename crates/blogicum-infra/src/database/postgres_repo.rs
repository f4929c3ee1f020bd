//! PostgreSQL repository implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DbConn, EntityTrait, FromQueryResult, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use blogicum_core::domain::{
    AuthorRef, Category, Comment, CommentView, Location, Post, PostView, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::feed::{FeedQuery, FeedScope};
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::location::{self, Entity as LocationEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL location repository.
pub type PostgresLocationRepository = PostgresBaseRepository<LocationEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let result = CategoryEntity::find()
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl LocationRepository for PostgresLocationRepository {
    async fn list(&self) -> Result<Vec<Location>, RepoError> {
        let result = LocationEntity::find()
            .order_by_asc(location::Column::Name)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        Ok(load_views(&self.db, vec![model]).await?.pop())
    }

    async fn feed(
        &self,
        query: &FeedQuery,
        page: &PageRequest,
    ) -> Result<Page<PostView>, RepoError> {
        let mut select = PostEntity::find();

        select = match query.scope {
            FeedScope::All => select,
            FeedScope::Category(id) => select.filter(post::Column::CategoryId.eq(id)),
            FeedScope::Author(id) => select.filter(post::Column::AuthorId.eq(id)),
        };

        if query.is_filtered() {
            // Inner join drops posts without a category.
            let now: DateTimeWithTimeZone = query.now.into();
            select = select
                .join(JoinType::InnerJoin, post::Relation::Category.def())
                .filter(post::Column::PubDate.lte(now))
                .filter(post::Column::IsPublished.eq(true))
                .filter(category::Column::IsPublished.eq(true));
        }

        let total = select.clone().count(&self.db).await.map_err(query_error)?;
        let window = page.resolve(total);

        let models = select
            .order_by_desc(post::Column::PubDate)
            .order_by_desc(post::Column::CreatedAt)
            .offset(window.offset())
            .limit(window.limit())
            .all(&self.db)
            .await
            .map_err(query_error)?;

        tracing::debug!(
            scope = ?query.scope,
            page = window.number,
            total,
            "Loaded feed page"
        );

        Ok(Page::new(load_views(&self.db, models).await?, window))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .find_also_related(UserEntity)
            .order_by_asc(comment::Column::CreatedAt)
            // Ties on created_at resolve by id so repeated reads agree.
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        rows.into_iter()
            .map(|(comment, author)| {
                let author = author.ok_or_else(|| {
                    RepoError::Constraint(format!("comment {} has no author", comment.id))
                })?;
                Ok(CommentView {
                    author: AuthorRef {
                        id: author.id,
                        username: author.username,
                    },
                    comment: Comment::from(comment),
                })
            })
            .collect()
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(&self.db)
            .await
            .map_err(query_error)
    }
}

#[derive(Debug, FromQueryResult)]
struct CommentCount {
    post_id: Uuid,
    comment_count: i64,
}

/// Attach authors, categories, locations and comment counts to post rows,
/// preserving their order.
async fn load_views(db: &DbConn, models: Vec<post::Model>) -> Result<Vec<PostView>, RepoError> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let post_ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let author_ids: Vec<Uuid> = models.iter().map(|m| m.author_id).collect();
    let category_ids: Vec<Uuid> = models.iter().filter_map(|m| m.category_id).collect();
    let location_ids: Vec<Uuid> = models.iter().filter_map(|m| m.location_id).collect();

    let authors: HashMap<Uuid, AuthorRef> = UserEntity::find()
        .filter(user::Column::Id.is_in(author_ids))
        .all(db)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(|u| {
            (
                u.id,
                AuthorRef {
                    id: u.id,
                    username: u.username,
                },
            )
        })
        .collect();

    let categories: HashMap<Uuid, Category> = if category_ids.is_empty() {
        HashMap::new()
    } else {
        CategoryEntity::find()
            .filter(category::Column::Id.is_in(category_ids))
            .all(db)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|c| (c.id, Category::from(c)))
            .collect()
    };

    let locations: HashMap<Uuid, Location> = if location_ids.is_empty() {
        HashMap::new()
    } else {
        LocationEntity::find()
            .filter(location::Column::Id.is_in(location_ids))
            .all(db)
            .await
            .map_err(query_error)?
            .into_iter()
            .map(|l| (l.id, Location::from(l)))
            .collect()
    };

    let counts: HashMap<Uuid, i64> = CommentEntity::find()
        .select_only()
        .column(comment::Column::PostId)
        .column_as(Expr::col(comment::Column::Id).count(), "comment_count")
        .filter(comment::Column::PostId.is_in(post_ids))
        .group_by(comment::Column::PostId)
        .into_model::<CommentCount>()
        .all(db)
        .await
        .map_err(query_error)?
        .into_iter()
        .map(|row| (row.post_id, row.comment_count))
        .collect();

    models
        .into_iter()
        .map(|model| {
            let author = authors.get(&model.author_id).cloned().ok_or_else(|| {
                RepoError::Constraint(format!("post {} has no author", model.id))
            })?;
            let category = model.category_id.and_then(|id| categories.get(&id).cloned());
            let location = model.location_id.and_then(|id| locations.get(&id).cloned());
            let comment_count = counts.get(&model.id).copied().unwrap_or(0) as u64;

            Ok(PostView {
                post: Post::from(model),
                author,
                category,
                location,
                comment_count,
            })
        })
        .collect()
}
