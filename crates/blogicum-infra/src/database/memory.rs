//! In-memory store - used as fallback when no database is configured.
//!
//! Mirrors the relational schema closely enough for the blog's rules:
//! unique usernames and slugs, foreign keys on posts and comments, cascades
//! on delete. Rows are kept in insertion order.
//! Note: Data is lost on process restart.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{
    AuthorRef, Category, Comment, CommentView, Location, Post, PostView, User,
};
use blogicum_core::error::RepoError;
use blogicum_core::feed::FeedQuery;
use blogicum_core::pagination::{Page, PageRequest};
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};

/// Every table of the store.
#[derive(Default)]
pub struct MemoryTables {
    users: Vec<User>,
    categories: Vec<Category>,
    locations: Vec<Location>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl MemoryTables {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn category(&self, id: Option<Uuid>) -> Option<&Category> {
        let id = id?;
        self.categories.iter().find(|c| c.id == id)
    }

    fn location(&self, id: Option<Uuid>) -> Option<&Location> {
        let id = id?;
        self.locations.iter().find(|l| l.id == id)
    }

    fn author_ref(&self, id: Uuid) -> Result<AuthorRef, RepoError> {
        self.user(id)
            .map(|u| AuthorRef {
                id: u.id,
                username: u.username.clone(),
            })
            .ok_or_else(|| RepoError::Constraint(format!("user {} does not exist", id)))
    }

    fn comment_count(&self, post_id: Uuid) -> u64 {
        self.comments.iter().filter(|c| c.post_id == post_id).count() as u64
    }

    fn post_view(&self, post: &Post) -> Result<PostView, RepoError> {
        Ok(PostView {
            post: post.clone(),
            author: self.author_ref(post.author_id)?,
            category: self.category(post.category_id).cloned(),
            location: self.location(post.location_id).cloned(),
            comment_count: self.comment_count(post.id),
        })
    }
}

/// A row type stored in [`MemoryTables`].
pub trait MemoryRecord: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;

    fn table(tables: &MemoryTables) -> &Vec<Self>;

    fn table_mut(tables: &mut MemoryTables) -> &mut Vec<Self>;

    /// Unique and foreign-key checks run before a write.
    fn check_constraints(&self, _tables: &MemoryTables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Cascades run after the row with `id` was removed.
    fn on_delete(_id: Uuid, _tables: &mut MemoryTables) {}
}

impl MemoryRecord for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &Vec<Self> {
        &tables.users
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.users
    }

    fn check_constraints(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        if tables
            .users
            .iter()
            .any(|u| u.username == self.username && u.id != self.id)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        let removed: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        tables.posts.retain(|p| p.author_id != id);
        tables
            .comments
            .retain(|c| c.author_id != id && !removed.contains(&c.post_id));
    }
}

impl MemoryRecord for Category {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &Vec<Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.categories
    }

    fn check_constraints(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        if tables
            .categories
            .iter()
            .any(|c| c.slug == self.slug && c.id != self.id)
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        for post in tables.posts.iter_mut().filter(|p| p.category_id == Some(id)) {
            post.category_id = None;
        }
    }
}

impl MemoryRecord for Location {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &Vec<Self> {
        &tables.locations
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.locations
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        for post in tables.posts.iter_mut().filter(|p| p.location_id == Some(id)) {
            post.location_id = None;
        }
    }
}

impl MemoryRecord for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &Vec<Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.posts
    }

    fn check_constraints(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        let dangling = tables.user(self.author_id).is_none()
            || (self.category_id.is_some() && tables.category(self.category_id).is_none())
            || (self.location_id.is_some() && tables.location(self.location_id).is_none());
        if dangling {
            return Err(RepoError::Constraint(
                "Referenced entity does not exist".to_string(),
            ));
        }
        Ok(())
    }

    fn on_delete(id: Uuid, tables: &mut MemoryTables) {
        tables.comments.retain(|c| c.post_id != id);
    }
}

impl MemoryRecord for Comment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &MemoryTables) -> &Vec<Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut MemoryTables) -> &mut Vec<Self> {
        &mut tables.comments
    }

    fn check_constraints(&self, tables: &MemoryTables) -> Result<(), RepoError> {
        let post_exists = tables.posts.iter().any(|p| p.id == self.post_id);
        if !post_exists || tables.user(self.author_id).is_none() {
            return Err(RepoError::Constraint(
                "Referenced entity does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shared handle to the in-memory tables; hands out repositories.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<MemoryTables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn repository<T: MemoryRecord>(&self) -> InMemoryRepository<T> {
        InMemoryRepository {
            tables: self.tables.clone(),
            _record: PhantomData,
        }
    }

    pub fn users(&self) -> InMemoryUserRepository {
        self.repository()
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        self.repository()
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        self.repository()
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        self.repository()
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        self.repository()
    }
}

/// Generic in-memory repository over one table.
pub struct InMemoryRepository<T> {
    tables: Arc<RwLock<MemoryTables>>,
    _record: PhantomData<T>,
}

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryLocationRepository = InMemoryRepository<Location>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

#[async_trait]
impl<T: MemoryRecord> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.tables.read().await;
        Ok(T::table(&tables).iter().find(|r| r.id() == id).cloned())
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.tables.write().await;
        entity.check_constraints(&tables)?;

        let table = T::table_mut(&mut tables);
        match table.iter_mut().find(|r| r.id() == entity.id()) {
            Some(existing) => *existing = entity.clone(),
            None => table.push(entity.clone()),
        }

        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;

        let table = T::table_mut(&mut tables);
        let before = table.len();
        table.retain(|r| r.id() != id);
        if table.len() == before {
            return Err(RepoError::NotFound);
        }

        T::on_delete(id, &mut tables);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.iter().find(|c| c.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories = tables.categories.clone();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn list(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations = tables.locations.clone();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        let tables = self.tables.read().await;
        tables
            .posts
            .iter()
            .find(|p| p.id == id)
            .map(|p| tables.post_view(p))
            .transpose()
    }

    async fn feed(
        &self,
        query: &FeedQuery,
        page: &PageRequest,
    ) -> Result<Page<PostView>, RepoError> {
        let tables = self.tables.read().await;

        let mut posts: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|p| query.admits(p, tables.category(p.category_id)))
            .collect();
        posts.sort_by(|a, b| {
            b.pub_date
                .cmp(&a.pub_date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });

        let page = Page::slice(posts, page);
        let items = page
            .items
            .into_iter()
            .map(|p| tables.post_view(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, page.window))
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<&Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .collect();
        // Ties on created_at resolve by id, matching the SQL store.
        comments.sort_by_key(|c| (c.created_at, c.id));

        comments
            .into_iter()
            .map(|c| {
                Ok(CommentView {
                    comment: c.clone(),
                    author: tables.author_ref(c.author_id)?,
                })
            })
            .collect()
    }

    async fn count_for_post(&self, post_id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.comment_count(post_id))
    }
}
