//! Feed views: home page, category page and profile page.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;

use blogicum_core::domain::{Category, PostView};
use blogicum_core::feed::FeedQuery;
use blogicum_core::pagination::Page;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::UserResponse;

use super::{PageQuery, user_response};
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Serialize)]
struct IndexContext {
    page_obj: Page<PostView>,
}

#[derive(Serialize)]
struct CategoryContext {
    category: Category,
    page_obj: Page<PostView>,
}

#[derive(Serialize)]
struct ProfileContext {
    profile: UserResponse,
    page_obj: Page<PostView>,
}

/// GET / - publicly visible posts, newest first.
pub async fn index(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let feed = FeedQuery::global(Utc::now());
    let page_obj = state.posts.feed(&feed, &query.page_request()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(IndexContext { page_obj })))
}

/// GET /category/{slug} - publicly visible posts of a published category.
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();

    let category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .filter(|c| c.is_published)
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", slug)))?;

    let feed = FeedQuery::category(category.id, Utc::now());
    let page_obj = state.posts.feed(&feed, &query.page_request()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CategoryContext { category, page_obj })))
}

/// GET /profile/{username} - a user's posts; the owner also sees hidden ones.
pub async fn profile(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();

    let user = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", username)))?;

    let feed = FeedQuery::profile(user.id, viewer.user_id(), Utc::now());
    let page_obj = state.posts.feed(&feed, &query.page_request()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(ProfileContext {
        profile: user_response(user),
        page_obj,
    })))
}
