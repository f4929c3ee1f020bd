//! Post views: detail page and the author's create/edit/delete flows.

use actix_web::{HttpResponse, web};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use blogicum_core::authorization::Ownership;
use blogicum_core::domain::{CommentView, Post, PostContent, PostView};
use blogicum_core::ports::BaseRepository;
use blogicum_shared::dto::{Choice, PostForm, PostFormChoices};
use blogicum_shared::validation::field_errors;
use blogicum_shared::{ApiResponse, FieldErrors};

use super::{current_user, post_url, profile_url, redirect};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const INVALID_CHOICE: &str = "Select a valid choice.";

#[derive(Serialize)]
struct DetailContext {
    post: PostView,
    comments: Vec<CommentView>,
}

#[derive(Serialize)]
struct FormContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    post: Option<Post>,
    choices: PostFormChoices,
}

#[derive(Serialize)]
struct DeleteContext {
    post: PostView,
}

/// GET /posts/{id}
pub async fn detail(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    // Hidden posts are reported as missing to everyone but the author
    let post = state
        .posts
        .find_view(id)
        .await?
        .filter(|view| view.is_visible_to(viewer.user_id(), Utc::now()))
        .ok_or_else(|| post_not_found(id))?;

    let comments = state.comments.list_for_post(id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(DetailContext { post, comments })))
}

/// GET /posts/new
pub async fn create_form(
    state: web::Data<AppState>,
    _identity: Identity,
) -> AppResult<HttpResponse> {
    let choices = form_choices(&state).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(FormContext {
        post: None,
        choices,
    })))
}

/// POST /posts/new
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let author = current_user(&state, &identity).await?;
    let content = post_content(&state, body.into_inner()).await?;

    let post = state.posts.save(Post::new(author.id, content)).await?;
    tracing::info!(post_id = %post.id, author = %author.username, "Post created");

    Ok(redirect(profile_url(&author.username)))
}

/// GET /posts/{id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if !Ownership::check(&post, identity.user_id).is_owner() {
        return Ok(redirect(post_url(post.id)));
    }

    let choices = form_choices(&state).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(FormContext {
        post: Some(post),
        choices,
    })))
}

/// POST /posts/{id}/edit
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostForm>,
) -> AppResult<HttpResponse> {
    let mut post = find_post(&state, path.into_inner()).await?;
    if !Ownership::check(&post, identity.user_id).is_owner() {
        tracing::debug!(post_id = %post.id, user = %identity.username, "Edit by non-author ignored");
        return Ok(redirect(post_url(post.id)));
    }

    post.apply(post_content(&state, body.into_inner()).await?);
    let post = state.posts.save(post).await?;
    tracing::info!(post_id = %post.id, "Post updated");

    Ok(redirect(post_url(post.id)))
}

/// GET /posts/{id}/delete
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let view = state
        .posts
        .find_view(id)
        .await?
        .ok_or_else(|| post_not_found(id))?;

    if !Ownership::check(&view.post, identity.user_id).is_owner() {
        return Ok(redirect(post_url(id)));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(DeleteContext { post: view })))
}

/// POST /posts/{id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    if !Ownership::check(&post, identity.user_id).is_owner() {
        tracing::debug!(post_id = %post.id, user = %identity.username, "Delete by non-author ignored");
        return Ok(redirect(post_url(post.id)));
    }

    let author = current_user(&state, &identity).await?;
    state.posts.delete(post.id).await?;
    tracing::info!(post_id = %post.id, "Post deleted");

    Ok(redirect(profile_url(&author.username)))
}

pub(super) async fn find_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .posts
        .find_by_id(id)
        .await?
        .ok_or_else(|| post_not_found(id))
}

fn post_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Post {} not found", id))
}

async fn form_choices(state: &AppState) -> AppResult<PostFormChoices> {
    let categories = state
        .categories
        .list()
        .await?
        .into_iter()
        .map(|c| Choice {
            id: c.id,
            label: c.title,
        })
        .collect();

    let locations = state
        .locations
        .list()
        .await?
        .into_iter()
        .map(|l| Choice {
            id: l.id,
            label: l.name,
        })
        .collect();

    Ok(PostFormChoices {
        categories,
        locations,
    })
}

/// Validate a submitted post form, including its category and location references.
async fn post_content(state: &AppState, form: PostForm) -> AppResult<PostContent> {
    let mut errors: FieldErrors = form
        .validate()
        .err()
        .map(|e| field_errors(&e))
        .unwrap_or_default();

    if let Some(id) = form.category_id {
        if state.categories.find_by_id(id).await?.is_none() {
            errors
                .entry("category_id".to_string())
                .or_default()
                .push(INVALID_CHOICE.to_string());
        }
    }
    if let Some(id) = form.location_id {
        if state.locations.find_by_id(id).await?.is_none() {
            errors
                .entry("location_id".to_string())
                .or_default()
                .push(INVALID_CHOICE.to_string());
        }
    }

    let Some(pub_date) = form.pub_date else {
        return Err(AppError::Validation(errors));
    };
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(PostContent {
        title: form.title,
        text: form.text,
        pub_date,
        is_published: form.is_published,
        category_id: form.category_id,
        location_id: form.location_id,
    })
}
