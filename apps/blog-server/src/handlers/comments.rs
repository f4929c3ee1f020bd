//! Comment views: submission and the author's edit/delete flows.

use actix_web::{HttpResponse, web};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use blogicum_core::authorization::Ownership;
use blogicum_core::domain::Comment;
use blogicum_core::ports::BaseRepository;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::CommentForm;

use super::posts::find_post;
use super::{current_user, post_url, redirect};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Serialize)]
struct CommentContext {
    comment: Comment,
}

/// POST /posts/{id}/comment
///
/// Always lands back on the post page; an empty or unreadable comment is
/// dropped without an error message.
pub async fn add(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let post = find_post(&state, path.into_inner()).await?;
    let form = serde_json::from_slice::<CommentForm>(&body)
        .ok()
        .filter(|form| form.validate().is_ok());

    if let Some(form) = form {
        let author = current_user(&state, &identity).await?;
        let comment = state
            .comments
            .save(Comment::new(post.id, author.id, form.text))
            .await?;
        tracing::info!(comment_id = %comment.id, post_id = %post.id, "Comment added");
    } else {
        tracing::debug!(post_id = %post.id, "Discarded invalid comment");
    }

    Ok(redirect(post_url(post.id)))
}

/// GET /comments/{id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment = find_comment(&state, path.into_inner()).await?;
    if !Ownership::check(&comment, identity.user_id).is_owner() {
        return Ok(redirect(post_url(comment.post_id)));
    }

    Ok(HttpResponse::Ok().json(ApiResponse::ok(CommentContext { comment })))
}

/// POST /comments/{id}/edit
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<CommentForm>,
) -> AppResult<HttpResponse> {
    let mut comment = find_comment(&state, path.into_inner()).await?;
    if !Ownership::check(&comment, identity.user_id).is_owner() {
        tracing::debug!(comment_id = %comment.id, user = %identity.username, "Edit by non-author ignored");
        return Ok(redirect(post_url(comment.post_id)));
    }

    let form = body.into_inner();
    form.validate()?;

    comment.text = form.text;
    let comment = state.comments.save(comment).await?;
    tracing::info!(comment_id = %comment.id, "Comment updated");

    Ok(redirect(post_url(comment.post_id)))
}

/// GET /comments/{id}/delete
pub async fn delete_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    edit_form(state, identity, path).await
}

/// POST /comments/{id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let comment = find_comment(&state, path.into_inner()).await?;
    if !Ownership::check(&comment, identity.user_id).is_owner() {
        tracing::debug!(comment_id = %comment.id, user = %identity.username, "Delete by non-author ignored");
        return Ok(redirect(post_url(comment.post_id)));
    }

    state.comments.delete(comment.id).await?;
    tracing::info!(comment_id = %comment.id, "Comment deleted");

    Ok(redirect(post_url(comment.post_id)))
}

async fn find_comment(state: &AppState, id: Uuid) -> AppResult<Comment> {
    state
        .comments
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", id)))
}
