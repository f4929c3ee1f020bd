//! Profile editing for the signed-in user.

use actix_web::{HttpResponse, web};
use validator::Validate;

use blogicum_core::domain::ProfileChanges;
use blogicum_core::ports::BaseRepository;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::ProfileForm;
use blogicum_shared::validation::field_error;

use super::{current_user, profile_url, redirect, user_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /profile/edit
pub async fn edit_form(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = current_user(&state, &identity).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(user_response(user))))
}

/// POST /profile/edit
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<ProfileForm>,
) -> AppResult<HttpResponse> {
    let mut user = current_user(&state, &identity).await?;
    let form = body.into_inner();
    form.validate()?;

    if let Some(other) = state.users.find_by_username(&form.username).await? {
        if other.id != user.id {
            return Err(AppError::Validation(field_error(
                "username",
                "A user with that username already exists.",
            )));
        }
    }

    user.apply_profile(ProfileChanges {
        first_name: form.first_name,
        last_name: form.last_name,
        username: form.username,
        email: form.email.unwrap_or_default(),
    });
    let user = state.users.save(user).await?;
    tracing::info!(user_id = %user.id, username = %user.username, "Profile updated");

    Ok(redirect(profile_url(&user.username)))
}
