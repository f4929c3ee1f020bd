//! HTTP handlers and route configuration.
//!
//! Read views answer with an [`ApiResponse`](blogicum_shared::ApiResponse)
//! wrapping the page context. Successful form submissions answer with
//! `302 Found` and a `Location` header, the way a browser form flow would.

mod admin;
mod auth;
mod comments;
mod feed;
mod health;
mod pages;
mod posts;
mod profile;

#[cfg(test)]
mod tests;

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use serde::Deserialize;
use uuid::Uuid;

use blogicum_core::domain::User;
use blogicum_core::pagination::PageRequest;
use blogicum_core::ports::BaseRepository;
use blogicum_shared::ErrorResponse;
use blogicum_shared::dto::UserResponse;

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::observability::RequestId;
use crate::state::AppState;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    .route("/", web::get().to(feed::index))
    .route("/health", web::get().to(health::health_check))
    .route("/category/{slug}", web::get().to(feed::category_posts))
    // Fixed segments before the parameterised ones
    .service(
        web::resource("/profile/edit")
            .route(web::get().to(profile::edit_form))
            .route(web::post().to(profile::edit)),
    )
    .route("/profile/{username}", web::get().to(feed::profile))
    .service(
        web::resource("/posts/new")
            .route(web::get().to(posts::create_form))
            .route(web::post().to(posts::create)),
    )
    .route("/posts/{id}", web::get().to(posts::detail))
    .service(
        web::resource("/posts/{id}/edit")
            .route(web::get().to(posts::edit_form))
            .route(web::post().to(posts::edit)),
    )
    .service(
        web::resource("/posts/{id}/delete")
            .route(web::get().to(posts::delete_form))
            .route(web::post().to(posts::delete)),
    )
    .route("/posts/{id}/comment", web::post().to(comments::add))
    .service(
        web::resource("/comments/{id}/edit")
            .route(web::get().to(comments::edit_form))
            .route(web::post().to(comments::edit)),
    )
    .service(
        web::resource("/comments/{id}/delete")
            .route(web::get().to(comments::delete_form))
            .route(web::post().to(comments::delete)),
    )
    .service(
        web::scope("/auth")
            .route("/register", web::post().to(auth::register))
            .route("/login", web::post().to(auth::login))
            .route("/me", web::get().to(auth::me)),
    )
    .service(
        web::scope("/pages")
            .route("/about", web::get().to(pages::about))
            .route("/rules", web::get().to(pages::rules)),
    )
    .service(
        web::scope("/admin")
            .route("/categories", web::post().to(admin::create_category))
            .route("/categories/{slug}", web::post().to(admin::update_category))
            .route("/locations", web::post().to(admin::create_location))
            .route("/locations/{id}", web::post().to(admin::update_location)),
    )
    .default_service(web::to(not_found));
}

/// Fallback for unmatched routes.
async fn not_found(req: HttpRequest, request_id: RequestId) -> HttpResponse {
    HttpResponse::NotFound().json(
        ErrorResponse::not_found("The requested page does not exist")
            .with_instance(req.path())
            .with_request_id(request_id.as_str()),
    )
}

/// `?page=` query parameter of feed views.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::from_query(self.page.as_deref())
    }
}

/// `302 Found` pointing at `location`.
pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub(crate) fn post_url(id: Uuid) -> String {
    format!("/posts/{}", id)
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}", urlencoding::encode(username))
}

/// Load the account behind a token; a deleted account no longer authenticates.
pub(crate) async fn current_user(state: &AppState, identity: &Identity) -> AppResult<User> {
    state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)
}

pub(crate) fn user_response(user: User) -> UserResponse {
    UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        date_joined: user.created_at,
    }
}
