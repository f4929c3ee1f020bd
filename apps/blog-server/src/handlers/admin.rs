//! Staff-only management of categories and locations.

use actix_web::{HttpResponse, web};
use uuid::Uuid;
use validator::Validate;

use blogicum_core::domain::{Category, Location, ROLE_STAFF};
use blogicum_core::ports::BaseRepository;
use blogicum_shared::ApiResponse;
use blogicum_shared::dto::{CategoryForm, LocationForm};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn require_staff(identity: &Identity) -> AppResult<()> {
    if identity.has_role(ROLE_STAFF) {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// POST /admin/categories
pub async fn create_category(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CategoryForm>,
) -> AppResult<HttpResponse> {
    require_staff(&identity)?;
    let form = body.into_inner();
    form.validate()?;

    if state.categories.find_by_slug(&form.slug).await?.is_some() {
        return Err(slug_taken(&form.slug));
    }

    let mut category = Category::new(form.title, form.slug, form.description);
    category.is_published = form.is_published;
    let category = state.categories.save(category).await?;
    tracing::info!(slug = %category.slug, "Category created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(category)))
}

/// POST /admin/categories/{slug}
pub async fn update_category(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<CategoryForm>,
) -> AppResult<HttpResponse> {
    require_staff(&identity)?;
    let slug = path.into_inner();
    let form = body.into_inner();
    form.validate()?;

    let mut category = state
        .categories
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", slug)))?;

    if form.slug != category.slug && state.categories.find_by_slug(&form.slug).await?.is_some() {
        return Err(slug_taken(&form.slug));
    }

    category.title = form.title;
    category.slug = form.slug;
    category.description = form.description;
    category.is_published = form.is_published;
    let category = state.categories.save(category).await?;
    tracing::info!(slug = %category.slug, published = category.is_published, "Category updated");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(category)))
}

/// POST /admin/locations
pub async fn create_location(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<LocationForm>,
) -> AppResult<HttpResponse> {
    require_staff(&identity)?;
    let form = body.into_inner();
    form.validate()?;

    let mut location = Location::new(form.name);
    location.is_published = form.is_published;
    let location = state.locations.save(location).await?;
    tracing::info!(location_id = %location.id, "Location created");

    Ok(HttpResponse::Created().json(ApiResponse::ok(location)))
}

/// POST /admin/locations/{id}
pub async fn update_location(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<LocationForm>,
) -> AppResult<HttpResponse> {
    require_staff(&identity)?;
    let id = path.into_inner();
    let form = body.into_inner();
    form.validate()?;

    let mut location = state
        .locations
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Location {} not found", id)))?;

    location.name = form.name;
    location.is_published = form.is_published;
    let location = state.locations.save(location).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(location)))
}

fn slug_taken(slug: &str) -> AppError {
    AppError::Conflict(format!("Category with slug {} already exists", slug))
}
