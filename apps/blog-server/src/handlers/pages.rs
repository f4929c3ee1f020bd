//! Static pages.

use actix_web::HttpResponse;

use blogicum_shared::ApiResponse;
use blogicum_shared::dto::PageContent;

const ABOUT: &str = "Blogicum is a place to share stories about trips, \
    places and everyday life with other readers.";

const RULES: &str = "Be polite to other authors. Publish only your own texts. \
    Posts and comments that break these rules are removed.";

/// GET /pages/about
pub async fn about() -> HttpResponse {
    page("About", ABOUT)
}

/// GET /pages/rules
pub async fn rules() -> HttpResponse {
    page("Rules", RULES)
}

fn page(title: &str, body: &str) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(PageContent {
        title: title.to_string(),
        body: body.to_string(),
    }))
}
