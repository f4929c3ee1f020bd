use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Post, PostContent, User};
use blogicum_core::ports::BaseRepository;
use blogicum_infra::{Argon2PasswordService, InMemoryStore, JwtConfig, JwtTokenService};

use super::configure_routes;
use crate::state::AppState;

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state.clone()))
                .configure(configure_routes),
        )
        .await
    };
}

fn test_state() -> AppState {
    AppState::in_memory(
        &InMemoryStore::new(),
        Arc::new(JwtTokenService::new(JwtConfig::default())),
        Arc::new(Argon2PasswordService::new()),
    )
}

async fn create_user(state: &AppState, username: &str) -> User {
    let user = User::new(
        username.to_string(),
        format!("{}@example.com", username),
        "unused-hash".to_string(),
    );
    state.users.save(user).await.unwrap()
}

async fn create_staff(state: &AppState, username: &str) -> User {
    let mut user = User::new(username.to_string(), String::new(), "unused-hash".to_string());
    user.is_staff = true;
    state.users.save(user).await.unwrap()
}

fn bearer(state: &AppState, user: &User) -> (header::HeaderName, String) {
    let token = state
        .tokens
        .generate_token(user.id, &user.username, user.roles())
        .unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

async fn create_category(state: &AppState, slug: &str, published: bool) -> Category {
    let mut category = Category::new(slug.to_uppercase(), slug.to_string(), String::new());
    category.is_published = published;
    state.categories.save(category).await.unwrap()
}

async fn create_post(
    state: &AppState,
    author: &User,
    category: Option<&Category>,
    pub_offset: Duration,
    published: bool,
) -> Post {
    let post = Post::new(
        author.id,
        PostContent {
            title: "A trip".to_string(),
            text: "Notes from the road".to_string(),
            pub_date: Utc::now() + pub_offset,
            is_published: published,
            category_id: category.map(|c| c.id),
            location_id: None,
        },
    );
    state.posts.save(post).await.unwrap()
}

async fn visible_post(state: &AppState, author: &User, category: &Category) -> Post {
    create_post(state, author, Some(category), -Duration::hours(1), true).await
}

async fn hidden_post(state: &AppState, author: &User, category: &Category) -> Post {
    create_post(state, author, Some(category), -Duration::hours(1), false).await
}

fn location(resp: &actix_web::dev::ServiceResponse) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn item_ids(body: &Value) -> Vec<String> {
    body["data"]["page_obj"]["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

fn post_body(title: &str) -> Value {
    json!({
        "title": title,
        "text": "Body",
        "pub_date": "2024-05-01T10:00:00Z",
    })
}

// =============================================================================
// FEEDS
// =============================================================================

#[actix_web::test]
async fn test_index_lists_only_publicly_visible_posts() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let travel = create_category(&state, "travel", true).await;
    let secret = create_category(&state, "secret", false).await;

    let visible = visible_post(&state, &author, &travel).await;
    create_post(&state, &author, Some(&travel), Duration::days(1), true).await;
    hidden_post(&state, &author, &travel).await;
    visible_post(&state, &author, &secret).await;
    create_post(&state, &author, None, -Duration::hours(1), true).await;

    for text in ["first", "second"] {
        let comment = Comment::new(visible.id, author.id, text.to_string());
        state.comments.save(comment).await.unwrap();
    }

    let app = init_app!(state);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(item_ids(&body), vec![visible.id.to_string()]);
    assert_eq!(body["data"]["page_obj"]["items"][0]["comment_count"], 2);
    assert_eq!(body["data"]["page_obj"]["items"][0]["author"]["username"], "ann");
}

#[actix_web::test]
async fn test_index_orders_newest_first() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let travel = create_category(&state, "travel", true).await;

    let older = create_post(&state, &author, Some(&travel), -Duration::days(2), true).await;
    let newer = create_post(&state, &author, Some(&travel), -Duration::days(1), true).await;

    let app = init_app!(state);
    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(
        item_ids(&body),
        vec![newer.id.to_string(), older.id.to_string()]
    );
}

#[actix_web::test]
async fn test_page_numbers_are_forgiving() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let travel = create_category(&state, "travel", true).await;
    for _ in 0..12 {
        visible_post(&state, &author, &travel).await;
    }

    let app = init_app!(state);

    let cases = [
        ("/", 1, 10),
        ("/?page=2", 2, 2),
        ("/?page=99", 2, 2),
        ("/?page=0", 2, 2),
        ("/?page=abc", 1, 10),
    ];
    for (uri, number, len) in cases {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);

        let body: Value = test::read_body_json(resp).await;
        let page = &body["data"]["page_obj"];
        assert_eq!(page["number"], number, "{}", uri);
        assert_eq!(page["num_pages"], 2, "{}", uri);
        assert_eq!(page["items"].as_array().unwrap().len(), len, "{}", uri);
    }
}

#[actix_web::test]
async fn test_empty_feed_has_one_empty_page() {
    let state = test_state();
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/?page=5").to_request()).await;
    let body: Value = test::read_body_json(resp).await;

    assert_eq!(body["data"]["page_obj"]["number"], 1);
    assert_eq!(body["data"]["page_obj"]["num_pages"], 1);
    assert!(body["data"]["page_obj"]["items"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn test_category_page() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let travel = create_category(&state, "travel", true).await;
    let food = create_category(&state, "food", true).await;
    let hidden = create_category(&state, "hidden", false).await;

    let in_travel = visible_post(&state, &author, &travel).await;
    visible_post(&state, &author, &food).await;
    hidden_post(&state, &author, &travel).await;

    let app = init_app!(state);

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/category/travel").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["category"]["slug"], "travel");
    assert_eq!(item_ids(&body), vec![in_travel.id.to_string()]);

    for uri in [format!("/category/{}", hidden.slug), "/category/missing".to_string()] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

#[actix_web::test]
async fn test_profile_shows_hidden_posts_only_to_owner() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let reader = create_user(&state, "bob").await;
    let travel = create_category(&state, "travel", true).await;

    visible_post(&state, &author, &travel).await;
    hidden_post(&state, &author, &travel).await;
    create_post(&state, &author, Some(&travel), Duration::days(3), true).await;

    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/profile/ann").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["profile"]["username"], "ann");
    assert_eq!(body["data"]["page_obj"]["total"], 1);

    let req = test::TestRequest::get()
        .uri("/profile/ann")
        .insert_header(bearer(&state, &reader))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["page_obj"]["total"], 1);

    let req = test::TestRequest::get()
        .uri("/profile/ann")
        .insert_header(bearer(&state, &author))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["page_obj"]["total"], 3);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/profile/nobody").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// POST DETAIL
// =============================================================================

#[actix_web::test]
async fn test_hidden_post_detail_is_visible_only_to_author() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let reader = create_user(&state, "bob").await;
    let travel = create_category(&state, "travel", true).await;
    let post = hidden_post(&state, &author, &travel).await;
    let uri = format!("/posts/{}", post.id);

    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&state, &reader))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&uri)
        .insert_header(bearer(&state, &author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["post"]["id"], post.id.to_string());
}

#[actix_web::test]
async fn test_detail_lists_comments_oldest_first() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let reader = create_user(&state, "bob").await;
    let travel = create_category(&state, "travel", true).await;
    let post = visible_post(&state, &author, &travel).await;

    let now = Utc::now();
    for (user, text, minutes_ago) in [(&author, "second", 1), (&reader, "first", 5)] {
        let mut comment = Comment::new(post.id, user.id, text.to_string());
        comment.created_at = now - Duration::minutes(minutes_ago);
        state.comments.save(comment).await.unwrap();
    }

    let app = init_app!(state);
    let req = test::TestRequest::get().uri(&format!("/posts/{}", post.id)).to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;

    let comments = body["data"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 2);
    assert_eq!(comments[0]["text"], "first");
    assert_eq!(comments[0]["author"]["username"], "bob");
    assert_eq!(comments[1]["text"], "second");
}

#[actix_web::test]
async fn test_unknown_or_malformed_post_id_is_not_found() {
    let state = test_state();
    let app = init_app!(state);

    for uri in [format!("/posts/{}", Uuid::new_v4()), "/posts/not-a-uuid".to_string()] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
}

// =============================================================================
// AUTHORING
// =============================================================================

#[actix_web::test]
async fn test_anonymous_user_is_sent_to_login() {
    let state = test_state();
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/posts/new").to_request()).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login?next=%2Fposts%2Fnew");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment", Uuid::new_v4()))
        .set_json(json!({"text": "hi"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(location(&resp).starts_with("/auth/login?next="));
}

#[actix_web::test]
async fn test_invalid_token_is_rejected() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/posts/new")
        .insert_header((header::AUTHORIZATION, "Bearer garbage"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_create_post() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let travel = create_category(&state, "travel", true).await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/posts/new")
        .insert_header(bearer(&state, &author))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["choices"]["categories"][0]["label"], "TRAVEL");

    let mut form = post_body("Hello");
    form["category_id"] = json!(travel.id);
    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header(bearer(&state, &author))
        .set_json(form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/ann");

    let req = test::TestRequest::get().uri("/").to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["page_obj"]["items"][0]["title"], "Hello");
    assert_eq!(body["data"]["page_obj"]["items"][0]["author_id"], author.id.to_string());
}

#[actix_web::test]
async fn test_create_post_rejects_invalid_form() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header(bearer(&state, &author))
        .set_json(json!({"title": "", "text": "Body"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["title"].is_array());
    assert!(body["errors"]["pub_date"].is_array());
    assert!(body["errors"].get("text").is_none());

    let mut form = post_body("Hello");
    form["category_id"] = json!(Uuid::new_v4());
    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header(bearer(&state, &author))
        .set_json(form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["category_id"].is_array());
}

#[actix_web::test]
async fn test_non_author_cannot_edit_or_delete_post() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let intruder = create_user(&state, "eve").await;
    let travel = create_category(&state, "travel", true).await;
    let post = visible_post(&state, &author, &travel).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit", post.id))
        .insert_header(bearer(&state, &intruder))
        .set_json(post_body("Defaced"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}", post.id));

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete", post.id))
        .insert_header(bearer(&state, &intruder))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}", post.id));

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored, post);
}

#[actix_web::test]
async fn test_author_edits_and_deletes_post() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let travel = create_category(&state, "travel", true).await;
    let post = visible_post(&state, &author, &travel).await;
    let comment = Comment::new(post.id, author.id, "mine".to_string());
    let comment = state.comments.save(comment).await.unwrap();
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit", post.id))
        .insert_header(bearer(&state, &author))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["post"]["title"], "A trip");

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/edit", post.id))
        .insert_header(bearer(&state, &author))
        .set_json(post_body("Renamed"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}", post.id));

    let stored = state.posts.find_by_id(post.id).await.unwrap().unwrap();
    assert_eq!(stored.title, "Renamed");
    assert_eq!(stored.author_id, author.id);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/delete", post.id))
        .insert_header(bearer(&state, &author))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/ann");

    assert!(state.posts.find_by_id(post.id).await.unwrap().is_none());
    assert!(state.comments.find_by_id(comment.id).await.unwrap().is_none());
}

#[actix_web::test]
async fn test_editing_missing_post_is_not_found() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}/edit", Uuid::new_v4()))
        .insert_header(bearer(&state, &author))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// COMMENTS
// =============================================================================

#[actix_web::test]
async fn test_comment_submission() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let reader = create_user(&state, "bob").await;
    let travel = create_category(&state, "travel", true).await;
    let post = visible_post(&state, &author, &travel).await;
    let uri = format!("/posts/{}/comment", post.id);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&state, &reader))
        .set_json(json!({"text": "   "}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}", post.id));
    assert_eq!(state.comments.count_for_post(post.id).await.unwrap(), 0);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&state, &reader))
        .set_json(json!({"text": "Lovely"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    let comments = state.comments.list_for_post(post.id).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].comment.text, "Lovely");
    assert_eq!(comments[0].author.id, reader.id);
}

#[actix_web::test]
async fn test_unreadable_comment_is_discarded() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let reader = create_user(&state, "bob").await;
    let travel = create_category(&state, "travel", true).await;
    let post = visible_post(&state, &author, &travel).await;
    let uri = format!("/posts/{}/comment", post.id);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&state, &reader))
        .set_json(json!({"text": null}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}", post.id));

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&state, &reader))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), format!("/posts/{}", post.id));

    let req = test::TestRequest::post()
        .uri(&uri)
        .insert_header(bearer(&state, &reader))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);

    assert_eq!(state.comments.count_for_post(post.id).await.unwrap(), 0);
}

#[actix_web::test]
async fn test_comment_on_missing_post_is_not_found() {
    let state = test_state();
    let reader = create_user(&state, "bob").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/posts/{}/comment", Uuid::new_v4()))
        .insert_header(bearer(&state, &reader))
        .set_json(json!({"text": "Hello"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_comment_edit_and_delete() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let reader = create_user(&state, "bob").await;
    let travel = create_category(&state, "travel", true).await;
    let post = visible_post(&state, &author, &travel).await;
    let comment = state
        .comments
        .save(Comment::new(post.id, reader.id, "Nice".to_string()))
        .await
        .unwrap();
    let post_uri = format!("/posts/{}", post.id);
    let app = init_app!(state);

    // The post author does not own the comment
    let req = test::TestRequest::post()
        .uri(&format!("/comments/{}/edit", comment.id))
        .insert_header(bearer(&state, &author))
        .set_json(json!({"text": "Rewritten"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), post_uri);
    let stored = state.comments.find_by_id(comment.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Nice");

    let req = test::TestRequest::post()
        .uri(&format!("/comments/{}/edit", comment.id))
        .insert_header(bearer(&state, &reader))
        .set_json(json!({"text": ""}))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let req = test::TestRequest::post()
        .uri(&format!("/comments/{}/edit", comment.id))
        .insert_header(bearer(&state, &reader))
        .set_json(json!({"text": "Very nice"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(location(&resp), post_uri);
    let stored = state.comments.find_by_id(comment.id).await.unwrap().unwrap();
    assert_eq!(stored.text, "Very nice");
    assert_eq!(stored.created_at, comment.created_at);

    let req = test::TestRequest::post()
        .uri(&format!("/comments/{}/delete", comment.id))
        .insert_header(bearer(&state, &author))
        .to_request();
    assert_eq!(location(&test::call_service(&app, req).await), post_uri);
    assert!(state.comments.find_by_id(comment.id).await.unwrap().is_some());

    let req = test::TestRequest::post()
        .uri(&format!("/comments/{}/delete", comment.id))
        .insert_header(bearer(&state, &reader))
        .to_request();
    assert_eq!(location(&test::call_service(&app, req).await), post_uri);
    assert!(state.comments.find_by_id(comment.id).await.unwrap().is_none());
}

// =============================================================================
// PROFILE AND ACCOUNTS
// =============================================================================

#[actix_web::test]
async fn test_profile_edit() {
    let state = test_state();
    let ann = create_user(&state, "ann").await;
    create_user(&state, "bob").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/profile/edit")
        .insert_header(bearer(&state, &ann))
        .set_json(json!({"username": "bob"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["username"].is_array());

    let req = test::TestRequest::post()
        .uri("/profile/edit")
        .insert_header(bearer(&state, &ann))
        .set_json(json!({
            "first_name": "Anna",
            "last_name": "Karenina",
            "username": "anna.k",
            "email": "anna@example.com",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/anna.k");

    let stored = state.users.find_by_id(ann.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "anna.k");
    assert_eq!(stored.full_name(), "Anna Karenina");
}

#[actix_web::test]
async fn test_profile_edit_accepts_blank_email() {
    let state = test_state();
    let ann = create_user(&state, "ann").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/profile/edit")
        .insert_header(bearer(&state, &ann))
        .set_json(json!({
            "username": "ann",
            "email": "",
            "first_name": "Ann",
            "last_name": "",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/profile/ann");

    let stored = state.users.find_by_id(ann.id).await.unwrap().unwrap();
    assert_eq!(stored.email, "");
    assert_eq!(stored.first_name, "Ann");
}

#[actix_web::test]
async fn test_register_login_and_me() {
    let state = test_state();
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": "leo",
            "email": "leo@example.com",
            "password": "war-and-peace",
            "password_confirm": "war-and-peace",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": "leo",
            "password": "another-one",
            "password_confirm": "another-one",
        }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::post()
        .uri("/auth/register")
        .set_json(json!({
            "username": "fyodor",
            "password": "crime-and-punishment",
            "password_confirm": "something-else",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"]["password_confirm"].is_array());

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"username": "leo", "password": "wrong-password"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"username": "leo", "password": "war-and-peace"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/auth/me")
        .insert_header((header::AUTHORIZATION, format!("Bearer {}", token)))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["username"], "leo");
    assert_eq!(body["email"], "leo@example.com");
}

// =============================================================================
// ADMINISTRATION
// =============================================================================

#[actix_web::test]
async fn test_login_with_unusable_stored_password_is_unauthorized() {
    let state = test_state();
    create_user(&state, "ann").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/auth/login")
        .set_json(json!({"username": "ann", "password": "unused-hash"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 401);
}

#[actix_web::test]
async fn test_category_management_requires_staff() {
    let state = test_state();
    let user = create_user(&state, "ann").await;
    let staff = create_staff(&state, "root").await;
    let app = init_app!(state);

    let form = json!({"title": "Travel", "slug": "travel"});

    let req = test::TestRequest::post()
        .uri("/admin/categories")
        .insert_header(bearer(&state, &user))
        .set_json(&form)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/admin/categories")
        .insert_header(bearer(&state, &staff))
        .set_json(&form)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/admin/categories")
        .insert_header(bearer(&state, &staff))
        .set_json(&form)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_unpublishing_category_hides_its_posts() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let staff = create_staff(&state, "root").await;
    let travel = create_category(&state, "travel", true).await;
    let post = visible_post(&state, &author, &travel).await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/admin/categories/travel")
        .insert_header(bearer(&state, &staff))
        .set_json(json!({"title": "Travel", "slug": "travel", "is_published": false}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert!(item_ids(&body).is_empty());

    let req = test::TestRequest::get().uri(&format!("/posts/{}", post.id)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/posts/{}", post.id))
        .insert_header(bearer(&state, &author))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_location_management() {
    let state = test_state();
    let staff = create_staff(&state, "root").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/admin/locations")
        .insert_header(bearer(&state, &staff))
        .set_json(json!({"name": "Moscow"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/admin/locations/{}", id))
        .insert_header(bearer(&state, &staff))
        .set_json(json!({"name": "Saint Petersburg", "is_published": false}))
        .to_request();
    let body: Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["data"]["name"], "Saint Petersburg");
    assert_eq!(body["data"]["is_published"], false);
}

// =============================================================================
// MISCELLANEOUS
// =============================================================================

#[actix_web::test]
async fn test_static_pages_and_health() {
    let state = test_state();
    let app = init_app!(state);

    for uri in ["/pages/about", "/pages/rules"] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
    }

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[actix_web::test]
async fn test_unknown_route_is_problem_document() {
    let state = test_state();
    let app = init_app!(state);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/no/such/page").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["instance"], "/no/such/page");
}

#[actix_web::test]
async fn test_malformed_json_is_bad_request() {
    let state = test_state();
    let author = create_user(&state, "ann").await;
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/posts/new")
        .insert_header(bearer(&state, &author))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
}
