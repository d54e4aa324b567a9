//! API integration tests.
//!
//! These drive the full router (middleware included) against a mock
//! database with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use chrono::Utc;
use maplit::btreemap;
use recipebox_api::{AppState, ChannelRegistry, app};
use recipebox_common::ErrorLog;
use recipebox_core::{
    ActivityService, BookmarkService, CommentService, FeedService, FollowingService,
    HealthService, LikeService, NotificationService, RecipeService, UserService,
};
use recipebox_db::entities::{following, user};
use recipebox_db::repositories::{
    ActivityRepository, BookmarkRepository, CommentRepository, FollowingRepository,
    LikeRepository, NotificationRepository, RecipeRepository, UserRepository,
};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
use std::sync::Arc;
use tower::ServiceExt;

const TOKEN: &str = "valid-token";

fn test_user(id: i64) -> user::Model {
    user::Model {
        id,
        name: format!("user{id}"),
        email: format!("user{id}@example.com"),
        avatar_url: None,
        is_admin: false,
        password_hash: "$argon2id$unused".to_string(),
        token: Some(TOKEN.to_string()),
        created_at: Utc::now().into(),
    }
}

/// Build application state over a single mock connection. Queries are
/// answered in the order they are issued.
fn create_test_state(db: MockDatabase) -> AppState {
    let db = Arc::new(db.into_connection());
    let error_log = ErrorLog::new(10);
    let registry = ChannelRegistry::new();

    let user_repo = UserRepository::new(Arc::clone(&db));
    let recipe_repo = RecipeRepository::new(Arc::clone(&db));
    let following_repo = FollowingRepository::new(Arc::clone(&db));
    let activity_repo = ActivityRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    let activity_service = ActivityService::new(activity_repo.clone(), recipe_repo.clone());

    let mut notification_service = NotificationService::new(
        notification_repo,
        recipe_repo.clone(),
        user_repo.clone(),
        following_repo.clone(),
    );
    notification_service.set_event_publisher(Arc::new(registry.clone()));

    AppState {
        user_service: UserService::new(user_repo.clone()),
        following_service: FollowingService::new(following_repo.clone(), user_repo),
        recipe_service: RecipeService::new(recipe_repo.clone(), activity_service.clone()),
        comment_service: CommentService::new(
            CommentRepository::new(Arc::clone(&db)),
            recipe_repo.clone(),
            activity_service.clone(),
        ),
        like_service: LikeService::new(
            LikeRepository::new(Arc::clone(&db)),
            recipe_repo.clone(),
            activity_service.clone(),
        ),
        bookmark_service: BookmarkService::new(
            BookmarkRepository::new(Arc::clone(&db)),
            recipe_repo,
            activity_service,
        ),
        feed_service: FeedService::new(following_repo, activity_repo, "https://recipes.test"),
        notification_service,
        health_service: HealthService::new(Arc::clone(&db), error_log.clone()),
        registry,
        error_log,
    }
}

/// Mock whose first answer resolves the bearer token to user 1.
fn authenticated_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[test_user(1)]])
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn authed(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_feed_requires_authentication() {
    let app = app(create_test_state(MockDatabase::new(DatabaseBackend::Postgres)));

    let response = send(app, get("/activity-feed")).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_feed_is_empty_when_following_nobody() {
    let db = authenticated_db().append_query_results([Vec::<following::Model>::new()]);
    let app = app(create_test_state(db));

    let response = send(app, authed("GET", "/activity-feed")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-next-cursor").is_none());
    let body = json_body(response).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_feed_rejects_malformed_cursor() {
    let app = app(create_test_state(authenticated_db()));

    let response = send(app, authed("GET", "/activity-feed?cursor=garbage")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_mark_read_returns_no_content() {
    let db = authenticated_db().append_exec_results([MockExecResult {
        last_insert_id: 0,
        rows_affected: 2,
    }]);
    let app = app(create_test_state(db));

    let response = send(app, authed("PUT", "/notifications/mark-read")).await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_unread_count() {
    let db = authenticated_db().append_query_results([vec![btreemap! {
        "num_items" => Into::<Value>::into(3i64),
    }]]);
    let app = app(create_test_state(db));

    let response = send(app, authed("GET", "/notifications/unread-count")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["count"], 3);
}

#[tokio::test]
async fn test_list_notifications_pushes_to_caller_room() {
    let now = Utc::now().fixed_offset();
    let db = authenticated_db().append_query_results([vec![btreemap! {
        "id" => Into::<Value>::into(5i64),
        "notification_type" => Into::<Value>::into("like"),
        "is_read" => Into::<Value>::into(false),
        "created_at" => Into::<Value>::into(now),
        "actor_id" => Into::<Value>::into(2i64),
        "actor_name" => Into::<Value>::into("bob"),
        "recipe_id" => Into::<Value>::into(Some(10i64)),
        "recipe_title" => Into::<Value>::into(Some("Ramen".to_string())),
    }]]);
    let state = create_test_state(db);
    let (_conn, mut frames) = state.registry.connect(1).await;
    let app = app(state);

    let response = send(app, authed("GET", "/notifications")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"][0]["type"], "like");
    assert_eq!(body["data"][0]["fromUser"]["name"], "bob");
    assert_eq!(body["data"][0]["recipe"]["recipeId"], 10);

    let frame: serde_json::Value = serde_json::from_str(&frames.recv().await.unwrap()).unwrap();
    assert_eq!(frame["type"], "newNotification");
    assert_eq!(frame["body"][0]["id"], 5);
}

#[tokio::test]
async fn test_follow_self_is_invalid() {
    let app = app(create_test_state(authenticated_db()));

    let response = send(app, authed("POST", "/users/1/follow")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "INVALID_OPERATION");
}

#[tokio::test]
async fn test_admin_route_forbidden_for_regular_user() {
    let app = app(create_test_state(authenticated_db()));

    let response = send(app, authed("DELETE", "/admin/users/2")).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_signup_validates_password_length() {
    let app = app(create_test_state(MockDatabase::new(DatabaseBackend::Postgres)));

    let request = Request::builder()
        .method("POST")
        .uri("/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            r#"{"email":"new@example.com","name":"New","password":"short"}"#,
        ))
        .unwrap();

    let response = send(app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_server_errors_are_recorded_for_health() {
    // No answer queued for the count query, so the database call fails.
    let state = create_test_state(authenticated_db());
    let error_log = state.error_log.clone();
    let app = app(state);

    let response = send(app, authed("GET", "/notifications/unread-count")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let recent = error_log.recent();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].source, "http");
    assert!(recent[0].message.contains("/notifications/unread-count"));
}

#[tokio::test]
async fn test_health_reports_ok() {
    let app = app(create_test_state(MockDatabase::new(DatabaseBackend::Postgres)));

    let response = send(app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
    assert_eq!(body["recentErrors"], serde_json::json!([]));
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = app(create_test_state(MockDatabase::new(DatabaseBackend::Postgres)));

    let response = send(app, get("/nonexistent")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
