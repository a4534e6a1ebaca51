use std::net::IpAddr;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use tower::ServiceExt;

use pickup_api::config::{Config, Environment};
use pickup_api::entities::user;
use pickup_api::services::geocoding::GeocodeProvider;
use pickup_api::state::AppState;

pub const TEST_JWT_SECRET: &str = "test-secret-key-for-testing-only-32chars";

/// Stub geocoder returning a fixed coordinate pair (or a miss).
pub struct StubGeocoder(pub Option<(f64, f64)>);

#[async_trait::async_trait]
impl GeocodeProvider for StubGeocoder {
    async fn lookup(&self, _address: &str) -> anyhow::Result<Option<(f64, f64)>> {
        Ok(self.0)
    }
}

/// Build an app wired to a fresh in-memory sqlite database, plus a handle to
/// that database so tests can flip flags and count rows directly.
pub async fn test_app() -> (Router, DatabaseConnection) {
    test_app_with_geocoder(StubGeocoder(Some((-73.99, 40.73)))).await
}

pub async fn test_app_with_geocoder(geocoder: StubGeocoder) -> (Router, DatabaseConnection) {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();

    let state = AppState {
        db: db.clone(),
        config: Config {
            database_url: String::new(),
            server_host: IpAddr::from([127, 0, 0, 1]),
            server_port: 0,
            environment: Environment::Development,
            log_level: "warn".to_string(),
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_expiration_secs: 3600,
            mapbox_api_key: None,
            frontend_url: "http://localhost:3000".to_string(),
        },
        geocoder: Arc::new(geocoder),
    };

    (pickup_api::routes::router().with_state(state), db)
}

/// Send a request and return (status, body). `token` adds a bearer header.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = if let Some(body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
    } else {
        builder.body(Body::empty())
    }
    .unwrap_or_default();

    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(bytes.to_vec()).unwrap_or_default();

    (status, body_str)
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    send(app, "GET", uri, token, None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, String) {
    send(app, "POST", uri, token, Some(body)).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, String) {
    send(app, "PUT", uri, token, Some(body)).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, String) {
    send(app, "PATCH", uri, token, Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, String) {
    send(app, "DELETE", uri, token, None).await
}

/// Register a user and return their id.
pub async fn register_user(app: &Router, username: &str, email: &str, password: &str) -> i32 {
    let (status, body) = post_json(
        app,
        "/users",
        None,
        &json!({ "username": username, "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    i32::try_from(json["id"].as_i64().unwrap_or_default()).unwrap_or_default()
}

/// Log a user in and return the bearer token.
pub async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = post_json(
        app,
        "/auth/login",
        None,
        &json!({ "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    let json: serde_json::Value = serde_json::from_str(&body).unwrap_or_default();
    json["token"].as_str().unwrap_or_default().to_string()
}

/// Flip the admin flag directly in the store; there is no API path for it.
pub async fn set_admin(db: &DatabaseConnection, user_id: i32) {
    user::Entity::update_many()
        .col_expr(user::Column::IsAdmin, Expr::value(true))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await
        .ok();
}

/// Flip the blocked flag directly in the store.
pub async fn set_blocked(db: &DatabaseConnection, user_id: i32, blocked: bool) {
    user::Entity::update_many()
        .col_expr(user::Column::IsBlocked, Expr::value(blocked))
        .filter(user::Column::Id.eq(user_id))
        .exec(db)
        .await
        .ok();
}
