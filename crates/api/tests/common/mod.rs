use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use atrium_api::auth::jwt::{Claims, JwtConfig};
use atrium_api::config::ServerConfig;
use atrium_api::routes;
use atrium_api::state::AppState;

/// Signing secret shared by the test config and the minted tokens.
pub const TEST_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
    }
}

/// Mint a valid access token the way the identity provider would.
pub fn mint_token(sub: i64, role: &str, merchant_id: Option<i64>) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub,
        role: role.to_string(),
        merchant_id,
        exp: now + 900,
        iat: now,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .expect("token encoding should succeed")
}

/// Build the full application router with all middleware layers.
///
/// Mirrors the router construction in `main.rs` so tests exercise the
/// same stack production uses. The pool connects lazily, so tests that
/// are rejected before any query (auth, RBAC, input validation) run
/// without a database.
pub fn build_test_app() -> Router {
    let config = test_config();

    let pool = sqlx::postgres::PgPoolOptions::new()
        .connect_lazy("postgres://localhost/atrium_test")
        .expect("lazy pool construction should succeed");

    let state = AppState {
        pool,
        config: Arc::new(config),
        event_bus: Arc::new(atrium_events::EventBus::default()),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}
