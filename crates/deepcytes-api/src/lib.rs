//! # deepcytes-api
//!
//! HTTP surface of the deepcytes backend: account auth, file uploads, search
//! history, and the user directory.
//!
//! [`build_router`] wires every route onto an [`AppState`]; the binary in
//! `main.rs` adds configuration, logging, and lifecycle around it.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use deepcytes_core::defaults::CORS_MAX_AGE_SECS;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;

use handlers::{auth, files, health, search_history, users};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id: HeaderValue = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// FALLBACKS
// =============================================================================

/// 404 for any unmatched path or method.
pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    ApiError::RouteNotFound {
        method: method.to_string(),
        path,
    }
}

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic payload".to_string()
    }
}

/// Turn a handler panic into the 500 envelope. Panic details are only
/// exposed when `development` is set.
fn panic_handler(
    development: bool,
) -> impl Fn(Box<dyn Any + Send + 'static>) -> Response + Clone + Send + Sync + 'static {
    move |err| {
        let message = panic_message(err.as_ref());
        tracing::error!(subsystem = "api", panic = %message, "Unhandled error");

        let body = if development {
            json!({
                "error": "Internal server error",
                "details": message,
                "stack": std::backtrace::Backtrace::force_capture().to_string(),
            })
        } else {
            json!({
                "error": "Internal server error",
                "details": "Something went wrong. Please try again later.",
            })
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the application router.
///
/// Every method router carries the not-found fallback so a known path with
/// an unsupported method answers 404 like an unknown path.
pub fn build_router(state: AppState) -> Router {
    let allowed_origins = state.config.cors_origins();
    let development = state.config.development;

    Router::new()
        .route("/health", get(health::health_check).fallback(route_not_found))
        // Auth & profile
        .route("/register", post(auth::register).fallback(route_not_found))
        .route("/login", post(auth::login).fallback(route_not_found))
        .route(
            "/change-password",
            post(auth::change_password).fallback(route_not_found),
        )
        .route(
            "/profile/:email",
            get(auth::get_profile).fallback(route_not_found),
        )
        // Files
        .route(
            "/upload",
            post(files::upload_file)
                .layer(DefaultBodyLimit::disable())
                .fallback(route_not_found),
        )
        .route("/files", get(files::list_files).fallback(route_not_found))
        // Search history
        .route(
            "/search-history",
            post(search_history::save_search).fallback(route_not_found),
        )
        .route(
            "/search-history/user/:user_id",
            delete(search_history::clear_history).fallback(route_not_found),
        )
        .route(
            "/search-history/:key",
            get(search_history::list_history)
                .delete(search_history::delete_entry)
                .fallback(route_not_found),
        )
        // User directory
        .route(
            "/users",
            get(users::list_users)
                .post(users::create_user)
                .fallback(route_not_found),
        )
        .route(
            "/users/search",
            get(users::search_users).fallback(route_not_found),
        )
        // PATCH takes an account email, PUT and DELETE a directory id.
        .route(
            "/users/:key",
            patch(auth::update_name)
                .put(users::replace_user)
                .delete(users::delete_user)
                .fallback(route_not_found),
        )
        .fallback(route_not_found)
        // Middleware
        .layer(CatchPanicLayer::custom(panic_handler(development)))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(CORS_MAX_AGE_SECS)),
        )
        .with_state(state)
}
