use std::{any::Any, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method, StatusCode,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::{get, post},
};
use models::payloads::{ErrorResponse, MessageResponse};
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, warn};

use crate::{error::AppError, state::AppState};

pub mod auth;
pub mod installations;
pub mod meters;
pub mod upload;
pub mod users;
pub mod vendors;

pub async fn health_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        success: true,
        message: "Server is running".to_string(),
    })
}

async fn fallback_handler() -> AppError {
    AppError::NotFound("Route")
}

fn panic_handler(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(%detail, "Handler panicked");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Something went wrong!")),
    )
        .into_response()
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60));

    match HeaderValue::from_str(origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            warn!(%origin, "Invalid CORS_ORIGIN, cross origin requests are refused");
            cors
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    with_layers(api_router(), state)
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/users",
            get(users::list_handler).post(users::create_handler),
        )
        .route(
            "/users/{id}",
            get(users::get_handler)
                .put(users::update_handler)
                .delete(users::delete_handler),
        )
        .route(
            "/vendors",
            get(vendors::list_handler).post(vendors::create_handler),
        )
        .route(
            "/vendors/{id}",
            get(vendors::get_handler)
                .put(vendors::update_handler)
                .delete(vendors::delete_handler),
        )
        .route("/meters", get(meters::list_handler))
        .route("/meters/stats", get(meters::stats_handler))
        .route("/meters/assign", post(meters::assign_handler))
        .route("/meters/vendor/{vendor_id}", get(meters::vendor_handler))
        .route(
            "/installations",
            get(installations::list_handler).post(installations::create_handler),
        )
        .route(
            "/installations/sync-meter-statuses",
            post(installations::sync_handler),
        )
        .route(
            "/installations/{id}",
            get(installations::get_handler).put(installations::update_handler),
        )
        .route(
            "/upload",
            post(upload::upload_handler).layer(DefaultBodyLimit::max(upload::BODY_LIMIT)),
        )
}

fn with_layers(api: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api)
        .fallback(fallback_handler)
        .layer(CatchPanicLayer::custom(panic_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origin))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;
    use crate::{config::Config, database::MemoryStore};

    fn state() -> Arc<AppState> {
        let config = Config {
            port: 0,
            redis_url: None,
            cors_origin: "http://localhost:3000".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_expire_days: 30,
            bcrypt_cost: 4,
            frontend_url: "http://localhost:3000".to_string(),
            mail: None,
            images: None,
            admin: None,
        };

        AppState::from_parts(config, Arc::new(MemoryStore::default()), None, None)
    }

    async fn explode() -> &'static str {
        panic!("meter record exploded")
    }

    #[tokio::test]
    async fn test_panic_becomes_server_error() {
        let app = with_layers(api_router().route("/explode", get(explode)), state());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let response = reqwest::get(format!("http://{address}/api/explode"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = response.json().await.unwrap();
        assert!(!body.success);
        assert_eq!(body.error, "Something went wrong!");

        // The server keeps serving after the panic.
        let health = reqwest::get(format!("http://{address}/api/health"))
            .await
            .unwrap();
        assert_eq!(health.status(), StatusCode::OK);
    }
}
