//! API layer - HTTP handlers and routing
//!
//! Read-only JSON query surface for the news core, mounted under `/api/v1`:
//! - News index, trending, breaking, featured, archive and search
//! - Article detail and related articles
//! - Category, topic and author pages
//! - Video listings and detail

pub mod articles;
pub mod authors;
pub mod categories;
pub mod common;
pub mod middleware;
pub mod news;
pub mod responses;
pub mod topics;
pub mod videos;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

pub use middleware::{ApiError, AppState};

/// Build the `/api/v1` router
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .nest("/news", news::router())
        .nest("/articles", articles::router())
        .nest("/categories", categories::router())
        .nest("/topics", topics::router())
        .nest("/authors", authors::router())
        .nest("/videos", videos::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer(cors_origin));

    Router::new()
        .nest("/api/v1", build_api_router())
        .layer(middleware)
        .with_state(state)
}

/// `*` allows any origin. An origin that is not a valid header value is
/// logged and no cross-origin access is granted.
fn cors_layer(cors_origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let origin = cors_origin.trim();
    if origin == "*" {
        return cors.allow_origin(AllowOrigin::any());
    }
    match origin.parse::<HeaderValue>() {
        Ok(value) => cors.allow_origin(value),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}: {}", cors_origin, e);
            cors
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::test_context;
    use axum::http::{header, HeaderValue, StatusCode};

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let ctx = test_context().await;
        ctx.server
            .get("/api/v1/nothing-here")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_header_present() {
        let ctx = test_context().await;
        let response = ctx
            .server
            .get("/api/v1/news")
            .add_header(header::ORIGIN, HeaderValue::from_static("https://reader.example"))
            .await;
        response.assert_status_ok();
        assert_eq!(response.header(header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    }

    #[test]
    fn test_invalid_origin_does_not_panic() {
        let _ = super::cors_layer("bad\norigin");
        let _ = super::cors_layer("https://vishwavani.news");
    }
}
