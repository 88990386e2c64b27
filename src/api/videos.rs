//! Video API endpoints
//!
//! - GET /api/v1/videos - Live videos, optionally of one type
//! - GET /api/v1/videos/index - Newest full videos and shorts
//! - GET /api/v1/videos/{slug} - Video detail, counts a view

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::common::{default_page, non_empty, LimitQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::ListResponse;
use crate::models::{ListParams, VideoIndex, VideoType, VideoView};

#[derive(Debug, Deserialize)]
pub struct VideoListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    /// full or short
    #[serde(rename = "type")]
    pub video_type: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_videos))
        .route("/index", get(video_index))
        .route("/{slug}", get(get_video))
}

/// GET /api/v1/videos
async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<ListResponse<VideoView>>, ApiError> {
    let video_type = match non_empty(query.video_type) {
        Some(raw) => Some(VideoType::from_str(&raw).ok_or_else(|| {
            ApiError::validation_error(format!("Unknown video type: {}", raw))
        })?),
        None => None,
    };
    let params = ListParams::new(query.page, state.ranking_service.config().page_size);
    let result = state.video_service.list(video_type, &params).await?;
    Ok(Json(ListResponse::from_paged(result)))
}

/// GET /api/v1/videos/index
async fn video_index(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<VideoIndex>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.ranking_service.config().page_size as i64);
    Ok(Json(state.video_service.index(limit).await?))
}

/// GET /api/v1/videos/{slug}
async fn get_video(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<VideoView>, ApiError> {
    let mut view = state.video_service.get_live_by_slug(&slug).await?;
    if state.video_service.record_view(view.video.id).await {
        view.video.view_count += 1;
    }
    Ok(Json(view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::test_context;
    use crate::models::CreateVideoInput;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_video_routes() {
        let ctx = test_context().await;
        let videos = &ctx.state.video_service;
        let full = videos
            .create(CreateVideoInput::new("Budget Explained", "https://youtu.be/budget01"))
            .await
            .unwrap();
        videos.publish(full.id).await.unwrap();
        let short = videos
            .create(CreateVideoInput::new("Toss Moment", "https://youtube.com/shorts/toss01").short())
            .await
            .unwrap();
        videos.publish(short.id).await.unwrap();

        let all: ListResponse<VideoView> = ctx.server.get("/api/v1/videos").await.json();
        assert_eq!(all.total, 2);

        let shorts: ListResponse<VideoView> = ctx
            .server
            .get("/api/v1/videos")
            .add_query_param("type", "short")
            .await
            .json();
        assert_eq!(shorts.total, 1);
        assert_eq!(shorts.items[0].video.slug, "toss-moment");

        ctx.server
            .get("/api/v1/videos")
            .add_query_param("type", "reel")
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let index: VideoIndex = ctx.server.get("/api/v1/videos/index").await.json();
        assert_eq!(index.full_videos.len(), 1);
        assert_eq!(index.shorts.len(), 1);

        let detail: VideoView = ctx.server.get("/api/v1/videos/budget-explained").await.json();
        assert_eq!(detail.embed_url.as_deref(), Some("https://www.youtube.com/embed/budget01"));
        assert_eq!(detail.video.view_count, 1);

        ctx.server
            .get("/api/v1/videos/missing")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }
}
