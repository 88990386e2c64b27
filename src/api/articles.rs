//! Article API endpoints
//!
//! - GET /api/v1/articles/{slug} - Live article detail, counts a view
//! - GET /api/v1/articles/{id}/related - Related live articles

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::common::LimitQuery;
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ArticleDetailResponse, ArticlesResponse};

/// Build the articles router
///
/// Both routes name the first segment `slug`; the related handler reads it
/// as a numeric id.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(get_article))
        .route("/{slug}/related", get(get_related))
}

/// GET /api/v1/articles/{slug}
async fn get_article(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ArticleDetailResponse>, ApiError> {
    let mut article = state.article_service.get_live_by_slug(&slug).await?;

    if let Some(count) = state.article_service.record_view(article.id).await {
        article.view_count = count;
    }

    let author = match state.author_service.get_by_id(article.author_id).await {
        Ok(author) => Some(author),
        Err(e) => {
            tracing::warn!("Author {} of article {} unavailable: {}", article.author_id, article.id, e);
            None
        }
    };
    let arena = state.category_service.arena().await?;
    let categories: Vec<_> = article
        .category_ids
        .iter()
        .filter_map(|id| arena.get(*id))
        .collect();

    let response = ArticleDetailResponse::new(article)
        .with_author(author)
        .with_categories(categories);
    Ok(Json(response))
}

/// GET /api/v1/articles/{id}/related
async fn get_related(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(state.ranking_service.config().related_limit as i64);
    let articles = state.article_service.related(id, limit).await?;
    Ok(Json(articles.into()))
}
