//! News index API endpoints
//!
//! - GET /api/v1/news - Latest live articles with optional filters
//! - GET /api/v1/news/trending - Most viewed inside a trailing window
//! - GET /api/v1/news/breaking - Breaking news strip
//! - GET /api/v1/news/featured - Featured strip
//! - GET /api/v1/news/archive - Live articles by year and month
//! - GET /api/v1/news/search - Article search

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_page, non_empty, LimitQuery, TrendingQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ArticleSummary, ArticlesResponse, ListResponse};
use crate::services::{ArchiveFilter, DateWindow, LatestFilter};

/// Query parameters for the news index
#[derive(Debug, Deserialize)]
pub struct LatestQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    pub category: Option<String>,
    pub topic: Option<String>,
    /// today, week or month; anything else is ignored
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ArchiveQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub query: String,
    pub articles: Vec<ArticleSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Build the news router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(latest))
        .route("/trending", get(trending))
        .route("/breaking", get(breaking))
        .route("/featured", get(featured))
        .route("/archive", get(archive))
        .route("/search", get(search))
}

/// GET /api/v1/news
async fn latest(
    State(state): State<AppState>,
    Query(query): Query<LatestQuery>,
) -> Result<Json<ListResponse<ArticleSummary>>, ApiError> {
    let filter = LatestFilter {
        category: non_empty(query.category),
        topic: non_empty(query.topic),
        date: query.date.as_deref().and_then(DateWindow::from_str),
    };
    let result = state.ranking_service.latest(&filter, query.page).await?;
    Ok(Json(ListResponse::from_paged(result)))
}

/// GET /api/v1/news/trending
async fn trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let articles = state.ranking_service.trending(query.days, query.limit).await?;
    Ok(Json(articles.into()))
}

/// GET /api/v1/news/breaking
async fn breaking(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let articles = state.ranking_service.breaking(query.limit).await?;
    Ok(Json(articles.into()))
}

/// GET /api/v1/news/featured
async fn featured(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ArticlesResponse>, ApiError> {
    let articles = state.ranking_service.featured(query.limit).await?;
    Ok(Json(articles.into()))
}

/// GET /api/v1/news/archive
async fn archive(
    State(state): State<AppState>,
    Query(query): Query<ArchiveQuery>,
) -> Result<Json<ListResponse<ArticleSummary>>, ApiError> {
    let filter = ArchiveFilter {
        year: query.year,
        month: query.month,
        category: non_empty(query.category),
    };
    let result = state.ranking_service.archive(&filter, query.page).await?;
    Ok(Json(ListResponse::from_paged(result)))
}

/// GET /api/v1/news/search
///
/// Index failures still answer 200, with an empty list and a warning.
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, ApiError> {
    let results = state.ranking_service.search(&query.q, query.limit).await?;
    Ok(Json(SearchResponse {
        query: results.query,
        articles: results.items.into_iter().map(Into::into).collect(),
        warning: results.warning,
    }))
}
