//! Category API endpoints
//!
//! Handles HTTP requests for the category taxonomy:
//! - GET /api/v1/categories - Menu tree
//! - GET /api/v1/categories/popular - Categories by live article count
//! - GET /api/v1/categories/{slug} - Category with hierarchy and children
//! - GET /api/v1/categories/{slug}/articles - Live articles in category

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{LimitQuery, PageQuery};
use crate::api::middleware::{ApiError, AppState};
use crate::api::responses::{ArticleSummary, ListResponse};
use crate::models::{CategoryTree, CategoryWithCount};
use crate::services::CategoryDetail;

/// Response for category tree
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTreeResponse {
    pub categories: Vec<CategoryTree>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PopularCategoriesResponse {
    pub categories: Vec<CategoryWithCount>,
}

/// Build the categories router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_category_tree))
        .route("/popular", get(get_popular))
        .route("/{slug}", get(get_category))
        .route("/{slug}/articles", get(get_category_articles))
}

/// GET /api/v1/categories
async fn get_category_tree(
    State(state): State<AppState>,
) -> Result<Json<CategoryTreeResponse>, ApiError> {
    let categories = state.category_service.tree().await?;
    Ok(Json(CategoryTreeResponse { categories }))
}

/// GET /api/v1/categories/popular
async fn get_popular(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<PopularCategoriesResponse>, ApiError> {
    let categories = state.ranking_service.popular_categories(query.limit).await?;
    Ok(Json(PopularCategoriesResponse { categories }))
}

/// GET /api/v1/categories/{slug}
async fn get_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryDetail>, ApiError> {
    Ok(Json(state.category_service.detail(&slug).await?))
}

/// GET /api/v1/categories/{slug}/articles
async fn get_category_articles(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<ArticleSummary>>, ApiError> {
    let result = state.ranking_service.by_category(&slug, query.page).await?;
    Ok(Json(ListResponse::from_paged(result)))
}
