//! Shared API state and error mapping
//!
//! Every handler returns `Result<_, ApiError>`. Service errors convert into
//! `ApiError` through the `From` impls below, so handlers can use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cache::Cache;
use crate::config::RankingConfig;
use crate::db::repositories::{
    SqlxArticleRepository, SqlxAuthorRepository, SqlxCategoryRepository, SqlxTopicRepository,
    SqlxVideoRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    ArticleService, ArticleServiceError, AuthorService, AuthorServiceError, CategoryService,
    CategoryServiceError, RankingService, RankingServiceError, SqlSearchIndex, TopicService,
    TopicServiceError, VideoService, VideoServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub article_service: Arc<ArticleService>,
    pub author_service: Arc<AuthorService>,
    pub category_service: Arc<CategoryService>,
    pub topic_service: Arc<TopicService>,
    pub video_service: Arc<VideoService>,
    pub ranking_service: Arc<RankingService>,
}

impl AppState {
    /// Wire repositories and services over a migrated pool
    ///
    /// Ensures the system author exists before the article service is built.
    pub async fn build(
        pool: DynDatabasePool,
        cache: Arc<Cache>,
        ranking: RankingConfig,
    ) -> anyhow::Result<Self> {
        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let author_repo = SqlxAuthorRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());
        let topic_repo = SqlxTopicRepository::boxed(pool.clone());
        let video_repo = SqlxVideoRepository::boxed(pool.clone());

        let author_service = Arc::new(AuthorService::new(
            author_repo.clone(),
            article_repo.clone(),
            cache.clone(),
        ));
        let system_author_id = author_service.init_system_author().await?;
        tracing::debug!("System author id: {}", system_author_id);

        let category_service = Arc::new(CategoryService::new(category_repo.clone(), cache.clone()));
        let topic_service = Arc::new(TopicService::new(topic_repo.clone(), cache.clone()));
        let article_service = Arc::new(ArticleService::new(
            article_repo.clone(),
            author_repo,
            category_repo,
            topic_repo,
            cache.clone(),
            system_author_id,
        ));
        let video_service = Arc::new(VideoService::new(video_repo, cache.clone()));
        let ranking_service = Arc::new(RankingService::new(
            article_repo.clone(),
            category_service.clone(),
            topic_service.clone(),
            author_service.clone(),
            SqlSearchIndex::boxed(article_repo),
            cache,
            ranking,
        ));

        Ok(Self {
            pool,
            article_service,
            author_service,
            category_service,
            topic_service,
            video_service,
            ranking_service,
        })
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    /// Log the cause and hide it from the client
    fn internal(err: anyhow::Error) -> Self {
        tracing::error!("Request failed: {:#}", err);
        Self::internal_error("Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<ArticleServiceError> for ApiError {
    fn from(err: ArticleServiceError) -> Self {
        match err {
            ArticleServiceError::NotFound(_) => Self::not_found(err.to_string()),
            ArticleServiceError::ValidationError(_) => Self::validation_error(err.to_string()),
            ArticleServiceError::DuplicateSlug(_) => Self::conflict(err.to_string()),
            ArticleServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<AuthorServiceError> for ApiError {
    fn from(err: AuthorServiceError) -> Self {
        match err {
            AuthorServiceError::NotFound(_) => Self::not_found(err.to_string()),
            AuthorServiceError::ValidationError(_) => Self::validation_error(err.to_string()),
            AuthorServiceError::DuplicateSlug(_)
            | AuthorServiceError::DuplicateAccount(_)
            | AuthorServiceError::Protected(..) => Self::conflict(err.to_string()),
            AuthorServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<CategoryServiceError> for ApiError {
    fn from(err: CategoryServiceError) -> Self {
        match err {
            CategoryServiceError::NotFound(_) => Self::not_found(err.to_string()),
            CategoryServiceError::ValidationError(_)
            | CategoryServiceError::ParentNotFound(_)
            | CategoryServiceError::CircularReference => Self::validation_error(err.to_string()),
            CategoryServiceError::DuplicateSlug(_) => Self::conflict(err.to_string()),
            CategoryServiceError::CycleDetected(id) => {
                tracing::error!("Category hierarchy loops at {}", id);
                Self::new("CYCLE_DETECTED", err.to_string())
            }
            CategoryServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<TopicServiceError> for ApiError {
    fn from(err: TopicServiceError) -> Self {
        match err {
            TopicServiceError::NotFound(_) => Self::not_found(err.to_string()),
            TopicServiceError::ValidationError(_) => Self::validation_error(err.to_string()),
            TopicServiceError::DuplicateSlug(_) => Self::conflict(err.to_string()),
            TopicServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<VideoServiceError> for ApiError {
    fn from(err: VideoServiceError) -> Self {
        match err {
            VideoServiceError::NotFound(_) => Self::not_found(err.to_string()),
            VideoServiceError::ValidationError(_) => Self::validation_error(err.to_string()),
            VideoServiceError::DuplicateSlug(_) => Self::conflict(err.to_string()),
            VideoServiceError::InternalError(e) => Self::internal(e),
        }
    }
}

impl From<RankingServiceError> for ApiError {
    fn from(err: RankingServiceError) -> Self {
        match err {
            RankingServiceError::NotFound(_) => Self::not_found(err.to_string()),
            RankingServiceError::ValidationError(_) => Self::validation_error(err.to_string()),
            RankingServiceError::InternalError(e) => Self::internal(e),
        }
    }
}
