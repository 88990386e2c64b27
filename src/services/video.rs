//! Video service
//!
//! Full-length videos and shorts with YouTube-derived playback fields.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::VideoRepository;
use crate::models::{
    CreateVideoInput, ListParams, PagedResult, PublishState, Video, VideoIndex, VideoType, VideoView,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

use super::article::generate_slug;

/// Default cache TTL for video listings (10 minutes)
const VIDEO_CACHE_TTL_SECS: u64 = 600;

const CACHE_KEY_VIDEO_INDEX: &str = "video:index:";
const CACHE_PATTERN_VIDEO: &str = "video:*";

#[derive(Debug, thiserror::Error)]
pub enum VideoServiceError {
    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Video slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Video service
pub struct VideoService {
    repo: Arc<dyn VideoRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl VideoService {
    pub fn new(repo: Arc<dyn VideoRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(VIDEO_CACHE_TTL_SECS),
        }
    }

    /// Create a draft video
    ///
    /// # Errors
    /// - `ValidationError` if the title is blank, the source URL is not an
    ///   absolute http(s) URL, or the duration is negative
    /// - `DuplicateSlug` if the slug is taken
    pub async fn create(&self, input: CreateVideoInput) -> Result<Video, VideoServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(VideoServiceError::ValidationError(
                "Video title cannot be empty".to_string(),
            ));
        }
        validate_source_url(&input.source_url)?;
        if matches!(input.duration, Some(d) if d < 0) {
            return Err(VideoServiceError::ValidationError(
                "Duration cannot be negative".to_string(),
            ));
        }

        let slug = match input.slug {
            Some(ref slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => generate_slug(&title),
        };
        if slug.is_empty() {
            return Err(VideoServiceError::ValidationError(
                "Video slug cannot be empty".to_string(),
            ));
        }
        if self.repo.exists_by_slug(&slug).await.context("Failed to check slug uniqueness")? {
            return Err(VideoServiceError::DuplicateSlug(slug));
        }

        let now = Utc::now();
        let video = Video {
            id: 0,
            title,
            slug,
            video_type: input.video_type,
            source_url: input.source_url.trim().to_string(),
            duration: input.duration,
            description: input.description,
            transcript: input.transcript,
            thumbnail: input.thumbnail,
            category_ids: input.category_ids,
            topic_ids: input.topic_ids,
            view_count: 0,
            is_featured: input.is_featured,
            is_trending: input.is_trending,
            state: PublishState::Draft,
            first_published_at: None,
            seo: input.seo,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&video).await?;
        self.invalidate().await;
        Ok(created)
    }

    pub async fn publish(&self, id: i64) -> Result<Video, VideoServiceError> {
        self.publish_at(id, Utc::now()).await
    }

    /// Publish with an explicit timestamp; `first_published_at` is set once
    pub async fn publish_at(&self, id: i64, at: DateTime<Utc>) -> Result<Video, VideoServiceError> {
        if !self.repo.publish(id, at).await? {
            return Err(VideoServiceError::NotFound(id.to_string()));
        }
        self.invalidate().await;
        self.get_by_id(id).await
    }

    pub async fn unpublish(&self, id: i64) -> Result<Video, VideoServiceError> {
        if !self.repo.unpublish(id).await? {
            return Err(VideoServiceError::NotFound(id.to_string()));
        }
        self.invalidate().await;
        self.get_by_id(id).await
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Video, VideoServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| VideoServiceError::NotFound(id.to_string()))
    }

    /// Live video by slug with playback fields
    pub async fn get_live_by_slug(&self, slug: &str) -> Result<VideoView, VideoServiceError> {
        match self.repo.get_by_slug(slug).await? {
            Some(video) if video.state == PublishState::Live => Ok(VideoView::from(video)),
            _ => Err(VideoServiceError::NotFound(slug.to_string())),
        }
    }

    /// Count a play. Failures are logged and reported as `false`.
    pub async fn record_view(&self, id: i64) -> bool {
        match self.repo.increment_view(id).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!("Failed to record view for video {}: {:#}", id, e);
                false
            }
        }
    }

    /// Newest full videos and shorts for the video landing page
    pub async fn index(&self, limit: i64) -> Result<VideoIndex, VideoServiceError> {
        let limit = limit.max(1);
        let cache_key = format!("{}{}", CACHE_KEY_VIDEO_INDEX, limit);
        if let Some(index) = self.cache.get::<VideoIndex>(&cache_key).await.ok().flatten() {
            return Ok(index);
        }

        let full_videos = self.repo.list_live(Some(VideoType::Full), limit, 0).await?;
        let shorts = self.repo.list_live(Some(VideoType::Short), limit, 0).await?;
        let index = VideoIndex {
            full_videos: full_videos.into_iter().map(VideoView::from).collect(),
            shorts: shorts.into_iter().map(VideoView::from).collect(),
        };

        let _ = self.cache.set(&cache_key, &index, self.cache_ttl).await;
        Ok(index)
    }

    /// Paginated live videos, optionally of one type, newest first
    pub async fn list(
        &self,
        video_type: Option<VideoType>,
        params: &ListParams,
    ) -> Result<PagedResult<VideoView>, VideoServiceError> {
        let items = self
            .repo
            .list_live(video_type, params.limit(), params.offset())
            .await?;
        let total = self.repo.count_live(video_type).await?;
        Ok(PagedResult::new(items, total, params).map(VideoView::from))
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_VIDEO).await;
    }
}

fn validate_source_url(raw: &str) -> Result<(), VideoServiceError> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| VideoServiceError::ValidationError(format!("Invalid source URL: {}", e)))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(VideoServiceError::ValidationError(
            "Source URL must be an http(s) URL".to_string(),
        ));
    }
    Ok(())
}
