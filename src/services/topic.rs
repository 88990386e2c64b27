//! Topic service
//!
//! Flat topics with a symmetric "related topics" relation and derived
//! counters (views, followers, article count).

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::TopicRepository;
use crate::models::{CreateTopicInput, Topic, TopicDetail, UpdateTopicInput};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::article::generate_slug;

/// Default cache TTL for topics (30 minutes)
const TOPIC_CACHE_TTL_SECS: u64 = 1800;

const CACHE_KEY_TOPIC_DETAIL: &str = "topic:detail:";
const CACHE_KEY_TOPIC_ALL: &str = "topic:all";
const CACHE_PATTERN_TOPIC: &str = "topic:*";

/// Error types for topic service operations
#[derive(Debug, thiserror::Error)]
pub enum TopicServiceError {
    #[error("Topic slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Topic not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Topic service
pub struct TopicService {
    repo: Arc<dyn TopicRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl TopicService {
    pub fn new(repo: Arc<dyn TopicRepository>, cache: Arc<Cache>) -> Self {
        Self {
            repo,
            cache,
            cache_ttl: Duration::from_secs(TOPIC_CACHE_TTL_SECS),
        }
    }

    /// Create a new topic
    ///
    /// # Errors
    /// - `ValidationError` if the name is blank
    /// - `DuplicateSlug` if the slug is taken
    pub async fn create(&self, input: CreateTopicInput) -> Result<Topic, TopicServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(TopicServiceError::ValidationError(
                "Topic name cannot be empty".to_string(),
            ));
        }

        let slug = match input.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => generate_slug(&name),
        };
        if slug.is_empty() {
            return Err(TopicServiceError::ValidationError(
                "Topic slug cannot be empty".to_string(),
            ));
        }
        if self.repo.exists_by_slug(&slug).await.context("Failed to check slug uniqueness")? {
            return Err(TopicServiceError::DuplicateSlug(slug));
        }

        let now = Utc::now();
        let topic = Topic {
            id: 0,
            name,
            slug,
            description: input.description,
            featured_image: input.featured_image,
            is_featured: input.is_featured,
            is_trending: input.is_trending,
            view_count: 0,
            follower_count: 0,
            article_count: 0,
            include_in_feed: input.include_in_feed.unwrap_or(true),
            feed_description: input.feed_description,
            seo: input.seo,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&topic).await?;
        self.invalidate().await;
        Ok(created)
    }

    /// Update a topic's editable fields
    pub async fn update(&self, id: i64, input: UpdateTopicInput) -> Result<Topic, TopicServiceError> {
        let mut topic = self.get_by_id(id).await?;
        if !input.has_changes() {
            return Ok(topic);
        }

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(TopicServiceError::ValidationError(
                    "Topic name cannot be empty".to_string(),
                ));
            }
            topic.name = name.trim().to_string();
        }
        if let Some(description) = input.description {
            topic.description = description;
        }
        if let Some(featured_image) = input.featured_image {
            topic.featured_image = featured_image;
        }
        if let Some(is_featured) = input.is_featured {
            topic.is_featured = is_featured;
        }
        if let Some(is_trending) = input.is_trending {
            topic.is_trending = is_trending;
        }
        if let Some(include_in_feed) = input.include_in_feed {
            topic.include_in_feed = include_in_feed;
        }
        if let Some(feed_description) = input.feed_description {
            topic.feed_description = feed_description;
        }
        if let Some(seo) = input.seo {
            topic.seo = seo;
        }

        let updated = self.repo.update(&topic).await?;
        self.invalidate().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), TopicServiceError> {
        self.get_by_id(id).await?;
        self.repo.delete(id).await?;
        self.invalidate().await;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Topic, TopicServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| TopicServiceError::NotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Topic, TopicServiceError> {
        self.repo
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| TopicServiceError::NotFound(slug.to_string()))
    }

    /// All topics by name
    pub async fn list(&self) -> Result<Vec<Topic>, TopicServiceError> {
        if let Some(cached) = self.cache.get::<Vec<Topic>>(CACHE_KEY_TOPIC_ALL).await.ok().flatten() {
            return Ok(cached);
        }
        let topics = self.repo.list().await?;
        let _ = self.cache.set(CACHE_KEY_TOPIC_ALL, &topics, self.cache_ttl).await;
        Ok(topics)
    }

    /// Topic page payload: the topic plus its related topics
    pub async fn detail(&self, slug: &str) -> Result<TopicDetail, TopicServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_TOPIC_DETAIL, slug);
        if let Some(detail) = self.cache.get::<TopicDetail>(&cache_key).await.ok().flatten() {
            return Ok(detail);
        }

        let topic = self.get_by_slug(slug).await?;
        let related_topics = self.repo.related(topic.id).await?;
        let detail = TopicDetail {
            topic,
            related_topics,
        };

        let _ = self.cache.set(&cache_key, &detail, self.cache_ttl).await;
        Ok(detail)
    }

    /// Relate two topics in both directions. Relating a topic to itself is a no-op.
    pub async fn add_related(&self, a: i64, b: i64) -> Result<(), TopicServiceError> {
        self.get_by_id(a).await?;
        self.get_by_id(b).await?;
        if a == b {
            tracing::debug!("Skipping self-relation for topic {}", a);
            return Ok(());
        }
        self.repo.add_relation(a, b).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Remove the relation in both directions
    pub async fn remove_related(&self, a: i64, b: i64) -> Result<(), TopicServiceError> {
        self.repo.remove_relation(a, b).await?;
        self.invalidate().await;
        Ok(())
    }

    pub async fn related_topics(&self, id: i64) -> Result<Vec<Topic>, TopicServiceError> {
        self.get_by_id(id).await?;
        Ok(self.repo.related(id).await?)
    }

    /// Count a topic page view. Failures are logged and reported as `false`.
    pub async fn record_view(&self, id: i64) -> bool {
        match self.repo.increment_view(id).await {
            Ok(updated) => updated,
            Err(e) => {
                tracing::warn!("Failed to record view for topic {}: {:#}", id, e);
                false
            }
        }
    }

    pub async fn follow(&self, id: i64) -> Result<(), TopicServiceError> {
        self.adjust_followers(id, 1).await
    }

    /// Follower count never drops below zero
    pub async fn unfollow(&self, id: i64) -> Result<(), TopicServiceError> {
        self.adjust_followers(id, -1).await
    }

    async fn adjust_followers(&self, id: i64, delta: i64) -> Result<(), TopicServiceError> {
        if !self.repo.adjust_followers(id, delta).await? {
            return Err(TopicServiceError::NotFound(id.to_string()));
        }
        self.invalidate().await;
        Ok(())
    }

    /// Recount every article tagged with the topic, drafts included
    pub async fn recompute_article_count(&self, id: i64) -> Result<i64, TopicServiceError> {
        self.get_by_id(id).await?;
        let count = self.repo.count_articles(id).await?;
        self.repo.set_article_count(id, count).await?;
        self.invalidate().await;
        Ok(count)
    }

    /// Recount every topic
    pub async fn recompute_all(&self) -> Result<usize, TopicServiceError> {
        let topics = self.repo.list().await?;
        for topic in &topics {
            let count = self.repo.count_articles(topic.id).await?;
            self.repo.set_article_count(topic.id, count).await?;
        }
        self.invalidate().await;
        Ok(topics.len())
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_TOPIC).await;
    }
}
