//! Article service
//!
//! Implements business logic for news articles:
//! - Create, read, update, delete articles
//! - Publish state transitions (`first_published_at` is set once)
//! - Best-effort view counting
//! - Related articles
//! - Cache invalidation of article and news read models

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{
    ArticleRepository, AuthorRepository, CategoryRepository, TopicRepository,
};
use crate::models::{Article, CreateArticleInput, PublishState, UpdateArticleInput};
use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use std::time::Duration;

/// Default cache TTL for single articles (10 minutes)
const ARTICLE_CACHE_TTL_SECS: u64 = 600;

/// Cache key prefixes
const CACHE_KEY_ARTICLE_BY_SLUG: &str = "article:slug:";
const CACHE_KEY_ARTICLE_RELATED: &str = "article:related:";
const CACHE_PATTERN_ARTICLE: &str = "article:*";
const CACHE_PATTERN_NEWS: &str = "news:*";

/// Error types for article service operations
#[derive(Debug, thiserror::Error)]
pub enum ArticleServiceError {
    /// Article not found
    #[error("Article not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Duplicate slug
    #[error("Article slug already exists: {0}")]
    DuplicateSlug(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Article service for news articles
pub struct ArticleService {
    repo: Arc<dyn ArticleRepository>,
    author_repo: Arc<dyn AuthorRepository>,
    category_repo: Arc<dyn CategoryRepository>,
    topic_repo: Arc<dyn TopicRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
    system_author_id: i64,
}

impl ArticleService {
    /// Create a new article service
    ///
    /// # Arguments
    /// * `system_author_id` - Author assigned to articles created without one,
    ///   as returned by `AuthorService::init_system_author`
    pub fn new(
        repo: Arc<dyn ArticleRepository>,
        author_repo: Arc<dyn AuthorRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        topic_repo: Arc<dyn TopicRepository>,
        cache: Arc<Cache>,
        system_author_id: i64,
    ) -> Self {
        Self {
            repo,
            author_repo,
            category_repo,
            topic_repo,
            cache,
            cache_ttl: Duration::from_secs(ARTICLE_CACHE_TTL_SECS),
            system_author_id,
        }
    }

    pub fn system_author_id(&self) -> i64 {
        self.system_author_id
    }

    /// Create a new draft article
    ///
    /// # Errors
    /// - `ValidationError` if title or intro is empty, or a referenced
    ///   author, category or topic does not exist
    /// - `DuplicateSlug` if the slug already exists
    pub async fn create(&self, input: CreateArticleInput) -> Result<Article, ArticleServiceError> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if input.intro.trim().is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Intro cannot be empty".to_string(),
            ));
        }

        let slug = match input.slug {
            Some(ref slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => generate_slug(&title),
        };
        if slug.is_empty() {
            return Err(ArticleServiceError::ValidationError(
                "Slug cannot be empty".to_string(),
            ));
        }
        if self
            .repo
            .exists_by_slug(&slug)
            .await
            .context("Failed to check slug uniqueness")?
        {
            return Err(ArticleServiceError::DuplicateSlug(slug));
        }

        let author_id = input.author_id.unwrap_or(self.system_author_id);
        self.ensure_author(author_id).await?;
        let category_ids = self.checked_categories(input.category_ids).await?;
        let topic_ids = self.checked_topics(input.topic_ids).await?;

        let now = Utc::now();
        let article = Article {
            id: 0,
            title,
            slug,
            subtitle: input.subtitle,
            intro: input.intro,
            read_time: input.body.read_time(),
            body: input.body,
            featured_image: input.featured_image,
            image_caption: input.image_caption,
            author_id,
            category_ids,
            topic_ids,
            is_breaking_news: input.is_breaking_news,
            is_featured: input.is_featured,
            is_premium: input.is_premium,
            allow_comments: input.allow_comments.unwrap_or(true),
            source: input.source,
            source_url: input.source_url,
            view_count: 0,
            state: PublishState::Draft,
            first_published_at: None,
            seo: input.seo,
            created_at: now,
            updated_at: now,
        };

        let created = self.repo.create(&article).await?;
        self.invalidate().await;
        tracing::debug!("Created article {} ({})", created.slug, created.id);
        Ok(created)
    }

    /// Update an article. `read_time` follows the body.
    pub async fn update(&self, id: i64, input: UpdateArticleInput) -> Result<Article, ArticleServiceError> {
        let mut article = self.get_by_id(id).await?;
        if !input.has_changes() {
            return Ok(article);
        }

        if let Some(title) = input.title {
            if title.trim().is_empty() {
                return Err(ArticleServiceError::ValidationError(
                    "Title cannot be empty".to_string(),
                ));
            }
            article.title = title.trim().to_string();
        }
        if let Some(intro) = input.intro {
            if intro.trim().is_empty() {
                return Err(ArticleServiceError::ValidationError(
                    "Intro cannot be empty".to_string(),
                ));
            }
            article.intro = intro;
        }
        if let Some(slug) = input.slug {
            let slug = slug.trim().to_string();
            if slug != article.slug {
                if slug.is_empty() {
                    return Err(ArticleServiceError::ValidationError(
                        "Slug cannot be empty".to_string(),
                    ));
                }
                if self.repo.exists_by_slug(&slug).await? {
                    return Err(ArticleServiceError::DuplicateSlug(slug));
                }
                article.slug = slug;
            }
        }
        if let Some(author_id) = input.author_id {
            self.ensure_author(author_id).await?;
            article.author_id = author_id;
        }
        if let Some(category_ids) = input.category_ids {
            article.category_ids = self.checked_categories(category_ids).await?;
        }
        if let Some(topic_ids) = input.topic_ids {
            article.topic_ids = self.checked_topics(topic_ids).await?;
        }
        if let Some(body) = input.body {
            article.body = body;
        }
        if let Some(subtitle) = input.subtitle {
            article.subtitle = subtitle;
        }
        if let Some(featured_image) = input.featured_image {
            article.featured_image = featured_image;
        }
        if let Some(image_caption) = input.image_caption {
            article.image_caption = image_caption;
        }
        if let Some(flag) = input.is_breaking_news {
            article.is_breaking_news = flag;
        }
        if let Some(flag) = input.is_featured {
            article.is_featured = flag;
        }
        if let Some(flag) = input.is_premium {
            article.is_premium = flag;
        }
        if let Some(flag) = input.allow_comments {
            article.allow_comments = flag;
        }
        if let Some(source) = input.source {
            article.source = source;
        }
        if let Some(source_url) = input.source_url {
            article.source_url = source_url;
        }
        if let Some(seo) = input.seo {
            article.seo = seo;
        }
        article.read_time = article.body.read_time();

        let updated = self.repo.update(&article).await?;
        self.invalidate().await;
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ArticleServiceError> {
        self.get_by_id(id).await?;
        self.repo.delete(id).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Publish now
    pub async fn publish(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.publish_at(id, Utc::now()).await
    }

    /// Publish with an explicit timestamp. Re-publishing never moves
    /// `first_published_at`.
    pub async fn publish_at(&self, id: i64, at: DateTime<Utc>) -> Result<Article, ArticleServiceError> {
        if !self.repo.publish(id, at).await? {
            return Err(ArticleServiceError::NotFound(id.to_string()));
        }
        self.invalidate().await;
        self.get_by_id(id).await
    }

    /// Back to draft; the article disappears from every listing
    pub async fn unpublish(&self, id: i64) -> Result<Article, ArticleServiceError> {
        if !self.repo.unpublish(id).await? {
            return Err(ArticleServiceError::NotFound(id.to_string()));
        }
        self.invalidate().await;
        self.get_by_id(id).await
    }

    /// Get article by ID, in any state
    pub async fn get_by_id(&self, id: i64) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get article by ID")?
            .ok_or_else(|| ArticleServiceError::NotFound(id.to_string()))
    }

    /// Get article by slug, in any state
    pub async fn get_by_slug(&self, slug: &str) -> Result<Article, ArticleServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get article by slug")?
            .ok_or_else(|| ArticleServiceError::NotFound(slug.to_string()))
    }

    /// Get a live article by slug. Drafts are reported as not found.
    pub async fn get_live_by_slug(&self, slug: &str) -> Result<Article, ArticleServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_ARTICLE_BY_SLUG, slug);
        if let Some(article) = self.cache.get::<Article>(&cache_key).await.ok().flatten() {
            return Ok(article);
        }

        let article = self.get_by_slug(slug).await?;
        if !article.is_live() {
            return Err(ArticleServiceError::NotFound(slug.to_string()));
        }

        let _ = self.cache.set(&cache_key, &article, self.cache_ttl).await;
        Ok(article)
    }

    /// Count a read and return the stored view count.
    ///
    /// Failures are logged and reported as `None`.
    pub async fn record_view(&self, id: i64) -> Option<i64> {
        match self.repo.increment_view(id).await {
            Ok(count) => count,
            Err(e) => {
                tracing::warn!("Failed to record view for article {}: {:#}", id, e);
                None
            }
        }
    }

    /// Live articles sharing a category or topic, newest first
    pub async fn related(&self, id: i64, limit: i64) -> Result<Vec<Article>, ArticleServiceError> {
        let limit = limit.max(1);
        let cache_key = format!("{}{}:{}", CACHE_KEY_ARTICLE_RELATED, id, limit);
        if let Some(articles) = self.cache.get::<Vec<Article>>(&cache_key).await.ok().flatten() {
            return Ok(articles);
        }

        self.get_by_id(id).await?;
        let articles = self.repo.related(id, limit).await?;
        let _ = self.cache.set(&cache_key, &articles, self.cache_ttl).await;
        Ok(articles)
    }

    async fn ensure_author(&self, author_id: i64) -> Result<(), ArticleServiceError> {
        if self.author_repo.get_by_id(author_id).await?.is_none() {
            return Err(ArticleServiceError::ValidationError(format!(
                "Author does not exist: {}",
                author_id
            )));
        }
        Ok(())
    }

    async fn checked_categories(&self, ids: Vec<i64>) -> Result<Vec<i64>, ArticleServiceError> {
        let ids = dedup_ids(ids);
        let found = try_join_all(ids.iter().map(|id| self.category_repo.get_by_id(*id))).await?;
        if let Some((id, _)) = ids.iter().zip(&found).find(|(_, c)| c.is_none()) {
            return Err(ArticleServiceError::ValidationError(format!(
                "Category does not exist: {}",
                id
            )));
        }
        Ok(ids)
    }

    async fn checked_topics(&self, ids: Vec<i64>) -> Result<Vec<i64>, ArticleServiceError> {
        let ids = dedup_ids(ids);
        let found = try_join_all(ids.iter().map(|id| self.topic_repo.get_by_id(*id))).await?;
        if let Some((id, _)) = ids.iter().zip(&found).find(|(_, t)| t.is_none()) {
            return Err(ArticleServiceError::ValidationError(format!(
                "Topic does not exist: {}",
                id
            )));
        }
        Ok(ids)
    }

    /// Invalidate article read models and every news listing
    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_ARTICLE).await;
        let _ = self.cache.delete_pattern(CACHE_PATTERN_NEWS).await;
    }
}

fn dedup_ids(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Generate a URL-friendly slug from a title
///
/// Converts the title to lowercase, replaces spaces and special characters
/// with hyphens, and removes consecutive hyphens. Non-ASCII letters, such as
/// Kannada script, are kept.
pub fn generate_slug(title: &str) -> String {
    let slug: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || !c.is_ascii() {
                c
            } else {
                '-'
            }
        })
        .collect();

    let mut result = String::new();
    let mut prev_hyphen = false;

    for c in slug.chars() {
        if c == '-' {
            if !prev_hyphen && !result.is_empty() {
                result.push(c);
                prev_hyphen = true;
            }
        } else {
            result.push(c);
            prev_hyphen = false;
        }
    }

    result.trim_end_matches('-').to_string()
}
