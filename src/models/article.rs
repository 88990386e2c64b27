//! Article model
//!
//! This module provides:
//! - `Article` entity representing a news article
//! - `PublishState` shared by articles and videos
//! - Input types for creating and updating articles
//! - Pagination types for list queries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Body, SeoFields};

/// Default number of items on a browsing page
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// News article entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Article {
    /// Unique identifier
    pub id: i64,
    /// Headline
    pub title: String,
    /// URL-friendly slug
    pub slug: String,
    /// Secondary headline
    pub subtitle: String,
    /// Summary shown in listings
    pub intro: String,
    /// Ordered content blocks
    pub body: Body,
    /// Opaque asset reference
    pub featured_image: Option<String>,
    pub image_caption: String,
    /// Exactly one author
    pub author_id: i64,
    pub category_ids: Vec<i64>,
    pub topic_ids: Vec<i64>,
    pub is_breaking_news: bool,
    pub is_featured: bool,
    pub is_premium: bool,
    pub allow_comments: bool,
    /// Original source for syndicated content
    pub source: String,
    pub source_url: String,
    pub view_count: i64,
    /// Estimated minutes to read, derived from the body on every save
    pub read_time: i64,
    pub state: PublishState,
    /// Set on the first transition to live and never changed afterwards
    pub first_published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seo: SeoFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn is_live(&self) -> bool {
        self.state == PublishState::Live
    }
}

/// Publication state of articles and videos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PublishState {
    /// Not visible to readers or rankings
    #[default]
    Draft,
    /// Visible everywhere
    Live,
}

impl PublishState {
    /// Convert state to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishState::Draft => "draft",
            PublishState::Live => "live",
        }
    }

    /// Parse state from database string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Some(PublishState::Draft),
            "live" => Some(PublishState::Live),
            _ => None,
        }
    }
}

impl std::fmt::Display for PublishState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Input for creating a new article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateArticleInput {
    pub title: String,
    /// Generated from the title when absent
    pub slug: Option<String>,
    pub subtitle: String,
    pub intro: String,
    pub body: Body,
    pub featured_image: Option<String>,
    pub image_caption: String,
    /// Falls back to the system author
    pub author_id: Option<i64>,
    pub category_ids: Vec<i64>,
    pub topic_ids: Vec<i64>,
    pub is_breaking_news: bool,
    pub is_featured: bool,
    pub is_premium: bool,
    /// Defaults to true
    pub allow_comments: Option<bool>,
    pub source: String,
    pub source_url: String,
    pub seo: SeoFields,
}

impl CreateArticleInput {
    pub fn new(title: impl Into<String>, intro: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            intro: intro.into(),
            ..Self::default()
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = body;
        self
    }

    pub fn with_author(mut self, author_id: i64) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_categories(mut self, category_ids: Vec<i64>) -> Self {
        self.category_ids = category_ids;
        self
    }

    pub fn with_topics(mut self, topic_ids: Vec<i64>) -> Self {
        self.topic_ids = topic_ids;
        self
    }

    pub fn breaking(mut self) -> Self {
        self.is_breaking_news = true;
        self
    }

    pub fn featured(mut self) -> Self {
        self.is_featured = true;
        self
    }
}

/// Input for updating an existing article
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateArticleInput {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub subtitle: Option<String>,
    pub intro: Option<String>,
    pub body: Option<Body>,
    pub featured_image: Option<Option<String>>,
    pub image_caption: Option<String>,
    pub author_id: Option<i64>,
    pub category_ids: Option<Vec<i64>>,
    pub topic_ids: Option<Vec<i64>>,
    pub is_breaking_news: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_premium: Option<bool>,
    pub allow_comments: Option<bool>,
    pub source: Option<String>,
    pub source_url: Option<String>,
    pub seo: Option<SeoFields>,
}

impl UpdateArticleInput {
    /// Create a new empty UpdateArticleInput
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_categories(mut self, category_ids: Vec<i64>) -> Self {
        self.category_ids = Some(category_ids);
        self
    }

    /// Check if any field is set
    pub fn has_changes(&self) -> bool {
        self.title.is_some()
            || self.slug.is_some()
            || self.subtitle.is_some()
            || self.intro.is_some()
            || self.body.is_some()
            || self.featured_image.is_some()
            || self.image_caption.is_some()
            || self.author_id.is_some()
            || self.category_ids.is_some()
            || self.topic_ids.is_some()
            || self.is_breaking_news.is_some()
            || self.is_featured.is_some()
            || self.is_premium.is_some()
            || self.allow_comments.is_some()
            || self.source.is_some()
            || self.source_url.is_some()
            || self.seo.is_some()
    }
}

/// Pagination parameters for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    /// Page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListParams {
    /// Create new pagination parameters
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, 100),
        }
    }

    /// Calculate the offset for database queries
    pub fn offset(&self) -> i64 {
        (self.page.saturating_sub(1) as i64) * self.per_page as i64
    }

    /// Get the limit for database queries
    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Paginated result container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagedResult<T> {
    /// Items in the current page
    pub items: Vec<T>,
    /// Total number of items across all pages
    pub total: i64,
    /// Current page number (1-indexed)
    pub page: u32,
    /// Number of items per page
    pub per_page: u32,
}

impl<T> PagedResult<T> {
    /// Create a new paginated result
    pub fn new(items: Vec<T>, total: i64, params: &ListParams) -> Self {
        Self {
            items,
            total,
            page: params.page,
            per_page: params.per_page,
        }
    }

    /// Calculate the total number of pages
    pub fn total_pages(&self) -> u32 {
        if self.per_page == 0 || self.total <= 0 {
            return 0;
        }
        ((self.total as u64 + self.per_page as u64 - 1) / self.per_page as u64) as u32
    }

    /// Check if there is a next page
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    /// Check if there is a previous page
    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Transform the items, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
        }
    }
}

impl<T> Default for PagedResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}
