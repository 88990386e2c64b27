//! Shared API response types
//!
//! Listings serve `ArticleSummary` rows; the detail endpoint serves the full
//! article with rendered body and its author.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Article, Author, Category, PagedResult};
use crate::services::time_since;

// ============================================================================
// Article Response Types
// ============================================================================

/// Article row for listings
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub subtitle: String,
    pub intro: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub author_id: i64,
    pub category_ids: Vec<i64>,
    pub topic_ids: Vec<i64>,
    pub is_breaking_news: bool,
    pub is_featured: bool,
    pub is_premium: bool,
    pub view_count: i64,
    pub read_time: i64,
    pub first_published_at: Option<DateTime<Utc>>,
    /// "3 hours ago" style label, empty for drafts
    pub time_since: String,
}

impl From<Article> for ArticleSummary {
    fn from(article: Article) -> Self {
        let time_since = article
            .first_published_at
            .map(|ts| time_since(ts, Utc::now()))
            .unwrap_or_default();
        Self {
            id: article.id,
            slug: article.slug,
            title: article.title,
            subtitle: article.subtitle,
            intro: article.intro,
            featured_image: article.featured_image,
            author_id: article.author_id,
            category_ids: article.category_ids,
            topic_ids: article.topic_ids,
            is_breaking_news: article.is_breaking_news,
            is_featured: article.is_featured,
            is_premium: article.is_premium,
            view_count: article.view_count,
            read_time: article.read_time,
            first_published_at: article.first_published_at,
            time_since,
        }
    }
}

/// Category info embedded in article response
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CategoryInfo {
    pub id: i64,
    pub slug: String,
    pub name: String,
}

impl From<&Category> for CategoryInfo {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            slug: category.slug.clone(),
            name: category.name.clone(),
        }
    }
}

/// Full article response for the detail endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleDetailResponse {
    #[serde(flatten)]
    pub article: Article,
    pub body_html: String,
    pub time_since: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    pub categories: Vec<CategoryInfo>,
}

impl ArticleDetailResponse {
    pub fn new(article: Article) -> Self {
        let body_html = article.body.render_html();
        let time_since = article
            .first_published_at
            .map(|ts| time_since(ts, Utc::now()))
            .unwrap_or_default();
        Self {
            article,
            body_html,
            time_since,
            author: None,
            categories: Vec::new(),
        }
    }

    pub fn with_author(mut self, author: Option<Author>) -> Self {
        self.author = author;
        self
    }

    pub fn with_categories<'a>(mut self, categories: impl IntoIterator<Item = &'a Category>) -> Self {
        self.categories = categories.into_iter().map(CategoryInfo::from).collect();
        self
    }
}

// ============================================================================
// Pagination Response Types
// ============================================================================

/// Paginated list response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> ListResponse<T> {
    /// Convert a page of models into a page of response rows
    pub fn from_paged<M>(result: PagedResult<M>) -> Self
    where
        T: From<M>,
    {
        let total_pages = result.total_pages();
        Self {
            items: result.items.into_iter().map(T::from).collect(),
            total: result.total,
            page: result.page,
            page_size: result.per_page,
            total_pages,
        }
    }
}

/// Unpaginated list of article rows
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticlesResponse {
    pub articles: Vec<ArticleSummary>,
}

impl From<Vec<Article>> for ArticlesResponse {
    fn from(articles: Vec<Article>) -> Self {
        Self {
            articles: articles.into_iter().map(Into::into).collect(),
        }
    }
}
