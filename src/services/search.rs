//! Article search
//!
//! The ranking engine asks a `SearchIndex` for ranked article ids and keeps
//! that order. `SqlSearchIndex` is the built-in index backed by a
//! `LIKE` match over live articles.

use crate::db::repositories::ArticleRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Full-text search collaborator
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Ranked ids of matching articles, best match first
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<i64>>;
}

/// Search index over the article table
pub struct SqlSearchIndex {
    articles: Arc<dyn ArticleRepository>,
}

impl SqlSearchIndex {
    pub fn new(articles: Arc<dyn ArticleRepository>) -> Self {
        Self { articles }
    }

    pub fn boxed(articles: Arc<dyn ArticleRepository>) -> Arc<dyn SearchIndex> {
        Arc::new(Self::new(articles))
    }
}

#[async_trait]
impl SearchIndex for SqlSearchIndex {
    async fn search(&self, query: &str, limit: i64) -> Result<Vec<i64>> {
        self.articles.search_ids(query.trim(), limit).await
    }
}
