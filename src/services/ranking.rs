//! Ranking and aggregation engine
//!
//! Computes the reader-facing subsets of live articles:
//! - trending (view count within a trailing window), breaking, featured
//! - listings by category, topic and author
//! - archive by year/month and the filtered news index
//! - popular categories and search
//!
//! Cached aggregates (author and topic counters) are refreshed explicitly
//! through `refresh_counts`.

use crate::cache::{Cache, CacheLayer};
use crate::config::RankingConfig;
use crate::db::repositories::{ArticleOrder, ArticleQuery, ArticleRepository};
use crate::models::{Article, CategoryWithCount, ListParams, PagedResult};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::author::{AuthorService, AuthorServiceError};
use super::category::{CategoryService, CategoryServiceError};
use super::search::SearchIndex;
use super::topic::{TopicService, TopicServiceError};

/// Ranked strips go stale quickly
const RANKING_CACHE_TTL_SECS: u64 = 300;

const CACHE_KEY_TRENDING: &str = "news:trending:";
const CACHE_KEY_BREAKING: &str = "news:breaking:";
const CACHE_KEY_FEATURED: &str = "news:featured:";

const SEARCH_UNAVAILABLE: &str = "Search is temporarily unavailable";

/// Widest trailing window a trending request may ask for
pub const MAX_TRENDING_WINDOW_DAYS: i64 = 3650;

#[derive(Debug, thiserror::Error)]
pub enum RankingServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<CategoryServiceError> for RankingServiceError {
    fn from(err: CategoryServiceError) -> Self {
        match err {
            CategoryServiceError::NotFound(slug) => RankingServiceError::NotFound(slug),
            CategoryServiceError::InternalError(e) => RankingServiceError::InternalError(e),
            other => RankingServiceError::InternalError(anyhow::Error::new(other)),
        }
    }
}

impl From<TopicServiceError> for RankingServiceError {
    fn from(err: TopicServiceError) -> Self {
        match err {
            TopicServiceError::NotFound(slug) => RankingServiceError::NotFound(slug),
            TopicServiceError::InternalError(e) => RankingServiceError::InternalError(e),
            other => RankingServiceError::InternalError(anyhow::Error::new(other)),
        }
    }
}

impl From<AuthorServiceError> for RankingServiceError {
    fn from(err: AuthorServiceError) -> Self {
        match err {
            AuthorServiceError::NotFound(slug) => RankingServiceError::NotFound(slug),
            AuthorServiceError::InternalError(e) => RankingServiceError::InternalError(e),
            other => RankingServiceError::InternalError(anyhow::Error::new(other)),
        }
    }
}

/// Date window for the news index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateWindow {
    /// Since midnight UTC
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
}

impl DateWindow {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "today" => Some(DateWindow::Today),
            "week" => Some(DateWindow::Week),
            "month" => Some(DateWindow::Month),
            _ => None,
        }
    }

    /// Earliest `first_published_at` inside the window
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            DateWindow::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc())
                .unwrap_or(now),
            DateWindow::Week => now - ChronoDuration::days(7),
            DateWindow::Month => now - ChronoDuration::days(30),
        }
    }
}

/// Filters for the news index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatestFilter {
    pub category: Option<String>,
    pub topic: Option<String>,
    pub date: Option<DateWindow>,
}

/// Filters for the archive
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub category: Option<String>,
}

/// Search outcome. `warning` is set when the index failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub items: Vec<Article>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// What a counter refresh touched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub authors: usize,
    pub topics: usize,
    pub refreshed_at: DateTime<Utc>,
}

/// Ranking and aggregation over live articles
pub struct RankingService {
    articles: Arc<dyn ArticleRepository>,
    categories: Arc<CategoryService>,
    topics: Arc<TopicService>,
    authors: Arc<AuthorService>,
    search_index: Arc<dyn SearchIndex>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
    config: RankingConfig,
}

impl RankingService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        categories: Arc<CategoryService>,
        topics: Arc<TopicService>,
        authors: Arc<AuthorService>,
        search_index: Arc<dyn SearchIndex>,
        cache: Arc<Cache>,
        config: RankingConfig,
    ) -> Self {
        Self {
            articles,
            categories,
            topics,
            authors,
            search_index,
            cache,
            cache_ttl: Duration::from_secs(RANKING_CACHE_TTL_SECS),
            config,
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    fn page(&self, page: u32) -> ListParams {
        ListParams::new(page, self.config.page_size)
    }

    fn limit_or_default(&self, limit: Option<i64>) -> i64 {
        limit.unwrap_or(self.config.default_limit as i64).max(1)
    }

    /// Trailing window in days, clamped to `1..=MAX_TRENDING_WINDOW_DAYS`
    fn window_days(&self, days: Option<i64>) -> i64 {
        days.unwrap_or(self.config.trending_window_days as i64)
            .clamp(1, MAX_TRENDING_WINDOW_DAYS)
    }

    /// Most viewed live articles published inside the trailing window
    ///
    /// Articles outside the window never appear, whatever their view count.
    pub async fn trending(
        &self,
        days: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Article>, RankingServiceError> {
        let days = self.window_days(days);
        let limit = self.limit_or_default(limit);

        let cache_key = format!("{}{}:{}", CACHE_KEY_TRENDING, days, limit);
        if let Some(articles) = self.cache.get::<Vec<Article>>(&cache_key).await.ok().flatten() {
            return Ok(articles);
        }

        let query = ArticleQuery {
            published_since: Some(Utc::now() - ChronoDuration::days(days)),
            ..ArticleQuery::live()
        };
        let articles = self
            .articles
            .list(&query, ArticleOrder::MostViewed, limit, 0)
            .await?;

        let _ = self.cache.set(&cache_key, &articles, self.cache_ttl).await;
        Ok(articles)
    }

    /// Live breaking news, newest first
    pub async fn breaking(&self, limit: Option<i64>) -> Result<Vec<Article>, RankingServiceError> {
        let query = ArticleQuery {
            breaking: Some(true),
            ..ArticleQuery::live()
        };
        self.flagged(CACHE_KEY_BREAKING, query, limit).await
    }

    /// Live featured articles, newest first
    pub async fn featured(&self, limit: Option<i64>) -> Result<Vec<Article>, RankingServiceError> {
        let query = ArticleQuery {
            featured: Some(true),
            ..ArticleQuery::live()
        };
        self.flagged(CACHE_KEY_FEATURED, query, limit).await
    }

    async fn flagged(
        &self,
        prefix: &str,
        query: ArticleQuery,
        limit: Option<i64>,
    ) -> Result<Vec<Article>, RankingServiceError> {
        let limit = self.limit_or_default(limit);
        let cache_key = format!("{}{}", prefix, limit);
        if let Some(articles) = self.cache.get::<Vec<Article>>(&cache_key).await.ok().flatten() {
            return Ok(articles);
        }

        let articles = self.articles.list(&query, ArticleOrder::Newest, limit, 0).await?;
        let _ = self.cache.set(&cache_key, &articles, self.cache_ttl).await;
        Ok(articles)
    }

    /// Live articles filed directly under the category
    pub async fn by_category(&self, slug: &str, page: u32) -> Result<PagedResult<Article>, RankingServiceError> {
        let category = self.categories.get_by_slug(slug).await?;
        let query = ArticleQuery {
            category_id: Some(category.id),
            ..ArticleQuery::live()
        };
        self.paged(&query, page).await
    }

    /// Live articles tagged with the topic
    pub async fn by_topic(&self, slug: &str, page: u32) -> Result<PagedResult<Article>, RankingServiceError> {
        let topic = self.topics.get_by_slug(slug).await?;
        let query = ArticleQuery {
            topic_id: Some(topic.id),
            ..ArticleQuery::live()
        };
        self.paged(&query, page).await
    }

    /// Live articles written by the author
    pub async fn by_author(&self, slug: &str, page: u32) -> Result<PagedResult<Article>, RankingServiceError> {
        let author = self.authors.get_by_slug(slug).await?;
        let query = ArticleQuery {
            author_id: Some(author.id),
            ..ArticleQuery::live()
        };
        self.paged(&query, page).await
    }

    /// Live articles by publication year and month
    ///
    /// # Errors
    /// - `ValidationError` if the month is outside 1..=12
    /// - `NotFound` if the category slug is unknown
    pub async fn archive(
        &self,
        filter: &ArchiveFilter,
        page: u32,
    ) -> Result<PagedResult<Article>, RankingServiceError> {
        if let Some(month) = filter.month {
            if !(1..=12).contains(&month) {
                return Err(RankingServiceError::ValidationError(format!(
                    "Month must be between 1 and 12, got {}",
                    month
                )));
            }
        }

        let category_id = match filter.category.as_deref().filter(|s| !s.is_empty()) {
            Some(slug) => Some(self.categories.get_by_slug(slug).await?.id),
            None => None,
        };

        let query = ArticleQuery {
            year: filter.year,
            month: filter.month,
            category_id,
            ..ArticleQuery::live()
        };
        self.paged(&query, page).await
    }

    /// News index. Unknown category or topic slugs match nothing.
    pub async fn latest(&self, filter: &LatestFilter, page: u32) -> Result<PagedResult<Article>, RankingServiceError> {
        let params = self.page(page);
        let mut query = ArticleQuery::live();

        if let Some(slug) = filter.category.as_deref().filter(|s| !s.is_empty()) {
            match self.categories.get_by_slug(slug).await {
                Ok(category) => query.category_id = Some(category.id),
                Err(CategoryServiceError::NotFound(_)) => return Ok(empty_page(&params)),
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(slug) = filter.topic.as_deref().filter(|s| !s.is_empty()) {
            match self.topics.get_by_slug(slug).await {
                Ok(topic) => query.topic_id = Some(topic.id),
                Err(TopicServiceError::NotFound(_)) => return Ok(empty_page(&params)),
                Err(e) => return Err(e.into()),
            }
        }
        if let Some(window) = filter.date {
            query.published_since = Some(window.since(Utc::now()));
        }

        self.paged(&query, page).await
    }

    /// Categories by number of live articles, computed on every call
    pub async fn popular_categories(&self, limit: Option<i64>) -> Result<Vec<CategoryWithCount>, RankingServiceError> {
        Ok(self.categories.popular(self.limit_or_default(limit)).await?)
    }

    /// Search live articles through the index, keeping its ranking
    ///
    /// A blank query returns nothing without consulting the index. An index
    /// failure yields an empty result carrying a warning.
    pub async fn search(&self, query: &str, limit: Option<i64>) -> Result<SearchResults, RankingServiceError> {
        let term = query.trim();
        if term.is_empty() {
            return Ok(SearchResults::default());
        }

        let limit = limit.unwrap_or(self.config.page_size as i64).max(1);
        let ids = match self.search_index.search(term, limit).await {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Search index failed for {:?}: {:#}", term, e);
                return Ok(SearchResults {
                    query: term.to_string(),
                    items: Vec::new(),
                    warning: Some(SEARCH_UNAVAILABLE.to_string()),
                });
            }
        };

        let items = self.articles.get_live_by_ids(&ids).await?;
        Ok(SearchResults {
            query: term.to_string(),
            items,
            warning: None,
        })
    }

    /// Trending restricted to one topic
    pub async fn topic_trending(
        &self,
        slug: &str,
        days: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<Article>, RankingServiceError> {
        let topic = self.topics.get_by_slug(slug).await?;
        let days = self.window_days(days);
        let query = ArticleQuery {
            topic_id: Some(topic.id),
            published_since: Some(Utc::now() - ChronoDuration::days(days)),
            ..ArticleQuery::live()
        };
        Ok(self
            .articles
            .list(&query, ArticleOrder::MostViewed, self.limit_or_default(limit), 0)
            .await?)
    }

    /// Recompute every author's and topic's cached counters
    pub async fn refresh_counts(&self) -> Result<RefreshReport, RankingServiceError> {
        let authors = self.authors.recompute_all().await?;
        let topics = self.topics.recompute_all().await?;
        let report = RefreshReport {
            authors,
            topics,
            refreshed_at: Utc::now(),
        };
        tracing::info!(
            "Refreshed counters for {} authors and {} topics",
            report.authors,
            report.topics
        );
        Ok(report)
    }

    async fn paged(&self, query: &ArticleQuery, page: u32) -> Result<PagedResult<Article>, RankingServiceError> {
        let params = self.page(page);
        let items = self
            .articles
            .list(query, ArticleOrder::Newest, params.limit(), params.offset())
            .await?;
        let total = self.articles.count(query).await?;
        Ok(PagedResult::new(items, total, &params))
    }
}

fn empty_page(params: &ListParams) -> PagedResult<Article> {
    PagedResult::new(Vec::new(), 0, params)
}

/// Human label for the age of a timestamp
pub fn time_since(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now - ts;
    let days = diff.num_days();
    if days > 7 {
        return ts.format("%B %d, %Y").to_string();
    }
    if days > 0 {
        return format!("{} days ago", days);
    }

    let seconds = diff.num_seconds();
    if seconds > 3600 {
        format!("{} hours ago", seconds / 3600)
    } else if seconds > 60 {
        format!("{} minutes ago", seconds / 60)
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::{
        SqlxArticleRepository, SqlxAuthorRepository, SqlxCategoryRepository, SqlxTopicRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{
        Body, ContentBlock, CreateArticleInput, CreateAuthorInput, CreateCategoryInput, CreateTopicInput,
    };
    use crate::services::article::ArticleService;
    use crate::services::search::SqlSearchIndex;
    use async_trait::async_trait;
    use chrono::TimeZone;

    struct Fixture {
        pool: DynDatabasePool,
        articles: ArticleService,
        authors: Arc<AuthorService>,
        categories: Arc<CategoryService>,
        topics: Arc<TopicService>,
        ranking: RankingService,
    }

    struct FailingIndex;

    #[async_trait]
    impl SearchIndex for FailingIndex {
        async fn search(&self, _query: &str, _limit: i64) -> anyhow::Result<Vec<i64>> {
            anyhow::bail!("index offline")
        }
    }

    /// Returns fixed ids and counts calls
    struct FixedIndex {
        ids: Vec<i64>,
        calls: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl SearchIndex for FixedIndex {
        async fn search(&self, _query: &str, _limit: i64) -> anyhow::Result<Vec<i64>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(self.ids.clone())
        }
    }

    async fn setup_with_index(index: Option<Arc<dyn SearchIndex>>) -> Fixture {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let cache = create_test_cache();
        let article_repo = SqlxArticleRepository::boxed(pool.clone());
        let author_repo = SqlxAuthorRepository::boxed(pool.clone());
        let category_repo = SqlxCategoryRepository::boxed(pool.clone());
        let topic_repo = SqlxTopicRepository::boxed(pool.clone());

        let authors = Arc::new(AuthorService::new(
            author_repo.clone(),
            article_repo.clone(),
            cache.clone(),
        ));
        let system_author = authors.init_system_author().await.unwrap();
        let categories = Arc::new(CategoryService::new(category_repo.clone(), cache.clone()));
        let topics = Arc::new(TopicService::new(topic_repo.clone(), cache.clone()));
        let articles = ArticleService::new(
            article_repo.clone(),
            author_repo,
            category_repo,
            topic_repo,
            cache.clone(),
            system_author,
        );
        let index = index.unwrap_or_else(|| SqlSearchIndex::boxed(article_repo.clone()));
        let ranking = RankingService::new(
            article_repo,
            categories.clone(),
            topics.clone(),
            authors.clone(),
            index,
            cache,
            RankingConfig::default(),
        );

        Fixture {
            pool,
            articles,
            authors,
            categories,
            topics,
            ranking,
        }
    }

    async fn setup() -> Fixture {
        setup_with_index(None).await
    }

    impl Fixture {
        async fn live(&self, input: CreateArticleInput, at: DateTime<Utc>) -> Article {
            let article = self.articles.create(input).await.unwrap();
            self.articles.publish_at(article.id, at).await.unwrap()
        }

        async fn set_views(&self, id: i64, views: i64) {
            sqlx::query("UPDATE articles SET view_count = ? WHERE id = ?")
                .bind(views)
                .bind(id)
                .execute(self.pool.sqlite())
                .await
                .unwrap();
        }
    }

    fn ids(articles: &[Article]) -> Vec<i64> {
        articles.iter().map(|a| a.id).collect()
    }

    #[tokio::test]
    async fn test_trending_respects_window() {
        let f = setup().await;
        let now = Utc::now();
        let x = f
            .live(CreateArticleInput::new("Old hit", "intro"), now - ChronoDuration::days(10))
            .await;
        f.set_views(x.id, 1000).await;
        let y = f
            .live(CreateArticleInput::new("Fresh story", "intro"), now - ChronoDuration::days(2))
            .await;
        f.set_views(y.id, 5).await;

        let trending = f.ranking.trending(Some(7), Some(5)).await.unwrap();
        assert_eq!(ids(&trending), vec![y.id]);
    }

    #[tokio::test]
    async fn test_trending_window_is_clamped() {
        let f = setup().await;
        let now = Utc::now();
        let budget = f.topics.create(CreateTopicInput::new("Budget")).await.unwrap();
        let decade_old = f
            .live(
                CreateArticleInput::new("Decade old", "intro").with_topics(vec![budget.id]),
                now - ChronoDuration::days(MAX_TRENDING_WINDOW_DAYS + 30),
            )
            .await;
        let recent = f
            .live(
                CreateArticleInput::new("Recent", "intro").with_topics(vec![budget.id]),
                now - ChronoDuration::days(100),
            )
            .await;
        f.set_views(decade_old.id, 500).await;

        let wide = f.ranking.trending(Some(200_000_000), Some(5)).await.unwrap();
        assert_eq!(ids(&wide), vec![recent.id]);
        let widest = f.ranking.trending(Some(i64::MAX), None).await.unwrap();
        assert_eq!(ids(&widest), vec![recent.id]);
        assert!(f.ranking.trending(Some(i64::MIN), None).await.unwrap().is_empty());

        let in_topic = f
            .ranking
            .topic_trending("budget", Some(200_000_000), None)
            .await
            .unwrap();
        assert_eq!(ids(&in_topic), vec![recent.id]);
    }

    #[tokio::test]
    async fn test_trending_orders_by_views_then_recency() {
        let f = setup().await;
        let now = Utc::now();
        let a = f
            .live(CreateArticleInput::new("A", "intro"), now - ChronoDuration::hours(5))
            .await;
        let b = f
            .live(CreateArticleInput::new("B", "intro"), now - ChronoDuration::hours(1))
            .await;
        let c = f
            .live(CreateArticleInput::new("C", "intro"), now - ChronoDuration::hours(3))
            .await;
        f.set_views(a.id, 50).await;
        f.set_views(b.id, 10).await;
        f.set_views(c.id, 10).await;
        let draft = f.articles.create(CreateArticleInput::new("Draft", "intro")).await.unwrap();
        f.set_views(draft.id, 10_000).await;

        let trending = f.ranking.trending(None, None).await.unwrap();
        assert_eq!(ids(&trending), vec![a.id, b.id, c.id]);

        let top = f.ranking.trending(None, Some(1)).await.unwrap();
        assert_eq!(ids(&top), vec![a.id]);
    }

    #[tokio::test]
    async fn test_breaking_and_featured_follow_publish_state() {
        let f = setup().await;
        let now = Utc::now();
        let older = f
            .live(CreateArticleInput::new("Older", "intro").breaking(), now - ChronoDuration::hours(2))
            .await;
        let newer = f
            .live(CreateArticleInput::new("Newer", "intro").breaking().featured(), now)
            .await;
        f.live(CreateArticleInput::new("Plain", "intro"), now).await;

        assert_eq!(ids(&f.ranking.breaking(None).await.unwrap()), vec![newer.id, older.id]);
        assert_eq!(ids(&f.ranking.featured(None).await.unwrap()), vec![newer.id]);

        // Unpublishing invalidates the cached strips
        f.articles.unpublish(newer.id).await.unwrap();
        assert_eq!(ids(&f.ranking.breaking(None).await.unwrap()), vec![older.id]);
        assert!(f.ranking.featured(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listings_by_taxonomy_and_author() {
        let f = setup().await;
        let now = Utc::now();
        let sports = f.categories.create(CreateCategoryInput::new("Sports")).await.unwrap();
        let cricket_topic = f.topics.create(CreateTopicInput::new("Cricket")).await.unwrap();
        let author = f
            .authors
            .create(CreateAuthorInput::new("acc-1", "Asha"))
            .await
            .unwrap();

        for i in 0..14 {
            f.live(
                CreateArticleInput::new(format!("Match report {}", i), "intro")
                    .with_categories(vec![sports.id])
                    .with_topics(vec![cricket_topic.id])
                    .with_author(author.id),
                now - ChronoDuration::minutes(i),
            )
            .await;
        }
        f.articles
            .create(
                CreateArticleInput::new("Draft report", "intro")
                    .with_categories(vec![sports.id])
                    .with_author(author.id),
            )
            .await
            .unwrap();

        let first = f.ranking.by_category("sports", 1).await.unwrap();
        assert_eq!(first.total, 14);
        assert_eq!(first.items.len(), 12);
        assert_eq!(first.items[0].title, "Match report 0");
        let second = f.ranking.by_category("sports", 2).await.unwrap();
        assert_eq!(second.items.len(), 2);

        assert_eq!(f.ranking.by_topic("cricket", 1).await.unwrap().total, 14);
        assert_eq!(f.ranking.by_author("asha", 1).await.unwrap().total, 14);

        assert!(matches!(
            f.ranking.by_category("missing", 1).await,
            Err(RankingServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.ranking.by_topic("missing", 1).await,
            Err(RankingServiceError::NotFound(_))
        ));
        assert!(matches!(
            f.ranking.by_author("missing", 1).await,
            Err(RankingServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_archive_by_year_and_month() {
        let f = setup().await;
        let at = |m: u32, d: u32| Utc.with_ymd_and_hms(2024, m, d, 10, 0, 0).unwrap();

        let early_march = f.live(CreateArticleInput::new("Early March", "intro"), at(3, 5)).await;
        let late_march = f.live(CreateArticleInput::new("Late March", "intro"), at(3, 20)).await;
        f.live(CreateArticleInput::new("February", "intro"), at(2, 28)).await;
        f.live(CreateArticleInput::new("April", "intro"), at(4, 1)).await;
        let pulled = f.live(CreateArticleInput::new("Pulled", "intro"), at(3, 10)).await;
        f.articles.unpublish(pulled.id).await.unwrap();

        let filter = ArchiveFilter {
            year: Some(2024),
            month: Some(3),
            category: None,
        };
        let march = f.ranking.archive(&filter, 1).await.unwrap();
        assert_eq!(ids(&march.items), vec![late_march.id, early_march.id]);

        let year = ArchiveFilter {
            year: Some(2024),
            ..ArchiveFilter::default()
        };
        assert_eq!(f.ranking.archive(&year, 1).await.unwrap().total, 4);

        let bad = ArchiveFilter {
            month: Some(13),
            ..ArchiveFilter::default()
        };
        assert!(matches!(
            f.ranking.archive(&bad, 1).await,
            Err(RankingServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_latest_filters() {
        let f = setup().await;
        let now = Utc::now();
        let politics = f.categories.create(CreateCategoryInput::new("Politics")).await.unwrap();
        let recent = f
            .live(
                CreateArticleInput::new("Recent", "intro").with_categories(vec![politics.id]),
                now - ChronoDuration::days(3),
            )
            .await;
        let old = f
            .live(
                CreateArticleInput::new("Old", "intro").with_categories(vec![politics.id]),
                now - ChronoDuration::days(20),
            )
            .await;
        f.live(CreateArticleInput::new("Ancient", "intro"), now - ChronoDuration::days(90))
            .await;

        let all = f.ranking.latest(&LatestFilter::default(), 1).await.unwrap();
        assert_eq!(all.total, 3);

        let week = LatestFilter {
            date: Some(DateWindow::Week),
            ..LatestFilter::default()
        };
        assert_eq!(ids(&f.ranking.latest(&week, 1).await.unwrap().items), vec![recent.id]);

        let month_in_politics = LatestFilter {
            category: Some("politics".to_string()),
            date: Some(DateWindow::Month),
            ..LatestFilter::default()
        };
        assert_eq!(
            ids(&f.ranking.latest(&month_in_politics, 1).await.unwrap().items),
            vec![recent.id, old.id]
        );

        let unknown = LatestFilter {
            topic: Some("nope".to_string()),
            ..LatestFilter::default()
        };
        assert!(f.ranking.latest(&unknown, 1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_popular_categories_count_live_only() {
        let f = setup().await;
        let now = Utc::now();
        let sports = f.categories.create(CreateCategoryInput::new("Sports")).await.unwrap();
        let politics = f.categories.create(CreateCategoryInput::new("Politics")).await.unwrap();
        f.categories.create(CreateCategoryInput::new("Empty")).await.unwrap();

        for i in 0..2 {
            f.live(
                CreateArticleInput::new(format!("Sports {}", i), "intro").with_categories(vec![sports.id]),
                now,
            )
            .await;
        }
        f.live(
            CreateArticleInput::new("Politics 1", "intro").with_categories(vec![politics.id]),
            now,
        )
        .await;
        for i in 0..3 {
            f.articles
                .create(
                    CreateArticleInput::new(format!("Draft {}", i), "intro")
                        .with_categories(vec![politics.id]),
                )
                .await
                .unwrap();
        }

        let popular = f.ranking.popular_categories(Some(2)).await.unwrap();
        let counts: Vec<(String, i64)> = popular
            .into_iter()
            .map(|c| (c.category.name, c.article_count))
            .collect();
        assert_eq!(
            counts,
            vec![("Sports".to_string(), 2), ("Politics".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_search_uses_index_order() {
        let f = setup().await;
        let now = Utc::now();
        let title_hit = f
            .live(CreateArticleInput::new("Monsoon arrives", "Rain everywhere"), now - ChronoDuration::hours(2))
            .await;
        let intro_hit = f
            .live(CreateArticleInput::new("Farmers cheer", "The monsoon is early"), now)
            .await;
        f.articles
            .create(CreateArticleInput::new("Monsoon draft", "intro"))
            .await
            .unwrap();

        let results = f.ranking.search("monsoon", None).await.unwrap();
        assert_eq!(ids(&results.items), vec![title_hit.id, intro_hit.id]);
        assert!(results.warning.is_none());
    }

    #[tokio::test]
    async fn test_search_finds_body_only_match() {
        let f = setup().await;
        let article = f
            .live(
                CreateArticleInput::new("Weather update", "Short intro").with_body(Body::new(vec![
                    ContentBlock::paragraph("<p>The monsoon reached Mangaluru</p>"),
                ])),
                Utc::now(),
            )
            .await;

        let results = f.ranking.search("monsoon", None).await.unwrap();
        assert_eq!(ids(&results.items), vec![article.id]);
    }

    #[tokio::test]
    async fn test_search_keeps_delegate_ranking_and_skips_blank() {
        let index = Arc::new(FixedIndex {
            ids: Vec::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let f = setup_with_index(Some(index.clone() as Arc<dyn SearchIndex>)).await;

        let results = f.ranking.search("   ", None).await.unwrap();
        assert!(results.items.is_empty());
        assert_eq!(index.calls.load(std::sync::atomic::Ordering::SeqCst), 0);

        f.ranking.search("rain", None).await.unwrap();
        assert_eq!(index.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_search_degrades_when_index_fails() {
        let f = setup_with_index(Some(Arc::new(FailingIndex))).await;
        f.live(CreateArticleInput::new("Monsoon arrives", "intro"), Utc::now())
            .await;

        let results = f.ranking.search("monsoon", None).await.unwrap();
        assert!(results.items.is_empty());
        assert_eq!(results.warning.as_deref(), Some(SEARCH_UNAVAILABLE));
    }

    #[tokio::test]
    async fn test_topic_trending() {
        let f = setup().await;
        let now = Utc::now();
        let budget = f.topics.create(CreateTopicInput::new("Budget")).await.unwrap();
        let in_topic = f
            .live(
                CreateArticleInput::new("Budget day", "intro").with_topics(vec![budget.id]),
                now - ChronoDuration::days(1),
            )
            .await;
        let stale = f
            .live(
                CreateArticleInput::new("Last budget", "intro").with_topics(vec![budget.id]),
                now - ChronoDuration::days(40),
            )
            .await;
        f.set_views(stale.id, 999).await;
        f.live(CreateArticleInput::new("Elsewhere", "intro"), now).await;

        let trending = f.ranking.topic_trending("budget", Some(7), None).await.unwrap();
        assert_eq!(ids(&trending), vec![in_topic.id]);
        assert!(matches!(
            f.ranking.topic_trending("missing", None, None).await,
            Err(RankingServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_counts_is_idempotent() {
        let f = setup().await;
        let now = Utc::now();
        let author = f
            .authors
            .create(CreateAuthorInput::new("acc-1", "Asha"))
            .await
            .unwrap();
        let topic = f.topics.create(CreateTopicInput::new("Budget")).await.unwrap();

        for i in 0..3 {
            let article = f
                .live(
                    CreateArticleInput::new(format!("Live {}", i), "intro")
                        .with_author(author.id)
                        .with_topics(vec![topic.id]),
                    now,
                )
                .await;
            f.set_views(article.id, 10).await;
        }
        f.articles
            .create(
                CreateArticleInput::new("Draft", "intro")
                    .with_author(author.id)
                    .with_topics(vec![topic.id]),
            )
            .await
            .unwrap();

        let report = f.ranking.refresh_counts().await.unwrap();
        assert_eq!(report.authors, 2);
        assert_eq!(report.topics, 1);

        let first = f.authors.get_by_id(author.id).await.unwrap();
        assert_eq!(first.article_count, 3);
        assert_eq!(first.total_views, 30);
        assert_eq!(f.topics.get_by_id(topic.id).await.unwrap().article_count, 4);

        f.ranking.refresh_counts().await.unwrap();
        let second = f.authors.get_by_id(author.id).await.unwrap();
        assert_eq!(second.article_count, first.article_count);
        assert_eq!(second.total_views, first.total_views);
    }

    #[test]
    fn test_time_since_labels() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 12, 0, 0).unwrap();
        assert_eq!(time_since(now - ChronoDuration::seconds(30), now), "Just now");
        assert_eq!(time_since(now - ChronoDuration::minutes(5), now), "5 minutes ago");
        assert_eq!(time_since(now - ChronoDuration::hours(3), now), "3 hours ago");
        assert_eq!(time_since(now - ChronoDuration::days(2), now), "2 days ago");
        assert_eq!(
            time_since(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(), now),
            "March 01, 2024"
        );
        assert_eq!(time_since(now + ChronoDuration::minutes(5), now), "Just now");
    }

    #[test]
    fn test_date_window_since() {
        let now = Utc.with_ymd_and_hms(2024, 3, 20, 15, 30, 0).unwrap();
        assert_eq!(
            DateWindow::Today.since(now),
            Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()
        );
        assert_eq!(DateWindow::Week.since(now), now - ChronoDuration::days(7));
        assert_eq!(DateWindow::from_str("MONTH"), Some(DateWindow::Month));
        assert_eq!(DateWindow::from_str("year"), None);
    }
}
