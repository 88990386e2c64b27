//! Article repository
//!
//! Database operations for articles.
//!
//! This module provides:
//! - `ArticleRepository` trait defining the interface for article data access
//! - `SqlxArticleRepository` implementing the trait for SQLite
//! - `ArticleQuery` / `ArticleOrder` describing filtered listings
//!
//! Category and topic membership lives in the `article_categories` and
//! `article_topics` join tables and is written in the same transaction as the
//! article row.

use crate::db::DynDatabasePool;
use crate::models::{Article, Body, PublishState, SeoFields};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

const ARTICLE_COLUMNS: &str = "a.id, a.title, a.slug, a.subtitle, a.intro, a.body, a.featured_image, a.image_caption, a.author_id, a.is_breaking_news, a.is_featured, a.is_premium, a.allow_comments, a.source, a.source_url, a.view_count, a.read_time, a.state, a.first_published_at, a.seo, a.created_at, a.updated_at";

/// Filter for article listings. Unset fields do not restrict.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    /// Restrict to live articles
    pub live_only: bool,
    pub category_id: Option<i64>,
    pub topic_id: Option<i64>,
    pub author_id: Option<i64>,
    pub breaking: Option<bool>,
    pub featured: Option<bool>,
    /// `first_published_at >= since`
    pub published_since: Option<DateTime<Utc>>,
    /// Exact year of `first_published_at`
    pub year: Option<i32>,
    /// Exact month (1-12) of `first_published_at`
    pub month: Option<u32>,
}

impl ArticleQuery {
    /// Live articles only
    pub fn live() -> Self {
        Self {
            live_only: true,
            ..Self::default()
        }
    }
}

/// Sort order for article listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArticleOrder {
    /// `first_published_at DESC, id ASC`
    #[default]
    Newest,
    /// `view_count DESC, first_published_at DESC, id ASC`
    MostViewed,
}

impl ArticleOrder {
    fn sql(&self) -> &'static str {
        match self {
            ArticleOrder::Newest => " ORDER BY a.first_published_at DESC, a.id ASC",
            ArticleOrder::MostViewed => {
                " ORDER BY a.view_count DESC, a.first_published_at DESC, a.id ASC"
            }
        }
    }
}

/// Article repository trait
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert an article together with its category and topic links
    async fn create(&self, article: &Article) -> Result<Article>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>>;

    /// Overwrite an article and replace its links
    async fn update(&self, article: &Article) -> Result<Article>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Mark live. `first_published_at` is only set if it was never set.
    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;

    /// Back to draft, keeping `first_published_at`
    async fn unpublish(&self, id: i64) -> Result<bool>;

    /// Atomic `view_count + 1`, returning the stored count. `None` if the
    /// article does not exist.
    async fn increment_view(&self, id: i64) -> Result<Option<i64>>;

    async fn list(
        &self,
        query: &ArticleQuery,
        order: ArticleOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>>;

    async fn count(&self, query: &ArticleQuery) -> Result<i64>;

    /// Live articles sharing a category or topic with `id`, excluding it
    async fn related(&self, id: i64, limit: i64) -> Result<Vec<Article>>;

    /// Live articles with the given ids, in the order given
    async fn get_live_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>>;

    /// Ids of live articles whose title, subtitle, intro or body text contain
    /// `term` literally. Title matches rank first.
    async fn search_ids(&self, term: &str, limit: i64) -> Result<Vec<i64>>;
}

/// SQLx-based article repository implementation
pub struct SqlxArticleRepository {
    pool: DynDatabasePool,
}

impl SqlxArticleRepository {
    /// Create a new SQLx article repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ArticleRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ArticleRepository for SqlxArticleRepository {
    async fn create(&self, article: &Article) -> Result<Article> {
        create_article(self.pool.sqlite(), article).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles a WHERE a.id = ?", ARTICLE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get article by ID")?;
        single_with_links(self.pool.sqlite(), row).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles a WHERE a.slug = ?", ARTICLE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get article by slug")?;
        single_with_links(self.pool.sqlite(), row).await
    }

    async fn update(&self, article: &Article) -> Result<Article> {
        update_article(self.pool.sqlite(), article).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete article")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check article slug")?;
        Ok(count > 0)
    }

    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET state = 'live', first_published_at = COALESCE(first_published_at, ?), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to publish article")?;
        Ok(result.rows_affected() > 0)
    }

    async fn unpublish(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET state = 'draft', updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to unpublish article")?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_view(&self, id: i64) -> Result<Option<i64>> {
        sqlx::query_scalar(
            "UPDATE articles SET view_count = view_count + 1 WHERE id = ? RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(self.pool.sqlite())
        .await
        .context("Failed to increment article view count")
    }

    async fn list(
        &self,
        query: &ArticleQuery,
        order: ArticleOrder,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Article>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM articles a WHERE 1 = 1",
            ARTICLE_COLUMNS
        ));
        push_filters(&mut qb, query);
        qb.push(order.sql());
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);

        let rows = qb
            .build()
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list articles")?;
        many_with_links(self.pool.sqlite(), rows).await
    }

    async fn count(&self, query: &ArticleQuery) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) as count FROM articles a WHERE 1 = 1");
        push_filters(&mut qb, query);

        let row = qb
            .build()
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count articles")?;
        Ok(row.get("count"))
    }

    async fn related(&self, id: i64, limit: i64) -> Result<Vec<Article>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM articles a
            WHERE a.state = 'live'
              AND a.id != ?
              AND (
                EXISTS (
                    SELECT 1 FROM article_categories ac
                    WHERE ac.article_id = a.id
                      AND ac.category_id IN (SELECT category_id FROM article_categories WHERE article_id = ?)
                )
                OR EXISTS (
                    SELECT 1 FROM article_topics at
                    WHERE at.article_id = a.id
                      AND at.topic_id IN (SELECT topic_id FROM article_topics WHERE article_id = ?)
                )
              )
            ORDER BY a.first_published_at DESC, a.id ASC
            LIMIT ?
            "#,
            ARTICLE_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(id)
            .bind(id)
            .bind(limit)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list related articles")?;
        many_with_links(self.pool.sqlite(), rows).await
    }

    async fn get_live_by_ids(&self, ids: &[i64]) -> Result<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM articles a WHERE a.state = 'live' AND a.id IN (",
            ARTICLE_COLUMNS
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = qb
            .build()
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to load articles by ID")?;
        let mut by_id: HashMap<i64, Article> = many_with_links(self.pool.sqlite(), rows)
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn search_ids(&self, term: &str, limit: i64) -> Result<Vec<i64>> {
        let pattern = format!("%{}%", escape_like(term));
        let ids: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM articles
            WHERE state = 'live'
              AND (title LIKE ?1 ESCAPE '\' OR subtitle LIKE ?1 ESCAPE '\'
                   OR intro LIKE ?1 ESCAPE '\' OR body_text LIKE ?1 ESCAPE '\')
            ORDER BY (title LIKE ?1 ESCAPE '\') DESC, first_published_at DESC, id ASC
            LIMIT ?2
            "#,
        )
        .bind(&pattern)
        .bind(limit)
        .fetch_all(self.pool.sqlite())
        .await
        .context("Failed to search articles")?;
        Ok(ids)
    }
}

/// Escape LIKE wildcards so user input matches literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, query: &ArticleQuery) {
    if query.live_only {
        qb.push(" AND a.state = 'live'");
    }
    if let Some(category_id) = query.category_id {
        qb.push(" AND EXISTS (SELECT 1 FROM article_categories ac WHERE ac.article_id = a.id AND ac.category_id = ")
            .push_bind(category_id)
            .push(")");
    }
    if let Some(topic_id) = query.topic_id {
        qb.push(" AND EXISTS (SELECT 1 FROM article_topics at WHERE at.article_id = a.id AND at.topic_id = ")
            .push_bind(topic_id)
            .push(")");
    }
    if let Some(author_id) = query.author_id {
        qb.push(" AND a.author_id = ").push_bind(author_id);
    }
    if let Some(breaking) = query.breaking {
        qb.push(" AND a.is_breaking_news = ").push_bind(breaking);
    }
    if let Some(featured) = query.featured {
        qb.push(" AND a.is_featured = ").push_bind(featured);
    }
    if let Some(since) = query.published_since {
        qb.push(" AND a.first_published_at >= ").push_bind(since);
    }
    if let Some(year) = query.year {
        qb.push(" AND CAST(strftime('%Y', a.first_published_at) AS INTEGER) = ")
            .push_bind(year);
    }
    if let Some(month) = query.month {
        qb.push(" AND CAST(strftime('%m', a.first_published_at) AS INTEGER) = ")
            .push_bind(month as i64);
    }
}

async fn create_article(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO articles (title, slug, subtitle, intro, body, body_text, featured_image, image_caption,
                              author_id, is_breaking_news, is_featured, is_premium, allow_comments, source,
                              source_url, read_time, state, first_published_at, seo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&article.title)
    .bind(&article.slug)
    .bind(&article.subtitle)
    .bind(&article.intro)
    .bind(article.body.to_column())
    .bind(article.body.plain_text())
    .bind(&article.featured_image)
    .bind(&article.image_caption)
    .bind(article.author_id)
    .bind(article.is_breaking_news)
    .bind(article.is_featured)
    .bind(article.is_premium)
    .bind(article.allow_comments)
    .bind(&article.source)
    .bind(&article.source_url)
    .bind(article.read_time)
    .bind(article.state.as_str())
    .bind(article.first_published_at)
    .bind(article.seo.to_column())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create article")?;

    let id = result.last_insert_rowid();
    replace_links(&mut tx, id, &article.category_ids, &article.topic_ids).await?;
    tx.commit().await?;

    Ok(Article {
        id,
        view_count: 0,
        created_at: now,
        updated_at: now,
        ..article.clone()
    })
}

async fn update_article(pool: &SqlitePool, article: &Article) -> Result<Article> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        UPDATE articles
        SET title = ?, slug = ?, subtitle = ?, intro = ?, body = ?, body_text = ?, featured_image = ?,
            image_caption = ?, author_id = ?, is_breaking_news = ?, is_featured = ?, is_premium = ?, allow_comments = ?,
            source = ?, source_url = ?, read_time = ?, seo = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&article.title)
    .bind(&article.slug)
    .bind(&article.subtitle)
    .bind(&article.intro)
    .bind(article.body.to_column())
    .bind(article.body.plain_text())
    .bind(&article.featured_image)
    .bind(&article.image_caption)
    .bind(article.author_id)
    .bind(article.is_breaking_news)
    .bind(article.is_featured)
    .bind(article.is_premium)
    .bind(article.allow_comments)
    .bind(&article.source)
    .bind(&article.source_url)
    .bind(article.read_time)
    .bind(article.seo.to_column())
    .bind(now)
    .bind(article.id)
    .execute(&mut *tx)
    .await
    .context("Failed to update article")?;

    replace_links(&mut tx, article.id, &article.category_ids, &article.topic_ids).await?;
    tx.commit().await?;

    Ok(Article {
        updated_at: now,
        ..article.clone()
    })
}

async fn replace_links(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    article_id: i64,
    category_ids: &[i64],
    topic_ids: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM article_categories WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut **tx)
        .await
        .context("Failed to clear article categories")?;
    sqlx::query("DELETE FROM article_topics WHERE article_id = ?")
        .bind(article_id)
        .execute(&mut **tx)
        .await
        .context("Failed to clear article topics")?;

    for category_id in category_ids {
        sqlx::query("INSERT OR IGNORE INTO article_categories (article_id, category_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(*category_id)
            .execute(&mut **tx)
            .await
            .context("Failed to link article category")?;
    }
    for topic_id in topic_ids {
        sqlx::query("INSERT OR IGNORE INTO article_topics (article_id, topic_id) VALUES (?, ?)")
            .bind(article_id)
            .bind(*topic_id)
            .execute(&mut **tx)
            .await
            .context("Failed to link article topic")?;
    }
    Ok(())
}

async fn single_with_links(
    pool: &SqlitePool,
    row: Option<sqlx::sqlite::SqliteRow>,
) -> Result<Option<Article>> {
    match row {
        Some(row) => Ok(many_with_links(pool, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn many_with_links(pool: &SqlitePool, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Article>> {
    let mut articles: Vec<Article> = rows.iter().map(row_to_article).collect();
    if articles.is_empty() {
        return Ok(articles);
    }

    let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
    let categories = load_links(pool, "article_categories", "category_id", &ids).await?;
    let topics = load_links(pool, "article_topics", "topic_id", &ids).await?;

    for article in &mut articles {
        article.category_ids = categories.get(&article.id).cloned().unwrap_or_default();
        article.topic_ids = topics.get(&article.id).cloned().unwrap_or_default();
    }
    Ok(articles)
}

async fn load_links(
    pool: &SqlitePool,
    table: &'static str,
    column: &'static str,
    article_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT article_id, {} as link_id FROM {} WHERE article_id IN (",
        column, table
    ));
    let mut separated = qb.separated(", ");
    for id in article_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY link_id ASC");

    let rows = qb
        .build()
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to load {}", table))?;

    let mut links: HashMap<i64, Vec<i64>> = HashMap::new();
    for row in rows {
        links
            .entry(row.get("article_id"))
            .or_default()
            .push(row.get("link_id"));
    }
    Ok(links)
}

fn row_to_article(row: &sqlx::sqlite::SqliteRow) -> Article {
    let body: String = row.get("body");
    let state: String = row.get("state");
    let seo: String = row.get("seo");

    Article {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        subtitle: row.get("subtitle"),
        intro: row.get("intro"),
        body: Body::from_column(&body),
        featured_image: row.get("featured_image"),
        image_caption: row.get("image_caption"),
        author_id: row.get("author_id"),
        category_ids: Vec::new(),
        topic_ids: Vec::new(),
        is_breaking_news: row.get("is_breaking_news"),
        is_featured: row.get("is_featured"),
        is_premium: row.get("is_premium"),
        allow_comments: row.get("allow_comments"),
        source: row.get("source"),
        source_url: row.get("source_url"),
        view_count: row.get("view_count"),
        read_time: row.get("read_time"),
        state: PublishState::from_str(&state).unwrap_or_default(),
        first_published_at: row.get("first_published_at"),
        seo: SeoFields::from_column(&seo),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};
    use crate::models::ContentBlock;
    use chrono::Duration;

    async fn setup_test_repo() -> (DynDatabasePool, SqlxArticleRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let author_id = sqlx::query(
            "INSERT INTO authors (account_ref, name, slug, created_at) VALUES ('acc', 'Asha', 'asha', CURRENT_TIMESTAMP)",
        )
        .execute(pool.sqlite())
        .await
        .expect("Failed to create author")
        .last_insert_rowid();

        for (id, slug) in [(1, "sports"), (2, "politics")] {
            sqlx::query(
                "INSERT INTO categories (id, name, slug, created_at, updated_at) VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)",
            )
            .bind(id)
            .bind(slug)
            .bind(slug)
            .execute(pool.sqlite())
            .await
            .expect("Failed to create category");
        }

        let repo = SqlxArticleRepository::new(pool.clone());
        (pool, repo, author_id)
    }

    fn test_article(slug: &str, author_id: i64, category_ids: Vec<i64>) -> Article {
        let now = Utc::now();
        Article {
            id: 0,
            title: format!("Title {}", slug),
            slug: slug.to_string(),
            subtitle: String::new(),
            intro: "Intro".to_string(),
            body: Body::new(vec![ContentBlock::paragraph("<p>Hello world</p>")]),
            featured_image: None,
            image_caption: String::new(),
            author_id,
            category_ids,
            topic_ids: Vec::new(),
            is_breaking_news: false,
            is_featured: false,
            is_premium: false,
            allow_comments: true,
            source: String::new(),
            source_url: String::new(),
            view_count: 0,
            read_time: 1,
            state: PublishState::Draft,
            first_published_at: None,
            seo: SeoFields::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_create_loads_links_and_body() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let created = repo
            .create(&test_article("a", author_id, vec![2, 1, 1]))
            .await
            .expect("Failed to create article");

        let found = repo.get_by_slug("a").await.unwrap().expect("Article should exist");
        assert_eq!(found.id, created.id);
        assert_eq!(found.category_ids, vec![1, 2]);
        assert_eq!(found.body.blocks().len(), 1);
        assert_eq!(found.state, PublishState::Draft);
    }

    #[tokio::test]
    async fn test_publish_keeps_first_published_at() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let created = repo.create(&test_article("a", author_id, vec![])).await.unwrap();
        let first = Utc::now() - Duration::days(2);

        assert!(repo.publish(created.id, first).await.unwrap());
        let published = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert!(published.is_live());
        let stamped = published.first_published_at.expect("first_published_at set");

        repo.unpublish(created.id).await.unwrap();
        repo.publish(created.id, Utc::now()).await.unwrap();
        let republished = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(republished.first_published_at, Some(stamped));
    }

    #[tokio::test]
    async fn test_list_filters_and_count() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let a = repo.create(&test_article("a", author_id, vec![1])).await.unwrap();
        let b = repo.create(&test_article("b", author_id, vec![2])).await.unwrap();
        repo.create(&test_article("draft", author_id, vec![1])).await.unwrap();
        repo.publish(a.id, Utc::now() - Duration::days(1)).await.unwrap();
        repo.publish(b.id, Utc::now()).await.unwrap();

        let live = repo.list(&ArticleQuery::live(), ArticleOrder::Newest, 10, 0).await.unwrap();
        assert_eq!(live.iter().map(|a| a.slug.as_str()).collect::<Vec<_>>(), vec!["b", "a"]);

        let sports = ArticleQuery {
            category_id: Some(1),
            ..ArticleQuery::live()
        };
        assert_eq!(repo.count(&sports).await.unwrap(), 1);
        assert_eq!(repo.count(&ArticleQuery::default()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_increment_view_is_atomic_update() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let created = repo.create(&test_article("a", author_id, vec![])).await.unwrap();
        for expected in 1..=3 {
            assert_eq!(repo.increment_view(created.id).await.unwrap(), Some(expected));
        }
        assert_eq!(repo.increment_view(404).await.unwrap(), None);
        assert_eq!(repo.get_by_id(created.id).await.unwrap().unwrap().view_count, 3);
    }

    #[tokio::test]
    async fn test_get_live_by_ids_keeps_order() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let a = repo.create(&test_article("a", author_id, vec![])).await.unwrap();
        let b = repo.create(&test_article("b", author_id, vec![])).await.unwrap();
        let draft = repo.create(&test_article("c", author_id, vec![])).await.unwrap();
        repo.publish(a.id, Utc::now()).await.unwrap();
        repo.publish(b.id, Utc::now()).await.unwrap();

        let found = repo.get_live_by_ids(&[b.id, draft.id, a.id]).await.unwrap();
        assert_eq!(found.iter().map(|a| a.id).collect::<Vec<_>>(), vec![b.id, a.id]);
        assert!(repo.get_live_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_ids_prefers_title_matches() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let mut intro_match = test_article("intro", author_id, vec![]);
        intro_match.intro = "A story about monsoon rains".to_string();
        let mut title_match = test_article("title", author_id, vec![]);
        title_match.title = "Monsoon arrives".to_string();

        let intro_match = repo.create(&intro_match).await.unwrap();
        let title_match = repo.create(&title_match).await.unwrap();
        repo.publish(intro_match.id, Utc::now()).await.unwrap();
        repo.publish(title_match.id, Utc::now() - Duration::days(3)).await.unwrap();

        let ids = repo.search_ids("monsoon", 10).await.unwrap();
        assert_eq!(ids, vec![title_match.id, intro_match.id]);
    }

    #[tokio::test]
    async fn test_search_ids_matches_body_text() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let mut article = test_article("weather-update", author_id, vec![]);
        article.title = "Weather update".to_string();
        article.intro = "Short intro".to_string();
        article.body = Body::new(vec![ContentBlock::paragraph(
            "<p>The <strong>monsoon</strong> reached Mangaluru</p>",
        )]);
        let article = repo.create(&article).await.unwrap();
        repo.publish(article.id, Utc::now()).await.unwrap();

        assert_eq!(repo.search_ids("monsoon", 10).await.unwrap(), vec![article.id]);
        // Markup is not searchable
        assert!(repo.search_ids("strong", 10).await.unwrap().is_empty());

        let mut edited = article.clone();
        edited.body = Body::new(vec![ContentBlock::paragraph("<p>Clear skies in Udupi</p>")]);
        repo.update(&edited).await.unwrap();
        assert!(repo.search_ids("monsoon", 10).await.unwrap().is_empty());
        assert_eq!(repo.search_ids("udupi", 10).await.unwrap(), vec![article.id]);
    }

    #[tokio::test]
    async fn test_search_ids_treats_wildcards_literally() {
        let (_pool, repo, author_id) = setup_test_repo().await;
        let mut discount = test_article("discount", author_id, vec![]);
        discount.title = "Fares cut by 50% on weekends".to_string();
        let mut plain = test_article("plain", author_id, vec![]);
        plain.title = "Fares cut by 50 rupees".to_string();
        let mut underscore = test_article("handle", author_id, vec![]);
        underscore.intro = "Follow news_desk for updates".to_string();

        let mut ids = Vec::new();
        for article in [discount, plain, underscore] {
            let created = repo.create(&article).await.unwrap();
            repo.publish(created.id, Utc::now()).await.unwrap();
            ids.push(created.id);
        }

        assert_eq!(repo.search_ids("50%", 10).await.unwrap(), vec![ids[0]]);
        assert_eq!(repo.search_ids("news_desk", 10).await.unwrap(), vec![ids[2]]);
        assert!(repo.search_ids("news_d_sk", 10).await.unwrap().is_empty());
        assert_eq!(repo.search_ids("%", 10).await.unwrap(), vec![ids[0]]);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%"), "50\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c:\\x"), "c:\\\\x");
        assert_eq!(escape_like("monsoon"), "monsoon");
    }
}
