//! Author repository
//!
//! Database operations for authors and their cached statistics.

use crate::db::DynDatabasePool;
use crate::models::{Author, SocialLinks};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

const AUTHOR_COLUMNS: &str = "id, account_ref, name, slug, designation, bio, profile_image, is_featured, facebook_url, twitter_url, instagram_url, youtube_url, article_count, total_views, created_at";

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    async fn create(&self, author: &Author) -> Result<Author>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Author>>;

    async fn get_by_account_ref(&self, account_ref: &str) -> Result<Option<Author>>;

    /// All authors, `article_count DESC, name ASC`
    async fn list(&self) -> Result<Vec<Author>>;

    /// Featured authors, `article_count DESC, name ASC`
    async fn list_featured(&self, limit: i64) -> Result<Vec<Author>>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Articles referencing the author, in any state
    async fn count_all_articles(&self, id: i64) -> Result<i64>;

    /// Live articles by the author
    async fn count_live_articles(&self, id: i64) -> Result<i64>;

    /// Sum of view counts over the author's live articles
    async fn sum_live_views(&self, id: i64) -> Result<i64>;

    async fn set_article_count(&self, id: i64, article_count: i64) -> Result<()>;

    async fn set_total_views(&self, id: i64, total_views: i64) -> Result<()>;
}

/// SQLx-based author repository implementation
pub struct SqlxAuthorRepository {
    pool: DynDatabasePool,
}

impl SqlxAuthorRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, author: &Author) -> Result<Author> {
        create_author(self.pool.sqlite(), author).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Author>> {
        let sql = format!("SELECT {} FROM authors WHERE id = ?", AUTHOR_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get author by ID")?;
        Ok(row.as_ref().map(row_to_author))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Author>> {
        let sql = format!("SELECT {} FROM authors WHERE slug = ?", AUTHOR_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get author by slug")?;
        Ok(row.as_ref().map(row_to_author))
    }

    async fn get_by_account_ref(&self, account_ref: &str) -> Result<Option<Author>> {
        let sql = format!("SELECT {} FROM authors WHERE account_ref = ?", AUTHOR_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(account_ref)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get author by account")?;
        Ok(row.as_ref().map(row_to_author))
    }

    async fn list(&self) -> Result<Vec<Author>> {
        let sql = format!(
            "SELECT {} FROM authors ORDER BY article_count DESC, name ASC, id ASC",
            AUTHOR_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list authors")?;
        Ok(rows.iter().map(row_to_author).collect())
    }

    async fn list_featured(&self, limit: i64) -> Result<Vec<Author>> {
        let sql = format!(
            "SELECT {} FROM authors WHERE is_featured = 1 ORDER BY article_count DESC, name ASC, id ASC LIMIT ?",
            AUTHOR_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list featured authors")?;
        Ok(rows.iter().map(row_to_author).collect())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete author")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM authors WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check author slug")?;
        Ok(count > 0)
    }

    async fn count_all_articles(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE author_id = ?")
            .bind(id)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count author articles")?;
        Ok(count)
    }

    async fn count_live_articles(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE author_id = ? AND state = 'live'",
        )
        .bind(id)
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to count live author articles")?;
        Ok(count)
    }

    async fn sum_live_views(&self, id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(view_count), 0) FROM articles WHERE author_id = ? AND state = 'live'",
        )
        .bind(id)
        .fetch_one(self.pool.sqlite())
        .await
        .context("Failed to sum author views")?;
        Ok(total)
    }

    async fn set_article_count(&self, id: i64, article_count: i64) -> Result<()> {
        sqlx::query("UPDATE authors SET article_count = ? WHERE id = ?")
            .bind(article_count)
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to store author article count")?;
        Ok(())
    }

    async fn set_total_views(&self, id: i64, total_views: i64) -> Result<()> {
        sqlx::query("UPDATE authors SET total_views = ? WHERE id = ?")
            .bind(total_views)
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to store author total views")?;
        Ok(())
    }
}

async fn create_author(pool: &SqlitePool, author: &Author) -> Result<Author> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO authors (account_ref, name, slug, designation, bio, profile_image, is_featured,
                             facebook_url, twitter_url, instagram_url, youtube_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&author.account_ref)
    .bind(&author.name)
    .bind(&author.slug)
    .bind(&author.designation)
    .bind(&author.bio)
    .bind(&author.profile_image)
    .bind(author.is_featured)
    .bind(&author.social.facebook_url)
    .bind(&author.social.twitter_url)
    .bind(&author.social.instagram_url)
    .bind(&author.social.youtube_url)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create author")?;

    Ok(Author {
        id: result.last_insert_rowid(),
        article_count: 0,
        total_views: 0,
        created_at: now,
        ..author.clone()
    })
}

fn row_to_author(row: &sqlx::sqlite::SqliteRow) -> Author {
    Author {
        id: row.get("id"),
        account_ref: row.get("account_ref"),
        name: row.get("name"),
        slug: row.get("slug"),
        designation: row.get("designation"),
        bio: row.get("bio"),
        profile_image: row.get("profile_image"),
        is_featured: row.get("is_featured"),
        social: SocialLinks {
            facebook_url: row.get("facebook_url"),
            twitter_url: row.get("twitter_url"),
            instagram_url: row.get("instagram_url"),
            youtube_url: row.get("youtube_url"),
        },
        article_count: row.get("article_count"),
        total_views: row.get("total_views"),
        created_at: row.get("created_at"),
    }
}
