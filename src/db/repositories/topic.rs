//! Topic repository
//!
//! Database operations for topics, their symmetric relations and counters.

use crate::db::DynDatabasePool;
use crate::models::{SeoFields, Topic};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

const TOPIC_COLUMNS: &str = "t.id, t.name, t.slug, t.description, t.featured_image, t.is_featured, t.is_trending, t.view_count, t.follower_count, t.article_count, t.include_in_feed, t.feed_description, t.seo, t.created_at, t.updated_at";

/// Topic repository trait
#[async_trait]
pub trait TopicRepository: Send + Sync {
    async fn create(&self, topic: &Topic) -> Result<Topic>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>>;

    /// All topics by name
    async fn list(&self) -> Result<Vec<Topic>>;

    async fn update(&self, topic: &Topic) -> Result<Topic>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Link two topics in both directions, atomically
    async fn add_relation(&self, a: i64, b: i64) -> Result<()>;

    /// Unlink two topics in both directions, atomically
    async fn remove_relation(&self, a: i64, b: i64) -> Result<()>;

    /// Topics related to `id`, by name
    async fn related(&self, id: i64) -> Result<Vec<Topic>>;

    /// Atomic `view_count + 1`; returns false when the topic does not exist
    async fn increment_view(&self, id: i64) -> Result<bool>;

    /// Add `delta` to `follower_count`, clamped at zero
    async fn adjust_followers(&self, id: i64, delta: i64) -> Result<bool>;

    /// Number of articles tagged with the topic, in any state
    async fn count_articles(&self, id: i64) -> Result<i64>;

    async fn set_article_count(&self, id: i64, count: i64) -> Result<()>;
}

/// SQLx-based topic repository implementation
pub struct SqlxTopicRepository {
    pool: DynDatabasePool,
}

impl SqlxTopicRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TopicRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TopicRepository for SqlxTopicRepository {
    async fn create(&self, topic: &Topic) -> Result<Topic> {
        create_topic(self.pool.sqlite(), topic).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>> {
        let sql = format!("SELECT {} FROM topics t WHERE t.id = ?", TOPIC_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get topic by ID")?;
        row.as_ref().map(row_to_topic).transpose()
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>> {
        let sql = format!("SELECT {} FROM topics t WHERE t.slug = ?", TOPIC_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get topic by slug")?;
        row.as_ref().map(row_to_topic).transpose()
    }

    async fn list(&self) -> Result<Vec<Topic>> {
        let sql = format!("SELECT {} FROM topics t ORDER BY t.name ASC, t.id ASC", TOPIC_COLUMNS);
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list topics")?;
        rows.iter().map(row_to_topic).collect()
    }

    async fn update(&self, topic: &Topic) -> Result<Topic> {
        update_topic(self.pool.sqlite(), topic).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM topics WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete topic")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topics WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check topic slug")?;
        Ok(count > 0)
    }

    async fn add_relation(&self, a: i64, b: i64) -> Result<()> {
        set_relation(self.pool.sqlite(), a, b, true).await
    }

    async fn remove_relation(&self, a: i64, b: i64) -> Result<()> {
        set_relation(self.pool.sqlite(), a, b, false).await
    }

    async fn related(&self, id: i64) -> Result<Vec<Topic>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM topics t
            INNER JOIN topic_relations r ON r.related_id = t.id
            WHERE r.topic_id = ? AND t.id != r.topic_id
            ORDER BY t.name ASC, t.id ASC
            "#,
            TOPIC_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(id)
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list related topics")?;
        rows.iter().map(row_to_topic).collect()
    }

    async fn increment_view(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE topics SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to increment topic view count")?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_followers(&self, id: i64, delta: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE topics SET follower_count = MAX(follower_count + ?, 0) WHERE id = ?",
        )
        .bind(delta)
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to update topic followers")?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_articles(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM article_topics WHERE topic_id = ?")
            .bind(id)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count topic articles")?;
        Ok(count)
    }

    async fn set_article_count(&self, id: i64, count: i64) -> Result<()> {
        sqlx::query("UPDATE topics SET article_count = ? WHERE id = ?")
            .bind(count)
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to store topic article count")?;
        Ok(())
    }
}

async fn create_topic(pool: &SqlitePool, topic: &Topic) -> Result<Topic> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO topics (name, slug, description, featured_image, is_featured, is_trending,
                            include_in_feed, feed_description, seo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&topic.name)
    .bind(&topic.slug)
    .bind(&topic.description)
    .bind(&topic.featured_image)
    .bind(topic.is_featured)
    .bind(topic.is_trending)
    .bind(topic.include_in_feed)
    .bind(&topic.feed_description)
    .bind(topic.seo.to_column())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_rowid(),
        view_count: 0,
        follower_count: 0,
        article_count: 0,
        created_at: now,
        updated_at: now,
        ..topic.clone()
    })
}

async fn update_topic(pool: &SqlitePool, topic: &Topic) -> Result<Topic> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE topics
        SET name = ?, description = ?, featured_image = ?, is_featured = ?, is_trending = ?,
            include_in_feed = ?, feed_description = ?, seo = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&topic.name)
    .bind(&topic.description)
    .bind(&topic.featured_image)
    .bind(topic.is_featured)
    .bind(topic.is_trending)
    .bind(topic.include_in_feed)
    .bind(&topic.feed_description)
    .bind(topic.seo.to_column())
    .bind(now)
    .bind(topic.id)
    .execute(pool)
    .await
    .context("Failed to update topic")?;

    Ok(Topic {
        updated_at: now,
        ..topic.clone()
    })
}

async fn set_relation(pool: &SqlitePool, a: i64, b: i64, linked: bool) -> Result<()> {
    let sql = if linked {
        "INSERT OR IGNORE INTO topic_relations (topic_id, related_id) VALUES (?, ?)"
    } else {
        "DELETE FROM topic_relations WHERE topic_id = ? AND related_id = ?"
    };

    let mut tx = pool.begin().await?;
    for (from, to) in [(a, b), (b, a)] {
        sqlx::query(sql)
            .bind(from)
            .bind(to)
            .execute(&mut *tx)
            .await
            .context("Failed to update topic relation")?;
    }
    tx.commit().await?;
    Ok(())
}

fn row_to_topic(row: &sqlx::sqlite::SqliteRow) -> Result<Topic> {
    let seo: String = row.get("seo");

    Ok(Topic {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        featured_image: row.get("featured_image"),
        is_featured: row.get("is_featured"),
        is_trending: row.get("is_trending"),
        view_count: row.get("view_count"),
        follower_count: row.get("follower_count"),
        article_count: row.get("article_count"),
        include_in_feed: row.get("include_in_feed"),
        feed_description: row.get("feed_description"),
        seo: SeoFields::from_column(&seo),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> SqlxTopicRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxTopicRepository::new(pool)
    }

    fn test_topic(name: &str, slug: &str) -> Topic {
        let now = Utc::now();
        Topic {
            id: 0,
            name: name.to_string(),
            slug: slug.to_string(),
            description: String::new(),
            featured_image: None,
            is_featured: false,
            is_trending: false,
            view_count: 0,
            follower_count: 0,
            article_count: 0,
            include_in_feed: true,
            feed_description: String::new(),
            seo: SeoFields::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_relation_is_stored_both_ways() {
        let repo = setup_test_repo().await;
        let a = repo.create(&test_topic("Elections", "elections")).await.unwrap();
        let b = repo.create(&test_topic("Parliament", "parliament")).await.unwrap();

        repo.add_relation(a.id, b.id).await.unwrap();
        repo.add_relation(a.id, b.id).await.unwrap();

        assert_eq!(repo.related(a.id).await.unwrap()[0].id, b.id);
        assert_eq!(repo.related(b.id).await.unwrap()[0].id, a.id);

        repo.remove_relation(b.id, a.id).await.unwrap();
        assert!(repo.related(a.id).await.unwrap().is_empty());
        assert!(repo.related(b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_counters() {
        let repo = setup_test_repo().await;
        let topic = repo.create(&test_topic("Monsoon", "monsoon")).await.unwrap();

        assert!(repo.increment_view(topic.id).await.unwrap());
        assert!(repo.increment_view(topic.id).await.unwrap());
        assert!(!repo.increment_view(9999).await.unwrap());

        repo.adjust_followers(topic.id, 1).await.unwrap();
        repo.adjust_followers(topic.id, -1).await.unwrap();
        repo.adjust_followers(topic.id, -1).await.unwrap();

        let found = repo.get_by_id(topic.id).await.unwrap().unwrap();
        assert_eq!(found.view_count, 2);
        assert_eq!(found.follower_count, 0);
    }

    #[tokio::test]
    async fn test_delete_cascades_relations() {
        let repo = setup_test_repo().await;
        let a = repo.create(&test_topic("A", "a")).await.unwrap();
        let b = repo.create(&test_topic("B", "b")).await.unwrap();
        repo.add_relation(a.id, b.id).await.unwrap();

        repo.delete(b.id).await.unwrap();
        assert!(repo.related(a.id).await.unwrap().is_empty());
        assert!(repo.get_by_slug("b").await.unwrap().is_none());
    }
}
