//! Video repository

use crate::db::DynDatabasePool;
use crate::models::{PublishState, SeoFields, Video, VideoType};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

const VIDEO_COLUMNS: &str = "v.id, v.title, v.slug, v.video_type, v.source_url, v.duration, v.description, v.transcript, v.thumbnail, v.view_count, v.is_featured, v.is_trending, v.state, v.first_published_at, v.seo, v.created_at, v.updated_at";

/// Video repository trait
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create(&self, video: &Video) -> Result<Video>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Video>>;

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Video>>;

    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Mark live, setting `first_published_at` only the first time
    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<bool>;

    async fn unpublish(&self, id: i64) -> Result<bool>;

    async fn increment_view(&self, id: i64) -> Result<bool>;

    /// Live videos newest first, optionally of one type
    async fn list_live(
        &self,
        video_type: Option<VideoType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>>;

    async fn count_live(&self, video_type: Option<VideoType>) -> Result<i64>;
}

/// SQLx-based video repository implementation
pub struct SqlxVideoRepository {
    pool: DynDatabasePool,
}

impl SqlxVideoRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn VideoRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl VideoRepository for SqlxVideoRepository {
    async fn create(&self, video: &Video) -> Result<Video> {
        create_video(self.pool.sqlite(), video).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Video>> {
        let sql = format!("SELECT {} FROM videos v WHERE v.id = ?", VIDEO_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get video by ID")?;
        Ok(with_links(self.pool.sqlite(), row.into_iter().collect()).await?.pop())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Video>> {
        let sql = format!("SELECT {} FROM videos v WHERE v.slug = ?", VIDEO_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(slug)
            .fetch_optional(self.pool.sqlite())
            .await
            .context("Failed to get video by slug")?;
        Ok(with_links(self.pool.sqlite(), row.into_iter().collect()).await?.pop())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check video slug")?;
        Ok(count > 0)
    }

    async fn publish(&self, id: i64, at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET state = 'live', first_published_at = COALESCE(first_published_at, ?), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool.sqlite())
        .await
        .context("Failed to publish video")?;
        Ok(result.rows_affected() > 0)
    }

    async fn unpublish(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE videos SET state = 'draft', updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to unpublish video")?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_view(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE videos SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to increment video view count")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_live(
        &self,
        video_type: Option<VideoType>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Video>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM videos v WHERE v.state = 'live'",
            VIDEO_COLUMNS
        ));
        if let Some(video_type) = video_type {
            qb.push(" AND v.video_type = ").push_bind(video_type.as_str());
        }
        qb.push(" ORDER BY v.first_published_at DESC, v.id ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = qb
            .build()
            .fetch_all(self.pool.sqlite())
            .await
            .context("Failed to list videos")?;
        with_links(self.pool.sqlite(), rows).await
    }

    async fn count_live(&self, video_type: Option<VideoType>) -> Result<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM videos v WHERE v.state = 'live'");
        if let Some(video_type) = video_type {
            qb.push(" AND v.video_type = ").push_bind(video_type.as_str());
        }
        let count: i64 = qb
            .build_query_scalar()
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to count videos")?;
        Ok(count)
    }
}

async fn create_video(pool: &SqlitePool, video: &Video) -> Result<Video> {
    let now = Utc::now();
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO videos (title, slug, video_type, source_url, duration, description, transcript, thumbnail,
                            is_featured, is_trending, state, first_published_at, seo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&video.title)
    .bind(&video.slug)
    .bind(video.video_type.as_str())
    .bind(&video.source_url)
    .bind(video.duration)
    .bind(&video.description)
    .bind(&video.transcript)
    .bind(&video.thumbnail)
    .bind(video.is_featured)
    .bind(video.is_trending)
    .bind(video.state.as_str())
    .bind(video.first_published_at)
    .bind(video.seo.to_column())
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create video")?;

    let id = result.last_insert_rowid();
    for category_id in &video.category_ids {
        sqlx::query("INSERT OR IGNORE INTO video_categories (video_id, category_id) VALUES (?, ?)")
            .bind(id)
            .bind(*category_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link video category")?;
    }
    for topic_id in &video.topic_ids {
        sqlx::query("INSERT OR IGNORE INTO video_topics (video_id, topic_id) VALUES (?, ?)")
            .bind(id)
            .bind(*topic_id)
            .execute(&mut *tx)
            .await
            .context("Failed to link video topic")?;
    }
    tx.commit().await?;

    Ok(Video {
        id,
        view_count: 0,
        created_at: now,
        updated_at: now,
        ..video.clone()
    })
}

async fn with_links(pool: &SqlitePool, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Video>> {
    let mut videos: Vec<Video> = rows.iter().map(row_to_video).collect();
    if videos.is_empty() {
        return Ok(videos);
    }

    let ids: Vec<i64> = videos.iter().map(|v| v.id).collect();
    let categories = load_links(pool, "video_categories", "category_id", &ids).await?;
    let topics = load_links(pool, "video_topics", "topic_id", &ids).await?;

    for video in &mut videos {
        video.category_ids = categories.get(&video.id).cloned().unwrap_or_default();
        video.topic_ids = topics.get(&video.id).cloned().unwrap_or_default();
    }
    Ok(videos)
}

async fn load_links(
    pool: &SqlitePool,
    table: &'static str,
    column: &'static str,
    video_ids: &[i64],
) -> Result<HashMap<i64, Vec<i64>>> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!(
        "SELECT video_id, {} as link_id FROM {} WHERE video_id IN (",
        column, table
    ));
    let mut separated = qb.separated(", ");
    for id in video_ids {
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
            .entry(row.get("video_id"))
            .or_default()
            .push(row.get("link_id"));
    }
    Ok(links)
}

fn row_to_video(row: &sqlx::sqlite::SqliteRow) -> Video {
    let video_type: String = row.get("video_type");
    let state: String = row.get("state");
    let seo: String = row.get("seo");

    Video {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        video_type: VideoType::from_str(&video_type).unwrap_or_default(),
        source_url: row.get("source_url"),
        duration: row.get("duration"),
        description: row.get("description"),
        transcript: row.get("transcript"),
        thumbnail: row.get("thumbnail"),
        category_ids: Vec::new(),
        topic_ids: Vec::new(),
        view_count: row.get("view_count"),
        is_featured: row.get("is_featured"),
        is_trending: row.get("is_trending"),
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
    use chrono::Duration;

    async fn setup_test_repo() -> SqlxVideoRepository {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        SqlxVideoRepository::new(pool)
    }

    fn test_video(slug: &str, video_type: VideoType) -> Video {
        let now = Utc::now();
        Video {
            id: 0,
            title: slug.to_uppercase(),
            slug: slug.to_string(),
            video_type,
            source_url: format!("https://youtu.be/{}", slug),
            duration: Some(90),
            description: String::new(),
            transcript: String::new(),
            thumbnail: None,
            category_ids: Vec::new(),
            topic_ids: Vec::new(),
            view_count: 0,
            is_featured: false,
            is_trending: false,
            state: PublishState::Draft,
            first_published_at: None,
            seo: SeoFields::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_list_live_by_type() {
        let repo = setup_test_repo().await;
        let full = repo.create(&test_video("full", VideoType::Full)).await.unwrap();
        let short = repo.create(&test_video("short", VideoType::Short)).await.unwrap();
        repo.create(&test_video("draft", VideoType::Short)).await.unwrap();
        repo.publish(full.id, Utc::now() - Duration::hours(1)).await.unwrap();
        repo.publish(short.id, Utc::now()).await.unwrap();

        let all = repo.list_live(None, 10, 0).await.unwrap();
        assert_eq!(all.iter().map(|v| v.id).collect::<Vec<_>>(), vec![short.id, full.id]);

        let shorts = repo.list_live(Some(VideoType::Short), 10, 0).await.unwrap();
        assert_eq!(shorts.len(), 1);
        assert_eq!(repo.count_live(Some(VideoType::Short)).await.unwrap(), 1);
        assert_eq!(repo.count_live(None).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_increment_view() {
        let repo = setup_test_repo().await;
        let video = repo.create(&test_video("v", VideoType::Full)).await.unwrap();
        repo.increment_view(video.id).await.unwrap();
        assert_eq!(repo.get_by_slug("v").await.unwrap().unwrap().view_count, 1);
    }
}
