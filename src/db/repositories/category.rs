//! Category repository
//!
//! Database operations for categories.
//!
//! This module provides:
//! - `CategoryRepository` trait defining the interface for category data access
//! - `SqlxCategoryRepository` implementing the trait for SQLite
//!
//! Hierarchy walks are not done in SQL; callers load the full list and build a
//! `CategoryArena`.

use crate::db::DynDatabasePool;
use crate::models::{Category, CategoryLayout, CategoryWithCount, SeoFields};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, parent_id, featured, sort_order, show_in_menu, layout, seo, created_at, updated_at";

/// Category repository trait
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Create a new category
    async fn create(&self, category: &Category) -> Result<Category>;

    /// Get category by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Category>>;

    /// Get category by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// List all categories (flat list)
    async fn list(&self) -> Result<Vec<Category>>;

    /// Update a category
    async fn update(&self, category: &Category) -> Result<Category>;

    /// Delete a category. Children become roots.
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check if a category slug already exists
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;

    /// Categories ordered by the number of live articles filed under them
    async fn popular(&self, limit: i64) -> Result<Vec<CategoryWithCount>>;
}

/// SQLx-based category repository implementation
pub struct SqlxCategoryRepository {
    pool: DynDatabasePool,
}

impl SqlxCategoryRepository {
    /// Create a new SQLx category repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn CategoryRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CategoryRepository for SqlxCategoryRepository {
    async fn create(&self, category: &Category) -> Result<Category> {
        create_category(self.pool.sqlite(), category).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Category>> {
        get_category_by_id(self.pool.sqlite(), id).await
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        get_category_by_slug(self.pool.sqlite(), slug).await
    }

    async fn list(&self) -> Result<Vec<Category>> {
        list_categories(self.pool.sqlite()).await
    }

    async fn update(&self, category: &Category) -> Result<Category> {
        update_category(self.pool.sqlite(), category).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM categories WHERE id = ?")
            .bind(id)
            .execute(self.pool.sqlite())
            .await
            .context("Failed to delete category")?;
        Ok(())
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM categories WHERE slug = ?")
            .bind(slug)
            .fetch_one(self.pool.sqlite())
            .await
            .context("Failed to check category slug")?;
        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn popular(&self, limit: i64) -> Result<Vec<CategoryWithCount>> {
        popular_categories(self.pool.sqlite(), limit).await
    }
}

async fn create_category(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO categories (name, slug, description, parent_id, featured, sort_order, show_in_menu, layout, seo, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(category.parent_id)
    .bind(category.featured)
    .bind(category.sort_order)
    .bind(category.show_in_menu)
    .bind(category.layout.as_str())
    .bind(category.seo.to_column())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create category")?;

    Ok(Category {
        id: result.last_insert_rowid(),
        created_at: now,
        updated_at: now,
        ..category.clone()
    })
}

async fn get_category_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE id = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by ID")?;

    row.as_ref().map(row_to_category).transpose()
}

async fn get_category_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Category>> {
    let sql = format!("SELECT {} FROM categories WHERE slug = ?", CATEGORY_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(slug)
        .fetch_optional(pool)
        .await
        .context("Failed to get category by slug")?;

    row.as_ref().map(row_to_category).transpose()
}

async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>> {
    let sql = format!(
        "SELECT {} FROM categories ORDER BY sort_order ASC, created_at ASC, id ASC",
        CATEGORY_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .fetch_all(pool)
        .await
        .context("Failed to list categories")?;

    rows.iter().map(row_to_category).collect()
}

async fn update_category(pool: &SqlitePool, category: &Category) -> Result<Category> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE categories
        SET name = ?, slug = ?, description = ?, parent_id = ?, featured = ?, sort_order = ?,
            show_in_menu = ?, layout = ?, seo = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&category.name)
    .bind(&category.slug)
    .bind(&category.description)
    .bind(category.parent_id)
    .bind(category.featured)
    .bind(category.sort_order)
    .bind(category.show_in_menu)
    .bind(category.layout.as_str())
    .bind(category.seo.to_column())
    .bind(now)
    .bind(category.id)
    .execute(pool)
    .await
    .context("Failed to update category")?;

    Ok(Category {
        updated_at: now,
        ..category.clone()
    })
}

async fn popular_categories(pool: &SqlitePool, limit: i64) -> Result<Vec<CategoryWithCount>> {
    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name, c.slug, c.description, c.parent_id, c.featured, c.sort_order,
               c.show_in_menu, c.layout, c.seo, c.created_at, c.updated_at,
               COUNT(a.id) as article_count
        FROM categories c
        LEFT JOIN article_categories ac ON ac.category_id = c.id
        LEFT JOIN articles a ON a.id = ac.article_id AND a.state = 'live'
        GROUP BY c.id
        ORDER BY article_count DESC, c.name ASC, c.id ASC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("Failed to list popular categories")?;

    rows.iter()
        .map(|row| {
            Ok(CategoryWithCount {
                category: row_to_category(row)?,
                article_count: row.get("article_count"),
            })
        })
        .collect()
}

fn row_to_category(row: &sqlx::sqlite::SqliteRow) -> Result<Category> {
    let layout: String = row.get("layout");
    let seo: String = row.get("seo");

    Ok(Category {
        id: row.get("id"),
        name: row.get("name"),
        slug: row.get("slug"),
        description: row.get("description"),
        parent_id: row.get("parent_id"),
        featured: row.get("featured"),
        sort_order: row.get("sort_order"),
        show_in_menu: row.get("show_in_menu"),
        layout: CategoryLayout::from_str(&layout).unwrap_or_default(),
        seo: SeoFields::from_column(&seo),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}
