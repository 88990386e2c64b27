//! Category service
//!
//! Implements business logic for the category taxonomy:
//! - Create, read, update, delete categories
//! - Hierarchy resolution (`resolve_hierarchy`, `full_name`) with cycle detection
//! - Menu children, pre-order descendants and the menu tree
//! - Popular categories by live article count
//!
//! Every hierarchy walk runs on a `CategoryArena` built from the cached flat
//! category list.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::CategoryRepository;
use crate::models::{
    Category, CategoryArena, CategoryTree, CategoryWithCount, CreateCategoryInput, HierarchyError,
    UpdateCategoryInput,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::article::generate_slug;

/// Default cache TTL for categories (1 hour)
const CATEGORY_CACHE_TTL_SECS: u64 = 3600;

/// Cache keys
const CACHE_KEY_CATEGORY_ALL: &str = "category:all";
const CACHE_PATTERN_CATEGORY: &str = "category:*";

/// Error types for category service operations
#[derive(Debug, thiserror::Error)]
pub enum CategoryServiceError {
    /// Category slug already exists
    #[error("Category slug already exists: {0}")]
    DuplicateSlug(String),

    /// Category not found
    #[error("Category not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Parent category not found
    #[error("Parent category not found: {0}")]
    ParentNotFound(i64),

    /// Re-parenting would make a category its own ancestor
    #[error("Circular reference detected: category cannot be its own ancestor")]
    CircularReference,

    /// Stored parent chain loops
    #[error("Cycle detected in category hierarchy at category {0}")]
    CycleDetected(i64),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<HierarchyError> for CategoryServiceError {
    fn from(err: HierarchyError) -> Self {
        match err {
            HierarchyError::UnknownCategory(id) => CategoryServiceError::NotFound(id.to_string()),
            HierarchyError::CycleDetected(id) => CategoryServiceError::CycleDetected(id),
        }
    }
}

/// Category page payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryDetail {
    #[serde(flatten)]
    pub category: Category,
    /// Ancestors from the root down to this category
    pub hierarchy: Vec<Category>,
    pub full_name: String,
    /// Menu-visible direct children
    pub children: Vec<Category>,
}

/// Category service for the news taxonomy
pub struct CategoryService {
    repo: Arc<dyn CategoryRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl CategoryService {
    /// Create a new category service
    pub fn new(repo: Arc<dyn CategoryRepository>, cache: Arc<Cache>) -> Self {
        Self::with_cache_ttl(repo, cache, Duration::from_secs(CATEGORY_CACHE_TTL_SECS))
    }

    /// Create a new category service with custom cache TTL
    pub fn with_cache_ttl(repo: Arc<dyn CategoryRepository>, cache: Arc<Cache>, cache_ttl: Duration) -> Self {
        Self {
            repo,
            cache,
            cache_ttl,
        }
    }

    /// Create a new category
    ///
    /// # Errors
    /// - `ValidationError` if the name is blank or no slug can be derived
    /// - `DuplicateSlug` if the slug is taken
    /// - `ParentNotFound` if the parent does not exist
    pub async fn create(&self, input: CreateCategoryInput) -> Result<Category, CategoryServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }

        let slug = match input.slug {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => generate_slug(&name),
        };
        if slug.is_empty() {
            return Err(CategoryServiceError::ValidationError(
                "Category slug cannot be empty".to_string(),
            ));
        }
        if self.repo.exists_by_slug(&slug).await.context("Failed to check slug uniqueness")? {
            return Err(CategoryServiceError::DuplicateSlug(slug));
        }

        if let Some(parent_id) = input.parent_id {
            if self.repo.get_by_id(parent_id).await?.is_none() {
                return Err(CategoryServiceError::ParentNotFound(parent_id));
            }
        }

        let mut category = Category::new(name, slug);
        category.description = input.description;
        category.parent_id = input.parent_id;
        category.featured = input.featured;
        category.sort_order = input.sort_order;
        category.show_in_menu = input.show_in_menu.unwrap_or(true);
        category.layout = input.layout;
        category.seo = input.seo;

        let created = self.repo.create(&category).await?;
        self.invalidate().await;
        tracing::info!("Created category {} ({})", created.slug, created.id);
        Ok(created)
    }

    /// Update a category
    ///
    /// # Errors
    /// - `NotFound` if the category does not exist
    /// - `CircularReference` if the new parent is the category or one of its descendants
    pub async fn update(&self, id: i64, input: UpdateCategoryInput) -> Result<Category, CategoryServiceError> {
        let mut category = self
            .repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))?;

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(CategoryServiceError::ValidationError(
                    "Category name cannot be empty".to_string(),
                ));
            }
            category.name = name.trim().to_string();
        }

        if let Some(slug) = input.slug {
            let slug = slug.trim().to_string();
            if slug != category.slug {
                if slug.is_empty() {
                    return Err(CategoryServiceError::ValidationError(
                        "Category slug cannot be empty".to_string(),
                    ));
                }
                if self.repo.exists_by_slug(&slug).await? {
                    return Err(CategoryServiceError::DuplicateSlug(slug));
                }
                category.slug = slug;
            }
        }

        if let Some(parent_id) = input.parent_id {
            if let Some(new_parent) = parent_id {
                if self.repo.get_by_id(new_parent).await?.is_none() {
                    return Err(CategoryServiceError::ParentNotFound(new_parent));
                }
                let arena = self.arena().await?;
                if arena.would_create_cycle(id, new_parent) {
                    return Err(CategoryServiceError::CircularReference);
                }
            }
            category.parent_id = parent_id;
        }

        if let Some(description) = input.description {
            category.description = description;
        }
        if let Some(featured) = input.featured {
            category.featured = featured;
        }
        if let Some(sort_order) = input.sort_order {
            category.sort_order = sort_order;
        }
        if let Some(show_in_menu) = input.show_in_menu {
            category.show_in_menu = show_in_menu;
        }
        if let Some(layout) = input.layout {
            category.layout = layout;
        }
        if let Some(seo) = input.seo {
            category.seo = seo;
        }

        let updated = self.repo.update(&category).await?;
        self.invalidate().await;
        Ok(updated)
    }

    /// Delete a category; its children become root categories
    pub async fn delete(&self, id: i64) -> Result<(), CategoryServiceError> {
        if self.repo.get_by_id(id).await?.is_none() {
            return Err(CategoryServiceError::NotFound(id.to_string()));
        }
        self.repo.delete(id).await?;
        self.invalidate().await;
        tracing::info!("Deleted category {}", id);
        Ok(())
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Category, CategoryServiceError> {
        self.arena()
            .await?
            .get(id)
            .cloned()
            .ok_or_else(|| CategoryServiceError::NotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, CategoryServiceError> {
        self.arena()
            .await?
            .find_by_slug(slug)
            .cloned()
            .ok_or_else(|| CategoryServiceError::NotFound(slug.to_string()))
    }

    /// All categories in menu order
    pub async fn list(&self) -> Result<Vec<Category>, CategoryServiceError> {
        self.load_all().await
    }

    /// Ancestors from the root down to the category itself
    pub async fn resolve_hierarchy(&self, id: i64) -> Result<Vec<Category>, CategoryServiceError> {
        let arena = self.arena().await?;
        let chain = arena.resolve_hierarchy(id)?;
        Ok(chain.into_iter().cloned().collect())
    }

    /// Ancestor names joined with `" > "`
    pub async fn full_name(&self, id: i64) -> Result<String, CategoryServiceError> {
        Ok(self.arena().await?.full_name(id)?)
    }

    /// Menu-visible direct children in menu order
    pub async fn list_children(&self, id: i64) -> Result<Vec<Category>, CategoryServiceError> {
        let arena = self.arena().await?;
        if arena.get(id).is_none() {
            return Err(CategoryServiceError::NotFound(id.to_string()));
        }
        Ok(arena.list_children(id).into_iter().cloned().collect())
    }

    /// Pre-order traversal of menu children
    pub async fn descendants(&self, id: i64) -> Result<Vec<Category>, CategoryServiceError> {
        let arena = self.arena().await?;
        let found = arena.descendants(id)?;
        Ok(found.into_iter().cloned().collect())
    }

    /// Menu tree of root categories
    pub async fn tree(&self) -> Result<Vec<CategoryTree>, CategoryServiceError> {
        Ok(self.arena().await?.tree())
    }

    /// Category page payload by slug
    pub async fn detail(&self, slug: &str) -> Result<CategoryDetail, CategoryServiceError> {
        let arena = self.arena().await?;
        let category = arena
            .find_by_slug(slug)
            .cloned()
            .ok_or_else(|| CategoryServiceError::NotFound(slug.to_string()))?;

        let hierarchy: Vec<Category> = arena
            .resolve_hierarchy(category.id)?
            .into_iter()
            .cloned()
            .collect();
        let full_name = arena.full_name(category.id)?;
        let children = arena.list_children(category.id).into_iter().cloned().collect();

        Ok(CategoryDetail {
            category,
            hierarchy,
            full_name,
            children,
        })
    }

    /// Categories by live article count, computed per request
    pub async fn popular(&self, limit: i64) -> Result<Vec<CategoryWithCount>, CategoryServiceError> {
        Ok(self.repo.popular(limit.max(1)).await?)
    }

    /// Build an arena over every category
    pub async fn arena(&self) -> Result<CategoryArena, CategoryServiceError> {
        Ok(CategoryArena::from_categories(self.load_all().await?))
    }

    async fn load_all(&self) -> Result<Vec<Category>, CategoryServiceError> {
        if let Ok(Some(cached)) = self.cache.get::<Vec<Category>>(CACHE_KEY_CATEGORY_ALL).await {
            return Ok(cached);
        }

        let categories = self.repo.list().await?;
        let _ = self
            .cache
            .set(CACHE_KEY_CATEGORY_ALL, &categories, self.cache_ttl)
            .await;
        Ok(categories)
    }

    async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_CATEGORY).await;
    }
}
