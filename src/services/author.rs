//! Author service
//!
//! Authors are linked one-to-one to an account reference. Their
//! `article_count` and `total_views` are cached aggregates that only change
//! through the explicit `recompute_*` calls.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{ArticleOrder, ArticleQuery, ArticleRepository, AuthorRepository};
use crate::models::{Article, Author, CreateAuthorInput};
use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::article::generate_slug;

/// Default cache TTL for author profiles (10 minutes)
const AUTHOR_CACHE_TTL_SECS: u64 = 600;

const CACHE_KEY_AUTHOR_PROFILE: &str = "author:profile:";
const CACHE_KEY_AUTHOR_FEATURED: &str = "author:featured:";
const CACHE_PATTERN_AUTHOR: &str = "author:*";

/// Error types for author service operations
#[derive(Debug, thiserror::Error)]
pub enum AuthorServiceError {
    #[error("Author not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Author slug already exists: {0}")]
    DuplicateSlug(String),

    #[error("Account already has an author profile: {0}")]
    DuplicateAccount(String),

    /// The author is still referenced by articles
    #[error("Author {0} is referenced by {1} article(s)")]
    Protected(i64, i64),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Author page payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorProfile {
    #[serde(flatten)]
    pub author: Author,
    pub recent_articles: Vec<Article>,
}

/// Get or create the system author used for unattributed articles.
///
/// Runs once at setup; the returned id is handed to the article service.
pub async fn ensure_system_author(repo: &dyn AuthorRepository) -> anyhow::Result<Author> {
    if let Some(author) = repo
        .get_by_account_ref(crate::models::SYSTEM_ACCOUNT_REF)
        .await
        .context("Failed to look up system author")?
    {
        return Ok(author);
    }

    let author = repo
        .create(&author_from_input(CreateAuthorInput::system(), String::new()))
        .await
        .context("Failed to create system author")?;
    tracing::info!("Created system author {} ({})", author.slug, author.id);
    Ok(author)
}

fn author_from_input(input: CreateAuthorInput, fallback_slug: String) -> Author {
    Author {
        id: 0,
        account_ref: input.account_ref,
        name: input.name,
        slug: input.slug.unwrap_or(fallback_slug),
        designation: input.designation,
        bio: input.bio,
        profile_image: input.profile_image,
        is_featured: input.is_featured,
        social: input.social,
        article_count: 0,
        total_views: 0,
        created_at: Utc::now(),
    }
}

/// Author service
pub struct AuthorService {
    repo: Arc<dyn AuthorRepository>,
    article_repo: Arc<dyn ArticleRepository>,
    cache: Arc<Cache>,
    cache_ttl: Duration,
}

impl AuthorService {
    pub fn new(
        repo: Arc<dyn AuthorRepository>,
        article_repo: Arc<dyn ArticleRepository>,
        cache: Arc<Cache>,
    ) -> Self {
        Self {
            repo,
            article_repo,
            cache,
            cache_ttl: Duration::from_secs(AUTHOR_CACHE_TTL_SECS),
        }
    }

    /// Explicit setup step: make sure the system author exists and return its id
    pub async fn init_system_author(&self) -> Result<i64, AuthorServiceError> {
        let author = ensure_system_author(self.repo.as_ref()).await?;
        Ok(author.id)
    }

    /// Register an author for an account
    ///
    /// # Errors
    /// - `ValidationError` if account or name is blank
    /// - `DuplicateAccount` if the account already has a profile
    /// - `DuplicateSlug` if the slug is taken
    pub async fn create(&self, mut input: CreateAuthorInput) -> Result<Author, AuthorServiceError> {
        input.name = input.name.trim().to_string();
        input.account_ref = input.account_ref.trim().to_string();
        if input.name.is_empty() {
            return Err(AuthorServiceError::ValidationError(
                "Author name cannot be empty".to_string(),
            ));
        }
        if input.account_ref.is_empty() {
            return Err(AuthorServiceError::ValidationError(
                "Account reference cannot be empty".to_string(),
            ));
        }

        if self.repo.get_by_account_ref(&input.account_ref).await?.is_some() {
            return Err(AuthorServiceError::DuplicateAccount(input.account_ref));
        }

        let slug = match input.slug.take() {
            Some(slug) if !slug.trim().is_empty() => slug.trim().to_string(),
            _ => generate_slug(&input.name),
        };
        if slug.is_empty() {
            return Err(AuthorServiceError::ValidationError(
                "Author slug cannot be empty".to_string(),
            ));
        }
        if self.repo.exists_by_slug(&slug).await? {
            return Err(AuthorServiceError::DuplicateSlug(slug));
        }

        let author = self.repo.create(&author_from_input(input, slug)).await?;
        self.invalidate().await;
        Ok(author)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Author, AuthorServiceError> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AuthorServiceError::NotFound(id.to_string()))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Author, AuthorServiceError> {
        self.repo
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| AuthorServiceError::NotFound(slug.to_string()))
    }

    /// All authors, most prolific first
    pub async fn list(&self) -> Result<Vec<Author>, AuthorServiceError> {
        Ok(self.repo.list().await?)
    }

    /// Featured authors, most prolific first
    pub async fn featured(&self, limit: i64) -> Result<Vec<Author>, AuthorServiceError> {
        let cache_key = format!("{}{}", CACHE_KEY_AUTHOR_FEATURED, limit);
        if let Some(authors) = self.cache.get::<Vec<Author>>(&cache_key).await.ok().flatten() {
            return Ok(authors);
        }

        let authors = self.repo.list_featured(limit.max(1)).await?;
        let _ = self.cache.set(&cache_key, &authors, self.cache_ttl).await;
        Ok(authors)
    }

    /// Delete an author that no article references
    ///
    /// # Errors
    /// - `Protected` while any article, draft or live, references the author
    pub async fn delete(&self, id: i64) -> Result<(), AuthorServiceError> {
        self.get_by_id(id).await?;

        let referenced = self.repo.count_all_articles(id).await?;
        if referenced > 0 {
            return Err(AuthorServiceError::Protected(id, referenced));
        }

        self.repo.delete(id).await?;
        self.invalidate().await;
        Ok(())
    }

    /// Count the author's live articles and store the result. Idempotent.
    pub async fn recompute_article_count(&self, id: i64) -> Result<i64, AuthorServiceError> {
        self.get_by_id(id).await?;
        let count = self.repo.count_live_articles(id).await?;
        self.repo.set_article_count(id, count).await?;
        self.invalidate().await;
        Ok(count)
    }

    /// Sum the view counts of the author's live articles and store the result
    pub async fn recompute_total_views(&self, id: i64) -> Result<i64, AuthorServiceError> {
        self.get_by_id(id).await?;
        let total = self.repo.sum_live_views(id).await?;
        self.repo.set_total_views(id, total).await?;
        self.invalidate().await;
        Ok(total)
    }

    /// Recompute both aggregates for every author
    pub async fn recompute_all(&self) -> Result<usize, AuthorServiceError> {
        let authors = self.repo.list().await?;
        for author in &authors {
            let count = self.repo.count_live_articles(author.id).await?;
            self.repo.set_article_count(author.id, count).await?;
            let total = self.repo.sum_live_views(author.id).await?;
            self.repo.set_total_views(author.id, total).await?;
        }
        self.invalidate().await;
        Ok(authors.len())
    }

    /// Live articles by the author, newest first
    pub async fn recent_articles(&self, id: i64, limit: i64) -> Result<Vec<Article>, AuthorServiceError> {
        let query = ArticleQuery {
            author_id: Some(id),
            ..ArticleQuery::live()
        };
        Ok(self
            .article_repo
            .list(&query, ArticleOrder::Newest, limit.max(1), 0)
            .await?)
    }

    /// Author page payload: the author plus recent live articles
    pub async fn profile(&self, slug: &str, limit: i64) -> Result<AuthorProfile, AuthorServiceError> {
        let cache_key = format!("{}{}:{}", CACHE_KEY_AUTHOR_PROFILE, slug, limit);
        if let Some(profile) = self.cache.get::<AuthorProfile>(&cache_key).await.ok().flatten() {
            return Ok(profile);
        }

        let author = self.get_by_slug(slug).await?;
        let recent_articles = self.recent_articles(author.id, limit).await?;
        let profile = AuthorProfile {
            author,
            recent_articles,
        };

        let _ = self.cache.set(&cache_key, &profile, self.cache_ttl).await;
        Ok(profile)
    }

    /// Drop cached author read models
    pub async fn invalidate(&self) {
        let _ = self.cache.delete_pattern(CACHE_PATTERN_AUTHOR).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_test_cache;
    use crate::db::repositories::{SqlxArticleRepository, SqlxAuthorRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{SYSTEM_ACCOUNT_REF, SYSTEM_AUTHOR_SLUG};

    async fn setup_test_service() -> (DynDatabasePool, AuthorService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let service = AuthorService::new(
            SqlxAuthorRepository::boxed(pool.clone()),
            SqlxArticleRepository::boxed(pool.clone()),
            create_test_cache(),
        );
        (pool, service)
    }

    async fn insert_article(pool: &DynDatabasePool, author_id: i64, slug: &str, live: bool, views: i64) {
        sqlx::query(
            r#"
            INSERT INTO articles (title, slug, intro, author_id, state, view_count, first_published_at, created_at, updated_at)
            VALUES (?, ?, 'intro', ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(slug)
        .bind(slug)
        .bind(author_id)
        .bind(if live { "live" } else { "draft" })
        .bind(views)
        .bind(if live { Some(Utc::now()) } else { None })
        .bind(Utc::now())
        .bind(Utc::now())
        .execute(pool.sqlite())
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_init_system_author_is_idempotent() {
        let (_pool, service) = setup_test_service().await;
        let first = service.init_system_author().await.unwrap();
        let second = service.init_system_author().await.unwrap();
        assert_eq!(first, second);

        let author = service.get_by_slug(SYSTEM_AUTHOR_SLUG).await.unwrap();
        assert_eq!(author.account_ref, SYSTEM_ACCOUNT_REF);
        assert_eq!(author.name, "Vishwavani News");
        assert!(author.is_system());
    }

    #[tokio::test]
    async fn test_create_author() {
        let (_pool, service) = setup_test_service().await;
        let author = service
            .create(CreateAuthorInput::new("acc-42", "Asha Rao"))
            .await
            .unwrap();
        assert_eq!(author.slug, "asha-rao");

        let err = service
            .create(CreateAuthorInput::new("acc-42", "Someone Else"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorServiceError::DuplicateAccount(_)));

        let err = service
            .create(CreateAuthorInput::new("acc-43", "Asha Rao"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorServiceError::DuplicateSlug(_)));
    }

    #[tokio::test]
    async fn test_recompute_counts_live_only() {
        let (pool, service) = setup_test_service().await;
        let author = service
            .create(CreateAuthorInput::new("acc-1", "Asha"))
            .await
            .unwrap();
        insert_article(&pool, author.id, "one", true, 10).await;
        insert_article(&pool, author.id, "two", true, 20).await;
        insert_article(&pool, author.id, "three", true, 5).await;
        insert_article(&pool, author.id, "draft", false, 100).await;

        assert_eq!(service.recompute_article_count(author.id).await.unwrap(), 3);
        assert_eq!(service.recompute_article_count(author.id).await.unwrap(), 3);
        assert_eq!(service.recompute_total_views(author.id).await.unwrap(), 35);

        let stored = service.get_by_id(author.id).await.unwrap();
        assert_eq!(stored.article_count, 3);
        assert_eq!(stored.total_views, 35);
    }

    #[tokio::test]
    async fn test_delete_is_protected_while_referenced() {
        let (pool, service) = setup_test_service().await;
        let author = service
            .create(CreateAuthorInput::new("acc-1", "Asha"))
            .await
            .unwrap();
        insert_article(&pool, author.id, "draft", false, 0).await;

        assert!(matches!(
            service.delete(author.id).await,
            Err(AuthorServiceError::Protected(_, 1))
        ));

        let free = service
            .create(CreateAuthorInput::new("acc-2", "Bhavana"))
            .await
            .unwrap();
        service.delete(free.id).await.unwrap();
        assert!(matches!(
            service.get_by_id(free.id).await,
            Err(AuthorServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_profile_lists_recent_live_articles() {
        let (pool, service) = setup_test_service().await;
        let author = service
            .create(CreateAuthorInput::new("acc-1", "Asha"))
            .await
            .unwrap();
        insert_article(&pool, author.id, "live-one", true, 0).await;
        insert_article(&pool, author.id, "hidden", false, 0).await;

        let profile = service.profile("asha", 5).await.unwrap();
        assert_eq!(profile.author.id, author.id);
        assert_eq!(profile.recent_articles.len(), 1);
        assert_eq!(profile.recent_articles[0].slug, "live-one");

        assert!(matches!(
            service.profile("nobody", 5).await,
            Err(AuthorServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_featured_authors() {
        let (_pool, service) = setup_test_service().await;
        let mut input = CreateAuthorInput::new("acc-1", "Asha");
        input.is_featured = true;
        service.create(input).await.unwrap();
        service.create(CreateAuthorInput::new("acc-2", "Bhavana")).await.unwrap();

        let featured = service.featured(5).await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].name, "Asha");
    }
}
