//! Cache layer
//!
//! Read-model caching for the query surface. Services use cache-aside reads
//! and invalidate key patterns on every mutation. Drivers:
//! - In-memory cache (moka), the default
//! - Disabled, where every read goes to the database
//!
//! # Usage
//!
//! ```rust,ignore
//! use vishwavani::cache::{create_cache, CacheLayer};
//! use vishwavani::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default())?;
//! cache.set("key", &"value", Duration::from_secs(60)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CacheConfig, CacheDriver};

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Generic methods keep this trait from being object safe; use the `Cache`
/// enum for runtime polymorphism.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Unified cache enum for runtime polymorphism
#[derive(Debug)]
pub enum Cache {
    /// In-memory cache using moka
    Memory(MemoryCache),
    /// No-op cache: reads always miss
    Disabled,
}

impl Cache {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Cache::Disabled)
    }
}

#[async_trait]
impl CacheLayer for Cache {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self {
            Cache::Memory(cache) => cache.get(key).await,
            Cache::Disabled => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.set(key, value, ttl).await,
            Cache::Disabled => Ok(()),
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete(key).await,
            Cache::Disabled => Ok(()),
        }
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.delete_pattern(pattern).await,
            Cache::Disabled => Ok(()),
        }
    }

    async fn clear(&self) -> Result<()> {
        match self {
            Cache::Memory(cache) => cache.clear().await,
            Cache::Disabled => Ok(()),
        }
    }
}

/// Create a cache instance based on configuration
pub fn create_cache(config: &CacheConfig) -> Result<Arc<Cache>> {
    let cache = match config.driver {
        CacheDriver::Memory => {
            let ttl = Duration::from_secs(config.ttl_seconds);
            tracing::debug!(
                "Using in-memory cache (capacity {}, ttl {:?})",
                config.capacity,
                ttl
            );
            Cache::Memory(MemoryCache::with_capacity_and_ttl(config.capacity, ttl))
        }
        CacheDriver::Disabled => {
            tracing::info!("Caching disabled");
            Cache::Disabled
        }
    };
    Ok(Arc::new(cache))
}

/// Create a memory cache for tests
pub fn create_test_cache() -> Arc<Cache> {
    Arc::new(Cache::Memory(MemoryCache::new()))
}
