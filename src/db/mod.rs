//! Database layer
//!
//! SQLite storage for the news core: a shared pool behind the `DatabasePool`
//! trait, embedded migrations, and one repository per entity.
//!
//! # Usage
//!
//! ```ignore
//! use vishwavani::config::DatabaseConfig;
//! use vishwavani::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool, SqliteDatabase};
