//! Services layer - Business logic
//!
//! This module contains the business logic of the news core.
//! Services are responsible for:
//! - Implementing business rules (slugs, hierarchy, publish state)
//! - Coordinating between repositories and cache
//! - Ranking and aggregating live content
//! - Handling validation and error cases

pub mod article;
pub mod author;
pub mod category;
pub mod ranking;
pub mod search;
pub mod topic;
pub mod video;

pub use article::{generate_slug, ArticleService, ArticleServiceError};
pub use author::{ensure_system_author, AuthorProfile, AuthorService, AuthorServiceError};
pub use category::{CategoryDetail, CategoryService, CategoryServiceError};
pub use ranking::{
    time_since, ArchiveFilter, DateWindow, LatestFilter, RankingService, RankingServiceError,
    RefreshReport, SearchResults,
};
pub use search::{SearchIndex, SqlSearchIndex};
pub use topic::{TopicService, TopicServiceError};
pub use video::{VideoService, VideoServiceError};
