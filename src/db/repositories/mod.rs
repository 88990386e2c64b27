//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the storage operations of one entity.

pub mod article;
pub mod author;
pub mod category;
pub mod topic;
pub mod video;

pub use article::{ArticleOrder, ArticleQuery, ArticleRepository, SqlxArticleRepository};
pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use category::{CategoryRepository, SqlxCategoryRepository};
pub use topic::{SqlxTopicRepository, TopicRepository};
pub use video::{SqlxVideoRepository, VideoRepository};
