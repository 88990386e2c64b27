//! Data models
//!
//! Plain data structures shared by the repositories, services and the HTTP
//! layer: taxonomy (categories, topics), authorship, articles with their
//! content blocks, and videos.

mod article;
mod author;
mod category;
mod content;
mod seo;
mod topic;
mod video;

pub use article::{
    Article, CreateArticleInput, ListParams, PagedResult, PublishState, UpdateArticleInput,
    DEFAULT_PAGE_SIZE,
};
pub use author::{
    Author, CreateAuthorInput, SocialLinks, SYSTEM_ACCOUNT_REF, SYSTEM_AUTHOR_DESIGNATION,
    SYSTEM_AUTHOR_NAME, SYSTEM_AUTHOR_SLUG,
};
pub use category::{
    Category, CategoryArena, CategoryLayout, CategoryTree, CategoryWithCount, CreateCategoryInput,
    HierarchyError, UpdateCategoryInput, HIERARCHY_SEPARATOR,
};
pub use content::{read_time_for, Body, ContentBlock, WORDS_PER_MINUTE};
pub use seo::SeoFields;
pub use topic::{CreateTopicInput, Topic, TopicDetail, UpdateTopicInput};
pub use video::{
    embed_url_for, format_duration, youtube_id, CreateVideoInput, Video, VideoIndex, VideoType,
    VideoView,
};
