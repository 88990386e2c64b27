//! Topic model
//!
//! Topics are flat tags with editorial flags and derived counters. Related
//! topics are symmetric and stored in both directions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SeoFields;

/// Topic entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Topic {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Opaque asset reference
    pub featured_image: Option<String>,
    pub is_featured: bool,
    pub is_trending: bool,
    pub view_count: i64,
    pub follower_count: i64,
    /// Cached, see `TopicService::recompute_article_count`
    pub article_count: i64,
    /// Whether articles under this topic appear in syndication feeds
    pub include_in_feed: bool,
    pub feed_description: String,
    #[serde(default)]
    pub seo: SeoFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Topic with its related topics attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicDetail {
    #[serde(flatten)]
    pub topic: Topic,
    pub related_topics: Vec<Topic>,
}

/// Input for creating a new topic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateTopicInput {
    pub name: String,
    /// Generated from the name when absent
    pub slug: Option<String>,
    pub description: String,
    pub featured_image: Option<String>,
    pub is_featured: bool,
    pub is_trending: bool,
    /// Defaults to true
    pub include_in_feed: Option<bool>,
    pub feed_description: String,
    pub seo: SeoFields,
}

impl CreateTopicInput {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Input for updating a topic
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTopicInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub featured_image: Option<Option<String>>,
    pub is_featured: Option<bool>,
    pub is_trending: Option<bool>,
    pub include_in_feed: Option<bool>,
    pub feed_description: Option<String>,
    pub seo: Option<SeoFields>,
}

impl UpdateTopicInput {
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.description.is_some()
            || self.featured_image.is_some()
            || self.is_featured.is_some()
            || self.is_trending.is_some()
            || self.include_in_feed.is_some()
            || self.feed_description.is_some()
            || self.seo.is_some()
    }
}
