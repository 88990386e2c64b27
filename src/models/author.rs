//! Author model
//!
//! Authors are linked one-to-one to an external account through an opaque
//! `account_ref`. Their `article_count` and `total_views` are cached
//! aggregates refreshed by explicit recompute calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account reference of the built-in system author
pub const SYSTEM_ACCOUNT_REF: &str = "system";
/// Display name of the built-in system author
pub const SYSTEM_AUTHOR_NAME: &str = "Vishwavani News";
/// Slug of the built-in system author
pub const SYSTEM_AUTHOR_SLUG: &str = "vishwavani-news";
/// Designation of the built-in system author
pub const SYSTEM_AUTHOR_DESIGNATION: &str = "System Account";

/// Author entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Author {
    pub id: i64,
    /// Opaque reference to the owning account
    pub account_ref: String,
    pub name: String,
    pub slug: String,
    pub designation: String,
    pub bio: String,
    pub profile_image: Option<String>,
    pub is_featured: bool,
    #[serde(flatten)]
    pub social: SocialLinks,
    pub article_count: i64,
    pub total_views: i64,
    pub created_at: DateTime<Utc>,
}

impl Author {
    pub fn is_system(&self) -> bool {
        self.account_ref == SYSTEM_ACCOUNT_REF
    }
}

/// Social profile links; empty strings mean "not set"
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SocialLinks {
    pub facebook_url: String,
    pub twitter_url: String,
    pub instagram_url: String,
    pub youtube_url: String,
}

impl SocialLinks {
    /// Non-empty links as `(network, url)` pairs
    pub fn present(&self) -> Vec<(&'static str, &str)> {
        [
            ("facebook", self.facebook_url.as_str()),
            ("twitter", self.twitter_url.as_str()),
            ("instagram", self.instagram_url.as_str()),
            ("youtube", self.youtube_url.as_str()),
        ]
        .into_iter()
        .filter(|(_, url)| !url.trim().is_empty())
        .collect()
    }
}

/// Input for registering an author
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateAuthorInput {
    pub account_ref: String,
    pub name: String,
    /// Generated from the name when absent
    pub slug: Option<String>,
    pub designation: String,
    pub bio: String,
    pub profile_image: Option<String>,
    pub is_featured: bool,
    pub social: SocialLinks,
}

impl CreateAuthorInput {
    pub fn new(account_ref: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            account_ref: account_ref.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    pub(crate) fn system() -> Self {
        Self {
            account_ref: SYSTEM_ACCOUNT_REF.to_string(),
            name: SYSTEM_AUTHOR_NAME.to_string(),
            slug: Some(SYSTEM_AUTHOR_SLUG.to_string()),
            designation: SYSTEM_AUTHOR_DESIGNATION.to_string(),
            ..Self::default()
        }
    }
}
