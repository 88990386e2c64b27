//! SEO and social-sharing metadata shared by every public entity.

use serde::{Deserialize, Serialize};

/// Search and social metadata overrides.
///
/// Stored as a JSON column; empty strings mean "use the entity's own title
/// or description".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoFields {
    pub meta_title: String,
    pub meta_description: String,
    pub og_title: String,
    pub og_description: String,
}

impl SeoFields {
    /// Decode the stored JSON column, falling back to empty metadata
    pub fn from_column(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!("Discarding malformed SEO metadata: {}", e);
            Self::default()
        })
    }

    /// Encode for storage
    pub fn to_column(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Title to use in `<title>`, falling back to the entity title
    pub fn title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.meta_title.trim().is_empty() {
            fallback
        } else {
            &self.meta_title
        }
    }

    /// Title for social cards, falling back through meta title to the entity title
    pub fn og_title_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        if self.og_title.trim().is_empty() {
            self.title_or(fallback)
        } else {
            &self.og_title
        }
    }
}
