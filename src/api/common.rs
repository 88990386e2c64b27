//! Common API utilities and shared query types

use serde::Deserialize;

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Page-only query, for the fixed-size browsing listings
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
}

/// `?limit=` for ranked strips
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

/// `?days=&limit=` for trending strips
#[derive(Debug, Default, Deserialize)]
pub struct TrendingQuery {
    pub days: Option<i64>,
    pub limit: Option<i64>,
}

/// Treat `?category=` and friends as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
