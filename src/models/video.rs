//! Video model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{PublishState, SeoFields};

/// Video entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub video_type: VideoType,
    /// Provider page URL, e.g. a YouTube watch link
    pub source_url: String,
    /// Length in seconds
    pub duration: Option<i64>,
    pub description: String,
    pub transcript: String,
    /// Opaque asset reference
    pub thumbnail: Option<String>,
    pub category_ids: Vec<i64>,
    pub topic_ids: Vec<i64>,
    pub view_count: i64,
    pub is_featured: bool,
    pub is_trending: bool,
    pub state: PublishState,
    pub first_published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub seo: SeoFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    pub fn provider_id(&self) -> Option<String> {
        youtube_id(&self.source_url)
    }

    pub fn embed_url(&self) -> Option<String> {
        self.provider_id().map(|id| embed_url_for(&id))
    }

    pub fn formatted_duration(&self) -> Option<String> {
        self.duration.filter(|d| *d > 0).map(format_duration)
    }
}

/// Full-length video or vertical short
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    #[default]
    Full,
    Short,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::Full => "full",
            VideoType::Short => "short",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "full" => Some(VideoType::Full),
            "short" => Some(VideoType::Short),
            _ => None,
        }
    }
}

/// Video with derived playback fields, as served to readers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoView {
    #[serde(flatten)]
    pub video: Video,
    pub provider_id: Option<String>,
    pub embed_url: Option<String>,
    pub formatted_duration: Option<String>,
}

impl From<Video> for VideoView {
    fn from(video: Video) -> Self {
        Self {
            provider_id: video.provider_id(),
            embed_url: video.embed_url(),
            formatted_duration: video.formatted_duration(),
            video,
        }
    }
}

/// Video landing page sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoIndex {
    pub full_videos: Vec<VideoView>,
    pub shorts: Vec<VideoView>,
}

/// Input for creating a new video
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateVideoInput {
    pub title: String,
    pub slug: Option<String>,
    pub video_type: VideoType,
    pub source_url: String,
    pub duration: Option<i64>,
    pub description: String,
    pub transcript: String,
    pub thumbnail: Option<String>,
    pub category_ids: Vec<i64>,
    pub topic_ids: Vec<i64>,
    pub is_featured: bool,
    pub is_trending: bool,
    pub seo: SeoFields,
}

impl CreateVideoInput {
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    pub fn short(mut self) -> Self {
        self.video_type = VideoType::Short;
        self
    }
}

/// Extract the YouTube video id from a watch, short link, embed or shorts URL
pub fn youtube_id(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    let host = url.host_str()?;

    let id = match host {
        "youtu.be" => url.path_segments()?.next().map(str::to_string),
        "youtube.com" | "www.youtube.com" | "m.youtube.com" => {
            let mut segments = url.path_segments()?;
            match segments.next() {
                Some("watch") => url
                    .query_pairs()
                    .find(|(key, _)| key == "v")
                    .map(|(_, value)| value.into_owned()),
                Some("embed") | Some("shorts") => segments.next().map(str::to_string),
                _ => None,
            }
        }
        _ => None,
    };

    id.filter(|id| !id.is_empty())
}

pub fn embed_url_for(provider_id: &str) -> String {
    format!("https://www.youtube.com/embed/{}", provider_id)
}

/// `H:MM:SS` when the duration spans an hour, otherwise `M:SS`
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_id_forms() {
        assert_eq!(youtube_id("https://youtu.be/dQw4w9WgXcQ").as_deref(), Some("dQw4w9WgXcQ"));
        assert_eq!(
            youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(youtube_id("https://youtube.com/embed/abc123").as_deref(), Some("abc123"));
        assert_eq!(youtube_id("https://www.youtube.com/shorts/xyz").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_youtube_id_rejects_other_urls() {
        assert_eq!(youtube_id("https://vimeo.com/12345"), None);
        assert_eq!(youtube_id("https://www.youtube.com/watch"), None);
        assert_eq!(youtube_id("https://www.youtube.com/channel/abc"), None);
        assert_eq!(youtube_id("not a url"), None);
        assert_eq!(youtube_id("https://youtu.be/"), None);
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(embed_url_for("abc"), "https://www.youtube.com/embed/abc");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(125), "2:05");
        assert_eq!(format_duration(3600), "1:00:00");
        assert_eq!(format_duration(3725), "1:02:05");
    }
}
