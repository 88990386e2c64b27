//! Article body blocks
//!
//! A body is an ordered list of tagged `ContentBlock`s stored as JSON. Each
//! variant renders to escaped HTML by explicit dispatch on its tag.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Reading speed used for `read_time`
pub const WORDS_PER_MINUTE: usize = 200;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// One block of article body content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    /// Rich text paragraph, already HTML
    Paragraph { html: String },
    /// Image by opaque asset reference
    Image {
        asset_ref: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Quote {
        quote: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attribution: Option<String>,
    },
    /// External embed (video, social post)
    Embed { url: String },
}

impl ContentBlock {
    pub fn paragraph(html: impl Into<String>) -> Self {
        ContentBlock::Paragraph { html: html.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Paragraph { .. } => "paragraph",
            ContentBlock::Image { .. } => "image",
            ContentBlock::Quote { .. } => "quote",
            ContentBlock::Embed { .. } => "embed",
        }
    }

    /// Words counted towards reading time
    pub fn word_count(&self) -> usize {
        match self {
            ContentBlock::Paragraph { html } => count_words(&strip_tags(html)),
            ContentBlock::Quote { quote, attribution } => {
                count_words(quote) + attribution.as_deref().map(count_words).unwrap_or(0)
            }
            ContentBlock::Image { .. } | ContentBlock::Embed { .. } => 0,
        }
    }

    fn plain_text(&self) -> Option<String> {
        let text = match self {
            ContentBlock::Paragraph { html } => collapse_whitespace(&strip_tags(html)),
            ContentBlock::Quote { quote, attribution } => match attribution {
                Some(attribution) => format!("{} {}", quote, attribution),
                None => quote.clone(),
            },
            ContentBlock::Image { caption, .. } => caption.clone().unwrap_or_default(),
            ContentBlock::Embed { .. } => String::new(),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    /// Render this block to HTML.
    ///
    /// Paragraph HTML is trusted editor output; every other field is escaped.
    pub fn render_html(&self) -> String {
        match self {
            ContentBlock::Paragraph { html } => format!("<div class=\"block-paragraph\">{}</div>", html),
            ContentBlock::Image { asset_ref, caption } => {
                let src = html_escape::encode_double_quoted_attribute(asset_ref);
                match caption.as_deref().filter(|c| !c.trim().is_empty()) {
                    Some(caption) => format!(
                        "<figure class=\"block-image\"><img src=\"{}\" alt=\"{}\"><figcaption>{}</figcaption></figure>",
                        src,
                        html_escape::encode_double_quoted_attribute(caption),
                        html_escape::encode_text(caption)
                    ),
                    None => format!("<figure class=\"block-image\"><img src=\"{}\" alt=\"\"></figure>", src),
                }
            }
            ContentBlock::Quote { quote, attribution } => {
                let cite = attribution
                    .as_deref()
                    .filter(|a| !a.trim().is_empty())
                    .map(|a| format!("<cite>{}</cite>", html_escape::encode_text(a)))
                    .unwrap_or_default();
                format!(
                    "<blockquote class=\"block-quote\"><p>{}</p>{}</blockquote>",
                    html_escape::encode_text(quote),
                    cite
                )
            }
            ContentBlock::Embed { url } => format!(
                "<div class=\"block-embed\"><a href=\"{}\">{}</a></div>",
                html_escape::encode_double_quoted_attribute(url),
                html_escape::encode_text(url)
            ),
        }
    }
}

/// An ordered article body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Body(pub Vec<ContentBlock>);

impl Body {
    pub fn new(blocks: Vec<ContentBlock>) -> Self {
        Self(blocks)
    }

    /// Decode a stored body. Malformed JSON yields an empty body.
    pub fn from_column(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!("Discarding malformed article body: {}", e);
            Self::default()
        })
    }

    pub fn to_column(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn word_count(&self) -> usize {
        self.0.iter().map(ContentBlock::word_count).sum()
    }

    /// Minutes to read, `max(1, round(words / 200))`
    pub fn read_time(&self) -> i64 {
        read_time_for(self.word_count())
    }

    /// Searchable text of the body with markup removed
    pub fn plain_text(&self) -> String {
        self.0
            .iter()
            .filter_map(ContentBlock::plain_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn render_html(&self) -> String {
        self.0
            .iter()
            .map(ContentBlock::render_html)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Reading time in whole minutes for a word count
pub fn read_time_for(words: usize) -> i64 {
    let minutes = (words as f64 / WORDS_PER_MINUTE as f64).round_ties_even() as i64;
    minutes.max(1)
}

fn strip_tags(html: &str) -> String {
    TAG_RE.replace_all(html, " ").into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}
