// Rendered part text: an ordered stack of text and image blocks.

use serde::{Deserialize, Serialize};

/// Inline styling of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HtmlStyle {
    #[default]
    General,
    Bold,
    Italic,
}

/// A word or a single whitespace character with its style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlWord {
    pub data: String,
    pub style: HtmlStyle,
}

impl HtmlWord {
    pub fn new(data: impl Into<String>, style: HtmlStyle) -> Self {
        HtmlWord {
            data: data.into(),
            style,
        }
    }
}

/// One paragraph-level block of a part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HtmlContent {
    Text(Vec<HtmlWord>),
    /// Absolute image URL.
    Image(String),
}

impl HtmlContent {
    /// Plain text of the block; images become `[Image: <url>]`.
    pub fn sanitized_text(&self) -> String {
        match self {
            HtmlContent::Text(words) => words.iter().map(|w| w.data.as_str()).collect(),
            HtmlContent::Image(url) => format!("[Image: {url}]"),
        }
    }

    pub fn words(&self) -> Option<&[HtmlWord]> {
        match self {
            HtmlContent::Text(words) => Some(words),
            HtmlContent::Image(_) => None,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            HtmlContent::Image(url) => Some(url),
            HtmlContent::Text(_) => None,
        }
    }
}

impl std::fmt::Display for HtmlContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.sanitized_text())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPage {
    pub title: String,
    pub content: Vec<HtmlContent>,
}

impl RenderedPage {
    /// Whole part as plain text, blocks separated by a blank line.
    pub fn full_text(&self) -> String {
        self.content
            .iter()
            .map(HtmlContent::sanitized_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
