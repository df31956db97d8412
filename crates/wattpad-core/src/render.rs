// HTML story text to `RenderedPage`.
//
// Part text arrives as an HTML fragment whose paragraphs carry a
// `data-p-id` attribute. Each paragraph becomes zero or more image blocks
// followed by at most one text block of styled words.

use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{debug, warn};

use crate::error::{Result, WattpadError};
use crate::models::{HtmlContent, HtmlStyle, HtmlWord, RenderedPage};

const PARAGRAPH_SELECTOR: &str = "p[data-p-id]";
const IMAGE_SELECTOR: &str = "img[src]";

/// Render a part's HTML. Relative image sources resolve against `base`,
/// normally the URL the HTML was fetched from.
pub fn render_html(html: &str, title: &str, base: &Url) -> Result<RenderedPage> {
    let paragraphs = selector(PARAGRAPH_SELECTOR)?;
    let images = selector(IMAGE_SELECTOR)?;

    let document = Html::parse_document(html);
    let mut content = Vec::new();

    for p in document.select(&paragraphs) {
        let mut had_image = false;
        for img in p.select(&images) {
            had_image = true;
            let Some(src) = img.value().attr("src").map(str::trim).filter(|s| !s.is_empty()) else {
                continue;
            };
            match base.join(src) {
                Ok(url) => content.push(HtmlContent::Image(url.into())),
                Err(e) => warn!(src, "skipping image with unresolvable source: {e}"),
            }
        }

        if had_image && p.text().all(|t| t.trim().is_empty()) {
            continue;
        }

        let mut words = Vec::new();
        collect_words(p, HtmlStyle::General, &mut words);
        if !words.is_empty() {
            content.push(HtmlContent::Text(words));
        }
    }

    debug!(title, blocks = content.len(), "rendered part");
    Ok(RenderedPage {
        title: title.to_string(),
        content,
    })
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| WattpadError::parse("selector", e.to_string()))
}

/// Style an element imposes on its descendants, if any.
fn element_style(tag: &str) -> Option<HtmlStyle> {
    match tag {
        "b" | "strong" => Some(HtmlStyle::Bold),
        "i" | "em" => Some(HtmlStyle::Italic),
        _ => None,
    }
}

/// Walk `el`'s subtree in document order. The innermost styling element
/// wins; unstyled elements inherit the style around them.
fn collect_words(el: ElementRef<'_>, style: HtmlStyle, words: &mut Vec<HtmlWord>) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_tokens(text, style, words),
            Node::Element(element) => {
                let inner = element_style(element.name()).unwrap_or(style);
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_words(child_el, inner, words);
                }
            }
            _ => {}
        }
    }
}

/// Split text into words and single-space separators. Whitespace runs
/// collapse to one space first, so `"a \n b"` yields `["a", " ", "b"]`.
fn push_tokens(text: &str, style: HtmlStyle, words: &mut Vec<HtmlWord>) {
    let mut word = String::new();
    let mut in_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            if !word.is_empty() {
                words.push(HtmlWord::new(std::mem::take(&mut word), style));
            }
            if !in_space {
                words.push(HtmlWord::new(" ", style));
                in_space = true;
            }
        } else {
            in_space = false;
            word.push(ch);
        }
    }

    if !word.is_empty() {
        words.push(HtmlWord::new(word, style));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
