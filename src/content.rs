//! Article page content extraction.
//!
//! Blog platforms differ wildly, so both title and body are found through a
//! fallback chain of selectors:
//!
//! | Field | Tried in order |
//! |-------|----------------|
//! | title | first `h1`, `<title>`, `meta[property="og:title"]` |
//! | body  | `<article>`, `<main>`, first `.content` / `.article` / `.entry-content` / `.post-content` |
//!
//! The body element is rendered to plain text: only visible text nodes are
//! kept, so link targets and images disappear, and every element that is
//! not inline phrasing (paragraphs, list items, table cells, ...) starts a
//! new line. Each line is trimmed, non-empty lines are joined with single
//! spaces, and the result is cut at `max_chars` characters.

use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::utils::truncate_chars;

static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static DOCUMENT_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static OG_TITLE: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).unwrap());

static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static MAIN: Lazy<Selector> = Lazy::new(|| Selector::parse("main").unwrap());
static CONTENT_CLASSES: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".content, .article, .entry-content, .post-content").unwrap()
});

/// Elements whose text is never visible.
const HIDDEN: [&str; 6] = ["script", "style", "noscript", "template", "svg", "iframe"];

/// Phrasing elements that flow with the surrounding text. Every other
/// element, table cells and navigation included, starts a new line.
const INLINE: [&str; 32] = [
    "a", "abbr", "b", "bdi", "bdo", "cite", "code", "data", "del", "dfn", "em", "font", "i",
    "img", "ins", "kbd", "label", "mark", "q", "rp", "rt", "ruby", "s", "samp", "small", "span",
    "strong", "sub", "sup", "time", "u", "var",
];

/// Extracts title and plain body text from article pages.
#[derive(Debug, Clone, Copy)]
pub struct ContentExtractor {
    max_chars: usize,
}

impl ContentExtractor {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Best-effort `(title, body_text)` for an article page.
    ///
    /// Either part is empty when nothing matched.
    pub fn extract(&self, markup: &str) -> (String, String) {
        let document = Html::parse_document(markup);

        let title = extract_title(&document);
        let body = match body_element(&document) {
            Some(element) => self.clean_text(&to_plain_text(element)),
            None => {
                debug!("No body element matched");
                String::new()
            }
        };
        (title, body)
    }

    /// Normalize whitespace and apply the hard character cut.
    pub fn clean_text(&self, text: &str) -> String {
        truncate_chars(&normalize_whitespace(text), self.max_chars).to_string()
    }
}

fn extract_title(document: &Html) -> String {
    let from_text = |selector: &Selector| {
        document
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>())
            .map(|text| text.split_whitespace().join(" "))
            .filter(|text| !text.is_empty())
    };

    from_text(&HEADING)
        .or_else(|| from_text(&DOCUMENT_TITLE))
        .or_else(|| {
            document
                .select(&OG_TITLE)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .map(|content| content.trim().to_string())
        })
        .unwrap_or_default()
}

fn body_element(document: &Html) -> Option<ElementRef<'_>> {
    [&*ARTICLE, &*MAIN, &*CONTENT_CLASSES]
        .into_iter()
        .find_map(|selector| document.select(selector).next())
}

fn to_plain_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    push_visible_text(element, &mut out);
    out
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if HIDDEN.contains(&el.name()) => {}
            Node::Element(el) => {
                let Some(child) = ElementRef::wrap(child) else {
                    continue;
                };
                let block = !INLINE.contains(&el.name());
                if block {
                    out.push('\n');
                }
                push_visible_text(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Trim every line and join the non-empty ones with single spaces.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join(" ")
}
