//! Content extraction module
//!
//! This module handles:
//! - Locating a page's main content region
//! - Stripping page chrome (scripts, menus, cookie banners, edit links)
//! - Converting the remaining HTML to markdown

mod markdown;
mod strategies;

pub use markdown::{MarkdownConverter, MAX_NESTING};
pub use strategies::{
    default_content_strategies, is_stripped, locate_content, strip_selectors, ContentStrategy,
    SelectorContentStrategy, BUILTIN_CONTENT_SELECTORS, BUILTIN_STRIP_SELECTORS,
};

use crate::config::SelectorConfig;
use crate::ConfigError;
use scraper::{Html, Selector};
use std::fmt;
use url::Url;

/// How completely a page could be converted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionKind {
    /// Everything in the content region was converted
    Full,
    /// Some content (embeds, widgets, deep nesting) was dropped or approximated
    Partial,
    /// Nothing usable was found; the markdown is a placeholder note
    Empty,
}

impl ExtractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::Empty => "empty",
        }
    }
}

impl fmt::Display for ExtractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Extracted content of one page, keyed by the page's URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub url: String,
    pub markdown: String,
    pub extraction_kind: ExtractionKind,
}

impl PageContent {
    /// Placeholder content for a page that could not be fetched
    pub fn unavailable(url: &str, reason: &str) -> Self {
        Self {
            url: url.to_string(),
            markdown: unavailable_note(url, reason),
            extraction_kind: ExtractionKind::Empty,
        }
    }
}

/// Where the page sits in the navigation tree
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Navigation title, emitted by the assembler as the page heading
    pub title: &'a str,

    /// Navigation depth, used to shift content headings
    pub depth: usize,
}

/// Note used in place of content that could not be extracted
pub fn empty_note(url: &str) -> String {
    format!("> **Note:** No content could be extracted from <{}>.", url)
}

/// Note used in place of a page that could not be fetched
pub fn unavailable_note(url: &str, reason: &str) -> String {
    format!(
        "> **Note:** Content unavailable for <{}> ({}).",
        url, reason
    )
}

/// Turns fetched page HTML into markdown
#[derive(Debug)]
pub struct Extractor {
    strategies: Vec<Box<dyn ContentStrategy>>,
    strip: Vec<Selector>,
}

impl Extractor {
    pub fn new(selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            strategies: default_content_strategies(&selectors.content)?,
            strip: strip_selectors(&selectors.strip)?,
        })
    }

    /// Extracts the main content of a page
    ///
    /// Never fails: a page without a content region, or whose region converts
    /// to nothing, yields [`ExtractionKind::Empty`] with a placeholder note.
    pub fn extract(&self, html: &str, page_url: &Url, context: PageContext<'_>) -> PageContent {
        let document = Html::parse_document(html);

        let Some((container, _)) = locate_content(&document, &self.strategies) else {
            tracing::debug!("No content container found on {}", page_url);
            return self.empty(page_url);
        };

        let mut converter = MarkdownConverter::new(page_url, context.depth + 1, &self.strip);
        let markdown = converter.convert(container);
        let markdown = drop_title_heading(&markdown, context.title);

        if markdown.trim().is_empty() {
            tracing::debug!("Content of {} converted to nothing", page_url);
            return self.empty(page_url);
        }

        let extraction_kind = if converter.is_partial() {
            ExtractionKind::Partial
        } else {
            ExtractionKind::Full
        };

        PageContent {
            url: page_url.to_string(),
            markdown,
            extraction_kind,
        }
    }

    fn empty(&self, page_url: &Url) -> PageContent {
        PageContent {
            url: page_url.to_string(),
            markdown: empty_note(page_url.as_str()),
            extraction_kind: ExtractionKind::Empty,
        }
    }
}

/// Removes a leading heading that repeats the page title
fn drop_title_heading(markdown: &str, title: &str) -> String {
    let mut lines = markdown.lines();
    let Some(first) = lines.next() else {
        return String::new();
    };

    let is_heading = first.starts_with('#');
    let text = first.trim_start_matches('#').trim();
    if !is_heading || !text.eq_ignore_ascii_case(title.trim()) {
        return markdown.to_string();
    }

    lines
        .skip_while(|line| line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> Extractor {
        Extractor::new(&SelectorConfig::default()).unwrap()
    }

    fn page_url() -> Url {
        Url::parse("https://docs.example.com/guide/install").unwrap()
    }

    fn context(title: &str, depth: usize) -> PageContext<'_> {
        PageContext { title, depth }
    }

    #[test]
    fn test_full_extraction() {
        let html = r#"
            <html><body>
            <nav><a href="/x">Menu</a></nav>
            <main><h1>Install</h1><p>Run the installer.</p><h2>Options</h2><p>Flags.</p></main>
            </body></html>
        "#;
        let content = extractor().extract(html, &page_url(), context("Install", 0));

        assert_eq!(content.extraction_kind, ExtractionKind::Full);
        assert_eq!(content.url, "https://docs.example.com/guide/install");
        assert_eq!(content.markdown, "Run the installer.\n\n### Options\n\nFlags.");
    }

    #[test]
    fn test_heading_shift_follows_depth() {
        let html = "<main><h2>Part</h2><p>x</p></main>";
        let content = extractor().extract(html, &page_url(), context("Other", 2));
        assert!(content.markdown.starts_with("##### Part"));
    }

    #[test]
    fn test_title_heading_kept_when_different() {
        let html = "<main><h1>Something else</h1><p>x</p></main>";
        let content = extractor().extract(html, &page_url(), context("Install", 0));
        assert!(content.markdown.starts_with("## Something else"));
    }

    #[test]
    fn test_no_container_is_empty() {
        let html = "<html><body><p>loose text</p></body></html>";
        let content = extractor().extract(html, &page_url(), context("Install", 0));

        assert_eq!(content.extraction_kind, ExtractionKind::Empty);
        assert!(content.markdown.contains("No content could be extracted"));
    }

    #[test]
    fn test_only_chrome_is_empty() {
        let html = "<main><script>x()</script><button>Copy</button></main>";
        let content = extractor().extract(html, &page_url(), context("Install", 0));
        assert_eq!(content.extraction_kind, ExtractionKind::Empty);
    }

    #[test]
    fn test_only_title_heading_is_empty() {
        let html = "<main><h1>Install</h1></main>";
        let content = extractor().extract(html, &page_url(), context("Install", 0));
        assert_eq!(content.extraction_kind, ExtractionKind::Empty);
    }

    #[test]
    fn test_embed_is_partial() {
        let html = r#"<main><p>Demo</p><video src="/demo.mp4"></video></main>"#;
        let content = extractor().extract(html, &page_url(), context("Install", 0));
        assert_eq!(content.extraction_kind, ExtractionKind::Partial);
        assert!(content.markdown.contains("https://docs.example.com/demo.mp4"));
    }

    #[test]
    fn test_custom_strip_selector() {
        let selectors = SelectorConfig {
            strip: vec!["div.feedback".to_string()],
            ..SelectorConfig::default()
        };
        let html = r#"<main><p>Body</p><div class="feedback">Was this helpful?</div></main>"#;
        let content = Extractor::new(&selectors)
            .unwrap()
            .extract(html, &page_url(), context("Install", 0));
        assert_eq!(content.markdown, "Body");
    }

    #[test]
    fn test_drop_title_heading() {
        assert_eq!(drop_title_heading("## Intro\n\nText", "intro"), "Text");
        assert_eq!(drop_title_heading("Intro\n\nText", "Intro"), "Intro\n\nText");
        assert_eq!(drop_title_heading("", "Intro"), "");
    }

    #[test]
    fn test_unavailable_placeholder() {
        let content = PageContent::unavailable("https://d.example/a", "HTTP 404");
        assert_eq!(content.extraction_kind, ExtractionKind::Empty);
        assert!(content.markdown.contains("Content unavailable"));
        assert!(content.markdown.contains("HTTP 404"));
    }
}
