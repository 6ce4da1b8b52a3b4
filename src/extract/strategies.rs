use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// Main-content containers probed after any user-supplied selectors
pub const BUILTIN_CONTENT_SELECTORS: &[&str] = &[
    "main article",
    "main",
    "article",
    r#"[role="main"]"#,
    "div.page-inner",
    r#"div[class*="page-inner"]"#,
    "div.markdown-section",
    r#"div[class*="content"]"#,
];

/// Page chrome removed from the content container before conversion
pub const BUILTIN_STRIP_SELECTORS: &[&str] = &[
    "script",
    "style",
    "nav",
    "noscript",
    "template",
    "form",
    "button",
    r#"[class*="cookie"]"#,
    r#"[id*="cookie"]"#,
    r#"[class*="edit-page"]"#,
    r#"[class*="edit-link"]"#,
    r#"a[href*="/edit/"]"#,
];

/// A way of locating the main content of a page
pub trait ContentStrategy: Send + Sync + fmt::Debug {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Candidate containers, most likely first
    fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;
}

/// Locates content containers with a CSS selector
#[derive(Debug, Clone)]
pub struct SelectorContentStrategy {
    css: String,
    selector: Selector,
}

impl SelectorContentStrategy {
    pub fn new(css: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            css: css.to_string(),
            selector: parse_selector(css)?,
        })
    }
}

impl ContentStrategy for SelectorContentStrategy {
    fn name(&self) -> &str {
        &self.css
    }

    fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selector).collect()
    }
}

/// Builds the strategy list: custom selectors first, then the built-ins
pub fn default_content_strategies(
    custom: &[String],
) -> Result<Vec<Box<dyn ContentStrategy>>, ConfigError> {
    custom
        .iter()
        .map(String::as_str)
        .chain(BUILTIN_CONTENT_SELECTORS.iter().copied())
        .map(|css| {
            SelectorContentStrategy::new(css).map(|s| Box::new(s) as Box<dyn ContentStrategy>)
        })
        .collect()
}

/// Builds the strip list: the built-ins plus any user-supplied selectors
pub fn strip_selectors(custom: &[String]) -> Result<Vec<Selector>, ConfigError> {
    BUILTIN_STRIP_SELECTORS
        .iter()
        .copied()
        .chain(custom.iter().map(String::as_str))
        .map(parse_selector)
        .collect()
}

/// Finds the first container with visible content
///
/// Returns the container together with the name of the strategy that found it.
pub fn locate_content<'a, 's>(
    document: &'a Html,
    strategies: &'s [Box<dyn ContentStrategy>],
) -> Option<(ElementRef<'a>, &'s str)> {
    for strategy in strategies {
        for container in strategy.containers(document) {
            if has_visible_content(container) {
                tracing::debug!("Found content using selector: {}", strategy.name());
                return Some((container, strategy.name()));
            }
        }
    }
    None
}

/// Returns true if `element` is page chrome matched by a strip selector
pub fn is_stripped(element: &ElementRef<'_>, strip: &[Selector]) -> bool {
    strip.iter().any(|selector| selector.matches(element))
}

fn has_visible_content(element: ElementRef<'_>) -> bool {
    element.text().any(|text| !text.trim().is_empty())
        || element
            .descendants()
            .filter_map(ElementRef::wrap)
            .any(|e| e.value().name() == "img")
}

fn parse_selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}
