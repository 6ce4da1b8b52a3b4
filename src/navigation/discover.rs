//! Navigation discovery from the seed page
//!
//! The sidebar is located with an ordered list of strategies and its nested
//! lists are turned into a [`NavNode`] tree. Parsing walks the DOM with an
//! explicit frame stack, so deeply nested sidebars cannot overflow the stack.

use crate::config::SelectorConfig;
use crate::crawler::{Fetcher, PacingGate};
use crate::extract::{default_content_strategies, locate_content, ContentStrategy};
use crate::navigation::NavNode;
use crate::url::{is_same_origin, is_under_prefix, normalize_url, resolve_link};
use crate::{ConfigError, ScraperError};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Navigation containers probed after any user-supplied selectors
pub const BUILTIN_NAV_SELECTORS: &[&str] = &[
    r#"aside [data-testid="table-of-contents"]"#,
    "nav",
    "aside",
    "div.sidebar",
    r#"div[class*="sidebar"]"#,
    r#"div[class*="nav"]"#,
];

/// A way of locating candidate navigation containers in a page
pub trait NavStrategy: Send + Sync + fmt::Debug {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Candidate containers, most likely first
    fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;
}

/// Locates navigation containers with a CSS selector
#[derive(Debug, Clone)]
pub struct SelectorNavStrategy {
    css: String,
    selector: Selector,
}

impl SelectorNavStrategy {
    pub fn new(css: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
            selector: css.to_string(),
            message: format!("{:?}", e),
        })?;
        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }
}

impl NavStrategy for SelectorNavStrategy {
    fn name(&self) -> &str {
        &self.css
    }

    fn containers<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&self.selector).collect()
    }
}

/// Builds the strategy list: custom selectors first, then the built-ins
pub fn default_nav_strategies(custom: &[String]) -> Result<Vec<Box<dyn NavStrategy>>, ConfigError> {
    custom
        .iter()
        .map(String::as_str)
        .chain(BUILTIN_NAV_SELECTORS.iter().copied())
        .map(|css| SelectorNavStrategy::new(css).map(|s| Box::new(s) as Box<dyn NavStrategy>))
        .collect()
}

/// Result of discovery
#[derive(Debug, Clone)]
pub struct Discovery {
    /// Synthetic root of the navigation tree
    pub root: NavNode,

    /// Normalized URL of the seed page as served (the key its node uses)
    pub seed_url: String,

    /// URL the seed page was served from; relative links resolve against it
    pub seed_base: String,

    /// Body of the seed page, reused so it is not fetched twice
    pub seed_html: String,
}

/// Discovers the navigation tree of a documentation site
#[derive(Debug)]
pub struct Discoverer {
    nav_strategies: Vec<Box<dyn NavStrategy>>,
    content_strategies: Vec<Box<dyn ContentStrategy>>,
}

impl Discoverer {
    pub fn new(selectors: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            nav_strategies: default_nav_strategies(&selectors.nav)?,
            content_strategies: default_content_strategies(&selectors.content)?,
        })
    }

    /// Fetches the seed page and builds the navigation tree from it
    ///
    /// # Returns
    ///
    /// * `Ok(Discovery)` - The tree (at least one node) and the seed HTML
    /// * `Err(ScraperError::FatalDiscovery)` - The seed could not be fetched,
    ///   or it has neither navigation, links, nor content
    pub async fn discover(
        &self,
        fetcher: &Fetcher,
        gate: &PacingGate,
        seed: &Url,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Discovery, ScraperError> {
        tracing::info!("Discovering navigation from {}", seed);

        let result = fetcher.fetch(gate, seed.as_str(), timeout, max_retries).await;
        let base = Url::parse(&result.final_url).unwrap_or_else(|_| seed.clone());
        let seed_html = result
            .into_html()
            .map_err(|source| ScraperError::FatalDiscovery {
                url: seed.to_string(),
                source: Box::new(source),
            })?;

        if base != *seed {
            tracing::debug!("Seed {} was served from {}", seed, base);
        }

        let root = self.discover_from_html(&seed_html, &base)?;
        tracing::info!("Discovered {} pages", root.len());

        Ok(Discovery {
            root,
            seed_url: page_key(&base),
            seed_base: base.to_string(),
            seed_html,
        })
    }

    /// Builds the navigation tree from already-fetched seed HTML
    ///
    /// `seed` is the URL the page was served from, so relative links in the
    /// sidebar resolve the way a browser would resolve them.
    pub fn discover_from_html(&self, html: &str, seed: &Url) -> Result<NavNode, ScraperError> {
        let document = Html::parse_document(html);

        if let Some(root) = parse_navigation(&document, seed, &self.nav_strategies) {
            return Ok(root);
        }

        if let Some(root) = fallback_links(&document, seed) {
            tracing::info!("No navigation found, using {} links from the page body", root.len());
            return Ok(root);
        }

        if locate_content(&document, &self.content_strategies).is_none() {
            return Err(ScraperError::FatalDiscovery {
                url: seed.to_string(),
                source: Box::new(ScraperError::Parse {
                    url: seed.to_string(),
                    message: "page has no navigation, links, or content".to_string(),
                }),
            });
        }

        tracing::warn!("No navigation found, documenting {} as a single page", seed);
        let title = page_title(&document).unwrap_or_else(|| seed.to_string());
        Ok(NavNode::root(vec![NavNode::new(title, page_key(seed), 0)]))
    }
}

/// Probes each strategy in order; the first container yielding entries wins
pub fn parse_navigation(
    document: &Html,
    seed: &Url,
    strategies: &[Box<dyn NavStrategy>],
) -> Option<NavNode> {
    for strategy in strategies {
        for container in strategy.containers(document) {
            let root = parse_container(container, seed);
            if !root.is_empty() {
                tracing::debug!("Found navigation using selector: {}", strategy.name());
                return Some(root);
            }
        }
        tracing::trace!("Navigation selector {} yielded nothing", strategy.name());
    }
    None
}

/// Flat arena entry; children always have larger indices than their parent
#[derive(Debug)]
struct ArenaNode {
    title: String,
    url: String,
    depth: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// A list item waiting to be processed
struct Frame<'a> {
    item: ElementRef<'a>,
    parent: Option<usize>,
    depth: usize,
}

fn parse_container(container: ElementRef<'_>, seed: &Url) -> NavNode {
    let items = direct_items(container);
    if items.is_empty() {
        return flat_links(container, seed, |url| is_same_origin(url, seed));
    }

    let mut arena: Vec<ArenaNode> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stack: Vec<Frame<'_>> = items
        .into_iter()
        .rev()
        .map(|item| Frame {
            item,
            parent: None,
            depth: 0,
        })
        .collect();

    while let Some(frame) = stack.pop() {
        let link = own_link(frame.item).and_then(|a| {
            let url = resolve_link(a.value().attr("href")?, seed)?;
            is_same_origin(&url, seed).then(|| (url.to_string(), link_title(a)))
        });

        // Linkless items (section groups, external links) pass their
        // children through to the current level.
        let Some((url, title)) = link else {
            push_items(&mut stack, frame.item, frame.parent, frame.depth);
            continue;
        };

        if on_ancestor_path(&arena, frame.parent, &url) {
            tracing::debug!("Skipping navigation cycle back to {}", url);
            continue;
        }

        if seen.contains(&url) {
            tracing::debug!("Skipping duplicate navigation entry {}", url);
            push_items(&mut stack, frame.item, frame.parent, frame.depth);
            continue;
        }

        let index = arena.len();
        arena.push(ArenaNode {
            title: if title.is_empty() { url.clone() } else { title },
            url: url.clone(),
            depth: frame.depth,
            parent: frame.parent,
            children: Vec::new(),
        });
        if let Some(parent) = frame.parent {
            arena[parent].children.push(index);
        }
        seen.insert(url);

        push_items(&mut stack, frame.item, Some(index), frame.depth + 1);
    }

    into_tree(arena)
}

fn push_items<'a>(stack: &mut Vec<Frame<'a>>, scope: ElementRef<'a>, parent: Option<usize>, depth: usize) {
    let items = direct_items(scope);
    stack.extend(items.into_iter().rev().map(|item| Frame {
        item,
        parent,
        depth,
    }));
}

fn on_ancestor_path(arena: &[ArenaNode], mut current: Option<usize>, url: &str) -> bool {
    while let Some(index) = current {
        if arena[index].url == url {
            return true;
        }
        current = arena[index].parent;
    }
    false
}

fn into_tree(arena: Vec<ArenaNode>) -> NavNode {
    let mut built: Vec<Option<NavNode>> = arena.iter().map(|_| None).collect();

    for (index, entry) in arena.iter().enumerate().rev() {
        let children = entry
            .children
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(
            NavNode::new(entry.title.clone(), entry.url.clone(), entry.depth)
                .with_children(children),
        );
    }

    let top_level = arena
        .iter()
        .enumerate()
        .filter(|(_, entry)| entry.parent.is_none())
        .filter_map(|(index, _)| built[index].take())
        .collect();

    NavNode::root(top_level)
}

fn element_children<'a>(element: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    element.children().filter_map(ElementRef::wrap).collect()
}

/// `li` elements belonging to `scope` itself, not to a nested item
fn direct_items<'a>(scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
    let mut items = Vec::new();
    let mut stack: Vec<ElementRef<'a>> = element_children(scope).into_iter().rev().collect();

    while let Some(element) = stack.pop() {
        if element.value().name() == "li" {
            items.push(element);
        } else {
            stack.extend(element_children(element).into_iter().rev());
        }
    }

    items
}

/// The item's own link: the first `a[href]` outside any nested list
fn own_link<'a>(item: ElementRef<'a>) -> Option<ElementRef<'a>> {
    let mut stack: Vec<ElementRef<'a>> = element_children(item).into_iter().rev().collect();

    while let Some(element) = stack.pop() {
        match element.value().name() {
            "ul" | "ol" | "li" => {}
            "a" if element.value().attr("href").is_some() => return Some(element),
            _ => stack.extend(element_children(element).into_iter().rev()),
        }
    }

    None
}

fn link_title(link: ElementRef<'_>) -> String {
    collapse_whitespace(&link.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Flat list of links found anywhere inside `scope`
fn flat_links(scope: ElementRef<'_>, seed: &Url, accept: impl Fn(&Url) -> bool) -> NavNode {
    let Ok(selector) = Selector::parse("a[href]") else {
        return NavNode::root(Vec::new());
    };

    let mut seen = HashSet::new();
    let mut nodes = Vec::new();

    for link in scope.select(&selector) {
        let Some(url) = link
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, seed))
        else {
            continue;
        };
        if !accept(&url) || !seen.insert(url.to_string()) {
            continue;
        }

        let title = link_title(link);
        let url = url.to_string();
        let title = if title.is_empty() { url.clone() } else { title };
        nodes.push(NavNode::new(title, url, 0));
    }

    NavNode::root(nodes)
}

/// Same-origin links from the body, restricted to the seed's path prefix
fn fallback_links(document: &Html, seed: &Url) -> Option<NavNode> {
    let body = Selector::parse("body").ok()?;
    let body = document.select(&body).next()?;
    let root = flat_links(body, seed, |url| is_under_prefix(url, seed));
    (!root.is_empty()).then_some(root)
}

/// Normalized form of a served URL, as used for node URLs
fn page_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|normalized| normalized.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// Title of a page: `<title>`, then the first `<h1>`
fn page_title(document: &Html) -> Option<String> {
    ["title", "h1"].iter().find_map(|css| {
        let selector = Selector::parse(css).ok()?;
        document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|title| !title.is_empty())
    })
}
