//! HTML to markdown conversion for a page's content container

use crate::extract::strategies::is_stripped;
use crate::url::absolutize;
use scraper::node::Node;
use scraper::{ElementRef, Selector};
use url::Url;

/// Element nesting beyond this depth is dropped and the page marked partial
pub const MAX_NESTING: usize = 48;

/// Elements that cannot be represented faithfully in markdown
const EMBED_TAGS: &[&str] = &["iframe", "video", "audio", "object", "embed", "canvas"];

/// Elements whose content is never rendered
const IGNORED_TAGS: &[&str] = &["head", "link", "meta", "svg", "math", "title"];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "dialog", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header",
    "hr", "li", "main", "ol", "p", "pre", "section", "summary", "table", "ul",
];

/// Converts one content container to markdown
pub struct MarkdownConverter<'a> {
    page_url: &'a Url,
    heading_offset: usize,
    strip: &'a [Selector],
    partial: bool,
}

impl<'a> MarkdownConverter<'a> {
    /// `heading_offset` is added to every heading level (clamped to 6)
    pub fn new(page_url: &'a Url, heading_offset: usize, strip: &'a [Selector]) -> Self {
        Self {
            page_url,
            heading_offset,
            strip,
            partial: false,
        }
    }

    /// True once something was dropped or approximated
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Converts the container's children into markdown blocks
    pub fn convert(&mut self, container: ElementRef<'_>) -> String {
        let markdown = self.flow(items(container), 0);
        tidy(&markdown)
    }

    /// Renders a run of sibling nodes, grouping inline content into paragraphs
    fn flow<'b>(&mut self, nodes: impl Iterator<Item = Item<'b>>, depth: usize) -> String {
        let mut blocks: Vec<String> = Vec::new();
        let mut inline = String::new();

        for node in nodes {
            match node {
                Item::Text(text) => inline.push_str(&collapse(text)),
                Item::Element(element) => {
                    if self.skip(&element, depth) {
                        continue;
                    }
                    if is_block(&element) {
                        flush(&mut inline, &mut blocks);
                        let block = self.block(element, depth + 1);
                        if !block.trim().is_empty() {
                            blocks.push(block);
                        }
                    } else {
                        inline.push_str(&self.inline(element, depth + 1));
                    }
                }
            }
        }
        flush(&mut inline, &mut blocks);

        blocks.join("\n\n")
    }

    fn skip(&mut self, element: &ElementRef<'_>, depth: usize) -> bool {
        let name = element.value().name();

        if depth > MAX_NESTING {
            self.partial = true;
            return true;
        }
        if IGNORED_TAGS.contains(&name) || is_stripped(element, self.strip) {
            return true;
        }
        false
    }

    fn block(&mut self, element: ElementRef<'_>, depth: usize) -> String {
        let name = element.value().name();

        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<usize>().unwrap_or(1);
                let level = (level + self.heading_offset).min(6);
                let text = self.inline_children(element, depth);
                let text = text.trim();
                if text.is_empty() {
                    String::new()
                } else {
                    format!("{} {}", "#".repeat(level), text)
                }
            }
            "p" | "summary" | "dt" | "figcaption" => {
                self.inline_children(element, depth).trim().to_string()
            }
            "ul" => self.list(element, false, depth).join("\n"),
            "ol" => self.list(element, true, depth).join("\n"),
            "pre" => code_block(element),
            "blockquote" => {
                let inner = self.flow(items(element), depth);
                inner
                    .lines()
                    .map(|line| {
                        if line.is_empty() {
                            ">".to_string()
                        } else {
                            format!("> {}", line)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            "hr" => "---".to_string(),
            "table" => self.table(element),
            "li" => self.list_item(element, "- ", depth).join("\n"),
            _ => self.flow(items(element), depth),
        }
    }

    fn inline_children(&mut self, element: ElementRef<'_>, depth: usize) -> String {
        let mut out = String::new();
        for node in items(element) {
            match node {
                Item::Text(text) => out.push_str(&collapse(text)),
                Item::Element(child) => {
                    if !self.skip(&child, depth) {
                        out.push_str(&self.inline(child, depth + 1));
                    }
                }
            }
        }
        out
    }

    fn inline(&mut self, element: ElementRef<'_>, depth: usize) -> String {
        let name = element.value().name();

        if EMBED_TAGS.contains(&name) {
            self.partial = true;
            return match element.value().attr("src") {
                Some(src) => format!("[Embedded content]({})", absolutize(src, self.page_url)),
                None => String::new(),
            };
        }
        if name.contains('-') {
            self.partial = true;
        }

        match name {
            "strong" | "b" => wrap_inline(&self.inline_children(element, depth), "**"),
            "em" | "i" => wrap_inline(&self.inline_children(element, depth), "*"),
            "code" | "kbd" | "samp" => inline_code(&element.text().collect::<String>()),
            "br" => "\n".to_string(),
            "img" => match element.value().attr("src") {
                Some(src) => {
                    let alt = element.value().attr("alt").unwrap_or("").trim();
                    format!("![{}]({})", alt, absolutize(src, self.page_url))
                }
                None => String::new(),
            },
            "a" => {
                let text = self.inline_children(element, depth);
                match element.value().attr("href") {
                    Some(href) if !href.trim().is_empty() => {
                        let target = absolutize(href, self.page_url);
                        let text = text.trim();
                        if text.is_empty() {
                            format!("<{}>", target)
                        } else {
                            format!("[{}]({})", text, target)
                        }
                    }
                    _ => text,
                }
            }
            _ if is_block(&element) => {
                format!(" {} ", self.flow(items(element), depth))
            }
            _ => self.inline_children(element, depth),
        }
    }

    /// Renders a list; nested lists are indented under their item
    fn list(&mut self, element: ElementRef<'_>, ordered: bool, depth: usize) -> Vec<String> {
        let start = element
            .value()
            .attr("start")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .unwrap_or(1);

        let items: Vec<ElementRef<'_>> = element
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|child| child.value().name() == "li")
            .collect();

        let mut lines = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            if self.skip(&item, depth) {
                continue;
            }
            let marker = if ordered {
                format!("{}. ", start + index)
            } else {
                "- ".to_string()
            };
            lines.extend(self.list_item(item, &marker, depth + 1));
        }
        lines
    }

    fn list_item(
        &mut self,
        item: ElementRef<'_>,
        marker: &str,
        depth: usize,
    ) -> Vec<String> {
        let child_indent = " ".repeat(marker.len());

        let mut nested = Vec::new();
        let mut body_nodes = Vec::new();
        for node in items(item) {
            match node {
                Item::Element(child) if matches!(child.value().name(), "ul" | "ol") => {
                    if !self.skip(&child, depth) {
                        let ordered = child.value().name() == "ol";
                        nested.extend(self.list(child, ordered, depth + 1));
                    }
                }
                other => body_nodes.push(other),
            }
        }

        let body = self.flow(body_nodes.into_iter(), depth);
        let mut lines = Vec::new();
        let mut body_lines = body.lines();
        let first = body_lines.next().unwrap_or("").trim_end();
        lines.push(format!("{}{}", marker, first));
        for line in body_lines {
            if line.is_empty() {
                lines.push(String::new());
            } else {
                lines.push(format!("{}{}", child_indent, line));
            }
        }
        for line in nested {
            lines.push(format!("{}{}", child_indent, line));
        }
        lines
    }

    fn table(&mut self, table: ElementRef<'_>) -> String {
        let Ok(row_selector) = Selector::parse("tr") else {
            return String::new();
        };
        let Ok(cell_selector) = Selector::parse("th, td") else {
            return String::new();
        };

        let rows: Vec<Vec<String>> = table
            .select(&row_selector)
            .map(|row| {
                row.select(&cell_selector)
                    .map(|cell| {
                        collapse(&cell.text().collect::<String>())
                            .trim()
                            .replace('|', "\\|")
                    })
                    .collect()
            })
            .filter(|cells: &Vec<String>| !cells.is_empty())
            .collect();

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return String::new();
        }

        let render = |cells: &[String]| {
            let mut padded: Vec<&str> = cells.iter().map(String::as_str).collect();
            padded.resize(columns, "");
            format!("| {} |", padded.join(" | "))
        };

        let mut lines = vec![render(rows[0].as_slice())];
        lines.push(format!("|{}", " --- |".repeat(columns)));
        lines.extend(rows[1..].iter().map(|row| render(row.as_slice())));
        lines.join("\n")
    }
}

/// A child node relevant to conversion
enum Item<'b> {
    Text(&'b str),
    Element(ElementRef<'b>),
}

fn items(element: ElementRef<'_>) -> impl Iterator<Item = Item<'_>> {
    element.children().filter_map(|node| match node.value() {
        Node::Text(text) => Some(Item::Text(&**text)),
        Node::Element(_) => ElementRef::wrap(node).map(Item::Element),
        _ => None,
    })
}

fn is_block(element: &ElementRef<'_>) -> bool {
    BLOCK_TAGS.contains(&element.value().name())
}

fn flush(inline: &mut String, blocks: &mut Vec<String>) {
    let paragraph = inline
        .lines()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n");
    let paragraph = paragraph.trim();
    if !paragraph.is_empty() {
        blocks.push(paragraph.to_string());
    }
    inline.clear();
}

/// Collapses runs of whitespace to single spaces, keeping edge spaces
fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn wrap_inline(text: &str, marker: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return text.to_string();
    }
    let leading = if text.starts_with(' ') { " " } else { "" };
    let trailing = if text.ends_with(' ') { " " } else { "" };
    format!("{}{}{}{}{}", leading, marker, trimmed, marker, trailing)
}

fn inline_code(text: &str) -> String {
    let text = collapse(text);
    let text = text.trim();
    if text.is_empty() {
        String::new()
    } else if text.contains('`') {
        format!("`` {} ``", text)
    } else {
        format!("`{}`", text)
    }
}

/// Fenced code block; the language comes from a `language-*` or `lang-*` class
fn code_block(pre: ElementRef<'_>) -> String {
    let code = pre
        .children()
        .filter_map(ElementRef::wrap)
        .find(|child| child.value().name() == "code");

    let language = code
        .iter()
        .chain(std::iter::once(&pre))
        .flat_map(|element| element.value().classes())
        .find_map(|class| {
            class
                .strip_prefix("language-")
                .or_else(|| class.strip_prefix("lang-"))
        })
        .unwrap_or("");

    let text: String = pre.text().collect();
    let text = text.trim_matches('\n');

    let fence = if text.contains("```") { "````" } else { "```" };
    format!("{}{}\n{}\n{}", fence, language, text, fence)
}

/// Collapses blank-line runs and trims the document
fn tidy(markdown: &str) -> String {
    let mut out = Vec::new();
    let mut blank = false;
    let mut in_fence = false;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }
        if line.trim().is_empty() && !in_fence {
            if !blank && !out.is_empty() {
                out.push("");
            }
            blank = true;
            continue;
        }
        blank = false;
        out.push(if in_fence { line } else { line.trim_end() });
    }

    while out.last().map_or(false, |line| line.is_empty()) {
        out.pop();
    }
    out.join("\n")
}
