//! Document assembly
//!
//! Walks the navigation tree in pre-order and merges each selected page's
//! markdown under a heading matching its depth, optionally preceded by a
//! table of contents linking to every selected page.

use crate::extract::{unavailable_note, PageContent};
use crate::navigation::NavNode;
use crate::output::anchors::AnchorRegistry;
use std::collections::HashMap;

/// Heading of the generated table of contents
pub const TOC_HEADING: &str = "# Table of Contents";

/// Options controlling assembly
#[derive(Debug, Clone, Copy, Default)]
pub struct AssembleOptions {
    /// Emit a table of contents and an anchor before every page heading
    pub generate_toc: bool,
}

/// How a node appears in the document
enum Emit {
    /// Heading and content
    Page { anchor: Option<String> },
    /// Heading only: an unselected ancestor of selected pages
    Structure,
}

/// Assembles the final document
///
/// # Arguments
///
/// * `root` - Root of the navigation tree, with selection flags applied
/// * `contents` - Extracted page content keyed by page URL
/// * `options` - Assembly options
///
/// # Returns
///
/// The markdown document, ending in a single newline (empty when no node is
/// selected). Identical inputs always produce byte-identical output.
pub fn assemble(
    root: &NavNode,
    contents: &HashMap<String, PageContent>,
    options: &AssembleOptions,
) -> String {
    let mut anchors = AnchorRegistry::new();

    let plan: Vec<(&NavNode, Emit)> = root
        .iter()
        .filter_map(|node| {
            if node.selected {
                let anchor = options
                    .generate_toc
                    .then(|| anchors.anchor_for(&node.title));
                Some((node, Emit::Page { anchor }))
            } else if node.has_selected_descendant() {
                Some((node, Emit::Structure))
            } else {
                None
            }
        })
        .collect();

    let mut sections: Vec<String> = Vec::new();

    if options.generate_toc {
        if let Some(toc) = format_toc(&plan) {
            sections.push(toc);
        }
    }

    for (node, emit) in &plan {
        let heading = format!("{} {}", "#".repeat(heading_level(node.depth)), node.title);

        match emit {
            Emit::Structure => sections.push(heading),
            Emit::Page { anchor } => {
                let mut section = String::new();
                if let Some(anchor) = anchor {
                    section.push_str(&format!("<a id=\"{}\"></a>\n", anchor));
                }
                section.push_str(&heading);

                let body = match contents.get(&node.url) {
                    Some(content) => content.markdown.trim().to_string(),
                    None => unavailable_note(&node.url, "not fetched"),
                };
                if !body.is_empty() {
                    section.push_str("\n\n");
                    section.push_str(&body);
                }
                sections.push(section);
            }
        }
    }

    if sections.is_empty() {
        return String::new();
    }

    let mut document = sections.join("\n\n");
    document.push('\n');
    document
}

/// Heading level for a page at `depth`: one `#` per level, at most six
pub fn heading_level(depth: usize) -> usize {
    (depth + 1).min(6)
}

fn format_toc(plan: &[(&NavNode, Emit)]) -> Option<String> {
    let entries: Vec<String> = plan
        .iter()
        .filter_map(|(node, emit)| match emit {
            Emit::Page {
                anchor: Some(anchor),
            } => Some(format!(
                "{}- [{}](#{})",
                "  ".repeat(node.depth),
                node.title,
                anchor
            )),
            _ => None,
        })
        .collect();

    if entries.is_empty() {
        return None;
    }

    let mut toc = String::new();
    toc.push_str(TOC_HEADING);
    toc.push_str("\n\n");
    toc.push_str(&entries.join("\n"));
    toc.push_str("\n\n---");
    Some(toc)
}
