use crate::navigation::NavNode;
use std::collections::BTreeSet;

/// Returns true if `title` names one of the requested TOC items
///
/// Comparison is case-insensitive and ignores surrounding whitespace.
pub fn title_matches(title: &str, items: &BTreeSet<String>) -> bool {
    let title = title.trim().to_lowercase();
    items.iter().any(|item| item.trim().to_lowercase() == title)
}

/// Marks the nodes whose content goes into the document
///
/// With an empty `items` set every node is selected. Otherwise a node is
/// selected iff its title matches an item or one of its ancestors matched.
/// Unselected ancestors of selected nodes stay in the tree as structure.
///
/// # Returns
///
/// The number of nodes whose own title matched an item.
pub fn apply_toc_filter(root: &mut NavNode, items: &BTreeSet<String>) -> usize {
    let mut matched = 0;

    // (node, ancestor selected)
    let mut stack: Vec<(&mut NavNode, bool)> = root
        .children
        .iter_mut()
        .map(|child| (child, items.is_empty()))
        .collect();

    while let Some((node, inherited)) = stack.pop() {
        let own = !items.is_empty() && title_matches(&node.title, items);
        if own {
            matched += 1;
        }
        node.selected = inherited || own;

        let selected = node.selected;
        stack.extend(node.children.iter_mut().map(|child| (child, selected)));
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> NavNode {
        NavNode::root(vec![
            NavNode::new("Intro", "https://d.example/intro", 0),
            NavNode::new("Guide", "https://d.example/guide", 0).with_children(vec![
                NavNode::new("Install", "https://d.example/guide/install", 1),
                NavNode::new("Usage", "https://d.example/guide/usage", 1).with_children(vec![
                    NavNode::new("Advanced", "https://d.example/guide/usage/advanced", 2),
                ]),
            ]),
        ])
    }

    fn items(titles: &[&str]) -> BTreeSet<String> {
        titles.iter().map(|t| t.to_string()).collect()
    }

    fn selected_titles(root: &NavNode) -> Vec<&str> {
        root.selected_nodes()
            .into_iter()
            .map(|n| n.title.as_str())
            .collect()
    }

    #[test]
    fn test_empty_filter_selects_everything() {
        let mut root = tree();
        assert_eq!(apply_toc_filter(&mut root, &BTreeSet::new()), 0);
        assert_eq!(root.selected_nodes().len(), 5);
    }

    #[test]
    fn test_match_selects_descendants() {
        let mut root = tree();
        let matched = apply_toc_filter(&mut root, &items(&["usage"]));

        assert_eq!(matched, 1);
        assert_eq!(selected_titles(&root), vec!["Usage", "Advanced"]);
        assert!(!root.children[1].selected);
        assert!(root.children[1].has_selected_descendant());
    }

    #[test]
    fn test_match_is_case_insensitive_and_trimmed() {
        let mut root = tree();
        apply_toc_filter(&mut root, &items(&["  INTRO "]));
        assert_eq!(selected_titles(&root), vec!["Intro"]);
    }

    #[test]
    fn test_overlapping_items() {
        let mut root = tree();
        let matched = apply_toc_filter(&mut root, &items(&["Guide", "Advanced"]));

        assert_eq!(matched, 2);
        assert_eq!(
            selected_titles(&root),
            vec!["Guide", "Install", "Usage", "Advanced"]
        );
    }

    #[test]
    fn test_no_match_selects_nothing() {
        let mut root = tree();
        assert_eq!(apply_toc_filter(&mut root, &items(&["Nope"])), 0);
        assert!(root.selected_nodes().is_empty());
    }
}
