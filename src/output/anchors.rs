use std::collections::HashSet;

/// Hands out unique anchor slugs for headings
///
/// Slugs are the title lowercased with whitespace turned into hyphens and
/// punctuation dropped. A slug already handed out gets `-1`, `-2`, ...
/// appended, so two "Setup" pages become `setup` and `setup-1`.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    used: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a slug for `title` that no earlier call returned
    pub fn anchor_for(&mut self, title: &str) -> String {
        let base = slugify(title);

        if self.used.insert(base.clone()) {
            return base;
        }

        let mut suffix = 1;
        loop {
            let candidate = format!("{}-{}", base, suffix);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            suffix += 1;
        }
    }
}

/// Converts a title to its base anchor slug
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.trim().chars() {
        if c.is_whitespace() {
            slug.push('-');
        } else if c.is_alphanumeric() || c == '-' || c == '_' {
            slug.extend(c.to_lowercase());
        }
    }

    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}
