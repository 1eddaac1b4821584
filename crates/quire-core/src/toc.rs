//! Table of contents extraction and heading anchors.
//!
//! The [`Slugger`] is shared between TOC extraction and body rendering so
//! that every TOC link points at an id the rendered heading actually has.

use std::collections::HashMap;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// A single table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TocEntry {
    title: String,
    url: String,
    depth: u8,
}

impl TocEntry {
    /// Creates an entry linking to `#anchor`.
    pub fn new(title: impl Into<String>, anchor: &str, depth: u8) -> Self {
        Self {
            title: title.into(),
            url: format!("#{anchor}"),
            depth,
        }
    }

    /// The heading text.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The in-page link, `#anchor`.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Heading depth, 1 to 6.
    pub fn depth(&self) -> u8 {
        self.depth
    }
}

/// Generates unique heading anchors for one document.
///
/// Anchors are lowercase, keep alphanumerics, `_` and `-`, turn whitespace
/// into `-` and drop everything else. A repeated anchor gets a `-1`, `-2`,
/// ... suffix.
///
/// # Examples
///
/// ```
/// # use quire_core::Slugger;
/// let mut slugger = Slugger::new();
/// assert_eq!(slugger.slug("Getting Started"), "getting-started");
/// assert_eq!(slugger.slug("Getting Started"), "getting-started-1");
/// assert_eq!(slugger.slug("What's new?"), "whats-new");
/// ```
#[derive(Debug, Default)]
pub struct Slugger {
    seen: HashMap<String, usize>,
}

impl Slugger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the anchor for `text`, unique within this slugger.
    pub fn slug(&mut self, text: &str) -> String {
        let base: String = text
            .trim()
            .chars()
            .flat_map(char::to_lowercase)
            .filter_map(|c| {
                if c.is_alphanumeric() || c == '_' || c == '-' {
                    Some(c)
                } else if c.is_whitespace() {
                    Some('-')
                } else {
                    None
                }
            })
            .collect();

        let mut candidate = base.clone();
        if let Some(&last) = self.seen.get(&base) {
            let mut count = last;
            loop {
                count += 1;
                candidate = format!("{base}-{count}");
                if !self.seen.contains_key(&candidate) {
                    break;
                }
            }
            self.seen.insert(base, count);
        }
        self.seen.insert(candidate.clone(), 0);
        candidate
    }

    /// Marks an author-supplied anchor as taken, so later generated anchors
    /// avoid it.
    pub fn reserve(&mut self, anchor: &str) {
        self.seen.entry(anchor.to_string()).or_insert(0);
    }
}

/// Markdown extensions enabled for every content page.
pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

/// Converts a heading level to its numeric depth.
pub fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Collects every heading of a Markdown body, in document order.
///
/// Headings carrying an explicit `{#id}` keep that id; the others get a
/// [`Slugger`] anchor that avoids every explicit id seen before it.
pub fn extract_toc(markdown: &str) -> Vec<TocEntry> {
    let mut slugger = Slugger::new();
    let mut entries = Vec::new();
    let mut current: Option<(u8, Option<String>, String)> = None;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                let id = id.map(|id| id.to_string());
                if let Some(id) = &id {
                    slugger.reserve(id);
                }
                current = Some((heading_depth(level), id, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, title)) = current.as_mut() {
                    title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((depth, id, title)) = current.take() {
                    let anchor = id.unwrap_or_else(|| slugger.slug(&title));
                    entries.push(TocEntry::new(title, &anchor, depth));
                }
            }
            _ => {}
        }
    }

    entries
}

/// Returns the text of the first level-1 heading, if any.
pub fn first_title(markdown: &str) -> Option<String> {
    let mut in_title = false;
    let mut title = String::new();

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_title = true,
            Event::Text(text) | Event::Code(text) if in_title => title.push_str(&text),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_title => {
                return Some(title);
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_slug_basic() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Hello World"), "hello-world");
        assert_eq!(slugger.slug("  API v2.0  "), "api-v20");
        assert_eq!(slugger.slug("snake_case-name"), "snake_case-name");
    }

    #[test]
    fn test_slug_deduplicates() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup"), "setup");
        assert_eq!(slugger.slug("Setup"), "setup-1");
        assert_eq!(slugger.slug("Setup"), "setup-2");
        // An explicit heading that collides with a generated suffix.
        assert_eq!(slugger.slug("Setup 1"), "setup-1-1");
    }

    #[test]
    fn test_extract_toc() {
        let markdown = "# Title\n\nIntro\n\n## First `step`\n\n### Detail\n\n## First step\n";
        let toc = extract_toc(markdown);

        assert_eq!(toc.len(), 4);
        assert_eq!(toc[0], TocEntry::new("Title", "title", 1));
        assert_eq!(toc[1].title(), "First step");
        assert_eq!(toc[1].url(), "#first-step");
        assert_eq!(toc[2].depth(), 3);
        assert_eq!(toc[3].url(), "#first-step-1");
    }

    #[test]
    fn test_extract_toc_keeps_explicit_ids() {
        let toc = extract_toc("## Install {#setup}\n");
        assert_eq!(toc, vec![TocEntry::new("Install", "setup", 2)]);
    }

    #[test]
    fn test_generated_anchor_avoids_explicit_id() {
        let toc = extract_toc("## Intro {#setup}\n\n## Setup\n");
        let urls: Vec<_> = toc.iter().map(TocEntry::url).collect();
        assert_eq!(urls, ["#setup", "#setup-1"]);
    }

    #[test]
    fn test_reserve_keeps_existing_count() {
        let mut slugger = Slugger::new();
        assert_eq!(slugger.slug("Setup"), "setup");
        slugger.reserve("setup");
        slugger.reserve("setup-1");
        assert_eq!(slugger.slug("Setup"), "setup-2");
    }

    #[test]
    fn test_heading_in_code_block_is_ignored() {
        let toc = extract_toc("```\n# not a heading\n```\n");
        assert!(toc.is_empty());
    }

    #[test]
    fn test_first_title() {
        assert_eq!(
            first_title("Some text\n\n## Sub\n\n# Main\n"),
            Some("Main".to_string())
        );
        assert_eq!(first_title("## Only sub\n"), None);
    }

    proptest! {
        #[test]
        fn prop_slugs_are_unique(titles in proptest::collection::vec("[a-zA-Z0-9 _-]{0,12}", 0..24)) {
            let mut slugger = Slugger::new();
            let mut seen = HashSet::new();
            for title in &titles {
                prop_assert!(seen.insert(slugger.slug(title)));
            }
        }
    }
}
