//! Slugs identify documents by their ordered path segments.
//!
//! A [`Slug`] is derived from a content file's location relative to the
//! content root. The empty slug is the docs root and is produced by the
//! top-level `index.md`.
//!
//! # Examples
//!
//! ```
//! # use std::path::Path;
//! # use quire_core::Slug;
//! let slug = Slug::from_relative_path(Path::new("guide/setup.md")).unwrap();
//! assert_eq!(slug.segments(), ["guide", "setup"]);
//! assert_eq!(slug.url("/docs"), "/docs/guide/setup");
//!
//! let root = Slug::from_relative_path(Path::new("index.md")).unwrap();
//! assert!(root.is_root());
//! assert_eq!(root.url("/docs"), "/docs");
//! ```

use std::{
    fmt,
    path::{Component, Path},
};

/// File extensions recognized as content pages.
pub const CONTENT_EXTENSIONS: [&str; 2] = ["md", "mdx"];

/// File stem that maps to its parent directory's slug.
const INDEX_STEM: &str = "index";

/// An ordered sequence of path segments identifying a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slug {
    segments: Vec<String>,
}

impl Slug {
    /// Returns the root slug (no segments).
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a slug from the given segments.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Derives a slug from a content file path relative to the content root.
    ///
    /// Returns `None` when the path is not a content file (wrong extension)
    /// or contains components that cannot appear in a slug (`..`, roots,
    /// non UTF-8 names).
    pub fn from_relative_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;
        if !CONTENT_EXTENSIONS.contains(&extension) {
            return None;
        }

        let mut segments = Vec::new();
        for component in path.parent().into_iter().flat_map(Path::components) {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?.to_string()),
                Component::CurDir => {}
                _ => return None,
            }
        }

        let stem = path.file_stem()?.to_str()?;
        if stem != INDEX_STEM {
            segments.push(stem.to_string());
        }

        Some(Self { segments })
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` for the docs root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Builds the page URL below `base`, e.g. `/docs/guide/setup`.
    pub fn url(&self, base: &str) -> String {
        let mut url = base.trim_end_matches('/').to_string();
        for segment in &self.segments {
            url.push('/');
            url.push_str(segment);
        }
        if url.is_empty() {
            url.push('/');
        }
        url
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<&[String]> for Slug {
    fn from(segments: &[String]) -> Self {
        Self {
            segments: segments.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_maps_to_parent() {
        let root = Slug::from_relative_path(Path::new("index.md")).unwrap();
        assert!(root.is_root());

        let guide = Slug::from_relative_path(Path::new("guide/index.mdx")).unwrap();
        assert_eq!(guide.segments(), ["guide"]);
    }

    #[test]
    fn test_nested_page() {
        let slug = Slug::from_relative_path(Path::new("./a/b/c.md")).unwrap();
        assert_eq!(slug.segments(), ["a", "b", "c"]);
        assert_eq!(slug.depth(), 3);
        assert_eq!(slug.to_string(), "a/b/c");
    }

    #[test]
    fn test_non_content_files_are_skipped() {
        assert!(Slug::from_relative_path(Path::new("logo.png")).is_none());
        assert!(Slug::from_relative_path(Path::new("README")).is_none());
        assert!(Slug::from_relative_path(Path::new("../escape.md")).is_none());
    }

    #[test]
    fn test_url() {
        assert_eq!(Slug::root().url("/docs"), "/docs");
        assert_eq!(Slug::root().url("/docs/"), "/docs");
        assert_eq!(Slug::root().url(""), "/");
        assert_eq!(Slug::from_segments(["x"]).url(""), "/x");
        assert_eq!(Slug::from_segments(["a", "b"]).url("/docs"), "/docs/a/b");
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut slugs = vec![
            Slug::from_segments(["b"]),
            Slug::root(),
            Slug::from_segments(["a", "z"]),
            Slug::from_segments(["a"]),
        ];
        slugs.sort();
        let rendered: Vec<String> = slugs.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["", "a", "a/z", "b"]);
    }
}
