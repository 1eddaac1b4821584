//! Content sources and the navigation tree.
//!
//! A [`ContentSource`] resolves slugs to [`Document`]s and enumerates every
//! document for the static build. [`FsSource`] loads a directory of
//! Markdown files; [`MemorySource`] holds documents built in code.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, trace};
use serde::Serialize;

use quire_core::{
    Document, Slug,
    front_matter::split_front_matter,
    toc::{extract_toc, first_title},
};

use crate::error::QuireError;

/// Resolves slugs to documents.
pub trait ContentSource: Send + Sync {
    /// Returns the document for `slug`, if one exists.
    fn resolve(&self, slug: &[String]) -> Option<&Document>;

    /// Every document, sorted by slug.
    fn list_all(&self) -> Vec<&Document>;
}

/// Documents held in memory.
///
/// # Examples
///
/// ```
/// # use quire::source::{ContentSource, MemorySource};
/// # use quire_core::{Document, Slug};
/// let mut source = MemorySource::new();
/// source.insert(Document::new(Slug::root(), "Overview", "Welcome")).unwrap();
///
/// assert_eq!(source.resolve(&[]).map(Document::title), Some("Overview"));
/// assert!(source.resolve(&["nonexistent-page".to_string()]).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: BTreeMap<Slug, Document>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a source from documents, failing on the first duplicate slug.
    pub fn from_documents(
        documents: impl IntoIterator<Item = Document>,
    ) -> Result<Self, QuireError> {
        let mut source = Self::new();
        for document in documents {
            source.insert(document)?;
        }
        Ok(source)
    }

    /// Adds a document.
    ///
    /// # Errors
    ///
    /// Returns [`QuireError::DuplicateSlug`] if a document with the same slug
    /// is already present; the existing document is kept.
    pub fn insert(&mut self, document: Document) -> Result<(), QuireError> {
        if let Some(existing) = self.documents.get(document.slug()) {
            return Err(QuireError::DuplicateSlug {
                slug: document.slug().clone(),
                first: origin(existing),
                second: origin(&document),
            });
        }
        self.documents.insert(document.slug().clone(), document);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ContentSource for MemorySource {
    fn resolve(&self, slug: &[String]) -> Option<&Document> {
        self.documents.get(&Slug::from(slug))
    }

    fn list_all(&self) -> Vec<&Document> {
        self.documents.values().collect()
    }
}

/// Describes where a document came from, for error messages.
fn origin(document: &Document) -> String {
    match document.source_path() {
        Some(path) => format!("`{}`", path.display()),
        None => format!("in-memory document `{}`", document.title()),
    }
}

/// Documents loaded from a directory of Markdown files.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    documents: MemorySource,
}

impl FsSource {
    /// Loads every `.md` and `.mdx` file below `dir`.
    ///
    /// The slug of a file is its path relative to `dir` without the
    /// extension, with `index` files standing for their directory. The
    /// title comes from the front matter, else the first level-1 heading,
    /// else the file stem.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` is not a directory, a file cannot be read,
    /// front matter is malformed, or two files map to the same slug.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, QuireError> {
        let root = dir.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(QuireError::Content(format!(
                "content directory `{}` does not exist",
                root.display()
            )));
        }

        let mut files = Vec::new();
        collect_files(&root, &mut files)?;
        files.sort();

        let mut documents = MemorySource::new();
        for path in files {
            let Some(slug) = path
                .strip_prefix(&root)
                .ok()
                .and_then(Slug::from_relative_path)
            else {
                trace!(path:? = path; "Skipping non-content file");
                continue;
            };
            documents.insert(load_document(slug, &path)?)?;
        }

        info!(root:? = root, documents = documents.len(); "Content loaded");
        Ok(Self { root, documents })
    }

    /// The content directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSource for FsSource {
    fn resolve(&self, slug: &[String]) -> Option<&Document> {
        self.documents.resolve(slug)
    }

    fn list_all(&self) -> Vec<&Document> {
        self.documents.list_all()
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), QuireError> {
    let entries = fs::read_dir(dir).map_err(|err| QuireError::io(dir, err))?;
    for entry in entries {
        let path = entry.map_err(|err| QuireError::io(dir, err))?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn load_document(slug: Slug, path: &Path) -> Result<Document, QuireError> {
    let text = fs::read_to_string(path).map_err(|err| QuireError::io(path, err))?;
    let (front_matter, body) =
        split_front_matter(&text).map_err(|source| QuireError::FrontMatter {
            path: path.to_path_buf(),
            source,
        })?;

    let title = front_matter
        .title()
        .map(str::to_string)
        .or_else(|| first_title(body))
        .unwrap_or_else(|| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default()
        });

    debug!(slug:% = slug, title = title.as_str(); "Loaded document");

    let mut document = Document::new(slug, title, body)
        .with_toc(extract_toc(body))
        .with_source_path(path);
    if let Some(description) = front_matter.description() {
        document = document.with_description(description);
    }
    Ok(document)
}

/// One entry of the docs sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavEntry {
    title: String,
    url: String,
    depth: usize,
    active: bool,
}

impl NavEntry {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Number of slug segments; 0 for the docs root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this entry is the page being shown.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

/// The docs navigation tree, in slug order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageTree {
    entries: Vec<NavEntry>,
}

impl PageTree {
    /// Builds the tree for `source`, marking `current` as active.
    pub fn build(source: &dyn ContentSource, current: Option<&Slug>) -> Self {
        let entries = source
            .list_all()
            .into_iter()
            .map(|document| NavEntry {
                title: document.title().to_string(),
                url: document.slug().url(crate::DOCS_BASE),
                depth: document.slug().depth(),
                active: Some(document.slug()) == current,
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[NavEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, relative: &str, text: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    fn segments(slug: &[&str]) -> Vec<String> {
        slug.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_memory_source_rejects_duplicates() {
        let mut source = MemorySource::new();
        source
            .insert(Document::new(Slug::root(), "Overview", ""))
            .unwrap();
        let err = source
            .insert(Document::new(Slug::root(), "Other", ""))
            .unwrap_err();

        assert!(matches!(err, QuireError::DuplicateSlug { .. }));
        assert_eq!(source.len(), 1);
        assert_eq!(source.resolve(&[]).unwrap().title(), "Overview");
    }

    #[test]
    fn test_list_all_is_sorted() {
        let source = MemorySource::from_documents([
            Document::new(Slug::from_segments(["guide", "setup"]), "Setup", ""),
            Document::new(Slug::root(), "Overview", ""),
            Document::new(Slug::from_segments(["guide"]), "Guide", ""),
        ])
        .unwrap();

        let titles: Vec<_> = source.list_all().into_iter().map(Document::title).collect();
        assert_eq!(titles, ["Overview", "Guide", "Setup"]);
    }

    #[test]
    fn test_fs_source_loads_tree() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "---\ntitle: Overview\n---\n\n## Intro\n");
        write(dir.path(), "guide/index.mdx", "# Guide\n\nText\n");
        write(dir.path(), "guide/setup.md", "No heading here\n");
        write(dir.path(), "notes.txt", "ignored");

        let source = FsSource::load(dir.path()).unwrap();
        assert_eq!(source.list_all().len(), 3);

        let root = source.resolve(&[]).unwrap();
        assert_eq!(root.title(), "Overview");
        assert_eq!(root.toc()[0].url(), "#intro");
        assert_eq!(root.body(), "\n## Intro\n");

        assert_eq!(source.resolve(&segments(&["guide"])).unwrap().title(), "Guide");
        assert_eq!(
            source.resolve(&segments(&["guide", "setup"])).unwrap().title(),
            "setup"
        );
        assert!(source.resolve(&segments(&["nonexistent-page"])).is_none());
    }

    #[test]
    fn test_fs_source_duplicate_slug_names_both_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "guide.md", "# A\n");
        write(dir.path(), "guide/index.md", "# B\n");

        let err = FsSource::load(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, QuireError::DuplicateSlug { .. }));
        assert!(message.contains("guide.md"));
        assert!(message.contains("index.md"));
    }

    #[test]
    fn test_fs_source_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsSource::load(dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, QuireError::Content(_)));
    }

    #[test]
    fn test_fs_source_bad_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "index.md", "---\ntitle: [oops\n---\n");
        let err = FsSource::load(dir.path()).unwrap_err();
        assert!(matches!(err, QuireError::FrontMatter { .. }));
    }

    #[test]
    fn test_page_tree_marks_active_entry() {
        let source = MemorySource::from_documents([
            Document::new(Slug::root(), "Overview", ""),
            Document::new(Slug::from_segments(["guide"]), "Guide", ""),
        ])
        .unwrap();

        let current = Slug::from_segments(["guide"]);
        let tree = PageTree::build(&source, Some(&current));
        let entries = tree.entries();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].url(), "/docs");
        assert!(!entries[0].is_active());
        assert_eq!(entries[1].url(), "/docs/guide");
        assert_eq!(entries[1].depth(), 1);
        assert!(entries[1].is_active());
    }
}
