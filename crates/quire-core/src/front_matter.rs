//! YAML front matter at the top of content files.
//!
//! A content file may start with a block delimited by `---` lines:
//!
//! ```text
//! ---
//! title: Overview
//! description: What this platform does
//! ---
//!
//! Body text...
//! ```

use serde::Deserialize;
use thiserror::Error;

const DELIMITER: &str = "---";

/// Error raised when a front matter block cannot be parsed.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter is not closed by a `---` line")]
    Unterminated,

    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

/// Metadata declared in a content file's front matter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    description: Option<String>,
}

impl FrontMatter {
    /// The declared page title.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// The declared page description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Splits a content file into its front matter and Markdown body.
///
/// A file without a leading `---` line has default front matter and is
/// returned whole as the body.
///
/// # Errors
///
/// Returns [`FrontMatterError`] if the block is never closed or is not valid
/// YAML for [`FrontMatter`].
///
/// # Examples
///
/// ```
/// # use quire_core::front_matter::split_front_matter;
/// let (meta, body) = split_front_matter("---\ntitle: Overview\n---\n# Hi\n").unwrap();
/// assert_eq!(meta.title(), Some("Overview"));
/// assert_eq!(body, "# Hi\n");
/// ```
pub fn split_front_matter(text: &str) -> Result<(FrontMatter, &str), FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let Some(rest) = strip_delimiter_line(text) else {
        return Ok((FrontMatter::default(), text));
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            let front_matter = if yaml.trim().is_empty() {
                FrontMatter::default()
            } else {
                serde_yaml_ng::from_str(yaml)?
            };
            return Ok((front_matter, body));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated)
}

/// Strips a leading `---` line, returning the remainder.
fn strip_delimiter_line(text: &str) -> Option<&str> {
    let rest = text.strip_prefix(DELIMITER)?;
    let rest = rest.trim_start_matches([' ', '\t']);
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}
