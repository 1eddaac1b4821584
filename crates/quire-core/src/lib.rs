//! Quire Core Types and Definitions
//!
//! This crate provides the content model shared by every Quire crate:
//!
//! - **Slugs**: Ordered path segments identifying a page ([`slug::Slug`])
//! - **Documents**: A content page with title, table of contents and body
//!   ([`document::Document`])
//! - **Table of contents**: Heading anchors and TOC extraction ([`toc`] module)
//! - **Front matter**: The YAML header of a content file ([`front_matter`] module)

pub mod document;
pub mod front_matter;
pub mod slug;
pub mod toc;

pub use document::Document;
pub use slug::Slug;
pub use toc::{Slugger, TocEntry};
