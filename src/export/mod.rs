//! Markdown export of fetched resources.
//!
//! The document shape is fixed: YAML front matter, title, metadata section,
//! original description, kind-specific sections, and a references footer.
//! Sections are written in order to any [`std::io::Write`] sink.

mod markdown;

pub use markdown::{RenderOptions, write_document};
