//! Run configuration and site metadata.
//!
//! Both structs derive `Deserialize` with defaults so a host can pull them
//! straight out of its own configuration file. Validation that requires
//! touching the filesystem (the custom stylesheet) happens in
//! [`Generator::new`](crate::generator::Generator::new), before any page is
//! ingested.

use std::path::PathBuf;

use serde::Deserialize;

/// Where the table of contents is placed relative to the body content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TocPosition {
    /// Before the first article.
    #[default]
    Pre,
    /// After the last article.
    Post,
    /// No table of contents.
    #[serde(alias = "none")]
    Disabled,
}

/// Options controlling one document-assembly run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output path of the document, relative to the site output root.
    pub output_path: String,
    /// Custom stylesheet path. Fatal at construction time if it does not exist.
    pub design: Option<PathBuf>,
    /// Document author; falls back to the site author.
    pub author: Option<String>,
    /// Heading text of the generated table of contents.
    pub toc_title: String,
    pub toc_position: TocPosition,
    /// Also persist the pre-render combined markup next to the document.
    pub export_combined_html: bool,
    /// Structurally shift heading tags by each page's nesting depth.
    pub heading_shift: bool,
    /// Keep the body content of an index page that removed its chapter
    /// wrapper via `pdf_chapter: false`. Off by default: the index page is
    /// absorbed by the flattening and dropped from the document.
    pub keep_flattened_index: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: "pdf/combined.pdf".to_string(),
            design: None,
            author: None,
            toc_title: "Table of Contents".to_string(),
            toc_position: TocPosition::default(),
            export_combined_html: false,
            heading_shift: false,
            keep_flattened_index: false,
        }
    }
}

/// Global site metadata, owned by the surrounding site generator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteMeta {
    pub site_name: String,
    pub site_author: Option<String>,
    pub site_description: Option<String>,
    /// Root directory the site is rendered into.
    pub site_dir: PathBuf,
    /// Theme identifier; decides whether theme-chrome stripping applies.
    pub theme: String,
    /// Copyright text template. `@YYYY` is replaced with the current year.
    pub copyright: Option<String>,
}
