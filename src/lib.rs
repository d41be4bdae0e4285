//! # sitebind
//!
//! A library for binding the rendered pages of a static documentation site
//! into one continuous, print-ready document.
//!
//! ## Features
//!
//! - Linearizes a multi-page navigation tree into a single ordered document
//! - Rewrites every id and cross-page link so in-document navigation survives
//! - Synthesizes chapter wrappers, a cover page, and a table of contents
//! - Per-page opt-out (`pdf: false`) and chapter flattening (`pdf_chapter: false`)
//! - Renders the result through an external typesetter (WeasyPrint by default)
//!
//! ## Quick Start
//!
//! ```no_run
//! use sitebind::{Config, Generator, NavItem, Page, SiteMeta};
//!
//! let site = SiteMeta {
//!     site_name: "My Project".to_string(),
//!     site_dir: "site".into(),
//!     ..Default::default()
//! };
//! let mut generator = Generator::new(Config::default(), site).unwrap();
//!
//! // The host site generator provides the navigation tree up front...
//! let page = Page::new("Home", "index.html").with_src_path("index.md");
//! generator.add_nav(vec![NavItem::page(page.clone())]);
//!
//! // ...then feeds each page's rendered markup as it is produced.
//! let rendered = "<article><h1 id=\"home\">Home</h1></article>";
//! generator.add_article(rendered, &page, "file:///site/index.html");
//!
//! // Finally the combined document is assembled and typeset.
//! generator.write().unwrap();
//! ```
//!
//! The [`Generator`] is the run-scoped entry point. Pages arrive in whatever
//! order the host renders them; the document order is fixed ahead of time
//! from the navigation tree, so ingestion order never matters.

pub mod config;
pub mod error;
pub mod generator;
pub mod html;
pub mod links;
pub mod nav;
pub mod render;
pub mod transform;

mod toc;

pub use config::{Config, SiteMeta, TocPosition};
pub use error::{Error, Result};
pub use generator::Generator;
pub use nav::{Link, NavItem, OutlineEntry, Page, PageMeta, Section};
pub use render::{Typesetter, WeasyPrint};
