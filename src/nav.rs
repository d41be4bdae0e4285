//! Navigation tree data model.
//!
//! The surrounding site generator owns the navigation tree; sitebind reads it
//! once per run to establish ordering and nesting. A tree is a list of
//! [`NavItem`]s: leaf [`Page`]s backed by one rendered output, [`Section`]s
//! grouping children with no content of their own, and external [`Link`]s
//! which are never part of the combined document.

use serde::Deserialize;

/// A node in the navigation tree.
#[derive(Debug, Clone)]
pub enum NavItem {
    Page(Page),
    Section(Section),
    Link(Link),
}

/// A leaf navigation node backed by one authored source and one rendered output.
#[derive(Debug, Clone)]
pub struct Page {
    /// Page title as shown in navigation.
    pub title: String,
    /// Site-root-relative URL of the rendered page (e.g. `guide/setup.html`).
    /// Used as the page's stable key throughout a run.
    pub url: String,
    /// Source path of the authored file (e.g. `guide/setup.md`).
    pub src_path: String,
    /// Output path of the rendered file, relative to the site output root.
    pub dest_path: String,
    /// File stem of the source (e.g. `index`, `setup`).
    pub name: String,
    /// Per-page metadata (front matter).
    pub meta: PageMeta,
    /// The page's extracted heading outline.
    pub outline: Vec<OutlineEntry>,
}

/// An internal navigation node grouping child pages and sections.
#[derive(Debug, Clone)]
pub struct Section {
    pub title: String,
    pub children: Vec<NavItem>,
}

/// An external link in the navigation, pointing outside the site.
#[derive(Debug, Clone)]
pub struct Link {
    pub title: String,
    pub url: String,
}

/// Recognized per-page metadata keys. Unrecognized keys round-trip opaquely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageMeta {
    /// `false` excludes this page from the combined document.
    pub pdf: Option<bool>,
    /// `false` on a section's index page removes the enclosing chapter wrapper.
    pub pdf_chapter: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One entry of a page's heading outline, as extracted by the site generator.
///
/// `href` is usually a fragment reference (`#section-id`) into the page's own
/// rendered output.
#[derive(Debug, Clone)]
pub struct OutlineEntry {
    pub title: String,
    pub href: String,
    pub children: Vec<OutlineEntry>,
}

impl NavItem {
    pub fn page(page: Page) -> Self {
        NavItem::Page(page)
    }

    pub fn section(title: impl Into<String>, children: Vec<NavItem>) -> Self {
        NavItem::Section(Section {
            title: title.into(),
            children,
        })
    }

    pub fn link(title: impl Into<String>, url: impl Into<String>) -> Self {
        NavItem::Link(Link {
            title: title.into(),
            url: url.into(),
        })
    }

    /// Whether this subtree contributes at least one page to the combined
    /// document. Sections with no includable descendants produce no chapter.
    pub fn is_includable(&self) -> bool {
        match self {
            NavItem::Page(p) => p.is_included(),
            NavItem::Section(s) => s.children.iter().any(NavItem::is_includable),
            NavItem::Link(_) => false,
        }
    }
}

impl Page {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            title: title.into(),
            src_path: String::new(),
            dest_path: url.clone(),
            name: String::new(),
            url,
            meta: PageMeta::default(),
            outline: Vec::new(),
        }
    }

    pub fn with_src_path(mut self, src_path: impl Into<String>) -> Self {
        self.src_path = src_path.into();
        if self.name.is_empty() {
            self.name = file_stem(&self.src_path);
        }
        self
    }

    pub fn with_dest_path(mut self, dest_path: impl Into<String>) -> Self {
        self.dest_path = dest_path.into();
        self
    }

    pub fn with_meta(mut self, meta: PageMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_outline(mut self, outline: Vec<OutlineEntry>) -> Self {
        self.outline = outline;
        self
    }

    /// Whether the page participates in the combined document.
    /// Only an explicit `pdf: false` excludes it.
    pub fn is_included(&self) -> bool {
        self.meta.pdf != Some(false)
    }

    /// Whether this is the index/landing page of its section.
    pub fn is_index(&self) -> bool {
        self.name == "index"
    }
}

impl PageMeta {
    pub fn excluded() -> Self {
        Self {
            pdf: Some(false),
            ..Default::default()
        }
    }

    pub fn chapter_excluded() -> Self {
        Self {
            pdf_chapter: Some(false),
            ..Default::default()
        }
    }
}

impl OutlineEntry {
    pub fn new(title: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            href: href.into(),
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: OutlineEntry) -> Self {
        self.children.push(child);
        self
    }
}

fn file_stem(path: &str) -> String {
    let name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_included() {
        let page = Page::new("Setup", "guide/setup.html");
        assert!(page.is_included());
    }

    #[test]
    fn explicit_pdf_false_excludes() {
        let page = Page::new("Setup", "guide/setup.html").with_meta(PageMeta::excluded());
        assert!(!page.is_included());
    }

    #[test]
    fn index_detection_from_src_path() {
        let page = Page::new("Guide", "guide/index.html").with_src_path("guide/index.md");
        assert!(page.is_index());
        let page = Page::new("Setup", "guide/setup.html").with_src_path("guide/setup.md");
        assert!(!page.is_index());
    }

    #[test]
    fn section_includable_only_with_included_page() {
        let empty = NavItem::section("Empty", vec![NavItem::link("Ext", "https://example.com")]);
        assert!(!empty.is_includable());

        let excluded = NavItem::section(
            "Hidden",
            vec![NavItem::page(
                Page::new("A", "a.html").with_meta(PageMeta::excluded()),
            )],
        );
        assert!(!excluded.is_includable());

        let nested = NavItem::section(
            "Outer",
            vec![NavItem::section(
                "Inner",
                vec![NavItem::page(Page::new("A", "a.html"))],
            )],
        );
        assert!(nested.is_includable());
    }

    #[test]
    fn meta_deserializes_with_unknown_keys() {
        let meta: PageMeta =
            serde_json::from_str(r#"{"pdf": false, "template": "wide.html"}"#).unwrap();
        assert_eq!(meta.pdf, Some(false));
        assert_eq!(meta.pdf_chapter, None);
        assert!(meta.extra.contains_key("template"));
    }
}
