//! Document assembler.
//!
//! One [`Generator`] drives one run: it walks the navigation tree to fix the
//! document order and nesting depths, ingests one transformed article per
//! rendered page, and finally assembles cover, table of contents, and body
//! into a single document handed to the typesetting engine.
//!
//! Ingestion order is whatever order the site generator renders pages in,
//! which is why the order is computed separately and ahead of ingestion. One
//! exclusion decision is retroactive: an index page carrying
//! `pdf_chapter: false` deletes the chapter wrapper that was synthesized for
//! its section during ordering.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};
use log::{debug, info, warn};
use markup5ever_rcdom::{Handle, RcDom};
use uuid::Uuid;

use crate::config::{Config, SiteMeta, TocPosition};
use crate::error::{Error, Result};
use crate::html;
use crate::nav::{NavItem, Page};
use crate::render::{Typesetter, WeasyPrint};
use crate::toc;
use crate::transform;

/// Stylesheet applied to the combined document when no custom design is
/// configured.
const DEFAULT_STYLESHEET: &str = include_str!("design/report.css");

const DOCUMENT_SKELETON: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

enum Stylesheet {
    Bundled,
    Custom(PathBuf),
}

/// Assembles the pages of one site-generation run into a single document.
pub struct Generator {
    config: Config,
    site: SiteMeta,
    stylesheet: Stylesheet,
    copyright: Option<String>,
    typesetter: Box<dyn Typesetter>,
    nav: Vec<NavItem>,
    /// Cleared on the first fatal content failure; all later calls no-op.
    generate: bool,
    articles: HashMap<String, Handle>,
    page_order: Vec<String>,
    page_nesting: HashMap<String, usize>,
    base_urls: HashMap<String, String>,
    /// Index page source path → (chapter id, section title). Needed because
    /// an index page's metadata can retroactively delete its parent chapter.
    index_to_chapter: HashMap<String, (String, String)>,
    /// Section titles whose chapter wrapper was deleted; the TOC builder
    /// flattens these.
    skipped_sections: HashSet<String>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator").finish_non_exhaustive()
    }
}

impl Generator {
    /// Create a generator for one run.
    ///
    /// Fails fast when the configured custom stylesheet does not exist, before
    /// any ingestion work happens.
    pub fn new(config: Config, site: SiteMeta) -> Result<Self> {
        let stylesheet = match &config.design {
            Some(path) => {
                if !path.is_file() {
                    return Err(Error::MissingStylesheet(path.clone()));
                }
                Stylesheet::Custom(fs::canonicalize(path)?)
            }
            None => Stylesheet::Bundled,
        };

        let year = Local::now().year().to_string();
        let copyright = site
            .copyright
            .as_ref()
            .map(|template| template.replace("@YYYY", &year));

        Ok(Self {
            config,
            site,
            stylesheet,
            copyright,
            typesetter: Box::new(WeasyPrint::default()),
            nav: Vec::new(),
            generate: true,
            articles: HashMap::new(),
            page_order: Vec::new(),
            page_nesting: HashMap::new(),
            base_urls: HashMap::new(),
            index_to_chapter: HashMap::new(),
            skipped_sections: HashSet::new(),
        })
    }

    /// Replace the typesetting engine. Used by hosts with their own renderer
    /// and by tests.
    pub fn with_typesetter(mut self, typesetter: Box<dyn Typesetter>) -> Self {
        self.typesetter = typesetter;
        self
    }

    /// Consume the navigation tree once, establishing document order, nesting
    /// depths, chapter wrappers, and index-to-chapter tracking.
    pub fn add_nav(&mut self, nav: Vec<NavItem>) {
        for item in &nav {
            self.add_to_order(item, 1);
        }
        self.nav = nav;
    }

    fn add_to_order(&mut self, item: &NavItem, level: usize) {
        match item {
            NavItem::Page(page) => {
                if !page.is_included() {
                    return;
                }
                self.page_nesting.insert(page.url.clone(), level - 1);
                self.page_order.push(page.url.clone());
            }
            NavItem::Section(section) => {
                if !section.children.iter().any(NavItem::is_includable) {
                    debug!("section '{}' has no includable pages", section.title);
                    return;
                }

                let chapter_id = Uuid::new_v4().to_string();
                self.page_order.push(chapter_id.clone());
                self.articles.insert(
                    chapter_id.clone(),
                    chapter_article(&chapter_id, &section.title, level),
                );

                // Only the first index-like child maps to this chapter.
                let index = section.children.iter().find_map(|child| match child {
                    NavItem::Page(page) if page.is_index() => Some(page),
                    _ => None,
                });
                if let Some(index) = index {
                    debug!(
                        "tracked chapter mapping: {} -> {} ('{}')",
                        index.src_path, chapter_id, section.title
                    );
                    self.index_to_chapter.insert(
                        index.src_path.clone(),
                        (chapter_id, section.title.clone()),
                    );
                }

                for child in &section.children {
                    self.add_to_order(child, level + 1);
                }
            }
            NavItem::Link(_) => {}
        }
    }

    /// Ingest one rendered page.
    ///
    /// Returns the relative path from the page's output location to the
    /// combined document, for the host to link to, or `None` when generation
    /// is (or just became) disabled.
    pub fn add_article(&mut self, content: &str, page: &Page, base_url: &str) -> Option<String> {
        if !self.generate {
            return None;
        }
        self.base_urls
            .insert(page.url.clone(), base_url.to_string());

        let dom = html::parse_html(content);
        let Some(article) = extract_article(&dom) else {
            warn!(
                "no content container found in '{}'; document generation disabled",
                page.src_path
            );
            self.generate = false;
            return None;
        };
        html::detach(&article);

        if self.site.theme == "material" {
            transform::strip_theme_chrome(&article);
        }
        transform::combine(&article, base_url, &page.url);
        transform::strip_header_links(&article);

        let nesting = self.page_nesting.get(&page.url).copied().unwrap_or(0);
        transform::nest_heading_bookmarks(&article, nesting);
        if self.config.heading_shift {
            // Non-index pages sit one level below their section's landing page.
            let shift = nesting + usize::from(!page.is_index());
            debug!(
                "heading shift for {}: nesting={nesting} shift={shift}",
                page.src_path
            );
            transform::shift_heading_levels(&article, shift);
        }

        if !page.is_included() {
            return Some(self.path_to_document(&page.dest_path));
        }

        if page.meta.pdf_chapter == Some(false) {
            if let Some((chapter_id, section_title)) =
                self.index_to_chapter.get(&page.src_path).cloned()
            {
                info!(
                    "removing chapter {chapter_id} for {} (section '{section_title}')",
                    page.src_path
                );
                self.articles.remove(&chapter_id);
                self.page_order.retain(|key| key != &chapter_id);
                self.skipped_sections.insert(section_title);
                if !self.config.keep_flattened_index {
                    // The index page is absorbed by the flattening.
                    self.page_order.retain(|key| key != &page.url);
                    return Some(self.path_to_document(&page.dest_path));
                }
            } else {
                debug!("no chapter mapping found for {}", page.src_path);
            }
        }

        self.articles.insert(page.url.clone(), article);
        Some(self.path_to_document(&page.dest_path))
    }

    /// Assemble and render the combined document.
    ///
    /// Returns the written document path, or `Ok(None)` when generation was
    /// disabled by an earlier content failure.
    pub fn write(&mut self) -> Result<Option<PathBuf>> {
        if !self.generate {
            warn!("combined document generation is disabled, nothing written");
            return Ok(None);
        }

        let markup = self.combined_html();
        let document_path = self.site.site_dir.join(&self.config.output_path);
        if let Some(parent) = document_path.parent() {
            fs::create_dir_all(parent)?;
        }

        if self.config.export_combined_html {
            let markup_path = PathBuf::from(format!("{}.html", document_path.display()));
            fs::write(&markup_path, &markup)?;
            debug!("combined markup persisted to {}", markup_path.display());
        }

        self.typesetter.render(&markup, &document_path)?;
        info!("combined document written to {}", document_path.display());
        Ok(Some(document_path))
    }

    /// Serialize the fully assembled document markup.
    pub fn combined_html(&self) -> String {
        html::serialize_document(&self.assemble_document())
    }

    fn assemble_document(&self) -> RcDom {
        let dom = html::parse_html(DOCUMENT_SKELETON);
        let head = html::find_first_element(&dom.document, "head").expect("skeleton has head");
        let body = html::find_first_element(&dom.document, "body").expect("skeleton has body");

        self.populate_head(&head);
        html::append_child(&body, self.cover());

        if self.config.toc_position == TocPosition::Pre {
            html::append_child(&body, self.build_toc());
        }
        for key in &self.page_order {
            if let Some(article) = self.articles.get(key) {
                html::append_child(&body, article.clone());
            }
        }
        if self.config.toc_position == TocPosition::Post {
            html::append_child(&body, self.build_toc());
        }

        dom
    }

    fn build_toc(&self) -> Handle {
        toc::build_toc(
            &self.nav,
            &self.base_urls,
            &self.skipped_sections,
            &self.config.toc_title,
        )
    }

    fn populate_head(&self, head: &Handle) {
        let title = html::new_element("title", &[]);
        html::append_child(&title, html::new_text(&self.site.site_name));
        html::append_child(head, title);

        let author = self.config.author.as_ref().or(self.site.site_author.as_ref());
        if let Some(author) = author {
            html::append_child(
                head,
                html::new_element("meta", &[("name", "author"), ("content", author)]),
            );
        }
        if let Some(description) = &self.site.site_description {
            html::append_child(
                head,
                html::new_element("meta", &[("name", "description"), ("content", description)]),
            );
        }

        match &self.stylesheet {
            Stylesheet::Custom(path) => {
                if let Ok(href) = url::Url::from_file_path(path) {
                    html::append_child(
                        head,
                        html::new_element(
                            "link",
                            &[
                                ("rel", "stylesheet"),
                                ("href", href.as_str()),
                                ("type", "text/css"),
                            ],
                        ),
                    );
                }
            }
            Stylesheet::Bundled => {
                let style = html::new_element("style", &[]);
                html::append_child(&style, html::new_text(DEFAULT_STYLESHEET));
                html::append_child(head, style);
            }
        }
    }

    fn cover(&self) -> Handle {
        let cover = html::new_element("article", &[("id", "doc-cover")]);
        let title = html::new_element("h1", &[("id", "doc-title")]);
        html::append_child(&title, html::new_text(&self.site.site_name));
        html::append_child(&cover, title);

        let address = html::new_element("address", &[]);
        let author = self.config.author.as_ref().or(self.site.site_author.as_ref());
        if let Some(author) = author {
            let p = html::new_element("p", &[("class", "author")]);
            html::append_child(&p, html::new_text(author));
            html::append_child(&address, p);
        }
        if let Some(description) = &self.site.site_description {
            let p = html::new_element("p", &[("class", "description")]);
            html::append_child(&p, html::new_text(description));
            html::append_child(&address, p);
        }
        if let Some(copyright) = &self.copyright {
            let p = html::new_element("p", &[("class", "copyright")]);
            html::append_child(&p, html::new_text(copyright));
            html::append_child(&address, p);
        }
        let produced = html::new_element("p", &[("class", "produced")]);
        let date = Local::now().format("%B %e, %Y");
        html::append_child(&produced, html::new_text(&format!("Generated {date}")));
        html::append_child(&address, produced);

        html::append_child(&cover, address);
        cover
    }

    /// Relative path from a page's output location to the combined document.
    fn path_to_document(&self, dest_path: &str) -> String {
        let from = Path::new(dest_path).parent().unwrap_or(Path::new(""));
        pathdiff::diff_paths(Path::new(&self.config.output_path), from)
            .map(|path| path.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|| self.config.output_path.clone())
    }

    /// Whether generation is still enabled for this run.
    pub fn is_enabled(&self) -> bool {
        self.generate
    }

    /// The computed document order: chapter ids interleaved with page URLs.
    pub fn document_order(&self) -> &[String] {
        &self.page_order
    }

    /// Whether an article (page or chapter) is currently held for a key.
    pub fn has_article(&self, key: &str) -> bool {
        self.articles.contains_key(key)
    }

    /// Recorded nesting depth for a page URL.
    pub fn nesting_depth(&self, url: &str) -> Option<usize> {
        self.page_nesting.get(url).copied()
    }
}

/// Synthesize the wrapper article representing a section in the combined
/// document.
fn chapter_article(chapter_id: &str, title: &str, level: usize) -> Handle {
    let heading = html::new_element(
        "h1",
        &[
            ("id", &format!("{chapter_id}-title")),
            ("class", "section_title"),
            ("style", &format!("bookmark-level:{level}")),
        ],
    );
    html::append_child(&heading, html::new_text(title));

    let article = html::new_element("article", &[("id", chapter_id), ("class", "chapter")]);
    html::append_child(&article, heading);
    article
}

/// Locate the page's content node: a rendered `<article>`, or a main-content
/// `<div role="main">` freshly wrapped into one.
fn extract_article(dom: &RcDom) -> Option<Handle> {
    if let Some(article) = html::find_first_element(&dom.document, "article") {
        return Some(article);
    }

    let main = html::find_elements(&dom.document, &|h| {
        html::element_name(h).as_deref() == Some("div")
            && html::get_attribute(h, "role").as_deref() == Some("main")
    })
    .into_iter()
    .next()?;

    html::detach(&main);
    html::remove_attribute(&main, "class");
    html::remove_attribute(&main, "role");
    let article = html::new_element("article", &[]);
    html::append_child(&article, main);
    Some(article)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nav::PageMeta;

    fn generator() -> Generator {
        Generator::new(Config::default(), SiteMeta::default()).unwrap()
    }

    fn page(title: &str, url: &str, src: &str) -> Page {
        Page::new(title, url).with_src_path(src)
    }

    #[test]
    fn ordering_records_pages_and_nesting() {
        let mut generator = generator();
        generator.add_nav(vec![
            NavItem::page(page("Home", "index.html", "index.md")),
            NavItem::section(
                "Guide",
                vec![NavItem::page(page(
                    "Setup",
                    "guide/setup.html",
                    "guide/setup.md",
                ))],
            ),
        ]);

        let order = generator.document_order();
        assert_eq!(order.len(), 3); // home + chapter + setup
        assert_eq!(order[0], "index.html");
        assert_eq!(order[2], "guide/setup.html");
        assert_eq!(generator.nesting_depth("index.html"), Some(0));
        assert_eq!(generator.nesting_depth("guide/setup.html"), Some(1));
        // The middle entry is the synthesized chapter.
        assert!(generator.has_article(&order[1]));
    }

    #[test]
    fn excluded_page_never_enters_order() {
        let mut generator = generator();
        generator.add_nav(vec![
            NavItem::page(page("Home", "index.html", "index.md")),
            NavItem::page(
                page("Hidden", "hidden.html", "hidden.md").with_meta(PageMeta::excluded()),
            ),
        ]);

        assert_eq!(generator.document_order(), ["index.html".to_string()]);
        assert_eq!(generator.nesting_depth("hidden.html"), None);
    }

    #[test]
    fn section_without_includable_pages_produces_no_chapter() {
        let mut generator = generator();
        generator.add_nav(vec![NavItem::section(
            "Hidden",
            vec![NavItem::page(
                page("A", "a.html", "a.md").with_meta(PageMeta::excluded()),
            )],
        )]);

        assert!(generator.document_order().is_empty());
    }

    #[test]
    fn excluded_page_returns_path_but_stores_nothing() {
        let mut generator = generator();
        let excluded = page("Hidden", "hidden.html", "hidden.md")
            .with_dest_path("hidden.html")
            .with_meta(PageMeta::excluded());
        generator.add_nav(vec![NavItem::page(excluded.clone())]);

        let path = generator.add_article(
            "<article><p>secret</p></article>",
            &excluded,
            "file:///site/hidden.html",
        );
        assert_eq!(path.as_deref(), Some("pdf/combined.pdf"));
        assert!(!generator.has_article("hidden.html"));
    }

    #[test]
    fn missing_content_container_disables_generation() {
        let mut generator = generator();
        let p = page("Home", "index.html", "index.md");
        generator.add_nav(vec![NavItem::page(p.clone())]);

        let result = generator.add_article("<div><p>bare markup</p></div>", &p, "file:///x");
        assert_eq!(result, None);
        assert!(!generator.is_enabled());

        // Later calls are no-ops.
        let result = generator.add_article("<article><p>fine</p></article>", &p, "file:///x");
        assert_eq!(result, None);
        assert!(generator.write().unwrap().is_none());
    }

    #[test]
    fn main_role_div_is_wrapped_into_article() {
        let mut generator = generator();
        let p = page("Home", "index.html", "index.md");
        generator.add_nav(vec![NavItem::page(p.clone())]);

        generator.add_article(
            r#"<div class="wrap" role="main"><h1 id="t">Home</h1></div>"#,
            &p,
            "file:///site/index.html",
        );
        assert!(generator.has_article("index.html"));

        let markup = generator.combined_html();
        assert!(!markup.contains("role=\"main\""));
        assert!(markup.contains(r#"id="index.html:t""#));
    }

    #[test]
    fn chapter_exclusion_removes_wrapper_and_index() {
        let mut generator = generator();
        let index = page("Guide", "guide/index.html", "guide/index.md")
            .with_meta(PageMeta::chapter_excluded());
        let setup = page("Setup", "guide/setup.html", "guide/setup.md");
        generator.add_nav(vec![NavItem::section(
            "Guide",
            vec![NavItem::page(index.clone()), NavItem::page(setup.clone())],
        )]);

        let chapter_id = generator.document_order()[0].clone();
        assert!(generator.has_article(&chapter_id));

        generator.add_article(
            "<article><h1 id=\"g\">Guide</h1></article>",
            &index,
            "file:///site/guide/index.html",
        );
        generator.add_article(
            "<article><h1 id=\"s\">Setup</h1></article>",
            &setup,
            "file:///site/guide/setup.html",
        );

        assert_eq!(generator.document_order(), ["guide/setup.html".to_string()]);
        assert!(!generator.has_article(&chapter_id));
        assert!(!generator.has_article("guide/index.html"));
        assert!(generator.has_article("guide/setup.html"));
    }

    #[test]
    fn chapter_exclusion_keeps_index_when_configured() {
        let config = Config {
            keep_flattened_index: true,
            ..Config::default()
        };
        let mut generator = Generator::new(config, SiteMeta::default()).unwrap();
        let index = page("Guide", "guide/index.html", "guide/index.md")
            .with_meta(PageMeta::chapter_excluded());
        generator.add_nav(vec![NavItem::section(
            "Guide",
            vec![NavItem::page(index.clone())],
        )]);

        generator.add_article(
            "<article><h1 id=\"g\">Guide</h1></article>",
            &index,
            "file:///site/guide/index.html",
        );

        assert_eq!(
            generator.document_order(),
            ["guide/index.html".to_string()]
        );
        assert!(generator.has_article("guide/index.html"));
    }

    #[test]
    fn missing_custom_stylesheet_is_fatal() {
        let config = Config {
            design: Some(PathBuf::from("/nonexistent/custom.css")),
            ..Config::default()
        };
        let err = Generator::new(config, SiteMeta::default()).unwrap_err();
        assert!(matches!(err, Error::MissingStylesheet(_)));
    }

    #[test]
    fn path_to_document_is_relative_to_page_output() {
        let mut generator = generator();
        let p = page("Deep", "a/b/deep.html", "a/b/deep.md").with_dest_path("a/b/deep.html");
        generator.add_nav(vec![NavItem::page(p.clone())]);

        let path = generator.add_article(
            "<article><p>x</p></article>",
            &p,
            "file:///site/a/b/deep.html",
        );
        assert_eq!(path.as_deref(), Some("../../pdf/combined.pdf"));
    }
}
