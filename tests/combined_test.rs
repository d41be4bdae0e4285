//! End-to-end assembly: navigation in, rendered pages in, one combined
//! document out.

use std::path::Path;
use std::sync::{Arc, Mutex};

use sitebind::{
    Config, Generator, NavItem, OutlineEntry, Page, PageMeta, Result, SiteMeta, TocPosition,
    Typesetter,
};

/// Typesetter double: records the markup and writes a placeholder artifact.
struct Recording {
    markup: Arc<Mutex<String>>,
}

impl Typesetter for Recording {
    fn render(&self, html: &str, output: &Path) -> Result<()> {
        *self.markup.lock().unwrap() = html.to_string();
        std::fs::write(output, b"%PDF-stub")?;
        Ok(())
    }
}

fn recording() -> (Box<dyn Typesetter>, Arc<Mutex<String>>) {
    let markup = Arc::new(Mutex::new(String::new()));
    (
        Box::new(Recording {
            markup: markup.clone(),
        }),
        markup,
    )
}

fn site(dir: &Path) -> SiteMeta {
    SiteMeta {
        site_name: "Example Docs".to_string(),
        site_author: Some("Docs Team".to_string()),
        site_dir: dir.to_path_buf(),
        theme: "material".to_string(),
        copyright: Some("Copyright @YYYY Example".to_string()),
        ..Default::default()
    }
}

fn home() -> Page {
    Page::new("Home", "index.html")
        .with_src_path("index.md")
        .with_dest_path("index.html")
        .with_outline(vec![OutlineEntry::new("Welcome", "#welcome")])
}

fn guide_index() -> Page {
    Page::new("Guide", "guide/index.html")
        .with_src_path("guide/index.md")
        .with_dest_path("guide/index.html")
        .with_meta(PageMeta::chapter_excluded())
        .with_outline(vec![OutlineEntry::new("About the guide", "#about")])
}

fn guide_setup() -> Page {
    Page::new("Setup", "guide/setup.html")
        .with_src_path("guide/setup.md")
        .with_dest_path("guide/setup.html")
        .with_outline(vec![OutlineEntry::new("Install", "#install")])
}

#[test]
fn full_run_produces_combined_document() {
    let dir = tempfile::tempdir().unwrap();
    let (typesetter, markup) = recording();
    let mut generator = Generator::new(Config::default(), site(dir.path()))
        .unwrap()
        .with_typesetter(typesetter);

    let home = home();
    let setup = guide_setup();
    generator.add_nav(vec![
        NavItem::page(home.clone()),
        NavItem::section("Guide", vec![NavItem::page(setup.clone())]),
        NavItem::link("Forum", "https://forum.example.com"),
    ]);

    // Ingestion order differs from document order on purpose.
    let path = generator.add_article(
        concat!(
            "<article>",
            "<h1 id=\"setup\">Setup</h1>",
            "<h2 id=\"install\">Install</h2>",
            "<a href=\"../index.html#welcome\">back home</a>",
            "<a href=\"https://forum.example.com\">forum</a>",
            "</article>"
        ),
        &setup,
        "file:///site/guide/setup.html",
    );
    assert_eq!(path.as_deref(), Some("../pdf/combined.pdf"));

    let path = generator.add_article(
        "<article><h1 id=\"welcome\">Welcome</h1></article>",
        &home,
        "file:///site/index.html",
    );
    assert_eq!(path.as_deref(), Some("pdf/combined.pdf"));

    let written = generator.write().unwrap().expect("document written");
    assert_eq!(written, dir.path().join("pdf/combined.pdf"));
    assert!(written.is_file());

    let html = markup.lock().unwrap().clone();

    // Cover and head metadata.
    assert!(html.contains("<title>Example Docs</title>"));
    assert!(html.contains(r#"<meta name="author" content="Docs Team">"#));
    assert!(html.contains(r#"id="doc-cover""#));
    assert!(!html.contains("@YYYY"));

    // Bundled stylesheet is inlined.
    assert!(html.contains("<style>"));
    assert!(html.contains("page-break-before: always"));

    // Table of contents precedes the articles and links to namespaced anchors.
    assert!(html.contains(r#"id="contents""#));
    assert!(html.contains("<h3>Guide</h3>"));
    assert!(html.contains(r##"href="#guide/setup.html:install""##));
    let toc_pos = html.find(r#"id="contents""#).unwrap();
    let setup_pos = html.find(r#"id="guide/setup.html:setup""#).unwrap();
    assert!(toc_pos < setup_pos);

    // Home precedes the Guide chapter, which precedes Setup.
    let home_pos = html.find(r#"id="index.html:welcome""#).unwrap();
    let chapter_pos = html.find(r#"class="section_title""#).unwrap();
    assert!(home_pos < chapter_pos && chapter_pos < setup_pos);

    // Cross-page link now targets the in-document anchor; external link kept.
    assert!(html.contains(r##"href="#index.html:welcome""##));
    assert!(html.contains(r#"class="external-link""#));
    assert!(html.contains(r#"href="https://forum.example.com""#));
}

#[test]
fn chapter_exclusion_flattens_section() {
    let dir = tempfile::tempdir().unwrap();
    let (typesetter, markup) = recording();
    let mut generator = Generator::new(Config::default(), site(dir.path()))
        .unwrap()
        .with_typesetter(typesetter);

    let index = guide_index();
    let setup = guide_setup();
    generator.add_nav(vec![NavItem::section(
        "Guide",
        vec![NavItem::page(index.clone()), NavItem::page(setup.clone())],
    )]);

    generator.add_article(
        "<article><h1 id=\"about\">About the guide</h1></article>",
        &index,
        "file:///site/guide/index.html",
    );
    generator.add_article(
        "<article><h1 id=\"install\">Install</h1></article>",
        &setup,
        "file:///site/guide/setup.html",
    );
    generator.write().unwrap();

    let html = markup.lock().unwrap().clone();

    // No chapter wrapper, no index content, setup content present.
    assert!(!html.contains(r#"class="section_title""#));
    assert!(!html.contains(r#"id="guide/index.html:about""#));
    assert!(html.contains(r#"id="guide/setup.html:install""#));

    // The TOC keeps the section heading but flattens the page underneath it:
    // setup's entries appear without an h4 page header.
    assert!(html.contains("<h3>Guide</h3>"));
    assert!(!html.contains(">Setup</a></h4>"));
    assert!(!html.contains(">Guide</a></h4>"));
    assert!(html.contains(r##"href="#guide/setup.html:install""##));
}

#[test]
fn excluded_page_is_linkable_but_absent() {
    let dir = tempfile::tempdir().unwrap();
    let (typesetter, markup) = recording();
    let mut generator = Generator::new(Config::default(), site(dir.path()))
        .unwrap()
        .with_typesetter(typesetter);

    let hidden = Page::new("Hidden", "hidden.html")
        .with_src_path("hidden.md")
        .with_dest_path("hidden.html")
        .with_meta(PageMeta::excluded());
    let home = home();
    generator.add_nav(vec![
        NavItem::page(home.clone()),
        NavItem::page(hidden.clone()),
    ]);

    // Excluded pages still get a return path so their rendered output can
    // link to the combined document.
    let path = generator.add_article(
        "<article><p>not included</p></article>",
        &hidden,
        "file:///site/hidden.html",
    );
    assert_eq!(path.as_deref(), Some("pdf/combined.pdf"));

    generator.add_article(
        "<article><h1 id=\"welcome\">Welcome</h1></article>",
        &home,
        "file:///site/index.html",
    );
    generator.write().unwrap();

    let html = markup.lock().unwrap().clone();
    assert!(!html.contains("not included"));
    assert!(!html.contains("Hidden"));
    assert!(html.contains(r#"id="index.html:welcome""#));
}

#[test]
fn heading_shift_and_bookmarks_follow_nesting() {
    let dir = tempfile::tempdir().unwrap();
    let (typesetter, markup) = recording();
    let config = Config {
        heading_shift: true,
        ..Config::default()
    };
    let mut generator = Generator::new(config, site(dir.path()))
        .unwrap()
        .with_typesetter(typesetter);

    let setup = guide_setup();
    generator.add_nav(vec![NavItem::section(
        "Guide",
        vec![NavItem::page(setup.clone())],
    )]);

    generator.add_article(
        "<article><h1 id=\"setup\">Setup</h1></article>",
        &setup,
        "file:///site/guide/setup.html",
    );
    generator.write().unwrap();

    let html = markup.lock().unwrap().clone();

    // Chapter heading carries its navigation level as a bookmark level.
    assert!(html.contains(r#"style="bookmark-level:1""#));
    // Setup is nested one level and is not an index page: h1 shifts to h3
    // while the bookmark annotation reflects the original level plus depth.
    assert!(html.contains(r#"<h3 id="guide/setup.html:setup" style="bookmark-level:2">"#));
}

#[test]
fn toc_position_post_and_disabled() {
    for position in [TocPosition::Post, TocPosition::Disabled] {
        let dir = tempfile::tempdir().unwrap();
        let (typesetter, markup) = recording();
        let config = Config {
            toc_position: position,
            ..Config::default()
        };
        let mut generator = Generator::new(config, site(dir.path()))
            .unwrap()
            .with_typesetter(typesetter);

        let home = home();
        generator.add_nav(vec![NavItem::page(home.clone())]);
        generator.add_article(
            "<article><h1 id=\"welcome\">Welcome</h1></article>",
            &home,
            "file:///site/index.html",
        );
        generator.write().unwrap();

        let html = markup.lock().unwrap().clone();
        match position {
            TocPosition::Post => {
                let toc_pos = html.find(r#"id="contents""#).unwrap();
                let body_pos = html.find(r#"id="index.html:welcome""#).unwrap();
                assert!(body_pos < toc_pos);
            }
            TocPosition::Disabled => assert!(!html.contains(r#"id="contents""#)),
            TocPosition::Pre => unreachable!(),
        }
    }
}

#[test]
fn combined_markup_export_is_written_alongside() {
    let dir = tempfile::tempdir().unwrap();
    let (typesetter, _) = recording();
    let config = Config {
        export_combined_html: true,
        ..Config::default()
    };
    let mut generator = Generator::new(config, site(dir.path()))
        .unwrap()
        .with_typesetter(typesetter);

    let home = home();
    generator.add_nav(vec![NavItem::page(home.clone())]);
    generator.add_article(
        "<article><h1 id=\"welcome\">Welcome</h1></article>",
        &home,
        "file:///site/index.html",
    );
    generator.write().unwrap();

    let exported = dir.path().join("pdf/combined.pdf.html");
    let markup = std::fs::read_to_string(exported).unwrap();
    assert!(markup.contains(r#"id="index.html:welcome""#));
}

#[test]
fn custom_stylesheet_is_linked_not_inlined() {
    let dir = tempfile::tempdir().unwrap();
    let css = dir.path().join("custom.css");
    std::fs::write(&css, "body { color: black; }").unwrap();

    let (typesetter, markup) = recording();
    let config = Config {
        design: Some(css),
        ..Config::default()
    };
    let mut generator = Generator::new(config, site(dir.path()))
        .unwrap()
        .with_typesetter(typesetter);

    let home = home();
    generator.add_nav(vec![NavItem::page(home.clone())]);
    generator.add_article(
        "<article><h1 id=\"welcome\">Welcome</h1></article>",
        &home,
        "file:///site/index.html",
    );
    generator.write().unwrap();

    let html = markup.lock().unwrap().clone();
    assert!(html.contains(r#"rel="stylesheet""#));
    assert!(html.contains("custom.css"));
    assert!(!html.contains("<style>"));
}
