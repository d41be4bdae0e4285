//! Markup transform passes applied to each page before assembly.
//!
//! Each pass is a tree rewrite on an already-parsed fragment. During
//! combined-document ingestion the passes run in a fixed order: theme chrome
//! stripping, the combine transform, header-link stripping, heading bookmark
//! nesting, and (optionally) heading level shifting.

use std::path::Path;

use markup5ever_rcdom::Handle;
use url::Url;

use crate::html;
use crate::links;

const HEADING_NAMES: [&str; 6] = ["h1", "h2", "h3", "h4", "h5", "h6"];

/// Prepare a fragment for inclusion in the combined document.
///
/// Inserts an explicit anchor before every heading that carries an id (some
/// renderers drop heading self-anchors, the separate anchor keeps bookmark
/// targets resolvable), namespaces every id and anchor name with the page
/// URL, rewrites relative hrefs into in-document fragment references, marks
/// absolute hrefs with an `external-link` class, absolutizes asset
/// references, and sets the fragment's own id to the page's body anchor.
pub fn combine(root: &Handle, base_url: &str, page_url: &str) {
    for heading in find_headings(root) {
        if let Some(id) = html::get_attribute(&heading, "id") {
            let anchor = html::new_element("a", &[("id", &id), ("name", &id)]);
            html::insert_before(&heading, anchor);
        }
    }

    for el in html::find_elements_with_attribute(root, "id") {
        if let Some(id) = html::get_attribute(&el, "id") {
            html::set_attribute(&el, "id", &links::transform_id(&id, page_url));
        }
    }

    for anchor in html::find_elements_by_name(root, "a") {
        if let Some(name) = html::get_attribute(&anchor, "name") {
            html::set_attribute(&anchor, "name", &links::transform_id(&name, page_url));
        }
    }

    for anchor in html::find_elements_by_name(root, "a") {
        let Some(href) = html::get_attribute(&anchor, "href") else {
            continue;
        };
        if links::is_absolute_url(&href) || links::is_absolute_path(&href) {
            html::set_attribute(&anchor, "class", "external-link");
        } else {
            html::set_attribute(&anchor, "href", &links::transform_href(&href, page_url));
        }
    }

    html::set_attribute(root, "id", &links::body_anchor(page_url));
    replace_asset_hrefs(root, base_url);
}

/// Prepare a fragment for standalone export. Document-to-document hrefs are
/// rewritten to sibling output-document filenames; ids are left alone since
/// every page remains its own document.
pub fn separate(root: &Handle, base_url: &str) {
    for anchor in html::find_elements_by_name(root, "a") {
        if let Some(href) = html::get_attribute(&anchor, "href") {
            html::set_attribute(&anchor, "href", &links::rel_document_href(&href));
        }
    }
    replace_asset_hrefs(root, base_url);
}

/// Remove decorative per-page edit links added by the material theme.
pub fn strip_theme_chrome(root: &Handle) {
    for anchor in html::find_elements(root, &|h| {
        html::element_name(h).as_deref() == Some("a") && html::has_class(h, "md-content__button")
    }) {
        html::detach(&anchor);
    }
}

/// Remove inline "permalink to this heading" anchors. Headings stay reachable
/// through their namespaced ids.
pub fn strip_header_links(root: &Handle) {
    for anchor in html::find_elements(root, &|h| {
        html::element_name(h).as_deref() == Some("a") && html::has_class(h, "headerlink")
    }) {
        html::detach(&anchor);
    }
}

/// Annotate headings with a bookmark level reflecting navigational depth.
///
/// A page nested `depth` levels under sections gets its `h{L}` headings a
/// bookmark level of `L + depth`, so the document outline mirrors the
/// navigation without changing any visual tag.
pub fn nest_heading_bookmarks(root: &Handle, depth: usize) {
    if depth == 0 {
        return;
    }
    for level in (1..=6usize).rev() {
        for heading in html::find_elements_by_name(root, HEADING_NAMES[level - 1]) {
            html::set_attribute(
                &heading,
                "style",
                &format!("bookmark-level:{}", level + depth),
            );
        }
    }
}

/// Structurally rename heading tags `h{L}` to `h{min(L + shift, 6)}`.
///
/// Levels are processed from deepest to shallowest so a tag just renamed is
/// never shifted twice.
pub fn shift_heading_levels(root: &Handle, shift: usize) {
    if shift == 0 {
        return;
    }
    for level in (1..=6usize).rev() {
        let new_level = (level + shift).min(6);
        if new_level == level {
            continue;
        }
        for heading in html::find_elements_by_name(root, HEADING_NAMES[level - 1]) {
            html::rename_element(&heading, HEADING_NAMES[new_level - 1]);
        }
    }
}

/// Make all relative asset references absolute against the page's base URL.
/// SVG sources are swapped for a pre-converted PNG sibling when one exists.
pub fn replace_asset_hrefs(root: &Handle, base_url: &str) {
    for link in html::find_elements_by_name(root, "link") {
        if let Some(href) = html::get_attribute(&link, "href") {
            html::set_attribute(&link, "href", &links::abs_asset_href(&href, base_url));
        }
    }

    for asset in html::find_elements_with_attribute(root, "src") {
        if let Some(src) = html::get_attribute(&asset, "src") {
            let src = svg_fallback(&src, base_url);
            html::set_attribute(&asset, "src", &links::abs_asset_href(&src, base_url));
        }
    }
}

/// Substitute `image.svg` with `_svg_to_png/image.png` when the converted
/// file exists next to the page. Typesetting engines with partial SVG support
/// rely on this escape hatch; the SVG is kept when no conversion exists.
fn svg_fallback(src: &str, base_url: &str) -> String {
    if !src.to_ascii_lowercase().ends_with(".svg") {
        return src.to_string();
    }

    let (dir, file) = match src.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, src),
    };
    let png_name = format!("{}.png", &file[..file.len() - 4]);
    let png_src = match dir {
        Some(dir) => format!("{dir}/_svg_to_png/{png_name}"),
        None => format!("_svg_to_png/{png_name}"),
    };

    if converted_png_exists(&png_src, base_url) {
        png_src
    } else {
        src.to_string()
    }
}

fn converted_png_exists(png_src: &str, base_url: &str) -> bool {
    let Ok(base) = Url::parse(base_url) else {
        return false;
    };
    if base.scheme() != "file" {
        return false;
    }
    let Ok(joined) = base.join(png_src) else {
        return false;
    };
    joined
        .to_file_path()
        .is_ok_and(|path| Path::new(&path).exists())
}

fn find_headings(root: &Handle) -> Vec<Handle> {
    html::find_elements(root, &|h| {
        html::element_name(h).is_some_and(|name| HEADING_NAMES.contains(&name.as_str()))
    })
}
