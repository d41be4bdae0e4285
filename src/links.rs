//! Href and id normalization.
//!
//! Pure classification and rewriting of references found in rendered pages.
//! Once pages are concatenated into one document, every internal reference
//! must resolve inside that document; ids are namespaced with the owning
//! page's URL so identical heading ids on different pages never collide.
//!
//! The namespacing format is `"{page_url}:{id}"`. A page's root anchor is the
//! degenerate case with an empty id part, `"{page_url}:"`.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

/// File extensions that are downloads or images, not rendered pages.
const NON_DOC_EXTENSIONS: &[&str] = &[
    ".xls", ".xlsx", ".pdf", ".doc", ".docx", ".zip", ".png", ".jpg", ".jpeg", ".gif", ".svg",
];

/// Characters (beyond non-ASCII, which is always encoded) escaped when
/// converting an IRI to a URI.
const IRI_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'|')
    .add(b'\\')
    .add(b'^');

/// What a reference points at, for rewriting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// Scheme-qualified URL or absolute filesystem path. Never rewritten.
    External,
    /// Relative reference to a non-document asset (image, archive, office
    /// file). Absolutized, but never turned into a document reference.
    Asset,
    /// Relative reference into the documentation tree, including
    /// fragment-only references to the current page.
    Document,
}

/// Classify a reference.
///
/// The query string and fragment are ignored when inspecting the extension.
pub fn classify(href: &str) -> RefKind {
    if is_absolute_url(href) || is_absolute_path(href) {
        return RefKind::External;
    }

    let path = href
        .split(['#', '?'])
        .next()
        .unwrap_or(href)
        .to_ascii_lowercase();
    if NON_DOC_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
        return RefKind::Asset;
    }

    RefKind::Document
}

/// Whether the reference points at another rendered page of this site.
pub fn is_doc(href: &str) -> bool {
    classify(href) == RefKind::Document
}

/// Whether the reference carries a scheme (`https:`, `mailto:`, `file:`, ...).
pub fn is_absolute_url(href: &str) -> bool {
    Url::parse(href).is_ok()
}

/// Whether the reference is an absolute filesystem path, POSIX or Windows.
pub fn is_absolute_path(href: &str) -> bool {
    if href.starts_with('/') || href.starts_with('\\') {
        return true;
    }
    let bytes = href.as_bytes();
    bytes.len() >= 2
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes.get(2), None | Some(b'/') | Some(b'\\'))
}

/// Rewrite a document reference to point at the sibling output document.
///
/// `guide/setup.html` becomes `guide/setup.pdf`. Fragment-only, external, and
/// asset references pass through unchanged; query strings and fragments are
/// preserved. Used only in separate-documents mode.
pub fn rel_document_href(href: &str) -> String {
    if href.starts_with('#') || !is_doc(href) {
        return href.to_string();
    }

    let split_at = href.find(['?', '#']).unwrap_or(href.len());
    let (path, suffix) = href.split_at(split_at);

    let (dir, file) = match path.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, path),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };

    let rewritten = match dir {
        Some(dir) => format!("{dir}/{stem}.pdf"),
        None => format!("{stem}.pdf"),
    };
    format!("{}{suffix}", iri_to_uri(&rewritten))
}

/// Resolve a relative asset or document reference against the page's base
/// URL. Already-absolute references are left untouched.
pub fn abs_asset_href(href: &str, base_url: &str) -> String {
    if is_absolute_url(href) || is_absolute_path(href) {
        return href.to_string();
    }

    match Url::parse(base_url) {
        Ok(base) => base
            .join(href)
            .map(|joined| joined.to_string())
            .unwrap_or_else(|_| href.to_string()),
        // A relative base degrades to textual joining.
        Err(_) => iri_to_uri(&join_relative(base_url, href)),
    }
}

/// Normalize a document href to a site-root-relative key.
///
/// `../../index.html` on page `foo/bar/baz/page.html` becomes `foo/index.html`.
/// A fragment-only href resolves to the current page. Non-document references
/// pass through unchanged.
pub fn normalize_href(href: &str, page_url: &str) -> String {
    if !is_doc(href) {
        return href.to_string();
    }
    if href.starts_with('#') {
        return format!("{page_url}{href}");
    }

    let page_dir = page_url.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if page_dir.is_empty() {
        normalize_path(href)
    } else {
        normalize_path(&format!("{page_dir}/{href}"))
    }
}

/// Namespace an id with its owning page's URL.
pub fn transform_id(id: &str, page_url: &str) -> String {
    format!("{page_url}:{id}")
}

/// Deterministic root anchor for everything on a page.
pub fn body_anchor(page_url: &str) -> String {
    format!("{page_url}:")
}

/// Rewrite a same-tree href into an in-document fragment reference.
///
/// - `#section` on page `guide/a.html` → `#guide/a.html:section`
/// - `b.html#section` on page `guide/a.html` → `#guide/b.html:section`
/// - `b.html` on page `guide/a.html` → `#guide/b.html:` (the body anchor)
///
/// Non-document references pass through unchanged.
pub fn transform_href(href: &str, page_url: &str) -> String {
    if !is_doc(href) {
        return href.to_string();
    }
    if let Some(fragment) = href.strip_prefix('#') {
        return format!("#{}", transform_id(fragment, page_url));
    }

    let (path, fragment) = match href.split_once('#') {
        Some((path, fragment)) => (path, fragment),
        None => (href, ""),
    };
    let path = path.split_once('?').map(|(path, _)| path).unwrap_or(path);
    let target = normalize_href(path, page_url);
    format!("#{}", transform_id(fragment, &target))
}

/// Percent-encode an IRI into a URI, leaving ASCII URL structure intact.
fn iri_to_uri(href: &str) -> String {
    utf8_percent_encode(href, IRI_ESCAPE).to_string()
}

/// Textual join of a relative href against a relative base.
fn join_relative(base: &str, href: &str) -> String {
    let base_dir = match base.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };
    if base_dir.is_empty() {
        normalize_path(href)
    } else {
        normalize_path(&format!("{base_dir}/{href}"))
    }
}

/// Collapse `.` and `..` segments. Leading `..` segments are preserved for
/// relative paths; a trailing slash is dropped.
fn normalize_path(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            _ => parts.push(seg),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}
