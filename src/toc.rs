//! Table-of-contents builder.
//!
//! Walks the navigation tree a second time, mirroring the assembler's
//! inclusion decisions, and produces a nested outline whose links resolve to
//! the namespaced in-document anchors assigned by the combine transform.
//!
//! Sections whose chapter wrapper was deleted (`pdf_chapter: false` on their
//! index page) get no heading of their own; their pages' entries are
//! flattened into the enclosing list.

use std::collections::{HashMap, HashSet};

use markup5ever_rcdom::Handle;

use crate::html;
use crate::nav::{NavItem, OutlineEntry, Page, Section};
use crate::transform;

pub(crate) struct TocBuilder<'a> {
    toc: Handle,
    base_urls: &'a HashMap<String, String>,
    skipped_sections: &'a HashSet<String>,
}

/// Build the `article#contents` node for the combined document.
pub(crate) fn build_toc(
    nav: &[NavItem],
    base_urls: &HashMap<String, String>,
    skipped_sections: &HashSet<String>,
    toc_title: &str,
) -> Handle {
    let toc = html::new_element("article", &[("id", "contents")]);
    let title = html::new_element("h1", &[("id", "toc-title")]);
    html::append_child(&title, html::new_text(toc_title));
    html::append_child(&toc, title);

    let builder = TocBuilder {
        toc,
        base_urls,
        skipped_sections,
    };
    builder.build(nav)
}

impl<'a> TocBuilder<'a> {
    fn build(self, nav: &[NavItem]) -> Handle {
        for item in nav {
            match item {
                NavItem::Page(page) => {
                    if !page.is_included() {
                        continue;
                    }
                    self.append_heading(&page.title);
                    let list = self.toc_for_top_page(page);
                    html::append_child(&self.toc, list);
                }
                NavItem::Section(section) => {
                    self.append_heading(&section.title);
                    self.toc_for_section(section);
                }
                // No TOC for external links.
                NavItem::Link(_) => {}
            }
        }
        self.toc
    }

    fn append_heading(&self, title: &str) {
        let h3 = html::new_element("h3", &[]);
        html::append_child(&h3, html::new_text(title));
        html::append_child(&self.toc, h3);
    }

    fn toc_for_section(&self, section: &Section) {
        if section.children.is_empty() {
            return;
        }
        let flattened = self.skipped_sections.contains(&section.title);
        let mut section_list: Option<Handle> = None;

        for child in &section.children {
            match child {
                NavItem::Section(sub) => {
                    if !self.skipped_sections.contains(&sub.title) {
                        self.append_heading(&sub.title);
                    }
                    self.toc_for_section(sub);
                }
                NavItem::Link(_) => {}
                NavItem::Page(page) if !page.is_included() => {}
                NavItem::Page(page) if page.is_index() && !flattened => {
                    // The index page is the section's landing content; its
                    // entries merge directly into the section's list.
                    if let Some(menu) = self.toc_for_index(page) {
                        section_list = first_descendant(&menu, "ul");
                        html::append_child(&self.toc, menu);
                    }
                }
                NavItem::Page(page) if flattened => {
                    let items = self.toc_items_for_subpage(page);
                    if !items.is_empty() {
                        let list = section_list.get_or_insert_with(|| {
                            let ul = html::new_element("ul", &[]);
                            html::append_child(&self.toc, ul.clone());
                            ul
                        });
                        for item in items {
                            html::append_child(list, item);
                        }
                    }
                }
                NavItem::Page(page) => {
                    let wrapper = html::new_element("div", &[]);
                    if let Some(menu) = self.toc_for_page(page) {
                        html::append_child(&wrapper, menu);
                    }
                    html::append_child(&self.toc, wrapper);
                }
            }
        }
    }

    /// Outline list for a top-level page: a flat-ish `ul` without a page
    /// title header (the page already got its `h3`).
    fn toc_for_top_page(&self, page: &Page) -> Handle {
        let wrapper = html::new_element("div", &[]);
        let menu = html::new_element("ul", &[]);
        for entry in &page.outline {
            html::append_child(&menu, link_item(entry));
            if !entry.children.is_empty() {
                html::append_child(&menu, nested_list(&entry.children));
            }
        }
        html::append_child(&wrapper, menu.clone());
        self.rewrite_links(&wrapper, &page.url);
        let menu = first_descendant(&wrapper, "ul").unwrap_or(menu);
        html::detach(&menu);
        menu
    }

    /// Outline for an ordinary page in a section: page title as a sub-heading
    /// followed by its nested outline list.
    fn toc_for_page(&self, page: &Page) -> Option<Handle> {
        let wrapper = html::new_element("div", &[]);
        let menu = html::new_element("div", &[]);
        html::append_child(&menu, page_title_link(&page.title));

        let list = html::new_element("ul", &[]);
        for entry in &page.outline {
            if entry.title == page.title {
                // The entry duplicating the page title carries no link of its
                // own; only its children appear.
                let container = html::new_element("div", &[]);
                if !entry.children.is_empty() {
                    html::append_child(&container, nested_list(&entry.children));
                }
                html::append_child(&list, container);
            } else {
                let li = link_item(entry);
                if !entry.children.is_empty() {
                    html::append_child(&li, nested_list(&entry.children));
                }
                html::append_child(&list, li);
            }
        }
        if !page.outline.is_empty() {
            html::append_child(&menu, list);
        }

        html::append_child(&wrapper, menu);
        self.rewrite_links(&wrapper, &page.url);
        let menu = first_descendant(&wrapper, "div")?;
        html::detach(&menu);
        Some(menu)
    }

    /// Outline for an index page: the entry matching the page title is
    /// flattened one level so the section list starts with the index page's
    /// own sections.
    fn toc_for_index(&self, page: &Page) -> Option<Handle> {
        let wrapper = html::new_element("div", &[]);
        let menu = html::new_element("div", &[]);
        html::append_child(&menu, page_title_link(&page.title));

        let list = html::new_element("ul", &[]);
        for entry in &page.outline {
            if entry.title == page.title {
                for sub in &entry.children {
                    let li = link_item(sub);
                    if !sub.children.is_empty() {
                        html::append_child(&li, nested_list(&sub.children));
                    }
                    html::append_child(&list, li);
                }
                continue;
            }
            let li = link_item(entry);
            if !entry.children.is_empty() {
                html::append_child(&li, nested_list(&entry.children));
            }
            html::append_child(&list, li);
        }
        if !list.children.borrow().is_empty() {
            html::append_child(&menu, list);
        }

        html::append_child(&wrapper, menu);
        self.rewrite_links(&wrapper, &page.url);
        let menu = first_descendant(&wrapper, "div")?;
        html::detach(&menu);
        Some(menu)
    }

    /// Bare list items for a page inside a flattened section; they are
    /// appended to the enclosing section's list without a page-title header.
    /// An entry duplicating the page title loses its own link but keeps its
    /// children.
    fn toc_items_for_subpage(&self, page: &Page) -> Vec<Handle> {
        if page.outline.is_empty() {
            return Vec::new();
        }
        let wrapper = html::new_element("div", &[]);
        let list = html::new_element("ul", &[]);
        for entry in &page.outline {
            if entry.title == page.title {
                for sub in &entry.children {
                    let li = link_item(sub);
                    if !sub.children.is_empty() {
                        html::append_child(&li, nested_list(&sub.children));
                    }
                    html::append_child(&list, li);
                }
                continue;
            }
            let li = link_item(entry);
            if !entry.children.is_empty() {
                html::append_child(&li, nested_list(&entry.children));
            }
            html::append_child(&list, li);
        }
        html::append_child(&wrapper, list);
        self.rewrite_links(&wrapper, &page.url);

        let Some(list) = first_descendant(&wrapper, "ul") else {
            return Vec::new();
        };
        let items: Vec<Handle> = list.children.borrow_mut().drain(..).collect();
        for item in &items {
            item.parent.set(None);
        }
        items
    }

    /// Run the combine transform over generated entries so their hrefs point
    /// at the namespaced in-document anchors. Missing base URLs degrade to
    /// leaving asset references relative.
    fn rewrite_links(&self, wrapper: &Handle, page_url: &str) {
        let base_url = self
            .base_urls
            .get(page_url)
            .map(String::as_str)
            .unwrap_or("");
        transform::combine(wrapper, base_url, page_url);
    }
}

fn link_item(entry: &OutlineEntry) -> Handle {
    let li = html::new_element("li", &[]);
    let a = html::new_element("a", &[("href", &entry.href)]);
    html::append_child(&a, html::new_text(&entry.title));
    html::append_child(&li, a);
    li
}

fn page_title_link(title: &str) -> Handle {
    let h4 = html::new_element("h4", &[]);
    let a = html::new_element("a", &[("href", "#")]);
    html::append_child(&a, html::new_text(title));
    html::append_child(&h4, a);
    h4
}

fn nested_list(entries: &[OutlineEntry]) -> Handle {
    let ul = html::new_element("ul", &[]);
    for entry in entries {
        let li = link_item(entry);
        if !entry.children.is_empty() {
            html::append_child(&li, nested_list(&entry.children));
        }
        html::append_child(&ul, li);
    }
    ul
}

/// First descendant with the given tag name, excluding the node itself.
fn first_descendant(handle: &Handle, name: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if let Some(found) = html::find_first_element(child, name) {
            return Some(found);
        }
    }
    None
}
