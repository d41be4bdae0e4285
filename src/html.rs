//! HTML parsing and manipulation using html5ever
//!
//! Provides utilities for:
//! - Parsing rendered page markup into a mutable DOM tree
//! - Querying elements by tag, class, or attribute
//! - Constructing and rearranging elements
//! - Serializing fragments and documents back to HTML

use std::cell::RefCell;
use std::default::Default;
use std::rc::Rc;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{namespace_url, ns, Attribute, LocalName, ParseOpts, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom, SerializableHandle};

/// Parse HTML content into a DOM tree.
pub fn parse_html(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: false,
            ..Default::default()
        },
        ..Default::default()
    };

    parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes())
}

/// Serialize a whole DOM tree back to an HTML string.
pub fn serialize_document(dom: &RcDom) -> String {
    let mut bytes = Vec::new();
    let document: SerializableHandle = dom.document.clone().into();

    serialize(&mut bytes, &document, SerializeOpts::default()).expect("serialization failed");

    String::from_utf8(bytes).unwrap_or_default()
}

/// Serialize a node and its children to an HTML string.
pub fn serialize_node(handle: &Handle) -> String {
    let mut bytes = Vec::new();
    let serializable: SerializableHandle = handle.clone().into();

    let opts = SerializeOpts {
        traversal_scope: TraversalScope::IncludeNode,
        ..Default::default()
    };

    serialize(&mut bytes, &serializable, opts).expect("serialization failed");

    String::from_utf8(bytes).unwrap_or_default()
}

/// Create a new element with the given tag name and attributes.
pub fn new_element(name: &str, attrs: &[(&str, &str)]) -> Handle {
    let attrs = attrs
        .iter()
        .map(|(name, value)| Attribute {
            name: QualName::new(None, ns!(), LocalName::from(*name)),
            value: (*value).into(),
        })
        .collect();

    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(name)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// Create a new text node.
pub fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(text.into()),
    })
}

/// Get an element's local tag name.
pub fn element_name(handle: &Handle) -> Option<String> {
    if let NodeData::Element { ref name, .. } = handle.data {
        Some(name.local.as_ref().to_string())
    } else {
        None
    }
}

/// Get an attribute value from an element.
pub fn get_attribute(handle: &Handle, attr_name: &str) -> Option<String> {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        for attr in attrs.borrow().iter() {
            if attr.name.local.as_ref() == attr_name {
                return Some(attr.value.to_string());
            }
        }
    }
    None
}

/// Set an attribute on an element, replacing any existing value.
pub fn set_attribute(handle: &Handle, attr_name: &str, value: &str) {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        let mut attrs_mut = attrs.borrow_mut();

        for attr in attrs_mut.iter_mut() {
            if attr.name.local.as_ref() == attr_name {
                attr.value = value.into();
                return;
            }
        }

        attrs_mut.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(attr_name)),
            value: value.into(),
        });
    }
}

/// Remove an attribute from an element.
pub fn remove_attribute(handle: &Handle, attr_name: &str) {
    if let NodeData::Element { ref attrs, .. } = handle.data {
        attrs
            .borrow_mut()
            .retain(|attr| attr.name.local.as_ref() != attr_name);
    }
}

/// Whether the element's `class` attribute contains the given class.
pub fn has_class(handle: &Handle, class: &str) -> bool {
    get_attribute(handle, "class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

/// Find all elements matching a predicate, in document order.
pub fn find_elements<F>(handle: &Handle, pred: &F) -> Vec<Handle>
where
    F: Fn(&Handle) -> bool,
{
    let mut results = Vec::new();
    find_elements_recursive(handle, pred, &mut results);
    results
}

fn find_elements_recursive<F>(handle: &Handle, pred: &F, results: &mut Vec<Handle>)
where
    F: Fn(&Handle) -> bool,
{
    if matches!(handle.data, NodeData::Element { .. }) && pred(handle) {
        results.push(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        find_elements_recursive(child, pred, results);
    }
}

/// Find elements by local tag name in a DOM tree.
pub fn find_elements_by_name(handle: &Handle, name: &str) -> Vec<Handle> {
    find_elements(handle, &|h| element_name(h).as_deref() == Some(name))
}

/// Get the first element with the given local tag name.
pub fn find_first_element(handle: &Handle, name: &str) -> Option<Handle> {
    if element_name(handle).as_deref() == Some(name) {
        return Some(handle.clone());
    }

    for child in handle.children.borrow().iter() {
        if let Some(found) = find_first_element(child, name) {
            return Some(found);
        }
    }

    None
}

/// Find all elements carrying a specific attribute.
pub fn find_elements_with_attribute(handle: &Handle, attr_name: &str) -> Vec<Handle> {
    find_elements(handle, &|h| get_attribute(h, attr_name).is_some())
}

/// Get text content from a node, ignoring tags.
pub fn get_text_content(handle: &Handle) -> String {
    let mut text = String::new();
    get_text_recursive(handle, &mut text);
    text
}

fn get_text_recursive(handle: &Handle, text: &mut String) {
    match handle.data {
        NodeData::Text { ref contents } => {
            text.push_str(&contents.borrow());
        }
        NodeData::Element { .. } | NodeData::Document => {
            for child in handle.children.borrow().iter() {
                get_text_recursive(child, text);
            }
        }
        _ => {}
    }
}

/// Get a node's parent, if it is still attached.
pub fn parent_of(handle: &Handle) -> Option<Handle> {
    let weak = handle.parent.take()?;
    let parent = weak.upgrade();
    handle.parent.set(Some(weak));
    parent
}

/// Append a child to a parent node.
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Insert a node immediately before a reference node.
/// No-op if the reference node has no parent.
pub fn insert_before(reference: &Handle, node: Handle) {
    let Some(parent) = parent_of(reference) else {
        return;
    };
    let mut children = parent.children.borrow_mut();
    if let Some(pos) = children.iter().position(|c| Rc::ptr_eq(c, reference)) {
        node.parent.set(Some(Rc::downgrade(&parent)));
        children.insert(pos, node);
    }
}

/// Detach a node from its parent.
pub fn detach(handle: &Handle) {
    if let Some(parent) = parent_of(handle) {
        parent
            .children
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, handle));
    }
    handle.parent.set(None);
}

/// Replace an element with one of a different tag name, keeping attributes
/// and children. Returns the replacement (or the original node unchanged if
/// it is not an element).
pub fn rename_element(handle: &Handle, new_name: &str) -> Handle {
    let attrs = match handle.data {
        NodeData::Element { ref attrs, .. } => attrs.borrow().clone(),
        _ => return handle.clone(),
    };

    let renamed = Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(new_name)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    });

    let children: Vec<Handle> = handle.children.borrow_mut().drain(..).collect();
    for child in &children {
        child.parent.set(Some(Rc::downgrade(&renamed)));
    }
    *renamed.children.borrow_mut() = children;

    if let Some(parent) = parent_of(handle) {
        let mut siblings = parent.children.borrow_mut();
        if let Some(pos) = siblings.iter().position(|c| Rc::ptr_eq(c, handle)) {
            renamed.parent.set(Some(Rc::downgrade(&parent)));
            siblings[pos] = renamed.clone();
        }
        handle.parent.set(None);
    }

    renamed
}
