//! HTML parsing into the crate's DOM tree.
//!
//! html5ever drives the parse; [`RespondTreeSink`] builds the
//! `crate::dom::dom_tree` structures the style injector later mutates.

use crate::dom::dom_tree;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{
    interface::{ElemName, NodeOrText, QuirksMode, TreeSink},
    LocalName, Namespace, QualName,
};
use std::cell::RefCell;
use std::rc::Rc;

/// Creates a DOM tree from the provided HTML content.
///
/// The document's quirks mode is recorded so the evaluator can pick the
/// right element to read the viewport width from.
pub fn create_dom_tree(html_content: &str) -> dom_tree::Document {
    let tree_sink = RespondTreeSink::new();
    html5ever::parse_document(tree_sink, Default::default()).one(html_content.to_string())
}

/// A TreeSink that builds a [`dom_tree::Document`].
pub struct RespondTreeSink {
    document: dom_tree::Document,
}

impl RespondTreeSink {
    pub fn new() -> Self {
        Self {
            document: dom_tree::new_document(),
        }
    }
}

impl Default for RespondTreeSink {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct RespondElemName {
    ns: Namespace,
    local: LocalName,
}

impl ElemName for RespondElemName {
    fn local_name(&self) -> &LocalName {
        &self.local
    }

    fn ns(&self) -> &Namespace {
        &self.ns
    }
}

fn text_node(text: &str) -> dom_tree::NodeRef {
    Rc::new(RefCell::new(dom_tree::Node::Text(text.to_string())))
}

/// Finds the node whose children include `target`, searching down from `node`.
fn find_parent(node: &dom_tree::NodeRef, target: &dom_tree::NodeRef) -> Option<dom_tree::NodeRef> {
    let borrowed = node.borrow();
    for child in borrowed.children() {
        if Rc::ptr_eq(child, target) {
            return Some(node.clone());
        }
        if let Some(parent) = find_parent(child, target) {
            return Some(parent);
        }
    }
    None
}

/// Appends `child` to `children`, merging adjacent text the way browsers do.
fn push_child(children: &mut Vec<dom_tree::NodeRef>, child: NodeOrText<dom_tree::NodeRef>) {
    match child {
        NodeOrText::AppendNode(node) => children.push(node),
        NodeOrText::AppendText(text) => {
            if let Some(last) = children.last() {
                if let dom_tree::Node::Text(existing) = &mut *last.borrow_mut() {
                    existing.push_str(&text);
                    return;
                }
            }
            children.push(text_node(&text));
        }
    }
}

impl TreeSink for RespondTreeSink {
    type Handle = dom_tree::NodeRef;
    type Output = dom_tree::Document;
    type ElemName<'a>
        = RespondElemName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self.document
    }

    fn parse_error(&self, msg: std::borrow::Cow<'static, str>) {
        log::trace!("html parse error: {}", msg);
    }

    fn get_document(&self) -> Self::Handle {
        self.document.root.clone()
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        match &*target.borrow() {
            dom_tree::Node::Element(elem) => RespondElemName {
                ns: elem.qual_name.ns.clone(),
                local: elem.qual_name.local.clone(),
            },
            // html5ever only asks for names of nodes it created as elements.
            _ => RespondElemName {
                ns: Namespace::from(""),
                local: LocalName::from(""),
            },
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<html5ever::Attribute>,
        _flags: html5ever::interface::ElementFlags,
    ) -> Self::Handle {
        let mut element = dom_tree::ElementNode::new(name.local.to_string(), name);
        element.attributes = attrs
            .into_iter()
            .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
            .collect();
        Rc::new(RefCell::new(dom_tree::Node::Element(element)))
    }

    /// Comments are dropped; an empty text node stands in for them.
    fn create_comment(&self, _text: StrTendril) -> Self::Handle {
        text_node("")
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        text_node("")
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        if let Some(children) = parent.borrow_mut().children_mut() {
            push_child(children, child);
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        if find_parent(&self.document.root, element).is_some() {
            self.append_before_sibling(element, child);
        } else {
            self.append(prev_element, child);
        }
    }

    fn append_doctype_to_document(
        &self,
        name: StrTendril,
        public_id: StrTendril,
        system_id: StrTendril,
    ) {
        *self.document.doctype.borrow_mut() = Some(dom_tree::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        });
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        target.clone()
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        Rc::ptr_eq(x, y)
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        self.document.quirks_mode.set(mode);
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let Some(parent) = find_parent(&self.document.root, sibling) else {
            return;
        };
        let mut parent = parent.borrow_mut();
        let Some(children) = parent.children_mut() else {
            return;
        };
        let Some(position) = children.iter().position(|c| Rc::ptr_eq(c, sibling)) else {
            return;
        };
        match child {
            NodeOrText::AppendNode(node) => children.insert(position, node),
            NodeOrText::AppendText(text) => {
                if position > 0 {
                    if let dom_tree::Node::Text(existing) = &mut *children[position - 1].borrow_mut() {
                        existing.push_str(&text);
                        return;
                    }
                }
                children.insert(position, text_node(&text));
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<html5ever::Attribute>) {
        if let dom_tree::Node::Element(elem) = &mut *target.borrow_mut() {
            for attr in attrs {
                let key = attr.name.local.to_string();
                if elem.attr(&key).is_none() {
                    elem.attributes.push((key, attr.value.to_string()));
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        if let Some(parent) = find_parent(&self.document.root, target) {
            if let Some(children) = parent.borrow_mut().children_mut() {
                children.retain(|child| !Rc::ptr_eq(child, target));
            }
        }
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let moved = match node.borrow_mut().children_mut() {
            Some(children) => std::mem::take(children),
            None => return,
        };
        if let Some(children) = new_parent.borrow_mut().children_mut() {
            children.extend(moved);
        }
    }
}
