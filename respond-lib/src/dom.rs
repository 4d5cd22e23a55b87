use html5ever::interface::QuirksMode;
use html5ever::{local_name, namespace_url, ns, QualName};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub mod dom_tree {
    use super::*;

    /// Void (self-closing) elements in HTML.
    pub(crate) const VOID_ELEMENTS: &[&str] = &[
        "meta", "img", "br", "hr", "input", "link", "area", "base", "col", "embed", "param",
        "source", "track", "wbr",
    ];

    pub type NodeRef = Rc<RefCell<Node>>;

    #[derive(Debug, Clone)]
    pub enum Node {
        DocumentRoot(DocumentRootNode),
        Element(ElementNode),
        Text(String),
    }

    #[derive(Debug, Clone, Default)]
    pub struct DocumentRootNode {
        pub children: Vec<NodeRef>,
    }

    #[derive(Debug, Clone)]
    pub struct ElementNode {
        pub tag: String,
        pub qual_name: QualName,
        pub attributes: Vec<(String, String)>,
        pub children: Vec<NodeRef>,
    }

    #[derive(Debug)]
    pub struct Document {
        pub root: NodeRef,
        pub doctype: RefCell<Option<Doctype>>,
        pub quirks_mode: Cell<QuirksMode>,
    }

    #[derive(Debug)]
    pub struct Doctype {
        pub name: String,
        pub public_id: String,
        pub system_id: String,
    }

    /// A `<link rel="stylesheet">` found in the document head.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StylesheetLink {
        pub href: String,
        pub media: Option<String>,
    }

    impl DocumentRootNode {
        pub fn new() -> Self {
            DocumentRootNode {
                children: Vec::new(),
            }
        }
    }

    impl ElementNode {
        pub fn new(tag: String, qual_name: QualName) -> Self {
            ElementNode {
                tag,
                qual_name,
                attributes: Vec::new(),
                children: Vec::new(),
            }
        }

        pub fn attr(&self, name: &str) -> Option<&str> {
            self.attributes
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn set_attr(&mut self, name: &str, value: &str) {
            match self
                .attributes
                .iter_mut()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
            {
                Some((_, v)) => *v = value.to_string(),
                None => self.attributes.push((name.to_string(), value.to_string())),
            }
        }

        pub fn is(&self, tag: &str) -> bool {
            self.tag.eq_ignore_ascii_case(tag)
        }

        /// Concatenated text of the direct text children.
        pub fn text_content(&self) -> String {
            let mut out = String::new();
            for child in &self.children {
                if let Node::Text(text) = &*child.borrow() {
                    out.push_str(text);
                }
            }
            out
        }
    }

    impl Node {
        pub fn children(&self) -> &[NodeRef] {
            match self {
                Node::DocumentRoot(root) => &root.children,
                Node::Element(elem) => &elem.children,
                Node::Text(_) => &[],
            }
        }

        pub fn children_mut(&mut self) -> Option<&mut Vec<NodeRef>> {
            match self {
                Node::DocumentRoot(root) => Some(&mut root.children),
                Node::Element(elem) => Some(&mut elem.children),
                Node::Text(_) => None,
            }
        }

        pub fn as_element(&self) -> Option<&ElementNode> {
            match self {
                Node::Element(elem) => Some(elem),
                _ => None,
            }
        }

        pub fn is_element(&self, tag: &str) -> bool {
            self.as_element().is_some_and(|elem| elem.is(tag))
        }
    }

    pub fn new_document() -> Document {
        Document {
            root: Rc::new(RefCell::new(Node::DocumentRoot(DocumentRootNode::new()))),
            doctype: RefCell::new(None),
            quirks_mode: Cell::new(QuirksMode::NoQuirks),
        }
    }

    impl Document {
        /// The document element (`<html>`), if parsing produced one.
        pub fn document_element(&self) -> Option<NodeRef> {
            self.root
                .borrow()
                .children()
                .iter()
                .find(|child| matches!(*child.borrow(), Node::Element(_)))
                .cloned()
        }

        /// The `<head>` element, falling back to the document element.
        pub fn head(&self) -> Option<NodeRef> {
            let html = self.document_element()?;
            let head = html
                .borrow()
                .children()
                .iter()
                .find(|child| child.borrow().is_element("head"))
                .cloned();
            Some(head.unwrap_or(html))
        }

        /// The compat mode recorded by the parser. Only `Quirks` reads the
        /// viewport width from the body; `LimitedQuirks` counts as standards.
        pub fn compat_mode(&self) -> QuirksMode {
            self.quirks_mode.get()
        }

        /// All stylesheet links inside the head, in document order.
        pub fn stylesheet_links(&self) -> Vec<StylesheetLink> {
            let mut links = Vec::new();
            if let Some(head) = self.head() {
                collect_elements(&head, "link", &mut |elem: &ElementNode| {
                    let is_sheet = elem
                        .attr("rel")
                        .is_some_and(|rel| rel.eq_ignore_ascii_case("stylesheet"));
                    match elem.attr("href") {
                        Some(href) if is_sheet && !href.is_empty() => {
                            links.push(StylesheetLink {
                                href: href.to_string(),
                                media: elem.attr("media").map(str::to_string),
                            });
                        }
                        _ => {}
                    }
                });
            }
            links
        }

        /// `href` of the first `<base>` element that has one.
        pub fn base_href(&self) -> Option<String> {
            let mut base = None;
            collect_elements(&self.root, "base", &mut |elem: &ElementNode| {
                if base.is_none() {
                    base = elem.attr("href").map(str::to_string);
                }
            });
            base
        }

        /// Serializes the document back to markup.
        pub fn to_html(&self) -> String {
            let mut out = String::new();
            if let Some(doctype) = &*self.doctype.borrow() {
                out.push_str(&format!("<!DOCTYPE {}>", doctype.name));
            }
            serialize_node(&self.root.borrow(), false, &mut out);
            out
        }
    }

    /// Calls `f` for every element named `tag` under `node`, in document order.
    pub fn collect_elements(node: &NodeRef, tag: &str, f: &mut dyn FnMut(&ElementNode)) {
        let node = node.borrow();
        if let Node::Element(elem) = &*node {
            if elem.is(tag) {
                f(elem);
            }
        }
        for child in node.children() {
            collect_elements(child, tag, f);
        }
    }

    fn serialize_node(node: &Node, raw_text: bool, out: &mut String) {
        match node {
            Node::DocumentRoot(root) => {
                for child in &root.children {
                    serialize_node(&child.borrow(), false, out);
                }
            }
            Node::Element(elem) => {
                out.push('<');
                out.push_str(&elem.tag);
                for (k, v) in &elem.attributes {
                    out.push_str(&format!(" {}=\"{}\"", k, escape(v, true)));
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&elem.tag.as_str()) {
                    return;
                }
                let raw = elem.is("style") || elem.is("script");
                for child in &elem.children {
                    serialize_node(&child.borrow(), raw, out);
                }
                out.push_str(&format!("</{}>", elem.tag));
            }
            Node::Text(text) if raw_text => out.push_str(text),
            Node::Text(text) => out.push_str(&escape(text, false)),
        }
    }

    fn escape(text: &str, attr: bool) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' if !attr => out.push_str("&lt;"),
                '>' if !attr => out.push_str("&gt;"),
                '"' if attr => out.push_str("&quot;"),
                _ => out.push(c),
            }
        }
        out
    }

    /// Builds a `<style>` element for the given media type and CSS text.
    pub fn new_style_element(media: &str, css: &str) -> NodeRef {
        let mut style = ElementNode::new(
            "style".to_string(),
            QualName::new(None, ns!(html), local_name!("style")),
        );
        style.set_attr("type", "text/css");
        style.set_attr("media", media);
        style
            .children
            .push(Rc::new(RefCell::new(Node::Text(css.to_string()))));
        Rc::new(RefCell::new(Node::Element(style)))
    }
}

#[cfg(test)]
mod tests {
    use super::dom_tree::*;
    use crate::parser::html::create_dom_tree;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_stylesheet_links_in_head() {
        let doc = create_dom_tree(
            r#"<!DOCTYPE html><html><head>
            <link rel="stylesheet" href="css/a.css">
            <link rel="icon" href="favicon.ico">
            <link rel="StyleSheet" href="css/b.css" media="screen and (min-width: 40em)">
            <link rel="stylesheet">
            </head><body><link rel="stylesheet" href="late.css"></body></html>"#,
        );
        assert_eq!(
            doc.stylesheet_links(),
            vec![
                StylesheetLink {
                    href: "css/a.css".to_string(),
                    media: None,
                },
                StylesheetLink {
                    href: "css/b.css".to_string(),
                    media: Some("screen and (min-width: 40em)".to_string()),
                },
            ]
        );
        assert_eq!(doc.base_href(), None);

        let based = create_dom_tree(r#"<head><base href="http://cdn/x/"></head>"#);
        assert_eq!(based.base_href().as_deref(), Some("http://cdn/x/"));
    }

    #[test]
    fn head_falls_back_to_document_element() {
        let doc = new_document();
        assert!(doc.head().is_none());

        let parsed = create_dom_tree("<p>hi</p>");
        let head = parsed.head().expect("parser always creates a head");
        assert!(head.borrow().is_element("head"));
    }

    #[test]
    fn serializes_style_text_raw() {
        let style = new_style_element("screen", "a > b { color: red; }");
        let doc = new_document();
        if let Node::DocumentRoot(root) = &mut *doc.root.borrow_mut() {
            root.children.push(style);
        }
        assert_eq!(
            doc.to_html(),
            r#"<style type="text/css" media="screen">a > b { color: red; }</style>"#
        );
    }

    #[test]
    fn compat_mode_follows_doctype() {
        use html5ever::interface::QuirksMode;

        assert_eq!(
            create_dom_tree("<!DOCTYPE html><p>x</p>").compat_mode(),
            QuirksMode::NoQuirks
        );
        assert_eq!(create_dom_tree("<p>x</p>").compat_mode(), QuirksMode::Quirks);
    }
}
