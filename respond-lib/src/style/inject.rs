use crate::dom::dom_tree::{new_style_element, Document, NodeRef};
use crate::style::evaluate::ActiveSet;
use std::rc::Rc;

/// Owns the `<style>` elements the engine has put into the document head.
#[derive(Debug, Default)]
pub struct StyleInjector {
    injected: Vec<NodeRef>,
}

impl StyleInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces every previously injected element with one `<style>` per
    /// bucket of `active`.
    ///
    /// New elements go right after the last `<link>` in the head, in bucket
    /// order, so author stylesheets keep their precedence. Without a link
    /// they are appended to the head.
    pub fn inject(&mut self, document: &Document, active: &ActiveSet) {
        let Some(head) = document.head() else {
            log::warn!("document has no head; nothing injected");
            self.injected.clear();
            return;
        };
        let mut head = head.borrow_mut();
        let Some(children) = head.children_mut() else {
            return;
        };

        let previous = std::mem::take(&mut self.injected);
        children.retain(|child| !previous.iter().any(|old| Rc::ptr_eq(old, child)));

        let mut at = children
            .iter()
            .rposition(|child| child.borrow().is_element("link"))
            .map_or(children.len(), |last_link| last_link + 1);

        for bucket in active.buckets() {
            let style = new_style_element(&bucket.media_type, &bucket.css());
            children.insert(at, style.clone());
            self.injected.push(style);
            at += 1;
        }
        log::debug!(
            "replaced {} injected style element(s) with {}",
            previous.len(),
            self.injected.len()
        );
    }

    pub fn injected(&self) -> &[NodeRef] {
        &self.injected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::html::create_dom_tree;
    use crate::parser::media::parse_media_query_list;
    use crate::style::evaluate::evaluate;
    use crate::style::rules::{RuleBody, RuleStore};
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html><html><head><title>t</title><link rel="stylesheet" href="a.css"><meta charset="utf-8"></head><body></body></html>"#;

    fn store() -> RuleStore {
        let mut store = RuleStore::new();
        for (conditions, css) in [
            ("screen and (min-width: 600px)", ".a{x:y}"),
            ("print", ".b{x:y}"),
        ] {
            let index = store.push_body(RuleBody::Css(css.to_string()));
            for condition in parse_media_query_list(conditions) {
                store.push_descriptor(condition, index);
            }
        }
        store
    }

    #[test]
    fn inserts_after_last_link_in_bucket_order() {
        let doc = create_dom_tree(PAGE);
        let mut injector = StyleInjector::new();
        injector.inject(&doc, &evaluate(&store(), 800.0));

        assert_eq!(
            doc.to_html(),
            concat!(
                r#"<!DOCTYPE html><html><head><title>t</title><link rel="stylesheet" href="a.css">"#,
                r#"<style type="text/css" media="screen">.a{x:y}</style>"#,
                r#"<style type="text/css" media="print">.b{x:y}</style>"#,
                r#"<meta charset="utf-8"></head><body></body></html>"#
            )
        );
    }

    #[test]
    fn reinjection_replaces_previous_elements() {
        let doc = create_dom_tree(PAGE);
        let mut injector = StyleInjector::new();
        let store = store();

        injector.inject(&doc, &evaluate(&store, 800.0));
        injector.inject(&doc, &evaluate(&store, 300.0));
        assert_eq!(injector.injected().len(), 1);
        assert_eq!(
            doc.to_html(),
            concat!(
                r#"<!DOCTYPE html><html><head><title>t</title><link rel="stylesheet" href="a.css">"#,
                r#"<style type="text/css" media="print">.b{x:y}</style>"#,
                r#"<meta charset="utf-8"></head><body></body></html>"#
            )
        );

        injector.inject(&doc, &ActiveSet::default());
        assert!(injector.injected().is_empty());
        assert!(!doc.to_html().contains("<style"));
    }

    #[test]
    fn appends_to_head_without_links() {
        let doc = create_dom_tree("<!DOCTYPE html><title>t</title>");
        let mut injector = StyleInjector::new();
        injector.inject(&doc, &evaluate(&store(), 100.0));
        assert_eq!(
            doc.to_html(),
            concat!(
                "<!DOCTYPE html><html><head><title>t</title>",
                r#"<style type="text/css" media="print">.b{x:y}</style>"#,
                "</head><body></body></html>"
            )
        );
    }
}
