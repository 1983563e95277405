//! HTML5 Parser implementation
//!
//! Uses html5ever's RcDom and converts it to the mesh arena DOM.

use crate::{Fragment, ParseError};
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData as RcNodeData, RcDom};
use mesh_dom::{Document, DomResult, DomTree, NodeId, ShadowRootMode};

/// Treatment of whitespace-only text nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Whitespace {
    /// Drop them (inter-element formatting of a page)
    Strip,
    Keep,
}

/// Elements whose whitespace is content
const PREFORMATTED: &[&str] = &["pre", "textarea", "listing", "plaintext"];

/// HTML5 parser
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse HTML string into a Document
    pub fn parse(&self, html: &str) -> Document {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse HTML with a base URL
    pub fn parse_with_url(&self, html: &str, url: &str) -> Document {
        tracing::debug!("Parsing HTML document: {}", url);

        let tree = match self.build(html, Whitespace::Strip) {
            Ok(tree) => tree,
            Err(e) => {
                tracing::error!("Failed to build DOM for {}: {}", url, e);
                DomTree::new()
            }
        };

        tracing::debug!("Parsed {} nodes", tree.len());
        Document::from_tree(tree, url)
    }

    /// Parse an HTML fragment. The fragment's top-level nodes become children
    /// of the returned tree's root. Whitespace inside the fragment is kept.
    pub fn parse_fragment(&self, html: &str) -> Result<Fragment, ParseError> {
        let mut tree = self.build(html.trim(), Whitespace::Keep)?;
        let root = tree.root();

        // html5ever wraps everything in html/head/body; hoist the content
        let mut hoisted = Vec::new();
        for html_elem in tree.element_children(root) {
            if tree.tag_name(html_elem) != Some("html") {
                continue;
            }
            for section in tree.element_children(html_elem) {
                hoisted.extend(tree.children(section));
            }
        }
        tree.clear_children(root);
        for node in hoisted {
            tree.append_child(root, node)?;
        }

        let fragment = Fragment::new(tree);
        if fragment.elements().is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(fragment)
    }

    fn build(&self, html: &str, whitespace: Whitespace) -> DomResult<DomTree> {
        let dom = parse_document(RcDom::default(), Default::default()).one(html);
        let mut tree = DomTree::new();
        let root = tree.root();
        self.convert_node(&dom.document, &mut tree, root, whitespace)?;
        Ok(tree)
    }

    /// Convert an RcDom node (and its subtree) under `parent`
    fn convert_node(
        &self,
        handle: &Handle,
        tree: &mut DomTree,
        parent: NodeId,
        whitespace: Whitespace,
    ) -> DomResult<()> {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent, whitespace)?;
                }
            }
            RcNodeData::Doctype { name, .. } => {
                let id = tree.create_doctype(name);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Text { contents } => {
                let text = contents.borrow();
                if whitespace == Whitespace::Keep || !text.trim().is_empty() {
                    let id = tree.create_text(&text);
                    tree.append_child(parent, id)?;
                }
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id)?;
            }
            RcNodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let tag: &str = &name.local;
                let inner = if PREFORMATTED.contains(&tag) {
                    Whitespace::Keep
                } else {
                    whitespace
                };

                // Template content lives in a separate fragment in RcDom
                let content = template_contents.borrow().clone();
                let content_children: Vec<Handle> = match &content {
                    Some(fragment) => fragment.children.borrow().clone(),
                    None => handle.children.borrow().clone(),
                };

                if tag == "template" {
                    let mode = attrs
                        .borrow()
                        .iter()
                        .find(|a| &*a.name.local == "shadowrootmode")
                        .and_then(|a| ShadowRootMode::from_attr(&a.value));
                    if let Some(mode) = mode {
                        if tree.is_element(parent) && tree.shadow_root(parent).is_none() {
                            let shadow = tree.attach_shadow(parent, mode)?;
                            for child in &content_children {
                                self.convert_node(child, tree, shadow, inner)?;
                            }
                            return Ok(());
                        }
                    }
                }

                let id = tree.create_element(tag);
                for attr in attrs.borrow().iter() {
                    tree.set_attr(id, &attr.name.local, &attr.value)?;
                }
                tree.append_child(parent, id)?;

                for child in &content_children {
                    self.convert_node(child, tree, id, inner)?;
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple() {
        let html = "<html><head><title>Board</title></head><body><p>Hello</p></body></html>";
        let doc = HtmlParser::new().parse(html);
        assert!(doc.body().is_some());
        assert!(doc.tree().len() > 4);
    }

    #[test]
    fn test_declarative_shadow_root() {
        let html = r#"<mesh-card id="card-1"><template shadowrootmode="open"><h3 id="title-1">Build app</h3></template></mesh-card>"#;
        let doc = HtmlParser::new().parse(html);
        let card = doc.get_element_by_id("card-1").unwrap();
        let shadow = doc.tree().shadow_root(card).expect("shadow attached");
        assert!(doc.get_element_by_id("title-1").is_none());
        assert!(doc.tree().get_element_by_id(shadow, "title-1").is_some());
        assert_eq!(doc.resolve("title-1"), doc.tree().get_element_by_id(shadow, "title-1"));
    }

    #[test]
    fn test_page_whitespace_dropped_outside_pre() {
        let html = "<ul>\n  <li>a</li>\n</ul><pre id=\"p\"><b>x</b>  <b>y</b></pre>";
        let doc = HtmlParser::new().parse(html);
        let list = doc.tree().query_selector(doc.tree().root(), "ul").unwrap().unwrap();
        assert_eq!(doc.tree().children(list).count(), 1);
        let pre = doc.get_element_by_id("p").unwrap();
        assert_eq!(doc.tree().text_content(pre), "x  y");
    }

    #[test]
    fn test_second_declarative_template_stays_template() {
        let html = r#"<mesh-card id="c"><template shadowrootmode="open"><i></i></template><template shadowrootmode="open"><b></b></template></mesh-card>"#;
        let doc = HtmlParser::new().parse(html);
        let card = doc.get_element_by_id("c").unwrap();
        let templates = doc.tree().query_selector_all(card, "template").unwrap();
        assert_eq!(templates.len(), 1);
    }
}
