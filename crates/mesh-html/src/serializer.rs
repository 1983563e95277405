//! HTML Serialization (innerHTML/outerHTML)
//!
//! Shadow roots are written back out as declarative
//! `<template shadowrootmode="...">` children, so a serialized component
//! parses back into the same shadow forest.

use mesh_dom::{DomTree, NodeData, NodeId};

/// HTML serializer
#[derive(Debug, Clone, Default)]
pub struct HtmlSerializer {
    /// Emit shadow roots as declarative templates
    pub include_shadow_roots: bool,
}

/// Void elements (no end tag)
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Raw text elements (no escaping for content)
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl HtmlSerializer {
    pub fn new() -> Self {
        Self {
            include_shadow_roots: true,
        }
    }

    /// Light tree only
    pub fn light() -> Self {
        Self {
            include_shadow_roots: false,
        }
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_children(tree, node_id, &mut output);
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output);
        output
    }

    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document | NodeData::ShadowRoot(_) => {
                self.serialize_children(tree, node_id, output);
            }
            NodeData::Element(elem) => {
                let tag = elem.name.as_str();

                output.push('<');
                output.push_str(tag);
                for attr in &elem.attrs {
                    output.push(' ');
                    output.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        output.push_str("=\"");
                        escape_attribute(&attr.value, output);
                        output.push('"');
                    }
                }
                output.push('>');

                if VOID_ELEMENTS.contains(&tag) {
                    return;
                }

                if self.include_shadow_roots {
                    if let Some(shadow) = elem.shadow_root {
                        let mode = tree
                            .get(shadow)
                            .and_then(|n| n.as_shadow_root())
                            .map(|s| s.mode.as_str())
                            .unwrap_or("open");
                        output.push_str("<template shadowrootmode=\"");
                        output.push_str(mode);
                        output.push_str("\">");
                        self.serialize_children(tree, shadow, output);
                        output.push_str("</template>");
                    }
                }

                if RAW_TEXT_ELEMENTS.contains(&tag) {
                    for child in tree.children(node_id) {
                        if let Some(text) = tree.text(child) {
                            output.push_str(text);
                        }
                    }
                } else {
                    self.serialize_children(tree, node_id, output);
                }

                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => escape_text(&text.content, output),
            NodeData::Comment(text) => {
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            NodeData::Doctype { name } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                output.push('>');
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String) {
        for child in tree.children(parent_id) {
            self.serialize_node(tree, child, output);
        }
    }
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

/// outerHTML of an element, shadow roots included
pub fn outer_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node_id)
}

/// innerHTML of a node (light tree only, like Element.innerHTML)
pub fn inner_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::light().serialize_inner(tree, node_id)
}
