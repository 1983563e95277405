//! mesh HTML Parser
//!
//! HTML5 parsing built on html5ever, converting into the mesh arena DOM.
//! Declarative shadow roots (`<template shadowrootmode="open">`) become real
//! shadow roots during conversion, so parsed components are immediately part
//! of the shadow forest.

mod fragment;
mod parser;
mod serializer;

pub use fragment::Fragment;
pub use parser::HtmlParser;
pub use serializer::{HtmlSerializer, inner_html, outer_html};

use mesh_dom::Document;

/// Parse a full HTML page
pub fn parse_document(html: &str, url: &str) -> Document {
    HtmlParser::new().parse_with_url(html, url)
}

/// Parse an HTML fragment into a detached tree
pub fn parse_fragment(html: &str) -> Result<Fragment, ParseError> {
    HtmlParser::new().parse_fragment(html)
}

/// Parse error
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("fragment contains no elements")]
    Empty,

    #[error("DOM construction failed: {0}")]
    Dom(#[from] mesh_dom::DomError),
}
