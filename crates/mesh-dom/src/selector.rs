//! Selector matching
//!
//! A small subset of CSS selectors: comma-separated lists of compound
//! selectors built from `*`, tag, `#id`, `.class`, `[attr]`, `[attr=value]`
//! and `:not(...)`. Combinators are not supported.

use crate::{DomError, DomResult, DomTree, NodeId};

/// Parsed selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

/// One compound selector (`tag#id.class[attr]:not(...)`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, Option<String>)>,
    pub negations: Vec<Compound>,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(input: &str) -> DomResult<Self> {
        let compounds = split_top_level(input)
            .into_iter()
            .map(|part| {
                let mut parser = Parser { src: part.trim(), pos: 0 };
                let compound = parser.compound()?;
                if parser.pos != parser.src.len() {
                    return Err(DomError::InvalidSelector(input.to_string()));
                }
                Ok(compound)
            })
            .collect::<DomResult<Vec<_>>>()?;
        if compounds.is_empty() {
            return Err(DomError::InvalidSelector(input.to_string()));
        }
        Ok(Self { compounds })
    }

    /// Check if an element matches any compound in the list
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.compounds.iter().any(|c| c.matches(tree, node))
    }
}

impl Compound {
    /// Check if an element matches this compound
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(elem) = tree.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if !elem.name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let list = tree.class_list(node);
            if !self.classes.iter().all(|c| list.contains(c)) {
                return false;
            }
        }
        for (name, value) in &self.attrs {
            match (elem.get_attr(name), value) {
                (None, _) => return false,
                (Some(actual), Some(expected)) if actual != expected => return false,
                _ => {}
            }
        }
        !self.negations.iter().any(|n| n.matches(tree, node))
    }
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in input.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&input[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts.retain(|p| !p.trim().is_empty());
    parts
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self) -> DomError {
        DomError::InvalidSelector(self.src.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn ident(&mut self) -> DomResult<String> {
        let rest = &self.src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error());
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn expect(&mut self, ch: char) -> DomResult<()> {
        if self.peek() == Some(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.error())
        }
    }

    fn compound(&mut self) -> DomResult<Compound> {
        let mut compound = Compound::default();
        match self.peek() {
            Some('*') => self.pos += 1,
            Some(c) if c.is_ascii_alphabetic() => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        let start = self.pos;
        while let Some(ch) = self.peek() {
            match ch {
                '#' => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                '.' => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                '[' => {
                    self.pos += 1;
                    let name = self.ident()?;
                    let value = if self.peek() == Some('=') {
                        self.pos += 1;
                        Some(self.attr_value()?)
                    } else {
                        None
                    };
                    self.expect(']')?;
                    compound.attrs.push((name, value));
                }
                ':' => {
                    self.pos += 1;
                    if self.ident()? != "not" {
                        return Err(self.error());
                    }
                    self.expect('(')?;
                    let inner = self.compound()?;
                    self.expect(')')?;
                    compound.negations.push(inner);
                }
                _ => break,
            }
        }
        if compound.tag.is_none() && self.pos == start && !self.src[..start].ends_with('*') {
            return Err(self.error());
        }
        Ok(compound)
    }

    fn attr_value(&mut self) -> DomResult<String> {
        match self.peek() {
            Some(q @ ('"' | '\'')) => {
                self.pos += 1;
                let rest = &self.src[self.pos..];
                let end = rest.find(q).ok_or_else(|| self.error())?;
                let value = rest[..end].to_string();
                self.pos += end + 1;
                Ok(value)
            }
            _ => self.ident(),
        }
    }
}
