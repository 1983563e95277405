//! DOMTokenList (classList)
//!
//! Space-separated token list backing `class` manipulation, used for the
//! reversible visual states (`dragging`, `drag-over`).

/// DOMTokenList for managing space-separated tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMTokenList {
    tokens: Vec<String>,
}

impl DOMTokenList {
    /// Create empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from space-separated string, dropping duplicates
    pub fn from_string(s: &str) -> Self {
        let mut list = Self::new();
        for token in s.split_whitespace() {
            list.add(&[token]);
        }
        list
    }

    /// Get number of tokens
    pub fn length(&self) -> usize {
        self.tokens.len()
    }

    /// Check if token exists
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add token(s)
    pub fn add(&mut self, tokens: &[&str]) {
        for token in tokens {
            if !token.is_empty() && !self.contains(token) {
                self.tokens.push(token.to_string());
            }
        }
    }

    /// Remove token(s)
    pub fn remove(&mut self, tokens: &[&str]) {
        self.tokens.retain(|t| !tokens.contains(&t.as_str()));
    }

    /// Toggle token, returns new state
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> bool {
        let on = force.unwrap_or(!self.contains(token));
        if on {
            self.add(&[token]);
        } else {
            self.remove(&[token]);
        }
        on
    }

    /// Get value as string
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }
}

impl std::fmt::Display for DOMTokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}
