//! `{text, params}` pairs composed without shared mutable buffers.
//!
//! Invariant: the n-th `?` in `text` binds `params[n]`. Every constructor and
//! combinator preserves it, so callers never reason about push order.

use sea_query::Value;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    text: String,
    params: Vec<Value>,
}

impl Fragment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Literal SQL with no placeholders. Only ever built from quoted
    /// identifiers and fixed keywords.
    pub fn raw(text: impl Into<String>) -> Self {
        let text = text.into();
        debug_assert!(!text.contains('?'), "raw fragment contains a placeholder");
        Self {
            text,
            params: Vec::new(),
        }
    }

    /// A single `?` bound to `value`.
    pub fn param(value: Value) -> Self {
        Self {
            text: "?".to_string(),
            params: vec![value],
        }
    }

    /// `?, ?, ...` bound to `values` in order.
    pub fn param_list(values: Vec<Value>) -> Self {
        let text = vec!["?"; values.len()].join(", ");
        Self {
            text,
            params: values,
        }
    }

    /// `self` followed by `other`, separated by one space.
    pub fn then(self, other: Fragment) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        let mut params = self.params;
        params.extend(other.params);
        Self {
            text: format!("{} {}", self.text, other.text),
            params,
        }
    }

    /// Joins non-empty parts with `separator`, concatenating params in the
    /// same order as the parts.
    pub fn join<I>(parts: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut texts = Vec::new();
        let mut params = Vec::new();
        for part in parts.into_iter().filter(|p| !p.is_empty()) {
            texts.push(part.text);
            params.extend(part.params);
        }
        Self {
            text: texts.join(separator),
            params,
        }
    }

    pub fn parenthesized(self) -> Self {
        if self.is_empty() {
            return self;
        }
        Self {
            text: format!("({})", self.text),
            params: self.params,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn placeholder_count(&self) -> usize {
        self.text.matches('?').count()
    }

    pub fn into_parts(self) -> (String, Vec<Value>) {
        (self.text, self.params)
    }
}
