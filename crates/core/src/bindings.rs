//! Symbol bindings: the values supplied for one computation

use std::collections::HashMap;

use crate::registry::Registry;
use crate::value::{Operand, Value};

/// Mapping from symbol name to a caller-supplied value.
///
/// Bindings are supplied fresh for every call and are never retained by
/// the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Bindings<T = Value> {
    values: HashMap<String, T>,
}

impl<T> Bindings<T> {
    /// Create empty bindings
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Bind a symbol (builder style)
    pub fn with(mut self, symbol: impl Into<String>, value: impl Into<T>) -> Self {
        self.insert(symbol, value);
        self
    }

    /// Bind a symbol, returning the previous value if any
    pub fn insert(&mut self, symbol: impl Into<String>, value: impl Into<T>) -> Option<T> {
        self.values.insert(symbol.into(), value.into())
    }

    /// Look up a symbol
    pub fn get(&self, symbol: &str) -> Option<&T> {
        self.values.get(symbol)
    }

    /// Whether a symbol is bound
    pub fn contains(&self, symbol: &str) -> bool {
        self.values.contains_key(symbol)
    }

    /// Number of bound symbols
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no symbol is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(symbol, value)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bound symbol names, sorted
    pub fn symbols(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T: Operand> Bindings<T> {
    /// Bind the registry default of every constant the caller did not
    /// supply. Existing bindings are never overwritten; constants without
    /// a default (e.g. `sigma`) are skipped.
    pub fn fill_defaults(&mut self, registry: &Registry) {
        for constant in registry.constants() {
            if let Some(default) = constant.default {
                if !self.contains(&constant.symbol) {
                    self.values
                        .insert(constant.symbol.clone(), T::constant(default));
                }
            }
        }
    }

    /// Builder-style [`fill_defaults`](Self::fill_defaults)
    pub fn with_defaults(mut self, registry: &Registry) -> Self {
        self.fill_defaults(registry);
        self
    }
}

impl<T> Default for Bindings<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Bindings<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>, T> Extend<(K, T)> for Bindings<T> {
    fn extend<I: IntoIterator<Item = (K, T)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v)));
    }
}
