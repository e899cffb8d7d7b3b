use std::collections::{BTreeSet, HashSet};

use crate::data::provider::DataError;

/// Deduplicated, upper-cased, non-empty set of instrument symbols.
///
/// Ordered so that directory creation, logging and reports are deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSet(BTreeSet<String>);

impl SymbolSet {
    /// Normalize and deduplicate the given symbols.
    ///
    /// Blank entries are ignored; an input with no usable symbols is rejected.
    pub fn new<I, S>(symbols: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set: BTreeSet<String> = symbols
            .into_iter()
            .map(|s| s.as_ref().trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        if set.is_empty() {
            return Err(DataError::EmptySymbolSet);
        }
        Ok(Self(set))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.contains(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Symbols in this set that are absent from `valid`, in sorted order.
    pub fn missing_from(&self, valid: &HashSet<String>) -> Vec<String> {
        self.0.iter().filter(|s| !valid.contains(*s)).cloned().collect()
    }
}
