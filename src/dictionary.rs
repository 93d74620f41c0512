//! Dictionaries used by the deterministic and havoc overwrite stages.

use crate::config::ADDRESS_LEN;

/// A single dictionary literal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DictEntry {
    /// The literal's bytes.
    pub data: Vec<u8>,
}

impl DictEntry {
    /// Wrap raw bytes as a dictionary entry.
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self { data: data.into() }
    }

    /// Length of this entry, in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether this entry is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// An ordered collection of dictionary entries, extracted by the (external)
/// contract-literal or attacker-address collectors. The mutation engine only
/// ever reads dictionaries; it never mutates or reorders them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dictionary {
    /// The entries, in collection order.
    pub extras: Vec<DictEntry>,
}

impl Dictionary {
    /// An empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from an iterator of raw byte strings.
    pub fn from_entries<I, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self {
            extras: entries.into_iter().map(DictEntry::new).collect(),
        }
    }

    /// Build an address dictionary, asserting every entry is exactly
    /// [`ADDRESS_LEN`] bytes (the attacker-address collector's contract).
    ///
    /// # Panics
    ///
    /// Panics if any entry isn't exactly 20 bytes — a malformed address
    /// dictionary is a bug in the (out-of-scope) collector, not a condition
    /// the engine can usefully recover from.
    pub fn from_addresses<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = [u8; ADDRESS_LEN]>,
    {
        Self {
            extras: entries.into_iter().map(|a| DictEntry::new(a.to_vec())).collect(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.extras.len()
    }

    /// Whether the dictionary has no entries.
    pub fn is_empty(&self) -> bool {
        self.extras.is_empty()
    }
}

/// The pair of dictionaries the engine consults: code literals and attacker
/// addresses.
#[derive(Debug, Clone, Default)]
pub struct Dicts {
    /// Generic code/ABI-word literals, consulted by
    /// [`crate::engine::MutationEngine::overwrite_with_dictionary`] and
    /// havoc operators 14/15.
    pub code: Dictionary,
    /// 20-byte attacker addresses, consulted by
    /// [`crate::engine::MutationEngine::overwrite_with_address_dictionary`].
    pub address: Dictionary,
}

impl Dicts {
    /// Build a dictionary pair.
    pub fn new(code: Dictionary, address: Dictionary) -> Self {
        Self { code, address }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_entries_preserves_order() {
        let dict = Dictionary::from_entries([b"abc".to_vec(), b"de".to_vec()]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.extras[0].data, b"abc");
        assert_eq!(dict.extras[1].data, b"de");
    }

    #[test]
    fn address_dictionary_entries_are_twenty_bytes() {
        let dict = Dictionary::from_addresses([[0xAAu8; ADDRESS_LEN]]);
        assert_eq!(dict.extras[0].len(), ADDRESS_LEN);
    }

    #[test]
    fn empty_dictionary_reports_empty() {
        let dict = Dictionary::new();
        assert!(dict.is_empty());
    }
}
