use std::collections::HashMap;

/// Name of the reserved field holding the entry type, e.g. “article”
pub const TYPE_FIELD: &str = "$type";

/// One entry in a `.bib` file: its fields plus the reserved [`TYPE_FIELD`].
/// The ID is not part of the entry; it is the key in [`BibEntries`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(transparent))]
pub struct BibEntry {
    /// map of fields, e.g. “author” mapped to “Donald Ervin Knuth”
    pub fields: HashMap<String, String>,
}

impl BibEntry {
    /// Generate a new, empty instance of BibEntry. Can also be called through the `Default` implementation.
    pub fn new() -> BibEntry {
        BibEntry {
            fields: HashMap::new(),
        }
    }

    /// The entry type as written in the source, e.g. “Book”
    pub fn kind(&self) -> Option<&str> {
        self.get(TYPE_FIELD)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Number of fields, the reserved type field included
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Entries of a bib file, keyed by their ID, e.g. “DBLP:books/lib/Knuth97”
pub type BibEntries = HashMap<String, BibEntry>;

/// Everything collected while parsing one input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Bibliography {
    pub entries: BibEntries,
    /// `@STRING` macros mapped to their raw text; they are never expanded
    pub strings: HashMap<String, String>,
    /// reserved for `@COMMENT` bodies, which are currently not collected
    pub comments: Vec<String>,
}

impl Bibliography {
    pub fn into_entries(self) -> BibEntries {
        self.entries
    }
}

/// Knobs influencing how a parser stores what it reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// store field names upper-cased, e.g. “title” as “TITLE”
    pub upper_keys: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_reads_reserved_field() {
        let mut entry = BibEntry::new();
        assert!(entry.is_empty());
        assert_eq!(entry.kind(), None);
        entry.fields.insert(TYPE_FIELD.to_string(), "book".to_string());
        entry.fields.insert("year".to_string(), "1973".to_string());
        assert_eq!(entry.kind(), Some("book"));
        assert_eq!(entry.get("year"), Some("1973"));
        assert_eq!(entry.len(), 2);
    }

    #[test]
    fn test_config_defaults_to_keys_as_written() {
        assert!(!ParserConfig::default().upper_keys);
    }
}
