//! Law-name length lookup keyed by law number.
//!
//! A law number (`平成五年法律第八十八号`) appears right after the law's
//! name, but the text before the bracket carries no marker of where that
//! name begins. The table answers "how many characters long is the name
//! of the law with this number". Keys are the first
//! [`LAWNUM_KEY_LENGTH`] hex digits of the SHA-512 digest of the law
//! number, read as an integer.
//!
//! The embedded table only covers a handful of frequently cited laws. A
//! citation of any other law is a table miss: the law-name pattern does not
//! match and the number is reported only as a law-number token. Larger
//! tables (for example one generated from a full statute corpus into a
//! `keys:` section) are loaded with [`LawNumTable::from_path`] and layered
//! over the embedded one with [`LawNumTable::extend`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use serde::Deserialize;
use sha2::{Digest, Sha512};

use crate::config::LAWNUM_KEY_LENGTH;
use crate::el::char_len;
use crate::error::{AnalyzerError, Result};

const EMBEDDED_TABLE: &str = include_str!("../data/lawnum_table.yaml");

/// Process-wide table built from the embedded data file.
#[allow(clippy::expect_used)] // Embedded data is validated by the test suite
pub static LAWNUM_TABLE: LazyLock<LawNumTable> = LazyLock::new(|| {
    LawNumTable::from_yaml_str(EMBEDDED_TABLE).expect("embedded law number table is valid")
});

#[derive(Debug, Deserialize)]
struct TableFile {
    #[serde(default)]
    laws: Vec<LawEntry>,
    #[serde(default)]
    keys: HashMap<u32, usize>,
}

#[derive(Debug, Deserialize)]
struct LawEntry {
    law_num: String,
    name: String,
}

/// Map from hashed law number to law-name length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LawNumTable {
    lengths: HashMap<u32, usize>,
}

impl LawNumTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Table key of a law number.
    ///
    /// # Examples
    /// ```
    /// use lawtext_analyzer::lawnum_table::LawNumTable;
    ///
    /// assert_eq!(LawNumTable::law_num_key("平成五年法律第八十八号"), 148_256_555);
    /// ```
    #[must_use]
    pub fn law_num_key(law_num: &str) -> u32 {
        let digest = hex::encode(Sha512::digest(law_num.as_bytes()));
        // Seven hex digits always fit in a u32.
        u32::from_str_radix(&digest[..LAWNUM_KEY_LENGTH], 16).unwrap_or_default()
    }

    /// Register a law by number and name.
    pub fn insert_law(&mut self, law_num: &str, name: &str) {
        self.lengths.insert(Self::law_num_key(law_num), char_len(name));
    }

    /// Register an already hashed key.
    pub fn insert_key(&mut self, key: u32, length: usize) {
        self.lengths.insert(key, length);
    }

    /// Add every entry of `other`, replacing lengths for keys present in
    /// both.
    pub fn extend(&mut self, other: &LawNumTable) {
        self.lengths.extend(other.lengths.iter().map(|(k, v)| (*k, *v)));
    }

    /// Expected name length for a law number; `None` when unknown.
    #[must_use]
    pub fn get_law_name_length(&self, law_num: &str) -> Option<usize> {
        self.lengths.get(&Self::law_num_key(law_num)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Parse a table file with `laws` (number and name) and/or `keys`
    /// (hashed key to length) sections.
    ///
    /// # Errors
    /// Returns `Yaml` for malformed YAML and `InvalidLawNumTable` for empty
    /// names or zero lengths.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: TableFile = serde_yaml_ng::from_str(yaml)?;
        let mut table = Self::new();
        for entry in &file.laws {
            if entry.name.is_empty() || entry.law_num.is_empty() {
                return Err(AnalyzerError::InvalidLawNumTable(format!(
                    "entry '{}' has an empty law number or name",
                    entry.law_num
                )));
            }
            table.insert_law(&entry.law_num, &entry.name);
        }
        for (key, length) in file.keys {
            if length == 0 {
                return Err(AnalyzerError::InvalidLawNumTable(format!(
                    "key {key} has zero length"
                )));
            }
            table.insert_key(key, length);
        }
        Ok(table)
    }

    /// Load a table file from disk.
    ///
    /// # Errors
    /// Returns `Io` if the file cannot be read, otherwise as
    /// [`LawNumTable::from_yaml_str`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_law_num_key_known_values() {
        assert_eq!(LawNumTable::law_num_key("明治二十九年法律第八十九号"), 172_450_791);
        assert_eq!(LawNumTable::law_num_key("平成十七年法律第八十六号"), 103_146_599);
    }

    #[test]
    fn test_embedded_table_loads() {
        assert!(LAWNUM_TABLE.len() >= 12);
        assert_eq!(LAWNUM_TABLE.get_law_name_length("明治二十九年法律第八十九号"), Some(2));
        assert_eq!(LAWNUM_TABLE.get_law_name_length("平成五年法律第八十八号"), Some(5));
        assert_eq!(
            LAWNUM_TABLE.get_law_name_length("平成十五年法律第五十七号"),
            Some(13)
        );
    }

    #[test]
    fn test_miss_is_none() {
        assert_eq!(LAWNUM_TABLE.get_law_name_length("令和九十九年法律第一号"), None);
    }

    #[test]
    fn test_insert_law() {
        let mut table = LawNumTable::new();
        table.insert_law("平成二十六年政令第三百九十四号", "行政不服審査法施行令");
        assert_eq!(
            table.get_law_name_length("平成二十六年政令第三百九十四号"),
            Some(10)
        );
    }

    #[test]
    fn test_extend_layers_over_embedded() {
        let mut table = LAWNUM_TABLE.clone();
        let extra = LawNumTable::from_yaml_str(
            "laws:\n  - law_num: 令和九十九年法律第一号\n    name: 架空法\n  - law_num: 平成五年法律第八十八号\n    name: 手続法\n",
        )
        .unwrap();
        table.extend(&extra);

        assert_eq!(table.len(), LAWNUM_TABLE.len() + 1);
        assert_eq!(table.get_law_name_length("令和九十九年法律第一号"), Some(3));
        assert_eq!(table.get_law_name_length("平成五年法律第八十八号"), Some(3));
        assert_eq!(table.get_law_name_length("明治二十九年法律第八十九号"), Some(2));
    }

    #[test]
    fn test_from_yaml_str_keys_section() {
        let table = LawNumTable::from_yaml_str("keys:\n  148256555: 5\n").unwrap();
        assert_eq!(table.get_law_name_length("平成五年法律第八十八号"), Some(5));
    }

    #[test]
    fn test_from_yaml_str_rejects_empty_name() {
        let yaml = "laws:\n  - law_num: 平成五年法律第八十八号\n    name: ''\n";
        let err = LawNumTable::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidLawNumTable(_)));
    }

    #[test]
    fn test_from_yaml_str_rejects_zero_length() {
        let err = LawNumTable::from_yaml_str("keys:\n  1: 0\n").unwrap_err();
        assert!(err.to_string().contains("zero length"));
    }
}
