//! Classification tables for category tiles.
//!
//! Two ordered tables drive category tiles:
//!
//! - [`CountryTable`]: registration-group prefix → group name
//! - [`PublisherTable`]: registration-group prefix → publisher ranges
//!
//! Table order is part of the rendering contract. Colours are keyed to the
//! position of the matching entry, so entries are kept in a `Vec` exactly as
//! declared in the source file and never re-sorted.
//!
//! # File Format
//!
//! ```json
//! [{"prefix": "978-0", "name": "English language"}]
//! [{"prefix": "978-0", "ranges": [[0, 1999999, 2], [2000000, 2279999, 3]]}]
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::TableError;

/// One registration group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryEntry {
    /// Digits of the prefix with hyphens removed
    pub prefix: String,

    /// Human-readable group name
    pub name: String,
}

/// One publisher sub-range inside a registration group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRule {
    /// Inclusive lower bound of the remaining digits
    pub start: u64,

    /// Inclusive upper bound of the remaining digits
    pub end: u64,

    /// Length of the registrant element; `0` marks an unassigned range
    pub digit_length: u32,
}

impl RangeRule {
    /// Whether `remainder` is assigned by this rule.
    #[inline]
    pub fn matches(&self, remainder: u64) -> bool {
        self.digit_length > 0 && (self.start..=self.end).contains(&remainder)
    }
}

/// Publisher ranges under one registration-group prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublisherEntry {
    /// Digits of the prefix with hyphens removed
    pub prefix: String,

    /// Sub-rules in declared order
    pub rules: Vec<RangeRule>,

    /// Category of `rules[0]`; later rules follow consecutively
    pub first_category: u64,
}

/// Ordered registration-group table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountryTable {
    entries: Vec<CountryEntry>,
}

impl CountryTable {
    /// Build a table from `(prefix, name)` pairs in declared order.
    pub fn new<P, N>(entries: impl IntoIterator<Item = (P, N)>) -> Result<Self, TableError>
    where
        P: AsRef<str>,
        N: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(prefix, name)| {
                Ok(CountryEntry {
                    prefix: normalize_prefix(prefix.as_ref())?,
                    name: name.into(),
                })
            })
            .collect::<Result<_, TableError>>()?;
        Ok(Self { entries })
    }

    /// Load a table from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let raw: Vec<RawCountry> = read_json(path.as_ref()).await?;
        Self::new(raw.into_iter().map(|r| (r.prefix, r.name)))
    }

    /// Entries in declared order.
    pub fn entries(&self) -> &[CountryEntry] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered publisher-range table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublisherTable {
    entries: Vec<PublisherEntry>,
}

impl PublisherTable {
    /// Build a table from `(prefix, rules)` pairs in declared order.
    ///
    /// Each rule gets a category equal to its position in the flattened
    /// table, so `(prefix_index, rule_index)` pairs never collide.
    pub fn new<P>(
        entries: impl IntoIterator<Item = (P, Vec<RangeRule>)>,
    ) -> Result<Self, TableError>
    where
        P: AsRef<str>,
    {
        let mut next_category = 0u64;
        let mut built = Vec::new();

        for (prefix, rules) in entries {
            let prefix = normalize_prefix(prefix.as_ref())?;
            if let Some(bad) = rules.iter().find(|r| r.start > r.end) {
                return Err(TableError::InvalidRange {
                    prefix,
                    start: bad.start,
                    end: bad.end,
                });
            }

            let first_category = next_category;
            next_category += rules.len() as u64;
            built.push(PublisherEntry {
                prefix,
                rules,
                first_category,
            });
        }

        Ok(Self { entries: built })
    }

    /// Load a table from a JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let raw: Vec<RawPublisher> = read_json(path.as_ref()).await?;
        Self::new(raw.into_iter().map(|r| {
            let rules = r
                .ranges
                .into_iter()
                .map(|(start, end, digit_length)| RangeRule {
                    start,
                    end,
                    digit_length,
                })
                .collect();
            (r.prefix, rules)
        }))
    }

    /// Entries in declared order.
    pub fn entries(&self) -> &[PublisherEntry] {
        &self.entries
    }

    /// Number of prefixes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of sub-rules across all prefixes.
    pub fn rule_count(&self) -> usize {
        self.entries.iter().map(|e| e.rules.len()).sum()
    }
}

/// Both classification tables, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct ClassificationTables {
    /// Registration groups
    pub countries: CountryTable,

    /// Publisher ranges
    pub publishers: PublisherTable,
}

impl ClassificationTables {
    /// Load both tables from JSON files.
    pub async fn load(
        countries: impl AsRef<Path>,
        publishers: impl AsRef<Path>,
    ) -> Result<Self, TableError> {
        Ok(Self {
            countries: CountryTable::load(countries).await?,
            publishers: PublisherTable::load(publishers).await?,
        })
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[derive(Debug, Deserialize)]
struct RawCountry {
    prefix: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawPublisher {
    prefix: String,
    ranges: Vec<(u64, u64, u32)>,
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, TableError> {
    let data = tokio::fs::read(path).await.map_err(|e| TableError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_slice(&data).map_err(|e| TableError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Strip hyphens and require a non-empty run of ASCII digits.
fn normalize_prefix(prefix: &str) -> Result<String, TableError> {
    let digits: String = prefix.chars().filter(|&c| c != '-').collect();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TableError::InvalidPrefix(prefix.to_string()));
    }
    Ok(digits)
}
