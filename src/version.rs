//! Version strings as they appear in directory names of a distribution.
//!
//! A version looks like `1.0.0`, `1.0.0-preview2-003121` or just `2`.
//! Everything before the first hyphen is the core (dot-separated fields);
//! the rest, hyphen included, is build metadata compared lexically.
//!
//! # Ordering
//!
//! 1. Core fields pairwise. Numeric fields compare numerically, text fields
//!    lexically, and a numeric field ranks below a text field.
//! 2. Equal common prefix: more core fields ranks higher.
//! 3. Equal cores: no metadata ranks above any metadata; two metadata
//!    suffixes compare lexically.
//! 4. Raw string as the last tie-break, so ordering agrees with equality.

use std::cmp::Ordering;
use std::fmt;

/// One dot-separated field of a version core.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Field {
    Numeric(u64),
    Text(String),
}

impl Field {
    fn parse(raw: &str) -> Self {
        match raw.parse::<u64>() {
            Ok(n) => Field::Numeric(n),
            Err(_) => Field::Text(raw.to_string()),
        }
    }
}

impl Ord for Field {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Field::Numeric(a), Field::Numeric(b)) => a.cmp(b),
            (Field::Text(a), Field::Text(b)) => a.cmp(b),
            (Field::Numeric(_), Field::Text(_)) => Ordering::Less,
            (Field::Text(_), Field::Numeric(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Field {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed version string. Immutable; displays as the string it was parsed from.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    core: Vec<Field>,
    metadata: Option<String>,
}

impl Version {
    /// Parse a version string. Never fails: any string is a version,
    /// possibly one made of text fields only.
    pub fn parse(raw: &str) -> Self {
        let (core, metadata) = match raw.find('-') {
            Some(idx) => (&raw[..idx], Some(raw[idx..].to_string())),
            None => (raw, None),
        };
        Self {
            raw: raw.to_string(),
            core: core.split('.').map(Field::parse).collect(),
            metadata,
        }
    }

    /// Number of dot-separated fields before the metadata suffix.
    pub fn core_len(&self) -> usize {
        self.core.len()
    }

    /// Build metadata, including its leading hyphen.
    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    /// Strict "takes precedence over" test.
    pub fn is_greater(&self, other: &Version) -> bool {
        self.cmp(other) == Ordering::Greater
    }

    fn cmp_metadata(&self, other: &Version) -> Ordering {
        match (&self.metadata, &other.metadata) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        for (a, b) in self.core.iter().zip(other.core.iter()) {
            match a.cmp(b) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }
        self.core
            .len()
            .cmp(&other.core.len())
            .then_with(|| self.cmp_metadata(other))
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
