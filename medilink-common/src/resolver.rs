//! Identity resolution
//!
//! Patients are looked up either by their system identifier (`MED-123456`)
//! or by their national-ID-like number, which people type with or without
//! separators (`1234-5678-9012`, `1234 5678 9012`, `123456789012`). Both
//! comparisons are case-insensitive; the national ID comparison also ignores
//! every non-alphanumeric character. The first matching entity wins.

use tracing::debug;

use crate::models::{Credentialed, Record};
use crate::{Error, Result};

/// A normalized, non-blank lookup query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupKey {
    upper: String,
    stripped: String,
}

impl LookupKey {
    /// Normalize a raw query; blank input yields `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().to_uppercase();
        if upper.is_empty() {
            return None;
        }
        let stripped = strip_separators(&upper);
        Some(Self { upper, stripped })
    }

    /// The trimmed, upper-cased query as shown back to the user
    pub fn as_str(&self) -> &str {
        &self.upper
    }

    fn matches<T: Record>(&self, entity: &T) -> bool {
        if entity.id().to_uppercase() == self.upper {
            return true;
        }
        match entity.secondary_key() {
            Some(secondary) if !self.stripped.is_empty() => {
                strip_separators(secondary) == self.stripped
            }
            _ => false,
        }
    }
}

/// Upper-case and drop everything that is not a letter or digit
pub fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// First entity matching `key`
pub fn find<'a, T: Record>(collection: &'a [T], key: &LookupKey) -> Result<&'a T> {
    let found = collection.iter().find(|entity| key.matches(*entity));
    match found {
        Some(entity) => {
            debug!(query = key.as_str(), id = entity.id(), "Lookup resolved");
            Ok(entity)
        }
        None => {
            debug!(query = key.as_str(), "Lookup missed");
            Err(Error::NotFound(format!(
                "no record in {} for ID: {}",
                T::COLLECTION,
                key.as_str()
            )))
        }
    }
}

/// Normalize then search; a blank query is skipped and yields `Ok(None)`
pub fn resolve<'a, T: Record>(collection: &'a [T], raw_query: &str) -> Result<Option<&'a T>> {
    match LookupKey::parse(raw_query) {
        Some(key) => find(collection, &key).map(Some),
        None => Ok(None),
    }
}

/// First entity whose credential pair matches literally
pub fn authenticate<'a, T>(collection: &'a [T], username: &str, password: &str) -> Result<&'a T>
where
    T: Record + Credentialed,
{
    collection
        .iter()
        .find(|entity| entity.username() == username && entity.password() == password)
        .ok_or_else(|| Error::NotFound("account not found or password incorrect".to_string()))
}
