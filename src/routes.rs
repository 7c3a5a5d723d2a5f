//! Outflow routes: extension or keyword → destination directory.
//!
//! Keys are stored lowercase and without a leading dot. A key is unique;
//! writing it again replaces the destination but keeps the key's original
//! registration position, because classification walks routes in the order
//! they were registered and the first match wins.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Errors raised when editing a route table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The key was empty after normalization.
    #[error("route key must not be empty")]
    EmptyKey,
}

/// A single rule binding an extension or keyword to a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutflowRoute {
    /// Lowercase extension or free-text keyword.
    pub key: String,
    /// Directory files matching this route are moved into.
    pub destination: PathBuf,
}

impl OutflowRoute {
    /// Whether the destination currently exists as a directory.
    pub fn is_available(&self) -> bool {
        self.destination.is_dir()
    }
}

/// Ordered set of outflow routes with unique keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<OutflowRoute>,
}

impl RouteTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizes a user-supplied key: trimmed, no leading dot, lowercase.
    pub fn normalize_key(key: &str) -> Result<String, RouteError> {
        let key = key.trim().trim_start_matches('.').to_lowercase();
        if key.is_empty() {
            Err(RouteError::EmptyKey)
        } else {
            Ok(key)
        }
    }

    /// Inserts or overwrites a route, returning the previous destination.
    pub fn insert(
        &mut self,
        key: &str,
        destination: impl Into<PathBuf>,
    ) -> Result<Option<PathBuf>, RouteError> {
        let key = Self::normalize_key(key)?;
        let destination = destination.into();

        if let Some(existing) = self.routes.iter_mut().find(|route| route.key == key) {
            return Ok(Some(std::mem::replace(&mut existing.destination, destination)));
        }

        self.routes.push(OutflowRoute { key, destination });
        Ok(None)
    }

    /// Removes the route for `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<OutflowRoute> {
        let key = Self::normalize_key(key).ok()?;
        let index = self.routes.iter().position(|route| route.key == key)?;
        Some(self.routes.remove(index))
    }

    /// Looks up the route registered for `key`.
    pub fn get(&self, key: &str) -> Option<&OutflowRoute> {
        let key = Self::normalize_key(key).ok()?;
        self.routes.iter().find(|route| route.key == key)
    }

    /// Iterates routes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &OutflowRoute> {
        self.routes.iter()
    }

    /// Distinct destination directories, in the order they first appear.
    pub fn destinations(&self) -> Vec<&Path> {
        let mut seen: Vec<&Path> = Vec::new();
        for route in &self.routes {
            if !seen.contains(&route.destination.as_path()) {
                seen.push(&route.destination);
            }
        }
        seen
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Serialize for RouteTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.routes.len()))?;
        for route in &self.routes {
            map.serialize_entry(&route.key, &route.destination)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RouteTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RouteTableVisitor;

        impl<'de> Visitor<'de> for RouteTableVisitor {
            type Value = RouteTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of extension or keyword to directory")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RouteTable, A::Error> {
                let mut table = RouteTable::new();
                while let Some((key, destination)) = access.next_entry::<String, PathBuf>()? {
                    table
                        .insert(&key, destination)
                        .map_err(serde::de::Error::custom)?;
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(RouteTableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_normalized() {
        let mut table = RouteTable::new();
        table.insert(".PDF", "/docs").unwrap();

        assert_eq!(table.get("pdf").unwrap().destination, PathBuf::from("/docs"));
        assert_eq!(table.get("Pdf").unwrap().key, "pdf");
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut table = RouteTable::new();
        assert_eq!(table.insert("  . ", "/x"), Err(RouteError::EmptyKey));
        assert!(table.is_empty());
    }

    #[test]
    fn test_overwrite_keeps_registration_position() {
        let mut table = RouteTable::new();
        table.insert("pdf", "/docs").unwrap();
        table.insert("invoice", "/invoices").unwrap();

        let previous = table.insert("pdf", "/papers").unwrap();

        assert_eq!(previous, Some(PathBuf::from("/docs")));
        let keys: Vec<_> = table.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["pdf", "invoice"]);
        assert_eq!(table.get("pdf").unwrap().destination, PathBuf::from("/papers"));
    }

    #[test]
    fn test_remove() {
        let mut table = RouteTable::new();
        table.insert("mp3", "/music").unwrap();

        assert!(table.remove("MP3").is_some());
        assert!(table.remove("mp3").is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn test_destinations_are_distinct_and_ordered() {
        let mut table = RouteTable::new();
        table.insert("jpg", "/pictures").unwrap();
        table.insert("pdf", "/docs").unwrap();
        table.insert("png", "/pictures").unwrap();

        assert_eq!(
            table.destinations(),
            vec![Path::new("/pictures"), Path::new("/docs")]
        );
    }

    #[test]
    fn test_serde_preserves_order() {
        let json = r#"{"zip": "/archives", "invoice": "/bills", "apk": "/phone"}"#;
        let table: RouteTable = serde_json::from_str(json).unwrap();

        let keys: Vec<_> = table.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["zip", "invoice", "apk"]);

        let back = serde_json::to_string(&table).unwrap();
        assert_eq!(back, r#"{"zip":"/archives","invoice":"/bills","apk":"/phone"}"#);
    }
}
