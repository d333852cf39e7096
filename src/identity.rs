//! Business-key to surrogate-id resolution.
//!
//! One table exists per referenced entity kind. The owning dataset fills it
//! through `ensure`; dependent datasets only read it through `lookup`.

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::capability::IdGenerator;
use crate::error::{PipelineError, PipelineResult};

/// Entity kinds that later datasets reference by business key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    State,
    City,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::State => write!(f, "state"),
            EntityKind::City => write!(f, "city"),
        }
    }
}

/// Append-only map from business key to surrogate id
#[derive(Debug, Clone)]
pub struct IdentityTable {
    kind: EntityKind,
    entries: IndexMap<String, String>,
}

impl IdentityTable {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Return the surrogate id for `key`, assigning one on first sighting.
    ///
    /// An existing id is never replaced, and `ids` is only consulted when the
    /// key is new.
    pub fn ensure(&mut self, key: &str, ids: &dyn IdGenerator) -> PipelineResult<&str> {
        let id = match self.entries.entry(key.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let id = ids.new_id()?;
                tracing::trace!(kind = %self.kind, key, id = %id, "Assigned surrogate id");
                entry.insert(id)
            }
        };
        Ok(id.as_str())
    }

    /// Resolve `key` without modifying the table.
    pub fn lookup(&self, key: &str) -> PipelineResult<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| PipelineError::ReferentialLookup {
                kind: self.kind,
                key: key.to_string(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-sighting order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The identity tables of one run
#[derive(Debug, Clone)]
pub struct IdentityTables {
    pub states: IdentityTable,
    pub cities: IdentityTable,
}

impl IdentityTables {
    pub fn new() -> Self {
        Self {
            states: IdentityTable::new(EntityKind::State),
            cities: IdentityTable::new(EntityKind::City),
        }
    }
}

impl Default for IdentityTables {
    fn default() -> Self {
        Self::new()
    }
}
