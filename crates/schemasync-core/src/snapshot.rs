//! Schema snapshots and the introspection seam.
//!
//! A [`SchemaSnapshot`] is the complete set of object definitions for one
//! environment, keyed by kind and name. Snapshots are what the comparator
//! consumes; where the DDL text comes from (a live connection, a dump
//! file) is behind the [`SchemaSource`] trait.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::definition::ObjectKind;
use crate::dialect::Dialect;
use crate::error::{Result, SyncError};
use crate::splitter::StatementSplitter;

static CREATE_OBJECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*CREATE\s+(?:OR\s+REPLACE\s+)?(?:ALGORITHM\s*=\s*\S+\s+)?(?:SQL\s+SECURITY\s+(?:DEFINER|INVOKER)\s+)?(TABLE|VIEW|PROCEDURE|FUNCTION|TRIGGER|EVENT)\b",
    )
    .unwrap()
});

static BACKTICK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

fn classify_kind(keyword: &str) -> ObjectKind {
    match keyword.to_ascii_uppercase().as_str() {
        "VIEW" => ObjectKind::View,
        "PROCEDURE" => ObjectKind::Procedure,
        "FUNCTION" => ObjectKind::Function,
        "TRIGGER" => ObjectKind::Trigger,
        "EVENT" => ObjectKind::Event,
        _ => ObjectKind::Table,
    }
}

/// All object definitions of one environment, keyed by kind and name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    maps: BTreeMap<ObjectKind, BTreeMap<String, String>>,
}

impl SchemaSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from dump text by splitting it into statements
    /// and classifying each CREATE statement by kind and name.
    ///
    /// Statements that are not CREATE statements (dump preambles, session
    /// settings, locks) are ignored, as are CREATE statements without a
    /// backtick-quoted name.
    #[must_use]
    pub fn from_dump(dump: &str, dialect: Dialect) -> Self {
        let normalizer = dialect.normalizer();
        let mut snapshot = Self::new();

        for statement in StatementSplitter::new(dump, normalizer) {
            let cleaned = normalizer.clean(&statement);
            let Some(header) = CREATE_OBJECT_RE.captures(&cleaned) else {
                debug!(
                    statement = %statement.lines().next().unwrap_or_default(),
                    "Skipping non-CREATE statement"
                );
                continue;
            };

            let kind = classify_kind(&header[1]);
            let rest = &cleaned[header.get(0).map_or(0, |m| m.end())..];
            let Some(name) = BACKTICK_RE.captures(rest).map(|cap| cap[1].to_string()) else {
                debug!(
                    statement = %statement.lines().next().unwrap_or_default(),
                    "Skipping CREATE statement without a quoted name"
                );
                continue;
            };

            snapshot.insert(kind, name, statement);
        }

        snapshot
    }

    /// Builds a snapshot from a dump file on disk.
    ///
    /// An unreadable file is the one hard failure of snapshot
    /// construction; everything else degrades to skipped statements.
    pub fn from_dump_file(path: impl AsRef<Path>, dialect: Dialect) -> Result<Self> {
        let path = path.as_ref();
        let dump = std::fs::read_to_string(path).map_err(|source| SyncError::DumpUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_dump(&dump, dialect))
    }

    /// Records a definition.
    pub fn insert(&mut self, kind: ObjectKind, name: impl Into<String>, ddl: impl Into<String>) {
        self.maps
            .entry(kind)
            .or_default()
            .insert(name.into(), ddl.into());
    }

    /// Returns the names of all objects of `kind`, sorted.
    pub fn names(&self, kind: ObjectKind) -> impl Iterator<Item = &str> {
        self.maps
            .get(&kind)
            .into_iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// Returns the DDL for one object.
    #[must_use]
    pub fn get(&self, kind: ObjectKind, name: &str) -> Option<&str> {
        self.maps.get(&kind)?.get(name).map(String::as_str)
    }

    /// Returns the number of objects of `kind`.
    #[must_use]
    pub fn count(&self, kind: ObjectKind) -> usize {
        self.maps.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Returns true if the snapshot holds no objects at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.maps.values().all(BTreeMap::is_empty)
    }
}

/// Read-only retrieval of object definitions from an environment.
///
/// Implemented by [`SchemaSnapshot`] itself and by whatever introspection
/// providers the caller supplies (live connections, parsed dumps). The
/// core only requires the returned text to follow the introspection
/// layer's formatting: one clause per line, backtick-quoted identifiers.
pub trait SchemaSource {
    /// Lists the names of all objects of `kind`.
    fn object_names(&self, kind: ObjectKind) -> Vec<String>;

    /// Fetches the DDL for one object.
    fn object_ddl(&self, kind: ObjectKind, name: &str) -> Option<String>;

    /// Assembles a full snapshot from this source.
    fn snapshot(&self) -> SchemaSnapshot {
        let mut snapshot = SchemaSnapshot::new();
        for kind in ObjectKind::ALL {
            for name in self.object_names(kind) {
                if let Some(ddl) = self.object_ddl(kind, &name) {
                    snapshot.insert(kind, name, ddl);
                }
            }
        }
        snapshot
    }
}

impl SchemaSource for SchemaSnapshot {
    fn object_names(&self, kind: ObjectKind) -> Vec<String> {
        self.names(kind).map(str::to_string).collect()
    }

    fn object_ddl(&self, kind: ObjectKind, name: &str) -> Option<String> {
        self.get(kind, name).map(str::to_string)
    }
}
