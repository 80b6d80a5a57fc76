//! Diff data model.
//!
//! A diff is a self-contained set of instructions for bringing a destination
//! environment in line with a source environment. Operations carry no
//! reference to the definitions they were derived from; everything the
//! generator needs is embedded in the operation itself.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definition::ObjectKind;
use crate::error::Result;

/// A single change to a table: add/modify/drop a column or index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiffOperation {
    /// Add a column. The definition already carries its position clause
    /// (`FIRST` or `` AFTER `column` ``).
    AddColumn {
        /// Column name.
        name: String,
        /// Full column definition including the position clause.
        definition: String,
    },

    /// Modify an existing column in place.
    ModifyColumn {
        /// Column name.
        name: String,
        /// Full replacement definition.
        definition: String,
    },

    /// Drop a column.
    DropColumn {
        /// Column name.
        name: String,
    },

    /// Add an index (or table constraint).
    AddIndex {
        /// Index name.
        name: String,
        /// Full index definition as it appeared in the source table.
        definition: String,
    },

    /// Drop an index. Index modification has no atomic primitive; it is
    /// always a `DropIndex` immediately followed by an `AddIndex`.
    DropIndex {
        /// Index name.
        name: String,
    },
}

impl DiffOperation {
    /// Creates an `AddColumn` operation.
    #[must_use]
    pub fn add_column(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self::AddColumn {
            name: name.into(),
            definition: definition.into(),
        }
    }

    /// Creates a `ModifyColumn` operation.
    #[must_use]
    pub fn modify_column(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self::ModifyColumn {
            name: name.into(),
            definition: definition.into(),
        }
    }

    /// Creates a `DropColumn` operation.
    #[must_use]
    pub fn drop_column(name: impl Into<String>) -> Self {
        Self::DropColumn { name: name.into() }
    }

    /// Creates an `AddIndex` operation.
    #[must_use]
    pub fn add_index(name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self::AddIndex {
            name: name.into(),
            definition: definition.into(),
        }
    }

    /// Creates a `DropIndex` operation.
    #[must_use]
    pub fn drop_index(name: impl Into<String>) -> Self {
        Self::DropIndex { name: name.into() }
    }

    /// Returns the column or index name this operation targets.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::AddColumn { name, .. }
            | Self::ModifyColumn { name, .. }
            | Self::DropColumn { name }
            | Self::AddIndex { name, .. }
            | Self::DropIndex { name } => name,
        }
    }

    /// Returns a human-readable description of this operation.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::AddColumn { name, .. } => format!("Add column '{name}'"),
            Self::ModifyColumn { name, .. } => format!("Modify column '{name}'"),
            Self::DropColumn { name } => format!("Drop column '{name}'"),
            Self::AddIndex { name, .. } => format!("Add index '{name}'"),
            Self::DropIndex { name } => format!("Drop index '{name}'"),
        }
    }
}

/// All changes detected for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDiff {
    /// Table name.
    pub table: String,
    /// Operations in discovery order.
    pub operations: Vec<DiffOperation>,
}

impl TableDiff {
    /// Creates an empty diff for `table`.
    #[must_use]
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            operations: Vec::new(),
        }
    }

    /// Returns true if the diff contains any operation.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.operations.is_empty()
    }
}

/// The verdict for a non-table object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectChange {
    /// Object exists only in the source: create it.
    Create,
    /// Object exists only in the destination: drop it.
    Drop,
    /// Object exists in both with differing definitions: drop and recreate.
    Replace,
}

/// A create/drop/replace verdict for a view, procedure, function, trigger
/// or event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDiff {
    /// Object name.
    pub name: String,
    /// Object kind.
    pub kind: ObjectKind,
    /// What to do with the object.
    pub change: ObjectChange,
    /// The source definition; present for `Create`/`Replace`, absent for
    /// `Drop`.
    pub definition: Option<String>,
}

impl ObjectDiff {
    /// Creates a `Create` verdict.
    #[must_use]
    pub fn create(kind: ObjectKind, name: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            change: ObjectChange::Create,
            definition: Some(definition.into()),
        }
    }

    /// Creates a `Drop` verdict.
    #[must_use]
    pub fn drop(kind: ObjectKind, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            change: ObjectChange::Drop,
            definition: None,
        }
    }

    /// Creates a `Replace` verdict.
    #[must_use]
    pub fn replace(
        kind: ObjectKind,
        name: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            change: ObjectChange::Replace,
            definition: Some(definition.into()),
        }
    }
}

/// A table present only in the source, to be created on the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTable {
    /// Table name.
    pub name: String,
    /// Cleaned source DDL, emitted verbatim.
    pub ddl: String,
}

/// Counts of what a compare run found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DiffSummary {
    /// Tables with column/index changes.
    pub tables_changed: usize,
    /// Tables present only in the source.
    pub tables_created: usize,
    /// Tables present only in the destination.
    pub tables_dropped: usize,
    /// Objects to create.
    pub objects_created: usize,
    /// Objects to drop.
    pub objects_dropped: usize,
    /// Objects to drop and recreate.
    pub objects_replaced: usize,
}

/// The aggregate result of one compare run. Constructed once and read-only
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Changed tables, keyed by table name.
    pub tables: BTreeMap<String, TableDiff>,
    /// Tables present only in the source.
    pub created_tables: Vec<CreatedTable>,
    /// Tables present only in the destination.
    pub dropped_tables: Vec<String>,
    /// Non-table object verdicts.
    pub objects: Vec<ObjectDiff>,
    /// Counts.
    pub summary: DiffSummary,
}

impl SchemaDiff {
    /// Returns true if anything needs to change.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.tables.is_empty()
            || !self.created_tables.is_empty()
            || !self.dropped_tables.is_empty()
            || !self.objects.is_empty()
    }

    /// Renders the diff as JSON for downstream consumers.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
