//! Structural definitions extracted from DDL text.
//!
//! These types hold the "structured view" of a table or trigger that the
//! comparator diffs. They are text-first: a column or index keeps the raw
//! definition line it was extracted from, so regeneration preserves the
//! source formatting. Definitions are built fresh per comparison and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};

/// The kinds of database objects the core can compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectKind {
    /// A base table.
    Table,
    /// A view.
    View,
    /// A stored procedure.
    Procedure,
    /// A stored function.
    Function,
    /// A trigger.
    Trigger,
    /// A scheduled event.
    Event,
}

impl ObjectKind {
    /// All object kinds, in comparison order.
    pub const ALL: [Self; 6] = [
        Self::Table,
        Self::View,
        Self::Procedure,
        Self::Function,
        Self::Trigger,
        Self::Event,
    ];

    /// Returns the SQL keyword naming this kind in CREATE/DROP statements.
    #[must_use]
    pub fn sql_keyword(self) -> &'static str {
        match self {
            Self::Table => "TABLE",
            Self::View => "VIEW",
            Self::Procedure => "PROCEDURE",
            Self::Function => "FUNCTION",
            Self::Trigger => "TRIGGER",
            Self::Event => "EVENT",
        }
    }
}

/// When a trigger fires relative to the row operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriggerTiming {
    /// Fires before the row operation.
    Before,
    /// Fires after the row operation.
    After,
}

impl TriggerTiming {
    /// Parses the keyword as it appears in DDL.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "BEFORE" => Some(Self::Before),
            "AFTER" => Some(Self::After),
            _ => None,
        }
    }
}

/// The row operation a trigger fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TriggerEvent {
    /// Fires on INSERT.
    Insert,
    /// Fires on UPDATE.
    Update,
    /// Fires on DELETE.
    Delete,
}

impl TriggerEvent {
    /// Parses the keyword as it appears in DDL.
    #[must_use]
    pub fn parse(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One column of a table: its name and the raw definition line it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLine {
    /// Column name (without quoting).
    pub name: String,
    /// The entire trimmed definition line, formatting preserved.
    pub definition: String,
}

/// One index (or table constraint) of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexLine {
    /// Index name (without quoting).
    pub name: String,
    /// The entire trimmed definition line, formatting preserved.
    pub definition: String,
}

/// Structured view of a `CREATE TABLE` statement.
///
/// Column order is insertion order from the source text and is semantically
/// significant: it is used to compute `AFTER <column>` positioning when
/// generating ADD COLUMN clauses.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table name.
    pub name: String,
    /// Column definitions, in source order.
    pub columns: Vec<ColumnLine>,
    /// Primary key column(s), in source order.
    pub primary_key: Vec<String>,
    /// Index and constraint definitions, keyed by name.
    pub indexes: Vec<IndexLine>,
}

impl TableDefinition {
    /// Creates an empty table definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a column definition.
    #[must_use]
    pub fn column(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.columns.push(ColumnLine {
            name: name.into(),
            definition: definition.into(),
        });
        self
    }

    /// Adds an index definition.
    #[must_use]
    pub fn index(mut self, name: impl Into<String>, definition: impl Into<String>) -> Self {
        self.indexes.push(IndexLine {
            name: name.into(),
            definition: definition.into(),
        });
        self
    }

    /// Sets the primary key columns.
    #[must_use]
    pub fn primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    /// Gets a column by name.
    #[must_use]
    pub fn get_column(&self, name: &str) -> Option<&ColumnLine> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Gets an index by name.
    #[must_use]
    pub fn get_index(&self, name: &str) -> Option<&IndexLine> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Returns the name of the column preceding `name` in source order,
    /// or `None` if `name` is the first column (or unknown).
    #[must_use]
    pub fn column_before(&self, name: &str) -> Option<&str> {
        let pos = self.columns.iter().position(|c| c.name == name)?;
        if pos == 0 {
            None
        } else {
            Some(self.columns[pos - 1].name.as_str())
        }
    }
}

/// Structured view of a `CREATE TRIGGER` statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    /// Trigger name.
    pub name: String,
    /// BEFORE or AFTER.
    pub timing: TriggerTiming,
    /// INSERT, UPDATE or DELETE.
    pub event: TriggerEvent,
    /// The table the trigger is attached to.
    pub table: String,
    /// The full statement text, retained verbatim for equality comparison.
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_definition_builder() {
        let table = TableDefinition::new("users")
            .column("id", "`id` INT NOT NULL AUTO_INCREMENT,")
            .column("name", "`name` varchar(255) DEFAULT NULL,")
            .primary_key(vec!["id".to_string()])
            .index("idx_name", "KEY `idx_name` (`name`)");

        assert_eq!(table.name, "users");
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.primary_key, vec!["id"]);
        assert!(table.get_column("name").is_some());
        assert!(table.get_index("idx_name").is_some());
        assert!(table.get_column("missing").is_none());
    }

    #[test]
    fn test_column_before() {
        let table = TableDefinition::new("t")
            .column("a", "`a` INT,")
            .column("b", "`b` INT,")
            .column("c", "`c` INT");

        assert_eq!(table.column_before("a"), None);
        assert_eq!(table.column_before("b"), Some("a"));
        assert_eq!(table.column_before("c"), Some("b"));
        assert_eq!(table.column_before("zzz"), None);
    }

    #[test]
    fn test_trigger_keyword_parsing() {
        assert_eq!(TriggerTiming::parse("before"), Some(TriggerTiming::Before));
        assert_eq!(TriggerTiming::parse("AFTER"), Some(TriggerTiming::After));
        assert_eq!(TriggerTiming::parse("DURING"), None);
        assert_eq!(TriggerEvent::parse("Insert"), Some(TriggerEvent::Insert));
        assert_eq!(TriggerEvent::parse("TRUNCATE"), None);
    }

    #[test]
    fn test_object_kind_keywords() {
        assert_eq!(ObjectKind::Table.sql_keyword(), "TABLE");
        assert_eq!(ObjectKind::Procedure.sql_keyword(), "PROCEDURE");
        assert_eq!(ObjectKind::ALL.len(), 6);
    }
}
