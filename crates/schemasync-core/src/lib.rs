//! Schema comparison and migration-statement generation for MySQL.
//!
//! `schemasync-core` compares the tables, views, procedures, functions,
//! triggers and events of two database environments and produces the exact
//! statements needed to bring one in line with the other.
//!
//! # Architecture
//!
//! The core is a small compiler-like pipeline over DDL text:
//!
//! - **Splitter** - Turns a whole dump into individual statements, handling
//!   `DELIMITER` redefinition and nested `BEGIN...END` blocks
//! - **Normalizer** - Cleans server- and session-specific noise (definer
//!   clauses, version-guarded comments, keyword case, display widths)
//! - **Extractor** - Parses `CREATE TABLE`/`CREATE TRIGGER` statements into
//!   structured definitions
//! - **Comparator** - Computes additions, modifications and removals
//!   between two definitions or whole snapshots
//! - **Generator** - Emits dependency-ordered ALTER/CREATE/DROP statements
//!
//! The normalizer, extractor and generator are dialect capabilities behind
//! traits, selected through the [`dialect::Dialect`] factory (MySQL today).
//!
//! # Example
//!
//! ```rust,ignore
//! use schemasync_core::prelude::*;
//!
//! let src = SchemaSnapshot::from_dump_file("production.sql", Dialect::MySql)?;
//! let dest = SchemaSnapshot::from_dump_file("staging.sql", Dialect::MySql)?;
//!
//! let comparator = SchemaComparator::new(Dialect::MySql);
//! let diff = comparator.compare(&src, &dest);
//!
//! for statement in Dialect::MySql.generator().schema_sql(&diff) {
//!     println!("{statement};");
//! }
//! ```
//!
//! Everything here is pure and synchronous: fetching DDL from a live
//! connection, executing the generated statements, and persisting results
//! belong to the surrounding drivers and orchestration, not to this crate.

pub mod comparator;
pub mod definition;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod snapshot;
pub mod splitter;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::comparator::{CompareOptions, DuplicateTriggerGroup, SchemaComparator};
    pub use crate::definition::{
        ObjectKind, TableDefinition, TriggerDefinition, TriggerEvent, TriggerTiming,
    };
    pub use crate::dialect::{DdlExtractor, DdlNormalizer, Dialect, SqlGenerator};
    pub use crate::diff::{
        DiffOperation, DiffSummary, ObjectChange, ObjectDiff, SchemaDiff, TableDiff,
    };
    pub use crate::error::{Result, SyncError};
    pub use crate::snapshot::{SchemaSnapshot, SchemaSource};
    pub use crate::splitter::StatementSplitter;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_pipeline_from_dump_to_sql() {
        let src_dump = "\
CREATE TABLE `users` (\n\
  `id` int(11) NOT NULL AUTO_INCREMENT,\n\
  `name` varchar(255) NOT NULL,\n\
  `age` int(11) DEFAULT NULL,\n\
  PRIMARY KEY (`id`),\n\
  KEY `idx_name` (`name`)\n\
) ENGINE=InnoDB;\n";
        let dest_dump = "\
CREATE TABLE `users` (\n\
  `id` int(11) NOT NULL AUTO_INCREMENT,\n\
  `name` varchar(255) NOT NULL,\n\
  PRIMARY KEY (`id`)\n\
) ENGINE=InnoDB;\n";

        let src = SchemaSnapshot::from_dump(src_dump, Dialect::MySql);
        let dest = SchemaSnapshot::from_dump(dest_dump, Dialect::MySql);

        let diff = SchemaComparator::new(Dialect::MySql).compare(&src, &dest);
        let sql = Dialect::MySql.generator().schema_sql(&diff);

        assert_eq!(sql.len(), 1);
        assert!(sql[0].contains("ALTER TABLE `users`"));
        assert!(sql[0].contains("ADD COLUMN `age` int(11) DEFAULT NULL AFTER `name`"));
        assert!(sql[0].contains("ADD KEY `idx_name` (`name`)"));
    }

    #[test]
    fn test_pipeline_no_changes_is_empty() {
        let dump = "CREATE TABLE `t` (\n  `id` int NOT NULL\n) ENGINE=InnoDB;\n";
        let snapshot = SchemaSnapshot::from_dump(dump, Dialect::MySql);

        let diff = SchemaComparator::new(Dialect::MySql).compare(&snapshot, &snapshot);
        assert!(!diff.has_changes());
        assert!(Dialect::MySql.generator().schema_sql(&diff).is_empty());
    }
}
