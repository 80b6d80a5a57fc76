//! Migration SQL generation for MySQL.

use crate::diff::{DiffOperation, ObjectChange, ObjectDiff, SchemaDiff, TableDiff};
use crate::dialect::SqlGenerator;

/// MySQL SQL generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlGenerator;

impl MySqlGenerator {
    /// Creates a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn quote_identifier(name: &str) -> String {
        format!("`{name}`")
    }

    /// Renders the ALTER clauses for a table diff, bucketed into the fixed
    /// order DROP INDEX, DROP COLUMN, MODIFY COLUMN, ADD COLUMN, ADD INDEX.
    ///
    /// The order guarantees that no clause references a column or index a
    /// later clause in the same statement removes, and that an index is not
    /// re-added before a modification of its column is visible.
    fn alter_clauses(diff: &TableDiff) -> Vec<String> {
        let mut drop_indexes = Vec::new();
        let mut drop_columns = Vec::new();
        let mut modify_columns = Vec::new();
        let mut add_columns = Vec::new();
        let mut add_indexes = Vec::new();

        for op in &diff.operations {
            match op {
                DiffOperation::DropIndex { name } => {
                    drop_indexes.push(format!("DROP INDEX {}", Self::quote_identifier(name)));
                }
                DiffOperation::DropColumn { name } => {
                    drop_columns.push(format!("DROP COLUMN {}", Self::quote_identifier(name)));
                }
                DiffOperation::ModifyColumn { definition, .. } => {
                    modify_columns.push(format!("MODIFY COLUMN {definition}"));
                }
                DiffOperation::AddColumn { definition, .. } => {
                    add_columns.push(format!("ADD COLUMN {definition}"));
                }
                DiffOperation::AddIndex { definition, .. } => {
                    add_indexes.push(format!("ADD {definition}"));
                }
            }
        }

        let mut clauses = drop_indexes;
        clauses.extend(drop_columns);
        clauses.extend(modify_columns);
        clauses.extend(add_columns);
        clauses.extend(add_indexes);
        clauses
    }
}

impl SqlGenerator for MySqlGenerator {
    fn table_sql(&self, diff: &TableDiff) -> Vec<String> {
        let clauses = Self::alter_clauses(diff);
        if clauses.is_empty() {
            return Vec::new();
        }
        vec![format!(
            "ALTER TABLE {} {}",
            Self::quote_identifier(&diff.table),
            clauses.join(", ")
        )]
    }

    fn object_sql(&self, diff: &ObjectDiff) -> Vec<String> {
        let mut statements = Vec::new();

        if matches!(diff.change, ObjectChange::Drop | ObjectChange::Replace) {
            statements.push(format!(
                "DROP {} IF EXISTS {}",
                diff.kind.sql_keyword(),
                Self::quote_identifier(&diff.name)
            ));
        }

        if matches!(diff.change, ObjectChange::Create | ObjectChange::Replace) {
            if let Some(definition) = &diff.definition {
                statements.push(definition.clone());
            }
        }

        statements
    }

    fn schema_sql(&self, diff: &SchemaDiff) -> Vec<String> {
        let mut statements = Vec::new();

        for table in &diff.dropped_tables {
            statements.push(format!(
                "DROP TABLE IF EXISTS {}",
                Self::quote_identifier(table)
            ));
        }

        for object in &diff.objects {
            if object.change == ObjectChange::Drop {
                statements.extend(self.object_sql(object));
            }
        }

        for table in &diff.created_tables {
            statements.push(table.ddl.clone());
        }

        for table_diff in diff.tables.values() {
            statements.extend(self.table_sql(table_diff));
        }

        for object in &diff.objects {
            if object.change != ObjectChange::Drop {
                statements.extend(self.object_sql(object));
            }
        }

        statements
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::definition::ObjectKind;
    use crate::diff::CreatedTable;

    fn generator() -> MySqlGenerator {
        MySqlGenerator::new()
    }

    #[test]
    fn test_empty_table_diff_is_noop() {
        let diff = TableDiff::new("users");
        assert!(generator().table_sql(&diff).is_empty());
    }

    #[test]
    fn test_single_alter_statement_per_table() {
        let mut diff = TableDiff::new("users");
        diff.operations.push(DiffOperation::add_column(
            "age",
            "`age` INT DEFAULT NULL AFTER `name`",
        ));
        diff.operations.push(DiffOperation::drop_column("legacy"));

        let sql = generator().table_sql(&diff);
        assert_eq!(sql.len(), 1);
        assert_eq!(
            sql[0],
            "ALTER TABLE `users` DROP COLUMN `legacy`, ADD COLUMN `age` INT DEFAULT NULL AFTER `name`"
        );
    }

    #[test]
    fn test_clause_order_is_fixed_regardless_of_discovery_order() {
        let mut diff = TableDiff::new("users");
        // Deliberately scrambled discovery order.
        diff.operations.push(DiffOperation::add_index(
            "idx_name",
            "KEY `idx_name` (`name`)",
        ));
        diff.operations.push(DiffOperation::add_column("age", "`age` INT FIRST"));
        diff.operations
            .push(DiffOperation::modify_column("name", "`name` varchar(100) NOT NULL"));
        diff.operations.push(DiffOperation::drop_column("legacy"));
        diff.operations.push(DiffOperation::drop_index("idx_old"));

        let sql = generator().table_sql(&diff);
        let stmt = &sql[0];

        let drop_index = stmt.find("DROP INDEX").unwrap();
        let drop_column = stmt.find("DROP COLUMN").unwrap();
        let modify = stmt.find("MODIFY COLUMN").unwrap();
        let add_column = stmt.find("ADD COLUMN").unwrap();
        let add_index = stmt.find("ADD KEY").unwrap();

        assert!(drop_index < drop_column);
        assert!(drop_column < modify);
        assert!(modify < add_column);
        assert!(add_column < add_index);
    }

    #[test]
    fn test_object_drop() {
        let sql = generator().object_sql(&ObjectDiff::drop(ObjectKind::View, "v_users"));
        assert_eq!(sql, vec!["DROP VIEW IF EXISTS `v_users`".to_string()]);
    }

    #[test]
    fn test_object_replace_is_drop_then_create() {
        let diff = ObjectDiff::replace(
            ObjectKind::Procedure,
            "cleanup",
            "CREATE PROCEDURE `cleanup`() BEGIN DELETE FROM `log`; END",
        );
        let sql = generator().object_sql(&diff);
        assert_eq!(sql.len(), 2);
        assert_eq!(sql[0], "DROP PROCEDURE IF EXISTS `cleanup`");
        assert!(sql[1].starts_with("CREATE PROCEDURE"));
    }

    #[test]
    fn test_schema_phase_ordering() {
        let mut diff = SchemaDiff::default();
        diff.dropped_tables.push("legacy".to_string());
        diff.created_tables.push(CreatedTable {
            name: "audit".to_string(),
            ddl: "CREATE TABLE `audit` (`id` INT NOT NULL)".to_string(),
        });
        diff.objects
            .push(ObjectDiff::drop(ObjectKind::View, "v_old"));
        diff.objects.push(ObjectDiff::create(
            ObjectKind::View,
            "v_new",
            "CREATE VIEW `v_new` AS SELECT 1",
        ));
        let mut users = TableDiff::new("users");
        users.operations.push(DiffOperation::drop_column("unused"));
        diff.tables.insert("users".to_string(), users);

        let sql = generator().schema_sql(&diff);
        let script = sql.join(";\n");

        let drop_table = script.find("DROP TABLE IF EXISTS `legacy`").unwrap();
        let drop_view = script.find("DROP VIEW IF EXISTS `v_old`").unwrap();
        let create_table = script.find("CREATE TABLE `audit`").unwrap();
        let alter = script.find("ALTER TABLE `users`").unwrap();
        let create_view = script.find("CREATE VIEW `v_new`").unwrap();

        assert!(drop_table < drop_view);
        assert!(drop_view < create_table);
        assert!(create_table < alter);
        assert!(alter < create_view);
    }
}
