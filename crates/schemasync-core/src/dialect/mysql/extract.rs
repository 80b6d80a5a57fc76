//! Structural extraction from MySQL DDL.
//!
//! Line-oriented, best-effort extraction matching the formatting produced
//! by `SHOW CREATE TABLE` / `SHOW CREATE TRIGGER`: one clause per line,
//! backtick-quoted identifiers. Arbitrary hand-written SQL is out of scope.

use std::sync::LazyLock;

use regex::Regex;

use crate::definition::{
    ColumnLine, IndexLine, TableDefinition, TriggerDefinition, TriggerEvent, TriggerTiming,
};
use crate::dialect::DdlExtractor;

static BACKTICK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Matches a bare `KEY` token on a line with quoted spans removed, so a
/// column named `key` or a comment mentioning one does not count.
static KEY_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bKEY\b").unwrap());

static QUOTED_SPAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"`[^`]*`|'[^']*'|"[^"]*""#).unwrap());

static TRIGGER_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bTRIGGER\s+`([^`]+)`\s+(BEFORE|AFTER)\s+(INSERT|UPDATE|DELETE)\s+ON\s+`?([\w$]+)`?",
    )
    .unwrap()
});

fn first_backtick(line: &str) -> Option<String> {
    BACKTICK_RE
        .captures(line)
        .map(|cap| cap[1].to_string())
}

fn has_key_token(line: &str) -> bool {
    let unquoted = QUOTED_SPAN_RE.replace_all(line, "");
    KEY_TOKEN_RE.is_match(&unquoted)
}

/// MySQL structural extractor.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlExtractor;

impl MySqlExtractor {
    /// Creates a new extractor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DdlExtractor for MySqlExtractor {
    fn parse_table(&self, ddl: &str) -> Option<TableDefinition> {
        let mut table_name: Option<String> = None;
        let mut columns = Vec::new();
        let mut primary_key = Vec::new();
        let mut indexes = Vec::new();

        for line in ddl.lines() {
            let line = line.trim();

            if table_name.is_none() {
                if line.contains("CREATE TABLE") {
                    // The table name is the first backtick-quoted token on
                    // the header line; without one there is nothing to key
                    // the definition on.
                    table_name = Some(first_backtick(line)?);
                }
                continue;
            }

            // Engine/options marker or lone closing paren ends the column block.
            if line.starts_with(')') || line.contains("ENGINE=") {
                break;
            }
            if line.is_empty() {
                continue;
            }

            if line.contains("PRIMARY KEY") {
                for cap in BACKTICK_RE.captures_iter(line) {
                    primary_key.push(cap[1].to_string());
                }
                continue;
            }

            let Some(name) = first_backtick(line) else {
                continue;
            };

            if line.contains("UNIQUE KEY") || has_key_token(line) {
                indexes.push(IndexLine {
                    name,
                    definition: line.to_string(),
                });
            } else {
                columns.push(ColumnLine {
                    name,
                    definition: line.to_string(),
                });
            }
        }

        table_name.map(|name| TableDefinition {
            name,
            columns,
            primary_key,
            indexes,
        })
    }

    fn parse_trigger(&self, ddl: &str) -> Option<TriggerDefinition> {
        for line in ddl.lines() {
            // The name is required to be backticked, which also skips past
            // a DEFINER= clause that may itself carry backticks.
            let Some(cap) = TRIGGER_HEADER_RE.captures(line) else {
                continue;
            };
            return Some(TriggerDefinition {
                name: cap[1].to_string(),
                timing: TriggerTiming::parse(&cap[2])?,
                event: TriggerEvent::parse(&cap[3])?,
                table: cap[4].to_string(),
                body: ddl.to_string(),
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn extractor() -> MySqlExtractor {
        MySqlExtractor::new()
    }

    const USERS_DDL: &str = "CREATE TABLE `users` (\n\
        \x20 `id` int(11) NOT NULL AUTO_INCREMENT,\n\
        \x20 `name` varchar(255) NOT NULL,\n\
        \x20 `email` varchar(255) DEFAULT NULL,\n\
        \x20 PRIMARY KEY (`id`),\n\
        \x20 UNIQUE KEY `uniq_email` (`email`),\n\
        \x20 KEY `idx_name` (`name`) USING BTREE\n\
        ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;";

    #[test]
    fn test_parse_table_columns_in_order() {
        let table = extractor().parse_table(USERS_DDL).unwrap();
        assert_eq!(table.name, "users");

        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "email"]);
        assert_eq!(
            table.get_column("email").unwrap().definition,
            "`email` varchar(255) DEFAULT NULL,"
        );
    }

    #[test]
    fn test_parse_table_primary_key_and_indexes() {
        let table = extractor().parse_table(USERS_DDL).unwrap();
        assert_eq!(table.primary_key, vec!["id"]);

        let index_names: Vec<&str> = table.indexes.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(index_names, vec!["uniq_email", "idx_name"]);
        assert_eq!(
            table.get_index("idx_name").unwrap().definition,
            "KEY `idx_name` (`name`) USING BTREE"
        );
    }

    #[test]
    fn test_parse_table_composite_primary_key() {
        let ddl = "CREATE TABLE `m2m` (\n\
            \x20 `left_id` int NOT NULL,\n\
            \x20 `right_id` int NOT NULL,\n\
            \x20 PRIMARY KEY (`left_id`,`right_id`)\n\
            ) ENGINE=InnoDB;";
        let table = extractor().parse_table(ddl).unwrap();
        assert_eq!(table.primary_key, vec!["left_id", "right_id"]);
    }

    #[test]
    fn test_parse_table_column_named_key_is_a_column() {
        let ddl = "CREATE TABLE `config` (\n\
            \x20 `key` varchar(64) NOT NULL,\n\
            \x20 `value` text\n\
            ) ENGINE=InnoDB;";
        let table = extractor().parse_table(ddl).unwrap();
        assert!(table.get_column("key").is_some());
        assert!(table.indexes.is_empty());
    }

    #[test]
    fn test_parse_table_foreign_key_recorded_as_constraint() {
        let ddl = "CREATE TABLE `posts` (\n\
            \x20 `id` int NOT NULL,\n\
            \x20 `user_id` int NOT NULL,\n\
            \x20 CONSTRAINT `fk_posts_user` FOREIGN KEY (`user_id`) REFERENCES `users` (`id`)\n\
            ) ENGINE=InnoDB;";
        let table = extractor().parse_table(ddl).unwrap();
        let fk = table.get_index("fk_posts_user").unwrap();
        assert!(fk.definition.contains("FOREIGN KEY"));
    }

    #[test]
    fn test_parse_table_without_name_is_none() {
        assert!(extractor().parse_table("CREATE TABLE missing (id int)").is_none());
        assert!(extractor().parse_table("SELECT 1").is_none());
    }

    #[test]
    fn test_parse_trigger() {
        let ddl = "CREATE DEFINER=`root`@`localhost` TRIGGER `audit_users` AFTER UPDATE ON `users` FOR EACH ROW\n\
            BEGIN\n\
            \x20 INSERT INTO `audit` VALUES (OLD.`id`);\n\
            END";
        let trigger = extractor().parse_trigger(ddl).unwrap();
        assert_eq!(trigger.name, "audit_users");
        assert_eq!(trigger.timing, TriggerTiming::After);
        assert_eq!(trigger.event, TriggerEvent::Update);
        assert_eq!(trigger.table, "users");
        assert_eq!(trigger.body, ddl);
    }

    #[test]
    fn test_parse_trigger_without_name_is_none() {
        assert!(extractor().parse_trigger("CREATE TRIGGER nameless BEFORE INSERT ON t").is_none());
        assert!(extractor().parse_trigger("CREATE TABLE `t` (`id` int)").is_none());
    }
}
