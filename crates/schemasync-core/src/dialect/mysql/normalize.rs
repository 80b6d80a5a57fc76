//! DDL text normalization for MySQL.
//!
//! Two forms are produced: `clean` keeps the source formatting and is safe
//! to emit, `compare_form` collapses everything and is used only for
//! equality checks. Normalization is idempotent and never fails.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::DdlNormalizer;

/// Reserved words uppercased by [`MySqlNormalizer::clean`]. Quoted
/// identifiers and string literals are never touched, so a column literally
/// named `group` keeps its case.
static KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "ACTION",
        "ADD",
        "AFTER",
        "ALTER",
        "AND",
        "AS",
        "ASC",
        "AUTO_INCREMENT",
        "BEFORE",
        "BEGIN",
        "BETWEEN",
        "BIGINT",
        "BINARY",
        "BLOB",
        "BOOLEAN",
        "BTREE",
        "BY",
        "CASCADE",
        "CHANGE",
        "CHAR",
        "CHARACTER",
        "CHARSET",
        "CHECK",
        "COLLATE",
        "COLUMN",
        "COMMENT",
        "CONSTRAINT",
        "CREATE",
        "CURRENT_TIMESTAMP",
        "DATABASE",
        "DATE",
        "DATETIME",
        "DECIMAL",
        "DECLARE",
        "DEFAULT",
        "DELETE",
        "DESC",
        "DISTINCT",
        "DOUBLE",
        "DROP",
        "EACH",
        "ELSE",
        "END",
        "ENGINE",
        "ENUM",
        "EVENT",
        "EXISTS",
        "FIRST",
        "FLOAT",
        "FOR",
        "FOREIGN",
        "FROM",
        "FULLTEXT",
        "FUNCTION",
        "GROUP",
        "HASH",
        "IF",
        "IN",
        "INDEX",
        "INSERT",
        "INT",
        "INTEGER",
        "INTO",
        "IS",
        "JOIN",
        "KEY",
        "LEFT",
        "LIKE",
        "LIMIT",
        "LONGBLOB",
        "LONGTEXT",
        "MEDIUMINT",
        "MEDIUMTEXT",
        "MODIFY",
        "NO",
        "NOT",
        "NULL",
        "ON",
        "OR",
        "ORDER",
        "PRIMARY",
        "PROCEDURE",
        "REFERENCES",
        "RENAME",
        "REPLACE",
        "RESTRICT",
        "RETURN",
        "RETURNS",
        "RIGHT",
        "ROW",
        "SELECT",
        "SET",
        "SMALLINT",
        "TABLE",
        "TEXT",
        "THEN",
        "TIME",
        "TIMESTAMP",
        "TINYINT",
        "TINYTEXT",
        "TO",
        "TRIGGER",
        "UNIQUE",
        "UNSIGNED",
        "UPDATE",
        "USING",
        "VALUES",
        "VARBINARY",
        "VARCHAR",
        "VIEW",
        "WHEN",
        "WHERE",
        "WHILE",
        "ZEROFILL",
    ]
    .into_iter()
    .collect()
});

static VERSION_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*!\d+\s*(.*?)\s*\*/").unwrap());

static BLOCK_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());

static LINE_COMMENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)--(?:\s.*)?$").unwrap());

static DEFINER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)DEFINER\s*=\s*(?:`[^`]*`|'[^']*'|"[^"]*"|[\w%.-]+)(?:\s*@\s*(?:`[^`]*`|'[^']*'|"[^"]*"|[\w%.-]+))?"#,
    )
    .unwrap()
});

static BODY_BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bBEGIN\b").unwrap());

static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static DISPLAY_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(TINYINT|SMALLINT|MEDIUMINT|INTEGER|INT|BIGINT)\(\d+\)").unwrap()
});

static USING_BTREE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+USING\s+BTREE\b").unwrap());

/// MySQL DDL normalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlNormalizer;

impl MySqlNormalizer {
    /// Creates a new normalizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Removes a `DEFINER = user@host` clause from the statement header.
    ///
    /// Only the text preceding the body boundary (`BEGIN`) is searched, so
    /// the same token sequence inside a procedure body is left untouched.
    fn strip_definer(text: &str) -> String {
        match BODY_BOUNDARY_RE.find(text) {
            Some(boundary) => {
                let (header, body) = text.split_at(boundary.start());
                let mut out = DEFINER_RE.replace_all(header, "").into_owned();
                out.push_str(body);
                out
            }
            None => DEFINER_RE.replace_all(text, "").into_owned(),
        }
    }

    /// Uppercases reserved keywords outside of quoted spans.
    fn uppercase_keywords(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                // Quoted span: copy verbatim until the closing quote.
                '`' | '\'' | '"' => {
                    out.push(c);
                    while let Some(q) = chars.next() {
                        out.push(q);
                        if q == '\\' {
                            if let Some(escaped) = chars.next() {
                                out.push(escaped);
                            }
                            continue;
                        }
                        if q == c {
                            break;
                        }
                    }
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut word = String::new();
                    word.push(c);
                    while let Some(&next) = chars.peek() {
                        if next.is_ascii_alphanumeric() || next == '_' {
                            word.push(next);
                            chars.next();
                        } else {
                            break;
                        }
                    }
                    let upper = word.to_ascii_uppercase();
                    if KEYWORDS.contains(upper.as_str()) {
                        out.push_str(&upper);
                    } else {
                        out.push_str(&word);
                    }
                }
                _ => out.push(c),
            }
        }

        out
    }
}

impl DdlNormalizer for MySqlNormalizer {
    fn strip_comments(&self, text: &str) -> String {
        let text = VERSION_COMMENT_RE.replace_all(text, "$1");
        let text = BLOCK_COMMENT_RE.replace_all(&text, "");
        LINE_COMMENT_RE.replace_all(&text, "").into_owned()
    }

    fn clean(&self, ddl: &str) -> String {
        let text = self.strip_comments(ddl);
        let text = Self::strip_definer(&text);
        Self::uppercase_keywords(&text)
    }

    fn compare_form(&self, ddl: &str) -> String {
        let text = self.clean(ddl);
        let text = WHITESPACE_RE.replace_all(&text, " ");
        let text = DISPLAY_WIDTH_RE.replace_all(&text, "$1");
        let text = USING_BTREE_RE.replace_all(&text, "");
        text.trim().trim_end_matches([',', ';']).trim_end().to_string()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn normalizer() -> MySqlNormalizer {
        MySqlNormalizer::new()
    }

    #[test]
    fn test_definer_stripped_from_header() {
        let ddl = "CREATE DEFINER=`root`@`localhost` TRIGGER `trg` BEFORE INSERT ON `t` FOR EACH ROW SET @x = 1";
        let cleaned = normalizer().clean(ddl);
        assert!(!cleaned.contains("DEFINER"));
        assert!(cleaned.contains("TRIGGER `trg`"));
    }

    #[test]
    fn test_definer_quoting_variants() {
        for ddl in [
            "CREATE DEFINER = 'admin'@'10.0.%' VIEW `v` AS SELECT 1",
            "CREATE DEFINER=\"admin\"@\"%\" VIEW `v` AS SELECT 1",
            "CREATE DEFINER=admin@localhost VIEW `v` AS SELECT 1",
        ] {
            let cleaned = normalizer().clean(ddl);
            assert!(!cleaned.contains("DEFINER"), "left in: {cleaned}");
            assert!(cleaned.contains("VIEW `v`"));
        }
    }

    #[test]
    fn test_definer_inside_body_untouched() {
        let ddl = "CREATE PROCEDURE `p`()\nBEGIN\n  SELECT 'DEFINER=`root`@`localhost`';\nEND";
        let cleaned = normalizer().clean(ddl);
        assert!(cleaned.contains("DEFINER=`root`@`localhost`"));
    }

    #[test]
    fn test_version_comment_unwrapped_to_payload() {
        let ddl = "/*!40101 SET NAMES utf8 */;";
        assert_eq!(normalizer().strip_comments(ddl), "SET NAMES utf8;");
    }

    #[test]
    fn test_ordinary_comments_removed() {
        let ddl = "CREATE TABLE `t` ( -- trailing note\n  `id` INT /* inline */\n)";
        let stripped = normalizer().strip_comments(ddl);
        assert!(!stripped.contains("trailing note"));
        assert!(!stripped.contains("inline"));
        assert!(stripped.contains("`id` INT"));
    }

    #[test]
    fn test_keywords_uppercased_outside_quotes() {
        let cleaned = normalizer().clean("create table `group` (`key` int default null)");
        assert!(cleaned.contains("CREATE TABLE `group`"));
        assert!(cleaned.contains("`key` INT DEFAULT NULL"));
    }

    #[test]
    fn test_string_literals_untouched() {
        let cleaned = normalizer().clean("`status` varchar(10) default 'not null'");
        assert!(cleaned.contains("'not null'"));
        assert!(cleaned.contains("VARCHAR(10) DEFAULT"));
    }

    #[test]
    fn test_display_width_equivalence() {
        let n = normalizer();
        assert_eq!(n.compare_form("`id` INT(11) NOT NULL"), n.compare_form("`id` int NOT NULL"));
        // Non-integer widths are significant.
        assert_ne!(
            n.compare_form("`s` varchar(100)"),
            n.compare_form("`s` varchar(255)")
        );
    }

    #[test]
    fn test_compare_form_collapses_and_trims() {
        let form = normalizer().compare_form("  `id`   int(11)\n    NOT null , ");
        assert_eq!(form, "`id` INT NOT NULL");
    }

    #[test]
    fn test_compare_form_drops_using_btree() {
        let n = normalizer();
        assert_eq!(
            n.compare_form("KEY `idx_a` (`a`) USING BTREE"),
            n.compare_form("KEY `idx_a` (`a`)")
        );
    }

    #[test]
    fn test_clean_idempotent() {
        let n = normalizer();
        let ddl = "CREATE DEFINER=`root`@`%` PROCEDURE `p`()\nBEGIN\n  select 1; -- note\nEND";
        let once = n.clean(ddl);
        assert_eq!(n.clean(&once), once);
    }

    #[test]
    fn test_compare_form_idempotent() {
        let n = normalizer();
        let ddl = "/*!50001 CREATE VIEW `v` AS select `t`.`a` from `t` */;";
        let once = n.compare_form(ddl);
        assert_eq!(n.compare_form(&once), once);
    }

    #[test]
    fn test_unparseable_input_passes_through() {
        let garbage = "not really sql at all ???";
        assert_eq!(normalizer().clean(garbage), garbage);
    }
}
