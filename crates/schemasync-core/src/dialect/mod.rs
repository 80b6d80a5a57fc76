//! Database dialect implementations.
//!
//! Each dialect supplies three capabilities: normalizing DDL text for
//! comparison, extracting structured definitions from it, and generating
//! migration SQL from diffs. The capabilities are separate traits so a
//! future dialect only needs to provide an extraction function, not a new
//! diff algorithm.

mod mysql;

pub use mysql::{MySqlExtractor, MySqlGenerator, MySqlNormalizer};

use crate::definition::{TableDefinition, TriggerDefinition};
use crate::diff::{ObjectDiff, SchemaDiff, TableDiff};

/// Cleans and canonicalizes DDL text.
pub trait DdlNormalizer: Send + Sync {
    /// Formatting-preserving cleanup: strips definer clauses, unwraps
    /// version-guarded comments, removes ordinary comments and uppercases
    /// keywords. Never fails; unrecognized input passes through unchanged
    /// except for the substitutions it can confidently apply.
    fn clean(&self, ddl: &str) -> String;

    /// Fully collapsed form used only for equality checks, never emitted.
    fn compare_form(&self, ddl: &str) -> String;

    /// Unwraps version-guarded comments to their payload and removes
    /// ordinary comments, leaving everything else untouched.
    fn strip_comments(&self, text: &str) -> String;

    /// Returns true if two fragments are equal under [`Self::compare_form`].
    fn equivalent(&self, a: &str, b: &str) -> bool {
        self.compare_form(a) == self.compare_form(b)
    }
}

/// Extracts structured definitions from single DDL statements.
///
/// These are best-effort line-oriented extractors, correct for the
/// formatting produced by the introspection layer (one clause per line,
/// backtick-quoted identifiers); they are not full grammar parsers.
pub trait DdlExtractor: Send + Sync {
    /// Parses a `CREATE TABLE` statement, or returns `None` if no table
    /// name can be found.
    fn parse_table(&self, ddl: &str) -> Option<TableDefinition>;

    /// Parses a `CREATE TRIGGER` statement, or returns `None` if the
    /// trigger name cannot be extracted.
    fn parse_trigger(&self, ddl: &str) -> Option<TriggerDefinition>;
}

/// Generates migration SQL from diffs.
pub trait SqlGenerator: Send + Sync {
    /// Emits at most one ALTER statement covering every operation in the
    /// diff. Returns an empty list when there is nothing to do.
    fn table_sql(&self, diff: &TableDiff) -> Vec<String>;

    /// Emits the drop and/or create statements for one object verdict,
    /// drop always first.
    fn object_sql(&self, diff: &ObjectDiff) -> Vec<String>;

    /// Emits the whole migration script in dependency-phase order.
    ///
    /// The phases are: drop dropped tables, drop dropped objects, create
    /// new tables, alter changed tables, create/replace remaining objects.
    /// Cross-kind dependencies (e.g. a view over a column being dropped)
    /// are not graph-ordered; the fixed phase order reduces but does not
    /// eliminate dependency failures.
    fn schema_sql(&self, diff: &SchemaDiff) -> Vec<String>;
}

/// The supported database dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// MySQL / MariaDB.
    #[default]
    MySql,
}

static MYSQL_NORMALIZER: MySqlNormalizer = MySqlNormalizer;
static MYSQL_EXTRACTOR: MySqlExtractor = MySqlExtractor;
static MYSQL_GENERATOR: MySqlGenerator = MySqlGenerator;

impl Dialect {
    /// Returns the normalizer for this dialect.
    #[must_use]
    pub fn normalizer(self) -> &'static dyn DdlNormalizer {
        match self {
            Self::MySql => &MYSQL_NORMALIZER,
        }
    }

    /// Returns the extractor for this dialect.
    #[must_use]
    pub fn extractor(self) -> &'static dyn DdlExtractor {
        match self {
            Self::MySql => &MYSQL_EXTRACTOR,
        }
    }

    /// Returns the SQL generator for this dialect.
    #[must_use]
    pub fn generator(self) -> &'static dyn SqlGenerator {
        match self {
            Self::MySql => &MYSQL_GENERATOR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_returns_working_capabilities() {
        let dialect = Dialect::MySql;
        assert_eq!(dialect.normalizer().compare_form("a   b"), "a b");
        assert!(dialect.extractor().parse_table("not a table").is_none());
    }

    #[test]
    fn test_default_dialect() {
        assert_eq!(Dialect::default(), Dialect::MySql);
    }
}
