//! Schema comparison.
//!
//! This module compares two environments and produces the diffs needed to
//! bring the destination in line with the source. Comparison is defined
//! over name-keyed raw text (see [`crate::definition`]); equality checks go
//! through the dialect's compare form so whitespace, keyword case, definer
//! clauses and display widths never produce spurious operations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use crate::definition::{ObjectKind, TableDefinition, TriggerEvent, TriggerTiming};
use crate::dialect::Dialect;
use crate::diff::{CreatedTable, DiffOperation, ObjectChange, ObjectDiff, SchemaDiff, TableDiff};
use crate::snapshot::SchemaSnapshot;

static DEFAULT_NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+DEFAULT\s+NULL\s*$").unwrap());

/// Strips the trailing comma/semicolon a definition line carries in source
/// formatting.
fn trim_fragment(definition: &str) -> String {
    definition
        .trim()
        .trim_end_matches([',', ';'])
        .trim_end()
        .to_string()
}

/// Options controlling comparison behavior.
///
/// The legacy-collation rule suppresses noise from a destination server
/// that injects an implicit default collation: when the source column has
/// no explicit `COLLATE` and the destination differs only by that one
/// clause, the columns are treated as equal. It encodes one deployment's
/// historical server configuration, so it is off unless a caller opts in.
#[derive(Default)]
pub struct CompareOptions {
    /// Collation name whose presence on the destination alone is ignored.
    pub legacy_collation: Option<String>,
    skip: Option<Box<dyn Fn(&str) -> bool + Send + Sync>>,
}

impl fmt::Debug for CompareOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompareOptions")
            .field("legacy_collation", &self.legacy_collation)
            .field("skip", &self.skip.is_some())
            .finish()
    }
}

impl CompareOptions {
    /// Creates default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables the legacy-collation suppression rule for `collation`.
    #[must_use]
    pub fn with_legacy_collation(mut self, collation: impl Into<String>) -> Self {
        self.legacy_collation = Some(collation.into());
        self
    }

    /// Injects a "do not migrate" predicate: objects whose name matches
    /// are excluded from the comparison entirely.
    #[must_use]
    pub fn with_skip_predicate(
        mut self,
        predicate: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.skip = Some(Box::new(predicate));
        self
    }

    fn is_skipped(&self, name: &str) -> bool {
        self.skip.as_ref().is_some_and(|predicate| predicate(name))
    }
}

/// Triggers sharing a `(table, timing, event)` slot.
///
/// Most engines do not guarantee ordering between multiple triggers firing
/// on the same slot, so such groups are surfaced as a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateTriggerGroup {
    /// Table the triggers are attached to.
    pub table: String,
    /// Shared timing.
    pub timing: TriggerTiming,
    /// Shared event.
    pub event: TriggerEvent,
    /// Names of the triggers in the slot.
    pub triggers: Vec<String>,
}

/// Compares table definitions, object DDL and whole snapshots.
#[derive(Debug)]
pub struct SchemaComparator {
    dialect: Dialect,
    options: CompareOptions,
}

impl Default for SchemaComparator {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

impl SchemaComparator {
    /// Creates a comparator with default options.
    #[must_use]
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            options: CompareOptions::default(),
        }
    }

    /// Creates a comparator with custom options.
    #[must_use]
    pub fn with_options(dialect: Dialect, options: CompareOptions) -> Self {
        Self { dialect, options }
    }

    /// Compares two table definitions and returns the operations needed to
    /// transform `dest` into `src`.
    ///
    /// A renamed column cannot be recognized as such: it surfaces as an
    /// `AddColumn` plus a `DropColumn`, which loses that column's data.
    /// Confirming this with the operator before execution belongs to the
    /// execution sink, not to the diff itself.
    #[must_use]
    pub fn diff_tables(&self, src: &TableDefinition, dest: &TableDefinition) -> TableDiff {
        let normalizer = self.dialect.normalizer();
        let mut diff = TableDiff::new(&src.name);

        // Columns present only in the source, positioned after the column
        // that precedes them in source order.
        for column in &src.columns {
            if dest.get_column(&column.name).is_some() {
                continue;
            }
            let mut definition = trim_fragment(&column.definition);
            match src.column_before(&column.name) {
                Some(previous) => {
                    definition.push_str(&format!(" AFTER `{previous}`"));
                }
                None => definition.push_str(" FIRST"),
            }
            diff.operations
                .push(DiffOperation::add_column(&column.name, definition));
        }

        // Columns present in both.
        for column in &src.columns {
            let Some(dest_column) = dest.get_column(&column.name) else {
                continue;
            };
            let src_form = normalizer.compare_form(&column.definition);
            let dest_form = normalizer.compare_form(&dest_column.definition);
            if src_form == dest_form {
                continue;
            }
            if self.is_collation_noise(&src_form, &dest_form) {
                debug!(
                    table = %src.name,
                    column = %column.name,
                    "Ignoring implicit legacy collation on destination"
                );
                continue;
            }
            // Re-asserting DEFAULT NULL is redundant; MODIFY restores it
            // implicitly for a nullable column.
            let definition = DEFAULT_NULL_RE
                .replace(&trim_fragment(&column.definition), "")
                .into_owned();
            diff.operations
                .push(DiffOperation::modify_column(&column.name, definition));
        }

        // Columns present only in the destination.
        for column in &dest.columns {
            if src.get_column(&column.name).is_none() {
                diff.operations
                    .push(DiffOperation::drop_column(&column.name));
            }
        }

        // Indexes present only in the source.
        for index in &src.indexes {
            if dest.get_index(&index.name).is_none() {
                diff.operations.push(DiffOperation::add_index(
                    &index.name,
                    trim_fragment(&index.definition),
                ));
            }
        }

        // Indexes present in both: no atomic alter exists, so a changed
        // index becomes a drop immediately followed by a re-add.
        for index in &src.indexes {
            let Some(dest_index) = dest.get_index(&index.name) else {
                continue;
            };
            if !normalizer.equivalent(&index.definition, &dest_index.definition) {
                diff.operations.push(DiffOperation::drop_index(&index.name));
                diff.operations.push(DiffOperation::add_index(
                    &index.name,
                    trim_fragment(&index.definition),
                ));
            }
        }

        // Indexes present only in the destination.
        for index in &dest.indexes {
            if src.get_index(&index.name).is_none() {
                diff.operations.push(DiffOperation::drop_index(&index.name));
            }
        }

        diff
    }

    /// Compares two raw object DDL strings and returns a verdict, or
    /// `None` when nothing needs to change.
    #[must_use]
    pub fn diff_object(
        &self,
        kind: ObjectKind,
        name: &str,
        src: Option<&str>,
        dest: Option<&str>,
    ) -> Option<ObjectDiff> {
        let normalizer = self.dialect.normalizer();
        let src = src.filter(|ddl| !ddl.trim().is_empty());
        let dest = dest.filter(|ddl| !ddl.trim().is_empty());

        match (src, dest) {
            (None, None) => None,
            (Some(ddl), None) => Some(ObjectDiff::create(kind, name, normalizer.clean(ddl))),
            (None, Some(_)) => Some(ObjectDiff::drop(kind, name)),
            (Some(src_ddl), Some(dest_ddl)) => {
                if normalizer.equivalent(src_ddl, dest_ddl) {
                    None
                } else {
                    Some(ObjectDiff::replace(kind, name, normalizer.clean(src_ddl)))
                }
            }
        }
    }

    /// Compares two trigger DDL strings.
    ///
    /// In addition to body comparison, a mismatch in timing, event or
    /// target table alone forces a replace: these are structural properties
    /// an engine cannot express as a body edit.
    #[must_use]
    pub fn diff_trigger(
        &self,
        name: &str,
        src: Option<&str>,
        dest: Option<&str>,
    ) -> Option<ObjectDiff> {
        if let (Some(src_ddl), Some(dest_ddl)) = (src, dest) {
            let extractor = self.dialect.extractor();
            if let (Some(src_trigger), Some(dest_trigger)) = (
                extractor.parse_trigger(src_ddl),
                extractor.parse_trigger(dest_ddl),
            ) {
                if src_trigger.timing != dest_trigger.timing
                    || src_trigger.event != dest_trigger.event
                    || src_trigger.table != dest_trigger.table
                {
                    return Some(ObjectDiff::replace(
                        ObjectKind::Trigger,
                        name,
                        self.dialect.normalizer().clean(src_ddl),
                    ));
                }
            }
        }
        self.diff_object(ObjectKind::Trigger, name, src, dest)
    }

    /// Compares two snapshots and returns the aggregate diff.
    ///
    /// A per-object failure (a table whose DDL cannot be extracted) is
    /// logged and skipped; sibling objects are still compared.
    #[must_use]
    pub fn compare(&self, src: &SchemaSnapshot, dest: &SchemaSnapshot) -> SchemaDiff {
        let mut diff = SchemaDiff::default();

        self.compare_tables(src, dest, &mut diff);

        for kind in [
            ObjectKind::View,
            ObjectKind::Procedure,
            ObjectKind::Function,
            ObjectKind::Event,
        ] {
            for name in union_names(src, dest, kind) {
                if self.options.is_skipped(&name) {
                    debug!(kind = ?kind, name = %name, "Skipping excluded object");
                    continue;
                }
                if let Some(object) = self.diff_object(
                    kind,
                    &name,
                    src.get(kind, &name),
                    dest.get(kind, &name),
                ) {
                    diff.objects.push(object);
                }
            }
        }

        for name in union_names(src, dest, ObjectKind::Trigger) {
            if self.options.is_skipped(&name) {
                debug!(name = %name, "Skipping excluded trigger");
                continue;
            }
            if let Some(object) = self.diff_trigger(
                &name,
                src.get(ObjectKind::Trigger, &name),
                dest.get(ObjectKind::Trigger, &name),
            ) {
                diff.objects.push(object);
            }
        }

        for group in self.duplicate_triggers(src) {
            warn!(
                table = %group.table,
                timing = ?group.timing,
                event = ?group.event,
                triggers = ?group.triggers,
                "Multiple triggers share a firing slot; execution order is not guaranteed"
            );
        }

        diff.summary.tables_changed = diff.tables.len();
        diff.summary.tables_created = diff.created_tables.len();
        diff.summary.tables_dropped = diff.dropped_tables.len();
        for object in &diff.objects {
            match object.change {
                ObjectChange::Create => diff.summary.objects_created += 1,
                ObjectChange::Drop => diff.summary.objects_dropped += 1,
                ObjectChange::Replace => diff.summary.objects_replaced += 1,
            }
        }

        diff
    }

    /// Groups the source's triggers by `(table, timing, event)` and returns
    /// the slots with more than one member.
    #[must_use]
    pub fn duplicate_triggers(&self, snapshot: &SchemaSnapshot) -> Vec<DuplicateTriggerGroup> {
        let extractor = self.dialect.extractor();
        let mut slots: BTreeMap<(String, TriggerTiming, TriggerEvent), Vec<String>> =
            BTreeMap::new();

        for name in snapshot.names(ObjectKind::Trigger) {
            let Some(ddl) = snapshot.get(ObjectKind::Trigger, name) else {
                continue;
            };
            let Some(trigger) = extractor.parse_trigger(ddl) else {
                continue;
            };
            slots
                .entry((trigger.table, trigger.timing, trigger.event))
                .or_default()
                .push(name.to_string());
        }

        slots
            .into_iter()
            .filter(|(_, triggers)| triggers.len() > 1)
            .map(|((table, timing, event), triggers)| DuplicateTriggerGroup {
                table,
                timing,
                event,
                triggers,
            })
            .collect()
    }

    fn compare_tables(&self, src: &SchemaSnapshot, dest: &SchemaSnapshot, diff: &mut SchemaDiff) {
        let extractor = self.dialect.extractor();
        let normalizer = self.dialect.normalizer();

        for name in union_names(src, dest, ObjectKind::Table) {
            if self.options.is_skipped(&name) {
                debug!(table = %name, "Skipping excluded table");
                continue;
            }
            match (
                src.get(ObjectKind::Table, &name),
                dest.get(ObjectKind::Table, &name),
            ) {
                (Some(src_ddl), None) => diff.created_tables.push(CreatedTable {
                    name: name.clone(),
                    ddl: normalizer.clean(src_ddl),
                }),
                (None, Some(_)) => diff.dropped_tables.push(name),
                (Some(src_ddl), Some(dest_ddl)) => {
                    match (extractor.parse_table(src_ddl), extractor.parse_table(dest_ddl)) {
                        (Some(src_table), Some(dest_table)) => {
                            let table_diff = self.diff_tables(&src_table, &dest_table);
                            if table_diff.has_changes() {
                                diff.tables.insert(name, table_diff);
                            }
                        }
                        _ => warn!(
                            table = %name,
                            "Could not extract a table definition; skipping"
                        ),
                    }
                }
                (None, None) => {}
            }
        }
    }

    fn is_collation_noise(&self, src_form: &str, dest_form: &str) -> bool {
        let Some(legacy) = &self.options.legacy_collation else {
            return false;
        };
        if src_form.contains(" COLLATE ") {
            return false;
        }
        let marker = format!(" COLLATE {legacy}");
        dest_form.contains(&marker) && dest_form.replace(&marker, "") == src_form
    }
}

fn union_names(src: &SchemaSnapshot, dest: &SchemaSnapshot, kind: ObjectKind) -> Vec<String> {
    let mut names: BTreeSet<String> = src.names(kind).map(str::to_string).collect();
    names.extend(dest.names(kind).map(str::to_string));
    names.into_iter().collect()
}
