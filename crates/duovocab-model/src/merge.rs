// Incremental merge of freshly built rows into a previously exported table.
//
// The table is append-only: ids that vanish from a later overview stay put,
// and the first row seen for an id is the one that survives.

use std::collections::HashSet;

use crate::table::{OutputRow, OutputTable};
use crate::vocabulary::VocabularyItem;

/// Overview items whose id is not yet in the table, in overview order.
///
/// With no prior table every item is new.
pub fn new_items<'a>(
    overview: &'a [VocabularyItem],
    existing: Option<&OutputTable>,
) -> Vec<&'a VocabularyItem> {
    let known: HashSet<&str> = existing.map(OutputTable::ids).unwrap_or_default();
    overview
        .iter()
        .filter(|item| !known.contains(item.id.as_str()))
        .collect()
}

/// Append `rows` to `existing` (or to a fresh table with `columns`) and drop
/// duplicate rows.
pub fn merge(existing: Option<OutputTable>, columns: &[String], rows: Vec<OutputRow>) -> MergeResult {
    let mut table = existing.unwrap_or_else(|| OutputTable::new(columns.to_vec()));
    let existing_rows = table.len();
    table.extend_columns(columns);

    table.rows.extend(rows);
    let dropped = dedup(&mut table);

    MergeResult {
        stats: MergeStats {
            existing_rows,
            appended_rows: table.len().saturating_sub(existing_rows),
            dropped_duplicates: dropped,
        },
        table,
    }
}

/// Keep the first row for each id, preserving order. Returns how many rows
/// were removed.
pub fn dedup(table: &mut OutputTable) -> usize {
    let before = table.rows.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(before);
    table.rows.retain(|row| seen.insert(row.id.clone()));
    before - table.rows.len()
}

/// Result of a merge operation.
pub struct MergeResult {
    pub table: OutputTable,
    pub stats: MergeStats,
}

/// Statistics about the merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeStats {
    pub existing_rows: usize,
    pub appended_rows: usize,
    pub dropped_duplicates: usize,
}
