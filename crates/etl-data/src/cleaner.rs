//! Raw-table cleaning applied to every source extract before typed
//! extraction.

use std::collections::HashSet;

use etl_core::table::{Cell, Table};
use tracing::debug;

/// Normalise a raw tabular extract.
///
/// Operations, applied in order:
/// 1. remove exact-duplicate rows (first occurrence wins, order preserved);
/// 2. remove rows where every cell is missing;
/// 3. remove columns where every value is missing;
/// 4. replace remaining missing cells with the empty string.
///
/// The result carries no missing-value markers. An empty input produces an
/// empty output. Columns are only dropped when at least one row exists to
/// judge them by.
pub fn clean(table: Table) -> Table {
    let Table { columns, rows } = table;
    let before = rows.len();

    // 1. Exact-duplicate rows.
    let mut seen: HashSet<Vec<Cell>> = HashSet::new();
    let mut rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .filter(|row| seen.insert(row.clone()))
        .collect();

    // 2. Rows with every cell missing.
    rows.retain(|row| row.iter().any(|cell| cell.is_some()));

    // 3. Columns with every value missing.
    let keep: Vec<bool> = (0..columns.len())
        .map(|idx| rows.is_empty() || rows.iter().any(|row| row[idx].is_some()))
        .collect();
    let columns: Vec<_> = columns
        .into_iter()
        .zip(&keep)
        .filter_map(|(col, &k)| k.then_some(col))
        .collect();
    let mut rows: Vec<Vec<Cell>> = rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter_map(|(cell, &k)| k.then_some(cell))
                .collect()
        })
        .collect();

    // 4. Fill what is left.
    for row in &mut rows {
        for cell in row.iter_mut() {
            if cell.is_none() {
                *cell = Some(String::new());
            }
        }
    }

    debug!(
        "cleaned table: {} rows in, {} rows out, {} columns",
        before,
        rows.len(),
        columns.len()
    );

    Table { columns, rows }
}
