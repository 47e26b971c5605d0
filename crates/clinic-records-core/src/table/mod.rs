//! Patients table engine: padding, stable sorting, search and pagination.
//!
//! Pipeline: filter → pad → stable sort → slice. Every function takes an
//! immutable row snapshot and returns new rows.

mod state;

pub use state::*;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::{FlatStringPatient, MISSING};

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Give every row a value for `order_by`, using `""` where it is missing.
pub fn pad_rows(rows: &[FlatStringPatient], order_by: &str) -> Vec<FlatStringPatient> {
    rows.iter()
        .map(|row| {
            let mut row = row.clone();
            if !row.contains_key(order_by) {
                row.insert(order_by, "");
            }
            row
        })
        .collect()
}

/// Compare two rows on `order_by` in the given direction.
pub fn compare_rows(a: &FlatStringPatient, b: &FlatStringPatient, order: SortOrder, order_by: &str) -> Ordering {
    let (a, b) = (a.get_or_empty(order_by), b.get_or_empty(order_by));
    match order {
        SortOrder::Asc => a.cmp(b),
        SortOrder::Desc => b.cmp(a),
    }
}

/// Comparator closure for a sort column.
pub fn comparator(order: SortOrder, order_by: &str) -> impl Fn(&FlatStringPatient, &FlatStringPatient) -> Ordering + '_ {
    move |a, b| compare_rows(a, b, order, order_by)
}

/// Sort keeping the original relative order of items that compare equal.
pub fn stable_sort<T, F>(items: Vec<T>, compare: F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut indexed: Vec<(usize, T)> = items.into_iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| compare(a, b).then_with(|| ia.cmp(ib)));
    indexed.into_iter().map(|(_, item)| item).collect()
}

/// Whether any value of `row` contains the lowercase `term`.
///
/// Matching runs over all values joined by spaces, hidden columns included.
pub fn matches_search(row: &FlatStringPatient, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    row.values()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .contains(term)
}

/// Rows matching `term` (case-insensitive).
pub fn filter_rows(rows: &[FlatStringPatient], term: &str) -> Vec<FlatStringPatient> {
    let term = term.to_lowercase();
    rows.iter()
        .filter(|row| matches_search(row, &term))
        .cloned()
        .collect()
}

/// Rows `[page * rows_per_page, page * rows_per_page + rows_per_page)`.
pub fn paginate<T>(rows: Vec<T>, page: usize, rows_per_page: usize) -> Vec<T> {
    rows.into_iter()
        .skip(page.saturating_mul(rows_per_page))
        .take(rows_per_page)
        .collect()
}

/// Blank rows appended to keep the table height constant. Only pages after
/// the first are padded.
pub fn empty_rows(page: usize, rows_per_page: usize, total: usize) -> usize {
    if page == 0 {
        return 0;
    }
    (page + 1).saturating_mul(rows_per_page).saturating_sub(total)
}

/// Text shown in a cell: the value, or `"-"` when it is empty.
pub fn cell_text<'a>(row: &'a FlatStringPatient, header: &str) -> &'a str {
    match row.get(header) {
        Some(value) if !value.is_empty() => value,
        _ => MISSING,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, last_name: &str) -> FlatStringPatient {
        [("id", id), ("last_name", last_name)].into_iter().collect()
    }

    fn ids(rows: &[FlatStringPatient]) -> Vec<&str> {
        rows.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_stable_sort_ascending_ties() {
        let rows = vec![row("1", "B"), row("2", "A"), row("3", "A")];
        let sorted = stable_sort(rows, comparator(SortOrder::Asc, "last_name"));
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_stable_sort_descending_ties() {
        let rows = vec![row("1", "A"), row("2", "B"), row("3", "B")];
        let sorted = stable_sort(rows, comparator(SortOrder::Desc, "last_name"));
        assert_eq!(ids(&sorted), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_padding_missing_sort_key() {
        let mut sparse = FlatStringPatient::new();
        sparse.insert("id", "9");
        let rows = vec![row("1", "B"), sparse, row("2", "A")];

        let padded = pad_rows(&rows, "last_name");
        assert_eq!(padded[1].get("last_name"), Some(""));

        let sorted = stable_sort(padded, comparator(SortOrder::Asc, "last_name"));
        assert_eq!(ids(&sorted), vec!["9", "2", "1"]);
    }

    #[test]
    fn test_search_case_insensitive_all_columns() {
        let mut hidden = row("1", "Smith");
        hidden.insert("notes", "Allergic to PENICILLIN");
        let rows = vec![hidden, row("2", "Jones")];

        assert_eq!(ids(&filter_rows(&rows, "penicillin")), vec!["1"]);
        assert_eq!(ids(&filter_rows(&rows, "JON")), vec!["2"]);
        assert_eq!(filter_rows(&rows, "").len(), 2);
        assert!(filter_rows(&rows, "zzz").is_empty());
    }

    #[test]
    fn test_paginate_and_padding_rows() {
        let rows: Vec<u32> = (0..12).collect();
        assert_eq!(paginate(rows.clone(), 0, 5), vec![0, 1, 2, 3, 4]);
        assert_eq!(paginate(rows.clone(), 2, 5), vec![10, 11]);
        assert!(paginate(rows, 3, 5).is_empty());

        assert_eq!(empty_rows(0, 5, 2), 0);
        assert_eq!(empty_rows(2, 5, 12), 3);
        assert_eq!(empty_rows(1, 5, 12), 0);
    }

    #[test]
    fn test_cell_text() {
        let mut r = row("1", "");
        r.insert("city", "Ames");
        assert_eq!(cell_text(&r, "city"), "Ames");
        assert_eq!(cell_text(&r, "last_name"), "-");
        assert_eq!(cell_text(&r, "zip"), "-");
    }
}
