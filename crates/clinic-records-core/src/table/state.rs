//! Sort, search and page state of a patients table.

use serde::{Deserialize, Serialize};

use super::{comparator, empty_rows, filter_rows, pad_rows, paginate, stable_sort, SortOrder};
use crate::models::{keys, FlatStringPatient};

/// Page sizes offered by the table.
pub const ROWS_PER_PAGE_OPTIONS: [usize; 3] = [5, 10, 25];

/// Default page size.
pub const DEFAULT_ROWS_PER_PAGE: usize = 25;

/// User-controlled table state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableState {
    pub order: SortOrder,
    pub order_by: String,
    pub page: usize,
    pub rows_per_page: usize,
    /// Lowercased search term
    pub search_term: String,
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            order: SortOrder::Asc,
            order_by: keys::LAST_NAME.to_string(),
            page: 0,
            rows_per_page: DEFAULT_ROWS_PER_PAGE,
            search_term: String::new(),
        }
    }
}

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    /// Rows of the current page, sorted
    pub rows: Vec<FlatStringPatient>,
    /// Blank rows to append after `rows`
    pub empty_rows: usize,
    /// Row count after filtering, before pagination
    pub total: usize,
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Header click: re-clicking the ascending sort column flips it to
    /// descending; any other click sorts ascending by `property`.
    pub fn request_sort(&mut self, property: &str) {
        let is_asc = self.order_by == property && self.order == SortOrder::Asc;
        self.order = if is_asc { SortOrder::Desc } else { SortOrder::Asc };
        self.order_by = property.to_string();
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Change the page size and go back to the first page.
    pub fn set_rows_per_page(&mut self, rows_per_page: usize) {
        self.rows_per_page = rows_per_page;
        self.page = 0;
    }

    /// Change the search term and go back to the first page.
    pub fn set_search(&mut self, term: &str) {
        self.search_term = term.to_lowercase();
        self.page = 0;
    }

    /// Filter, sort and slice `rows` for display.
    pub fn view(&self, rows: &[FlatStringPatient]) -> TableView {
        let filtered = filter_rows(rows, &self.search_term);
        let total = filtered.len();
        let sorted = stable_sort(
            pad_rows(&filtered, &self.order_by),
            comparator(self.order, &self.order_by),
        );
        TableView {
            rows: paginate(sorted, self.page, self.rows_per_page),
            empty_rows: empty_rows(self.page, self.rows_per_page, total),
            total,
        }
    }

    /// Number of pages needed for `total` rows (at least one).
    pub fn page_count(&self, total: usize) -> usize {
        if self.rows_per_page == 0 {
            return 1;
        }
        total.div_ceil(self.rows_per_page).max(1)
    }
}
