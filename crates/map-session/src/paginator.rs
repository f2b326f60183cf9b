//! Fixed-size pages over the active row set

use serde::Serialize;
use std::ops::Range;

/// Rows per table page
pub const PAGE_SIZE: usize = 10;

/// Most page-number buttons shown at once
pub const MAX_PAGE_BUTTONS: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePaginator {
    page_size: usize,
    row_count: usize,
    current_page: usize,
}

impl TablePaginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            row_count: 0,
            current_page: 1,
        }
    }

    /// Point at a new row set and go back to page 1
    pub fn reset(&mut self, row_count: usize) {
        self.row_count = row_count;
        self.current_page = 1;
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// 1-based
    pub fn current_page(&self) -> usize {
        self.current_page
    }

    /// `ceil(rows / page_size)`, 0 when there are no rows
    pub fn total_pages(&self) -> usize {
        self.row_count.div_ceil(self.page_size)
    }

    /// Jump to page `n`, clamped into `[1, total_pages]`
    pub fn go_to_page(&mut self, n: usize) -> usize {
        self.current_page = n.clamp(1, self.total_pages().max(1));
        self.current_page
    }

    pub fn next(&mut self) -> usize {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous(&mut self) -> usize {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    /// Row indices on the current page
    pub fn page_range(&self) -> Range<usize> {
        let start = ((self.current_page - 1) * self.page_size).min(self.row_count);
        let end = (start + self.page_size).min(self.row_count);
        start..end
    }

    pub fn page_slice<'a, T>(&self, rows: &'a [T]) -> &'a [T] {
        let range = self.page_range();
        let end = range.end.min(rows.len());
        &rows[range.start.min(end)..end]
    }

    /// Page numbers to show as buttons.
    ///
    /// All pages when there are at most seven; otherwise seven consecutive
    /// pages centred on the current one, pinned to the first seven near the
    /// start and the last seven near the end.
    pub fn page_window(&self) -> Vec<usize> {
        let total = self.total_pages();
        let current = self.current_page;

        let first = if total <= MAX_PAGE_BUTTONS || current <= 4 {
            1
        } else if current + 3 >= total {
            total - (MAX_PAGE_BUTTONS - 1)
        } else {
            current - 3
        };
        let last = (first + MAX_PAGE_BUTTONS - 1).min(total);

        (first..=last).collect()
    }
}

impl Default for TablePaginator {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}
