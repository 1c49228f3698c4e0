//! Selection and scroll state over the current snapshot

use crate::collector::{ProcessRecord, Snapshot};
use std::ops::Range;

/// What is currently displayed: the snapshot, the selected row, and the
/// first row shown.
///
/// Whenever the snapshot is non-empty,
/// `scroll_offset <= selected_index < scroll_offset + visible_rows` and
/// `selected_index < snapshot.len()`. Every mutator restores that before it
/// returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    snapshot: Snapshot,
    selected: usize,
    scroll: usize,
    visible_rows: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            snapshot: Snapshot::default(),
            selected: 0,
            scroll: 0,
            visible_rows: 1,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// `None` while the snapshot is empty.
    pub fn selected_index(&self) -> Option<usize> {
        (!self.snapshot.is_empty()).then_some(self.selected)
    }

    pub fn selected(&self) -> Option<&ProcessRecord> {
        self.selected_index().and_then(|i| self.snapshot.get(i))
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Swap in a fresh snapshot, keeping the selected index where possible.
    pub fn replace_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.clamp();
    }

    /// Record the number of list rows the terminal currently fits.
    pub fn set_visible_rows(&mut self, rows: usize) {
        self.visible_rows = rows.max(1);
        self.clamp();
    }

    /// Move the selection up one row. Returns whether anything changed.
    pub fn select_up(&mut self) -> bool {
        if self.snapshot.is_empty() || self.selected == 0 {
            return false;
        }
        self.selected -= 1;
        if self.selected < self.scroll {
            self.scroll = self.selected;
        }
        true
    }

    /// Move the selection down one row. Returns whether anything changed.
    pub fn select_down(&mut self) -> bool {
        if self.selected + 1 >= self.snapshot.len() {
            return false;
        }
        self.selected += 1;
        if self.selected >= self.scroll + self.visible_rows {
            self.scroll += 1;
        }
        true
    }

    /// Indices to draw in a list `rows` tall.
    ///
    /// Starts at the scroll offset but slides forward if the terminal shrank
    /// since the offset was last fitted, so the selection is always inside.
    pub fn window(&self, rows: usize) -> Range<usize> {
        let len = self.snapshot.len();
        if len == 0 || rows == 0 {
            return 0..0;
        }
        let mut start = self.scroll.min(self.selected);
        if self.selected >= start + rows {
            start = self.selected + 1 - rows;
        }
        start..len.min(start + rows)
    }

    fn clamp(&mut self) {
        let len = self.snapshot.len();
        if len == 0 {
            self.selected = 0;
            self.scroll = 0;
            return;
        }
        self.selected = self.selected.min(len - 1);
        if self.scroll > self.selected {
            self.scroll = self.selected;
        }
        if self.selected >= self.scroll + self.visible_rows {
            self.scroll = self.selected + 1 - self.visible_rows;
        }
    }
}
