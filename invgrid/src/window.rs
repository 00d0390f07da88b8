use core::cmp;

use crate::{Align, GridOptions, RowRange, ScrollDirection, ViewWindow, VirtualRow, WindowSlice};

/// Headless row windowing over a fixed-height row sequence.
///
/// The adapter drives it with viewport geometry and scroll offsets; rendering asks for a
/// [`WindowSlice`] of whatever row sequence is current. Only rows in the overscanned range are
/// materialized, the rest is reserved height, so render cost is O(viewport).
#[derive(Clone, Debug)]
pub struct GridWindow {
    view: ViewWindow,
    is_scrolling: bool,
    scroll_direction: Option<ScrollDirection>,
    last_scroll_event_ms: Option<u64>,
    is_scrolling_reset_delay_ms: u64,
}

impl Default for GridWindow {
    fn default() -> Self {
        Self::new(GridOptions::default().row_height, GridOptions::default().overscan)
    }
}

impl GridWindow {
    pub fn new(row_height: u32, overscan: usize) -> Self {
        gdebug!(row_height, overscan, "GridWindow::new");
        Self {
            view: ViewWindow {
                scroll_offset: 0,
                viewport_height: 0,
                row_height: row_height.max(1),
                overscan,
            },
            is_scrolling: false,
            scroll_direction: None,
            last_scroll_event_ms: None,
            is_scrolling_reset_delay_ms: 150,
        }
    }

    pub fn from_options(options: &GridOptions) -> Self {
        let mut w = Self::new(options.row_height, options.overscan);
        w.is_scrolling_reset_delay_ms = options.is_scrolling_reset_delay_ms;
        w
    }

    /// Snapshot of the current geometry.
    pub fn view(&self) -> ViewWindow {
        self.view
    }

    pub fn scroll_offset(&self) -> u64 {
        self.view.scroll_offset
    }

    pub fn viewport_height(&self) -> u32 {
        self.view.viewport_height
    }

    pub fn row_height(&self) -> u32 {
        self.view.row_height
    }

    pub fn overscan(&self) -> usize {
        self.view.overscan
    }

    pub fn is_scrolling(&self) -> bool {
        self.is_scrolling
    }

    pub fn scroll_direction(&self) -> Option<ScrollDirection> {
        self.scroll_direction
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.view.viewport_height = height;
    }

    pub fn set_row_height(&mut self, row_height: u32) {
        self.view.row_height = row_height.max(1);
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.view.overscan = overscan;
    }

    pub fn set_scroll_offset(&mut self, offset: u64) {
        if self.view.scroll_offset == offset {
            return;
        }
        let prev = self.view.scroll_offset;
        self.view.scroll_offset = offset;
        self.scroll_direction = match offset.cmp(&prev) {
            cmp::Ordering::Greater => Some(ScrollDirection::Forward),
            cmp::Ordering::Less => Some(ScrollDirection::Backward),
            cmp::Ordering::Equal => self.scroll_direction,
        };
    }

    pub fn set_scroll_offset_clamped(&mut self, offset: u64, len: usize) {
        let clamped = self.view.clamp_scroll_offset(offset, len);
        self.set_scroll_offset(clamped);
    }

    /// Applies a scroll event from the UI layer and marks the window as scrolling.
    pub fn apply_scroll_event(&mut self, offset: u64, viewport_height: u32, now_ms: u64) {
        gtrace!(offset, viewport_height, now_ms, "apply_scroll_event");
        self.set_viewport_height(viewport_height);
        self.set_scroll_offset(offset);
        self.last_scroll_event_ms = Some(now_ms);
        self.is_scrolling = true;
    }

    /// Resets `is_scrolling` once no scroll event arrived for the reset delay.
    pub fn update_scrolling(&mut self, now_ms: u64) {
        if !self.is_scrolling {
            return;
        }
        let Some(last) = self.last_scroll_event_ms else {
            return;
        };
        if now_ms.saturating_sub(last) >= self.is_scrolling_reset_delay_ms {
            self.is_scrolling = false;
            self.scroll_direction = None;
            self.last_scroll_event_ms = None;
        }
    }

    pub fn total_size(&self, len: usize) -> u64 {
        self.view.total_size(len)
    }

    pub fn visible_range(&self, len: usize) -> RowRange {
        self.view.visible_range(len)
    }

    pub fn render_range(&self, len: usize) -> RowRange {
        self.view.render_range(len)
    }

    pub fn item_start(&self, index: usize) -> u64 {
        (index as u64).saturating_mul(self.view.row_height.max(1) as u64)
    }

    pub fn index_at_offset(&self, offset: u64, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let index = (offset / self.view.row_height.max(1) as u64) as usize;
        Some(index.min(len - 1))
    }

    /// Iterates over the materialized row indexes without allocating.
    pub fn for_each_render_index(&self, len: usize, mut f: impl FnMut(usize)) {
        let range = self.render_range(len);
        for i in range.start_index..range.end_index {
            f(i);
        }
    }

    /// Slices `rows` for rendering, keying each materialized row with `key`.
    pub fn slice<'a, T, K>(&self, rows: &'a [T], key: impl Fn(&T) -> K) -> WindowSlice<'a, T, K> {
        self.slice_by(rows.len(), move |index| &rows[index], key)
    }

    /// Like [`Self::slice`] for a sequence of `len` rows reached through `row_at`.
    ///
    /// `row_at` is only called for indexes in the render range.
    pub fn slice_by<'a, T: 'a, K>(
        &self,
        len: usize,
        row_at: impl Fn(usize) -> &'a T,
        key: impl Fn(&T) -> K,
    ) -> WindowSlice<'a, T, K> {
        if len == 0 {
            return WindowSlice::Empty;
        }
        let size = self.view.row_height.max(1);
        let mut out = Vec::with_capacity(self.render_range(len).len());
        self.for_each_render_index(len, |index| {
            let row = row_at(index);
            out.push(VirtualRow {
                key: key(row),
                index,
                start: self.item_start(index),
                size,
                row,
            });
        });
        WindowSlice::Rows {
            total_size: self.total_size(len),
            rows: out,
        }
    }

    /// Computes the offset that brings `index` into view with the given alignment.
    pub fn scroll_to_index_offset(&self, index: usize, align: Align, len: usize) -> u64 {
        if len == 0 {
            return 0;
        }
        let index = index.min(len - 1);
        let start = self.item_start(index);
        let end = start.saturating_add(self.view.row_height.max(1) as u64);
        let view = self.view.viewport_height as u64;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(view),
            Align::Center => {
                let center = start.saturating_add(self.view.row_height as u64 / 2);
                center.saturating_sub(view / 2)
            }
            Align::Auto => {
                let cur = self.view.scroll_offset;
                let cur_end = cur.saturating_add(view);
                if start >= cur && end <= cur_end {
                    cur
                } else if start < cur {
                    start
                } else {
                    end.saturating_sub(view)
                }
            }
        };

        self.view.clamp_scroll_offset(target, len)
    }

    /// Scrolls so that `index` is in view. Returns the applied (clamped) offset.
    pub fn scroll_to_index(&mut self, index: usize, align: Align, len: usize) -> u64 {
        let offset = self.scroll_to_index_offset(index, align, len);
        self.set_scroll_offset(offset);
        offset
    }

    pub fn sentinel_in_view(&self, len: usize, margin: u32) -> bool {
        self.view.sentinel_in_view(len, margin)
    }
}
