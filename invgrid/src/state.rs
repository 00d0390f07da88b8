use crate::RowRange;

/// Viewport geometry for one render pass.
///
/// Recomputed on every scroll/resize event and never persisted. All sizes share one unit
/// (typically CSS pixels).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewWindow {
    pub scroll_offset: u64,
    pub viewport_height: u32,
    pub row_height: u32,
    pub overscan: usize,
}

impl Default for ViewWindow {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            viewport_height: 0,
            row_height: 1,
            overscan: 0,
        }
    }
}

impl ViewWindow {
    fn row_height(&self) -> u64 {
        self.row_height.max(1) as u64
    }

    /// Height reserved for `len` rows.
    pub fn total_size(&self, len: usize) -> u64 {
        (len as u64).saturating_mul(self.row_height())
    }

    pub fn max_scroll_offset(&self, len: usize) -> u64 {
        self.total_size(len)
            .saturating_sub(self.viewport_height as u64)
    }

    pub fn clamp_scroll_offset(&self, offset: u64, len: usize) -> u64 {
        offset.min(self.max_scroll_offset(len))
    }

    /// Rows intersecting the viewport, without overscan:
    /// `floor(offset / row_height) .. ceil((offset + viewport) / row_height)`, clamped to `len`.
    pub fn visible_range(&self, len: usize) -> RowRange {
        if len == 0 || self.viewport_height == 0 {
            return RowRange::EMPTY;
        }
        let rh = self.row_height();
        let offset = self.clamp_scroll_offset(self.scroll_offset, len);
        let end = offset.saturating_add(self.viewport_height as u64);

        let first = (offset / rh) as usize;
        let last = end.div_ceil(rh) as usize;
        RowRange {
            start_index: first.min(len),
            end_index: last.min(len),
        }
    }

    /// Rows to materialize: the visible range widened by `overscan` on both sides.
    pub fn render_range(&self, len: usize) -> RowRange {
        let visible = self.visible_range(len);
        if visible.is_empty() {
            return visible;
        }
        RowRange {
            start_index: visible.start_index.saturating_sub(self.overscan),
            end_index: visible
                .end_index
                .saturating_add(self.overscan)
                .min(len),
        }
    }

    /// Whether a sentinel placed after the last row is within `margin` of the viewport bottom.
    pub fn sentinel_in_view(&self, len: usize, margin: u32) -> bool {
        let bottom = self
            .scroll_offset
            .saturating_add(self.viewport_height as u64)
            .saturating_add(margin as u64);
        bottom >= self.total_size(len)
    }
}
