#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// A half-open range of row indexes into the filtered row sequence.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RowRange {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl RowRange {
    pub const EMPTY: RowRange = RowRange {
        start_index: 0,
        end_index: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// A materialized row of the window.
///
/// `key` is the row's identity for recycling; `index` only locates it in the current sequence
/// and changes whenever filtering or pagination shifts rows.
#[derive(Clone, Debug, PartialEq)]
pub struct VirtualRow<'a, T, K> {
    pub key: K,
    pub index: usize,
    /// Start offset in the scroll axis.
    pub start: u64,
    pub size: u32,
    pub row: &'a T,
}

impl<T, K> VirtualRow<'_, T, K> {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size as u64)
    }
}

/// What the renderer should draw for the current window.
#[derive(Clone, Debug, PartialEq)]
pub enum WindowSlice<'a, T, K> {
    /// The row sequence is empty: draw a single empty-state placeholder.
    Empty,
    Rows {
        /// Height reserved for the whole sequence (`len * row_height`).
        total_size: u64,
        rows: Vec<VirtualRow<'a, T, K>>,
    },
}

impl<'a, T, K> WindowSlice<'a, T, K> {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    pub fn rows(&self) -> &[VirtualRow<'a, T, K>] {
        match self {
            Self::Empty => &[],
            Self::Rows { rows, .. } => rows,
        }
    }

    pub fn total_size(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Rows { total_size, .. } => *total_size,
        }
    }
}
