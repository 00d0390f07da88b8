//! A headless inventory data-grid engine.
//!
//! For the async side (pagination, optimistic edits, the grid controller), see the
//! `invgrid-adapter` crate.
//!
//! This crate holds the synchronous, allocation-conscious core that a grid needs to browse and
//! narrow thousands of fetched rows at interactive frame rates: the filter predicate engine and
//! facet derivation, type-ahead suggestions, the column layout manager with persistence ports,
//! and fixed-height row windowing with overscan.
//!
//! It is UI-agnostic. A rendering layer is expected to provide:
//! - viewport height and scroll offset
//! - user input (query text, filter toggles, column drags)
//! - a key/value store for per-user state
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod buffer;
mod columns;
mod debounce;
mod error;
mod filter;
mod item;
mod options;
mod presets;
mod state;
mod storage;
mod suggest;
mod types;
mod window;

#[cfg(test)]
mod tests;

pub use buffer::{RowBuffer, SharedBuffer};
pub use columns::{
    ColumnDescriptor, ColumnGroup, ColumnId, ColumnLayout, ColumnLayoutManager, StoredColumn,
    UnknownColumn,
};
pub use debounce::Debouncer;
pub use error::{PatchError, StorageError, StorageResult};
pub use filter::{FacetCache, Facets, FilterState, derive_facets, filter};
pub use item::{CellValue, Item, ItemId, ItemPatch, ItemStatus};
pub use options::GridOptions;
pub use presets::{FilterPreset, PresetBook};
pub use state::ViewWindow;
pub use storage::{JsonStorage, KeyValueStorage, LayoutStorage, MemoryStorage, PresetStorage};
pub use suggest::{
    DEFAULT_SUGGESTION_LIMIT, MIN_SUGGESTION_QUERY_LEN, Suggestion, SuggestionKind, suggest,
    suggest_with_min_len,
};
pub use types::{Align, RowRange, ScrollDirection, VirtualRow, WindowSlice};
pub use window::GridWindow;
