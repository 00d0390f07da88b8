//! Async adapter for the `invgrid` crate.
//!
//! The `invgrid` crate is UI-agnostic and synchronous. This crate adds the parts of the grid that
//! talk to an external item store, plus a controller tying everything together:
//!
//! - the [`ItemStore`] port (page fetches, item mutations)
//! - incremental, de-duplicated pagination into the shared row buffer
//! - optimistic edits with per-item queuing, reconciliation and rollback
//! - scroll anchoring across row-set changes
//! - [`InventoryGrid`], the framework-neutral controller a rendering layer drives
//!
//! Everything runs on a single-threaded event loop; nothing here requires `Send`.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod anchor;
mod engine;
mod error;
mod loader;
mod mutation;
mod store;


pub use anchor::{RowAnchor, apply_anchor, capture_first_visible_anchor};
pub use engine::{FrameRow, GridFrame, InventoryGrid};
pub use error::{FetchError, MutationError, StoreError};
pub use loader::{FetchOutcome, PageInfo, PaginationLoader};
pub use mutation::{MutationCoordinator, MutationNotice, MutationRecord, MutationStatus};
pub use store::{
    FetchParams, ItemStore, Page, PageRequest, PageToken, SortDirection, SortSpec,
};
