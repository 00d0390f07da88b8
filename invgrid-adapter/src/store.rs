use std::rc::Rc;

use async_trait::async_trait;
use invgrid::{ColumnId, FilterState, Item, ItemId, ItemPatch};

use crate::StoreError;

/// Opaque marker identifying where the next page of results begins.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PageToken(pub String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortSpec {
    pub column: ColumnId,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: ColumnId) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: ColumnId) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

/// Parameters evaluated by the store. Changing them restarts pagination.
///
/// This is distinct from the client-side [`FilterState`] held by the grid, which only narrows
/// rows already fetched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub sort: Option<SortSpec>,
    pub filter: FilterState,
}

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self
    }
}

/// One page request as seen by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub params: FetchParams,
    /// Zero-based index of the requested page.
    pub page: usize,
    pub page_size: usize,
    /// Number of rows already fetched under `params`, for offset-based stores.
    pub offset: usize,
    /// Token returned with the previous page, for cursor-based stores.
    pub token: Option<PageToken>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub next_page_token: Option<PageToken>,
}

impl Page {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items,
            next_page_token: None,
        }
    }

    pub fn with_next_page_token(mut self, token: PageToken) -> Self {
        self.next_page_token = Some(token);
        self
    }
}

/// The external item store consumed by the grid.
///
/// The engine runs on a single-threaded event loop, so implementations need not be `Send`.
#[async_trait(?Send)]
pub trait ItemStore {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, StoreError>;

    /// Persists `patch` and returns the authoritative item.
    async fn mutate_item(&self, item_id: &ItemId, patch: &ItemPatch) -> Result<Item, StoreError>;
}

#[async_trait(?Send)]
impl<T: ItemStore + ?Sized> ItemStore for Rc<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page, StoreError> {
        (**self).fetch_page(request).await
    }

    async fn mutate_item(&self, item_id: &ItemId, patch: &ItemPatch) -> Result<Item, StoreError> {
        (**self).mutate_item(item_id, patch).await
    }
}
