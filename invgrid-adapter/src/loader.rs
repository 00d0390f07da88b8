use std::cell::RefCell;

use invgrid::SharedBuffer;

use crate::{FetchError, FetchParams, ItemStore, PageRequest, PageToken};

/// Metadata of one fetched page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageInfo {
    pub index: usize,
    /// Rows returned by the store, before duplicate ids were skipped.
    pub len: usize,
}

/// What a call to [`PaginationLoader::fetch_next_page`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A page was appended; `rows` is the number of new rows in the buffer.
    Appended { rows: usize },
    /// Another fetch is in flight; no request was issued.
    AlreadyFetching,
    /// The store reported no further pages.
    Exhausted,
    /// A previous fetch failed; call [`PaginationLoader::retry`].
    Paused,
    /// The fetch parameters changed while the request was in flight; its result was dropped.
    Discarded,
    Failed(FetchError),
}

#[derive(Debug)]
struct LoaderState {
    params: FetchParams,
    generation: u64,
    pages: Vec<PageInfo>,
    offset: usize,
    token: Option<PageToken>,
    is_fetching_next_page: bool,
    has_next_page: bool,
    last_error: Option<FetchError>,
}

impl LoaderState {
    fn new(params: FetchParams) -> Self {
        Self {
            params,
            generation: 0,
            pages: Vec::new(),
            offset: 0,
            token: None,
            is_fetching_next_page: false,
            has_next_page: true,
            last_error: None,
        }
    }

    fn restart(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.pages.clear();
        self.offset = 0;
        self.token = None;
        self.is_fetching_next_page = false;
        self.has_next_page = true;
        self.last_error = None;
    }
}

/// Incremental, de-duplicated page loading into the shared row buffer.
///
/// At most one page request is in flight at a time: page `k + 1` is never requested before page
/// `k` has been appended. Every call site (visibility sensor, "Load more" button, retry) goes
/// through [`Self::fetch_next_page`], so they all share that gate.
pub struct PaginationLoader<S> {
    store: S,
    buffer: SharedBuffer,
    page_size: usize,
    state: RefCell<LoaderState>,
}

impl<S: ItemStore> PaginationLoader<S> {
    pub fn new(store: S, buffer: SharedBuffer, page_size: usize) -> Self {
        Self {
            store,
            buffer,
            page_size: page_size.max(1),
            state: RefCell::new(LoaderState::new(FetchParams::default())),
        }
    }

    pub fn with_params(self, params: FetchParams) -> Self {
        self.state.borrow_mut().params = params;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn params(&self) -> FetchParams {
        self.state.borrow().params.clone()
    }

    pub fn pages(&self) -> Vec<PageInfo> {
        self.state.borrow().pages.clone()
    }

    pub fn has_next_page(&self) -> bool {
        self.state.borrow().has_next_page
    }

    pub fn is_fetching_next_page(&self) -> bool {
        self.state.borrow().is_fetching_next_page
    }

    /// `true` while the first page under the current parameters is loading.
    pub fn is_loading(&self) -> bool {
        let st = self.state.borrow();
        st.is_fetching_next_page && st.pages.is_empty()
    }

    pub fn last_error(&self) -> Option<FetchError> {
        self.state.borrow().last_error.clone()
    }

    /// Whether a fetch would currently issue a request.
    pub fn can_fetch(&self) -> bool {
        let st = self.state.borrow();
        !st.is_fetching_next_page && st.has_next_page && st.last_error.is_none()
    }

    /// Fetches the next page and appends it to the buffer tail.
    pub async fn fetch_next_page(&self) -> FetchOutcome {
        let (generation, request) = {
            let mut st = self.state.borrow_mut();
            if st.is_fetching_next_page {
                atrace!("fetch_next_page: already fetching");
                return FetchOutcome::AlreadyFetching;
            }
            if st.last_error.is_some() {
                return FetchOutcome::Paused;
            }
            if !st.has_next_page {
                return FetchOutcome::Exhausted;
            }
            st.is_fetching_next_page = true;
            let request = PageRequest {
                params: st.params.clone(),
                page: st.pages.len(),
                page_size: self.page_size,
                offset: st.offset,
                token: st.token.clone(),
            };
            (st.generation, request)
        };

        adebug!(page = request.page, offset = request.offset, "fetching page");
        let result = self.store.fetch_page(&request).await;

        let mut st = self.state.borrow_mut();
        if st.generation != generation {
            adebug!(page = request.page, "discarding page fetched under stale parameters");
            return FetchOutcome::Discarded;
        }
        st.is_fetching_next_page = false;

        match result {
            Ok(page) => {
                let returned = page.items.len();
                let rows = self.buffer.borrow_mut().append_page(page.items);
                st.pages.push(PageInfo {
                    index: request.page,
                    len: returned,
                });
                st.offset += returned;
                st.token = page.next_page_token;
                st.has_next_page = returned >= self.page_size;
                adebug!(
                    page = request.page,
                    returned,
                    rows,
                    has_next_page = st.has_next_page,
                    "page appended"
                );
                FetchOutcome::Appended { rows }
            }
            Err(source) => {
                let err = FetchError {
                    page: request.page,
                    source,
                };
                awarn!(error = %err, "page fetch failed; pagination paused");
                st.last_error = Some(err.clone());
                FetchOutcome::Failed(err)
            }
        }
    }

    /// Clears a previous failure and fetches again.
    pub async fn retry(&self) -> FetchOutcome {
        if self.state.borrow_mut().last_error.take().is_some() {
            adebug!("retrying failed page");
        }
        self.fetch_next_page().await
    }

    /// Switches to new store-side parameters. Accumulated pages are dropped and any in-flight
    /// result becomes discardable. Returns `false` if `params` are unchanged.
    pub fn set_params(&self, params: FetchParams) -> bool {
        {
            let mut st = self.state.borrow_mut();
            if st.params == params {
                return false;
            }
            st.params = params;
        }
        self.restart();
        true
    }

    /// Drops every fetched page and starts again from the first page.
    pub fn restart(&self) {
        let mut st = self.state.borrow_mut();
        st.restart();
        self.buffer.borrow_mut().clear();
        adebug!(generation = st.generation, "pagination restarted");
    }
}
