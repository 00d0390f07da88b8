use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use invgrid::{
    Align, ColumnDescriptor, ColumnId, ColumnLayout, ColumnLayoutManager, Debouncer, FacetCache,
    Facets, FilterPreset, FilterState, GridOptions, GridWindow, Item, ItemId, ItemPatch,
    LayoutStorage, PresetBook, PresetStorage, RowBuffer, SharedBuffer, StorageResult, Suggestion,
    ViewWindow, suggest_with_min_len,
};

use crate::{
    FetchError, FetchOutcome, FetchParams, ItemStore, MutationCoordinator, MutationError,
    MutationNotice, PaginationLoader, apply_anchor, capture_first_visible_anchor,
};

/// One rendered row of a [`GridFrame`].
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRow {
    /// Row identity for recycling. Never the index.
    pub key: ItemId,
    pub index: usize,
    pub start: u64,
    pub size: u32,
    /// An edit of this row is in flight or queued.
    pub is_pending: bool,
    /// Display values, one per entry of [`GridFrame::columns`].
    pub cells: Vec<String>,
}

/// Everything a renderer needs for one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct GridFrame {
    /// Visible columns in display order.
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<FrameRow>,
    pub total_size: u64,
    /// The filtered sequence is empty: draw the empty-state placeholder instead of rows.
    pub is_empty: bool,
    pub is_loading: bool,
    pub is_fetching_next_page: bool,
    pub has_next_page: bool,
    pub error: Option<FetchError>,
    pub active_filter_count: usize,
}

/// Buffer positions of the rows passing the client filter, synced by revision.
#[derive(Debug, Default)]
struct FilteredRows {
    synced: Option<(u64, u64)>,
    positions: Vec<usize>,
    /// Filtered index of each row in `positions`.
    index_of: HashMap<ItemId, usize>,
}

impl FilteredRows {
    fn len(&self) -> usize {
        self.positions.len()
    }

    fn index_of(&self, id: &ItemId) -> Option<usize> {
        self.index_of.get(id).copied()
    }

    fn row<'a>(&self, items: &'a [Item], index: usize) -> &'a Item {
        &items[self.positions[index]]
    }

    fn rows<'a>(&'a self, items: &'a [Item]) -> impl Iterator<Item = &'a Item> + 'a {
        self.positions.iter().filter_map(|&pos| items.get(pos))
    }
}

/// A framework-neutral controller composing the whole grid engine.
///
/// This type does not hold any UI objects. Adapters drive it by calling:
/// - `on_viewport_size` / `on_scroll` when UI events occur, and `load_more` when `on_scroll`
///   reports that the load-more sentinel is in view (or the user presses "Load more")
/// - `type_query` on keystrokes and `tick(now_ms)` each frame/timer tick, which applies the
///   debounced query and resets `is_scrolling`
/// - `frame()` to obtain the rows and cells to draw
///
/// All methods take `&self` so that UI events can be handled while a page fetch or an edit is
/// awaiting the store. No internal borrow is held across an `.await`.
pub struct InventoryGrid<S, P> {
    options: GridOptions,
    buffer: SharedBuffer,
    loader: PaginationLoader<Rc<S>>,
    mutations: MutationCoordinator<Rc<S>>,
    filter: RefCell<FilterState>,
    filter_revision: Cell<u64>,
    filtered: RefCell<FilteredRows>,
    query_draft: RefCell<String>,
    query: RefCell<Debouncer<String>>,
    facets: RefCell<FacetCache>,
    layout: RefCell<ColumnLayoutManager<P>>,
    presets: RefCell<PresetBook<P>>,
    window: RefCell<GridWindow>,
}

impl<S, P> InventoryGrid<S, P>
where
    S: ItemStore,
    P: LayoutStorage + PresetStorage + Clone,
{
    /// Builds a grid for `options.user_key`, loading its column layout and presets from
    /// `storage`. The default preset, if any, becomes the initial filter.
    pub fn new(store: S, storage: P, options: GridOptions) -> Self {
        let options = options.normalized();
        let store = Rc::new(store);
        let buffer = RowBuffer::shared();

        let layout = ColumnLayoutManager::load(storage.clone(), options.user_key.clone());
        let presets = PresetBook::load(storage, options.user_key.clone());
        let filter = presets
            .default_preset()
            .map(|p| p.filters.clone())
            .unwrap_or_default();

        adebug!(user_key = %options.user_key, page_size = options.page_size, "InventoryGrid::new");
        Self {
            loader: PaginationLoader::new(Rc::clone(&store), Rc::clone(&buffer), options.page_size),
            mutations: MutationCoordinator::new(store, Rc::clone(&buffer)),
            buffer,
            query_draft: RefCell::new(filter.free_text_query.clone()),
            query: RefCell::new(Debouncer::new(options.search_debounce_ms)),
            filter: RefCell::new(filter),
            filter_revision: Cell::new(0),
            filtered: RefCell::new(FilteredRows::default()),
            facets: RefCell::new(FacetCache::new()),
            layout: RefCell::new(layout),
            presets: RefCell::new(presets),
            window: RefCell::new(GridWindow::from_options(&options)),
            options,
        }
    }

    pub fn options(&self) -> &GridOptions {
        &self.options
    }

    pub fn buffer(&self) -> &SharedBuffer {
        &self.buffer
    }

    pub fn loader(&self) -> &PaginationLoader<Rc<S>> {
        &self.loader
    }

    pub fn mutations(&self) -> &MutationCoordinator<Rc<S>> {
        &self.mutations
    }

    // ---------------------------------------------------------------------------------------
    // Pagination

    /// Fetches the next page. Shared by the visibility sensor and the "Load more" button.
    pub async fn load_more(&self) -> FetchOutcome {
        self.loader.fetch_next_page().await
    }

    pub async fn retry(&self) -> FetchOutcome {
        self.loader.retry().await
    }

    /// Changes the store-side parameters, restarting pagination from the first page.
    pub fn set_fetch_params(&self, params: FetchParams) -> bool {
        if !self.loader.set_params(params) {
            return false;
        }
        self.window.borrow_mut().set_scroll_offset(0);
        true
    }

    /// Drops every fetched row and starts over under the same parameters.
    pub fn refresh(&self) {
        self.loader.restart();
        self.window.borrow_mut().set_scroll_offset(0);
    }

    // ---------------------------------------------------------------------------------------
    // Viewport

    pub fn view(&self) -> ViewWindow {
        self.window.borrow().view()
    }

    pub fn is_scrolling(&self) -> bool {
        self.window.borrow().is_scrolling()
    }

    pub fn on_viewport_size(&self, viewport_height: u32) {
        self.window.borrow_mut().set_viewport_height(viewport_height);
    }

    /// Call this when the UI reports a scroll offset change.
    ///
    /// Returns `true` when the load-more sentinel is in view and a fetch would be issued.
    pub fn on_scroll(&self, scroll_offset: u64, viewport_height: u32, now_ms: u64) -> bool {
        self.window
            .borrow_mut()
            .apply_scroll_event(scroll_offset, viewport_height, now_ms);
        self.wants_next_page()
    }

    pub fn wants_next_page(&self) -> bool {
        if !self.loader.can_fetch() {
            return false;
        }
        let len = self.filtered_len();
        self.window
            .borrow()
            .sentinel_in_view(len, self.options.sentinel_margin)
    }

    /// Advances timers: applies a debounced query once its idle gap elapsed and runs
    /// `is_scrolling` debouncing.
    ///
    /// Returns `true` if the filtered rows changed.
    pub fn tick(&self, now_ms: u64) -> bool {
        self.window.borrow_mut().update_scrolling(now_ms);
        let due = self.query.borrow_mut().poll(now_ms);
        match due {
            Some(query) => self.update_filter(|f| f.set_query(query)),
            None => false,
        }
    }

    /// Scrolls so that the row of `item_id` is in view. Returns the applied offset, or `None`
    /// if the row is not part of the filtered sequence.
    pub fn scroll_to_item(&self, item_id: &ItemId, align: Align) -> Option<u64> {
        self.with_filtered(|_, view| {
            let index = view.index_of(item_id)?;
            Some(
                self.window
                    .borrow_mut()
                    .scroll_to_index(index, align, view.len()),
            )
        })
    }

    // ---------------------------------------------------------------------------------------
    // Search and filters

    /// Records a keystroke. The query reaches the filter after the debounce gap.
    pub fn type_query(&self, text: impl Into<String>, now_ms: u64) {
        let text = text.into();
        *self.query_draft.borrow_mut() = text.clone();
        self.query.borrow_mut().push(text, now_ms);
    }

    /// Applies the typed query immediately (e.g. on Enter).
    pub fn submit_query(&self) -> bool {
        let pending = self.query.borrow_mut().flush();
        match pending {
            Some(query) => self.update_filter(|f| f.set_query(query)),
            None => false,
        }
    }

    pub fn query_draft(&self) -> String {
        self.query_draft.borrow().clone()
    }

    /// Type-ahead suggestions for the applied query, drawn from the filtered rows.
    pub fn suggestions(&self) -> Vec<Suggestion> {
        let query = self.filter.borrow().free_text_query.clone();
        self.with_filtered(|items, view| {
            suggest_with_min_len(
                view.rows(items),
                &query,
                self.options.suggestion_limit,
                self.options.min_suggestion_query_len,
            )
        })
    }

    pub fn filter_state(&self) -> FilterState {
        self.filter.borrow().clone()
    }

    pub fn active_filter_count(&self) -> usize {
        self.filter.borrow().active_filter_count()
    }

    /// Changes the client filter, keeping the first visible row in place if it survives.
    ///
    /// Fetched pages are never discarded by a client filter change. Returns `true` if the filter
    /// changed.
    pub fn update_filter(&self, f: impl FnOnce(&mut FilterState)) -> bool {
        let anchor = self.with_filtered(|items, view| {
            capture_first_visible_anchor(&self.window.borrow(), view.len(), |index| {
                view.row(items, index).id.clone()
            })
        });

        let changed = {
            let mut state = self.filter.borrow_mut();
            let before = state.clone();
            f(&mut state);
            *state != before
        };
        if !changed {
            return false;
        }
        self.filter_revision
            .set(self.filter_revision.get().wrapping_add(1));

        self.with_filtered(|_, view| {
            let mut window = self.window.borrow_mut();
            let restored = anchor.as_ref().is_some_and(|anchor| {
                apply_anchor(&mut window, anchor, view.len(), |id| view.index_of(id))
            });
            if !restored {
                let offset = window.scroll_offset();
                window.set_scroll_offset_clamped(offset, view.len());
            }
            adebug!(rows = view.len(), restored, "client filter changed");
        });
        true
    }

    pub fn toggle_category(&self, category: &str) -> bool {
        self.update_filter(|f| f.toggle_category(category))
    }

    pub fn toggle_status(&self, status: &str) -> bool {
        self.update_filter(|f| f.toggle_status(status))
    }

    pub fn set_supplier(&self, supplier: Option<String>) -> bool {
        self.update_filter(|f| f.set_supplier(supplier))
    }

    pub fn set_location(&self, location: Option<String>) -> bool {
        self.update_filter(|f| f.set_location(location))
    }

    /// Resets every criterion, including a query still waiting out its debounce gap.
    pub fn clear_filters(&self) -> bool {
        self.query.borrow_mut().cancel();
        self.query_draft.borrow_mut().clear();
        self.update_filter(FilterState::reset)
    }

    /// Filter option lists derived from every fetched row.
    pub fn facets(&self) -> Facets {
        self.facets.borrow_mut().get(&self.buffer.borrow()).clone()
    }

    pub fn filtered_len(&self) -> usize {
        self.sync_filtered();
        self.filtered.borrow().len()
    }

    pub fn filtered_ids(&self) -> Vec<ItemId> {
        self.with_filtered(|items, view| view.rows(items).map(|r| r.id.clone()).collect())
    }

    /// Runs `f` over the buffered items and the filtered view into them.
    fn with_filtered<R>(&self, f: impl FnOnce(&[Item], &FilteredRows) -> R) -> R {
        self.sync_filtered();
        let buffer = self.buffer.borrow();
        let filtered = self.filtered.borrow();
        f(buffer.items(), &filtered)
    }

    fn sync_filtered(&self) {
        let buffer = self.buffer.borrow();
        let key = (buffer.revision(), self.filter_revision.get());
        let mut view = self.filtered.borrow_mut();
        if view.synced == Some(key) {
            return;
        }
        let state = self.filter.borrow();
        view.positions = invgrid::filter(buffer.items(), &state)
            .into_iter()
            .filter_map(|item| buffer.position(&item.id))
            .collect();
        let items = buffer.items();
        let index_of: HashMap<ItemId, usize> = view
            .positions
            .iter()
            .enumerate()
            .map(|(index, &pos)| (items[pos].id.clone(), index))
            .collect();
        view.index_of = index_of;
        view.synced = Some(key);
        atrace!(rows = view.positions.len(), "filtered rows rebuilt");
    }

    // ---------------------------------------------------------------------------------------
    // Columns

    pub fn layout(&self) -> ColumnLayout {
        self.layout.borrow().layout().clone()
    }

    pub fn toggle_column(&self, id: ColumnId) -> bool {
        self.layout.borrow_mut().toggle_visibility(id)
    }

    /// Drops `source` onto `target`.
    pub fn reorder_columns(&self, source: ColumnId, target: ColumnId) -> bool {
        self.layout.borrow_mut().reorder(source, target)
    }

    pub fn move_column(&self, id: ColumnId, index: usize) -> bool {
        self.layout.borrow_mut().move_to(id, index)
    }

    pub fn show_all_columns(&self) -> bool {
        self.layout.borrow_mut().show_all()
    }

    pub fn reset_columns(&self) -> StorageResult<()> {
        self.layout.borrow_mut().reset_to_default()
    }

    pub fn save_layout(&self) -> StorageResult<()> {
        self.layout.borrow().save_layout()
    }

    // ---------------------------------------------------------------------------------------
    // Presets

    pub fn presets(&self) -> Vec<FilterPreset> {
        self.presets.borrow().list().to_vec()
    }

    /// Saves the current filter under `name`.
    pub fn save_preset(&self, name: &str, created_at: DateTime<Utc>) -> StorageResult<bool> {
        let filters = self.filter.borrow().clone();
        self.presets.borrow_mut().save(name, &filters, created_at)
    }

    /// Replaces the current filter with the preset `name`.
    pub fn apply_preset(&self, name: &str) -> bool {
        let Some(filters) = self.presets.borrow().get(name).map(|p| p.filters.clone()) else {
            return false;
        };
        self.query.borrow_mut().cancel();
        *self.query_draft.borrow_mut() = filters.free_text_query.clone();
        self.update_filter(|f| *f = filters);
        true
    }

    pub fn delete_preset(&self, name: &str) -> StorageResult<bool> {
        self.presets.borrow_mut().delete(name)
    }

    pub fn set_default_preset(&self, name: &str) -> StorageResult<bool> {
        self.presets.borrow_mut().set_default(name)
    }

    // ---------------------------------------------------------------------------------------
    // Edits

    /// Edits a row optimistically. See [`MutationCoordinator::apply`].
    pub async fn edit(&self, item_id: &ItemId, patch: ItemPatch) -> Result<Item, MutationError> {
        self.mutations.apply(item_id, patch).await
    }

    pub fn drain_notices(&self) -> Vec<MutationNotice> {
        self.mutations.drain_notices()
    }

    // ---------------------------------------------------------------------------------------
    // Rendering

    /// Materializes the current window: only rows in the overscanned range get cells.
    pub fn frame(&self) -> GridFrame {
        let columns: Vec<ColumnDescriptor> = self
            .layout
            .borrow()
            .layout()
            .columns()
            .iter()
            .filter(|c| c.visible)
            .cloned()
            .collect();

        let (rows, total_size, is_empty) = self.with_filtered(|items, view| {
            let window = self.window.borrow();
            let slice = window.slice_by(
                view.len(),
                |index| view.row(items, index),
                |item| item.id.clone(),
            );
            let out = slice
                .rows()
                .iter()
                .map(|vr| FrameRow {
                    is_pending: self.mutations.is_pending(&vr.key),
                    cells: columns
                        .iter()
                        .map(|c| vr.row.cell(c.id).to_string())
                        .collect(),
                    key: vr.key.clone(),
                    index: vr.index,
                    start: vr.start,
                    size: vr.size,
                })
                .collect();
            (out, slice.total_size(), slice.is_empty())
        });

        GridFrame {
            columns,
            rows,
            total_size,
            is_empty,
            is_loading: self.loader.is_loading(),
            is_fetching_next_page: self.loader.is_fetching_next_page(),
            has_next_page: self.loader.has_next_page(),
            error: self.loader.last_error(),
            active_filter_count: self.active_filter_count(),
        }
    }
}
