use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::{Item, ItemId, ItemPatch};

/// The row buffer shared by the pagination loader and the mutation coordinator.
///
/// The engine is single-threaded; borrows must never be held across an `.await`.
pub type SharedBuffer = Rc<RefCell<RowBuffer>>;

/// Ordered, id-indexed collection of fetched items.
///
/// Pagination only ever extends the tail. Edits replace fields in place and never move a row.
#[derive(Clone, Debug, Default)]
pub struct RowBuffer {
    items: Vec<Item>,
    index: HashMap<ItemId, usize>,
    revision: u64,
}

impl RowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedBuffer {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Monotonic counter bumped by every change to the buffer contents.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Item> {
        self.items.iter()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Item> {
        self.position(id).map(|i| &self.items[i])
    }

    pub fn position(&self, id: &ItemId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    /// Appends a fetched page to the tail and returns the number of rows added.
    ///
    /// Items whose id is already buffered are skipped (first occurrence wins).
    pub fn append_page(&mut self, page: impl IntoIterator<Item = Item>) -> usize {
        let before = self.items.len();
        for mut item in page {
            if self.index.contains_key(&item.id) {
                gwarn!(id = %item.id, "append_page: duplicate item id skipped");
                continue;
            }
            item.sanitize();
            self.index.insert(item.id.clone(), self.items.len());
            self.items.push(item);
        }
        let added = self.items.len() - before;
        if added > 0 {
            self.revision = self.revision.wrapping_add(1);
        }
        gdebug!(added, total = self.items.len(), "append_page");
        added
    }

    /// Merges `patch` into the row with `id`, returning the snapshot needed to undo it.
    pub fn apply_patch(&mut self, id: &ItemId, patch: &ItemPatch) -> Option<ItemPatch> {
        let pos = self.position(id)?;
        let prev = self.items[pos].apply_patch(patch);
        self.revision = self.revision.wrapping_add(1);
        gtrace!(id = %id, "apply_patch");
        Some(prev)
    }

    /// Replaces the row carrying `item.id` in place. Returns `false` if the id is not buffered.
    pub fn replace(&mut self, mut item: Item) -> bool {
        let Some(pos) = self.position(&item.id) else {
            return false;
        };
        item.sanitize();
        self.items[pos] = item;
        self.revision = self.revision.wrapping_add(1);
        true
    }

    pub fn clear(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.items.clear();
        self.index.clear();
        self.revision = self.revision.wrapping_add(1);
    }
}

impl<'a> IntoIterator for &'a RowBuffer {
    type Item = &'a Item;
    type IntoIter = core::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
