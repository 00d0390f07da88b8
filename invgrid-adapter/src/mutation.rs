use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use chrono::{DateTime, Utc};
use invgrid::{Item, ItemId, ItemPatch, SharedBuffer};
use tokio::sync::Mutex;

use crate::{ItemStore, MutationError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationStatus {
    Pending,
    Committed,
    Failed,
}

/// One optimistic edit and what is needed to undo it.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationRecord {
    pub id: u64,
    pub item_id: ItemId,
    pub patch: ItemPatch,
    /// Pre-edit values of the touched fields only.
    pub snapshot: ItemPatch,
    pub status: MutationStatus,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// A transient, user-facing report of a rolled-back edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationNotice {
    pub item_id: ItemId,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Applies edits optimistically and reconciles them with the store.
///
/// Each edit moves through local apply, snapshot, persist, then either reconcile (the buffer row
/// is replaced by the item the store returned) or rollback (the snapshot is merged back). Edits
/// to the same item are queued in call order and each one starts from the state its predecessor
/// left behind. Edits to different items run independently.
pub struct MutationCoordinator<S> {
    store: S,
    buffer: SharedBuffer,
    locks: RefCell<HashMap<ItemId, Rc<Mutex<()>>>>,
    journal: RefCell<Vec<MutationRecord>>,
    notices: RefCell<VecDeque<MutationNotice>>,
    next_id: Cell<u64>,
}

impl<S: ItemStore> MutationCoordinator<S> {
    pub fn new(store: S, buffer: SharedBuffer) -> Self {
        Self {
            store,
            buffer,
            locks: RefCell::new(HashMap::new()),
            journal: RefCell::new(Vec::new()),
            notices: RefCell::new(VecDeque::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies `patch` to `item_id` and resolves with the reconciled item.
    ///
    /// Waits for any earlier edit of the same item to settle first. Dropping the returned future
    /// before it resolves rolls the edit back and marks its record failed.
    pub async fn apply(&self, item_id: &ItemId, patch: ItemPatch) -> Result<Item, MutationError> {
        patch.validate()?;

        let lease = ItemLease {
            coordinator: self,
            item_id: item_id.clone(),
            lock: self.lock_for(item_id),
        };
        let _guard = lease.lock.lock().await;
        self.apply_locked(item_id, &patch).await
    }

    async fn apply_locked(&self, item_id: &ItemId, patch: &ItemPatch) -> Result<Item, MutationError> {
        let snapshot = self
            .buffer
            .borrow_mut()
            .apply_patch(item_id, patch)
            .ok_or_else(|| MutationError::UnknownItem(item_id.clone()))?;
        let record_id = self.begin(item_id, patch, snapshot.clone());
        let mut in_flight = InFlightEdit {
            coordinator: self,
            item_id: item_id.clone(),
            record_id,
            snapshot,
            armed: true,
        };
        adebug!(id = %item_id, record_id, "optimistic edit applied");

        let result = self.store.mutate_item(item_id, patch).await;
        in_flight.armed = false;
        match result {
            Ok(item) => {
                if !self.buffer.borrow_mut().replace(item.clone()) {
                    adebug!(id = %item_id, "reconciled item is no longer buffered");
                }
                self.finish(record_id, MutationStatus::Committed, None);
                adebug!(id = %item_id, record_id, "edit committed");
                Ok(item)
            }
            Err(err) => {
                let reason = err.reason();
                self.roll_back(item_id, record_id, &in_flight.snapshot, reason.clone());
                Err(MutationError::Rejected {
                    item_id: item_id.clone(),
                    reason,
                })
            }
        }
    }

    pub fn records(&self) -> Vec<MutationRecord> {
        self.journal.borrow().clone()
    }

    pub fn failed(&self) -> Vec<MutationRecord> {
        self.journal
            .borrow()
            .iter()
            .filter(|r| r.status == MutationStatus::Failed)
            .cloned()
            .collect()
    }

    pub fn clear_failed(&self) {
        self.journal
            .borrow_mut()
            .retain(|r| r.status != MutationStatus::Failed);
    }

    /// Number of edits currently awaiting the store.
    pub fn pending_count(&self) -> usize {
        self.journal
            .borrow()
            .iter()
            .filter(|r| r.status == MutationStatus::Pending)
            .count()
    }

    /// Whether an edit of `item_id` is in flight or queued.
    pub fn is_pending(&self, item_id: &ItemId) -> bool {
        self.locks.borrow().contains_key(item_id)
    }

    pub fn drain_notices(&self) -> Vec<MutationNotice> {
        self.notices.borrow_mut().drain(..).collect()
    }
}

impl<S> MutationCoordinator<S> {
    fn roll_back(&self, item_id: &ItemId, record_id: u64, snapshot: &ItemPatch, reason: String) {
        if self
            .buffer
            .borrow_mut()
            .apply_patch(item_id, snapshot)
            .is_none()
        {
            adebug!(id = %item_id, "rolled-back item is no longer buffered");
        }
        self.finish(record_id, MutationStatus::Failed, Some(reason.clone()));
        awarn!(id = %item_id, record_id, reason = %reason, "edit rolled back");
        self.notices.borrow_mut().push_back(MutationNotice {
            item_id: item_id.clone(),
            reason,
            at: Utc::now(),
        });
    }

    fn lock_for(&self, item_id: &ItemId) -> Rc<Mutex<()>> {
        Rc::clone(
            self.locks
                .borrow_mut()
                .entry(item_id.clone())
                .or_insert_with(|| Rc::new(Mutex::new(()))),
        )
    }

    fn begin(&self, item_id: &ItemId, patch: &ItemPatch, snapshot: ItemPatch) -> u64 {
        let id = self.next_id.get();
        self.next_id.set(id.wrapping_add(1));
        self.journal.borrow_mut().push(MutationRecord {
            id,
            item_id: item_id.clone(),
            patch: patch.clone(),
            snapshot,
            status: MutationStatus::Pending,
            error: None,
            started_at: Utc::now(),
        });
        id
    }

    /// Committed records are dropped; failed ones stay until [`Self::clear_failed`].
    fn finish(&self, record_id: u64, status: MutationStatus, error: Option<String>) {
        let mut journal = self.journal.borrow_mut();
        let Some(pos) = journal.iter().position(|r| r.id == record_id) else {
            return;
        };
        if status == MutationStatus::Committed {
            journal.remove(pos);
            return;
        }
        let record = &mut journal[pos];
        record.status = status;
        record.error = error;
    }
}

pub(crate) const CANCELLED_REASON: &str = "edit cancelled before the store answered";

/// Holds a caller's place in the per-item queue.
///
/// The map entry is forgotten once no caller holds or awaits the lock, however the caller's
/// future ends.
struct ItemLease<'c, S> {
    coordinator: &'c MutationCoordinator<S>,
    item_id: ItemId,
    lock: Rc<Mutex<()>>,
}

impl<S> Drop for ItemLease<'_, S> {
    fn drop(&mut self) {
        let mut locks = self.coordinator.locks.borrow_mut();
        // The map and this lease are the last holders.
        if locks
            .get(&self.item_id)
            .is_some_and(|lock| Rc::strong_count(lock) == 2)
        {
            locks.remove(&self.item_id);
        }
    }
}

/// An optimistic edit awaiting the store. Rolls back if dropped while still armed.
struct InFlightEdit<'c, S> {
    coordinator: &'c MutationCoordinator<S>,
    item_id: ItemId,
    record_id: u64,
    snapshot: ItemPatch,
    armed: bool,
}

impl<S> Drop for InFlightEdit<'_, S> {
    fn drop(&mut self) {
        if self.armed {
            self.coordinator.roll_back(
                &self.item_id,
                self.record_id,
                &self.snapshot,
                CANCELLED_REASON.to_string(),
            );
        }
    }
}
