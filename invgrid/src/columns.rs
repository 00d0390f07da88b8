//! Column layout: the ordered, per-user set of column descriptors.
//!
//! The id set is closed ([`ColumnId`]); only order and visibility vary. Persisted layouts are
//! reconciled against the canonical set on load, so a layout saved by an older (or newer) schema
//! never corrupts rendering.

use core::fmt;
use core::str::FromStr;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::LayoutStorage;
use crate::error::StorageResult;

/// Stable key of a grid column, one per displayable [`crate::Item`] field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnId {
    Name,
    Sku,
    Category,
    Subcategory,
    Supplier,
    Location,
    Quantity,
    ReorderPoint,
    UnitPrice,
    TotalValue,
    Status,
    Description,
    Notes,
    LastUpdated,
}

impl ColumnId {
    /// The canonical column set, in default display order.
    pub const ALL: [ColumnId; 14] = [
        ColumnId::Name,
        ColumnId::Sku,
        ColumnId::Category,
        ColumnId::Subcategory,
        ColumnId::Quantity,
        ColumnId::ReorderPoint,
        ColumnId::Status,
        ColumnId::Location,
        ColumnId::UnitPrice,
        ColumnId::TotalValue,
        ColumnId::Supplier,
        ColumnId::Description,
        ColumnId::Notes,
        ColumnId::LastUpdated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Sku => "sku",
            Self::Category => "category",
            Self::Subcategory => "subcategory",
            Self::Supplier => "supplier",
            Self::Location => "location",
            Self::Quantity => "quantity",
            Self::ReorderPoint => "reorderPoint",
            Self::UnitPrice => "unitPrice",
            Self::TotalValue => "totalValue",
            Self::Status => "status",
            Self::Description => "description",
            Self::Notes => "notes",
            Self::LastUpdated => "lastUpdated",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Sku => "SKU",
            Self::Category => "Category",
            Self::Subcategory => "Subcategory",
            Self::Supplier => "Supplier",
            Self::Location => "Location",
            Self::Quantity => "Quantity",
            Self::ReorderPoint => "Reorder Point",
            Self::UnitPrice => "Unit Price",
            Self::TotalValue => "Total Value",
            Self::Status => "Status",
            Self::Description => "Description",
            Self::Notes => "Notes",
            Self::LastUpdated => "Last Updated",
        }
    }

    pub fn default_visible(self) -> bool {
        !matches!(
            self,
            Self::Subcategory | Self::Supplier | Self::Description | Self::Notes | Self::LastUpdated
        )
    }

    pub fn group(self) -> ColumnGroup {
        match self {
            Self::Name | Self::Sku | Self::Category | Self::Subcategory | Self::Description => {
                ColumnGroup::Basic
            }
            Self::Quantity | Self::ReorderPoint | Self::Status | Self::Location => {
                ColumnGroup::Inventory
            }
            Self::UnitPrice | Self::TotalValue => ColumnGroup::Pricing,
            Self::Supplier | Self::Notes | Self::LastUpdated => ColumnGroup::Other,
        }
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a stored column id is not part of the canonical set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownColumn(pub String);

impl FromStr for ColumnId {
    type Err = UnknownColumn;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| UnknownColumn(s.to_owned()))
    }
}

/// Fixed presentation buckets. Grouping never affects column order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnGroup {
    Basic,
    Inventory,
    Pricing,
    Other,
}

impl ColumnGroup {
    pub const ALL: [ColumnGroup; 4] = [
        ColumnGroup::Basic,
        ColumnGroup::Inventory,
        ColumnGroup::Pricing,
        ColumnGroup::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Basic => "Basic Information",
            Self::Inventory => "Inventory & Stock",
            Self::Pricing => "Pricing",
            Self::Other => "Other",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub id: ColumnId,
    pub label: String,
    pub visible: bool,
}

impl ColumnDescriptor {
    pub fn canonical(id: ColumnId) -> Self {
        Self {
            id,
            label: id.label().to_owned(),
            visible: id.default_visible(),
        }
    }
}

/// The persisted shape of a column descriptor.
///
/// Ids are kept as raw strings so that layouts written by another schema version still parse.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredColumn {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub visible: bool,
}

impl From<&ColumnDescriptor> for StoredColumn {
    fn from(c: &ColumnDescriptor) -> Self {
        Self {
            id: c.id.as_str().to_owned(),
            label: c.label.clone(),
            visible: c.visible,
        }
    }
}

/// The ordered column sequence. Order is display order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<ColumnDescriptor>,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            columns: ColumnId::ALL
                .into_iter()
                .map(ColumnDescriptor::canonical)
                .collect(),
        }
    }
}

impl ColumnLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a layout from persisted descriptors.
    ///
    /// Unknown and duplicate ids are dropped; canonical ids missing from `stored` are appended
    /// hidden. Labels always come from the current schema. The result is a fixed point: feeding
    /// `to_stored()` back in yields the same layout.
    pub fn reconcile(stored: &[StoredColumn]) -> Self {
        let mut seen = HashSet::with_capacity(ColumnId::ALL.len());
        let mut columns = Vec::with_capacity(ColumnId::ALL.len());

        for entry in stored {
            let Ok(id) = entry.id.parse::<ColumnId>() else {
                gwarn!(id = %entry.id, "reconcile: dropping unknown column id");
                continue;
            };
            if !seen.insert(id) {
                gwarn!(id = %entry.id, "reconcile: dropping duplicate column id");
                continue;
            }
            columns.push(ColumnDescriptor {
                id,
                label: id.label().to_owned(),
                visible: entry.visible,
            });
        }

        for id in ColumnId::ALL {
            if seen.insert(id) {
                gdebug!(id = %id, "reconcile: appending missing column as hidden");
                columns.push(ColumnDescriptor {
                    id,
                    label: id.label().to_owned(),
                    visible: false,
                });
            }
        }

        Self { columns }
    }

    pub fn to_stored(&self) -> Vec<StoredColumn> {
        self.columns.iter().map(StoredColumn::from).collect()
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, id: ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn is_visible(&self, id: ColumnId) -> bool {
        self.columns.iter().any(|c| c.id == id && c.visible)
    }

    /// Visible column ids in display order.
    pub fn visible_columns(&self) -> impl Iterator<Item = ColumnId> + '_ {
        self.columns.iter().filter(|c| c.visible).map(|c| c.id)
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Flips the visibility of `id`. Order is unchanged.
    pub fn toggle_visibility(&mut self, id: ColumnId) -> bool {
        let Some(c) = self.columns.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        c.visible = !c.visible;
        true
    }

    /// Moves `source` to the index currently held by `target`; everything else keeps its
    /// relative order. Dropping a column onto itself is a no-op.
    ///
    /// Returns `true` if the order changed.
    pub fn reorder(&mut self, source: ColumnId, target: ColumnId) -> bool {
        if source == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.position(source), self.position(target)) else {
            return false;
        };
        self.splice(from, to);
        true
    }

    /// Moves `id` to `index` (clamped to the last position).
    pub fn move_to(&mut self, id: ColumnId, index: usize) -> bool {
        let Some(from) = self.position(id) else {
            return false;
        };
        let to = index.min(self.columns.len().saturating_sub(1));
        if from == to {
            return false;
        }
        self.splice(from, to);
        true
    }

    fn splice(&mut self, from: usize, to: usize) {
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
    }

    pub fn show_all(&mut self) -> bool {
        let mut changed = false;
        for c in &mut self.columns {
            changed |= !c.visible;
            c.visible = true;
        }
        changed
    }

    pub fn reset_to_default(&mut self) {
        *self = Self::default();
    }

    /// Partitions the columns into their presentation groups, keeping display order within each
    /// group. Empty groups are omitted.
    pub fn grouped(&self) -> Vec<(ColumnGroup, Vec<&ColumnDescriptor>)> {
        ColumnGroup::ALL
            .into_iter()
            .filter_map(|group| {
                let members: Vec<_> = self
                    .columns
                    .iter()
                    .filter(|c| c.id.group() == group)
                    .collect();
                (!members.is_empty()).then_some((group, members))
            })
            .collect()
    }
}

/// Owns a [`ColumnLayout`] together with its persistence port.
///
/// Every successful toggle or reorder persists immediately; [`Self::save_layout`] is a redundant
/// explicit save for screens that offer one.
#[derive(Debug)]
pub struct ColumnLayoutManager<S> {
    layout: ColumnLayout,
    storage: S,
    user_key: String,
}

impl<S: LayoutStorage> ColumnLayoutManager<S> {
    /// Loads the persisted layout for `user_key`, falling back to the default layout when there
    /// is none or it cannot be read.
    pub fn load(storage: S, user_key: impl Into<String>) -> Self {
        let user_key = user_key.into();
        let layout = match storage.load_column_layout(&user_key) {
            Ok(Some(stored)) => ColumnLayout::reconcile(&stored),
            Ok(None) => ColumnLayout::default(),
            Err(_err) => {
                gwarn!(user_key = %user_key, error = %_err, "column layout unreadable; using default");
                ColumnLayout::default()
            }
        };
        Self {
            layout,
            storage,
            user_key,
        }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn user_key(&self) -> &str {
        &self.user_key
    }

    pub fn persist(&self) -> StorageResult<()> {
        self.storage
            .save_column_layout(&self.user_key, &self.layout.to_stored())
    }

    pub fn save_layout(&self) -> StorageResult<()> {
        self.persist()
    }

    pub fn toggle_visibility(&mut self, id: ColumnId) -> bool {
        let changed = self.layout.toggle_visibility(id);
        if changed {
            self.persist_or_warn();
        }
        changed
    }

    pub fn reorder(&mut self, source: ColumnId, target: ColumnId) -> bool {
        let changed = self.layout.reorder(source, target);
        if changed {
            self.persist_or_warn();
        }
        changed
    }

    pub fn move_to(&mut self, id: ColumnId, index: usize) -> bool {
        let changed = self.layout.move_to(id, index);
        if changed {
            self.persist_or_warn();
        }
        changed
    }

    pub fn show_all(&mut self) -> bool {
        let changed = self.layout.show_all();
        if changed {
            self.persist_or_warn();
        }
        changed
    }

    /// Restores the canonical layout and forgets the persisted one.
    pub fn reset_to_default(&mut self) -> StorageResult<()> {
        self.layout.reset_to_default();
        self.storage.clear_column_layout(&self.user_key)
    }

    fn persist_or_warn(&self) {
        if let Err(_err) = self.persist() {
            gwarn!(user_key = %self.user_key, error = %_err, "failed to persist column layout");
        }
    }
}
