use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ColumnId;
use crate::error::PatchError;

/// Stable, immutable identifier of an inventory item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Stock status of an item.
///
/// Serialized in kebab-case (`"in-stock"`, `"low-stock"`, ...). Unknown values round-trip through
/// [`ItemStatus::Other`] so a newer store can introduce statuses without breaking older clients.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemStatus {
    #[default]
    InStock,
    LowStock,
    OutOfStock,
    Discontinued,
    OnOrder,
    Other(String),
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InStock => "in-stock",
            Self::LowStock => "low-stock",
            Self::OutOfStock => "out-of-stock",
            Self::Discontinued => "discontinued",
            Self::OnOrder => "on-order",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = core::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "in-stock" => Self::InStock,
            "low-stock" => Self::LowStock,
            "out-of-stock" => Self::OutOfStock,
            "discontinued" => Self::Discontinued,
            "on-order" => Self::OnOrder,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl From<String> for ItemStatus {
    fn from(value: String) -> Self {
        match value.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<ItemStatus> for String {
    fn from(value: ItemStatus) -> Self {
        match value {
            ItemStatus::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

/// An inventory record as held in the row buffer.
///
/// Fields other than `id` fall back to their defaults (`0` for numbers) when the store payload
/// omits them or sends `null`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sku: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subcategory: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supplier: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reorder_point: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub unit_price: f64,
    /// Derived: `quantity * unit_price`. The store may compute it differently (rounding, tax),
    /// in which case its value wins on reconciliation.
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_value: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ItemStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Item {
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sku: String::new(),
            category: String::new(),
            subcategory: String::new(),
            supplier: String::new(),
            location: String::new(),
            quantity: 0.0,
            reorder_point: 0.0,
            unit_price: 0.0,
            total_value: 0.0,
            status: ItemStatus::default(),
            description: String::new(),
            notes: String::new(),
            last_updated: None,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = subcategory.into();
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = supplier.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_quantity(mut self, quantity: f64) -> Self {
        self.quantity = quantity;
        self.total_value = self.quantity * self.unit_price;
        self
    }

    pub fn with_reorder_point(mut self, reorder_point: f64) -> Self {
        self.reorder_point = reorder_point;
        self
    }

    pub fn with_unit_price(mut self, unit_price: f64) -> Self {
        self.unit_price = unit_price;
        self.total_value = self.quantity * self.unit_price;
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Clamps negative or non-finite numeric fields to `0`.
    pub(crate) fn sanitize(&mut self) {
        for v in [
            &mut self.quantity,
            &mut self.reorder_point,
            &mut self.unit_price,
            &mut self.total_value,
        ] {
            if !v.is_finite() || *v < 0.0 {
                *v = 0.0;
            }
        }
    }

    /// Merges `patch` into this item and returns the previous values of the touched fields.
    ///
    /// Applying the returned snapshot restores the item exactly.
    pub fn apply_patch(&mut self, patch: &ItemPatch) -> ItemPatch {
        let mut prev = ItemPatch::default();

        macro_rules! swap_field {
            ($field:ident) => {
                if let Some(v) = &patch.$field {
                    prev.$field = Some(core::mem::replace(&mut self.$field, v.clone()));
                }
            };
        }

        swap_field!(name);
        swap_field!(sku);
        swap_field!(category);
        swap_field!(subcategory);
        swap_field!(supplier);
        swap_field!(location);
        swap_field!(quantity);
        swap_field!(reorder_point);
        swap_field!(unit_price);
        swap_field!(status);
        swap_field!(description);
        swap_field!(notes);

        let old_total = self.total_value;
        if let Some(total) = patch.total_value {
            self.total_value = total;
        } else if patch.quantity.is_some() || patch.unit_price.is_some() {
            self.total_value = self.quantity * self.unit_price;
        }
        if self.total_value.to_bits() != old_total.to_bits() {
            prev.total_value = Some(old_total);
        }

        prev
    }

    /// Resolves the value drawn in the cell for `column`.
    pub fn cell(&self, column: ColumnId) -> CellValue<'_> {
        match column {
            ColumnId::Name => CellValue::Text(&self.name),
            ColumnId::Sku => CellValue::Text(&self.sku),
            ColumnId::Category => CellValue::Text(&self.category),
            ColumnId::Subcategory => CellValue::Text(&self.subcategory),
            ColumnId::Supplier => CellValue::Text(&self.supplier),
            ColumnId::Location => CellValue::Text(&self.location),
            ColumnId::Quantity => CellValue::Number(self.quantity),
            ColumnId::ReorderPoint => CellValue::Number(self.reorder_point),
            ColumnId::UnitPrice => CellValue::Number(self.unit_price),
            ColumnId::TotalValue => CellValue::Number(self.total_value),
            ColumnId::Status => CellValue::Status(&self.status),
            ColumnId::Description => CellValue::Text(&self.description),
            ColumnId::Notes => CellValue::Text(&self.notes),
            ColumnId::LastUpdated => CellValue::Timestamp(self.last_updated),
        }
    }
}

/// A partial update of an item's editable fields.
///
/// `None` means "untouched". The identifier is not patchable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_point: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    /// Only set by rollback snapshots; user edits leave it to be recomputed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ItemStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ItemPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = Some(supplier.into());
        self
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn quantity(mut self, quantity: f64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn reorder_point(mut self, reorder_point: f64) -> Self {
        self.reorder_point = Some(reorder_point);
        self
    }

    pub fn unit_price(mut self, unit_price: f64) -> Self {
        self.unit_price = Some(unit_price);
        self
    }

    pub fn status(mut self, status: ItemStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Rejects patches that would break the non-negative numeric invariant.
    pub fn validate(&self) -> Result<(), PatchError> {
        let checks = [
            (self.quantity, PatchError::NegativeQuantity),
            (self.reorder_point, PatchError::NegativeReorderPoint),
            (self.unit_price, PatchError::NegativeUnitPrice),
            (self.total_value, PatchError::NegativeTotalValue),
        ];
        for (value, err) in checks {
            let Some(v) = value else {
                continue;
            };
            if !v.is_finite() {
                return Err(PatchError::NonFiniteNumber);
            }
            if v < 0.0 {
                return Err(err);
            }
        }
        Ok(())
    }
}

/// A cell value resolved from an [`Item`] through a column id.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Number(f64),
    Status(&'a ItemStatus),
    Timestamp(Option<DateTime<Utc>>),
}

impl fmt::Display for CellValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Status(s) => f.write_str(s.as_str()),
            Self::Timestamp(Some(t)) => write!(f, "{}", t.to_rfc3339()),
            Self::Timestamp(None) => Ok(()),
        }
    }
}
