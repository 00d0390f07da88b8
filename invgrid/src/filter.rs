//! The filter predicate engine.
//!
//! Filtering is a pure function of the buffer contents and a [`FilterState`]: the result keeps
//! buffer order and never allocates per-item beyond the case folding needed for matching.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Item, RowBuffer};

/// User-controlled filter criteria.
///
/// Set-valued fields are OR-ed within the field; all criteria are AND-ed together. Empty sets and
/// unset options impose no constraint.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
    pub free_text_query: String,
    pub categories: BTreeSet<String>,
    pub statuses: BTreeSet<String>,
    pub supplier: Option<String>,
    pub location: Option<String>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.set_query(query);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.insert(category.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.statuses.insert(status.into());
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.set_supplier(Some(supplier.into()));
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.set_location(Some(location.into()));
        self
    }

    pub fn is_default(&self) -> bool {
        self.active_filter_count() == 0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.free_text_query = query.into();
    }

    /// Adds `category` to the selection, or removes it if already selected.
    pub fn toggle_category(&mut self, category: &str) {
        toggle(&mut self.categories, category);
    }

    pub fn toggle_status(&mut self, status: &str) {
        toggle(&mut self.statuses, status);
    }

    /// Sets the supplier constraint. An empty string clears it.
    pub fn set_supplier(&mut self, supplier: Option<String>) {
        self.supplier = supplier.filter(|s| !s.trim().is_empty());
    }

    /// Sets the location constraint. An empty string clears it.
    pub fn set_location(&mut self, location: Option<String>) {
        self.location = location.filter(|s| !s.trim().is_empty());
    }

    /// Number of active criteria, for badges. Not used by matching.
    pub fn active_filter_count(&self) -> usize {
        usize::from(!self.free_text_query.trim().is_empty())
            + self.categories.len()
            + self.statuses.len()
            + usize::from(self.supplier.is_some())
            + usize::from(self.location.is_some())
    }

    /// Returns whether `item` satisfies every active criterion.
    pub fn matches(&self, item: &Item) -> bool {
        Predicate::new(self).matches(item)
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_owned());
    }
}

/// A [`FilterState`] with its case folding done once per pass instead of once per item.
struct Predicate<'s> {
    needle: Option<String>,
    categories: &'s BTreeSet<String>,
    statuses: &'s BTreeSet<String>,
    supplier: Option<String>,
    location: Option<String>,
}

impl<'s> Predicate<'s> {
    fn new(state: &'s FilterState) -> Self {
        let query = state.free_text_query.trim();
        Self {
            needle: (!query.is_empty()).then(|| query.to_lowercase()),
            categories: &state.categories,
            statuses: &state.statuses,
            supplier: state.supplier.as_deref().map(str::to_lowercase),
            location: state.location.as_deref().map(str::to_lowercase),
        }
    }

    fn matches(&self, item: &Item) -> bool {
        if let Some(needle) = &self.needle {
            let hit = [
                &item.name,
                &item.sku,
                &item.category,
                &item.supplier,
                &item.description,
            ]
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle.as_str()));
            if !hit {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&item.category) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(item.status.as_str()) {
            return false;
        }
        if let Some(supplier) = &self.supplier {
            if item.supplier.to_lowercase() != *supplier {
                return false;
            }
        }
        if let Some(location) = &self.location {
            if item.location.to_lowercase() != *location {
                return false;
            }
        }
        true
    }
}

/// Returns the items of `rows` matching `state`, in their original order.
pub fn filter<'a>(rows: &'a [Item], state: &FilterState) -> Vec<&'a Item> {
    if state.is_default() {
        return rows.iter().collect();
    }
    let predicate = Predicate::new(state);
    rows.iter().filter(|item| predicate.matches(item)).collect()
}

/// Distinct, alphabetically sorted values of the filterable fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    pub categories: Vec<String>,
    pub statuses: Vec<String>,
    pub suppliers: Vec<String>,
    pub locations: Vec<String>,
}

/// Derives the filter option lists from everything fetched so far.
///
/// Independent of the active filter so narrowing never hides the options needed to broaden again.
pub fn derive_facets(rows: &[Item]) -> Facets {
    let mut categories = BTreeSet::new();
    let mut statuses = BTreeSet::new();
    let mut suppliers = BTreeSet::new();
    let mut locations = BTreeSet::new();

    for item in rows {
        insert_non_empty(&mut categories, &item.category);
        insert_non_empty(&mut statuses, item.status.as_str());
        insert_non_empty(&mut suppliers, &item.supplier);
        insert_non_empty(&mut locations, &item.location);
    }

    Facets {
        categories: categories.into_iter().map(str::to_owned).collect(),
        statuses: statuses.into_iter().map(str::to_owned).collect(),
        suppliers: suppliers.into_iter().map(str::to_owned).collect(),
        locations: locations.into_iter().map(str::to_owned).collect(),
    }
}

fn insert_non_empty<'a>(set: &mut BTreeSet<&'a str>, value: &'a str) {
    if !value.is_empty() {
        set.insert(value);
    }
}

/// Caches [`derive_facets`] keyed by the buffer revision.
#[derive(Clone, Debug, Default)]
pub struct FacetCache {
    revision: Option<u64>,
    facets: Facets,
}

impl FacetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the facets for `buffer`, recomputing them only if the buffer changed.
    pub fn get(&mut self, buffer: &RowBuffer) -> &Facets {
        if self.revision != Some(buffer.revision()) {
            self.facets = derive_facets(buffer.items());
            self.revision = Some(buffer.revision());
        }
        &self.facets
    }

    pub fn invalidate(&mut self) {
        self.revision = None;
    }
}
