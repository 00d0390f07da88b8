use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::Item;

/// Default number of suggestions returned by [`suggest`].
pub const DEFAULT_SUGGESTION_LIMIT: usize = 8;

/// Queries shorter than this (in characters) produce no suggestions.
pub const MIN_SUGGESTION_QUERY_LEN: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Name,
    Sku,
    Category,
    Supplier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub value: String,
    /// How many rows carry this value. Always `1` for SKUs.
    pub occurrence_count: usize,
}

/// Builds ranked type-ahead suggestions for `query` from `rows` in a single pass.
///
/// Suggestions are ordered by descending occurrence count, ties keeping encounter order, and
/// truncated to `limit`.
pub fn suggest<'a>(
    rows: impl IntoIterator<Item = &'a Item>,
    query: &str,
    limit: usize,
) -> Vec<Suggestion> {
    suggest_with_min_len(rows, query, limit, MIN_SUGGESTION_QUERY_LEN)
}

/// Same as [`suggest`], with a configurable minimum query length.
pub fn suggest_with_min_len<'a>(
    rows: impl IntoIterator<Item = &'a Item>,
    query: &str,
    limit: usize,
    min_len: usize,
) -> Vec<Suggestion> {
    let query = query.trim();
    if limit == 0 || query.chars().count() < min_len.max(1) {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    let mut out: Vec<Suggestion> = Vec::new();
    let mut slots: HashMap<(SuggestionKind, &'a str), usize> = HashMap::new();

    for item in rows {
        let fields = [
            (SuggestionKind::Name, item.name.as_str()),
            (SuggestionKind::Sku, item.sku.as_str()),
            (SuggestionKind::Category, item.category.as_str()),
            (SuggestionKind::Supplier, item.supplier.as_str()),
        ];
        for (kind, value) in fields {
            if value.is_empty() || !value.to_lowercase().contains(needle.as_str()) {
                continue;
            }
            match slots.get(&(kind, value)) {
                Some(&slot) => {
                    if kind != SuggestionKind::Sku {
                        out[slot].occurrence_count += 1;
                    }
                }
                None => {
                    slots.insert((kind, value), out.len());
                    out.push(Suggestion {
                        kind,
                        value: value.to_owned(),
                        occurrence_count: 1,
                    });
                }
            }
        }
    }

    // Stable: equal counts keep encounter order.
    out.sort_by(|a, b| b.occurrence_count.cmp(&a.occurrence_count));
    out.truncate(limit);
    out
}
