use serde::{Deserialize, Serialize};

use crate::suggest::{DEFAULT_SUGGESTION_LIMIT, MIN_SUGGESTION_QUERY_LEN};

/// Configuration for the grid engine.
///
/// All fields have defaults, so a partial JSON object (or `{}`) deserializes into a usable
/// configuration. Out-of-range values are clamped by [`GridOptions::normalized`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridOptions {
    /// Rows requested per page from the item store.
    pub page_size: usize,
    /// Fixed row height used by the window math.
    pub row_height: u32,
    /// Extra rows materialized above and below the viewport.
    pub overscan: usize,
    /// Idle gap before a typed query is applied to the filter.
    pub search_debounce_ms: u64,
    pub suggestion_limit: usize,
    pub min_suggestion_query_len: usize,
    /// How far below the viewport the load-more sentinel starts a fetch.
    pub sentinel_margin: u32,
    /// Debounced fallback for resetting `is_scrolling` after the last scroll event.
    pub is_scrolling_reset_delay_ms: u64,
    /// Key under which per-user layout and presets are stored.
    pub user_key: String,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            page_size: 50,
            row_height: 40,
            overscan: 5,
            search_debounce_ms: 250,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            min_suggestion_query_len: MIN_SUGGESTION_QUERY_LEN,
            sentinel_margin: 200,
            is_scrolling_reset_delay_ms: 150,
            user_key: "default".to_owned(),
        }
    }
}

impl GridOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(raw).map(Self::normalized)
    }

    /// Clamps values the engine cannot work with (zero row height, zero page size).
    pub fn normalized(mut self) -> Self {
        self.page_size = self.page_size.max(1);
        self.row_height = self.row_height.max(1);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_row_height(mut self, row_height: u32) -> Self {
        self.row_height = row_height.max(1);
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_search_debounce_ms(mut self, delay_ms: u64) -> Self {
        self.search_debounce_ms = delay_ms;
        self
    }

    pub fn with_suggestion_limit(mut self, limit: usize) -> Self {
        self.suggestion_limit = limit;
        self
    }

    pub fn with_min_suggestion_query_len(mut self, len: usize) -> Self {
        self.min_suggestion_query_len = len;
        self
    }

    pub fn with_sentinel_margin(mut self, margin: u32) -> Self {
        self.sentinel_margin = margin;
        self
    }

    pub fn with_is_scrolling_reset_delay_ms(mut self, delay_ms: u64) -> Self {
        self.is_scrolling_reset_delay_ms = delay_ms;
        self
    }

    pub fn with_user_key(mut self, user_key: impl Into<String>) -> Self {
        self.user_key = user_key.into();
        self
    }
}
