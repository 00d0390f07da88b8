use invgrid::{ItemId, PatchError};
use thiserror::Error;

/// Errors returned by an [`crate::ItemStore`] implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("rejected by store: {reason}")]
    Rejected { reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("item not found: {0}")]
    NotFound(ItemId),
}

impl StoreError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    /// Human-readable reason, suitable for a notification.
    pub fn reason(&self) -> String {
        match self {
            Self::Rejected { reason } => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// A page load that failed. Pagination stays paused until retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to fetch page {page}: {source}")]
pub struct FetchError {
    pub page: usize,
    #[source]
    pub source: StoreError,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MutationError {
    #[error("item {0} is not in the buffer")]
    UnknownItem(ItemId),

    #[error("invalid patch: {0}")]
    InvalidPatch(#[from] PatchError),

    #[error("update of item {item_id} rejected: {reason}")]
    Rejected { item_id: ItemId, reason: String },
}

impl MutationError {
    pub fn item_id(&self) -> Option<&ItemId> {
        match self {
            Self::UnknownItem(id) | Self::Rejected { item_id: id, .. } => Some(id),
            Self::InvalidPatch(_) => None,
        }
    }
}
