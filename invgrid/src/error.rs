use thiserror::Error;

/// Errors raised by a persistence port.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// A patch that would violate an item invariant.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchError {
    #[error("quantity must not be negative")]
    NegativeQuantity,

    #[error("reorder point must not be negative")]
    NegativeReorderPoint,

    #[error("unit price must not be negative")]
    NegativeUnitPrice,

    #[error("total value must not be negative")]
    NegativeTotalValue,

    #[error("numeric fields must be finite")]
    NonFiniteNumber,
}
