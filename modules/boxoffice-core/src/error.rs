/// Result type alias for boxoffice operations.
pub type Result<T> = std::result::Result<T, BoxofficeError>;

/// Expected business outcomes are their own variants so callers can render
/// distinct messages; only `Database` and `Other` are infrastructure
/// failures that propagate to the request boundary as such.
#[derive(Debug, thiserror::Error)]
pub enum BoxofficeError {
    #[error("event not found")]
    EventNotFound,

    #[error("order not found")]
    OrderNotFound,

    #[error("sold out")]
    SoldOut,

    #[error("quantity must be positive, got {0}")]
    InvalidQuantity(i32),

    #[error("stock must be non-negative, got {0}")]
    InvalidStock(i32),

    #[error("order belongs to another user")]
    Forbidden,

    #[error("only pending orders can be cancelled")]
    NotCancellable,

    #[error("only cancelled orders can be deleted")]
    NotDeletable,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
