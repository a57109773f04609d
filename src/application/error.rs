use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid movement type: {0} (expected IN, SALE or REMOVAL)")]
    InvalidMovementKind(String),

    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),

    #[error("Movement not found: {0}")]
    MovementNotFound(i64),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}
