use thiserror::Error;

/// Rejections raised before a create or update payload reaches the store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Field must not be empty: {0}")]
    EmptyField(&'static str),

    #[error("Price must be a positive amount, got {0}")]
    NonPositivePrice(f64),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Unknown marketplace category: {0}")]
    UnknownCategory(u32),

    #[error("Either sourceId or vehicleId must be provided")]
    NoSourceId,

    #[error("Update payload contains no fields")]
    EmptyUpdate,
}
