use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

/// Failures reported by a [`crate::backend::ReservationBackend`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("a reservation already exists for this date and slot")]
    UniqueViolation,
    #[error("reservation not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Caller-supplied data the engine refuses before touching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("holder name must not be empty")]
    EmptyHolderName,
    #[error("holder contact must not be empty")]
    EmptyHolderContact,
    #[error("{0} is not a slot start within business hours")]
    UnknownSlot(NaiveTime),
    #[error("the business is closed on {0}")]
    ClosedDay(NaiveDate),
    #[error("slot {1} on {0} has already started")]
    SlotElapsed(NaiveDate, NaiveTime),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),
    #[error("slot {slot} on {date} is already taken")]
    Conflict { date: NaiveDate, slot: NaiveTime },
    #[error("store error: {0}")]
    Store(String),
    #[error("forbidden: {0}")]
    Forbidden(&'static str),
    #[error("reservation not found: {0}")]
    NotFound(Uuid),
}

impl EngineError {
    /// Stable machine-readable label, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::Conflict { .. } => "conflict",
            EngineError::Store(_) => "store",
            EngineError::Forbidden(_) => "forbidden",
            EngineError::NotFound(_) => "not_found",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("opening hour {opening} must be before closing hour {closing} (closing at most 24)")]
    InvalidHours { opening: u32, closing: u32 },
    #[error("slot width must be at least one minute")]
    ZeroSlotWidth,
    #[error("slot width of {0} minutes exceeds a day")]
    SlotTooWide(u32),
    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("unknown weekday: {0}")]
    InvalidWeekday(String),
    #[error("operator entry must look like name:password, got {0:?}")]
    InvalidOperator(String),
    #[error("could not load environment file: {0}")]
    EnvFile(String),
    #[error("{0}")]
    Arguments(String),
}
