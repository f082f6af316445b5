//! Kernel error type.
//!
//! Out-of-range resource changes are never errors (they clamp). Errors
//! here are invalid arguments at the kernel boundary.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A resource name outside the closed set of four.
    #[error("unknown resource type {0:?}")]
    UnknownResource(String),

    /// Card id does not match `[A-Za-z0-9_-]+`.
    #[error("invalid card id {0:?}: must match [A-Za-z0-9_-]+")]
    InvalidCardId(String),

    #[error("card {0:?} has no choices")]
    CardHasNoChoices(String),

    #[error("card {card_id:?} declares choice {choice_id} more than once")]
    DuplicateChoice { card_id: String, choice_id: u32 },

    #[error("card {card_id:?} has no choice {choice_id}")]
    UnknownChoice { card_id: String, choice_id: u32 },

    #[error("no card with id {0:?}")]
    UnknownCard(String),

    /// History record not of the form `day/card_id/choice_id`.
    #[error("malformed decision record {0:?}")]
    MalformedRecord(String),
}
