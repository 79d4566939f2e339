use ulid::Ulid;

use crate::model::BookingStatus;

/// Why the arbiter rejected a booking request. Messages name the blocking
/// priority class, never the conflicting booking's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    /// Requester is a student and the slot has any active booking.
    SlotOccupied,
    /// At least one overlapping booking is held by equal or higher priority.
    HeldByEqualOrHigher,
}

impl ConflictReason {
    pub fn message(&self) -> &'static str {
        match self {
            ConflictReason::SlotOccupied => "slot already occupied",
            ConflictReason::HeldByEqualOrHigher => {
                "slot held by a booking of equal or higher priority"
            }
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    Validation(&'static str),
    NotFound(Ulid),
    AlreadyExists(Ulid),
    Conflict(ConflictReason),
    /// Cancellation attempted by someone other than the booking's owner.
    NotOwner(Ulid),
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },
    HasChildren(Ulid),
    LimitExceeded(&'static str),
    WalError(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(msg) => write!(f, "invalid input: {msg}"),
            EngineError::NotFound(id) => write!(f, "not found: {id}"),
            EngineError::AlreadyExists(id) => write!(f, "already exists: {id}"),
            EngineError::Conflict(reason) => write!(f, "{}", reason.message()),
            EngineError::NotOwner(id) => {
                write!(f, "booking {id} can only be cancelled by its owner")
            }
            EngineError::InvalidTransition { from, action } => {
                write!(f, "cannot {action} a booking in status {}", from.as_str())
            }
            EngineError::HasChildren(id) => {
                write!(f, "cannot delete {id}: still has children")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
