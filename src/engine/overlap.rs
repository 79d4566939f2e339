use crate::model::*;

use super::EngineError;

/// Validate a raw `[start, end)` request window and turn it into a `Span`.
/// Runs before anything else touches the instants, so malformed input never
/// reaches `Span::new`.
pub(crate) fn validate_window(start: Ms, end: Ms) -> Result<Span, EngineError> {
    use crate::limits::*;
    if end <= start {
        return Err(EngineError::Validation("end must be after start"));
    }
    if start < MIN_VALID_TIMESTAMP_MS || end > MAX_VALID_TIMESTAMP_MS {
        return Err(EngineError::LimitExceeded("timestamp out of range"));
    }
    if end - start > MAX_SPAN_DURATION_MS {
        return Err(EngineError::LimitExceeded("span too wide"));
    }
    Ok(Span::new(start, end))
}

/// The overlap index: every active (PENDING/CONFIRMED) booking whose span
/// strictly-open-intersects the query window, ordered by start. Terminal
/// bookings never occupy their window. No business rules here — the arbiter
/// decides what an overlap means.
///
/// Callers mutating afterwards must hold the room's write lock across both
/// this query and the mutation; a stale snapshot here is a correctness bug.
pub fn find_active_overlaps<'a>(rs: &'a RoomState, span: &Span) -> Vec<&'a Booking> {
    rs.overlapping(span)
        .filter(|b| b.status.is_active())
        .collect()
}
