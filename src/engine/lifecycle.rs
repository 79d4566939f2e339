use ulid::Ulid;

use crate::model::{Booking, BookingStatus, PriorityClass};

use super::EngineError;

/// Status a freshly accepted booking starts in: admins book directly into
/// CONFIRMED, everyone else waits for admin approval.
pub fn initial_status(requester: PriorityClass) -> BookingStatus {
    match requester {
        PriorityClass::Admin => BookingStatus::Confirmed,
        _ => BookingStatus::Pending,
    }
}

/// PENDING → CONFIRMED. Admin approval of a pending request.
pub fn approve(booking: &Booking) -> Result<BookingStatus, EngineError> {
    match booking.status {
        BookingStatus::Pending => Ok(BookingStatus::Confirmed),
        from => Err(EngineError::InvalidTransition {
            from,
            action: "approve",
        }),
    }
}

/// PENDING → REJECTED. Admin rejection of a pending request.
pub fn reject(booking: &Booking) -> Result<BookingStatus, EngineError> {
    match booking.status {
        BookingStatus::Pending => Ok(BookingStatus::Rejected),
        from => Err(EngineError::InvalidTransition {
            from,
            action: "reject",
        }),
    }
}

/// Active → CANCELLED, owner only. The ownership check lives here so it
/// runs in the same critical section as the status write.
pub fn cancel(booking: &Booking, caller: Ulid) -> Result<BookingStatus, EngineError> {
    if booking.user_id != caller {
        return Err(EngineError::NotOwner(booking.id));
    }
    match booking.status {
        BookingStatus::Pending | BookingStatus::Confirmed => Ok(BookingStatus::Cancelled),
        from => Err(EngineError::InvalidTransition {
            from,
            action: "cancel",
        }),
    }
}

/// Active → OVERRIDDEN. Only the arbiter calls this, for bookings a
/// higher-or-equal-priority accepted request displaces.
pub fn supersede(booking: &Booking) -> Result<BookingStatus, EngineError> {
    match booking.status {
        BookingStatus::Pending | BookingStatus::Confirmed => Ok(BookingStatus::Overridden),
        from => Err(EngineError::InvalidTransition {
            from,
            action: "override",
        }),
    }
}
