use crate::model::Ms;

/// Max length for user, building and room names.
pub const MAX_NAME_LEN: usize = 256;

/// Max length for a user email address.
pub const MAX_EMAIL_LEN: usize = 256;

/// Max length for a booking purpose text.
pub const MAX_PURPOSE_LEN: usize = 1024;

/// Max length for the free-text requested-resources tag.
pub const MAX_RESOURCES_LEN: usize = 1024;

pub const MAX_USERS: usize = 100_000;
pub const MAX_BUILDINGS: usize = 1_000;
pub const MAX_FLOORS_PER_BUILDING: usize = 200;
pub const MAX_ROOMS: usize = 10_000;

/// Bookings are never deleted, only transitioned, so this bounds the
/// lifetime history of a single room.
pub const MAX_BOOKINGS_PER_ROOM: usize = 100_000;

/// Timestamps must fall in [1970-01-01, 2100-01-01).
pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;

/// A single booking may span at most 7 days.
pub const MAX_SPAN_DURATION_MS: Ms = 7 * 24 * 3_600_000;
