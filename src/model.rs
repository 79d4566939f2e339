use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    /// Strict open overlap: touching endpoints do not overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }
}

// ── Requesters ───────────────────────────────────────────────────

/// Position in the campus priority order. Determines who may override whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriorityClass {
    Student,
    Faculty,
    Admin,
}

impl PriorityClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityClass::Student => "STUDENT",
            PriorityClass::Faculty => "FACULTY",
            PriorityClass::Admin => "ADMIN",
        }
    }
}

/// Role of a requester, with the fields that only exist for that role.
/// Immutable after registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Student {
        student_id: String,
        program: String,
        branch: String,
    },
    Faculty {
        employee_id: String,
        department: String,
    },
    Admin {
        employee_id: String,
    },
}

impl Role {
    pub fn class(&self) -> PriorityClass {
        match self {
            Role::Student { .. } => PriorityClass::Student,
            Role::Faculty { .. } => PriorityClass::Faculty,
            Role::Admin { .. } => PriorityClass::Admin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Ulid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

// ── Campus inventory ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: Ulid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub id: Ulid,
    pub building_id: Ulid,
    pub number: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    Classroom { has_smart_board: bool },
    Lab { lab_type: String },
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomKind::Classroom { .. } => "CLASSROOM",
            RoomKind::Lab { .. } => "LAB",
        }
    }
}

/// A bookable room. Read-only from the arbitration engine's perspective;
/// `capacity` is a seat count, not a concurrency limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: Ulid,
    pub floor_id: Ulid,
    pub name: String,
    pub capacity: u32,
    pub kind: RoomKind,
    /// Fixed equipment description (projector, smartboard, ...).
    pub fixed_resources: String,
}

// ── Bookings ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Rejected,
    Overridden,
    Cancelled,
}

impl BookingStatus {
    /// Active bookings occupy their time window.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Rejected => "REJECTED",
            BookingStatus::Overridden => "OVERRIDDEN",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(BookingStatus::Pending),
            "CONFIRMED" => Some(BookingStatus::Confirmed),
            "REJECTED" => Some(BookingStatus::Rejected),
            "OVERRIDDEN" => Some(BookingStatus::Overridden),
            "CANCELLED" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

/// A booking. Room, requester and time window are immutable after creation;
/// only `status` ever changes, and never out of a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub room_id: Ulid,
    pub user_id: Ulid,
    pub span: Span,
    pub purpose: String,
    /// Free-text requested-resources tag.
    pub resources: String,
    pub status: BookingStatus,
}

/// Per-room state — the unit of locking. Bookings are kept sorted by
/// `span.start` so overlap queries can binary-search the right edge.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub room: Room,
    /// Every booking ever made for this room, terminal ones included.
    pub bookings: Vec<Booking>,
}

impl RoomState {
    pub fn new(room: Room) -> Self {
        Self {
            room,
            bookings: Vec::new(),
        }
    }

    /// Insert a booking maintaining sort order by span.start.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// Status is the only mutable field; spans never move, so sort order holds.
    pub fn set_status(&mut self, id: Ulid, status: BookingStatus) -> Option<&Booking> {
        let b = self.bookings.iter_mut().find(|b| b.id == id)?;
        b.status = status;
        Some(b)
    }

    /// Return bookings (any status) whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        // Everything at index >= right_bound starts at or after query.end → can't overlap.
        let right_bound = self
            .bookings
            .partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }
}

// ── WAL events ───────────────────────────────────────────────────

/// The event types — flat, no nesting. This is the WAL record format, and
/// `BookingRequested` is the stable persisted booking record shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    UserRegistered {
        user: User,
    },
    BuildingAdded {
        id: Ulid,
        name: String,
    },
    BuildingRemoved {
        id: Ulid,
    },
    FloorAdded {
        id: Ulid,
        building_id: Ulid,
        number: u32,
    },
    FloorRemoved {
        id: Ulid,
    },
    RoomAdded {
        room: Room,
    },
    RoomRemoved {
        id: Ulid,
    },
    BookingRequested {
        id: Ulid,
        room_id: Ulid,
        user_id: Ulid,
        span: Span,
        purpose: String,
        resources: String,
        status: BookingStatus,
    },
    BookingApproved {
        id: Ulid,
        room_id: Ulid,
    },
    BookingRejected {
        id: Ulid,
        room_id: Ulid,
    },
    BookingOverridden {
        id: Ulid,
        room_id: Ulid,
    },
    BookingCancelled {
        id: Ulid,
        room_id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampusStats {
    pub buildings: usize,
    pub rooms: usize,
    pub pending_bookings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(start: Ms, end: Ms, status: BookingStatus) -> Booking {
        Booking {
            id: Ulid::new(),
            room_id: Ulid::new(),
            user_id: Ulid::new(),
            span: Span::new(start, end),
            purpose: String::new(),
            resources: String::new(),
            status,
        }
    }

    fn room() -> Room {
        Room {
            id: Ulid::new(),
            floor_id: Ulid::new(),
            name: "R-101".into(),
            capacity: 40,
            kind: RoomKind::Classroom {
                has_smart_board: false,
            },
            fixed_resources: String::new(),
        }
    }

    #[test]
    fn span_basics() {
        let s = Span::new(100, 200);
        assert_eq!(s.duration_ms(), 100);
        assert!(s.contains_instant(100));
        assert!(s.contains_instant(199));
        assert!(!s.contains_instant(200)); // half-open
    }

    #[test]
    fn span_overlap_strict_open() {
        let a = Span::new(100, 200);
        let b = Span::new(150, 250);
        let c = Span::new(200, 300);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c)); // touching endpoints, not overlapping
    }

    #[test]
    fn priority_order() {
        assert!(PriorityClass::Student < PriorityClass::Faculty);
        assert!(PriorityClass::Faculty < PriorityClass::Admin);
    }

    #[test]
    fn role_class_dispatch() {
        let r = Role::Faculty {
            employee_id: "F-9".into(),
            department: "CSE".into(),
        };
        assert_eq!(r.class(), PriorityClass::Faculty);
        assert_eq!(r.class().as_str(), "FACULTY");
    }

    #[test]
    fn status_activeness() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::Rejected.is_terminal());
        assert!(BookingStatus::Overridden.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_parse_roundtrip() {
        for s in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Rejected,
            BookingStatus::Overridden,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(BookingStatus::parse("NOPE"), None);
    }

    #[test]
    fn booking_ordering() {
        let mut rs = RoomState::new(room());
        rs.insert_booking(booking(300, 400, BookingStatus::Pending));
        rs.insert_booking(booking(100, 200, BookingStatus::Confirmed));
        rs.insert_booking(booking(200, 300, BookingStatus::Pending));
        assert_eq!(rs.bookings[0].span.start, 100);
        assert_eq!(rs.bookings[1].span.start, 200);
        assert_eq!(rs.bookings[2].span.start, 300);
    }

    #[test]
    fn overlapping_skips_disjoint() {
        let mut rs = RoomState::new(room());
        rs.insert_booking(booking(100, 200, BookingStatus::Pending)); // past
        rs.insert_booking(booking(450, 600, BookingStatus::Pending)); // hit
        rs.insert_booking(booking(1000, 1100, BookingStatus::Pending)); // future

        let query = Span::new(500, 800);
        let hits: Vec<_> = rs.overlapping(&query).collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].span, Span::new(450, 600));
    }

    #[test]
    fn overlapping_adjacent_not_included() {
        // Booking ending exactly at query.start is NOT overlapping (half-open)
        let mut rs = RoomState::new(room());
        rs.insert_booking(booking(100, 200, BookingStatus::Confirmed));
        let hits: Vec<_> = rs.overlapping(&Span::new(200, 300)).collect();
        assert!(hits.is_empty());
    }

    #[test]
    fn overlapping_ignores_status() {
        // Status filtering is the overlap index's job, not RoomState's.
        let mut rs = RoomState::new(room());
        rs.insert_booking(booking(100, 200, BookingStatus::Overridden));
        let hits: Vec<_> = rs.overlapping(&Span::new(150, 250)).collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn set_status_finds_booking() {
        let mut rs = RoomState::new(room());
        let b = booking(100, 200, BookingStatus::Pending);
        let id = b.id;
        rs.insert_booking(b);
        let updated = rs.set_status(id, BookingStatus::Confirmed).unwrap();
        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert!(rs.set_status(Ulid::new(), BookingStatus::Cancelled).is_none());
    }

    #[test]
    fn event_serialization_roundtrip() {
        let event = Event::BookingRequested {
            id: Ulid::new(),
            room_id: Ulid::new(),
            user_id: Ulid::new(),
            span: Span::new(1000, 2000),
            purpose: "lecture".into(),
            resources: "projector".into(),
            status: BookingStatus::Pending,
        };
        let bytes = bincode::serialize(&event).unwrap();
        let decoded: Event = bincode::deserialize(&bytes).unwrap();
        assert_eq!(event, decoded);
    }
}
