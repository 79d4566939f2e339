use ulid::Ulid;

use crate::model::*;

use super::slots::{Slot, build_day_view};
use super::{Engine, EngineError};

impl Engine {
    /// The fixed hourly availability grid for one room and one day.
    /// `day_start` is the unix-ms timestamp of the day's midnight.
    pub async fn day_view(&self, room_id: Ulid, day_start: Ms) -> Result<Vec<Slot>, EngineError> {
        use crate::limits::*;
        if !(MIN_VALID_TIMESTAMP_MS..MAX_VALID_TIMESTAMP_MS).contains(&day_start) {
            return Err(EngineError::LimitExceeded("timestamp out of range"));
        }
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        Ok(build_day_view(&guard, day_start, &self.directory))
    }

    pub async fn get_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        let room_id = self
            .room_for_booking(&id)
            .ok_or(EngineError::NotFound(id))?;
        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let guard = rs.read().await;
        guard.booking(id).cloned().ok_or(EngineError::NotFound(id))
    }

    /// Bookings matching the optional requester/status filters, newest start
    /// first. Unfiltered, this is the full campus booking history.
    pub async fn bookings_filtered(
        &self,
        user_id: Option<Ulid>,
        status: Option<BookingStatus>,
    ) -> Vec<Booking> {
        let mut out = Vec::new();
        let room_arcs: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
        for rs in room_arcs {
            let guard = rs.read().await;
            out.extend(
                guard
                    .bookings
                    .iter()
                    .filter(|b| user_id.is_none_or(|u| b.user_id == u))
                    .filter(|b| status.is_none_or(|s| b.status == s))
                    .cloned(),
            );
        }
        out.sort_by(|a, b| b.span.start.cmp(&a.span.start));
        out
    }

    /// Every booking a requester ever made, newest start first.
    pub async fn bookings_for_user(&self, user_id: Ulid) -> Vec<Booking> {
        self.bookings_filtered(Some(user_id), None).await
    }

    /// The admin approval queue: all PENDING bookings, oldest start first.
    pub async fn pending_bookings(&self) -> Vec<Booking> {
        let mut out = self
            .bookings_filtered(None, Some(BookingStatus::Pending))
            .await;
        out.sort_by_key(|b| b.span.start);
        out
    }

    pub async fn list_rooms(&self) -> Vec<Room> {
        let mut out = Vec::new();
        let room_arcs: Vec<_> = self.rooms.iter().map(|e| e.value().clone()).collect();
        for rs in room_arcs {
            let guard = rs.read().await;
            out.push(guard.room.clone());
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        out
    }

    /// Dashboard counters.
    pub async fn stats(&self) -> CampusStats {
        CampusStats {
            buildings: self.directory.building_count(),
            rooms: self.rooms.len(),
            pending_bookings: self.pending_bookings().await.len(),
        }
    }
}
