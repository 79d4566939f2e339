use std::sync::Arc;

use tokio::sync::{RwLock, oneshot};
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::arbiter::{Decision, Overlap, decide};
use super::lifecycle;
use super::overlap::{find_active_overlaps, validate_window};
use super::{Engine, EngineError, WalCommand};

impl Engine {
    // ── Directory & inventory ────────────────────────────────

    pub async fn register_user(&self, user: User) -> Result<User, EngineError> {
        if user.name.is_empty() || user.name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation("bad user name"));
        }
        if user.email.is_empty() || user.email.len() > MAX_EMAIL_LEN {
            return Err(EngineError::Validation("bad email"));
        }
        if self.directory.user_count() >= MAX_USERS {
            return Err(EngineError::LimitExceeded("too many users"));
        }
        if self.directory.contains_user(&user.id) {
            return Err(EngineError::AlreadyExists(user.id));
        }
        if self.directory.email_taken(&user.email) {
            return Err(EngineError::Validation("email already registered"));
        }

        let event = Event::UserRegistered { user: user.clone() };
        self.wal_append(&event).await?;
        self.directory.insert_user(user.clone());
        Ok(user)
    }

    pub async fn add_building(&self, id: Ulid, name: String) -> Result<(), EngineError> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation("bad building name"));
        }
        if self.directory.building_count() >= MAX_BUILDINGS {
            return Err(EngineError::LimitExceeded("too many buildings"));
        }
        if self.directory.contains_building(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let event = Event::BuildingAdded {
            id,
            name: name.clone(),
        };
        self.wal_append(&event).await?;
        self.directory.insert_building(Building { id, name });
        Ok(())
    }

    pub async fn remove_building(&self, id: Ulid) -> Result<(), EngineError> {
        if !self.directory.contains_building(&id) {
            return Err(EngineError::NotFound(id));
        }
        if self.directory.has_floors(&id) {
            return Err(EngineError::HasChildren(id));
        }

        let event = Event::BuildingRemoved { id };
        self.wal_append(&event).await?;
        self.directory.remove_building(&id);
        Ok(())
    }

    pub async fn add_floor(
        &self,
        id: Ulid,
        building_id: Ulid,
        number: u32,
    ) -> Result<(), EngineError> {
        if !self.directory.contains_building(&building_id) {
            return Err(EngineError::NotFound(building_id));
        }
        if self.directory.contains_floor(&id) {
            return Err(EngineError::AlreadyExists(id));
        }
        if self.directory.floor_count(&building_id) >= MAX_FLOORS_PER_BUILDING {
            return Err(EngineError::LimitExceeded("too many floors in building"));
        }

        let event = Event::FloorAdded {
            id,
            building_id,
            number,
        };
        self.wal_append(&event).await?;
        self.directory.insert_floor(Floor {
            id,
            building_id,
            number,
        });
        Ok(())
    }

    pub async fn remove_floor(&self, id: Ulid) -> Result<(), EngineError> {
        if !self.directory.contains_floor(&id) {
            return Err(EngineError::NotFound(id));
        }
        if self.directory.has_rooms(&id) {
            return Err(EngineError::HasChildren(id));
        }

        let event = Event::FloorRemoved { id };
        self.wal_append(&event).await?;
        self.directory.remove_floor(&id);
        Ok(())
    }

    pub async fn add_room(&self, room: Room) -> Result<(), EngineError> {
        if room.name.is_empty() || room.name.len() > MAX_NAME_LEN {
            return Err(EngineError::Validation("bad room name"));
        }
        if room.fixed_resources.len() > MAX_RESOURCES_LEN {
            return Err(EngineError::LimitExceeded("resources text too long"));
        }
        if self.rooms.len() >= MAX_ROOMS {
            return Err(EngineError::LimitExceeded("too many rooms"));
        }
        if self.rooms.contains_key(&room.id) {
            return Err(EngineError::AlreadyExists(room.id));
        }
        if !self.directory.contains_floor(&room.floor_id) {
            return Err(EngineError::NotFound(room.floor_id));
        }

        let event = Event::RoomAdded { room: room.clone() };
        self.wal_append(&event).await?;
        self.directory.place_room(room.id, room.floor_id);
        self.rooms
            .insert(room.id, Arc::new(RwLock::new(RoomState::new(room))));
        Ok(())
    }

    pub async fn remove_room(&self, id: Ulid) -> Result<(), EngineError> {
        let rs = self.get_room(&id).ok_or(EngineError::NotFound(id))?;
        let guard = rs.read().await;
        let floor_id = guard.room.floor_id;
        let booking_ids: Vec<Ulid> = guard.bookings.iter().map(|b| b.id).collect();
        drop(guard);

        let event = Event::RoomRemoved { id };
        self.wal_append(&event).await?;
        self.rooms.remove(&id);
        self.directory.unplace_room(&id, &floor_id);
        for bid in booking_ids {
            self.booking_to_room.remove(&bid);
        }
        Ok(())
    }

    // ── Booking arbitration & lifecycle ──────────────────────

    /// Create a booking for `user_id` in `room_id`. The overlap query, the
    /// arbiter's decision and the commit all happen under one room write
    /// lock: a rejected request mutates nothing, an accepted one overrides
    /// every superseded booking and inserts the new one before the lock is
    /// released, so the non-overlap invariant holds at every release point.
    pub async fn create_booking(
        &self,
        id: Ulid,
        user_id: Ulid,
        room_id: Ulid,
        start: Ms,
        end: Ms,
        purpose: String,
        resources: String,
    ) -> Result<Booking, EngineError> {
        let span = validate_window(start, end)?;
        if purpose.len() > MAX_PURPOSE_LEN {
            return Err(EngineError::LimitExceeded("purpose too long"));
        }
        if resources.len() > MAX_RESOURCES_LEN {
            return Err(EngineError::LimitExceeded("resources text too long"));
        }
        if self.booking_to_room.contains_key(&id) {
            return Err(EngineError::AlreadyExists(id));
        }

        let user = self.directory.get_user(&user_id)?;
        let requester = user.role.class();

        let rs = self
            .get_room(&room_id)
            .ok_or(EngineError::NotFound(room_id))?;
        let mut guard = rs.write().await;
        if guard.bookings.len() >= MAX_BOOKINGS_PER_ROOM {
            return Err(EngineError::LimitExceeded("too many bookings on room"));
        }

        // Phase 1: classify every overlap before touching anything.
        let mut overlaps = Vec::new();
        for b in find_active_overlaps(&guard, &span) {
            let owner = self.directory.get_user(&b.user_id)?;
            overlaps.push(Overlap {
                booking_id: b.id,
                owner: owner.role.class(),
            });
        }

        let to_override = match decide(requester, &overlaps) {
            Decision::Reject { reason } => {
                metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                tracing::debug!(
                    "booking {id} rejected for {} in room {room_id}: {}",
                    requester.as_str(),
                    reason.message()
                );
                return Err(EngineError::Conflict(reason));
            }
            Decision::Accept { to_override } => to_override,
        };

        // Phase 2: commit the whole decision.
        for bid in &to_override {
            let event = Event::BookingOverridden {
                id: *bid,
                room_id,
            };
            self.persist_and_apply(&mut guard, &event).await?;
            metrics::counter!(crate::observability::BOOKINGS_OVERRIDDEN_TOTAL).increment(1);
            tracing::info!(
                "booking {bid} in room {room_id} overridden by {} request {id}",
                requester.as_str()
            );
        }

        let status = lifecycle::initial_status(requester);
        let event = Event::BookingRequested {
            id,
            room_id,
            user_id,
            span,
            purpose,
            resources,
            status,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);

        Ok(guard
            .booking(id)
            .cloned()
            .expect("booking just inserted under this lock"))
    }

    /// Cancel a booking. Only the requester who created it may cancel; the
    /// ownership check runs under the room's write lock, in the same
    /// critical section as the status write.
    pub async fn cancel_booking(&self, id: Ulid, caller: Ulid) -> Result<Booking, EngineError> {
        let (room_id, mut guard) = self.resolve_booking_write(&id).await?;
        let booking = guard.booking(id).ok_or(EngineError::NotFound(id))?;
        lifecycle::cancel(booking, caller)?;

        let event = Event::BookingCancelled { id, room_id };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(guard.booking(id).cloned().expect("booking present"))
    }

    /// Approve a pending booking. Caller role is not verified here — the
    /// surrounding layer decides who may approve.
    pub async fn approve_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        let (room_id, mut guard) = self.resolve_booking_write(&id).await?;
        let booking = guard.booking(id).ok_or(EngineError::NotFound(id))?;
        lifecycle::approve(booking)?;

        let event = Event::BookingApproved { id, room_id };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(guard.booking(id).cloned().expect("booking present"))
    }

    /// Reject a pending booking. Same caller-role caveat as approval.
    pub async fn reject_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        let (room_id, mut guard) = self.resolve_booking_write(&id).await?;
        let booking = guard.booking(id).ok_or(EngineError::NotFound(id))?;
        lifecycle::reject(booking)?;

        let event = Event::BookingRejected { id, room_id };
        self.persist_and_apply(&mut guard, &event).await?;
        Ok(guard.booking(id).cloned().expect("booking present"))
    }

    // ── WAL maintenance ──────────────────────────────────────

    /// Compact the WAL by rewriting it with only the events needed to
    /// recreate the current state. Terminal bookings are part of that state
    /// (bookings are never deleted) and survive compaction.
    pub async fn compact_wal(&self) -> Result<(), EngineError> {
        let mut events = Vec::new();

        for user in self.directory.users_snapshot() {
            events.push(Event::UserRegistered { user });
        }
        for building in self.directory.buildings_snapshot() {
            events.push(Event::BuildingAdded {
                id: building.id,
                name: building.name,
            });
        }
        for floor in self.directory.floors_snapshot() {
            events.push(Event::FloorAdded {
                id: floor.id,
                building_id: floor.building_id,
                number: floor.number,
            });
        }

        let room_ids: Vec<Ulid> = self.rooms.iter().map(|e| *e.key()).collect();
        for id in room_ids {
            let Some(entry) = self.rooms.get(&id) else {
                continue;
            };
            let rs = entry.value().clone();
            let guard = rs.read().await;
            events.push(Event::RoomAdded {
                room: guard.room.clone(),
            });
            for b in &guard.bookings {
                events.push(Event::BookingRequested {
                    id: b.id,
                    room_id: b.room_id,
                    user_id: b.user_id,
                    span: b.span,
                    purpose: b.purpose.clone(),
                    resources: b.resources.clone(),
                    status: b.status,
                });
            }
        }

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Compact {
                events,
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }

    pub async fn wal_appends_since_compact(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceCompact { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}
