use dashmap::DashMap;
use ulid::Ulid;

use crate::engine::EngineError;
use crate::model::{Building, Floor, User};

/// In-memory campus directory: requesters plus the building/floor inventory
/// and its child indexes. Rooms themselves live in the engine (each behind
/// its own lock); the directory only tracks where they sit.
///
/// Insertion/removal here is unchecked — callers validate before appending
/// the event to the WAL, then apply. Lookups return `NotFound` for the
/// arbitration paths that need a requester or a placement to exist.
pub struct Directory {
    users: DashMap<Ulid, User>,
    emails: DashMap<String, Ulid>,
    buildings: DashMap<Ulid, Building>,
    floors: DashMap<Ulid, Floor>,
    floors_by_building: DashMap<Ulid, Vec<Ulid>>,
    rooms_by_floor: DashMap<Ulid, Vec<Ulid>>,
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

impl Directory {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            emails: DashMap::new(),
            buildings: DashMap::new(),
            floors: DashMap::new(),
            floors_by_building: DashMap::new(),
            rooms_by_floor: DashMap::new(),
        }
    }

    // ── Users ────────────────────────────────────────────────

    pub fn get_user(&self, id: &Ulid) -> Result<User, EngineError> {
        self.users
            .get(id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(*id))
    }

    pub fn contains_user(&self, id: &Ulid) -> bool {
        self.users.contains_key(id)
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.emails.contains_key(email)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn insert_user(&self, user: User) {
        self.emails.insert(user.email.clone(), user.id);
        self.users.insert(user.id, user);
    }

    pub fn users_snapshot(&self) -> Vec<User> {
        self.users.iter().map(|e| e.value().clone()).collect()
    }

    // ── Buildings ────────────────────────────────────────────

    pub fn get_building(&self, id: &Ulid) -> Result<Building, EngineError> {
        self.buildings
            .get(id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(*id))
    }

    pub fn contains_building(&self, id: &Ulid) -> bool {
        self.buildings.contains_key(id)
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn insert_building(&self, building: Building) {
        self.buildings.insert(building.id, building);
    }

    pub fn buildings_snapshot(&self) -> Vec<Building> {
        self.buildings.iter().map(|e| e.value().clone()).collect()
    }

    pub fn remove_building(&self, id: &Ulid) {
        self.buildings.remove(id);
        self.floors_by_building.remove(id);
    }

    pub fn has_floors(&self, building_id: &Ulid) -> bool {
        self.floors_by_building
            .get(building_id)
            .is_some_and(|kids| !kids.is_empty())
    }

    // ── Floors ───────────────────────────────────────────────

    pub fn get_floor(&self, id: &Ulid) -> Result<Floor, EngineError> {
        self.floors
            .get(id)
            .map(|e| e.value().clone())
            .ok_or(EngineError::NotFound(*id))
    }

    pub fn contains_floor(&self, id: &Ulid) -> bool {
        self.floors.contains_key(id)
    }

    pub fn floor_count(&self, building_id: &Ulid) -> usize {
        self.floors_by_building
            .get(building_id)
            .map(|kids| kids.len())
            .unwrap_or(0)
    }

    pub fn floors_snapshot(&self) -> Vec<Floor> {
        self.floors.iter().map(|e| e.value().clone()).collect()
    }

    pub fn insert_floor(&self, floor: Floor) {
        self.floors_by_building
            .entry(floor.building_id)
            .or_default()
            .push(floor.id);
        self.floors.insert(floor.id, floor);
    }

    pub fn remove_floor(&self, id: &Ulid) {
        if let Some((_, floor)) = self.floors.remove(id)
            && let Some(mut kids) = self.floors_by_building.get_mut(&floor.building_id) {
                kids.retain(|f| f != id);
            }
        self.rooms_by_floor.remove(id);
    }

    pub fn has_rooms(&self, floor_id: &Ulid) -> bool {
        self.rooms_by_floor
            .get(floor_id)
            .is_some_and(|kids| !kids.is_empty())
    }

    // ── Room placement ───────────────────────────────────────

    pub fn place_room(&self, room_id: Ulid, floor_id: Ulid) {
        self.rooms_by_floor
            .entry(floor_id)
            .or_default()
            .push(room_id);
    }

    pub fn unplace_room(&self, room_id: &Ulid, floor_id: &Ulid) {
        if let Some(mut kids) = self.rooms_by_floor.get_mut(floor_id) {
            kids.retain(|r| r != room_id);
        }
    }
}
