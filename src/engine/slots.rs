use crate::directory::Directory;
use crate::model::*;

use super::overlap::find_active_overlaps;

pub const HOUR_MS: Ms = 3_600_000;

/// The day grid runs 08:00–24:00, one slot per hour.
pub const DAY_START_HOUR: i64 = 8;
pub const DAY_END_HOUR: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Available,
    Booked {
        booked_by: String,
        owner_class: PriorityClass,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub span: Span,
    /// Human label, e.g. `"08:00 - 09:00"`.
    pub label: String,
    pub state: SlotState,
}

/// Project a room's day onto the fixed hourly grid. `day_start` is the
/// unix-ms timestamp of the day's midnight (one local wall-clock authority —
/// no timezone handling). Read-only: each hour slot is Available when no
/// active booking intersects it, otherwise annotated with the first
/// intersecting booking's owner. By the non-overlap invariant at most one
/// active booking covers any instant, so "first" is also "only".
pub fn build_day_view(rs: &RoomState, day_start: Ms, directory: &Directory) -> Vec<Slot> {
    let mut slots = Vec::with_capacity((DAY_END_HOUR - DAY_START_HOUR) as usize);
    for h in DAY_START_HOUR..DAY_END_HOUR {
        let span = Span::new(day_start + h * HOUR_MS, day_start + (h + 1) * HOUR_MS);
        let label = format!("{:02}:00 - {:02}:00", h, h + 1);

        let overlaps = find_active_overlaps(rs, &span);
        let state = match overlaps.first() {
            None => SlotState::Available,
            Some(b) => {
                // Requesters are never deleted, so this lookup only misses on
                // a directory that predates the booking's WAL entry.
                let (booked_by, owner_class) = match directory.get_user(&b.user_id) {
                    Ok(u) => (u.name, u.role.class()),
                    Err(_) => ("unknown".into(), PriorityClass::Student),
                };
                SlotState::Booked {
                    booked_by,
                    owner_class,
                }
            }
        };

        slots.push(Slot { span, label, state });
    }
    slots
}
