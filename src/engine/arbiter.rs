use ulid::Ulid;

use crate::model::PriorityClass;

use super::error::ConflictReason;

/// One overlapping active booking, reduced to what arbitration needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub booking_id: Ulid,
    pub owner: PriorityClass,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept { to_override: Vec<Ulid> },
    Reject { reason: ConflictReason },
}

/// Decide whether a request may take the slot, and which active bookings it
/// supersedes. Pure classification: every overlap is inspected before the
/// verdict, so a rejected request never names anything to override. The
/// caller commits the whole decision under one room lock or not at all.
///
/// - Students never override; any overlap rejects them.
/// - Faculty override student bookings, but one faculty- or admin-owned
///   overlap rejects the entire request.
/// - Admins override everything, including other admins.
pub fn decide(requester: PriorityClass, overlaps: &[Overlap]) -> Decision {
    if overlaps.is_empty() {
        return Decision::Accept {
            to_override: Vec::new(),
        };
    }

    match requester {
        PriorityClass::Student => Decision::Reject {
            reason: ConflictReason::SlotOccupied,
        },
        PriorityClass::Faculty => {
            let blocked = overlaps
                .iter()
                .any(|o| o.owner >= PriorityClass::Faculty);
            if blocked {
                Decision::Reject {
                    reason: ConflictReason::HeldByEqualOrHigher,
                }
            } else {
                Decision::Accept {
                    to_override: overlaps.iter().map(|o| o.booking_id).collect(),
                }
            }
        }
        PriorityClass::Admin => Decision::Accept {
            to_override: overlaps.iter().map(|o| o.booking_id).collect(),
        },
    }
}
