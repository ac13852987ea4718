//! Trigger identity scheme.
//!
//! Every pending reminder is addressed by a single integer derived from
//! (entity kind, boundary, entity id). The key space is split into four
//! disjoint bands, one per (kind, boundary) pair, so a key both locates a
//! registration and says what it is for. No separate bookkeeping exists:
//! the key is the identity.

use serde::{Deserialize, Serialize};

use super::channel::AlertChannel;

/// Width of one key band. Entity ids must stay below this; sqlite row ids
/// in this store never get anywhere close.
pub const BAND_WIDTH: i64 = 1_000_000_000;

/// Entity kinds that can carry reminders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerKind {
    Course,
    Assessment,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Course => "course",
            TriggerKind::Assessment => "assessment",
        }
    }
}

impl From<TriggerKind> for AlertChannel {
    fn from(kind: TriggerKind) -> Self {
        match kind {
            TriggerKind::Course => AlertChannel::Course,
            TriggerKind::Assessment => AlertChannel::Assessment,
        }
    }
}

/// Which tracked date of the entity the reminder is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Boundary {
    Start,
    End,
}

impl Boundary {
    pub fn as_str(&self) -> &'static str {
        match self {
            Boundary::Start => "start",
            Boundary::End => "end",
        }
    }
}

/// Deterministic, collision-free key for one (kind, boundary, id) triple.
///
/// Pure function; both arming and probing go through it. Bands:
/// course/start, course/end, assessment/start, assessment/end.
pub fn trigger_key(kind: TriggerKind, boundary: Boundary, id: i64) -> i64 {
    debug_assert!((0..BAND_WIDTH).contains(&id), "entity id {id} outside key band");

    let band = match (kind, boundary) {
        (TriggerKind::Course, Boundary::Start) => 1,
        (TriggerKind::Course, Boundary::End) => 2,
        (TriggerKind::Assessment, Boundary::Start) => 3,
        (TriggerKind::Assessment, Boundary::End) => 4,
    };
    band * BAND_WIDTH + id
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [TriggerKind; 2] = [TriggerKind::Course, TriggerKind::Assessment];
    const BOUNDARIES: [Boundary; 2] = [Boundary::Start, Boundary::End];

    #[test]
    fn test_keys_are_injective() {
        let mut seen = std::collections::HashSet::new();
        for kind in KINDS {
            for boundary in BOUNDARIES {
                for id in [0, 1, 7, 999, 123_456, BAND_WIDTH - 1] {
                    assert!(
                        seen.insert(trigger_key(kind, boundary, id)),
                        "duplicate key for ({kind:?}, {boundary:?}, {id})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_bands_do_not_overlap() {
        // Max key of each band is below the min key of the next.
        let max_course_start = trigger_key(TriggerKind::Course, Boundary::Start, BAND_WIDTH - 1);
        let min_course_end = trigger_key(TriggerKind::Course, Boundary::End, 0);
        assert!(max_course_start < min_course_end);

        let max_assessment_start =
            trigger_key(TriggerKind::Assessment, Boundary::Start, BAND_WIDTH - 1);
        let min_assessment_end = trigger_key(TriggerKind::Assessment, Boundary::End, 0);
        assert!(max_assessment_start < min_assessment_end);
    }

    #[test]
    fn test_key_is_band_plus_id() {
        assert_eq!(trigger_key(TriggerKind::Course, Boundary::Start, 7), BAND_WIDTH + 7);
        assert_eq!(trigger_key(TriggerKind::Assessment, Boundary::End, 7), 4 * BAND_WIDTH + 7);
    }

    #[test]
    fn test_same_triple_same_key() {
        assert_eq!(
            trigger_key(TriggerKind::Course, Boundary::End, 42),
            trigger_key(TriggerKind::Course, Boundary::End, 42)
        );
    }
}
