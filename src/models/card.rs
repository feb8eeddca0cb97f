//! A card is a <front, back> pair plus the SM-2 scheduling fields.
//! Front and back are opaque text; only the scheduling state is ever inspected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Ease factor of a freshly created card.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lowest ease factor a card can carry.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Longest interval the scheduler hands out (about a hundred years).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

/// Opaque card identifier, unique within its deck.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(pub String);

impl CardId {
    pub fn generate() -> Self {
        CardId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CardId {
    fn from(value: &str) -> Self {
        CardId(value.to_string())
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scheduling fields of a card, written back to the store after every review.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulingState {
    /// Consecutive successful recalls since the last lapse
    pub repetitions: u32,
    /// Days until the next review; 0 means "again in a few minutes"
    pub interval: u32,
    pub ease_factor: f64,
    pub next_review_date: DateTime<Utc>,
}

impl SchedulingState {
    /// State of a card that has never been reviewed; due immediately.
    pub fn new_card(now: DateTime<Utc>) -> Self {
        Self::with_ease_factor(DEFAULT_EASE_FACTOR, now)
    }

    pub fn with_ease_factor(ease_factor: f64, now: DateTime<Utc>) -> Self {
        Self {
            repetitions: 0,
            interval: 0,
            ease_factor,
            next_review_date: now,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_date <= now
    }

    /// Checks a state that came from outside the scheduler (an imported record).
    /// The ease factor must be at least [`MIN_EASE_FACTOR`], the interval at most
    /// [`MAX_INTERVAL_DAYS`], and interval 0 is only valid with zero repetitions.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.ease_factor >= MIN_EASE_FACTOR) {
            return Err(format!(
                "ease factor {} is below {}",
                self.ease_factor, MIN_EASE_FACTOR
            ));
        }
        if self.interval > MAX_INTERVAL_DAYS {
            return Err(format!(
                "interval of {} days exceeds {}",
                self.interval, MAX_INTERVAL_DAYS
            ));
        }
        if self.interval == 0 && self.repetitions > 0 {
            return Err(format!("interval 0 with {} repetitions", self.repetitions));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub front: String,
    pub back: String,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub schedule: SchedulingState,
}

impl Card {
    pub fn new(front: impl Into<String>, back: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: CardId::generate(),
            front: front.into(),
            back: back.into(),
            created_at: now,
            schedule: SchedulingState::new_card(now),
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.schedule.is_due(now)
    }

    /// A card counts as learned once it has been recalled correctly at least once
    /// since its last lapse.
    pub fn is_learned(&self) -> bool {
        self.schedule.repetitions > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_card_defaults() {
        let card = Card::new("cześć", "hello", now());

        assert_eq!(card.front, "cześć");
        assert_eq!(card.back, "hello");
        assert_eq!(card.schedule.repetitions, 0);
        assert_eq!(card.schedule.interval, 0);
        assert_eq!(card.schedule.ease_factor, 2.5);
        assert_eq!(card.schedule.next_review_date, now());
        assert!(card.is_due(now()));
        assert!(!card.is_learned());
        assert!(!card.id.as_str().is_empty());
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(CardId::generate(), CardId::generate());
    }

    #[test]
    fn test_due_boundary_is_inclusive() {
        let mut state = SchedulingState::new_card(now());
        assert!(state.is_due(now()));

        state.next_review_date = now() + Duration::seconds(1);
        assert!(!state.is_due(now()));
    }

    #[test]
    fn test_record_field_names() {
        let card = Card::new("front", "back", now());
        let value = serde_json::to_value(&card).unwrap();

        assert_eq!(value["easeFactor"], 2.5);
        assert_eq!(value["repetitions"], 0);
        assert_eq!(value["interval"], 0);
        assert!(value["nextReviewDate"].is_string());
        assert!(value.get("schedule").is_none());
    }

    #[test]
    fn test_validate_scheduling_state() {
        assert!(SchedulingState::new_card(now()).validate().is_ok());

        let mut state = SchedulingState::new_card(now());
        state.ease_factor = -1.0;
        assert!(state.validate().is_err());

        state.ease_factor = f64::NAN;
        assert!(state.validate().is_err());

        let mut state = SchedulingState::new_card(now());
        state.interval = MAX_INTERVAL_DAYS + 1;
        state.repetitions = 4;
        assert!(state.validate().is_err());

        let mut state = SchedulingState::new_card(now());
        state.repetitions = 3;
        assert!(state.validate().is_err());
    }
}
