//! SM-2 (SuperMemo 2) derived scheduling rule.
//!
//! Given a card's scheduling state and a quality rating, computes the next state:
//! - Quality 0 (lapse): repetitions and interval reset to 0, EF drops by 0.2 and the
//!   card is due again in 5 minutes
//! - Quality 1-2 (hard): repetitions reset to 0, interval 1 day, EF adjusted by the
//!   SM-2 formula
//! - Quality 3-5 (correct): interval grows 1 day → 6 days → interval × EF, then
//!   repetitions += 1, EF adjusted by the SM-2 formula
//! - EF never falls below 1.3
//! - intervals are capped at `MAX_INTERVAL_DAYS`
//!
//! The update is a pure function of `(state, quality, now)`.

use super::card::MAX_INTERVAL_DAYS;
use super::{Quality, QualityBand, SchedulingState};
use crate::config::SchedulerConfig;
use chrono::{DateTime, Duration, Utc};
use log::debug;

/// Computes the next scheduling state using the default constants.
pub fn compute_next_state(
    state: &SchedulingState,
    quality: Quality,
    now: DateTime<Utc>,
) -> SchedulingState {
    Sm2Scheduler::default().next_state(state, quality, now)
}

/// SM-2 ease adjustment: EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
fn ease_delta(quality: Quality) -> f64 {
    let miss = 5.0 - quality.value() as f64;
    0.1 - miss * (0.08 + miss * 0.02)
}

/// `interval * ease_factor` rounded, kept within `1..=MAX_INTERVAL_DAYS` so a
/// correct recall never lands on the relearn sentinel.
fn grown_interval(interval: u32, ease_factor: f64) -> u32 {
    (interval as f64 * ease_factor)
        .round()
        .max(1.0)
        .min(MAX_INTERVAL_DAYS as f64) as u32
}

/// `now + delta`, saturating at the end of chrono's range.
fn saturating_add(now: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
    now.checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[derive(Clone, Debug, Default)]
pub struct Sm2Scheduler {
    config: SchedulerConfig,
}

impl Sm2Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Scheduling state for a newly added card: due immediately.
    pub fn new_card_state(&self, now: DateTime<Utc>) -> SchedulingState {
        SchedulingState::with_ease_factor(self.config.initial_ease_factor, now)
    }

    pub fn next_state(
        &self,
        state: &SchedulingState,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> SchedulingState {
        let mut repetitions = state.repetitions;
        let mut interval = state.interval;
        let mut ease_factor = state.ease_factor;

        match quality.band() {
            QualityBand::Lapse => {
                repetitions = 0;
                interval = 0;
                ease_factor -= self.config.lapse_penalty;
            }
            QualityBand::Hard => {
                repetitions = 0;
                interval = self.config.hard_interval_days;
            }
            QualityBand::Correct => {
                interval = match repetitions {
                    0 => self.config.first_interval_days,
                    1 => self.config.second_interval_days,
                    // uses the ease factor from before this review
                    _ => grown_interval(interval, ease_factor),
                };
                repetitions += 1;
            }
        }

        let interval = interval.min(MAX_INTERVAL_DAYS);

        if quality.value() > 0 {
            ease_factor += ease_delta(quality);
        }
        if ease_factor < self.config.min_ease_factor {
            ease_factor = self.config.min_ease_factor;
        }

        let next_review_date = if interval == 0 {
            saturating_add(now, Duration::minutes(self.config.relearn_delay_minutes))
        } else {
            saturating_add(now, Duration::days(interval as i64))
        };

        debug!(
            "quality {}: repetitions={}, interval={}, ease_factor={:.3}, next_review_date={}",
            quality,
            repetitions,
            interval,
            ease_factor,
            next_review_date.to_rfc3339()
        );

        SchedulingState {
            repetitions,
            interval,
            ease_factor,
            next_review_date,
        }
    }

    /// Interval each rating 0..=5 would produce, in rating order.
    /// Shown under the rating buttons.
    pub fn preview_intervals(&self, state: &SchedulingState, now: DateTime<Utc>) -> [u32; 6] {
        let mut intervals = [0; 6];
        for quality in Quality::all() {
            intervals[quality.value() as usize] = self.next_state(state, quality, now).interval;
        }
        intervals
    }

    /// Short human-readable form of an interval ("5m", "1d", "2w", "3mo", "1y").
    pub fn format_interval(&self, days: u32) -> String {
        match days {
            0 => format!("{}m", self.config.relearn_delay_minutes),
            1..=6 => format!("{}d", days),
            7..=29 => format!("{}w", days / 7),
            30..=364 => format!("{}mo", days / 30),
            _ => format!("{}y", days / 365),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EPSILON: f64 = 1e-9;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    fn state(repetitions: u32, interval: u32, ease_factor: f64) -> SchedulingState {
        SchedulingState {
            repetitions,
            interval,
            ease_factor,
            next_review_date: now(),
        }
    }

    fn q(value: i64) -> Quality {
        Quality::new(value).unwrap()
    }

    #[test]
    fn test_first_review_perfect() {
        let next = compute_next_state(&state(0, 0, 2.5), Quality::PERFECT, now());

        assert_eq!(next.repetitions, 1);
        assert_eq!(next.interval, 1);
        assert!((next.ease_factor - 2.6).abs() < EPSILON);
        assert_eq!(next.next_review_date, now() + Duration::days(1));
    }

    #[test]
    fn test_second_review_perfect() {
        let next = compute_next_state(&state(1, 1, 2.6), q(5), now());

        assert_eq!(next.repetitions, 2);
        assert_eq!(next.interval, 6);
        assert_eq!(next.next_review_date, now() + Duration::days(6));
    }

    #[test]
    fn test_subsequent_review_multiplies_by_old_ease() {
        // 6 * 2.6 = 15.6 -> 16, even though quality 3 lowers EF afterwards
        let next = compute_next_state(&state(2, 6, 2.6), q(3), now());

        assert_eq!(next.repetitions, 3);
        assert_eq!(next.interval, 16);
        assert!((next.ease_factor - 2.46).abs() < EPSILON);
    }

    #[test]
    fn test_lapse_resets_and_penalizes() {
        let next = compute_next_state(&state(2, 6, 2.6), q(0), now());

        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval, 0);
        assert!((next.ease_factor - 2.4).abs() < EPSILON);
        assert_eq!(next.next_review_date, now() + Duration::minutes(5));
    }

    #[test]
    fn test_hard_resets_without_lapse_penalty() {
        // quality 2: delta = 0.1 - 3 * (0.08 + 3 * 0.02) = -0.32
        let next = compute_next_state(&state(4, 30, 2.5), q(2), now());

        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval, 1);
        assert!((next.ease_factor - 2.18).abs() < EPSILON);
        assert_eq!(next.next_review_date, now() + Duration::days(1));
    }

    #[test]
    fn test_quality_one_adjusts_ease_but_not_by_lapse_penalty() {
        // quality 1: delta = 0.1 - 4 * (0.08 + 4 * 0.02) = -0.54
        let next = compute_next_state(&state(0, 0, 2.5), q(1), now());
        assert!((next.ease_factor - 1.96).abs() < EPSILON);
    }

    #[test]
    fn test_ease_floor() {
        let next = compute_next_state(&state(3, 10, 1.3), q(0), now());
        assert_eq!(next.ease_factor, 1.3);

        let next = compute_next_state(&state(3, 10, 1.4), q(1), now());
        assert_eq!(next.ease_factor, 1.3);
    }

    #[test]
    fn test_ease_floor_holds_for_every_quality_and_state() {
        let eases = [1.3, 1.35, 1.5, 2.0, 2.5, 2.9, 3.5];
        for repetitions in 0..5 {
            for interval in [0, 1, 6, 15, 120] {
                for ease in eases {
                    for quality in Quality::all() {
                        let next =
                            compute_next_state(&state(repetitions, interval, ease), quality, now());
                        assert!(
                            next.ease_factor >= 1.3,
                            "ease {} after quality {} from ({}, {}, {})",
                            next.ease_factor,
                            quality,
                            repetitions,
                            interval,
                            ease
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_band_shapes_hold_for_every_state() {
        for repetitions in 0..6 {
            for interval in [0, 1, 6, 15, 40] {
                for ease in [1.3, 1.9, 2.5, 2.8] {
                    let before = state(repetitions, interval, ease);

                    let lapse = compute_next_state(&before, q(0), now());
                    assert_eq!(lapse.repetitions, 0);
                    assert_eq!(lapse.interval, 0);
                    assert!(lapse.next_review_date <= now() + Duration::minutes(5));

                    for hard in [q(1), q(2)] {
                        let next = compute_next_state(&before, hard, now());
                        assert_eq!(next.repetitions, 0);
                        assert_eq!(next.interval, 1);
                    }

                    for good in [q(3), q(4), q(5)] {
                        let next = compute_next_state(&before, good, now());
                        let expected = match repetitions {
                            0 => 1,
                            1 => 6,
                            _ => ((interval as f64 * ease).round() as u32).max(1),
                        };
                        assert_eq!(next.interval, expected);
                        assert_eq!(next.repetitions, repetitions + 1);
                    }
                }
            }
        }
    }

    #[test]
    fn test_huge_interval_is_capped() {
        let next = compute_next_state(&state(5, 100_000_000, 2.5), Quality::PERFECT, now());

        assert_eq!(next.repetitions, 6);
        assert_eq!(next.interval, MAX_INTERVAL_DAYS);
        assert_eq!(
            next.next_review_date,
            now() + Duration::days(MAX_INTERVAL_DAYS as i64)
        );
    }

    #[test]
    fn test_date_saturates_at_end_of_range() {
        let late = DateTime::<Utc>::MAX_UTC - Duration::days(3);
        let next = compute_next_state(&state(2, 6, 2.5), q(4), late);

        assert_eq!(next.interval, 15);
        assert_eq!(next.next_review_date, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_correct_recall_never_returns_relearn_interval() {
        // ease below the floor only arrives from an unchecked record
        let next = compute_next_state(&state(3, 10, -1.0), Quality::PERFECT, now());

        assert_eq!(next.interval, 1);
        assert_eq!(next.repetitions, 4);
        assert_eq!(next.ease_factor, 1.3);
        assert_eq!(next.next_review_date, now() + Duration::days(1));
    }

    #[test]
    fn test_deterministic() {
        let before = state(3, 15, 2.2);
        for quality in Quality::all() {
            assert_eq!(
                compute_next_state(&before, quality, now()),
                compute_next_state(&before, quality, now())
            );
        }
    }

    #[test]
    fn test_custom_config() {
        let scheduler = Sm2Scheduler::new(SchedulerConfig {
            second_interval_days: 3,
            relearn_delay_minutes: 10,
            ..SchedulerConfig::default()
        });

        let next = scheduler.next_state(&state(1, 1, 2.5), q(4), now());
        assert_eq!(next.interval, 3);

        let lapse = scheduler.next_state(&state(1, 1, 2.5), q(0), now());
        assert_eq!(lapse.next_review_date, now() + Duration::minutes(10));
    }

    #[test]
    fn test_new_card_state_uses_config() {
        let scheduler = Sm2Scheduler::new(SchedulerConfig {
            initial_ease_factor: 2.3,
            ..SchedulerConfig::default()
        });
        let fresh = scheduler.new_card_state(now());
        assert_eq!(fresh.ease_factor, 2.3);
        assert!(fresh.is_due(now()));
    }

    #[test]
    fn test_preview_intervals() {
        let scheduler = Sm2Scheduler::default();
        assert_eq!(
            scheduler.preview_intervals(&state(2, 6, 2.5), now()),
            [0, 1, 1, 15, 15, 15]
        );
    }

    #[test]
    fn test_format_interval() {
        let scheduler = Sm2Scheduler::default();
        assert_eq!(scheduler.format_interval(0), "5m");
        assert_eq!(scheduler.format_interval(1), "1d");
        assert_eq!(scheduler.format_interval(6), "6d");
        assert_eq!(scheduler.format_interval(15), "2w");
        assert_eq!(scheduler.format_interval(45), "1mo");
        assert_eq!(scheduler.format_interval(800), "2y");
    }
}
