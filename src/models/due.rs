//! Due-card queries: which cards are due, in what order, and how to describe a
//! card's next review date relative to the reviewer's calendar day.

use super::Card;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// Cards whose next review date is at or before `now`, oldest-due first.
/// Ties are broken by card id so the same input always gives the same queue.
pub fn select_due_cards(cards: &[Card], now: DateTime<Utc>) -> Vec<Card> {
    let mut due: Vec<Card> = cards.iter().filter(|card| card.is_due(now)).cloned().collect();
    due.sort_by(|a, b| {
        a.schedule
            .next_review_date
            .cmp(&b.schedule.next_review_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    due
}

pub fn count_due(cards: &[Card], now: DateTime<Utc>) -> usize {
    cards.iter().filter(|card| card.is_due(now)).count()
}

/// Number of cards with at least one correct recall since their last lapse.
pub fn count_learned(cards: &[Card]) -> usize {
    cards.iter().filter(|card| card.is_learned()).count()
}

/// Card counts shown on the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeckProgress {
    pub total: usize,
    pub due: usize,
    pub learned: usize,
}

impl DeckProgress {
    pub fn of(cards: &[Card], now: DateTime<Utc>) -> Self {
        Self {
            total: cards.len(),
            due: count_due(cards, now),
            learned: count_learned(cards),
        }
    }

    /// Sums counts across decks.
    pub fn merge(self, other: DeckProgress) -> Self {
        Self {
            total: self.total + other.total,
            due: self.due + other.due,
            learned: self.learned + other.learned,
        }
    }
}

/// Where a card's next review falls relative to the reviewer's current day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DueStatus {
    DueNow,
    /// Later today, not yet due
    Today,
    Tomorrow,
    Future(NaiveDate),
}

impl DueStatus {
    pub fn label(&self) -> String {
        match self {
            DueStatus::DueNow => "Due Now".to_string(),
            DueStatus::Today => "Today".to_string(),
            DueStatus::Tomorrow => "Tomorrow".to_string(),
            DueStatus::Future(date) => date.format("%b %-d, %Y").to_string(),
        }
    }
}

/// Classifies `next_review_date` against `now`.
///
/// Due-ness uses the same `<=` comparison as [`select_due_cards`]. Day boundaries
/// are calendar days in `now`'s time zone, so a card due at 00:30 tomorrow is
/// "Tomorrow" even when that is only an hour away.
pub fn classify_due<Tz: TimeZone>(next_review_date: DateTime<Utc>, now: DateTime<Tz>) -> DueStatus {
    if next_review_date <= now.with_timezone(&Utc) {
        return DueStatus::DueNow;
    }

    let today = now.date_naive();
    let review_day = next_review_date.with_timezone(&now.timezone()).date_naive();

    if review_day == today {
        DueStatus::Today
    } else if Some(review_day) == today.succ_opt() {
        DueStatus::Tomorrow
    } else {
        DueStatus::Future(review_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CardId, SchedulingState};
    use chrono::{Duration, FixedOffset};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn card(id: &str, next_review_date: DateTime<Utc>, repetitions: u32) -> Card {
        Card {
            id: CardId::from(id),
            front: format!("front {id}"),
            back: format!("back {id}"),
            created_at: now() - Duration::days(30),
            schedule: SchedulingState {
                repetitions,
                interval: repetitions,
                ease_factor: 2.5,
                next_review_date,
            },
        }
    }

    fn ids(cards: &[Card]) -> Vec<&str> {
        cards.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_selects_due_oldest_first() {
        let cards = vec![
            card("a", now() - Duration::hours(1), 1),
            card("b", now() + Duration::days(2), 2),
            card("c", now() - Duration::days(3), 0),
        ];

        let due = select_due_cards(&cards, now());
        assert_eq!(ids(&due), vec!["c", "a"]);
    }

    #[test]
    fn test_due_exactly_now_is_selected() {
        let cards = vec![card("a", now(), 0)];
        assert_eq!(select_due_cards(&cards, now()).len(), 1);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let at = now() - Duration::minutes(10);
        let cards = vec![card("z", at, 0), card("m", at, 0), card("a", at, 0)];

        assert_eq!(ids(&select_due_cards(&cards, now())), vec!["a", "m", "z"]);
    }

    #[test]
    fn test_selection_is_idempotent_and_sorted() {
        let cards: Vec<Card> = (0..40)
            .map(|i| {
                let offset = Duration::minutes((i * 37 % 23) as i64 - 11);
                card(&format!("card-{i:02}"), now() + offset, 0)
            })
            .collect();

        let first = select_due_cards(&cards, now());
        let second = select_due_cards(&cards, now());
        assert_eq!(first, second);
        assert!(!first.is_empty());
        assert!(first.windows(2).all(|w| {
            w[0].schedule.next_review_date <= w[1].schedule.next_review_date
        }));
        assert!(first.iter().all(|c| c.is_due(now())));
        assert_eq!(first.len(), count_due(&cards, now()));
    }

    #[test]
    fn test_empty_deck() {
        assert!(select_due_cards(&[], now()).is_empty());
        assert_eq!(DeckProgress::of(&[], now()), DeckProgress::default());
    }

    #[test]
    fn test_progress_counts() {
        let cards = vec![
            card("a", now() - Duration::hours(1), 0),
            card("b", now() + Duration::days(2), 2),
            card("c", now() - Duration::days(3), 1),
        ];

        let progress = DeckProgress::of(&cards, now());
        assert_eq!(
            progress,
            DeckProgress {
                total: 3,
                due: 2,
                learned: 2
            }
        );

        let overall = progress.merge(DeckProgress {
            total: 4,
            due: 1,
            learned: 0,
        });
        assert_eq!(overall.total, 7);
        assert_eq!(overall.due, 3);
        assert_eq!(overall.learned, 2);
    }

    #[test]
    fn test_classify_due_now() {
        assert_eq!(classify_due(now(), now()), DueStatus::DueNow);
        assert_eq!(
            classify_due(now() - Duration::days(4), now()),
            DueStatus::DueNow
        );
    }

    #[test]
    fn test_classify_later_today_tomorrow_and_future() {
        assert_eq!(
            classify_due(now() + Duration::minutes(5), now()),
            DueStatus::Today
        );
        assert_eq!(
            classify_due(now() + Duration::hours(13), now()),
            DueStatus::Tomorrow
        );
        let in_six_days = now() + Duration::days(6);
        assert_eq!(
            classify_due(in_six_days, now()),
            DueStatus::Future(in_six_days.date_naive())
        );
    }

    #[test]
    fn test_classify_uses_calendar_days_not_rolling_window() {
        let late_evening = Utc.with_ymd_and_hms(2026, 10, 19, 23, 30, 0).unwrap();

        // 1 hour away but past midnight
        assert_eq!(
            classify_due(late_evening + Duration::hours(1), late_evening),
            DueStatus::Tomorrow
        );
        // 25 hours away is the day after tomorrow
        assert_eq!(
            classify_due(late_evening + Duration::hours(25), late_evening),
            DueStatus::Future(NaiveDate::from_ymd_opt(2026, 10, 21).unwrap())
        );
    }

    #[test]
    fn test_classify_in_local_time_zone() {
        // 12:00 UTC is 21:00 in UTC+9; 16:00 UTC is already the next local day
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let local_now = now().with_timezone(&tokyo);

        assert_eq!(
            classify_due(now() + Duration::hours(4), local_now),
            DueStatus::Tomorrow
        );
        assert_eq!(
            classify_due(now() + Duration::hours(4), now()),
            DueStatus::Today
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(DueStatus::DueNow.label(), "Due Now");
        assert_eq!(DueStatus::Today.label(), "Today");
        assert_eq!(DueStatus::Tomorrow.label(), "Tomorrow");
        let date = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        assert_eq!(DueStatus::Future(date).label(), "Nov 2, 2026");
    }
}
