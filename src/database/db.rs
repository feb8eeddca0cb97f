//! SQLite card store
//!
//! Handles database initialization, deck and card records, the scheduling
//! fields written after each review, and the simulated review clock.
//! Timestamps are stored as Unix milliseconds; `add_card` truncates `now` to
//! that precision so the returned card matches what is read back.

use super::store::CardStore;
use crate::error::{StoreError, StoreResult};
use crate::models::{Card, CardId, Deck, DeckId, DeckSummary, SchedulingState};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, TimeZone, Utc};
use log::info;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

const CLOCK_OFFSET_KEY: &str = "clock_offset_days";

#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        info!("opened card database at {}", path.as_ref().display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    /// Creates tables for decks, cards and app state if they do not exist.
    fn init(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS decks (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS cards (
                id TEXT NOT NULL,
                deck_id TEXT NOT NULL,
                front TEXT NOT NULL,
                back TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                repetitions INTEGER NOT NULL DEFAULT 0,
                interval_days INTEGER NOT NULL DEFAULT 0,
                ease_factor REAL NOT NULL DEFAULT 2.5,
                next_review_date INTEGER NOT NULL,
                PRIMARY KEY (deck_id, id),
                FOREIGN KEY (deck_id) REFERENCES decks(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS app_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;

        conn.execute(
            "INSERT OR IGNORE INTO app_state (key, value) VALUES (?1, '0')",
            params![CLOCK_OFFSET_KEY],
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database connection lock poisoned".to_string()))
    }

    /// Days the simulated review clock runs ahead of the wall clock.
    pub fn clock_offset_days(&self) -> StoreResult<i64> {
        read_clock_offset(&*self.lock()?)
    }

    /// Moves the simulated review clock forward by 24 hours.
    pub fn advance_day(&self) -> StoreResult<i64> {
        let conn = self.lock()?;
        let offset = read_clock_offset(&conn)?
            .checked_add(1)
            .ok_or_else(|| StoreError::Unavailable("review clock offset overflow".to_string()))?;
        conn.execute(
            "UPDATE app_state SET value = ?1 WHERE key = ?2",
            params![offset.to_string(), CLOCK_OFFSET_KEY],
        )?;
        info!("review clock advanced to +{} days", offset);
        Ok(offset)
    }

    /// `wall_clock` shifted by the simulated clock offset.
    pub fn review_time(&self, wall_clock: DateTime<Utc>) -> StoreResult<DateTime<Utc>> {
        let offset = self.clock_offset_days()?;
        Duration::try_days(offset)
            .and_then(|delta| wall_clock.checked_add_signed(delta))
            .ok_or_else(|| {
                StoreError::Unavailable(format!("review clock offset {} is out of range", offset))
            })
    }

    pub fn create_deck(&self, name: &str) -> StoreResult<DeckId> {
        let deck = Deck::new(name);
        self.insert_deck(&deck)?;
        Ok(deck.id)
    }

    /// Inserts a deck together with its cards, keeping their scheduling state.
    pub fn insert_deck(&self, deck: &Deck) -> StoreResult<()> {
        for card in &deck.cards {
            check_record(card)?;
        }
        let mut conn = self.lock()?;
        let exists = conn
            .query_row(
                "SELECT 1 FROM decks WHERE name = ?1",
                params![deck.name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if exists {
            return Err(StoreError::DuplicateDeck(deck.name.clone()));
        }

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO decks (id, name) VALUES (?1, ?2)",
            params![deck.id.as_str(), deck.name],
        )?;
        for card in &deck.cards {
            insert_card_row(&tx, &deck.id, card)?;
        }
        tx.commit()?;

        info!("deck '{}' stored with {} cards", deck.name, deck.cards.len());
        Ok(())
    }

    pub fn insert_card(&self, deck_id: &DeckId, card: &Card) -> StoreResult<()> {
        check_record(card)?;
        let conn = self.lock()?;
        ensure_deck(&conn, deck_id)?;
        insert_card_row(&conn, deck_id, card)?;
        Ok(())
    }

    /// Adds a new card with default scheduling fields; it is due immediately.
    /// `now` is truncated to whole milliseconds, the stored precision.
    pub fn add_card(
        &self,
        deck_id: &DeckId,
        front: &str,
        back: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Card> {
        let card = Card::new(front, back, now.trunc_subsecs(3));
        self.insert_card(deck_id, &card)?;
        Ok(card)
    }

    pub fn load_deck(&self, deck_id: &DeckId) -> StoreResult<Deck> {
        let conn = self.lock()?;
        let name: String = conn
            .query_row(
                "SELECT name FROM decks WHERE id = ?1",
                params![deck_id.as_str()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| StoreError::DeckNotFound(deck_id.clone()))?;

        Ok(Deck {
            id: deck_id.clone(),
            name,
            cards: select_cards(&conn, deck_id)?,
        })
    }

    fn write_state(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        state: &SchedulingState,
    ) -> StoreResult<()> {
        let conn = self.lock()?;
        let updated = conn.execute(
            "UPDATE cards
             SET repetitions = ?1, interval_days = ?2, ease_factor = ?3, next_review_date = ?4
             WHERE deck_id = ?5 AND id = ?6",
            params![
                state.repetitions,
                state.interval,
                state.ease_factor,
                state.next_review_date.timestamp_millis(),
                deck_id.as_str(),
                card_id.as_str()
            ],
        )?;

        if updated == 0 {
            return Err(StoreError::CardNotFound {
                deck_id: deck_id.clone(),
                card_id: card_id.clone(),
            });
        }
        Ok(())
    }

    fn read_cards(&self, deck_id: &DeckId) -> StoreResult<Vec<Card>> {
        let conn = self.lock()?;
        ensure_deck(&conn, deck_id)?;
        select_cards(&conn, deck_id)
    }

    fn read_summaries(&self) -> StoreResult<Vec<DeckSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT d.id, d.name, COUNT(c.id)
             FROM decks d
             LEFT JOIN cards c ON c.deck_id = d.id
             GROUP BY d.id, d.name
             ORDER BY d.name ASC",
        )?;

        let summaries = stmt
            .query_map([], |row| {
                Ok(DeckSummary {
                    id: DeckId(row.get(0)?),
                    name: row.get(1)?,
                    card_count: row.get::<_, i64>(2)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(summaries)
    }
}

fn read_clock_offset(conn: &Connection) -> StoreResult<i64> {
    let value: String = conn.query_row(
        "SELECT value FROM app_state WHERE key = ?1",
        params![CLOCK_OFFSET_KEY],
        |row| row.get(0),
    )?;
    value.parse().map_err(|e| {
        StoreError::Unavailable(format!("corrupt review clock offset '{}': {}", value, e))
    })
}

fn check_record(card: &Card) -> StoreResult<()> {
    card.schedule
        .validate()
        .map_err(|reason| StoreError::InvalidRecord {
            card_id: card.id.clone(),
            reason,
        })
}

fn ensure_deck(conn: &Connection, deck_id: &DeckId) -> StoreResult<()> {
    conn.query_row(
        "SELECT 1 FROM decks WHERE id = ?1",
        params![deck_id.as_str()],
        |_| Ok(()),
    )
    .optional()?
    .ok_or_else(|| StoreError::DeckNotFound(deck_id.clone()))
}

fn insert_card_row(conn: &Connection, deck_id: &DeckId, card: &Card) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO cards (id, deck_id, front, back, created_at, repetitions, interval_days, ease_factor, next_review_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            card.id.as_str(),
            deck_id.as_str(),
            card.front,
            card.back,
            card.created_at.timestamp_millis(),
            card.schedule.repetitions,
            card.schedule.interval,
            card.schedule.ease_factor,
            card.schedule.next_review_date.timestamp_millis()
        ],
    )?;
    Ok(())
}

fn select_cards(conn: &Connection, deck_id: &DeckId) -> StoreResult<Vec<Card>> {
    let mut stmt = conn.prepare(
        "SELECT id, front, back, created_at, repetitions, interval_days, ease_factor, next_review_date
         FROM cards
         WHERE deck_id = ?1",
    )?;

    let cards = stmt
        .query_map(params![deck_id.as_str()], card_from_row)?
        .collect::<Result<Vec<Card>, _>>()?;
    Ok(cards)
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: CardId(row.get(0)?),
        front: row.get(1)?,
        back: row.get(2)?,
        created_at: timestamp(row, 3)?,
        schedule: SchedulingState {
            repetitions: row.get(4)?,
            interval: row.get(5)?,
            ease_factor: row.get(6)?,
            next_review_date: timestamp(row, 7)?,
        },
    })
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let millis: i64 = row.get(idx)?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

#[async_trait]
impl CardStore for SqliteStore {
    async fn persist_card_state(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        state: &SchedulingState,
    ) -> StoreResult<()> {
        self.write_state(deck_id, card_id, state)
    }

    async fn load_cards(&self, deck_id: &DeckId) -> StoreResult<Vec<Card>> {
        self.read_cards(deck_id)
    }

    async fn list_decks(&self) -> StoreResult<Vec<DeckSummary>> {
        self.read_summaries()
    }
}
