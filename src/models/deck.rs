//! Deck is a named set of cards
use super::Card;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeckId(pub String);

impl DeckId {
    pub fn generate() -> Self {
        DeckId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeckId {
    fn from(value: &str) -> Self {
        DeckId(value.to_string())
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Deck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: DeckId::generate(),
            name: name.into(),
            cards: Vec::new(),
        }
    }
}

/// Deck name and card count, as listed by a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeckSummary {
    pub id: DeckId,
    pub name: String,
    pub card_count: usize,
}
