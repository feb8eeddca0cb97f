//! JSON import/export of decks.
//! Cards are written as plain records with their scheduling fields
//! (`repetitions`, `interval`, `easeFactor`, `nextReviewDate`), so an imported
//! deck resumes its review schedule. Imported records must satisfy the
//! scheduling invariants checked by `SchedulingState::validate`.

use crate::error::ExportError;
use crate::models::Deck;
use log::info;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes a deck to a pretty-printed JSON file.
pub fn export_deck(deck: &Deck, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, deck)?;
    writer.flush()?;
    info!("deck '{}' exported to {}", deck.name, path.display());
    Ok(())
}

/// Reads a deck from a JSON file.
pub fn import_deck(path: impl AsRef<Path>) -> Result<Deck, ExportError> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let deck: Deck = serde_json::from_reader(reader)?;
    for card in &deck.cards {
        card.schedule
            .validate()
            .map_err(|reason| ExportError::Invalid {
                card_id: card.id.clone(),
                reason,
            })?;
    }
    info!("deck '{}' imported from {}", deck.name, path.display());
    Ok(deck)
}
