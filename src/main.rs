mod app;

use app::MyApp;
use chrono::Utc;
use log::info;
use spaced_review::config::AppConfig;
use spaced_review::database::{CardStore, SqliteStore};
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log_filter.as_str()),
    )
    .init();

    let runtime = tokio::runtime::Runtime::new()?;
    let store = SqliteStore::open(&config.database_path)?;

    if runtime.block_on(store.list_decks())?.is_empty() {
        let now = Utc::now();
        let deck_id = store.create_deck("Polish Vocabulary")?;
        store.add_card(&deck_id, "cześć", "hello", now)?;
        store.add_card(&deck_id, "dziękuję", "thank you", now)?;
        store.add_card(&deck_id, "proszę", "please", now)?;
        info!("sample deck created");
    }

    let decks = runtime.block_on(store.list_decks())?;
    info!("loaded {} decks from database", decks.len());
    for deck in &decks {
        info!("  - {} ({} cards)", deck.name, deck.card_count);
    }

    let app = MyApp::new(runtime, Arc::new(store), config.scheduler)?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([520.0, 720.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flashcards App",
        options,
        Box::new(|_cc| Ok(Box::new(app))),
    )?;
    Ok(())
}
