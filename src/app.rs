//! Main application UI.
//! Deck overview with due/learned counts, card entry, and the review screen that
//! drives a `ReviewSessionManager` one card at a time.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use log::{error, warn};
use spaced_review::config::SchedulerConfig;
use spaced_review::database::{CardStore, SqliteStore};
use spaced_review::export::json::{export_deck, import_deck};
use spaced_review::models::{
    Card, DeckId, DeckProgress, DeckSummary, Quality, ReviewOutcome, ReviewSessionManager,
    SessionEnd, Sm2Scheduler, StartOutcome, classify_due,
};
use spaced_review::{ReviewError, StoreError};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// Application screen states
#[derive(Default, PartialEq)]
enum AppScreen {
    #[default]
    Main,
    Review,
}

struct DeckRow {
    summary: DeckSummary,
    progress: DeckProgress,
}

pub struct MyApp {
    runtime: Runtime,
    store: Arc<SqliteStore>,
    session: ReviewSessionManager<SqliteStore>,

    decks: Vec<DeckRow>,
    overall: DeckProgress,
    selected_deck: Option<DeckId>,
    selected_cards: Vec<Card>,
    reviewing_deck_name: String,

    current_screen: AppScreen,
    show_answer: bool,
    review_error: Option<String>,

    new_deck_name: String,
    current_front: String,
    current_back: String,

    show_export_dialog: bool,
    show_message_dialog: bool,
    message: String,
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Main => self.render_main_screen(ctx),
            AppScreen::Review => self.render_review_screen(ctx),
        }

        if self.show_export_dialog {
            let mut export_deck_id: Option<DeckId> = None;
            let mut should_cancel = false;

            egui::Window::new("Export Deck")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label("Select a deck to export:");
                    ui.separator();
                    for row in &self.decks {
                        let caption = format!("{} ({} cards)", row.summary.name, row.summary.card_count);
                        if ui.button(caption).clicked() {
                            export_deck_id = Some(row.summary.id.clone());
                        }
                    }
                    ui.separator();
                    if ui.button("Cancel").clicked() {
                        should_cancel = true;
                    }
                });

            if let Some(deck_id) = export_deck_id {
                self.handle_export(&deck_id);
            }
            if should_cancel {
                self.show_export_dialog = false;
            }
        }

        if self.show_message_dialog {
            egui::Window::new("Flashcards")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_message_dialog = false;
                    }
                });
        }
    }
}

impl MyApp {
    pub fn new(
        runtime: Runtime,
        store: Arc<SqliteStore>,
        scheduler: SchedulerConfig,
    ) -> Result<Self, StoreError> {
        let session =
            ReviewSessionManager::with_scheduler(Arc::clone(&store), Sm2Scheduler::new(scheduler));
        let mut app = Self {
            runtime,
            store,
            session,
            decks: Vec::new(),
            overall: DeckProgress::default(),
            selected_deck: None,
            selected_cards: Vec::new(),
            reviewing_deck_name: String::new(),
            current_screen: AppScreen::Main,
            show_answer: false,
            review_error: None,
            new_deck_name: String::new(),
            current_front: String::new(),
            current_back: String::new(),
            show_export_dialog: false,
            show_message_dialog: false,
            message: String::new(),
        };
        app.refresh()?;
        app.selected_deck = app.decks.first().map(|row| row.summary.id.clone());
        app.reload_selected_cards();
        Ok(app)
    }

    /// Review time: wall clock plus the simulated day offset.
    fn review_now(&self) -> DateTime<Utc> {
        let wall_clock = Utc::now();
        self.store.review_time(wall_clock).unwrap_or_else(|e| {
            warn!("cannot read review clock, using wall clock: {}", e);
            wall_clock
        })
    }

    /// Reloads deck summaries and due/learned counts from the store.
    fn refresh(&mut self) -> Result<(), StoreError> {
        let now = self.review_now();
        let summaries = self.runtime.block_on(self.store.list_decks())?;

        let mut rows = Vec::with_capacity(summaries.len());
        let mut overall = DeckProgress::default();
        for summary in summaries {
            let cards = self.runtime.block_on(self.store.load_cards(&summary.id))?;
            let progress = DeckProgress::of(&cards, now);
            overall = overall.merge(progress);
            rows.push(DeckRow { summary, progress });
        }

        self.decks = rows;
        self.overall = overall;
        Ok(())
    }

    fn reload_selected_cards(&mut self) {
        self.selected_cards = match &self.selected_deck {
            Some(deck_id) => self
                .runtime
                .block_on(self.store.load_cards(deck_id))
                .unwrap_or_else(|e| {
                    error!("cannot load cards: {}", e);
                    Vec::new()
                }),
            None => Vec::new(),
        };
        self.selected_cards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }

    fn refresh_or_report(&mut self) {
        if let Err(e) = self.refresh() {
            self.show_message(format!("Failed to load decks: {}", e));
        }
        self.reload_selected_cards();
    }

    fn show_message(&mut self, message: String) {
        self.message = message;
        self.show_message_dialog = true;
    }

    /// Renders the main screen with deck management interface
    fn render_main_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let now = self.review_now();
            let mut action_next_day = false;
            let mut action_import = false;
            let mut action_create = false;
            let mut action_add_card = false;
            let mut action_select: Option<DeckId> = None;
            let mut action_review: Option<DeckId> = None;

            ui.horizontal(|ui| {
                ui.label(now.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string());
                if ui.button("Next Day").clicked() {
                    action_next_day = true;
                }
            });
            ui.label(format!(
                "All decks: {} due, {} learned, {} cards",
                self.overall.due, self.overall.learned, self.overall.total
            ));
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Export Deck").clicked() {
                    self.show_export_dialog = true;
                }
                if ui.button("Import Deck").clicked() {
                    action_import = true;
                }
            });
            ui.separator();

            ui.heading("Create New Deck");
            ui.horizontal(|ui| {
                ui.label("Deck name:");
                ui.text_edit_singleline(&mut self.new_deck_name);
                if ui.button("Create Deck").clicked() {
                    action_create = true;
                }
            });
            ui.separator();

            ui.heading(format!("Decks ({})", self.decks.len()));
            egui::ScrollArea::vertical()
                .id_salt("decks_list")
                .max_height(150.0)
                .show(ui, |ui| {
                    for row in &self.decks {
                        let is_selected = self.selected_deck.as_ref() == Some(&row.summary.id);
                        ui.horizontal(|ui| {
                            let caption = format!(
                                "{} ({} due, {} learned, {} cards)",
                                row.summary.name,
                                row.progress.due,
                                row.progress.learned,
                                row.progress.total
                            );
                            if ui.selectable_label(is_selected, caption).clicked() {
                                action_select = Some(row.summary.id.clone());
                            }
                            if ui.button("Review").clicked() {
                                action_review = Some(row.summary.id.clone());
                            }
                        });
                    }
                });
            ui.separator();

            if self.selected_deck.is_some() {
                ui.horizontal(|ui| {
                    ui.label("Front:");
                    ui.text_edit_singleline(&mut self.current_front);
                });
                ui.horizontal(|ui| {
                    ui.label("Back:");
                    ui.text_edit_singleline(&mut self.current_back);
                });
                if ui.button("Add Card").clicked() {
                    action_add_card = true;
                }
                ui.separator();

                ui.heading(format!("Cards ({})", self.selected_cards.len()));
                let local_now = now.with_timezone(&Local);
                egui::ScrollArea::vertical()
                    .id_salt("cards_list")
                    .max_height(250.0)
                    .show(ui, |ui| {
                        for card in &self.selected_cards {
                            let status = classify_due(card.schedule.next_review_date, local_now);
                            ui.group(|ui| {
                                ui.label(format!("{}  →  {}", card.front, card.back));
                                ui.label(format!(
                                    "Next review: {}  (interval {}d, ease {:.2})",
                                    status.label(),
                                    card.schedule.interval,
                                    card.schedule.ease_factor
                                ));
                            });
                        }
                    });
            } else {
                ui.label("Select a deck to add cards");
            }

            // Execute deferred actions
            if action_next_day {
                if let Err(e) = self.store.advance_day() {
                    self.show_message(format!("Cannot advance the clock: {}", e));
                }
                self.refresh_or_report();
            }
            if action_import {
                self.handle_import();
            }
            if action_create {
                self.handle_create_deck();
            }
            if action_add_card {
                self.handle_add_card();
            }
            if let Some(deck_id) = action_select {
                self.selected_deck = Some(deck_id);
                self.reload_selected_cards();
            }
            if let Some(deck_id) = action_review {
                self.start_review(deck_id);
            }
        });
    }

    /// Renders the review screen: front, then back, then a quality rating
    fn render_review_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(format!("Reviewing: {}", self.reviewing_deck_name));

            let mut action_show = false;
            let mut action_rate: Option<Quality> = None;
            let mut action_retry = false;
            let mut action_rate_again = false;
            let mut action_end = false;
            let mut action_back = false;

            if !self.session.is_active() {
                match self.session.last_end() {
                    Some(SessionEnd::Completed) => {
                        ui.heading("Session complete!");
                        ui.label("All due cards in this deck have been reviewed.");
                    }
                    _ => {
                        ui.label("Review ended.");
                    }
                }
                ui.add_space(20.0);
                if ui.button("Back to Main Screen").clicked() {
                    action_back = true;
                }
            } else if let Ok(card) = self.session.current_card() {
                let now = self.review_now();
                if let Some((index, total)) = self.session.position() {
                    ui.label(format!("Card {} / {}", index, total));
                }
                ui.add_space(20.0);

                ui.group(|ui| {
                    ui.set_min_height(200.0);
                    ui.vertical_centered(|ui| {
                        ui.add_space(20.0);
                        ui.heading("Front:");
                        ui.label(&card.front);
                        ui.add_space(20.0);
                        if self.show_answer {
                            ui.heading("Back:");
                            ui.label(&card.back);
                        } else {
                            ui.label("(Click 'Show Answer' to reveal)");
                        }
                        ui.add_space(20.0);
                    });
                });
                ui.add_space(20.0);

                if let Some(message) = &self.review_error {
                    ui.colored_label(egui::Color32::RED, message);
                    ui.horizontal(|ui| {
                        if ui.button("Retry").clicked() {
                            action_retry = true;
                        }
                        if ui.button("Rate Again").clicked() {
                            action_rate_again = true;
                        }
                    });
                } else if !self.show_answer {
                    if ui.button("Show Answer").clicked() {
                        action_show = true;
                    }
                } else {
                    let scheduler = self.session.scheduler();
                    let previews = scheduler.preview_intervals(&card.schedule, now);
                    ui.label("Rate your response:");
                    for row in [[0, 1, 2], [3, 4, 5]] {
                        ui.horizontal(|ui| {
                            for value in row {
                                let Ok(quality) = Quality::new(value) else {
                                    continue;
                                };
                                let caption = format!(
                                    "{} - {} ({})",
                                    quality,
                                    quality.label(),
                                    scheduler.format_interval(previews[value as usize])
                                );
                                if ui.button(caption).clicked() {
                                    action_rate = Some(quality);
                                }
                            }
                        });
                    }
                }

                ui.add_space(20.0);
                if ui.button("End Review").clicked() {
                    action_end = true;
                }
            }

            // Execute deferred actions
            if action_show {
                self.show_answer = true;
            }
            if let Some(quality) = action_rate {
                let now = self.review_now();
                let result = self.runtime.block_on(self.session.submit_review(quality, now));
                self.handle_review_result(result);
            }
            if action_retry {
                let result = self.runtime.block_on(self.session.retry_pending());
                self.handle_review_result(result);
            }
            if action_rate_again {
                if let Err(e) = self.session.discard_pending() {
                    error!("cannot discard unsaved review: {}", e);
                }
                self.review_error = None;
                self.show_answer = true;
            }
            if action_end {
                if let Err(e) = self.session.cancel() {
                    error!("cannot end review: {}", e);
                }
                self.review_error = None;
                self.current_screen = AppScreen::Main;
                self.refresh_or_report();
            }
            if action_back {
                self.current_screen = AppScreen::Main;
                self.refresh_or_report();
            }
        });
    }

    fn handle_review_result(&mut self, result: Result<ReviewOutcome, ReviewError>) {
        match result {
            Ok(_) => {
                self.review_error = None;
                self.show_answer = false;
            }
            Err(e) => {
                error!("review failed: {}", e);
                self.review_error = Some(format!("Could not save this review: {}", e));
            }
        }
    }

    /// Starts a review session over the deck's due cards
    fn start_review(&mut self, deck_id: DeckId) {
        let now = self.review_now();
        let name = self
            .decks
            .iter()
            .find(|row| row.summary.id == deck_id)
            .map(|row| row.summary.name.clone())
            .unwrap_or_default();

        match self.runtime.block_on(self.session.start_from_store(deck_id, now)) {
            Ok(StartOutcome::Started { .. }) => {
                self.reviewing_deck_name = name;
                self.show_answer = false;
                self.review_error = None;
                self.current_screen = AppScreen::Review;
            }
            Ok(StartOutcome::NothingDue) => {
                self.show_message(format!("No cards are due for review in '{}'.", name));
            }
            Err(e) => self.show_message(format!("Cannot start review: {}", e)),
        }
    }

    fn handle_create_deck(&mut self) {
        let name = self.new_deck_name.trim().to_string();
        if name.is_empty() {
            return;
        }
        match self.store.create_deck(&name) {
            Ok(deck_id) => {
                self.selected_deck = Some(deck_id);
                self.new_deck_name.clear();
            }
            Err(e) => self.show_message(format!("Failed to create deck: {}", e)),
        }
        self.refresh_or_report();
    }

    fn handle_add_card(&mut self) {
        let Some(deck_id) = self.selected_deck.clone() else {
            return;
        };
        if self.current_front.is_empty() || self.current_back.is_empty() {
            return;
        }

        let now = self.review_now();
        let mut card = Card::new(self.current_front.clone(), self.current_back.clone(), now);
        card.schedule = self.session.scheduler().new_card_state(now);

        match self.store.insert_card(&deck_id, &card) {
            Ok(()) => {
                self.current_front.clear();
                self.current_back.clear();
            }
            Err(e) => self.show_message(format!("Failed to add card: {}", e)),
        }
        self.refresh_or_report();
    }

    /// Handles deck export to JSON file
    fn handle_export(&mut self, deck_id: &DeckId) {
        self.show_export_dialog = false;
        let deck = match self.store.load_deck(deck_id) {
            Ok(deck) => deck,
            Err(e) => {
                self.show_message(format!("Export failed: {}", e));
                return;
            }
        };

        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.json", deck.name))
            .add_filter("JSON files", &["json"])
            .save_file()
        {
            match export_deck(&deck, &path) {
                Ok(()) => self.show_message(format!("Deck '{}' exported successfully!", deck.name)),
                Err(e) => self.show_message(format!("Export failed: {}", e)),
            }
        }
    }

    /// Handles deck import from JSON file
    fn handle_import(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        match import_deck(&path) {
            Ok(deck) => match self.store.insert_deck(&deck) {
                Ok(()) => self.show_message(format!(
                    "Deck '{}' imported successfully with {} cards!",
                    deck.name,
                    deck.cards.len()
                )),
                Err(StoreError::DuplicateDeck(name)) => self.show_message(format!(
                    "Deck '{}' already exists! Please rename it in the JSON file.",
                    name
                )),
                Err(e) => self.show_message(format!("Import failed: {}", e)),
            },
            Err(e) => self.show_message(format!(
                "Import failed: {}\n\nPlease check if the file has correct structure:\n{{\n  \"id\": \"...\",\n  \"name\": \"Deck Name\",\n  \"cards\": [...]\n}}",
                e
            )),
        }
        self.refresh_or_report();
    }
}
