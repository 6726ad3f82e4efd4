//! Main application UI and state management.
//! Handles the vocabulary browser, practice sessions and import/export dialogs.

use chrono::{DateTime, Local};
use eframe::egui;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};
use vocab_trainer::config::AppConfig;
use vocab_trainer::database::db;
use vocab_trainer::export::json;
use vocab_trainer::models::{
    classify, collection_stats, grade_feedback_message, plan_session, CefrLevel, Direction, Grade,
    ItemClass, LearningPhase, LearningSession, ReviewStateStore, Scheduler,
    SharedReviewStateStore, Timestamp, VocabularyFilter, VocabularySet,
};

/// Application screen states
#[derive(Default)]
enum AppScreen {
    #[default]
    Browse,
    Practice,
}

pub struct VocabApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,

    config: AppConfig,
    scheduler: Scheduler,
    vocabulary: VocabularySet,
    store: Arc<SharedReviewStateStore>,
    conn: Arc<Mutex<Connection>>,

    filter: VocabularyFilter,
    direction: Direction,
    current_screen: AppScreen,
    learning_session: Option<LearningSession>,
    current_time: Timestamp,

    show_result_dialog: bool,
    result_message: String,
}

/// Formats an epoch-millisecond timestamp as a local YYYY-MM-DD string
fn format_timestamp(ms: Timestamp) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|utc| utc.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn lock_conn(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl eframe::App for VocabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        match self.current_screen {
            AppScreen::Browse => self.render_browse_screen(ctx),
            AppScreen::Practice => self.render_practice_screen(ctx),
        }

        // Handle window close requests with confirmation dialog
        if ctx.input(|i| i.viewport().close_requested()) && !self.allowed_to_close {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_confirmation_dialog = true;
        }

        if self.show_confirmation_dialog {
            egui::Window::new("Do you want to quit?")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("No").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = false;
                        }

                        if ui.button("Yes").clicked() {
                            self.show_confirmation_dialog = false;
                            self.allowed_to_close = true;
                            ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                        }
                    });
                });
        }

        if self.show_result_dialog {
            egui::Window::new("Import/Export Result")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&self.result_message);
                    ui.add_space(10.0);
                    if ui.button("OK").clicked() {
                        self.show_result_dialog = false;
                    }
                });
        }
    }
}

impl VocabApp {
    pub fn new(
        config: AppConfig,
        vocabulary: VocabularySet,
        store: ReviewStateStore,
        conn: Connection,
    ) -> Self {
        let current_time = db::get_current_time(&conn).unwrap_or_default();
        Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            scheduler: Scheduler::new(config.scheduler.clone()),
            direction: config.session.direction,
            config,
            vocabulary,
            store: Arc::new(SharedReviewStateStore::new(store)),
            conn: Arc::new(Mutex::new(conn)),
            filter: VocabularyFilter::default(),
            current_screen: AppScreen::Browse,
            learning_session: None,
            current_time,
            show_result_dialog: false,
            result_message: String::new(),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        lock_conn(&self.conn)
    }

    fn show_result(&mut self, message: String) {
        self.result_message = message;
        self.show_result_dialog = true;
    }

    /// Re-reads the practice clock; keeps the cached value if the read fails
    fn refresh_time(&mut self) {
        let result = db::get_current_time(&self.conn());
        match result {
            Ok(now) => self.current_time = now,
            Err(e) => log::warn!("Failed to read practice clock: {}", e),
        }
    }

    /// Renders the vocabulary browser with session controls
    fn render_browse_screen(&mut self, ctx: &egui::Context) {
        let now = self.current_time;
        let states = self.store.snapshot();
        let stats = collection_stats(&states, now);
        let store_view = ReviewStateStore::from_states(states);

        let mut action_next_day = false;
        let mut action_start = false;
        let mut action_import_vocabulary = false;
        let mut action_export_vocabulary = false;
        let mut action_import_progress = false;
        let mut action_export_progress = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format_timestamp(now));
                if ui.button("Next Day").clicked() {
                    action_next_day = true;
                }
            });
            ui.separator();

            ui.horizontal(|ui| {
                if ui.button("Import Vocabulary").clicked() {
                    action_import_vocabulary = true;
                }
                if ui.button("Export Vocabulary").clicked() {
                    action_export_vocabulary = true;
                }
                if ui.button("Import Progress").clicked() {
                    action_import_progress = true;
                }
                if ui.button("Export Progress").clicked() {
                    action_export_progress = true;
                }
            });
            ui.separator();

            ui.heading("Practice");
            ui.label(format!(
                "{} words, {} reviewed, {} due, average ease {:.2}, accuracy {}%",
                self.vocabulary.len(),
                stats.total,
                stats.due,
                stats.avg_ease_factor,
                stats.avg_accuracy
            ));
            ui.horizontal(|ui| {
                ui.label("Direction:");
                ui.selectable_value(
                    &mut self.direction,
                    Direction::BgToDe,
                    Direction::BgToDe.label(),
                );
                ui.selectable_value(
                    &mut self.direction,
                    Direction::DeToBg,
                    Direction::DeToBg.label(),
                );
            });
            if ui.button("Start Practice").clicked() {
                action_start = true;
            }
            ui.separator();

            ui.heading("Vocabulary");
            ui.horizontal(|ui| {
                let category_text = self.filter.category.clone().unwrap_or_else(|| "All".to_string());
                egui::ComboBox::from_label("Category")
                    .selected_text(category_text)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.filter.category, None, "All");
                        for category in self.vocabulary.categories() {
                            ui.selectable_value(
                                &mut self.filter.category,
                                Some(category.clone()),
                                category,
                            );
                        }
                    });

                let level_text = self
                    .filter
                    .level
                    .map(|level| level.to_string())
                    .unwrap_or_else(|| "All".to_string());
                egui::ComboBox::from_label("Level")
                    .selected_text(level_text)
                    .show_ui(ui, |ui| {
                        ui.selectable_value(&mut self.filter.level, None, "All");
                        for level in CefrLevel::ALL {
                            ui.selectable_value(&mut self.filter.level, Some(level), level.as_str());
                        }
                    });
            });

            egui::ScrollArea::vertical()
                .id_salt("vocabulary_list")
                .show(ui, |ui| {
                    egui::Grid::new("vocabulary_grid")
                        .striped(true)
                        .show(ui, |ui| {
                            ui.strong("Bulgarian");
                            ui.strong("German");
                            ui.strong("Level");
                            ui.strong("Status");
                            ui.strong("Phase");
                            ui.strong("Next review");
                            ui.end_row();

                            for item in self.vocabulary.filtered(&self.filter) {
                                let state = store_view.get(&item.id);
                                let status = match classify(state, now) {
                                    ItemClass::New => "new",
                                    ItemClass::Due => "due",
                                    ItemClass::Review => "scheduled",
                                };
                                ui.label(&item.bulgarian);
                                ui.label(&item.german).on_hover_text(
                                    item.notes.as_deref().unwrap_or(&item.category),
                                );
                                ui.label(item.level.as_str());
                                ui.label(status);
                                ui.label(LearningPhase::of(state).name());
                                ui.label(
                                    state
                                        .map(|s| format_timestamp(s.next_review))
                                        .unwrap_or_else(|| "-".to_string()),
                                );
                                ui.end_row();
                            }
                        });
                });
        });

        // Execute deferred actions
        if action_next_day {
            let result = db::advance_day(&self.conn());
            match result {
                Ok(now) => self.current_time = now,
                Err(e) => self.show_result(format!("Failed to advance the clock: {}", e)),
            }
        }
        if action_start {
            self.start_learning_session();
        }
        if action_import_vocabulary {
            self.handle_import_vocabulary();
        }
        if action_export_vocabulary {
            self.handle_export_vocabulary();
        }
        if action_import_progress {
            self.handle_import_progress();
        }
        if action_export_progress {
            self.handle_export_progress();
        }
    }

    /// Renders the practice screen with the card, grade buttons and session summary
    fn render_practice_screen(&mut self, ctx: &egui::Context) {
        let now = self.current_time;
        let mut action_grade: Option<Grade> = None;
        let mut action_back = false;
        let mut action_retry_mistakes = false;

        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &mut self.learning_session else {
                action_back = true;
                return;
            };

            ui.heading(format!("Practice: {}", session.title));
            ui.label(session.direction().label());
            ui.label(session.phase_message());
            ui.label(format!(
                "Progress: {} / {} learned ({} remaining)",
                session.learned_count(),
                session.total_count(),
                session.remaining_count()
            ));
            if let Some(feedback) = &session.last_feedback {
                ui.label(feedback);
            }

            ui.add_space(20.0);

            if session.is_completed() {
                let stats = &session.stats;
                ui.heading("Session complete!");
                ui.label(format!("Cards reviewed: {}", stats.reviewed));
                ui.label(format!("Accuracy: {}%", stats.accuracy()));
                ui.label(format!(
                    "New words: {}, reviews: {}",
                    stats.new_items, stats.review_items
                ));
                if let Some(minutes) = stats.duration_minutes() {
                    ui.label(format!("Time: {}m", minutes));
                }

                ui.add_space(20.0);
                if stats.has_mistakes() && ui.button("Review Mistakes").clicked() {
                    action_retry_mistakes = true;
                }
                if ui.button("Back to Vocabulary").clicked() {
                    action_back = true;
                }
                return;
            }

            let (Some(front), Some(back)) = (session.front_text(), session.back_text()) else {
                action_back = true;
                return;
            };
            let front = front.to_string();
            let back = back.to_string();
            let examples = session
                .current_card()
                .map(|card| card.item.examples.clone())
                .unwrap_or_default();
            let show_answer = session.show_answer;

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.heading(&front);
                    ui.add_space(20.0);

                    if show_answer {
                        ui.heading(&back);
                        for example in &examples {
                            ui.label(format!("{} - {}", example.bulgarian, example.german));
                        }
                    } else {
                        ui.label("(Click 'Show Answer' to reveal)");
                    }
                    ui.add_space(20.0);
                });
            });

            ui.add_space(20.0);

            if !show_answer {
                if ui.button("Show Answer").clicked() {
                    session.reveal();
                }
            } else {
                let preview = session.preview_intervals(now).unwrap_or_default();
                ui.label("Rate your answer:");
                ui.horizontal_wrapped(|ui| {
                    for grade in Grade::ALL {
                        let days = preview[usize::from(grade.quality())];
                        let text = format!("{} - {} ({}d)", grade.quality(), grade.label(), days);
                        if ui
                            .button(text)
                            .on_hover_text(grade_feedback_message(i64::from(grade.quality())))
                            .clicked()
                        {
                            action_grade = Some(grade);
                        }
                    }
                });
            }

            ui.add_space(20.0);
            if ui.button("Back to Vocabulary").clicked() {
                action_back = true;
            }
        });

        // Execute deferred actions
        if let Some(grade) = action_grade {
            self.grade_current_card(grade);
        }
        if action_retry_mistakes {
            self.retry_mistakes();
        }
        if action_back {
            self.current_screen = AppScreen::Browse;
            self.learning_session = None;
        }
    }

    /// Grades the current card, persists the new state and moves on
    fn grade_current_card(&mut self, grade: Grade) {
        self.refresh_time();
        let now = self.current_time;
        let conn = Arc::clone(&self.conn);
        let Some(session) = self.learning_session.as_mut() else {
            return;
        };

        let result = session.grade_current_with(grade, now, |state| {
            db::save_review_state(state, &lock_conn(&conn))
        });
        match result {
            Ok(_) => session.next_card(),
            Err(e) => {
                log::error!("Failed to save review state: {}", e);
                self.show_result(format!(
                    "Failed to save progress: {}\n\nThe grade was not recorded. Grade the card again to retry.",
                    e
                ));
            }
        }
    }

    /// Starts a session with due cards first, then new cards
    fn start_learning_session(&mut self) {
        self.refresh_time();
        let now = self.current_time;
        let planned = {
            let store = self.store.lock();
            plan_session(
                &self.vocabulary,
                &store,
                now,
                self.config.session.limit,
                self.config.session.new_items,
            )
        };

        if planned.is_empty() {
            self.show_result("Nothing to practice right now. Come back tomorrow!".to_string());
            return;
        }

        let title = match &self.filter.category {
            Some(category) => category.clone(),
            None => "All words".to_string(),
        };
        self.learning_session = Some(LearningSession::new(
            title,
            planned,
            self.direction,
            Arc::clone(&self.store),
            self.scheduler.clone(),
        ));
        self.current_screen = AppScreen::Practice;
    }

    /// Starts a new session with the cards that were failed in the finished one
    fn retry_mistakes(&mut self) {
        let Some(session) = &self.learning_session else {
            return;
        };
        let now = self.current_time;
        let planned = session
            .mistakes()
            .into_iter()
            .map(|item| {
                let class = classify(self.store.get(&item.id).as_ref(), now);
                (item, class)
            })
            .collect();
        let title = format!("{} (mistakes)", session.title);

        self.learning_session = Some(LearningSession::new(
            title,
            planned,
            self.direction,
            Arc::clone(&self.store),
            self.scheduler.clone(),
        ));
    }

    fn handle_import_vocabulary(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let items = match json::import_vocabulary(&path) {
            Ok(items) => items,
            Err(e) => {
                self.show_result(format!(
                    "Import failed: {}\n\nExpected a JSON array of items:\n[{{ \"id\": \"...\", \"bulgarian\": \"...\", \"german\": \"...\", \"category\": \"...\", \"level\": \"A1\" }}]",
                    e
                ));
                return;
            }
        };

        let count = items.len();
        let result = {
            let conn = self.conn();
            items
                .iter()
                .try_for_each(|item| db::upsert_vocabulary_item(item, &conn))
        };
        if let Err(e) = result {
            self.show_result(format!("Failed to store vocabulary: {}", e));
            return;
        }

        for item in items {
            self.vocabulary.upsert(item);
        }
        self.show_result(format!("Imported {} words.", count));
    }

    fn handle_export_vocabulary(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("vocabulary.json")
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        match json::export_vocabulary_to_path(&self.vocabulary, &path) {
            Ok(()) => self.show_result(format!("Exported {} words.", self.vocabulary.len())),
            Err(e) => self.show_result(format!("Export failed: {}", e)),
        }
    }

    fn handle_import_progress(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON files", &["json"])
            .pick_file()
        else {
            return;
        };

        let (states, results) =
            match json::import_progress_from_path(&path, self.scheduler.config().min_ease_factor) {
                Ok(imported) => imported,
                Err(e) => {
                    self.show_result(format!("Import failed: {}", e));
                    return;
                }
            };

        let conn = Arc::clone(&self.conn);
        let failed = json::apply_imported_states(states, &self.store, |state| {
            db::save_review_state(state, &lock_conn(&conn))
        });

        if failed > 0 {
            self.show_result(format!(
                "Imported {} review states, skipped {} invalid ones.\n{} could not be saved and were not applied.",
                results.imported - failed,
                results.skipped,
                failed
            ));
        } else {
            self.show_result(format!(
                "Imported {} review states, skipped {} invalid ones.",
                results.imported, results.skipped
            ));
        }
    }

    fn handle_export_progress(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name("progress.json")
            .add_filter("JSON files", &["json"])
            .save_file()
        else {
            return;
        };

        let states = self.store.snapshot();
        match json::export_progress_to_path(&states, self.current_time, &path) {
            Ok(()) => self.show_result(format!("Exported {} review states.", states.len())),
            Err(e) => self.show_result(format!("Export failed: {}", e)),
        }
    }
}
