//! Main application UI and state management.
//! Handles suggestion generation, flashcard management, study sessions and statistics.

use chrono::{DateTime, Local, Utc};
use eframe::egui;
use flashcard_study::error::{ServiceError, ServiceResult};
use flashcard_study::models::{
    DueFlashcardsParams, Flashcard, FlashcardListParams, FlashcardSource, FlashcardSuggestion,
    GenerationErrorListParams, GenerationErrorLog, GenerationStatistics, Page, Pagination,
    ReviewSuggestionsCommand, SortOrder, StudySession, SuggestionAction, SuggestionReview,
};
use flashcard_study::services::generation::{
    MockSuggestionGenerator, generate_flashcards, review_suggestions,
};
use flashcard_study::services::{RequestContext, flashcards, reviews, statistics};
use flashcard_study::validation::{MAX_SOURCE_TEXT_LENGTH, MIN_SOURCE_TEXT_LENGTH};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

/// Application screen states
#[derive(Default, Clone, Copy, PartialEq)]
enum AppScreen {
    #[default]
    Flashcards,
    Generate,
    Study,
    Statistics,
}

/// A suggestion as the user is shaping it before submitting the verdicts.
struct SuggestionDraft {
    suggestion: FlashcardSuggestion,
    front: String,
    back: String,
    keep: Option<bool>,
}

impl SuggestionDraft {
    fn review(&self) -> Option<SuggestionReview> {
        let action = match self.keep? {
            false => SuggestionAction::Reject,
            true if self.front != self.suggestion.front || self.back != self.suggestion.back => {
                SuggestionAction::Edit
            }
            true => SuggestionAction::Accept,
        };
        Some(SuggestionReview {
            suggestion_id: self.suggestion.id,
            action,
            front: Some(self.front.clone()),
            back: Some(self.back.clone()),
        })
    }
}

struct EditState {
    id: i64,
    front: String,
    back: String,
}

/// Main application state
pub struct FlashcardsApp {
    show_confirmation_dialog: bool,
    allowed_to_close: bool,
    conn: Arc<Mutex<Connection>>,
    user_id: String,
    model: String,

    current_screen: AppScreen,

    list_params: FlashcardListParams,
    flashcards: Option<Page<Flashcard>>,
    new_front: String,
    new_back: String,
    editing: Option<EditState>,

    source_text: String,
    generation_id: Option<i64>,
    drafts: Vec<SuggestionDraft>,

    study_session: Option<StudySession>,

    statistics: Option<GenerationStatistics>,
    recent_errors: Vec<GenerationErrorLog>,

    show_result_dialog: bool,
    result_message: String,
}

/// Formats a UTC timestamp as a local YYYY-MM-DD string
fn format_date(time: DateTime<Utc>) -> String {
    let datetime: DateTime<Local> = time.into();
    datetime.format("%Y-%m-%d").to_string()
}

/// Request problems are warnings; storage and internal failures are errors.
fn log_error(err: &ServiceError) {
    if err.is_client_error() {
        tracing::warn!(code = err.code(), error = %err, "operation rejected");
    } else {
        tracing::error!(code = err.code(), error = %err, "operation failed");
    }
}

impl eframe::App for FlashcardsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let before = self.current_screen;
                ui.selectable_value(&mut self.current_screen, AppScreen::Flashcards, "Flashcards");
                ui.selectable_value(&mut self.current_screen, AppScreen::Generate, "Generate");
                ui.selectable_value(&mut self.current_screen, AppScreen::Study, "Study");
                ui.selectable_value(&mut self.current_screen, AppScreen::Statistics, "Statistics");
                if before != self.current_screen {
                    self.on_screen_entered();
                }
            });
        });

        match self.current_screen {
            AppScreen::Flashcards => self.render_flashcards_screen(ctx),
            AppScreen::Generate => self.render_generate_screen(ctx),
            AppScreen::Study => self.render_study_screen(ctx),
            AppScreen::Statistics => self.render_statistics_screen(ctx),
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
            egui::Window::new("Result")
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

impl FlashcardsApp {
    pub fn new(conn: Connection, user_id: String, model: String) -> Self {
        let mut app = Self {
            show_confirmation_dialog: false,
            allowed_to_close: false,
            conn: Arc::new(Mutex::new(conn)),
            user_id,
            model,
            current_screen: AppScreen::default(),
            list_params: FlashcardListParams::default(),
            flashcards: None,
            new_front: String::new(),
            new_back: String::new(),
            editing: None,
            source_text: String::new(),
            generation_id: None,
            drafts: Vec::new(),
            study_session: None,
            statistics: None,
            recent_errors: Vec::new(),
            show_result_dialog: false,
            result_message: String::new(),
        };
        app.refresh_flashcards();
        app
    }

    /// Runs a service call with the shared connection and the app's user.
    fn with_ctx<T>(&self, f: impl FnOnce(&RequestContext<'_>) -> ServiceResult<T>) -> ServiceResult<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| ServiceError::Internal("database connection lock poisoned".to_string()))?;
        f(&RequestContext::new(&conn, &self.user_id))
    }

    fn show_result(&mut self, message: impl Into<String>) {
        self.result_message = message.into();
        self.show_result_dialog = true;
    }

    fn show_error(&mut self, err: &ServiceError) {
        log_error(err);
        self.show_result(format!("{} ({})", err, err.code()));
    }

    fn on_screen_entered(&mut self) {
        match self.current_screen {
            AppScreen::Flashcards => self.refresh_flashcards(),
            AppScreen::Statistics => self.refresh_statistics(),
            AppScreen::Generate | AppScreen::Study => {}
        }
    }

    fn refresh_flashcards(&mut self) {
        let params = self.list_params.clone();
        match self.with_ctx(|ctx| flashcards::list_flashcards(ctx, &params)) {
            Ok(page) => self.flashcards = Some(page),
            Err(err) => self.show_error(&err),
        }
    }

    fn refresh_statistics(&mut self) {
        let result = self.with_ctx(|ctx| {
            let stats = statistics::generation_statistics(ctx)?;
            let errors = statistics::list_generation_errors(
                ctx,
                &GenerationErrorListParams {
                    pagination: Pagination { page: 1, per_page: 10 },
                    ..GenerationErrorListParams::default()
                },
            )?;
            Ok((stats, errors.items))
        });
        match result {
            Ok((stats, errors)) => {
                self.statistics = Some(stats);
                self.recent_errors = errors;
            }
            Err(err) => self.show_error(&err),
        }
    }

    /// Renders the flashcard list with create, edit and delete controls
    fn render_flashcards_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Create New Flashcard");
            ui.horizontal(|ui| {
                ui.label("Front:");
                ui.text_edit_singleline(&mut self.new_front);
            });
            ui.horizontal(|ui| {
                ui.label("Back:");
                ui.text_edit_multiline(&mut self.new_back);
            });
            if ui.button("Add Flashcard").clicked() {
                let (front, back) = (self.new_front.clone(), self.new_back.clone());
                match self.with_ctx(|ctx| flashcards::create_flashcard(ctx, &front, &back)) {
                    Ok(_) => {
                        self.new_front.clear();
                        self.new_back.clear();
                        self.refresh_flashcards();
                    }
                    Err(err) => self.show_error(&err),
                }
            }

            ui.separator();

            // Filters
            let mut filters_changed = false;
            ui.horizontal(|ui| {
                let selected = self
                    .list_params
                    .source
                    .map_or("All sources", |source| source.as_str());
                egui::ComboBox::from_label("Source")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        filters_changed |= ui
                            .selectable_value(&mut self.list_params.source, None, "All sources")
                            .changed();
                        for source in FlashcardSource::ALL {
                            filters_changed |= ui
                                .selectable_value(
                                    &mut self.list_params.source,
                                    Some(source),
                                    source.as_str(),
                                )
                                .changed();
                        }
                    });

                let newest_first = self.list_params.order == SortOrder::Desc;
                if ui
                    .button(if newest_first { "Newest first" } else { "Oldest first" })
                    .clicked()
                {
                    self.list_params.order = if newest_first {
                        SortOrder::Asc
                    } else {
                        SortOrder::Desc
                    };
                    filters_changed = true;
                }
            });
            if filters_changed {
                self.list_params.pagination.page = 1;
                self.refresh_flashcards();
            }

            // We store actions to execute after UI rendering to avoid borrowing conflicts
            let mut action_edit: Option<(i64, String, String)> = None;
            let mut action_delete: Option<i64> = None;
            let mut action_page: Option<u32> = None;

            if let Some(page) = &self.flashcards {
                ui.heading(format!("Flashcards ({})", page.total));

                egui::ScrollArea::vertical()
                    .id_source("flashcards_list")
                    .max_height(350.0)
                    .show(ui, |ui| {
                        for card in &page.items {
                            ui.group(|ui| {
                                ui.label(format!("Front: {}", card.front));
                                ui.label(format!("Back: {}", card.back));
                                ui.horizontal(|ui| {
                                    ui.small(format!(
                                        "{} · created {}",
                                        card.source,
                                        format_date(card.created_at)
                                    ));
                                    if ui.button("Edit").clicked() {
                                        action_edit =
                                            Some((card.id, card.front.clone(), card.back.clone()));
                                    }
                                    if ui.button("Delete").clicked() {
                                        action_delete = Some(card.id);
                                    }
                                });
                            });
                        }
                    });

                ui.horizontal(|ui| {
                    if page.page > 1 && ui.button("< Previous").clicked() {
                        action_page = Some(page.page - 1);
                    }
                    ui.label(format!("Page {} of {}", page.page, page.total_pages().max(1)));
                    if page.page < page.total_pages() && ui.button("Next >").clicked() {
                        action_page = Some(page.page + 1);
                    }
                });
            }

            // Execute deferred actions
            if let Some((id, front, back)) = action_edit {
                self.editing = Some(EditState { id, front, back });
            }
            if let Some(id) = action_delete {
                match self.with_ctx(|ctx| flashcards::delete_flashcard(ctx, id)) {
                    Ok(()) => self.refresh_flashcards(),
                    Err(err) => self.show_error(&err),
                }
            }
            if let Some(page) = action_page {
                self.list_params.pagination.page = page;
                self.refresh_flashcards();
            }
        });

        self.render_edit_dialog(ctx);
    }

    fn render_edit_dialog(&mut self, ctx: &egui::Context) {
        let Some(edit) = &mut self.editing else {
            return;
        };

        let mut save = false;
        let mut cancel = false;
        egui::Window::new("Edit Flashcard")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Front:");
                ui.text_edit_singleline(&mut edit.front);
                ui.label("Back:");
                ui.text_edit_multiline(&mut edit.back);
                ui.horizontal(|ui| {
                    save = ui.button("Save").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });

        if save {
            let (id, front, back) = (edit.id, edit.front.clone(), edit.back.clone());
            match self.with_ctx(|ctx| {
                flashcards::update_flashcard(ctx, id, Some(front.as_str()), Some(back.as_str()))
            }) {
                Ok(_) => {
                    self.editing = None;
                    self.refresh_flashcards();
                }
                Err(err) => self.show_error(&err),
            }
        } else if cancel {
            self.editing = None;
        }
    }

    /// Renders source text input and the suggestions awaiting a verdict
    fn render_generate_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Generate Flashcards");
            let length = self.source_text.chars().count();
            ui.label(format!(
                "Source text ({} characters, {}-{} required):",
                length, MIN_SOURCE_TEXT_LENGTH, MAX_SOURCE_TEXT_LENGTH
            ));
            egui::ScrollArea::vertical()
                .id_source("source_text")
                .max_height(150.0)
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.source_text)
                            .desired_rows(8)
                            .desired_width(f32::INFINITY),
                    );
                });

            if ui.button("Generate").clicked() {
                self.handle_generate();
            }

            ui.separator();

            if self.drafts.is_empty() {
                ui.label("No suggestions yet");
                return;
            }

            egui::ScrollArea::vertical()
                .id_source("suggestions")
                .max_height(350.0)
                .show(ui, |ui| {
                    for draft in &mut self.drafts {
                        ui.group(|ui| {
                            ui.horizontal(|ui| {
                                ui.label("Front:");
                                ui.text_edit_singleline(&mut draft.front);
                            });
                            ui.horizontal(|ui| {
                                ui.label("Back:");
                                ui.text_edit_singleline(&mut draft.back);
                            });
                            ui.horizontal(|ui| {
                                ui.selectable_value(&mut draft.keep, Some(true), "Accept");
                                ui.selectable_value(&mut draft.keep, Some(false), "Reject");
                            });
                        });
                    }
                });

            let decided = self.drafts.iter().filter(|d| d.keep.is_some()).count();
            ui.label(format!("{} of {} suggestions reviewed", decided, self.drafts.len()));
            if ui.button("Save Reviewed Suggestions").clicked() {
                self.handle_review_suggestions();
            }
        });
    }

    fn handle_generate(&mut self) {
        let (text, model) = (self.source_text.clone(), self.model.clone());
        match self.with_ctx(|ctx| generate_flashcards(ctx, &MockSuggestionGenerator, &model, &text)) {
            Ok(response) => {
                self.generation_id = Some(response.generation_id);
                self.drafts = response
                    .suggestions
                    .into_iter()
                    .map(|suggestion| SuggestionDraft {
                        front: suggestion.front.clone(),
                        back: suggestion.back.clone(),
                        suggestion,
                        keep: None,
                    })
                    .collect();
            }
            Err(err) => self.show_error(&err),
        }
    }

    fn handle_review_suggestions(&mut self) {
        let Some(generation_id) = self.generation_id else {
            return;
        };
        let command = ReviewSuggestionsCommand {
            generation_id,
            reviews: self.drafts.iter().filter_map(SuggestionDraft::review).collect(),
        };

        match self.with_ctx(|ctx| review_suggestions(ctx, &command)) {
            Ok(counts) => {
                self.drafts.clear();
                self.generation_id = None;
                self.source_text.clear();
                self.show_result(format!(
                    "Saved: {} accepted, {} edited, {} rejected",
                    counts.accepted, counts.edited, counts.rejected
                ));
            }
            Err(err) => self.show_error(&err),
        }
    }

    /// Renders the study session with flashcard review interface
    fn render_study_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(session) = &mut self.study_session else {
                ui.heading("Study");
                ui.label(format!("Today: {}", format_date(Utc::now())));
                if ui.button("Start Session With Due Cards").clicked() {
                    self.start_study_session();
                }
                return;
            };

            ui.heading("Study Session");
            ui.label(session.phase_message());
            ui.label(format!(
                "Progress: {} / {} passed ({} remaining)",
                session.passed_count(),
                session.total_count(),
                session.remaining_count()
            ));

            ui.add_space(20.0);

            if session.is_completed() {
                ui.heading("Congratulations!");
                ui.label("You've passed every due card!");
                ui.add_space(20.0);
                if ui.button("Finish").clicked() {
                    self.study_session = None;
                }
                return;
            }

            let Some(card) = session.current_card() else {
                return;
            };
            // Clone values to avoid borrowing issues
            let show_back = session.show_back;
            let passed = card.passed;
            let front = card.flashcard.front.clone();
            let back = card.flashcard.back.clone();
            let last_review = card
                .latest_review
                .as_ref()
                .map(|review| format!("Last interval: {} days, EF {:.2}", review.interval, review.ease_factor));

            ui.group(|ui| {
                ui.set_min_height(200.0);
                ui.vertical_centered(|ui| {
                    ui.add_space(20.0);
                    ui.heading("Front:");
                    ui.label(&front);
                    ui.add_space(20.0);
                    if show_back {
                        ui.heading("Back:");
                        ui.label(&back);
                    } else {
                        ui.label("(Click 'Show Back' to reveal)");
                    }
                    if let Some(last_review) = &last_review {
                        ui.add_space(10.0);
                        ui.small(last_review);
                    }
                });
            });

            ui.add_space(20.0);

            // Store actions to execute after UI rendering
            let mut action_toggle = false;
            let mut action_rating: Option<i32> = None;
            let mut action_back = false;

            if !show_back && ui.button("Show Back").clicked() {
                action_toggle = true;
            }

            // Rating buttons (0-5) - only shown after revealing the back
            if show_back && !passed {
                ui.label("Rate your recall:");
                ui.horizontal(|ui| {
                    for (rating, label) in [(0, "0 - Blackout"), (1, "1 - Wrong"), (2, "2 - Wrong (familiar)")] {
                        if ui.button(label).clicked() {
                            action_rating = Some(rating);
                        }
                    }
                });
                ui.horizontal(|ui| {
                    for (rating, label) in [(3, "3 - Difficult"), (4, "4 - Correct"), (5, "5 - Perfect")] {
                        if ui.button(label).clicked() {
                            action_rating = Some(rating);
                        }
                    }
                });
            }

            ui.add_space(20.0);
            if ui.button("End Session").clicked() {
                action_back = true;
            }

            // Execute deferred actions
            if action_toggle {
                session.toggle_back();
            }
            if let Some(rating) = action_rating {
                let result = match self.conn.lock() {
                    Ok(conn) => {
                        let ctx = RequestContext::new(&conn, &self.user_id);
                        session.rate_current_card(&ctx, rating)
                    }
                    Err(_) => Err(ServiceError::Internal(
                        "database connection lock poisoned".to_string(),
                    )),
                };
                match result {
                    Ok(_) => session.next_card(),
                    Err(err) => {
                        log_error(&err);
                        self.result_message = format!("{} ({})", err, err.code());
                        self.show_result_dialog = true;
                    }
                }
            }
            if action_back {
                self.study_session = None;
            }
        });
    }

    /// Starts a study session with the cards due now
    fn start_study_session(&mut self) {
        let params = DueFlashcardsParams {
            pagination: Pagination { page: 1, per_page: 100 },
            before: None,
        };
        match self.with_ctx(|ctx| reviews::due_flashcards(ctx, &params)) {
            Ok(page) if page.items.is_empty() => self.show_result("No cards are due right now."),
            Ok(page) => self.study_session = Some(StudySession::new(page.items)),
            Err(err) => self.show_error(&err),
        }
    }

    fn render_statistics_screen(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Generation Statistics");
            if ui.button("Refresh").clicked() {
                self.refresh_statistics();
            }

            if let Some(stats) = &self.statistics {
                egui::Grid::new("statistics_grid").striped(true).show(ui, |ui| {
                    ui.label("Generated");
                    ui.label(stats.total_generated.to_string());
                    ui.end_row();
                    ui.label("Accepted unedited");
                    ui.label(stats.accepted_unedited.to_string());
                    ui.end_row();
                    ui.label("Accepted edited");
                    ui.label(stats.accepted_edited.to_string());
                    ui.end_row();
                    ui.label("Rejected");
                    ui.label(stats.rejected.to_string());
                    ui.end_row();
                    ui.label("Acceptance rate");
                    ui.label(
                        stats
                            .acceptance_rate()
                            .map_or("-".to_string(), |rate| format!("{:.0}%", rate * 100.0)),
                    );
                    ui.end_row();
                });
            }

            ui.separator();
            ui.heading("Recent Generation Errors");
            if self.recent_errors.is_empty() {
                ui.label("None");
            }
            for error in &self.recent_errors {
                ui.label(format!(
                    "{} [{}] {}: {}",
                    format_date(error.created_at),
                    error.model,
                    error.error_code,
                    error.error_message
                ));
            }
        });
    }
}
