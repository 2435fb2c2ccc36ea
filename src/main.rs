mod app;
use flashcard_study::config::Config;
use flashcard_study::database::db::init_database;
use flashcard_study::logging::init_tracing;
use rusqlite::Connection;
use std::path::Path;

use app::FlashcardsApp;

/// Opens the database, turning a failure into an eframe error so the process exits non-zero.
fn open_database(path: &Path) -> eframe::Result<Connection> {
    init_database(path).map_err(|err| {
        tracing::error!(error = %err, path = %path.display(), "failed to open database");
        eframe::Error::AppCreation(Box::new(err))
    })
}

fn main() -> eframe::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    init_tracing(&config.log_level);

    let conn = open_database(&config.db_path)?;
    tracing::info!(path = %config.db_path.display(), user_id = %config.user_id, "database ready");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([600.0, 750.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Flashcards App",
        options,
        Box::new(|_cc| Ok(Box::new(FlashcardsApp::new(conn, config.user_id, config.model)))),
    )
}
