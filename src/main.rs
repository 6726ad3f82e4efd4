mod app;

use app::VocabApp;
use std::path::PathBuf;
use vocab_trainer::config::AppConfig;
use vocab_trainer::database::db::{
    count_vocabulary, init_database, load_review_states, load_vocabulary, upsert_vocabulary_item,
};
use vocab_trainer::export::json::parse_vocabulary;

const SAMPLE_VOCABULARY: &str = include_str!("../data/sample_vocabulary.json");

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).expect("Failed to load configuration");
    let conn = init_database(&config.database_path).expect("Failed to initialize database");

    if count_vocabulary(&conn).unwrap_or_default() == 0 {
        match parse_vocabulary(SAMPLE_VOCABULARY) {
            Ok(items) => {
                for item in &items {
                    if let Err(e) = upsert_vocabulary_item(item, &conn) {
                        log::warn!("Failed to seed '{}': {}", item.id, e);
                    }
                }
                log::info!("Seeded {} sample words", items.len());
            }
            Err(e) => log::error!("Bundled sample vocabulary is invalid: {}", e),
        }
    }

    let vocabulary = load_vocabulary(&conn).expect("Failed to load vocabulary from database");
    let store = load_review_states(&conn).expect("Failed to load review states from database");

    log::info!(
        "Loaded {} words, {} with review history",
        vocabulary.len(),
        store.len()
    );
    for category in vocabulary.categories() {
        log::debug!("  - {}", category);
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([640.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Bulgarian-German Vocabulary Trainer",
        options,
        Box::new(|_cc| Ok(Box::new(VocabApp::new(config, vocabulary, store, conn)))),
    )
}
