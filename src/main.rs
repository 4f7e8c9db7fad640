// Entry point for the Minesweeper TUI application
// Initializes logging, configuration and language settings, then launches the UI

use std::error::Error;
use std::fs::{self, File};

// Module declarations
mod swp_board;  // Minefield rules: placement, reveal, flags, win/lose
mod swp_cell;   // Single cell state
mod swp_color;  // Glyphs and terminal colors
mod swp_config; // Difficulty, records and user preferences
mod swp_error;  // Error type shared by the game modules
mod swp_game;   // Session tying board, timer and input together
mod swp_lang;   // Multi-language string resources
mod swp_state;  // Save files
mod swp_timer;  // Elapsed-time clock
mod swp_ui;     // Terminal UI rendering and event handling

use swp_config::{data_dir, load_or_create_config};
use swp_lang::Lang;
use swp_ui::run as run_ui;

/// The terminal belongs to the UI, so log lines go to `<data dir>/swpr.log`
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    let mut builder = env_logger::Builder::from_env(env);
    let file = data_dir().and_then(|dir| {
        fs::create_dir_all(&dir).ok()?;
        File::create(dir.join("swpr.log")).ok()
    });
    match file {
        Some(f) => {
            builder.target(env_logger::Target::Pipe(Box::new(f)));
        }
        // Nowhere to write; stay quiet rather than draw over the board
        None => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    builder.init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    log::info!("swpr {} starting", env!("CARGO_PKG_VERSION"));

    // Load or create user configuration (difficulty, preferences, records)
    let mut cfg = load_or_create_config();

    // Initialize language resources based on saved or system language
    let mut lang = Lang::new(&cfg.language);
    log::debug!("language {}", lang.code());

    run_ui(&mut cfg, &mut lang)
}
