use std::path::PathBuf;

use rustyline::{Config, Editor, Result};
use tracing::debug;

const HISTORY_FILE: &str = ".paper_chat_history";
const MAX_HISTORY: usize = 500;

/// Prompt for the next line. Marks whether a document session is active.
pub fn generate_prompt(session_id: Option<&str>) -> String {
    match session_id {
        Some(_) => "[paper] > ".to_string(),
        None => "> ".to_string(),
    }
}

/// Where questions and commands are kept between runs.
pub fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HISTORY_FILE))
}

/// Line editor with the history of earlier runs loaded.
pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .max_history_size(MAX_HISTORY)
        .history_ignore_dups(true)
        .history_ignore_space(true)
        .build();
    let mut editor = Editor::with_config(config)?;

    if let Some(path) = history_path() {
        if let Err(e) = editor.load_history(&path) {
            debug!("No history loaded from {}: {}", path.display(), e);
        }
    }

    Ok(editor)
}

pub fn save_history(editor: &mut Editor<()>) {
    let Some(path) = history_path() else {
        return;
    };
    if let Err(e) = editor.save_history(&path) {
        debug!("Failed to save history to {}: {}", path.display(), e);
    }
}
