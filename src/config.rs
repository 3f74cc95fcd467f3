use std::{path::PathBuf, time::Duration};
use tauri::{AppHandle, Manager};
use tracing::warn;

use crate::session::DEFAULT_SAVE_DEBOUNCE;

pub const NOTES_DIR_NAME: &str = "Notes";
pub const NOTES_DIR_ENV: &str = "JOTTER_NOTES_DIR";
pub const SAVE_DEBOUNCE_ENV: &str = "JOTTER_SAVE_DEBOUNCE_MS";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub notes_dir: PathBuf,
    pub save_debounce: Duration,
}

pub fn load_env_files() {
    let _ = dotenvy::from_filename(".env");
    let _ = dotenvy::from_filename("src-tauri/.env");
}

impl AppConfig {
    pub fn resolve(app: &AppHandle) -> Result<Self, String> {
        load_env_files();
        let documents = app.path().document_dir().ok();
        Self::from_lookup(|key| std::env::var(key).ok(), documents)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        documents_dir: Option<PathBuf>,
    ) -> Result<Self, String> {
        let notes_dir = match lookup(NOTES_DIR_ENV).map(|v| v.trim().to_string()) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => documents_dir
                .map(|d| d.join(NOTES_DIR_NAME))
                .ok_or_else(|| format!("no documents directory; set {NOTES_DIR_ENV}"))?,
        };

        let save_debounce = match lookup(SAVE_DEBOUNCE_ENV) {
            None => DEFAULT_SAVE_DEBOUNCE,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!(value = %raw, "ignoring invalid {SAVE_DEBOUNCE_ENV}");
                    DEFAULT_SAVE_DEBOUNCE
                }
            },
        };

        Ok(Self {
            notes_dir,
            save_debounce,
        })
    }
}
