mod config;
mod errors;
mod io_atomic;
mod notes;
mod paths;
mod session;
mod settings;
mod utils;

use tauri::Manager;
use tracing::info;

use crate::config::AppConfig;
use crate::notes::NoteStore;
use crate::session::SessionState;

#[cfg(target_os = "macos")]
use window_vibrancy::{apply_vibrancy, NSVisualEffectMaterial};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tauri=info,jotter_lib=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();

    tauri::Builder::default()
        .setup(|app| {
            #[cfg(target_os = "macos")]
            {
                if let Some(window) = app.get_webview_window("main") {
                    if let Err(e) =
                        apply_vibrancy(&window, NSVisualEffectMaterial::Sidebar, None, None)
                    {
                        tracing::warn!(error = %e, "failed to apply vibrancy");
                    }
                }
            }

            let config = AppConfig::resolve(app.handle())?;
            let store = NoteStore::open(&config.notes_dir)?;
            info!(
                notes_dir = %config.notes_dir.display(),
                debounce_ms = config.save_debounce.as_millis() as u64,
                "jotter ready"
            );
            app.manage(store.clone());
            app.manage(SessionState::new(store, config.save_debounce));
            Ok(())
        })
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_store::Builder::default().build())
        .invoke_handler(tauri::generate_handler![
            notes::commands::notes_list,
            notes::commands::note_save,
            notes::commands::note_delete,
            notes::commands::notes_dir_path,
            notes::commands::notes_dir_reveal,
            session::commands::session_start,
            session::commands::session_view,
            session::commands::session_select,
            session::commands::session_back,
            session::commands::session_set_section,
            session::commands::session_search,
            session::commands::session_unlock,
            session::commands::session_edit_title,
            session::commands::session_edit_content,
            session::commands::session_flush,
            session::commands::session_new_note,
            session::commands::session_lock,
            session::commands::session_remove_lock,
            session::commands::session_toggle_archive,
            session::commands::session_delete,
            settings::commands::settings_get,
            settings::commands::settings_set_theme,
            settings::commands::autolaunch_get,
            settings::commands::autolaunch_set,
            settings::commands::app_info
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
