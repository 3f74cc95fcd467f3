use tauri::{AppHandle, State};
use tauri_plugin_store::StoreExt;
use tracing::{info, warn};

use crate::notes::NoteStore;

use super::autostart::LoginItem;
use super::types::{AppInfo, AppSettings, Theme};

const SETTINGS_STORE_FILE: &str = "settings.json";
const THEME_KEY: &str = "theme";

fn read_theme(app: &AppHandle) -> Result<Theme, String> {
    let store = app.store(SETTINGS_STORE_FILE).map_err(|e| e.to_string())?;
    let Some(value) = store.get(THEME_KEY) else {
        return Ok(Theme::default());
    };
    Ok(serde_json::from_value(value.clone()).unwrap_or_else(|e| {
        warn!(%value, error = %e, "unknown theme in settings, using default");
        Theme::default()
    }))
}

#[tauri::command]
pub fn settings_get(app: AppHandle) -> Result<AppSettings, String> {
    let theme = read_theme(&app)?;
    let launch_on_startup = LoginItem::for_app(&app)?.is_enabled();
    Ok(AppSettings {
        theme,
        launch_on_startup,
    })
}

#[tauri::command]
pub fn settings_set_theme(app: AppHandle, theme: Theme) -> Result<Theme, String> {
    let store = app.store(SETTINGS_STORE_FILE).map_err(|e| e.to_string())?;
    store.set(THEME_KEY, serde_json::to_value(theme).map_err(|e| e.to_string())?);
    store.save().map_err(|e| e.to_string())?;
    info!(?theme, "theme changed");
    Ok(theme)
}

#[tauri::command]
pub fn autolaunch_get(app: AppHandle) -> Result<bool, String> {
    Ok(LoginItem::for_app(&app)?.is_enabled())
}

#[tauri::command]
pub async fn autolaunch_set(app: AppHandle, enabled: bool) -> Result<bool, String> {
    let item = LoginItem::for_app(&app)?;
    let exe = std::env::current_exe().map_err(|e| e.to_string())?;
    let effective = tauri::async_runtime::spawn_blocking(move || item.set_enabled(enabled, &exe))
        .await
        .map_err(|e| e.to_string())??;
    info!(enabled = effective, "launch on startup updated");
    Ok(effective)
}

#[tauri::command]
pub fn app_info(app: AppHandle, store: State<'_, NoteStore>) -> AppInfo {
    let package = app.package_info();
    let config = app.config();
    AppInfo {
        name: package.name.clone(),
        version: package.version.to_string(),
        identifier: config.identifier.clone(),
        notes_dir: store.dir().to_string_lossy().to_string(),
    }
}
