use tauri::State;
use tauri_plugin_opener::OpenerExt;

use super::store::NoteStore;
use super::types::{DeleteResponse, NoteInput, SaveResponse, StoredNote};

#[tauri::command]
pub async fn notes_list(store: State<'_, NoteStore>) -> Result<Vec<StoredNote>, String> {
    let store = store.inner().clone();
    tauri::async_runtime::spawn_blocking(move || match store.list_all() {
        Ok(notes) => notes,
        Err(e) => {
            tracing::error!(error = %e, "error getting notes");
            Vec::new()
        }
    })
    .await
    .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn note_save(store: State<'_, NoteStore>, note: NoteInput) -> Result<SaveResponse, String> {
    let store = store.inner().clone();
    tauri::async_runtime::spawn_blocking(move || SaveResponse::from(store.save(note)))
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn note_delete(store: State<'_, NoteStore>, id: String) -> Result<DeleteResponse, String> {
    let store = store.inner().clone();
    tauri::async_runtime::spawn_blocking(move || DeleteResponse::from(store.delete(&id)))
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn notes_dir_path(store: State<'_, NoteStore>) -> String {
    store.dir().to_string_lossy().to_string()
}

#[tauri::command]
pub fn notes_dir_reveal(app: tauri::AppHandle, store: State<'_, NoteStore>) -> Result<(), String> {
    app.opener()
        .open_path(store.dir().to_string_lossy(), None::<&str>)
        .map_err(|e| e.to_string())
}
