use tauri::{AppHandle, Emitter, State};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tracing::{error, warn};

use crate::errors::{SessionResult, UserError};

use super::controller::{Controller, Section};
use super::{SessionState, SharedController};
use super::view::SessionView;

const REMOVE_LOCK_PROMPT: &str = "Remove password protection from this note?";
const DELETE_PROMPT: &str = "Are you sure you want to delete this note?";

fn lock_controller(
    controller: &SharedController,
) -> Result<std::sync::MutexGuard<'_, Controller>, String> {
    controller
        .lock()
        .map_err(|_| "session state poisoned".to_string())
}

async fn run<F>(state: &SessionState, op: F) -> Result<SessionView, String>
where
    F: FnOnce(&mut Controller) -> SessionResult<()> + Send + 'static,
{
    let controller = state.controller();
    tauri::async_runtime::spawn_blocking(move || -> Result<SessionView, String> {
        let mut guard = lock_controller(&controller)?;
        op(&mut *guard).map_err(|e| e.to_string())?;
        Ok(guard.view())
    })
    .await
    .map_err(|e| e.to_string())?
}

fn ask(app: &AppHandle, message: &str) -> bool {
    app.dialog()
        .message(message)
        .title("Jotter")
        .kind(MessageDialogKind::Warning)
        .buttons(MessageDialogButtons::OkCancel)
        .blocking_show()
}

/// Checks preconditions, asks the user, then runs `op` with the answer.
async fn run_confirmed<C, F>(
    app: AppHandle,
    state: &SessionState,
    message: &'static str,
    check: C,
    op: F,
) -> Result<SessionView, String>
where
    C: FnOnce(&Controller) -> Result<(), UserError> + Send + 'static,
    F: FnOnce(&mut Controller, bool) -> SessionResult<()> + Send + 'static,
{
    let controller = state.controller();
    tauri::async_runtime::spawn_blocking(move || -> Result<SessionView, String> {
        {
            let guard = lock_controller(&controller)?;
            check(&*guard).map_err(|e| e.to_string())?;
        }
        let confirmed = ask(&app, message);
        let mut guard = lock_controller(&controller)?;
        op(&mut *guard, confirmed).map_err(|e| e.to_string())?;
        Ok(guard.view())
    })
    .await
    .map_err(|e| e.to_string())?
}

/// Queues a save of the draft; a newer edit pushes the save back.
fn schedule_save(app: AppHandle, state: &SessionState) {
    let controller = state.controller();
    state.saves.schedule(move || {
        let Ok(mut guard) = controller.lock() else {
            warn!("session state poisoned, dropping debounced save");
            return;
        };
        match guard.flush() {
            Ok(true) => {
                let _ = app.emit("session:saved", guard.view());
            }
            Ok(false) => {}
            Err(e) => error!(error = %e, "error saving note"),
        }
    });
}

#[tauri::command]
pub async fn session_start(state: State<'_, SessionState>) -> Result<SessionView, String> {
    run(&state, |c| c.start()).await
}

#[tauri::command]
pub async fn session_view(state: State<'_, SessionState>) -> Result<SessionView, String> {
    run(&state, |_| Ok(())).await
}

#[tauri::command]
pub async fn session_select(state: State<'_, SessionState>, id: String) -> Result<SessionView, String> {
    run(&state, move |c| c.select(&id)).await
}

#[tauri::command]
pub async fn session_back(state: State<'_, SessionState>) -> Result<SessionView, String> {
    run(&state, |c| c.back()).await
}

#[tauri::command]
pub async fn session_set_section(
    state: State<'_, SessionState>,
    section: Section,
) -> Result<SessionView, String> {
    run(&state, move |c| c.set_section(section)).await
}

#[tauri::command]
pub async fn session_search(state: State<'_, SessionState>, query: String) -> Result<SessionView, String> {
    run(&state, move |c| {
        c.set_search(query);
        Ok(())
    })
    .await
}

#[tauri::command]
pub async fn session_unlock(
    state: State<'_, SessionState>,
    password: String,
) -> Result<SessionView, String> {
    run(&state, move |c| c.unlock(&password)).await
}

#[tauri::command]
pub async fn session_edit_title(
    app: AppHandle,
    state: State<'_, SessionState>,
    title: String,
) -> Result<SessionView, String> {
    let view = run(&state, move |c| c.edit_title(title)).await?;
    schedule_save(app, &state);
    Ok(view)
}

#[tauri::command]
pub async fn session_edit_content(
    app: AppHandle,
    state: State<'_, SessionState>,
    html: String,
) -> Result<SessionView, String> {
    let view = run(&state, move |c| c.edit_content(html)).await?;
    schedule_save(app, &state);
    Ok(view)
}

#[tauri::command]
pub async fn session_flush(state: State<'_, SessionState>) -> Result<SessionView, String> {
    state.saves.cancel();
    run(&state, |c| c.flush().map(|_| ())).await
}

#[tauri::command]
pub async fn session_new_note(state: State<'_, SessionState>) -> Result<SessionView, String> {
    run(&state, |c| c.new_note()).await
}

#[tauri::command]
pub async fn session_lock(state: State<'_, SessionState>, password: String) -> Result<SessionView, String> {
    let view = run(&state, move |c| c.lock(&password)).await?;
    state.saves.cancel();
    Ok(view)
}

#[tauri::command]
pub async fn session_remove_lock(
    app: AppHandle,
    state: State<'_, SessionState>,
) -> Result<SessionView, String> {
    run_confirmed(
        app,
        &state,
        REMOVE_LOCK_PROMPT,
        |c| c.check_remove_lock(),
        |c, confirmed| c.remove_lock(confirmed),
    )
    .await
}

#[tauri::command]
pub async fn session_toggle_archive(state: State<'_, SessionState>) -> Result<SessionView, String> {
    let view = run(&state, |c| c.toggle_archive()).await?;
    state.saves.cancel();
    Ok(view)
}

#[tauri::command]
pub async fn session_delete(app: AppHandle, state: State<'_, SessionState>) -> Result<SessionView, String> {
    run_confirmed(
        app,
        &state,
        DELETE_PROMPT,
        |c| c.check_delete(),
        |c, confirmed| c.delete(confirmed),
    )
    .await
}
