use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{SessionResult, StoreError, UserError};
use crate::notes::types::{Note, NoteInput, StoredNote};
use crate::notes::NoteStore;

use super::view::{list_item, CurrentNoteView, SessionView, ViewState};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    #[default]
    Active,
    Locked,
    Archive,
    Settings,
}

impl Section {
    pub fn contains(self, note: &Note) -> bool {
        match self {
            Self::Active => !note.is_archived && !note.is_locked,
            Self::Locked => note.is_locked,
            Self::Archive => note.is_archived,
            Self::Settings => false,
        }
    }
}

/// Case-insensitive substring match. Locked bodies are never searched.
pub fn matches_search(note: &Note, query: &str) -> bool {
    let query = query.to_lowercase();
    if note.title.to_lowercase().contains(&query) {
        return true;
    }
    !note.is_locked && note.content.to_lowercase().contains(&query)
}

pub fn visible_notes<'a>(
    notes: &'a [StoredNote],
    section: Section,
    query: &str,
) -> impl Iterator<Item = &'a Note> + 'a {
    let query = query.to_string();
    notes
        .iter()
        .map(|stored| &stored.note)
        .filter(move |note| section.contains(note) && matches_search(note, &query))
}

/// Unsaved edits for the selected note. `content` stays `None` while the
/// note is locked and hidden, so locked bodies never reach the edit buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: Option<String>,
    pub dirty: bool,
}

impl Draft {
    fn for_note(note: &Note, state: ViewState) -> Self {
        Self {
            title: note.title.clone(),
            content: state.is_editable().then(|| note.content.clone()),
            dirty: false,
        }
    }
}

/// Selection, filtering and edit-session state over the notes in the store.
pub struct Controller {
    store: NoteStore,
    notes: Vec<StoredNote>,
    current: Option<Note>,
    state: ViewState,
    draft: Draft,
    section: Section,
    search_query: String,
}

impl Controller {
    pub fn new(store: NoteStore) -> Self {
        Self {
            store,
            notes: Vec::new(),
            current: None,
            state: ViewState::Unselected,
            draft: Draft::default(),
            section: Section::Active,
            search_query: String::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> ViewState {
        self.state
    }

    #[cfg(test)]
    pub fn section(&self) -> Section {
        self.section
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&Note> {
        self.current.as_ref()
    }

    #[cfg(test)]
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    #[cfg(test)]
    pub fn notes(&self) -> &[StoredNote] {
        &self.notes
    }

    pub fn reload(&mut self) -> Result<(), StoreError> {
        self.notes = self.store.list_all()?;
        Ok(())
    }

    /// Re-reads the listing after a write that already succeeded. A failure
    /// keeps the in-memory list so the caller can finish its transition.
    fn refresh(&mut self) {
        if let Err(e) = self.reload() {
            warn!(error = %e, "note list not refreshed");
        }
    }

    /// Initial load: selects the newest note, or creates one in an empty store.
    pub fn start(&mut self) -> SessionResult<()> {
        self.reload()?;
        match self.notes.first().map(|s| s.note.id.clone()) {
            Some(id) => self.select(&id),
            None => self.new_note(),
        }
    }

    pub fn select(&mut self, id: &str) -> SessionResult<()> {
        self.flush()?;
        let note = self
            .notes
            .iter()
            .find(|s| s.note.id == id)
            .map(|s| s.note.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.show(note);
        Ok(())
    }

    pub fn back(&mut self) -> SessionResult<()> {
        self.flush()?;
        self.deselect();
        Ok(())
    }

    pub fn set_section(&mut self, section: Section) -> SessionResult<()> {
        self.flush()?;
        self.section = section;
        self.deselect();
        Ok(())
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn unlock(&mut self, password: &str) -> SessionResult<()> {
        let note = self.current.as_ref().ok_or(UserError::NoSelection)?;
        match self.state {
            ViewState::SelectedLockedHidden => {}
            ViewState::SelectedLockedRevealed => return Ok(()),
            _ => return Err(UserError::NotLocked.into()),
        }
        if note.password.as_deref() != Some(password) {
            debug!(id = %note.id, "unlock attempt rejected");
            return Err(UserError::IncorrectPassword.into());
        }
        self.draft.content = Some(note.content.clone());
        self.state = ViewState::SelectedLockedRevealed;
        Ok(())
    }

    pub fn edit_title(&mut self, title: impl Into<String>) -> SessionResult<()> {
        self.ensure_editable()?;
        self.draft.title = title.into();
        self.draft.dirty = true;
        Ok(())
    }

    pub fn edit_content(&mut self, html: impl Into<String>) -> SessionResult<()> {
        self.ensure_editable()?;
        self.draft.content = Some(html.into());
        self.draft.dirty = true;
        Ok(())
    }

    /// Commits a dirty draft. Returns whether anything was written.
    pub fn flush(&mut self) -> SessionResult<bool> {
        if !self.draft.dirty || self.current.is_none() {
            return Ok(false);
        }
        self.commit(|_| {})?;
        Ok(true)
    }

    pub fn new_note(&mut self) -> SessionResult<()> {
        self.flush()?;
        let note = self.store.save(NoteInput {
            title: Some(String::new()),
            content: Some(String::new()),
            is_locked: Some(false),
            is_archived: Some(false),
            ..Default::default()
        })?;
        info!(id = %note.id, "created note");
        self.section = Section::Active;
        self.notes.insert(0, stored(&note));
        self.refresh();
        self.show(note);
        Ok(())
    }

    /// Protects the selected note. The note is deselected afterwards so its
    /// content does not stay on screen.
    pub fn lock(&mut self, password: &str) -> SessionResult<()> {
        let note = self.current.as_ref().ok_or(UserError::NoSelection)?;
        if note.is_locked {
            return Err(UserError::AlreadyLocked.into());
        }
        if password.is_empty() {
            return Err(UserError::EmptyPassword.into());
        }
        let password = password.to_string();
        self.commit(move |input| {
            input.is_locked = Some(true);
            input.password = Some(password);
        })?;
        self.deselect();
        Ok(())
    }

    /// Preconditions for removing protection, checked before asking the user.
    pub fn check_remove_lock(&self) -> Result<(), UserError> {
        let note = self.current.as_ref().ok_or(UserError::NoSelection)?;
        if !note.is_locked {
            return Err(UserError::NotLocked);
        }
        if self.state == ViewState::SelectedLockedHidden {
            return Err(UserError::ContentHidden);
        }
        Ok(())
    }

    pub fn remove_lock(&mut self, confirmed: bool) -> SessionResult<()> {
        self.check_remove_lock()?;
        if !confirmed {
            return Err(UserError::Declined.into());
        }
        let note = self.commit(|input| {
            input.is_locked = Some(false);
            input.password = None;
        })?;
        self.show(note);
        Ok(())
    }

    pub fn toggle_archive(&mut self) -> SessionResult<()> {
        let archived = !self
            .current
            .as_ref()
            .ok_or(UserError::NoSelection)?
            .is_archived;
        let note = self.commit(|input| input.is_archived = Some(archived))?;
        if archived {
            self.section = Section::Archive;
        } else if self.section == Section::Archive {
            self.section = Section::Active;
        }
        self.show(note);
        Ok(())
    }

    pub fn check_delete(&self) -> Result<(), UserError> {
        if self.current.is_none() {
            return Err(UserError::NoSelection);
        }
        if self.state == ViewState::SelectedLockedHidden {
            return Err(UserError::NoteHidden);
        }
        Ok(())
    }

    pub fn delete(&mut self, confirmed: bool) -> SessionResult<()> {
        self.check_delete()?;
        if !confirmed {
            return Err(UserError::Declined.into());
        }
        let id = self
            .current
            .as_ref()
            .map(|n| n.id.clone())
            .ok_or(UserError::NoSelection)?;
        self.store.delete(&id)?;
        self.deselect();
        self.notes.retain(|s| s.note.id != id);
        self.refresh();

        let next = visible_notes(&self.notes, Section::Active, "")
            .next()
            .cloned();
        if let Some(next) = next {
            self.show(next);
        }
        Ok(())
    }

    pub fn view(&self) -> SessionView {
        let current_id = self.current.as_ref().map(|n| n.id.as_str());
        let notes = visible_notes(&self.notes, self.section, &self.search_query)
            .map(|note| list_item(note, current_id))
            .collect();
        let current = self.current.as_ref().map(|note| CurrentNoteView {
            id: note.id.clone(),
            title: self.draft.title.clone(),
            content: self.draft.content.clone(),
            editable: self.state.is_editable(),
            locked_overlay: self.state == ViewState::SelectedLockedHidden,
            is_locked: note.is_locked,
            is_archived: note.is_archived,
        });
        SessionView {
            section: self.section,
            search_query: self.search_query.clone(),
            state: self.state,
            notes,
            current,
            show_settings: self.section == Section::Settings,
        }
    }

    fn ensure_editable(&self) -> Result<(), UserError> {
        match self.state {
            ViewState::Unselected => Err(UserError::NoSelection),
            ViewState::SelectedLockedHidden => Err(UserError::ContentHidden),
            _ => Ok(()),
        }
    }

    /// Saves the selected note with the draft applied. Nothing changes in
    /// memory when the store rejects the write.
    fn commit(&mut self, modify: impl FnOnce(&mut NoteInput)) -> SessionResult<Note> {
        let current = self.current.clone().ok_or(UserError::NoSelection)?;
        let mut input = NoteInput::from(current);
        input.title = Some(self.draft.title.clone());
        if self.state != ViewState::SelectedLockedHidden {
            if let Some(content) = &self.draft.content {
                input.content = Some(content.clone());
            }
        }
        modify(&mut input);

        let saved = self.store.save(input)?;
        self.draft.title = saved.title.clone();
        self.draft.dirty = false;
        self.current = Some(saved.clone());
        match self.notes.iter_mut().find(|s| s.note.id == saved.id) {
            Some(entry) => entry.note = saved.clone(),
            None => self.notes.insert(0, stored(&saved)),
        }
        self.refresh();
        Ok(saved)
    }

    fn show(&mut self, note: Note) {
        self.state = ViewState::for_note(&note);
        self.draft = Draft::for_note(&note, self.state);
        self.current = Some(note);
    }

    fn deselect(&mut self) {
        self.current = None;
        self.state = ViewState::Unselected;
        self.draft = Draft::default();
    }
}

fn stored(note: &Note) -> StoredNote {
    StoredNote {
        note: note.clone(),
        filename: format!("{}.{}", note.id, crate::paths::NOTE_EXTENSION),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SessionError;

    fn controller() -> (tempfile::TempDir, Controller) {
        let dir = tempfile::tempdir().unwrap();
        let store = NoteStore::open(dir.path()).unwrap();
        (dir, Controller::new(store))
    }

    fn user_err(result: SessionResult<()>) -> UserError {
        match result {
            Err(SessionError::User(e)) => e,
            other => panic!("expected user error, got {other:?}"),
        }
    }

    fn visible_ids(c: &Controller) -> Vec<String> {
        c.view().notes.into_iter().map(|n| n.id).collect()
    }

    fn note_with(c: &mut Controller, title: &str, content: &str) -> String {
        c.new_note().unwrap();
        c.edit_title(title).unwrap();
        c.edit_content(content).unwrap();
        c.flush().unwrap();
        c.current().unwrap().id.clone()
    }

    #[test]
    fn start_on_empty_store_creates_a_note() {
        let (_tmp, mut c) = controller();
        c.start().unwrap();
        assert_eq!(c.notes().len(), 1);
        assert_eq!(c.state(), ViewState::SelectedUnlocked);
        let current = c.current().unwrap();
        assert_eq!(current.title, "Untitled Note");
        assert_eq!(current.content, "");
        assert!(!current.is_locked && !current.is_archived);
        assert_eq!(current.password, None);
    }

    #[test]
    fn start_selects_newest_note() {
        let (_tmp, mut c) = controller();
        note_with(&mut c, "older", "");
        std::thread::sleep(std::time::Duration::from_millis(2));
        let newest = note_with(&mut c, "newer", "");
        c.back().unwrap();

        c.start().unwrap();
        assert_eq!(c.current().unwrap().id, newest);
    }

    #[test]
    fn draft_is_persisted_on_flush_only() {
        let (_tmp, mut c) = controller();
        c.new_note().unwrap();
        c.edit_title("Shopping").unwrap();
        c.edit_content("<p>milk</p>").unwrap();
        assert_eq!(c.notes()[0].note.title, "Untitled Note");

        assert!(c.flush().unwrap());
        assert_eq!(c.notes()[0].note.title, "Shopping");
        assert_eq!(c.notes()[0].note.content, "<p>milk</p>");
        assert!(!c.flush().unwrap());
    }

    #[test]
    fn lock_then_unlock_with_password() {
        let (_tmp, mut c) = controller();
        let id = note_with(&mut c, "Diary", "<p>dear diary</p>");

        c.lock("abc123").unwrap();
        assert_eq!(c.state(), ViewState::Unselected);
        let stored = &c.notes()[0].note;
        assert!(stored.is_locked);
        assert_eq!(stored.password.as_deref(), Some("abc123"));

        c.set_section(Section::Locked).unwrap();
        c.select(&id).unwrap();
        assert_eq!(c.state(), ViewState::SelectedLockedHidden);
        assert_eq!(c.view().current.unwrap().content, None);

        assert_eq!(user_err(c.unlock("wrong")), UserError::IncorrectPassword);
        assert_eq!(c.state(), ViewState::SelectedLockedHidden);
        assert_eq!(c.draft().content, None);
        assert_eq!(
            user_err(c.edit_content("<p>overwrite</p>")),
            UserError::ContentHidden
        );

        c.unlock("abc123").unwrap();
        assert_eq!(c.state(), ViewState::SelectedLockedRevealed);
        let view = c.view().current.unwrap();
        assert!(view.editable);
        assert_eq!(view.content.as_deref(), Some("<p>dear diary</p>"));
        c.edit_content("<p>revised</p>").unwrap();
        c.flush().unwrap();
        assert_eq!(c.notes()[0].note.content, "<p>revised</p>");
        assert!(c.notes()[0].note.is_locked);
    }

    #[test]
    fn locking_requires_a_password() {
        let (_tmp, mut c) = controller();
        note_with(&mut c, "x", "");
        assert_eq!(user_err(c.lock("")), UserError::EmptyPassword);
        assert!(!c.notes()[0].note.is_locked);
        assert_eq!(c.state(), ViewState::SelectedUnlocked);
    }

    #[test]
    fn lock_captures_pending_edits() {
        let (_tmp, mut c) = controller();
        c.new_note().unwrap();
        c.edit_content("<p>typed just now</p>").unwrap();
        c.lock("pw").unwrap();
        assert_eq!(c.notes()[0].note.content, "<p>typed just now</p>");
    }

    #[test]
    fn removing_lock_needs_reveal_and_confirmation() {
        let (_tmp, mut c) = controller();
        let id = note_with(&mut c, "x", "<p>body</p>");
        c.lock("pw").unwrap();
        c.select(&id).unwrap();

        assert_eq!(user_err(c.remove_lock(true)), UserError::ContentHidden);
        c.unlock("pw").unwrap();
        assert_eq!(user_err(c.remove_lock(false)), UserError::Declined);
        assert!(c.notes()[0].note.is_locked);

        c.remove_lock(true).unwrap();
        assert_eq!(c.state(), ViewState::SelectedUnlocked);
        let stored = &c.notes()[0].note;
        assert!(!stored.is_locked);
        assert_eq!(stored.password, None);
        assert_eq!(stored.content, "<p>body</p>");
    }

    #[test]
    fn archiving_moves_note_between_sections() {
        let (_tmp, mut c) = controller();
        let id = note_with(&mut c, "Old plan", "");
        assert_eq!(visible_ids(&c), vec![id.clone()]);

        c.toggle_archive().unwrap();
        assert!(c.notes()[0].note.is_archived);
        assert_eq!(c.section(), Section::Archive);
        assert_eq!(c.current().unwrap().id, id);
        assert_eq!(visible_ids(&c), vec![id.clone()]);

        c.set_section(Section::Active).unwrap();
        assert!(visible_ids(&c).is_empty());

        c.set_section(Section::Archive).unwrap();
        c.select(&id).unwrap();
        c.toggle_archive().unwrap();
        assert_eq!(c.section(), Section::Active);
        assert_eq!(visible_ids(&c), vec![id]);
    }

    #[test]
    fn unarchiving_outside_archive_keeps_section() {
        let (_tmp, mut c) = controller();
        let id = note_with(&mut c, "x", "");
        c.lock("pw").unwrap();
        c.set_section(Section::Locked).unwrap();
        c.select(&id).unwrap();
        c.toggle_archive().unwrap();
        c.set_section(Section::Locked).unwrap();
        c.select(&id).unwrap();

        c.toggle_archive().unwrap();
        assert_eq!(c.section(), Section::Locked);
        assert_eq!(c.state(), ViewState::SelectedLockedHidden);
    }

    #[test]
    fn delete_refused_while_hidden() {
        let (_tmp, mut c) = controller();
        let id = note_with(&mut c, "x", "");
        c.lock("pw").unwrap();
        c.select(&id).unwrap();
        assert_eq!(user_err(c.delete(true)), UserError::NoteHidden);
        assert_eq!(c.notes().len(), 1);
    }

    #[test]
    fn delete_selects_first_active_note() {
        let (_tmp, mut c) = controller();
        let keep = note_with(&mut c, "keep", "");
        std::thread::sleep(std::time::Duration::from_millis(2));
        note_with(&mut c, "drop", "");

        assert_eq!(user_err(c.delete(false)), UserError::Declined);
        c.delete(true).unwrap();
        assert_eq!(c.notes().len(), 1);
        assert_eq!(c.current().unwrap().id, keep);
    }

    #[test]
    fn search_hides_locked_body_matches() {
        let (_tmp, mut c) = controller();
        note_with(&mut c, "Bank", "<p>pin 4242</p>");
        c.lock("pw").unwrap();
        c.set_section(Section::Locked).unwrap();

        c.set_search("4242");
        assert!(visible_ids(&c).is_empty());
        c.set_search("BANK");
        assert_eq!(visible_ids(&c).len(), 1);
    }

    #[test]
    fn settings_section_lists_nothing() {
        let (_tmp, mut c) = controller();
        note_with(&mut c, "x", "");
        c.set_section(Section::Settings).unwrap();
        let view = c.view();
        assert!(view.show_settings);
        assert!(view.notes.is_empty());
        assert_eq!(view.state, ViewState::Unselected);
    }

    #[test]
    fn switching_notes_flushes_the_draft() {
        let (_tmp, mut c) = controller();
        let first = note_with(&mut c, "first", "");
        c.new_note().unwrap();
        c.edit_title("second").unwrap();
        c.select(&first).unwrap();
        assert!(c.notes().iter().any(|s| s.note.title == "second"));
    }

    #[test]
    fn failed_save_leaves_state_untouched() {
        let (tmp, mut c) = controller();
        let id = note_with(&mut c, "x", "<p>a</p>");
        c.edit_content("<p>b</p>").unwrap();

        std::fs::remove_dir_all(tmp.path()).unwrap();
        assert!(matches!(c.flush(), Err(SessionError::Store(_))));
        assert!(c.draft().dirty);
        assert_eq!(c.current().unwrap().id, id);
        assert_eq!(c.current().unwrap().content, "<p>a</p>");
    }


    #[test]
    fn new_note_returns_to_active_section() {
        let (_tmp, mut c) = controller();
        for section in [Section::Archive, Section::Locked, Section::Settings] {
            c.set_section(section).unwrap();
            c.new_note().unwrap();
            assert_eq!(c.section(), Section::Active);
            assert_eq!(c.state(), ViewState::SelectedUnlocked);
        }
    }

    #[test]
    fn deleting_last_active_note_leaves_nothing_selected() {
        let (_tmp, mut c) = controller();
        c.new_note().unwrap();
        c.toggle_archive().unwrap();
        assert_eq!(c.section(), Section::Archive);

        c.new_note().unwrap();
        assert_eq!(c.section(), Section::Active);
        c.delete(true).unwrap();

        assert_eq!(c.state(), ViewState::Unselected);
        assert!(c.current().is_none());
        assert_eq!(c.section(), Section::Active);
        assert_eq!(c.notes().len(), 1);
        assert!(c.notes()[0].note.is_archived);
    }

    #[test]
    fn deleting_a_vanished_note_keeps_the_selection() {
        let (tmp, mut c) = controller();
        let id = note_with(&mut c, "x", "");
        std::fs::remove_file(tmp.path().join(format!("{id}.json"))).unwrap();

        assert!(matches!(
            c.delete(true),
            Err(SessionError::Store(StoreError::NotFound(missing))) if missing == id
        ));
        assert_eq!(c.current().unwrap().id, id);
        assert_eq!(c.state(), ViewState::SelectedUnlocked);
    }

    #[test]
    fn unlocking_a_revealed_note_changes_nothing() {
        let (_tmp, mut c) = controller();
        let id = note_with(&mut c, "x", "<p>a</p>");
        c.lock("pw").unwrap();
        c.select(&id).unwrap();
        c.unlock("pw").unwrap();
        c.edit_content("<p>b</p>").unwrap();

        c.unlock("not the password").unwrap();
        assert_eq!(c.state(), ViewState::SelectedLockedRevealed);
        assert_eq!(c.draft().content.as_deref(), Some("<p>b</p>"));
        assert!(c.draft().dirty);
    }

    #[test]
    fn refresh_failure_keeps_the_listing() {
        let (tmp, mut c) = controller();
        let id = note_with(&mut c, "x", "");
        std::fs::remove_dir_all(tmp.path()).unwrap();

        c.refresh();
        assert_eq!(c.notes().len(), 1);
        assert_eq!(c.notes()[0].note.id, id);
    }

    fn note(id: &str, locked: bool, archived: bool) -> StoredNote {
        StoredNote {
            note: Note {
                id: id.to_string(),
                title: format!("Title {id}"),
                content: format!("<p>body of {id}</p>"),
                updated_at: 0,
                is_locked: locked,
                is_archived: archived,
                password: locked.then(|| "pw".to_string()),
            },
            filename: format!("{id}.json"),
        }
    }

    fn ids(notes: &[StoredNote], section: Section, query: &str) -> Vec<String> {
        visible_notes(notes, section, query)
            .map(|n| n.id.clone())
            .collect()
    }

    #[test]
    fn sections_partition_by_flags() {
        let notes = vec![
            note("plain", false, false),
            note("locked", true, false),
            note("archived", false, true),
            note("both", true, true),
        ];
        assert_eq!(ids(&notes, Section::Active, ""), vec!["plain"]);
        assert_eq!(ids(&notes, Section::Locked, ""), vec!["locked", "both"]);
        assert_eq!(ids(&notes, Section::Archive, ""), vec!["archived", "both"]);
        assert!(ids(&notes, Section::Settings, "").is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_content() {
        let notes = vec![note("a", false, false), note("b", false, false)];
        assert_eq!(ids(&notes, Section::Active, "TITLE A"), vec!["a"]);
        assert_eq!(ids(&notes, Section::Active, "Body Of B"), vec!["b"]);
    }

    #[test]
    fn search_never_looks_inside_locked_content() {
        let notes = vec![note("secret", true, false)];
        assert!(ids(&notes, Section::Locked, "body of secret").is_empty());
        assert_eq!(ids(&notes, Section::Locked, "title secret"), vec!["secret"]);
    }

    #[test]
    fn section_serializes_as_snake_case() {
        assert_eq!(serde_json::to_string(&Section::Archive).unwrap(), "\"archive\"");
        let parsed: Section = serde_json::from_str("\"locked\"").unwrap();
        assert_eq!(parsed, Section::Locked);
    }
}
