use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use time::{macros::format_description, OffsetDateTime, UtcOffset};

use crate::notes::types::Note;

use super::controller::Section;

const PREVIEW_CHARS: usize = 50;

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViewState {
    Unselected,
    SelectedUnlocked,
    SelectedLockedHidden,
    SelectedLockedRevealed,
}

impl ViewState {
    pub fn for_note(note: &Note) -> Self {
        if note.is_locked {
            Self::SelectedLockedHidden
        } else {
            Self::SelectedUnlocked
        }
    }

    pub fn is_editable(self) -> bool {
        matches!(self, Self::SelectedUnlocked | Self::SelectedLockedRevealed)
    }
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct NoteListItem {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub time_label: String,
    pub active: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct CurrentNoteView {
    pub id: String,
    pub title: String,
    /// `None` while the lock overlay is up.
    pub content: Option<String>,
    pub editable: bool,
    pub locked_overlay: bool,
    pub is_locked: bool,
    pub is_archived: bool,
}

#[derive(Serialize, Clone, Debug)]
pub struct SessionView {
    pub section: Section,
    pub search_query: String,
    pub state: ViewState,
    pub notes: Vec<NoteListItem>,
    pub current: Option<CurrentNoteView>,
    pub show_settings: bool,
}

pub fn list_item(note: &Note, current_id: Option<&str>) -> NoteListItem {
    NoteListItem {
        id: note.id.clone(),
        title: if note.title.is_empty() {
            "Untitled".to_string()
        } else {
            note.title.clone()
        },
        preview: preview(note),
        time_label: time_label(note.updated_at),
        active: current_id == Some(note.id.as_str()),
    }
}

pub fn preview(note: &Note) -> String {
    if note.is_locked {
        return "Locked Note".to_string();
    }
    let text: String = plain_text(&note.content).chars().take(PREVIEW_CHARS).collect();
    if text.is_empty() {
        "No content".to_string()
    } else {
        text
    }
}

fn tag_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").ok()).as_ref()
}

/// Text content of an HTML fragment: tags dropped, common entities decoded.
pub fn plain_text(html: &str) -> String {
    let stripped = match tag_re() {
        Some(re) => re.replace_all(html, "").into_owned(),
        None => html.to_string(),
    };
    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn time_label(updated_at_ms: i64) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(updated_at_ms) * 1_000_000)
        .ok()
        .and_then(|t| t.to_offset(offset).format(format_description!("[hour]:[minute]")).ok())
        .unwrap_or_default()
}
