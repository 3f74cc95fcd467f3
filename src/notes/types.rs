use serde::{Deserialize, Serialize};

use crate::errors::{ParseError, StoreError};

pub const DEFAULT_TITLE: &str = "Untitled Note";

/// One persisted note record, `<id>.json` on disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    pub updated_at: i64,
    pub is_locked: bool,
    pub is_archived: bool,
    pub password: Option<String>,
}

/// A listed note tagged with the file it was read from.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct StoredNote {
    #[serde(flatten)]
    pub note: Note,
    pub filename: String,
}

/// What callers hand to `save`. Anything missing gets a default.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct NoteInput {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_locked: Option<bool>,
    pub is_archived: Option<bool>,
    pub password: Option<String>,
}

impl From<Note> for NoteInput {
    fn from(note: Note) -> Self {
        Self {
            id: Some(note.id),
            title: Some(note.title),
            content: Some(note.content),
            is_locked: Some(note.is_locked),
            is_archived: Some(note.is_archived),
            password: note.password,
        }
    }
}

impl NoteInput {
    /// Fills defaults and enforces the lock/password pairing.
    pub(crate) fn normalize(self, id: String, updated_at: i64) -> Result<Note, StoreError> {
        let is_locked = self.is_locked.unwrap_or(false);
        let password = if is_locked {
            let password = self
                .password
                .filter(|p| !p.is_empty())
                .ok_or(StoreError::MissingPassword)?;
            Some(password)
        } else {
            None
        };

        Ok(Note {
            id,
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content: self.content.unwrap_or_default(),
            updated_at,
            is_locked,
            is_archived: self.is_archived.unwrap_or(false),
            password,
        })
    }
}

/// Lenient on-disk shape: older or hand-edited records may miss fields.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawRecord {
    id: Option<String>,
    title: Option<String>,
    content: Option<String>,
    updated_at: Option<i64>,
    is_locked: Option<bool>,
    is_archived: Option<bool>,
    password: Option<String>,
}

impl RawRecord {
    /// Applies the same lock/password pairing as `NoteInput::normalize`.
    pub(crate) fn into_note(self, filename: &str, file_stem: &str) -> Result<Note, ParseError> {
        let is_locked = self.is_locked.unwrap_or(false);
        let password = if is_locked {
            let password = self.password.filter(|p| !p.is_empty()).ok_or_else(|| {
                ParseError::LockedWithoutPassword {
                    file: filename.to_string(),
                }
            })?;
            Some(password)
        } else {
            None
        };
        Ok(Note {
            id: self
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| file_stem.to_string()),
            title: self
                .title
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            content: self.content.unwrap_or_default(),
            updated_at: self.updated_at.unwrap_or(0),
            is_locked,
            is_archived: self.is_archived.unwrap_or(false),
            password,
        })
    }
}

#[derive(Serialize, Debug)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Note>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<Note, StoreError>> for SaveResponse {
    fn from(result: Result<Note, StoreError>) -> Self {
        match result {
            Ok(note) => Self {
                success: true,
                note: Some(note),
                error: None,
            },
            Err(e) => Self {
                success: false,
                note: None,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Serialize, Debug)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<Result<(), StoreError>> for DeleteResponse {
    fn from(result: Result<(), StoreError>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                error: None,
            },
            Err(e) => Self {
                success: false,
                error: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gets_defaults() {
        let note = NoteInput::default().normalize("n1".into(), 5).unwrap();
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(note.content, "");
        assert!(!note.is_locked);
        assert!(!note.is_archived);
        assert_eq!(note.password, None);
        assert_eq!(note.updated_at, 5);
    }

    #[test]
    fn unlocking_drops_the_password() {
        let input = NoteInput {
            is_locked: Some(false),
            password: Some("abc123".into()),
            ..Default::default()
        };
        assert_eq!(input.normalize("n1".into(), 1).unwrap().password, None);
    }

    #[test]
    fn locking_without_password_is_rejected() {
        for password in [None, Some(String::new())] {
            let input = NoteInput {
                is_locked: Some(true),
                password,
                ..Default::default()
            };
            assert!(matches!(
                input.normalize("n1".into(), 1),
                Err(StoreError::MissingPassword)
            ));
        }
    }

    #[test]
    fn record_serializes_with_camel_case_keys_and_null_password() {
        let note = NoteInput::default().normalize("n1".into(), 7).unwrap();
        let value = serde_json::to_value(&note).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "n1",
                "title": "Untitled Note",
                "content": "",
                "updatedAt": 7,
                "isLocked": false,
                "isArchived": false,
                "password": null
            })
        );
    }

    #[test]
    fn raw_record_falls_back_to_file_stem() {
        let raw: RawRecord = serde_json::from_str(r#"{"content":"<b>hi</b>"}"#).unwrap();
        let note = raw.into_note("legacy.json", "legacy").unwrap();
        assert_eq!(note.id, "legacy");
        assert_eq!(note.title, DEFAULT_TITLE);
        assert_eq!(note.updated_at, 0);
    }

    #[test]
    fn raw_record_pairs_password_with_lock() {
        let raw: RawRecord =
            serde_json::from_str(r#"{"isLocked":false,"password":"x"}"#).unwrap();
        assert_eq!(raw.into_note("a.json", "a").unwrap().password, None);

        for body in [r#"{"isLocked":true}"#, r#"{"isLocked":true,"password":""}"#] {
            let raw: RawRecord = serde_json::from_str(body).unwrap();
            assert!(matches!(
                raw.into_note("b.json", "b"),
                Err(ParseError::LockedWithoutPassword { file }) if file == "b.json"
            ));
        }
    }

    #[test]
    fn failed_save_reports_message_without_note() {
        let response = SaveResponse::from(Err(StoreError::NotFound("x".into())));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "success": false, "error": "note x does not exist" })
        );
    }
}
