use std::path::{Component, Path, PathBuf};

use crate::errors::StoreError;

pub const NOTE_EXTENSION: &str = "json";

/// Ids double as file stems, so they must stay a single plain path component.
pub fn validate_note_id(id: &str) -> Result<(), StoreError> {
    let invalid = || StoreError::InvalidId(id.to_string());
    if id.trim().is_empty() || id.starts_with('.') {
        return Err(invalid());
    }
    if id.contains(['/', '\\']) {
        return Err(invalid());
    }
    let mut components = Path::new(id).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn note_file_name(id: &str) -> Result<String, StoreError> {
    validate_note_id(id)?;
    Ok(format!("{id}.{NOTE_EXTENSION}"))
}

pub fn note_path(notes_dir: &Path, id: &str) -> Result<PathBuf, StoreError> {
    Ok(notes_dir.join(note_file_name(id)?))
}

pub fn is_note_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(NOTE_EXTENSION)
        && !path
            .file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| name.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_uuid_ids() {
        let id = "0b6f3c9e-6d55-4c2b-9a51-3f3c1f0c9b7e";
        assert_eq!(
            note_file_name(id).unwrap(),
            "0b6f3c9e-6d55-4c2b-9a51-3f3c1f0c9b7e.json"
        );
    }

    #[test]
    fn rejects_ids_that_escape_the_notes_dir() {
        for id in ["", " ", "..", ".hidden", "a/b", "a\\b", "../x"] {
            assert!(
                matches!(validate_note_id(id), Err(StoreError::InvalidId(_))),
                "{id:?} should be rejected"
            );
        }
    }

    #[test]
    fn only_visible_json_files_are_notes() {
        assert!(is_note_file(Path::new("/n/abc.json")));
        assert!(!is_note_file(Path::new("/n/abc.md")));
        assert!(!is_note_file(Path::new("/n/.abc.json.tmp.1.2")));
        assert!(!is_note_file(Path::new("/n/.abc.json")));
    }
}
