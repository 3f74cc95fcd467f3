use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::errors::{ParseError, StoreError};
use crate::{io_atomic, paths, utils};

use super::types::{Note, NoteInput, RawRecord, StoredNote};

/// One JSON file per note inside a single directory.
#[derive(Clone, Debug)]
pub struct NoteStore {
    dir: PathBuf,
}

impl NoteStore {
    /// Creates the directory when missing. Called once at startup.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let removed = io_atomic::cleanup_tmp_files(&dir);
        if removed > 0 {
            info!(removed, dir = %dir.display(), "removed stale temp files");
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn list_all(&self) -> Result<Vec<StoredNote>, StoreError> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            let path = entry.path();
            if !paths::is_note_file(&path) {
                continue;
            }
            let bytes = match std::fs::read(&path) {
                Ok(b) => b,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable note");
                    continue;
                }
            };
            match parse_record(&path, &bytes) {
                Ok(stored) => out.push(stored),
                Err(e) => warn!(error = %e, "skipping note"),
            }
        }

        out.sort_by(|a, b| b.note.updated_at.cmp(&a.note.updated_at));
        Ok(out)
    }

    pub fn save(&self, input: NoteInput) -> Result<Note, StoreError> {
        let id = match input.id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let path = paths::note_path(&self.dir, &id)?;
        let note = input.normalize(id, utils::now_ms())?;

        let bytes = serde_json::to_vec_pretty(&note)?;
        io_atomic::write_atomic(&path, &bytes).map_err(|e| {
            error!(id = %note.id, error = %e, "error saving note");
            e
        })?;
        debug!(id = %note.id, "saved note");
        Ok(note)
    }

    pub fn delete(&self, id: &str) -> Result<(), StoreError> {
        let path = paths::note_path(&self.dir, id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(id, "deleted note");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(id.to_string()))
            }
            Err(e) => {
                error!(id, error = %e, "error deleting note");
                Err(e.into())
            }
        }
    }
}

fn parse_record(path: &Path, bytes: &[u8]) -> Result<StoredNote, ParseError> {
    let filename = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let raw: RawRecord = serde_json::from_slice(bytes).map_err(|source| ParseError::Json {
        file: filename.clone(),
        source,
    })?;
    Ok(StoredNote {
        note: raw.into_note(&filename, &stem)?,
        filename,
    })
}
