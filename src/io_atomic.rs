use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
};

use crate::utils::now_ms;

const TMP_MARKER: &str = ".tmp.";

fn fsync_dir(path: &Path) -> io::Result<()> {
    // Directories cannot be opened for syncing on Windows.
    if cfg!(windows) {
        return Ok(());
    }
    File::open(path)?.sync_all()
}

fn unique_tmp_path(dest: &Path) -> io::Result<PathBuf> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;
    let file_name = dest
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no filename"))?;

    let tmp_name = format!(
        ".{}{TMP_MARKER}{}.{}",
        file_name.to_string_lossy(),
        std::process::id(),
        now_ms()
    );
    Ok(parent.join(tmp_name))
}

/// Writes `bytes` to a hidden sibling and renames it over `dest`, so readers
/// see either the old record or the new one.
pub fn write_atomic(dest: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no parent"))?;

    let tmp = unique_tmp_path(dest)?;
    let written = (|| -> io::Result<()> {
        let mut f = File::create(&tmp)?;
        f.write_all(bytes)?;
        f.sync_all()?;
        std::fs::rename(&tmp, dest)
    })();
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }

    fsync_dir(parent)
}

pub fn is_stale_tmp(file_name: &str) -> bool {
    file_name.starts_with('.') && file_name.contains(TMP_MARKER)
}

/// Removes temp files left behind by writes that died before the rename.
pub fn cleanup_tmp_files(dir: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if is_stale_tmp(name) && std::fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    removed
}
