//! Replace-by-rename file writes.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use cap_std::fs::{Dir, OpenOptions};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Write `contents` to `file_name` inside `dir` so readers only ever observe
/// the previous document or the complete new one.
///
/// The data goes to a hidden sibling file, is synced, and is then renamed over
/// the target. The temporary file is removed if any step fails.
pub(super) fn replace_file(dir: &Dir, file_name: &str, contents: &[u8]) -> io::Result<()> {
    let temp_name = format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    );

    let result = write_synced(dir, &temp_name, contents)
        .and_then(|()| rename_over(dir, &temp_name, file_name));
    if result.is_err() {
        drop(dir.remove_file(&temp_name));
        return result;
    }

    if let Err(err) = dir.open(".").and_then(|handle| handle.sync_all()) {
        tracing::debug!(error = %err, "directory sync skipped");
    }
    Ok(())
}

fn write_synced(dir: &Dir, name: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let mut file = dir.open_with(name, &options)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(windows)]
fn rename_over(dir: &Dir, from: &str, to: &str) -> io::Result<()> {
    match dir.remove_file(to) {
        Err(err) if err.kind() != io::ErrorKind::NotFound => return Err(err),
        _ => {}
    }
    dir.rename(from, dir, to)
}

#[cfg(not(windows))]
fn rename_over(dir: &Dir, from: &str, to: &str) -> io::Result<()> {
    dir.rename(from, dir, to)
}
