//! Crash-safe replacement of the session file.
//!
//! The new contents go to a hidden sibling file which is synced and then
//! renamed over the target, so readers see either the old session or the
//! new one. On unix the file is readable by its owner only.

use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use camino::{Utf8Component, Utf8Path};
use cap_std::fs::{Dir, OpenOptions};

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Mode of the session file; it holds the bearer token.
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

/// Replace `file_name` inside `dir` with `contents`.
///
/// # Errors
///
/// Returns an [`io::Error`] when `file_name` is not a bare file name or when
/// the temporary file cannot be written, synced or renamed. The temporary
/// file is removed on failure.
pub(super) fn replace_file(dir: &Dir, file_name: &Utf8Path, contents: &[u8]) -> io::Result<()> {
    let mut components = file_name.components();
    let (Some(Utf8Component::Normal(name)), None) = (components.next(), components.next()) else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("session file must be a bare file name, got {file_name}"),
        ));
    };
    let staging = format!(
        ".{name}.{}.{}.tmp",
        std::process::id(),
        SEQUENCE.fetch_add(1, Ordering::Relaxed)
    );

    let outcome = write_synced(dir, &staging, contents)
        .and_then(|()| swap_into_place(dir, &staging, name));
    if outcome.is_err() && dir.remove_file(&staging).is_err() {
        // Staging file was never created or is already gone.
    }
    outcome?;

    if dir.open(".").and_then(|handle| handle.sync_all()).is_err() {
        // Directory sync is unsupported on some platforms.
    }
    Ok(())
}

fn write_synced(dir: &Dir, staging: &str, contents: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use cap_std::fs::OpenOptionsExt;
        options.mode(SESSION_FILE_MODE);
    }
    let mut file = dir.open_with(staging, &options)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(windows)]
fn swap_into_place(dir: &Dir, staging: &str, target: &str) -> io::Result<()> {
    match dir.remove_file(target) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => return Err(error),
        _ => {}
    }
    dir.rename(staging, dir, target)
}

#[cfg(not(windows))]
fn swap_into_place(dir: &Dir, staging: &str, target: &str) -> io::Result<()> {
    dir.rename(staging, dir, target)
}
