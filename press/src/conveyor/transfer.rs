//! File moves between conveyor folders.

use std::fs;
use std::io;
use std::path::Path;

/// Move `from` to `to`, replacing `to` if it exists.
///
/// Falls back to copy + remove when a rename is refused, which happens when
/// the folders live on different volumes.
pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if from.exists() => {
            tracing::debug!(
                from = %from.display(),
                to = %to.display(),
                error = %e,
                "Rename failed, copying instead"
            );
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
        Err(e) => Err(e),
    }
}
