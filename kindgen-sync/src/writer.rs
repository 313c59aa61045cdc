//! Atomic writer for generated files.
//!
//! 1. Normalise line endings to LF.
//! 2. Create the parent directory.
//! 3. Write to `<path>.kindgen.tmp`.
//! 4. Rename to the final path (atomic on POSIX).
//!
//! Generated files are always overwritten; change detection happens on the
//! template side, not here.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{io_err, GenError};

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written.
    Written { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path } | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Atomically write `content` to `path`, or only report it in dry-run mode.
pub fn atomic_write(path: &Path, content: &str, dry_run: bool) -> Result<WriteResult, GenError> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".kindgen.tmp");
    atomic_write_with_tmp(path, content, dry_run, Path::new(&tmp))
}

fn atomic_write_with_tmp(path: &Path, content: &str, dry_run: bool, tmp: &Path) -> Result<WriteResult, GenError> {
    if dry_run {
        info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    let normalized = content.replace("\r\n", "\n");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::write(tmp, &normalized).map_err(|e| io_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}
