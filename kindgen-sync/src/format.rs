//! Optional external source-formatting step.
//!
//! Runs `<command> <args...> <files...>` from the manifest directory, in
//! chunks of `chunk_size` files to stay under command-line length limits.
//! Formatter problems are logged as warnings and never fail a run.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{info, warn};

use kindgen_core::FormatterConfig;

/// What the formatting step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// Nothing to format, or formatting not requested.
    Skipped,
    /// Every chunk ran and exited successfully.
    Formatted { files: usize, chunks: usize },
    /// The step stopped early; files are left unformatted.
    Failed { reason: String },
}

/// Format `files` with `formatter`, running from `cwd`.
pub fn format_files(formatter: &FormatterConfig, cwd: &Path, files: &[PathBuf]) -> FormatOutcome {
    if files.is_empty() {
        return FormatOutcome::Skipped;
    }
    info!("Formatting {} generated file(s) with {}...", files.len(), formatter.command);

    let mut chunks = 0;
    for chunk in files.chunks(formatter.chunk_size.max(1)) {
        let status = Command::new(&formatter.command)
            .args(&formatter.args)
            .args(chunk)
            .current_dir(cwd)
            .status();
        let reason = match status {
            Ok(status) if status.success() => {
                chunks += 1;
                continue;
            }
            Ok(status) => format!("{} exited with {status}", formatter.command),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                format!("formatter '{}' not found", formatter.command)
            }
            Err(e) => format!("failed to run {}: {e}", formatter.command),
        };
        warn!("{reason}; generated files left unformatted");
        return FormatOutcome::Failed { reason };
    }
    FormatOutcome::Formatted {
        files: files.len(),
        chunks,
    }
}
