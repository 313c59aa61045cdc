//! Digest cache — SHA-256 change detection for template sources.
//!
//! Persists a [`DigestRecord`] JSON document, by default at
//! `<output_dir>/.gen/hashes.json`. Writes use the atomic `.tmp` + rename
//! pattern, so a crash never leaves a half-written record behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{io_err, GenError};

/// Template identity → hex digest of its source.
pub type Digests = BTreeMap<String, String>;

/// On-disk digest cache payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestRecord {
    pub generated_at: DateTime<Utc>,
    pub templates: Digests,
}

impl DigestRecord {
    /// An empty record, as seen on a cold start.
    pub fn empty() -> Self {
        DigestRecord {
            generated_at: Utc::now(),
            templates: Digests::new(),
        }
    }

    /// `true` when `identity` has no stored digest or a different one.
    pub fn is_changed(&self, identity: &str, digest: &str) -> bool {
        self.templates.get(identity).map(String::as_str) != Some(digest)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DigestRecordCompat {
    Structured(DigestRecordStructuredCompat),
    Legacy(Digests),
}

#[derive(Debug, Deserialize)]
struct DigestRecordStructuredCompat {
    pub generated_at: Option<DateTime<Utc>>,
    pub templates: Digests,
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of `bytes` with every CRLF read as LF.
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    let mut start = 0;
    for (i, pair) in bytes.windows(2).enumerate() {
        if pair == b"\r\n" {
            hasher.update(&bytes[start..i]);
            start = i + 1;
        }
    }
    hasher.update(&bytes[start..]);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Load the digest record at `path`.
///
/// A missing file is a cold start. An unreadable or corrupt file is logged
/// and also treated as a cold start, unless `strict` is set, in which case
/// it fails with [`GenError::CacheIo`].
pub fn load_at(path: &Path, strict: bool) -> Result<DigestRecord, GenError> {
    if !path.exists() {
        debug!("no digest cache at {}; cold start", path.display());
        return Ok(DigestRecord::empty());
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|contents| serde_json::from_str::<DigestRecordCompat>(&contents).map_err(|e| e.to_string()));
    match parsed {
        Ok(DigestRecordCompat::Structured(record)) => Ok(DigestRecord {
            generated_at: record.generated_at.unwrap_or_else(Utc::now),
            templates: record.templates,
        }),
        Ok(DigestRecordCompat::Legacy(templates)) => Ok(DigestRecord {
            generated_at: Utc::now(),
            templates,
        }),
        Err(message) if strict => Err(GenError::CacheIo {
            path: path.to_path_buf(),
            message,
        }),
        Err(message) => {
            warn!(
                "ignoring unusable digest cache at {} ({message}); regenerating everything",
                path.display()
            );
            Ok(DigestRecord::empty())
        }
    }
}

/// Save `record` to `path` atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(path: &Path, record: &DigestRecord) -> Result<(), GenError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(record)?;
    let tmp = tmp_path(path);
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
