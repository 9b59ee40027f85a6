//! False-positive cache.
//!
//! A persistent mapping of `site:username` to rejection count. Loaded once
//! at run start, incremented in memory on every rejection, and written back
//! at completion and on interrupt. Counts only ever grow within a run;
//! deleting the file on disk is the only way to reset them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error_handling::PersistenceError;

struct CacheInner {
    counts: HashMap<String, u32>,
    dirty: bool,
}

/// Mutex-guarded rejection history, shared across workers via `Arc`.
pub struct FalsePositiveCache {
    path: PathBuf,
    inner: Mutex<CacheInner>,
}

impl FalsePositiveCache {
    /// Loads the cache from disk.
    ///
    /// A missing file yields an empty cache; a corrupt one is logged and
    /// replaced by an empty cache rather than aborting the run.
    pub fn load(path: &Path) -> Self {
        let counts = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, u32>>(&raw) {
                Ok(counts) => counts,
                Err(e) => {
                    log::warn!(
                        "false-positive cache at {} is corrupt ({e}); starting empty",
                        path.display()
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        if !counts.is_empty() {
            log::info!(
                "Loaded {} false-positive entries from {}",
                counts.len(),
                path.display()
            );
        }

        FalsePositiveCache {
            path: path.to_path_buf(),
            inner: Mutex::new(CacheInner {
                counts,
                dirty: false,
            }),
        }
    }

    /// Composite cache key for a site/username pair.
    pub fn key(site: &str, username: &str) -> String {
        format!("{site}:{username}")
    }

    /// Historical rejection count for a site/username pair.
    pub fn hits(&self, site: &str, username: &str) -> u32 {
        let inner = self.inner.lock().expect("fp cache lock poisoned");
        inner
            .counts
            .get(&Self::key(site, username))
            .copied()
            .unwrap_or(0)
    }

    /// Increments the rejection count for a pair, returning the new count.
    pub fn record_rejection(&self, site: &str, username: &str) -> u32 {
        let mut inner = self.inner.lock().expect("fp cache lock poisoned");
        let count = inner.counts.entry(Self::key(site, username)).or_insert(0);
        *count += 1;
        let count = *count;
        inner.dirty = true;
        count
    }

    /// Number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("fp cache lock poisoned").counts.len()
    }

    /// True when the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes the cache back to disk if it changed since the last flush.
    ///
    /// The write goes to a sibling temp file first and is renamed into
    /// place, so an interrupt mid-write cannot leave a half-written cache.
    /// On failure the dirty flag stays set and the write is retried at the
    /// next flush point.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().expect("fp cache lock poisoned");
        if !inner.dirty {
            return Ok(());
        }

        let payload = serde_json::to_string_pretty(&inner.counts).map_err(|source| {
            PersistenceError::Serialize {
                what: "false-positive cache",
                source,
            }
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload).map_err(|source| PersistenceError::Write {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &self.path).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })?;

        inner.dirty = false;
        Ok(())
    }
}
