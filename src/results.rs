//! Scan results and their crash-safe store.
//!
//! Every confirmed hit is appended to the in-memory list and the full
//! per-username snapshot is rewritten to disk in the same call, so a crash
//! or interrupt never loses a hit that was already confirmed. Writes are
//! serialized through a single lock and stay rare next to HTTP latency.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::config::{HIGH_CONFIDENCE_THRESHOLD, MEDIUM_CONFIDENCE_THRESHOLD};
use crate::error_handling::PersistenceError;

/// One confirmed hit. Created by the scorer, immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Site name from the catalog.
    pub site: String,
    /// Reporting category from the catalog.
    pub category: String,
    /// URL that was probed (template with username substituted).
    pub probed_url: String,
    /// URL after redirects.
    pub final_url: String,
    /// Bounded heuristic score in [0, 1], two decimals.
    pub confidence: f64,
    /// Number of positive signals that fired during scoring.
    pub signal_count: u32,
    /// Page title, when one was present.
    pub matched_title: Option<String>,
}

/// Confidence tier used in the human-readable rendering.
fn tier(confidence: f64) -> &'static str {
    if confidence >= HIGH_CONFIDENCE_THRESHOLD {
        "HIGH"
    } else if confidence >= MEDIUM_CONFIDENCE_THRESHOLD {
        "MEDIUM"
    } else {
        "LOW"
    }
}

struct StoreInner {
    results: Vec<ScanResult>,
    pending_write: bool,
}

/// Write-through store for one username's confirmed hits.
pub struct ResultStore {
    username: String,
    proxied: bool,
    json_path: PathBuf,
    text_path: PathBuf,
    inner: Mutex<StoreInner>,
}

impl ResultStore {
    /// Creates the store for a username, rooted at `output_dir`.
    ///
    /// The directory is created eagerly; if that fails the store still
    /// works in memory and every persist attempt logs and retries later.
    pub fn new(output_dir: &Path, username: &str, proxied: bool) -> Self {
        if let Err(e) = std::fs::create_dir_all(output_dir) {
            log::warn!(
                "could not create result directory {}: {e}; will retry on first write",
                output_dir.display()
            );
        }

        ResultStore {
            username: username.to_string(),
            proxied,
            json_path: output_dir.join(format!("{username}.json")),
            text_path: output_dir.join(format!("{username}.txt")),
            inner: Mutex::new(StoreInner {
                results: Vec::new(),
                pending_write: false,
            }),
        }
    }

    /// Records a confirmed hit and synchronously persists the snapshot.
    ///
    /// A persistence failure is logged and marked pending; the data stays
    /// in memory and the write is retried on the next record or flush.
    pub fn record(&self, result: ScanResult) {
        let mut inner = self.inner.lock().expect("result store lock poisoned");
        inner.results.push(result);
        match self.persist(&inner.results) {
            Ok(()) => inner.pending_write = false,
            Err(e) => {
                log::warn!("failed to persist results ({e}); will retry at next write");
                inner.pending_write = true;
            }
        }
    }

    /// Retries any pending write. Called at end of run and on interrupt.
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let mut inner = self.inner.lock().expect("result store lock poisoned");
        if !inner.pending_write {
            return Ok(());
        }
        self.persist(&inner.results)?;
        inner.pending_write = false;
        Ok(())
    }

    /// Copy of the confirmed results, sorted by descending confidence.
    pub fn snapshot(&self) -> Vec<ScanResult> {
        let inner = self.inner.lock().expect("result store lock poisoned");
        let mut results = inner.results.clone();
        sort_by_confidence(&mut results);
        results
    }

    /// Number of confirmed hits so far.
    pub fn confirmed_count(&self) -> usize {
        self.inner
            .lock()
            .expect("result store lock poisoned")
            .results
            .len()
    }

    /// Path of the machine-readable result file.
    pub fn json_path(&self) -> &Path {
        &self.json_path
    }

    /// Path of the human-readable result file.
    pub fn text_path(&self) -> &Path {
        &self.text_path
    }

    fn persist(&self, results: &[ScanResult]) -> Result<(), PersistenceError> {
        if let Some(parent) = self.json_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut sorted = results.to_vec();
        sort_by_confidence(&mut sorted);

        let json = serde_json::to_string_pretty(&sorted).map_err(|source| {
            PersistenceError::Serialize {
                what: "scan results",
                source,
            }
        })?;
        write_atomically(&self.json_path, &json)?;

        let text = self.render_text(&sorted);
        write_atomically(&self.text_path, &text)?;

        Ok(())
    }

    fn render_text(&self, sorted: &[ScanResult]) -> String {
        let mut out = String::new();
        out.push_str("Username Probe Results\n");
        out.push_str(&format!("Username: {}\n", self.username));
        out.push_str(&format!(
            "Proxy Used: {}\n",
            if self.proxied { "YES" } else { "NO" }
        ));
        out.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        ));

        for result in sorted {
            out.push_str(&format!(
                "[{}] {} ({})\n",
                tier(result.confidence),
                result.site,
                result.category
            ));
            out.push_str(&format!("URL: {}\n", result.probed_url));
            if result.final_url != result.probed_url {
                out.push_str(&format!("Final URL: {}\n", result.final_url));
            }
            if let Some(title) = &result.matched_title {
                out.push_str(&format!("Title: {title}\n"));
            }
            out.push_str(&format!(
                "Confidence: {:.2} ({} signals)\n\n",
                result.confidence, result.signal_count
            ));
        }

        out
    }
}

fn sort_by_confidence(results: &mut [ScanResult]) {
    results.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.site.cmp(&b.site))
    });
}

/// Temp-file-then-rename write, so readers and an interrupt mid-write both
/// see either the previous snapshot or the new one, never a torn file.
fn write_atomically(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents).map_err(|source| PersistenceError::Write {
        path: tmp_path.clone(),
        source,
    })?;
    std::fs::rename(&tmp_path, path).map_err(|source| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(site: &str, confidence: f64) -> ScanResult {
        ScanResult {
            site: site.to_string(),
            category: "Social".to_string(),
            probed_url: format!("https://{site}.test/alice"),
            final_url: format!("https://{site}.test/alice"),
            confidence,
            signal_count: 2,
            matched_title: Some(format!("alice on {site}")),
        }
    }

    #[test]
    fn test_record_persists_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), "alice", false);
        store.record(result("example", 0.9));

        assert!(store.json_path().exists());
        assert!(store.text_path().exists());

        let raw = std::fs::read_to_string(store.json_path()).unwrap();
        let loaded: Vec<ScanResult> = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].site, "example");
    }

    #[test]
    fn test_snapshot_sorted_by_descending_confidence() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), "alice", false);
        store.record(result("low", 0.3));
        store.record(result("high", 0.95));
        store.record(result("mid", 0.7));

        let snapshot = store.snapshot();
        let sites: Vec<&str> = snapshot.iter().map(|r| r.site.as_str()).collect();
        assert_eq!(sites, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_persisted_json_matches_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), "alice", false);
        store.record(result("one", 0.5));
        store.record(result("two", 0.8));

        let raw = std::fs::read_to_string(store.json_path()).unwrap();
        let loaded: Vec<ScanResult> = serde_json::from_str(&raw).unwrap();
        let snapshot = store.snapshot();
        assert_eq!(loaded.len(), snapshot.len());
        for (a, b) in loaded.iter().zip(snapshot.iter()) {
            assert_eq!(a.site, b.site);
            assert_eq!(a.confidence, b.confidence);
        }
    }

    #[test]
    fn test_text_rendering_has_header_and_tiers() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::new(dir.path(), "alice", true);
        store.record(result("high", 0.9));
        store.record(result("mid", 0.7));
        store.record(result("low", 0.4));

        let text = std::fs::read_to_string(store.text_path()).unwrap();
        assert!(text.contains("Username: alice"));
        assert!(text.contains("Proxy Used: YES"));
        assert!(text.contains("[HIGH] high"));
        assert!(text.contains("[MEDIUM] mid"));
        assert!(text.contains("[LOW] low"));
        // Sorted: HIGH before MEDIUM before LOW
        let high_pos = text.find("[HIGH]").unwrap();
        let mid_pos = text.find("[MEDIUM]").unwrap();
        let low_pos = text.find("[LOW]").unwrap();
        assert!(high_pos < mid_pos && mid_pos < low_pos);
    }

    #[test]
    fn test_concurrent_records_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(ResultStore::new(dir.path(), "alice", false));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    store.record(result(&format!("site{i}"), 0.5 + i as f64 / 100.0));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.confirmed_count(), 8);
        let raw = std::fs::read_to_string(store.json_path()).unwrap();
        let loaded: Vec<ScanResult> = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.len(), 8);
    }
}
