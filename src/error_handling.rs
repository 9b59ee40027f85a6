//! Error taxonomy and scan statistics.
//!
//! This module provides:
//! - Fatal error types (catalog loading) and recoverable ones (persistence)
//! - The transport-failure and rejection-reason categorizations used by the
//!   probe/verify pipeline
//! - Thread-safe statistics tracking across workers
//!
//! Outcomes are categorized into:
//! - **Transport failures**: the site could not be reached; counted, never
//!   treated as evidence about the username
//! - **Rejections**: the site answered and the content said "no"; these feed
//!   the false-positive cache

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for site catalog loading.
///
/// Any of these aborts the run before workers start: scanning with a
/// missing or half-parsed catalog would silently probe nothing.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("site catalog unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not valid JSON.
    #[error("site catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The catalog parsed but contains no sites.
    #[error("site catalog is empty")]
    Empty,

    /// A site entry failed validation.
    #[error("site {site}: {problem}")]
    InvalidSite { site: String, problem: String },
}

/// Error types for cache and result persistence.
///
/// These are logged and retried at the next write point rather than
/// aborting a long scan.
#[derive(Error, Debug)]
pub enum PersistenceError {
    /// A file or directory could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization to JSON failed.
    #[error("failed to serialize {what}: {source}")]
    Serialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Categories of transport-level failure for one probe.
///
/// A transport failure means the site never answered usefully; it is
/// deliberately kept distinct from a content rejection so that unreachable
/// sites never accumulate false-positive history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum TransportErrorKind {
    /// The request (or body read) exceeded the configured timeout.
    Timeout,
    /// TCP/TLS connection could not be established.
    Connect,
    /// The redirect policy was violated (too many hops, loop).
    Redirect,
    /// The request could not be built or sent.
    Request,
    /// The response body could not be read.
    Body,
    /// Anything reqwest reports that fits none of the above.
    Other,
}

impl TransportErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Timeout => "request timeout",
            TransportErrorKind::Connect => "connection failure",
            TransportErrorKind::Redirect => "redirect policy violation",
            TransportErrorKind::Request => "request error",
            TransportErrorKind::Body => "body read error",
            TransportErrorKind::Other => "other transport error",
        }
    }
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons the content verifier rejects a response.
///
/// Ordered roughly by pipeline stage; every variant increments the
/// false-positive cache for the site/username pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum RejectReason {
    /// Status code outside the site's accepted set.
    StatusMismatch,
    /// A "success" page whose title or body opening says the profile
    /// does not exist.
    SoftContent,
    /// Body shorter than the site's minimum content length.
    TooShort,
    /// A must/must-not/regex content rule failed.
    RuleViolation,
    /// Redirected to a login or landing page.
    LoginRedirect,
    /// The username never appears in the body.
    UsernameAbsent,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::StatusMismatch => "status mismatch",
            RejectReason::SoftContent => "soft-404 content",
            RejectReason::TooShort => "body too short",
            RejectReason::RuleViolation => "content rule violation",
            RejectReason::LoginRedirect => "login redirect",
            RejectReason::UsernameAbsent => "username absent",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Thread-safe scan statistics tracker.
///
/// Tracks confirmed hits, rejections by reason, and transport failures by
/// kind using atomic counters, allowing concurrent access from multiple
/// worker tasks. All counters are initialized to zero on creation and the
/// struct is shared across tasks via `Arc`.
pub struct ScanStats {
    rejections: HashMap<RejectReason, AtomicUsize>,
    transport: HashMap<TransportErrorKind, AtomicUsize>,
    confirmed: AtomicUsize,
}

impl ScanStats {
    pub fn new() -> Self {
        let mut rejections = HashMap::new();
        for reason in RejectReason::iter() {
            rejections.insert(reason, AtomicUsize::new(0));
        }

        let mut transport = HashMap::new();
        for kind in TransportErrorKind::iter() {
            transport.insert(kind, AtomicUsize::new(0));
        }

        ScanStats {
            rejections,
            transport,
            confirmed: AtomicUsize::new(0),
        }
    }

    /// Increment the confirmed-hit counter.
    pub fn record_confirmed(&self) {
        self.confirmed.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment a rejection counter.
    ///
    /// All reasons are initialized in the constructor, so the lookup cannot
    /// miss; if it ever does, log and continue rather than poisoning a scan.
    pub fn record_rejection(&self, reason: RejectReason) {
        if let Some(counter) = self.rejections.get(&reason) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "rejection counter for {:?} missing from ScanStats; this is a bug",
                reason
            );
        }
    }

    /// Increment a transport-failure counter.
    pub fn record_transport(&self, kind: TransportErrorKind) {
        if let Some(counter) = self.transport.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "transport counter for {:?} missing from ScanStats; this is a bug",
                kind
            );
        }
    }

    /// Number of confirmed hits recorded so far.
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.load(Ordering::SeqCst)
    }

    /// Count for one rejection reason.
    pub fn rejection_count(&self, reason: RejectReason) -> usize {
        self.rejections
            .get(&reason)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Count for one transport-failure kind.
    pub fn transport_count(&self, kind: TransportErrorKind) -> usize {
        self.transport
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total rejections across all reasons.
    pub fn total_rejections(&self) -> usize {
        self.rejections
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    /// Total transport failures across all kinds.
    pub fn total_transport(&self) -> usize {
        self.transport
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }
}

impl Default for ScanStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_scan_stats_initialization() {
        let stats = ScanStats::new();
        for reason in RejectReason::iter() {
            assert_eq!(stats.rejection_count(reason), 0);
        }
        for kind in TransportErrorKind::iter() {
            assert_eq!(stats.transport_count(kind), 0);
        }
        assert_eq!(stats.confirmed_count(), 0);
    }

    #[test]
    fn test_scan_stats_increment() {
        let stats = ScanStats::new();
        stats.record_rejection(RejectReason::StatusMismatch);
        assert_eq!(stats.rejection_count(RejectReason::StatusMismatch), 1);

        stats.record_transport(TransportErrorKind::Timeout);
        assert_eq!(stats.transport_count(TransportErrorKind::Timeout), 1);

        stats.record_confirmed();
        assert_eq!(stats.confirmed_count(), 1);
    }

    #[test]
    fn test_scan_stats_totals() {
        let stats = ScanStats::new();
        stats.record_rejection(RejectReason::StatusMismatch);
        stats.record_rejection(RejectReason::TooShort);
        stats.record_rejection(RejectReason::TooShort);
        stats.record_transport(TransportErrorKind::Connect);

        assert_eq!(stats.total_rejections(), 3);
        assert_eq!(stats.total_transport(), 1);
    }

    #[test]
    fn test_all_reject_reasons_have_string_representation() {
        for reason in RejectReason::iter() {
            assert!(
                !reason.as_str().is_empty(),
                "{:?} should have non-empty string",
                reason
            );
        }
    }

    #[test]
    fn test_all_transport_kinds_have_string_representation() {
        for kind in TransportErrorKind::iter() {
            assert!(
                !kind.as_str().is_empty(),
                "{:?} should have non-empty string",
                kind
            );
        }
    }

    #[test]
    fn test_catalog_error_display() {
        let err = CatalogError::Empty;
        assert_eq!(err.to_string(), "site catalog is empty");

        let err = CatalogError::InvalidSite {
            site: "example".to_string(),
            problem: "url template has no {} placeholder".to_string(),
        };
        assert!(err.to_string().contains("example"));
        assert!(err.to_string().contains("placeholder"));
    }
}
