//! End-of-run statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{RejectReason, ScanStats, TransportErrorKind};

/// Logs a breakdown of the scan's outcomes.
///
/// Only non-zero counters are printed; a clean run stays quiet.
pub fn print_scan_statistics(stats: &ScanStats) {
    info!(
        "Outcome totals: {} confirmed, {} rejected, {} unreachable",
        stats.confirmed_count(),
        stats.total_rejections(),
        stats.total_transport()
    );

    for reason in RejectReason::iter() {
        let count = stats.rejection_count(reason);
        if count > 0 {
            info!("  rejected ({}): {count}", reason.as_str());
        }
    }

    for kind in TransportErrorKind::iter() {
        let count = stats.transport_count(kind);
        if count > 0 {
            info!("  unreachable ({}): {count}", kind.as_str());
        }
    }
}
