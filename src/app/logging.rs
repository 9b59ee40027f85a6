//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Logs progress of the scan: completed sites, rate, and a rough ETA.
///
/// # Arguments
///
/// * `start_time` - The start time of the scan
/// * `completed` - Atomic counter of finished units of work
/// * `total` - Number of sites in the catalog
pub fn log_progress(start_time: std::time::Instant, completed: &AtomicUsize, total: usize) {
    let done = completed.load(Ordering::SeqCst);
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let rate = if elapsed_secs > 0.0 {
        done as f64 / elapsed_secs
    } else {
        0.0
    };
    let remaining = total.saturating_sub(done);
    let eta_secs = if rate > 0.0 {
        remaining as f64 / rate
    } else {
        0.0
    };
    info!(
        "Checked {done}/{total} sites in {elapsed_secs:.1}s (~{rate:.2} sites/sec, ETA {})",
        format_eta(eta_secs)
    );
}

fn format_eta(seconds: f64) -> String {
    let seconds = seconds as u64;
    let (h, rem) = (seconds / 3600, seconds % 3600);
    let (m, s) = (rem / 60, rem % 60);
    format!("{h:02}:{m:02}:{s:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(0.0), "00:00:00");
        assert_eq!(format_eta(61.0), "00:01:01");
        assert_eq!(format_eta(3725.0), "01:02:05");
    }
}
