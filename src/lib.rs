//! username_probe library: concurrent username probe-and-verify engine
//!
//! This library checks a configurable catalog of web platforms for the
//! existence of a username. Each site is probed once over HTTP, the
//! response is judged by a multi-stage content-verification pipeline, and
//! confirmed hits are scored and persisted incrementally so partial
//! progress survives interruption.
//!
//! # Example
//!
//! ```no_run
//! use username_probe::{run_scan, Config};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     username: "alice".to_string(),
//!     max_concurrency: 8,
//!     ..Default::default()
//! };
//!
//! let report = run_scan(config).await?;
//! println!("Confirmed {} of {} sites", report.confirmed.len(), report.total_sites);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your
//! application or ensure you're calling library functions within an async
//! context.

#![warn(missing_docs)]

mod app;
mod catalog;
pub mod config;
mod error_handling;
mod fp_cache;
mod html;
mod limiter;
mod probe;
mod results;
mod score;
mod verify;

// Re-export public API
pub use app::shutdown::{install_interrupt_handler, INTERRUPT_EXIT_CODE};
pub use catalog::{load_catalog, ContentRules, ProbeMethod, SiteConfig};
pub use config::{Config, LogLevel};
pub use error_handling::{
    CatalogError, PersistenceError, RejectReason, ScanStats, TransportErrorKind,
};
pub use fp_cache::FalsePositiveCache;
pub use probe::{detect_socks_proxy, ProbeOutcome, ProbeResponse};
pub use results::{ResultStore, ScanResult};
pub use run::{run_scan, run_scan_with, ScanReport};
pub use verify::{verify, VerificationVerdict};

// Internal run module (contains the main scanning logic)
mod run {
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::{Context, Result};
    use colored::Colorize;
    use futures::stream::FuturesUnordered;
    use futures::StreamExt;
    use log::{debug, info, warn};
    use tokio_util::sync::CancellationToken;

    use crate::app::{log_progress, print_scan_statistics};
    use crate::catalog::load_catalog;
    use crate::config::{Config, LOGGING_INTERVAL_SECS};
    use crate::error_handling::ScanStats;
    use crate::fp_cache::FalsePositiveCache;
    use crate::limiter::RateLimiter;
    use crate::probe::{detect_socks_proxy, init_client, probe_site, ProbeOutcome};
    use crate::results::{ResultStore, ScanResult};
    use crate::score::build_result;
    use crate::verify::{verify, VerificationVerdict};

    /// Results of a completed (or interrupted) scan.
    #[derive(Debug, Clone)]
    pub struct ScanReport {
        /// The username that was scanned for.
        pub username: String,
        /// Number of sites in the catalog.
        pub total_sites: usize,
        /// Units of work that ran to completion (any outcome).
        pub completed: usize,
        /// Confirmed hits, sorted by descending confidence.
        pub confirmed: Vec<ScanResult>,
        /// Elapsed time in seconds.
        pub elapsed_seconds: f64,
        /// Whether traffic was routed through the local SOCKS proxy.
        pub proxied: bool,
        /// Whether the scan was cut short by cancellation.
        pub interrupted: bool,
        /// Path of the machine-readable result file.
        pub json_path: PathBuf,
        /// Path of the human-readable result file.
        pub text_path: PathBuf,
    }

    /// Runs a scan with an internally created cancellation token.
    ///
    /// This is the plain entry point for callers that do not need to wire
    /// up interrupt handling themselves.
    ///
    /// # Errors
    ///
    /// Returns an error if the site catalog cannot be loaded or the HTTP
    /// client cannot be built. Per-site failures never surface here.
    pub async fn run_scan(config: Config) -> Result<ScanReport> {
        run_scan_with(&config, CancellationToken::new()).await
    }

    /// Runs a scan under an externally owned cancellation token.
    ///
    /// Cancelling the token stops new probes from starting; in-flight
    /// probes finish so the false-positive cache and result store stay
    /// consistent, then both are flushed before this function returns.
    ///
    /// # Errors
    ///
    /// Returns an error if the site catalog cannot be loaded or the HTTP
    /// client cannot be built.
    pub async fn run_scan_with(config: &Config, cancel: CancellationToken) -> Result<ScanReport> {
        let sites = load_catalog(&config.sites).context("Failed to load site catalog")?;
        let total_sites = sites.len();

        let proxied = if config.no_proxy {
            false
        } else {
            detect_socks_proxy().await
        };
        if proxied {
            info!("Local SOCKS proxy detected; routing all requests through it");
        }

        let client = Arc::new(
            init_client(
                &config.user_agent,
                Duration::from_secs(config.timeout_seconds),
                proxied,
            )
            .context("Failed to initialize HTTP client")?,
        );

        let fp_cache = Arc::new(FalsePositiveCache::load(&config.cache));
        let store = Arc::new(ResultStore::new(
            &config.output_dir,
            &config.username,
            proxied,
        ));
        let stats = Arc::new(ScanStats::new());
        let limiter = Arc::new(RateLimiter::new(config.base_delay_ms, config.jitter_ms));
        let semaphore = Arc::new(tokio::sync::Semaphore::new(config.max_concurrency));
        let completed = Arc::new(AtomicUsize::new(0));
        let username: Arc<str> = Arc::from(config.username.as_str());

        info!(
            "Scanning {} platforms for username {:?} ({} workers)",
            total_sites, config.username, config.max_concurrency
        );
        let start_time = std::time::Instant::now();

        let logging_cancel = CancellationToken::new();
        let logging_task = {
            let cancelled = logging_cancel.child_token();
            let completed = Arc::clone(&completed);
            tokio::spawn(async move {
                let mut interval =
                    tokio::time::interval(Duration::from_secs(LOGGING_INTERVAL_SECS));
                interval.tick().await; // first tick fires immediately; skip it
                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            log_progress(start_time, &completed, total_sites);
                        }
                        _ = cancelled.cancelled() => {
                            break;
                        }
                    }
                }
            })
        };

        let mut tasks = FuturesUnordered::new();

        for site in sites {
            if cancel.is_cancelled() {
                break;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    warn!("Semaphore closed, skipping site: {}", site.name);
                    continue;
                }
            };

            // A permit freed by an in-flight task must not start new work
            // once cancellation was requested.
            if cancel.is_cancelled() {
                break;
            }

            let cancel = cancel.clone();
            let client = Arc::clone(&client);
            let fp_cache = Arc::clone(&fp_cache);
            let store = Arc::clone(&store);
            let stats = Arc::clone(&stats);
            let limiter = Arc::clone(&limiter);
            let completed = Arc::clone(&completed);
            let username = Arc::clone(&username);

            tasks.push(tokio::spawn(async move {
                let _permit = permit;

                // Abandon the unit if cancellation lands during the
                // pre-request delay; once the probe is sent it finishes.
                tokio::select! {
                    _ = limiter.acquire() => {}
                    _ = cancel.cancelled() => {
                        debug!("{}: abandoned before probe (stop requested)", site.name);
                        return;
                    }
                }

                let outcome = probe_site(&client, &site, &username).await;
                match verify(&outcome, &site, &username) {
                    VerificationVerdict::Confirmed => {
                        if let ProbeOutcome::Response(response) = &outcome {
                            let fp_hits = fp_cache.hits(&site.name, &username);
                            let result = build_result(&site, response, &username, fp_hits);
                            info!(
                                "{} {} ({}) -> {} [confidence {:.2}]",
                                "[+]".green().bold(),
                                result.site,
                                result.category,
                                result.probed_url,
                                result.confidence
                            );
                            stats.record_confirmed();
                            store.record(result);
                        }
                    }
                    VerificationVerdict::Rejected(reason) => {
                        let count = fp_cache.record_rejection(&site.name, &username);
                        stats.record_rejection(reason);
                        debug!(
                            "{}: rejected ({}), {} historical rejection(s)",
                            site.name, reason, count
                        );
                    }
                    VerificationVerdict::TransportFailed(kind) => {
                        stats.record_transport(kind);
                        debug!("{}: unreachable ({})", site.name, kind);
                    }
                }

                completed.fetch_add(1, Ordering::SeqCst);
            }));
        }

        while let Some(task_result) = tasks.next().await {
            if let Err(join_error) = task_result {
                warn!("Probe task panicked: {:?}", join_error);
            }
        }

        logging_cancel.cancel();
        let _ = logging_task.await;

        // Both stores are write-through during the run; these flushes catch
        // the cache (written only here) and any write that failed earlier.
        if let Err(e) = fp_cache.flush() {
            warn!("Failed to flush false-positive cache: {e}");
        }
        if let Err(e) = store.flush() {
            warn!("Failed to flush result store: {e}");
        }

        print_scan_statistics(&stats);
        log_progress(start_time, &completed, total_sites);

        Ok(ScanReport {
            username: config.username.clone(),
            total_sites,
            completed: completed.load(Ordering::SeqCst),
            confirmed: store.snapshot(),
            elapsed_seconds: start_time.elapsed().as_secs_f64(),
            proxied,
            interrupted: cancel.is_cancelled(),
            json_path: store.json_path().to_path_buf(),
            text_path: store.text_path().to_path_buf(),
        })
    }
}
