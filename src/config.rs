use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

// constants (used as defaults)
pub const LOGGING_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_CATALOG_PATH: &str = "./websites.json";
pub const DEFAULT_CACHE_PATH: &str = "./fp_cache.json";
pub const DEFAULT_OUTPUT_DIR: &str = "./results";

// Network operation timeouts
/// Per-request HTTP timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
/// Timeout for the one-shot SOCKS proxy reachability probe.
pub const SOCKS_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Default User-Agent string for HTTP requests.
///
/// A fixed, honest identifier rather than a rotating browser impersonation:
/// evasion beyond this is out of scope. Users can override it via the
/// `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; username_probe OSINT scanner)";

// SOCKS proxy autodetection
/// Address probed at startup to decide whether to route through a local
/// SOCKS proxy (the conventional Tor listener).
pub const SOCKS_PROXY_ADDR: &str = "127.0.0.1:9050";
/// Proxy URL used for all requests when the listener above is reachable.
/// The `socks5h` scheme resolves hostnames through the proxy, so DNS
/// queries do not leak around it.
pub const SOCKS_PROXY_URL: &str = "socks5h://127.0.0.1:9050";

// Redirect handling
/// Maximum number of redirect hops to follow
/// Prevents infinite redirect loops and excessive request chains
pub const MAX_REDIRECT_HOPS: usize = 10;

// Rate limiting
/// Fixed delay before every HTTP attempt, in milliseconds.
pub const BASE_DELAY_MS: u64 = 600;
/// Upper bound of the uniform random jitter added to the base delay.
pub const JITTER_MS: u64 = 400;

// Content verification
/// Default minimum body length below which a page is treated as a
/// placeholder rather than a real profile.
pub const DEFAULT_MIN_CONTENT_LENGTH: usize = 120;
/// How much of the body (lowercased, from the start) is scanned for
/// soft-404 phrases when the title alone is inconclusive.
pub const SOFT_404_SCAN_WINDOW: usize = 2000;

// Confidence scoring
/// Default site weight when the catalog entry does not specify one.
pub const DEFAULT_CONFIDENCE_WEIGHT: f64 = 0.6;
/// Total signal boost is capped here no matter how many signals fire.
pub const SIGNAL_BOOST_CAP: f64 = 0.35;
/// Confidence penalty per historical rejection of this site/username pair.
pub const PER_HIT_PENALTY: f64 = 0.10;
/// The false-positive penalty saturates at this value.
pub const PENALTY_CAP: f64 = 0.40;
/// Bodies at or above this length count as a populated profile signal.
pub const POPULATED_BODY_THRESHOLD: usize = 5000;

// Report rendering
/// Confidence at or above which a hit is reported as HIGH.
pub const HIGH_CONFIDENCE_THRESHOLD: f64 = 0.85;
/// Confidence at or above which a hit is reported as MEDIUM.
pub const MEDIUM_CONFIDENCE_THRESHOLD: f64 = 0.65;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace). Used with the `--log-level` CLI option.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Command-line options and configuration.
///
/// This struct is automatically generated by `clap` from the field attributes.
/// All options have sensible defaults and can be overridden via command-line flags.
///
/// # Examples
///
/// ```bash
/// # Basic usage
/// username_probe alice
///
/// # With a custom catalog and lower concurrency
/// username_probe alice --sites ./my_sites.json --max-concurrency 4
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "username_probe",
    about = "Checks a catalog of web platforms for a username and scores confirmed profiles."
)]
pub struct Config {
    /// Username to search for
    #[arg(value_parser)]
    pub username: String,

    /// Site catalog path (JSON mapping of site name to probe configuration)
    #[arg(long, value_parser, default_value = DEFAULT_CATALOG_PATH)]
    pub sites: PathBuf,

    /// False-positive cache path
    #[arg(long, value_parser, default_value = DEFAULT_CACHE_PATH)]
    pub cache: PathBuf,

    /// Directory for result files (<username>.json and <username>.txt)
    #[arg(long, value_parser, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Maximum concurrent probes
    ///
    /// The observed sweet spot is 8-15: high enough to hide per-site
    /// latency, low enough to stay under most anti-abuse thresholds.
    #[arg(long, default_value_t = 10)]
    pub max_concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = REQUEST_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Fixed delay before each request, in milliseconds
    #[arg(long, default_value_t = BASE_DELAY_MS)]
    pub base_delay_ms: u64,

    /// Upper bound of random jitter added to the delay, in milliseconds
    #[arg(long, default_value_t = JITTER_MS)]
    pub jitter_ms: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Skip SOCKS proxy autodetection and always connect directly
    #[arg(long, default_value_t = false)]
    pub no_proxy: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            username: String::new(),
            sites: PathBuf::from(DEFAULT_CATALOG_PATH),
            cache: PathBuf::from(DEFAULT_CACHE_PATH),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_concurrency: 10,
            timeout_seconds: REQUEST_TIMEOUT_SECS,
            base_delay_ms: BASE_DELAY_MS,
            jitter_ms: JITTER_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            no_proxy: false,
            log_level: LogLevel::Info,
        }
    }
}
