//! Confidence scoring.
//!
//! Invoked only after a Confirmed verdict. Blends the site's static weight
//! with dynamic positive signals found in the response and a capped penalty
//! derived from the false-positive cache, then clamps the result to [0, 1].

use crate::catalog::{ProbeMethod, SiteConfig};
use crate::config::{PENALTY_CAP, PER_HIT_PENALTY, POPULATED_BODY_THRESHOLD, SIGNAL_BOOST_CAP};
use crate::html::{extract_title, social_meta_contents};
use crate::probe::ProbeResponse;
use crate::results::ScanResult;

// Per-signal boost increments
const URL_SIGNAL_BOOST: f64 = 0.10;
const TITLE_SIGNAL_BOOST: f64 = 0.15;
const EXACT_URL_SIGNAL_BOOST: f64 = 0.10;
const META_SIGNAL_BOOST: f64 = 0.15;
const BODY_SIZE_SIGNAL_BOOST: f64 = 0.10;

/// Positive signals detected in a confirmed response.
#[derive(Debug, Default, Clone, Copy)]
struct Signals {
    username_in_final_url: bool,
    username_in_title: bool,
    exact_url: bool,
    username_in_social_meta: bool,
    populated_body: bool,
}

impl Signals {
    fn count(&self) -> u32 {
        [
            self.username_in_final_url,
            self.username_in_title,
            self.exact_url,
            self.username_in_social_meta,
            self.populated_body,
        ]
        .iter()
        .filter(|&&fired| fired)
        .count() as u32
    }

    fn boost(&self) -> f64 {
        let mut boost = 0.0;
        if self.username_in_final_url {
            boost += URL_SIGNAL_BOOST;
        }
        if self.username_in_title {
            boost += TITLE_SIGNAL_BOOST;
        }
        if self.exact_url {
            boost += EXACT_URL_SIGNAL_BOOST;
        }
        if self.username_in_social_meta {
            boost += META_SIGNAL_BOOST;
        }
        if self.populated_body {
            boost += BODY_SIZE_SIGNAL_BOOST;
        }
        boost.min(SIGNAL_BOOST_CAP)
    }
}

fn detect_signals(
    site: &SiteConfig,
    response: &ProbeResponse,
    username: &str,
    probed_url: &str,
    title: Option<&str>,
) -> Signals {
    // A HEAD probe carries no body; by policy it confirms with zero
    // boosting signals and rides on the base weight alone.
    if site.method == ProbeMethod::Head {
        return Signals::default();
    }

    let username_lower = username.to_lowercase();

    Signals {
        username_in_final_url: response
            .final_url
            .to_lowercase()
            .contains(&username_lower),
        username_in_title: title
            .map(|t| t.to_lowercase().contains(&username_lower))
            .unwrap_or(false),
        exact_url: response.final_url == probed_url,
        username_in_social_meta: social_meta_contents(&response.body)
            .iter()
            .any(|content| content.to_lowercase().contains(&username_lower)),
        populated_body: response.body.len() >= POPULATED_BODY_THRESHOLD,
    }
}

/// Computes the bounded confidence score.
///
/// `confidence = clamp(weight + signal_boost - fp_penalty, 0, 1)`, rounded
/// to two decimals. The penalty grows with the historical rejection count
/// for this site/username pair but saturates at [`PENALTY_CAP`].
fn confidence(weight: f64, boost: f64, fp_hits: u32) -> f64 {
    let penalty = (f64::from(fp_hits) * PER_HIT_PENALTY).min(PENALTY_CAP);
    let raw = (weight + boost - penalty).clamp(0.0, 1.0);
    (raw * 100.0).round() / 100.0
}

/// Builds the [`ScanResult`] for a confirmed hit.
///
/// This is the only constructor of `ScanResult`: the record is created
/// here, immediately after the verdict, and immutable afterwards.
pub fn build_result(
    site: &SiteConfig,
    response: &ProbeResponse,
    username: &str,
    fp_hits: u32,
) -> ScanResult {
    let probed_url = site.probe_url(username);
    let title = extract_title(&response.body);
    let signals = detect_signals(site, response, username, &probed_url, title.as_deref());

    ScanResult {
        site: site.name.clone(),
        category: site.category.clone(),
        probed_url,
        final_url: response.final_url.clone(),
        confidence: confidence(site.confidence_weight, signals.boost(), fp_hits),
        signal_count: signals.count(),
        matched_title: title,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_site(json: &str) -> SiteConfig {
        let mut site: SiteConfig = serde_json::from_str(json).unwrap();
        site.name = "example".to_string();
        site
    }

    fn response(final_url: &str, body: &str) -> ProbeResponse {
        ProbeResponse {
            status: 200,
            final_url: final_url.to_string(),
            body: body.to_string(),
            elapsed: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_confidence_is_bounded_and_rounded() {
        assert_eq!(confidence(0.9, 0.35, 0), 1.0);
        assert_eq!(confidence(0.1, 0.0, 9), 0.0);
        let c = confidence(0.6, 0.1, 1);
        assert_eq!(c, 0.6);
        assert_eq!((c * 100.0).round() / 100.0, c);
    }

    #[test]
    fn test_penalty_caps_and_is_monotone() {
        let mut last = f64::MAX;
        for hits in 0..10 {
            let c = confidence(0.9, 0.0, hits);
            assert!(c <= last, "penalty must be non-decreasing");
            last = c;
        }
        // Saturates: the cap keeps 9 hits identical to 4.
        assert_eq!(confidence(0.9, 0.0, 4), confidence(0.9, 0.0, 9));
        assert_eq!(confidence(0.9, 0.0, 4), 0.5);
    }

    #[test]
    fn test_no_signals_no_boost() {
        let site = test_site(r#"{"url": "https://example.test/u/{}", "confidence_weight": 0.6}"#);
        // Redirected elsewhere, no title, username nowhere visible, small body.
        let resp = response("https://other.test/profile/12345", "short body without markup");
        let result = build_result(&site, &resp, "alice", 0);
        assert_eq!(result.signal_count, 0);
        assert_eq!(result.confidence, 0.6);
        assert!(result.matched_title.is_none());
    }

    #[test]
    fn test_all_signals_capped() {
        let site = test_site(r#"{"url": "https://example.test/u/{}", "confidence_weight": 0.6}"#);
        let body = format!(
            "<html><head><title>alice's page</title>\
             <meta property=\"og:title\" content=\"alice on Example\"></head>\
             <body>{}</body></html>",
            "alice ".repeat(1000)
        );
        let resp = response("https://example.test/u/alice", &body);
        let result = build_result(&site, &resp, "alice", 0);
        assert_eq!(result.signal_count, 5);
        // 0.6 + capped 0.35 boost, not 0.6 + 0.60
        assert_eq!(result.confidence, 0.95);
    }

    #[test]
    fn test_head_probe_scores_with_zero_signals() {
        let site = test_site(
            r#"{"url": "https://example.test/u/{}", "method": "HEAD", "confidence_weight": 0.7}"#,
        );
        // Even a final URL containing the username must not boost a HEAD hit.
        let resp = response("https://example.test/u/alice", "");
        let result = build_result(&site, &resp, "alice", 0);
        assert_eq!(result.signal_count, 0);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_fp_penalty_discounts_confirmed_hit() {
        let site = test_site(r#"{"url": "https://example.test/u/{}", "confidence_weight": 0.6}"#);
        let resp = response("https://other.test/profile", "plain body");
        let clean = build_result(&site, &resp, "alice", 0);
        let tainted = build_result(&site, &resp, "alice", 3);
        assert_eq!(clean.confidence, 0.6);
        assert_eq!(tainted.confidence, 0.3);
    }

    #[test]
    fn test_title_signal() {
        let site = test_site(r#"{"url": "https://example.test/u/{}", "confidence_weight": 0.5}"#);
        let body = "<html><head><title>Alice | Example</title></head><body>x</body></html>";
        let resp = response("https://other.test/p/9", body);
        let result = build_result(&site, &resp, "alice", 0);
        assert_eq!(result.signal_count, 1);
        assert_eq!(result.confidence, 0.65);
        assert_eq!(result.matched_title.as_deref(), Some("Alice | Example"));
    }

    #[test]
    fn test_social_meta_signal() {
        let site = test_site(r#"{"url": "https://example.test/u/{}", "confidence_weight": 0.5}"#);
        let body =
            "<html><head><meta name=\"twitter:creator\" content=\"@alice\"></head><body>x</body></html>";
        let resp = response("https://other.test/p/9", body);
        let result = build_result(&site, &resp, "alice", 0);
        assert_eq!(result.signal_count, 1);
        assert_eq!(result.confidence, 0.65);
    }
}
