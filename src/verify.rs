//! Content verification.
//!
//! The staged heuristic pipeline that decides whether a probe response
//! actually shows a profile for the target username. Stages run in a fixed
//! order, cheapest and most discriminating first, and short-circuit on the
//! first disqualifying signal. The whole pipeline is a pure function of the
//! probe outcome, the site's rules, and the username.

use regex::RegexBuilder;
use url::Url;

use crate::catalog::{ContentRules, ProbeMethod, SiteConfig};
use crate::config::SOFT_404_SCAN_WINDOW;
use crate::error_handling::{RejectReason, TransportErrorKind};
use crate::html::extract_title;
use crate::probe::{ProbeOutcome, ProbeResponse};

/// The verifier's judgement of one probe outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationVerdict {
    /// No disqualifying signal found; the scorer takes it from here.
    Confirmed,
    /// The site answered and the content says the profile does not exist.
    Rejected(RejectReason),
    /// The site never answered usefully; neither a hit nor a miss.
    TransportFailed(TransportErrorKind),
}

/// Phrases that mark a "success" response as a soft 404.
///
/// Checked lowercased against the page title first, then against the
/// opening of the body. English-only: internationalized sites will slip
/// through this list and be caught (or not) by later stages.
pub const SOFT_404_PHRASES: &[&str] = &[
    "page not found",
    "user not found",
    "profile not found",
    "account not found",
    "account suspended",
    "user suspended",
    "deactivated",
    "no longer available",
    "has been removed",
    "doesn't exist",
    "does not exist",
    "404 not found",
    "nothing here",
    "this page is unavailable",
    "couldn't find this page",
];

/// Path fragments that mark a redirect target as a login or landing page.
pub const LOGIN_REDIRECT_KEYWORDS: &[&str] =
    &["login", "signin", "auth", "account/restricted", "home"];

/// Runs the full verification pipeline for one probe outcome.
///
/// Stage order: transport, status, HEAD short-circuit, minimum length,
/// soft-404 phrases, redirect heuristic, explicit content rules, username
/// presence. Pure function: same inputs, same verdict.
pub fn verify(outcome: &ProbeOutcome, site: &SiteConfig, username: &str) -> VerificationVerdict {
    let response = match outcome {
        ProbeOutcome::Transport(kind) => return VerificationVerdict::TransportFailed(*kind),
        ProbeOutcome::Response(response) => response,
    };

    if !site.valid_status.contains(&response.status) {
        return VerificationVerdict::Rejected(RejectReason::StatusMismatch);
    }

    // A HEAD probe has no body to inspect; an accepted status is the whole
    // signal. The scorer treats it as confirmed with zero boosting signals.
    if site.method == ProbeMethod::Head {
        return VerificationVerdict::Confirmed;
    }

    if response.body.len() < site.rules.min_content_length {
        return VerificationVerdict::Rejected(RejectReason::TooShort);
    }

    if !site.rules.ignore_global_soft_404 && is_soft_404(&response.body) {
        return VerificationVerdict::Rejected(RejectReason::SoftContent);
    }

    if is_login_redirect(&site.probe_url(username), &response.final_url) {
        return VerificationVerdict::Rejected(RejectReason::LoginRedirect);
    }

    if violates_content_rules(&response.body, &site.rules) {
        return VerificationVerdict::Rejected(RejectReason::RuleViolation);
    }

    if !site.rules.allow_no_username_match && !contains_word(&response.body, username) {
        return VerificationVerdict::Rejected(RejectReason::UsernameAbsent);
    }

    VerificationVerdict::Confirmed
}

/// Checks the title, then the opening of the body, for soft-404 phrases.
///
/// The body scan is bounded to the first [`SOFT_404_SCAN_WINDOW`] characters
/// so an incidental mention deep in a real profile cannot reject it.
fn is_soft_404(body: &str) -> bool {
    if let Some(title) = extract_title(body) {
        let title = title.to_lowercase();
        if SOFT_404_PHRASES.iter().any(|phrase| title.contains(phrase)) {
            return true;
        }
    }

    let prefix: String = body
        .chars()
        .take(SOFT_404_SCAN_WINDOW)
        .collect::<String>()
        .to_lowercase();
    SOFT_404_PHRASES
        .iter()
        .any(|phrase| prefix.contains(phrase))
}

/// Detects the redirect-to-landing-page pattern for missing profiles.
///
/// An unchanged final URL always passes. A changed one is rejected when its
/// path contains a login keyword or collapses to the bare domain root.
fn is_login_redirect(probed_url: &str, final_url: &str) -> bool {
    if probed_url == final_url {
        return false;
    }

    let Ok(parsed) = Url::parse(final_url) else {
        // Unparseable final URL after a redirect: treat as suspicious.
        return true;
    };

    let path = parsed.path().to_lowercase();
    if path.is_empty() || path == "/" {
        return true;
    }

    LOGIN_REDIRECT_KEYWORDS
        .iter()
        .any(|keyword| path.contains(keyword))
}

/// Applies must_not_contain, must_contain, and regex rules, in that order.
///
/// An unparseable regex degrades to a case-insensitive substring check of
/// the raw pattern text rather than aborting verification.
fn violates_content_rules(body: &str, rules: &ContentRules) -> bool {
    let body_lower = body.to_lowercase();

    for phrase in &rules.must_not_contain {
        if body_lower.contains(&phrase.to_lowercase()) {
            return true;
        }
    }

    for phrase in &rules.must_contain {
        if !body_lower.contains(&phrase.to_lowercase()) {
            return true;
        }
    }

    for pattern in &rules.regex {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => {
                if !re.is_match(body) {
                    return true;
                }
            }
            Err(e) => {
                log::warn!("unparseable content rule regex {pattern:?} ({e}); falling back to substring match");
                if !body_lower.contains(&pattern.to_lowercase()) {
                    return true;
                }
            }
        }
    }

    false
}

/// Whole-word, case-insensitive username match.
fn contains_word(body: &str, username: &str) -> bool {
    let pattern = format!(r"\b{}\b", regex::escape(username));
    match RegexBuilder::new(&pattern).case_insensitive(true).build() {
        Ok(re) => re.is_match(body),
        // regex::escape makes this unreachable in practice; degrade to a
        // plain substring check rather than rejecting outright.
        Err(_) => body.to_lowercase().contains(&username.to_lowercase()),
    }
}
