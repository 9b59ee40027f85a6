//! HTTP probing.
//!
//! One request per site: substitute the username into the URL template,
//! send with the configured method and a fixed timeout, follow redirects,
//! and fold every transport-level failure into a [`ProbeOutcome`] variant.
//! A bad site must never propagate a fault out of its worker.

use std::time::{Duration, Instant};

use reqwest::redirect::Policy;
use reqwest::{Client, ClientBuilder};

use crate::catalog::{ProbeMethod, SiteConfig};
use crate::config::{MAX_REDIRECT_HOPS, SOCKS_PROBE_TIMEOUT, SOCKS_PROXY_ADDR, SOCKS_PROXY_URL};
use crate::error_handling::TransportErrorKind;

/// A completed HTTP exchange for one site.
#[derive(Debug, Clone)]
pub struct ProbeResponse {
    /// HTTP status code of the final response.
    pub status: u16,
    /// URL after all redirects were followed.
    pub final_url: String,
    /// Response body; empty for HEAD probes and undecodable payloads.
    pub body: String,
    /// Wall-clock time for the whole exchange.
    pub elapsed: Duration,
}

/// The raw result of one HTTP attempt.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// The site answered; content verification decides what it means.
    Response(ProbeResponse),
    /// The site could not be reached; carries no body and is never
    /// treated as evidence about the username.
    Transport(TransportErrorKind),
}

/// Checks whether a local SOCKS proxy (conventionally Tor) is listening.
///
/// A single TCP connect with a short timeout; the result is fixed for the
/// lifetime of the run.
pub async fn detect_socks_proxy() -> bool {
    matches!(
        tokio::time::timeout(
            SOCKS_PROBE_TIMEOUT,
            tokio::net::TcpStream::connect(SOCKS_PROXY_ADDR),
        )
        .await,
        Ok(Ok(_))
    )
}

/// Builds the shared HTTP client.
///
/// Redirect following is enabled with a hop cap, the timeout covers the
/// whole request including body read, and all traffic is routed through
/// the local SOCKS proxy when `use_socks` is set.
pub fn init_client(
    user_agent: &str,
    timeout: Duration,
    use_socks: bool,
) -> Result<Client, reqwest::Error> {
    let mut builder = ClientBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent)
        .redirect(Policy::limited(MAX_REDIRECT_HOPS));

    if use_socks {
        builder = builder.proxy(reqwest::Proxy::all(SOCKS_PROXY_URL)?);
    }

    builder.build()
}

/// Maps a reqwest error onto a [`TransportErrorKind`].
///
/// Timeout is checked first: reqwest reports body-read timeouts as both
/// timeout and body errors, and the timeout classification is the one that
/// matters for keeping the false-positive cache clean.
pub fn categorize_reqwest_error(e: &reqwest::Error) -> TransportErrorKind {
    if e.is_timeout() {
        TransportErrorKind::Timeout
    } else if e.is_connect() {
        TransportErrorKind::Connect
    } else if e.is_redirect() {
        TransportErrorKind::Redirect
    } else if e.is_body() || e.is_decode() {
        TransportErrorKind::Body
    } else if e.is_request() || e.is_builder() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    }
}

/// Issues the probe request for one site.
///
/// HEAD probes never read a body. For GET probes an undecodable body is
/// treated as empty rather than as a transport failure, so it falls through
/// to the verifier's minimum-length rejection; a timeout during the body
/// read stays a transport failure.
pub async fn probe_site(client: &Client, site: &SiteConfig, username: &str) -> ProbeOutcome {
    let url = site.probe_url(username);
    let started = Instant::now();

    let request = match site.method {
        ProbeMethod::Get => client.get(&url),
        ProbeMethod::Head => client.head(&url),
    };

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            log::debug!("{}: transport failure: {e}", site.name);
            return ProbeOutcome::Transport(categorize_reqwest_error(&e));
        }
    };

    let status = response.status().as_u16();
    let final_url = response.url().to_string();

    let body = if site.method == ProbeMethod::Head {
        String::new()
    } else {
        match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => {
                log::debug!("{}: body read timed out: {e}", site.name);
                return ProbeOutcome::Transport(TransportErrorKind::Timeout);
            }
            Err(e) => {
                log::debug!("{}: body undecodable, treating as empty: {e}", site.name);
                String::new()
            }
        }
    };

    ProbeOutcome::Response(ProbeResponse {
        status,
        final_url,
        body,
        elapsed: started.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client_direct() {
        let client = init_client("test-agent", Duration::from_secs(5), false);
        assert!(client.is_ok());
    }

    #[test]
    fn test_init_client_with_socks() {
        // The proxy URL is fixed and well-formed, so building must succeed
        // even when nothing is listening.
        let client = init_client("test-agent", Duration::from_secs(5), true);
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_detect_socks_proxy_absent() {
        // Nothing listens on the Tor port in the test environment.
        // If it ever does, this test is telling the truth anyway.
        let _ = detect_socks_proxy().await;
    }
}
