// Shared test helpers: a local stub HTTP server and catalog file builders.
//
// The stub server keeps engine tests off the external network: it binds an
// ephemeral 127.0.0.1 port and serves canned responses keyed by request
// path, which is all the prober needs (status, body, redirects).

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One canned response, keyed by request path.
#[allow(dead_code)] // Used by other test files
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub location: Option<String>,
    pub delay: Duration,
}

#[allow(dead_code)]
impl StubResponse {
    pub fn ok(body: &str) -> Self {
        StubResponse {
            status: 200,
            body: body.to_string(),
            location: None,
            delay: Duration::ZERO,
        }
    }

    pub fn not_found() -> Self {
        StubResponse {
            status: 404,
            body: "<html><body>nothing to see</body></html>".to_string(),
            location: None,
            delay: Duration::ZERO,
        }
    }

    pub fn redirect_to(location: &str) -> Self {
        StubResponse {
            status: 302,
            body: String::new(),
            location: Some(location.to_string()),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// A page that passes every default verification stage for `username`.
#[allow(dead_code)]
pub fn profile_page(username: &str) -> String {
    format!(
        "<html><head><title>{username} on StubNet</title></head>\
         <body><h1>{username}</h1><p>Profile of {username}, who has been a \
         member here for quite a while and posts fairly regularly.</p></body></html>"
    )
}

/// Starts the stub server; it lives until the test process exits.
#[allow(dead_code)]
pub async fn start_stub_server(routes: HashMap<String, StubResponse>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub server");
    let addr = listener.local_addr().expect("Failed to get stub address");
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = stream.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]);
                let path = request
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();

                let fallback = StubResponse::not_found();
                let response = routes.get(&path).unwrap_or(&fallback);
                if response.delay > Duration::ZERO {
                    tokio::time::sleep(response.delay).await;
                }

                let _ = stream.write_all(render(response).as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}

fn render(response: &StubResponse) -> String {
    let reason = match response.status {
        200 => "OK",
        302 => "Found",
        404 => "Not Found",
        _ => "Status",
    };
    let mut head = format!(
        "HTTP/1.1 {} {reason}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        response.body.len()
    );
    if let Some(location) = &response.location {
        head.push_str(&format!("Location: {location}\r\n"));
    }
    format!("{head}\r\n{}", response.body)
}

/// Writes a catalog file mapping each (name, path-prefix) pair to a site on
/// the stub server, with a low minimum length so small canned bodies pass.
#[allow(dead_code)]
pub fn write_stub_catalog(path: &Path, addr: SocketAddr, sites: &[(&str, &str)]) {
    let entries: Vec<String> = sites
        .iter()
        .map(|(name, prefix)| {
            format!(
                r#""{name}": {{"url": "http://{addr}{prefix}/{{}}", "min_content_length": 20}}"#
            )
        })
        .collect();
    std::fs::write(path, format!("{{{}}}", entries.join(","))).expect("Failed to write catalog");
}
