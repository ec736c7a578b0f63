//! Registry client - fetches bit archives by name and version.
//!
//! # Protocol
//!
//! ```text
//! GET {endpoint}/bits/{name}/{version}
//!   200 -> gzip-compressed tar archive of the bit
//!   404 -> the registry does not have that bit version
//! ```

use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::core::BitId;

/// Timeout applied to a single bit download.
const FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure fetching a bit from a registry.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("bit `{bit}` not found in registry {endpoint}")]
    NotFound { bit: BitId, endpoint: String },

    #[error("failed to fetch bit `{bit}` from {endpoint}: {message}")]
    Network {
        bit: BitId,
        endpoint: String,
        message: String,
    },
}

/// An endpoint that is not usable as a registry base URL.
#[derive(Debug, Error)]
#[error("invalid registry endpoint `{endpoint}`: {reason}")]
pub struct EndpointError {
    pub endpoint: String,
    pub reason: String,
}

/// A source of bit archives.
pub trait Registry: Send + Sync {
    /// Human-readable endpoint, for messages.
    fn endpoint(&self) -> &str;

    /// Download the archive of one bit version.
    fn fetch(&self, bit: &BitId) -> Result<Vec<u8>, FetchError>;
}

/// Registry reached over HTTP(S).
pub struct HttpRegistry {
    endpoint: Url,
    display: String,
    client: reqwest::blocking::Client,
}

impl HttpRegistry {
    /// Create a client for the registry at `endpoint`.
    pub fn new(endpoint: &str) -> Result<Self, EndpointError> {
        let invalid = |reason: String| EndpointError {
            endpoint: endpoint.to_string(),
            reason,
        };

        let url = Url::parse(endpoint).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("not a base URL".to_string()));
        }

        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| invalid(e.to_string()))?;

        Ok(HttpRegistry {
            endpoint: url,
            display: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// URL of a bit archive.
    pub fn bit_url(&self, bit: &BitId) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["bits", bit.name(), bit.version()]);
        }
        url
    }
}

impl Registry for HttpRegistry {
    fn endpoint(&self) -> &str {
        &self.display
    }

    fn fetch(&self, bit: &BitId) -> Result<Vec<u8>, FetchError> {
        let url = self.bit_url(bit);
        tracing::debug!("GET {}", url);

        let network = |message: String| FetchError::Network {
            bit: bit.clone(),
            endpoint: self.display.clone(),
            message,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound {
                bit: bit.clone(),
                endpoint: self.display.clone(),
            });
        }
        if !status.is_success() {
            return Err(network(format!("HTTP {}", status)));
        }

        let bytes = response
            .bytes()
            .map_err(|e| network(format!("failed to read response body: {}", e)))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    use tiny_http::{Response, Server, StatusCode};

    /// Serve `cest:1.0` and answer 404 to everything else.
    fn start_server() -> (Arc<Server>, String) {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let port = server.server_addr().to_ip().unwrap().port();
        let url = format!("http://127.0.0.1:{}", port);

        let worker = Arc::clone(&server);
        thread::spawn(move || {
            for request in worker.incoming_requests() {
                let response = if request.url() == "/bits/cest/1.0" {
                    Response::from_data(b"archive-bytes".to_vec())
                } else if request.url() == "/bits/broken/1.0" {
                    Response::from_data(Vec::new()).with_status_code(StatusCode(500))
                } else {
                    Response::from_data(Vec::new()).with_status_code(StatusCode(404))
                };
                let _ = request.respond(response);
            }
        });

        (server, url)
    }

    #[test]
    fn test_bit_url() {
        let registry = HttpRegistry::new("http://localhost:8000").unwrap();
        let bit = BitId::new("cest", "1.0").unwrap();
        assert_eq!(
            registry.bit_url(&bit).as_str(),
            "http://localhost:8000/bits/cest/1.0"
        );

        let registry = HttpRegistry::new("https://example.com/cpm/").unwrap();
        assert_eq!(
            registry.bit_url(&bit).as_str(),
            "https://example.com/cpm/bits/cest/1.0"
        );
        assert_eq!(registry.endpoint(), "https://example.com/cpm");
    }

    #[test]
    fn test_rejects_bad_endpoints() {
        assert!(HttpRegistry::new("not a url").is_err());
        assert!(HttpRegistry::new("ftp://example.com").is_err());
    }

    #[test]
    fn test_fetch_found() {
        let (server, url) = start_server();
        let registry = HttpRegistry::new(&url).unwrap();

        let bytes = registry.fetch(&BitId::new("cest", "1.0").unwrap()).unwrap();
        assert_eq!(bytes, b"archive-bytes");

        server.unblock();
    }

    #[test]
    fn test_fetch_not_found() {
        let (server, url) = start_server();
        let registry = HttpRegistry::new(&url).unwrap();

        let err = registry
            .fetch(&BitId::new("missing", "1.0").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::NotFound { .. }));

        server.unblock();
    }

    #[test]
    fn test_fetch_server_error_is_network_error() {
        let (server, url) = start_server();
        let registry = HttpRegistry::new(&url).unwrap();

        let err = registry
            .fetch(&BitId::new("broken", "1.0").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));

        server.unblock();
    }

    #[test]
    fn test_fetch_unreachable_is_network_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let registry = HttpRegistry::new(&format!("http://127.0.0.1:{}", port)).unwrap();

        let err = registry
            .fetch(&BitId::new("cest", "1.0").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }
}
