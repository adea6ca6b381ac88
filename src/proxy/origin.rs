//! Backend origin resolution.

use anyhow::{Context, Result};
use url::Url;

/// The backend origin requests are forwarded to, resolved once at startup
/// and immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOrigin {
    scheme: Scheme,
    host: String,
    port: u16,
    host_header: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl TargetOrigin {
    /// Parse an origin URL ("http://localhost:8002",
    /// "https://backend.example.com") into its connection parameters.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw)
            .with_context(|| format!("Invalid upstream origin '{raw}'"))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => anyhow::bail!("Unsupported upstream scheme '{other}'"),
        };

        let host = url
            .host_str()
            .with_context(|| format!("Upstream origin '{raw}' has no host"))?
            .to_string();

        let default_port = match scheme {
            Scheme::Http => 80,
            Scheme::Https => 443,
        };
        let port = url.port().unwrap_or(default_port);

        // The Host header the backend sees: the origin's own authority, so
        // the backend perceives itself as the direct recipient.
        let host_header = if port == default_port {
            host.clone()
        } else {
            format!("{host}:{port}")
        };

        Ok(Self {
            scheme,
            host,
            port,
            host_header,
        })
    }

    pub fn is_tls(&self) -> bool {
        self.scheme == Scheme::Https
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Value for the rewritten Host header.
    pub fn host_header(&self) -> &str {
        &self.host_header
    }
}

impl std::fmt::Display for TargetOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.scheme {
            Scheme::Http => "http",
            Scheme::Https => "https",
        };
        write!(f, "{}://{}", scheme, self.host_header)
    }
}
