//! Configuration loading and validation.
//!
//! The configuration is built once at startup from defaults, an optional
//! YAML file, and the `VITE_API_URL` environment override. It is immutable
//! for the process lifetime and shared by reference.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::proxy::origin::TargetOrigin;
use crate::proxy::routes::RouteTable;

/// Environment variable that overrides the upstream origin.
pub const ORIGIN_ENV_VAR: &str = "VITE_API_URL";

/// Environment variable that overrides the config file path.
pub const CONFIG_ENV_VAR: &str = "DEVPROXY_CONFIG";

const DEFAULT_CONFIG_FILE: &str = "devproxy.yaml";
const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5173";
const DEFAULT_ORIGIN: &str = "http://localhost:8002";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub static_files: StaticConfig,
    pub resolve: ResolveConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the dev server binds to.
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Backend origin requests are forwarded to. Overridden by
    /// `VITE_API_URL` when set and non-empty.
    pub origin: String,

    /// Path prefixes that get forwarded instead of served locally.
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Directory the static pipeline serves from.
    pub root: PathBuf,

    /// Index file for directory requests.
    pub index: String,

    /// Serve the index file for extension-less misses (client-side routing).
    pub spa_fallback: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Module aliases for the build-time resolver. Validated and logged at
    /// startup; the proxy router itself never consults them.
    pub alias: Vec<AliasRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AliasRule {
    pub symbol: String,
    pub path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            routes: ["/api", "/admin", "/auth", "/media"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("dist"),
            index: "index.html".to_string(),
            spa_fallback: true,
        }
    }
}

impl Config {
    /// Load the configuration from the YAML file (if present), apply the
    /// environment override, and validate the result.
    pub fn load() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut cfg = if Path::new(&path).exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {path}"))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Invalid config file {path}"))?
        } else {
            Self::default()
        };

        cfg.apply_origin_override(std::env::var(ORIGIN_ENV_VAR).ok().as_deref());
        cfg.validate()?;
        Ok(cfg)
    }

    /// Replace the upstream origin when the override is set and non-empty.
    pub fn apply_origin_override(&mut self, value: Option<&str>) {
        if let Some(raw) = value {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.upstream.origin = trimmed.to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.server
            .listen_addr
            .parse::<SocketAddr>()
            .with_context(|| {
                format!("Invalid listen address '{}'", self.server.listen_addr)
            })?;

        TargetOrigin::parse(&self.upstream.origin)?;
        RouteTable::new(self.upstream.routes.clone())?;

        for alias in &self.resolve.alias {
            if alias.symbol.is_empty() {
                anyhow::bail!("Module alias with empty symbol");
            }
        }

        Ok(())
    }
}
