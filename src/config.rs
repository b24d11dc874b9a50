//! # Router Configuration
//!
//! Settings a [`Router`](crate::Router) is built from: the base URL links
//! are generated against, the signing key and parameter names of signed
//! links, the mount prefix stripped from request paths, the route values
//! exported as request attributes and the domain registry.
//!
//! ## Environment Variables
//!
//! | Variable                 | Field            | Default            |
//! |--------------------------|------------------|--------------------|
//! | `WAYMARK_BASE_URL`       | `base_url`       | `http://localhost` |
//! | `WAYMARK_SIGNATURE_KEY`  | `signature_key`  | empty              |
//! | `WAYMARK_SIGNATURE_NAME` | `signature_name` | `signature`        |
//! | `WAYMARK_EXPIRES_NAME`   | `expires_name`   | `expires`          |
//! | `WAYMARK_BASE_URI`       | `base_uri`       | unset              |
//!
//! ## YAML
//!
//! ```yaml
//! base_url: https://example.com
//! signature_key: a-random-32-character-secret-signature-key
//! base_uri: app
//! request_attributes: [uri, name, request_uri, locale]
//! domains:
//!   - key: example.ch
//!     domain: ch.localhost
//!     uri: http://ch.localhost
//! ```

use std::env;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::domain::Domain;

pub const DEFAULT_BASE_URL: &str = "http://localhost";
pub const DEFAULT_SIGNATURE_NAME: &str = "signature";
pub const DEFAULT_EXPIRES_NAME: &str = "expires";

/// Route values exported as `route.<name>` request attributes by default.
pub const DEFAULT_REQUEST_ATTRIBUTES: [&str; 3] = ["uri", "name", "request_uri"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Global base URL of generated links.
    pub base_url: String,
    /// HMAC key for signed links.
    pub signature_key: String,
    pub signature_name: String,
    pub expires_name: String,
    /// Mount prefix stripped from request paths before matching.
    pub base_uri: Option<String>,
    pub request_attributes: Vec<String>,
    pub domains: Vec<Domain>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            signature_key: String::new(),
            signature_name: DEFAULT_SIGNATURE_NAME.to_owned(),
            expires_name: DEFAULT_EXPIRES_NAME.to_owned(),
            base_uri: None,
            request_attributes: DEFAULT_REQUEST_ATTRIBUTES
                .iter()
                .map(|attr| (*attr).to_owned())
                .collect(),
            domains: Vec::new(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from `WAYMARK_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// unset or empty values.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            base_url: value("WAYMARK_BASE_URL").unwrap_or(defaults.base_url),
            signature_key: value("WAYMARK_SIGNATURE_KEY").unwrap_or(defaults.signature_key),
            signature_name: value("WAYMARK_SIGNATURE_NAME").unwrap_or(defaults.signature_name),
            expires_name: value("WAYMARK_EXPIRES_NAME").unwrap_or(defaults.expires_name),
            base_uri: value("WAYMARK_BASE_URI"),
            ..defaults
        }
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse router config")
    }

    pub fn from_yaml_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read router config: {}", path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse router config: {}", path.display()))
    }
}
