use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::error::UrlGenerationError;
use crate::params::Params;
use crate::request::split_uri;
use crate::route::signature_suffix;

type HmacSha256 = Hmac<Sha256>;

/// When a signed URL stops being valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Absolute Unix timestamp in seconds.
    Timestamp(u64),
    At(SystemTime),
    /// Relative to now.
    In(Duration),
}

impl Expiration {
    /// Absolute Unix timestamp in seconds.
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        let at = match self {
            Expiration::Timestamp(ts) => return *ts,
            Expiration::At(at) => *at,
            Expiration::In(after) => SystemTime::now() + *after,
        };
        at.duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default()
    }
}

impl From<u64> for Expiration {
    fn from(ts: u64) -> Self {
        Expiration::Timestamp(ts)
    }
}

impl From<SystemTime> for Expiration {
    fn from(at: SystemTime) -> Self {
        Expiration::At(at)
    }
}

impl From<Duration> for Expiration {
    fn from(after: Duration) -> Self {
        Expiration::In(after)
    }
}

/// Pattern, parameters and canonical URL of a signed link before the signature is filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalSignature {
    pub pattern: String,
    pub params: Params,
    /// Full URL with the signature slot blanked; the HMAC input.
    pub canonical: String,
}

/// Turns patterns and parameters into URLs; signs and verifies them.
#[derive(Clone)]
pub struct UrlGenerator {
    url_base: String,
    signature_key: String,
    signature_name: String,
    expires_name: String,
    base_urls: HashMap<String, String>,
}

impl UrlGenerator {
    #[must_use]
    pub fn new(url_base: &str, signature_key: &str) -> Self {
        Self::with_names(url_base, signature_key, "signature", "expires")
    }

    #[must_use]
    pub fn with_names(
        url_base: &str,
        signature_key: &str,
        signature_name: &str,
        expires_name: &str,
    ) -> Self {
        Self {
            url_base: url_base.to_owned(),
            signature_key: signature_key.to_owned(),
            signature_name: signature_name.to_owned(),
            expires_name: expires_name.to_owned(),
            base_urls: HashMap::new(),
        }
    }

    #[must_use]
    pub fn url_base(&self) -> &str {
        &self.url_base
    }

    pub fn set_url_base(&mut self, url_base: &str) {
        self.url_base = url_base.to_owned();
    }

    /// Bind a base URL to an exact pattern string.
    pub fn add_base_url(&mut self, uri: &str, base_url: &str) {
        self.base_urls.insert(uri.to_owned(), base_url.to_owned());
    }

    pub fn set_base_urls(&mut self, base_urls: HashMap<String, String>) {
        self.base_urls = base_urls;
    }

    #[must_use]
    pub fn base_url(&self, uri: &str) -> Option<&str> {
        self.base_urls.get(uri).map(String::as_str)
    }

    #[must_use]
    pub fn signature_name(&self) -> &str {
        &self.signature_name
    }

    #[must_use]
    pub fn expires_name(&self) -> &str {
        &self.expires_name
    }

    /// Resolve `uri` with `params`.
    ///
    /// Placeholders consume their parameter; what is left becomes the query
    /// string. Optional and wildcard placeholders may be missing, a missing
    /// required one fails naming the first such parameter. Empty segments are
    /// dropped from the path.
    ///
    /// `base_url` overrides the base bound to `uri` and the global base.
    pub fn generate(
        &self,
        uri: &str,
        params: &Params,
        base_url: Option<&str>,
    ) -> Result<String, UrlGenerationError> {
        let mut params = params.clone();
        let mut segments: Vec<String> = Vec::new();
        let mut missing: Option<&str> = None;

        for segment in uri.split('/').filter(|s| !s.is_empty()) {
            let Some(placeholder) = segment.strip_prefix('{') else {
                segments.push(segment.to_owned());
                continue;
            };
            let (name, optional) = parse_placeholder(placeholder);
            match params.remove(name) {
                Some(value) => segments.push(value),
                None if !optional && missing.is_none() => missing = Some(name),
                None => {}
            }
        }

        if let Some(parameter) = missing {
            debug!(uri = %uri, parameter = %parameter, "Missing url parameter");
            return Err(UrlGenerationError::MissingParameter {
                uri: uri.to_owned(),
                parameter: parameter.to_owned(),
            });
        }

        let mut resolved = segments
            .iter()
            .filter(|s| !s.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("/");
        if !params.is_empty() {
            resolved.push('?');
            resolved.push_str(&params.to_query_string());
        }
        Ok(self.build_full_url(uri, &resolved, base_url))
    }

    /// Resolve and sign `uri`.
    ///
    /// Path mode appends `/{?signature}/{?expires}` to the pattern; query mode
    /// carries both as query parameters instead.
    pub fn generate_signed(
        &self,
        uri: &str,
        params: &Params,
        expiration: Option<Expiration>,
        with_query: bool,
        base_url: Option<&str>,
    ) -> Result<String, UrlGenerationError> {
        let CanonicalSignature {
            pattern,
            mut params,
            canonical,
        } = self.canonical_string_to_sign(uri, params, expiration, with_query, base_url)?;
        let signature = self.sign(&canonical)?;
        params.insert(self.signature_name.as_str(), signature);
        // The base bound to the unsuffixed pattern follows the signed one.
        let base_url = base_url.or_else(|| self.base_url(uri));
        self.generate(&pattern, &params, base_url)
    }

    /// The string a signed link's HMAC covers.
    ///
    /// The signature parameter is present but empty; the expiry, if any, is
    /// already substituted. Signing and verification both go through here.
    pub fn canonical_string_to_sign(
        &self,
        uri: &str,
        params: &Params,
        expiration: Option<Expiration>,
        with_query: bool,
        base_url: Option<&str>,
    ) -> Result<CanonicalSignature, UrlGenerationError> {
        let suffix = signature_suffix(&self.signature_name, &self.expires_name);
        let pattern = if with_query {
            uri.strip_suffix(suffix.as_str()).unwrap_or(uri).to_owned()
        } else if uri.ends_with(suffix.as_str()) {
            uri.to_owned()
        } else {
            format!("{uri}{suffix}")
        };

        let mut params = params.clone();
        if let Some(expiration) = expiration {
            params.insert(self.expires_name.as_str(), expiration.timestamp());
        }
        params.insert(self.signature_name.as_str(), "");

        let base_url = base_url.or_else(|| self.base_url(uri));
        let canonical = self.generate(&pattern, &params, base_url)?;
        Ok(CanonicalSignature {
            pattern,
            params,
            canonical,
        })
    }

    /// Check the signature and expiry embedded in `request_uri` for the route pattern `uri`.
    ///
    /// A non-empty `signature` query parameter selects query mode; otherwise
    /// the trailing path segments carry `…/{signature}` or
    /// `…/{signature}/{expires}`.
    #[must_use]
    pub fn has_valid_signature(&self, uri: &str, request_uri: &str, base_url: Option<&str>) -> bool {
        let (path, query) = split_uri(request_uri);
        let mut query_params = query.map(Params::from_query_string).unwrap_or_default();
        let with_query = query_params
            .get(&self.signature_name)
            .is_some_and(|s| !s.is_empty());

        let (signature, expires, resolved) = if with_query {
            let signature = query_params
                .insert(self.signature_name.as_str(), "")
                .unwrap_or_default();
            let expires = query_params.get(&self.expires_name).map(str::to_owned);
            let resolved = format!("{path}?{}", query_params.to_query_string());
            (signature, expires, resolved)
        } else {
            let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            let count = segments.len();
            let has_expiry = count >= 2 && segments.last().is_some_and(|s| is_timestamp(s));
            let (signature_at, expires) = if has_expiry {
                (count - 2, segments.last().map(|s| (*s).to_owned()))
            } else {
                (count.saturating_sub(1), None)
            };
            let signature = segments
                .get(signature_at)
                .map(|s| (*s).to_owned())
                .unwrap_or_default();
            if let Some(slot) = segments.get_mut(signature_at) {
                *slot = "";
            }
            let mut resolved = segments
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join("/");
            if let Some(query) = query {
                resolved.push('?');
                resolved.push_str(query);
            }
            (signature, expires, resolved)
        };

        if let Some(expires) = expires {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            if expires.parse::<u64>().map_or(true, |expires| now > expires) {
                debug!(uri = %uri, expires = %expires, "Signed url expired");
                return false;
            }
        }

        let canonical = self.build_full_url(uri, &resolved, base_url);
        let Ok(provided) = hex::decode(&signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(self.signature_key.as_bytes()) else {
            return false;
        };
        mac.update(canonical.as_bytes());
        let valid = mac.verify_slice(&provided).is_ok();
        if !valid {
            debug!(uri = %uri, "Signed url signature mismatch");
        }
        valid
    }

    /// Lowercase hex HMAC-SHA256 of `canonical` under the signing key.
    pub fn sign(&self, canonical: &str) -> Result<String, UrlGenerationError> {
        let mut mac = HmacSha256::new_from_slice(self.signature_key.as_bytes())
            .map_err(|_| UrlGenerationError::InvalidSigningKey)?;
        mac.update(canonical.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    fn build_full_url(&self, uri: &str, resolved: &str, base_url: Option<&str>) -> String {
        let base = base_url
            .or_else(|| self.base_url(uri))
            .unwrap_or(&self.url_base);
        if resolved.is_empty() {
            return base.to_owned();
        }
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            resolved.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for UrlGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlGenerator")
            .field("url_base", &self.url_base)
            .field("signature_key", &"<redacted>")
            .field("signature_name", &self.signature_name)
            .field("expires_name", &self.expires_name)
            .field("base_urls", &self.base_urls)
            .finish()
    }
}

/// `name*` and `?name` are optional; the braces are already opened.
fn parse_placeholder(placeholder: &str) -> (&str, bool) {
    let inner = placeholder.trim_end_matches('}');
    if let Some(name) = inner.strip_suffix('*') {
        return (name, true);
    }
    match inner.strip_prefix(['?', '!']) {
        Some(name) => (name, true),
        None => (inner, false),
    }
}

fn is_timestamp(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) && segment.parse::<u64>().is_ok()
}
