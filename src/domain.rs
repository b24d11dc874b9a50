//! Domain registry: logical keys to physical hostnames and base URIs.

use serde::Deserialize;

/// One deployment domain.
///
/// `key` is the name routes refer to (`"example.ch"`), `domain` the host the
/// request arrives on (`"ch.localhost"`) and `uri` the base URL generated
/// links use (`"http://ch.localhost"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Domain {
    key: String,
    domain: String,
    uri: String,
}

impl Domain {
    #[must_use]
    pub fn new(key: impl Into<String>, domain: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            domain: domain.into(),
            uri: uri.into(),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

/// Registry addressed by key or by hostname.
#[derive(Debug, Clone, Default)]
pub struct Domains {
    domains: Vec<Domain>,
}

impl Domains {
    #[must_use]
    pub fn new(domains: impl IntoIterator<Item = Domain>) -> Self {
        let mut registry = Self::default();
        for domain in domains {
            registry.add(domain);
        }
        registry
    }

    /// Add a domain. A domain with the same key is replaced.
    pub fn add(&mut self, domain: Domain) -> &mut Self {
        match self.domains.iter_mut().find(|d| d.key == domain.key) {
            Some(existing) => *existing = domain,
            None => self.domains.push(domain),
        }
        self
    }

    #[must_use]
    pub fn has(&self, key_or_domain: &str) -> bool {
        self.get(key_or_domain).is_some()
    }

    /// Look up by key first, then by hostname.
    #[must_use]
    pub fn get(&self, key_or_domain: &str) -> Option<&Domain> {
        self.domains
            .iter()
            .find(|d| d.key == key_or_domain)
            .or_else(|| self.domains.iter().find(|d| d.domain == key_or_domain))
    }

    #[must_use]
    pub fn all(&self) -> &[Domain] {
        &self.domains
    }

    /// Registered hostnames.
    #[must_use]
    pub fn domains(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.domain.as_str()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
