//! The request facts routing depends on: method, raw URI and host.

use http::Method;

use crate::params::Params;

/// Immutable request snapshot.
///
/// `with_*` methods return a new value; the original is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestData {
    method: Method,
    uri: String,
    domain: Option<String>,
}

impl RequestData {
    /// `uri` is the raw request target, path plus optional query string.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>, domain: Option<&str>) -> Self {
        Self {
            method,
            uri: uri.into(),
            domain: domain.map(str::to_owned),
        }
    }

    /// Parse a method name case-insensitively. Unknown verbs become extension methods.
    #[must_use]
    pub fn parse_method(method: &str) -> Method {
        Method::from_bytes(method.to_ascii_uppercase().as_bytes()).unwrap_or(Method::GET)
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Path without query, trimmed of surrounding slashes (`/blog/5/` → `blog/5`).
    #[must_use]
    pub fn path(&self) -> &str {
        split_uri(&self.uri).0
    }

    /// Raw query string, if a non-empty one is present.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        split_uri(&self.uri).1
    }

    /// Query pairs, decoded.
    #[must_use]
    pub fn query_params(&self) -> Params {
        self.query().map(Params::from_query_string).unwrap_or_default()
    }

    #[must_use]
    pub fn with_method(&self, method: Method) -> Self {
        Self {
            method,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_uri(&self, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_domain(&self, domain: Option<&str>) -> Self {
        Self {
            domain: domain.map(str::to_owned),
            ..self.clone()
        }
    }
}

impl Default for RequestData {
    fn default() -> Self {
        Self::new(Method::GET, "", None)
    }
}

/// Split a request target into trimmed path and non-empty query.
///
/// Accepts absolute URLs as well (`https://host/blog?x=1`); scheme and
/// authority are ignored. A fragment is dropped.
#[must_use]
pub fn split_uri(uri: &str) -> (&str, Option<&str>) {
    let uri = uri.split_once('#').map_or(uri, |(before, _)| before);
    let uri = strip_origin(uri);
    let (path, query) = match uri.split_once('?') {
        Some((path, query)) => (path, (!query.is_empty()).then_some(query)),
        None => (uri, None),
    };
    (path.trim_matches('/'), query)
}

fn strip_origin(uri: &str) -> &str {
    match uri.find("://") {
        Some(index) if !uri[..index].contains(['/', '?']) => {
            let rest = &uri[index + 3..];
            let end = rest.find(['/', '?']).unwrap_or(rest.len());
            &rest[end..]
        }
        _ => uri,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_uri() {
        assert_eq!(split_uri("/blog/5/"), ("blog/5", None));
        assert_eq!(split_uri("blog?x=1"), ("blog", Some("x=1")));
        assert_eq!(split_uri("/blog?"), ("blog", None));
        assert_eq!(split_uri("/"), ("", None));
        assert_eq!(
            split_uri("https://example.com/unsubscribe/5?signature=ab"),
            ("unsubscribe/5", Some("signature=ab"))
        );
        assert_eq!(split_uri("https://example.com"), ("", None));
        assert_eq!(split_uri("about#team"), ("about", None));
    }

    #[test]
    fn test_with_methods_do_not_mutate() {
        let request = RequestData::new(Method::GET, "/blog", Some("example.com"));
        let post = request.with_method(Method::POST);
        let other = request.with_domain(None).with_uri("/shop?page=2");

        assert_eq!(*request.method(), Method::GET);
        assert_eq!(*post.method(), Method::POST);
        assert_eq!(other.domain(), None);
        assert_eq!(other.path(), "shop");
        assert_eq!(other.query_params().get("page"), Some("2"));
        assert_eq!(request.uri(), "/blog");
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(RequestData::parse_method("patch"), Method::PATCH);
        assert_eq!(RequestData::parse_method("Delete"), Method::DELETE);
    }
}
