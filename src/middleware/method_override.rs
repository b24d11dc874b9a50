use http::{HeaderMap, Method};
use tracing::debug;

use crate::params::Params;
use crate::request::RequestData;

pub const DEFAULT_OVERRIDE_HEADER: &str = "X-Http-Method-Override";
pub const DEFAULT_OVERRIDE_FIELD: &str = "_method";

/// Rewrites the request verb from a header, or from a form field on `POST`.
///
/// HTML forms can only `GET` and `POST`; a hidden `_method` field or the
/// `X-Http-Method-Override` header lets them reach `PUT`, `PATCH` and
/// `DELETE` routes. The header wins over the field.
#[derive(Debug, Clone)]
pub struct MethodOverride {
    header: String,
    field: String,
}

impl Default for MethodOverride {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_HEADER, DEFAULT_OVERRIDE_FIELD)
    }
}

impl MethodOverride {
    #[must_use]
    pub fn new(header: &str, field: &str) -> Self {
        Self {
            header: header.to_owned(),
            field: field.to_owned(),
        }
    }

    /// The verb `request` should be routed as, if it is overridden.
    #[must_use]
    pub fn method(&self, request: &RequestData, headers: &HeaderMap, form: Option<&Params>) -> Option<Method> {
        let from_header = headers
            .get(self.header.as_str())
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());
        if let Some(value) = from_header {
            return Some(RequestData::parse_method(value));
        }

        if *request.method() != Method::POST {
            return None;
        }
        form.and_then(|form| form.get(&self.field))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(RequestData::parse_method)
    }

    /// `request` with the overridden verb; unchanged when nothing overrides it.
    #[must_use]
    pub fn apply(&self, request: &RequestData, headers: &HeaderMap, form: Option<&Params>) -> RequestData {
        match self.method(request, headers, form) {
            Some(method) => {
                debug!(from = %request.method(), to = %method, "Request method overridden");
                request.with_method(method)
            }
            None => request.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn test_header_override() {
        let request = RequestData::new(Method::GET, "/blog/5", None);
        let mut headers = HeaderMap::new();
        headers.insert("x-http-method-override", HeaderValue::from_static("delete"));

        let overridden = MethodOverride::default().apply(&request, &headers, None);
        assert_eq!(*overridden.method(), Method::DELETE);
        assert_eq!(overridden.uri(), "/blog/5");
    }

    #[test]
    fn test_form_field_only_on_post() {
        let form = Params::from([("_method", "PUT")]);
        let override_ = MethodOverride::default();

        let post = RequestData::new(Method::POST, "/blog/5", None);
        assert_eq!(
            *override_.apply(&post, &HeaderMap::new(), Some(&form)).method(),
            Method::PUT
        );

        let get = RequestData::new(Method::GET, "/blog/5", None);
        assert_eq!(override_.method(&get, &HeaderMap::new(), Some(&form)), None);
        assert_eq!(override_.method(&post, &HeaderMap::new(), None), None);
    }
}
