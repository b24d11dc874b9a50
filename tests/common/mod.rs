#![allow(dead_code)]

use http::Method;
use waymark::{RequestData, Router};

pub const BASE_URL: &str = "https://example.com";
pub const SIGNATURE_KEY: &str = "a-random-32-character-secret-signature-key";

/// Router for a `GET` request on `example.com`.
pub fn router(uri: &str) -> Router {
    router_for(Method::GET, uri, Some("example.com"))
}

pub fn router_for(method: Method, uri: &str, domain: Option<&str>) -> Router {
    Router::new(RequestData::new(method, uri, domain), BASE_URL, SIGNATURE_KEY)
}

/// Point the router at another request.
pub fn request(router: &mut Router, method: Method, uri: &str) {
    let domain = router.request_data().domain().map(str::to_owned);
    router.set_request_data(RequestData::new(method, uri, domain.as_deref()));
}

/// Path and query of an absolute URL built against [`BASE_URL`].
pub fn relative(url: &str) -> &str {
    url.strip_prefix(BASE_URL).unwrap_or(url)
}
