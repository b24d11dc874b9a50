use std::sync::{Arc, Mutex};

use http::Method;
use serde_json::{json, Value};

use super::Router;
use crate::config::RouterConfig;
use crate::domain::Domain;
use crate::error::{RoutingError, UrlGenerationError};
use crate::handler::{Handler, HandlerInvoker, RouteResponse};
use crate::params::Params;
use crate::request::RequestData;
use crate::route::{Route, RouteRegistrar};

fn router(uri: &str) -> Router {
    Router::new(
        RequestData::new(Method::GET, uri, Some("example.com")),
        "https://example.com",
        "a-random-32-character-secret-signature-key",
    )
}

#[test]
fn test_dispatch_is_memoized() {
    let mut router = router("/blog/45");
    router.get("blog/{id}", "blog.show").name("blog.show");

    let first = router.dispatch().unwrap().clone();
    // Routes registered after the match do not change the cached result.
    router.get("blog/{slug}", "blog.slug");
    let second = router.dispatch().unwrap();
    assert_eq!(second.uri(), first.uri());
    assert_eq!(second.request_parameters().get("id"), Some("45"));
    assert_eq!(router.matched_route().map(Route::uri), Some("blog/{id}"));

    router.set_request_data(RequestData::new(Method::GET, "/blog/46", None));
    assert!(router.matched_route().is_none());
    assert_eq!(
        router.dispatch().unwrap().request_parameters().get("id"),
        Some("46")
    );
}

#[test]
fn test_route_lookup_by_name() {
    let mut router = router("/");
    router.get("about", "about").name("about");
    router.get("about-us", "about").name("about");
    router.get("contact", "contact");

    assert_eq!(router.route("about").map(Route::uri), Some("about-us"));
    assert!(router.route("contact").is_none());
    assert_eq!(router.routes().len(), 3);
}

#[test]
fn test_clear_archives_named_routes() {
    let mut router = router("/about");
    router.get("about", "about").name("about");
    router.get("contact", "contact");
    router.dispatch().unwrap();

    router.clear();
    assert!(router.routes().is_empty());
    assert!(router.matched_route().is_none());
    assert_eq!(router.old_routes().len(), 1);

    // Links to archived routes still build.
    let mut url = router.url("about", Params::new()).unwrap();
    assert_eq!(url.generate().unwrap(), "https://example.com/about");

    let err = router.dispatch().unwrap_err();
    assert!(matches!(err, RoutingError::RouteNotFound { .. }));
}

#[test]
fn test_url_for_undefined_route() {
    let router = router("/");
    let err = router.url("missing", Params::new()).unwrap_err();
    assert!(matches!(
        err,
        RoutingError::UrlGeneration(UrlGenerationError::UndefinedRoute { ref name }) if name == "missing"
    ));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn test_base_uri_is_stripped() {
    let mut router = router("/app/blog/45?page=2");
    router.set_base_uri("/app/");
    assert_eq!(router.base_uri(), Some("app"));
    router.get("blog/{id}", "blog.show");

    let route = router.dispatch().unwrap();
    assert_eq!(route.request_parameters().get("id"), Some("45"));
    assert_eq!(route.request_parameters().get("page"), Some("2"));
    assert_eq!(route.params().request_uri.as_deref(), Some("/blog/45?page=2"));

    router.set_request_data(RequestData::new(Method::GET, "/application/blog/45", None));
    assert!(router.dispatch().is_err());
}

#[test]
fn test_request_attributes() {
    let mut router = router("/about");
    assert!(router.request_attributes().is_empty());
    router.get("about", "about").name("about").parameter("menu", true);
    router.dispatch().unwrap();

    let attributes = router.request_attributes();
    assert_eq!(
        attributes,
        vec![
            ("route.uri".to_string(), json!("about")),
            ("route.name".to_string(), json!("about")),
            ("route.request_uri".to_string(), json!("/about")),
        ]
    );

    router.set_request_attributes(["menu", "locale"]);
    assert_eq!(
        router.request_attributes(),
        vec![("route.menu".to_string(), Value::Bool(true))]
    );
}

#[test]
fn test_respond_runs_listeners_and_handler() {
    let fired = Arc::new(Mutex::new(Vec::new()));
    let mut router = router("/blog/45");
    router
        .get(
            "blog/{id}",
            Handler::closure(|args| RouteResponse::from(json!({ "id": args.get("id") }))),
        )
        .name("blog.show");

    let seen = Arc::clone(&fired);
    router.matched(
        "blog.show",
        move |route: &Route| {
            seen.lock()
                .unwrap()
                .push(route.request_parameters().get("id").unwrap_or("").to_string());
        },
        0,
    );

    let response = router.respond();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, json!({ "id": "45" }));
    assert_eq!(*fired.lock().unwrap(), vec!["45".to_string()]);

    // Listeners run once.
    router.respond();
    assert_eq!(fired.lock().unwrap().len(), 1);
}

#[test]
fn test_respond_maps_errors_to_status() {
    let mut router = router("/missing");
    router.get("about", "about");
    let response = router.respond();
    assert_eq!(response.status, 404);
    assert_eq!(response.body["error"], "Not Found");

    let mut router = router_for_named_handler();
    assert_eq!(router.respond().status, 500);

    router
        .handlers_mut()
        .register_handler("report", |_| RouteResponse::from("report"));
    let response = router.respond();
    assert_eq!(response.status, 200);
    assert_eq!(response.body_string(), "report");
}

fn router_for_named_handler() -> Router {
    let mut router = router("/report");
    router.get("report", "report");
    router
}

#[test]
fn test_custom_invoker() {
    struct Echo;

    impl HandlerInvoker for Echo {
        fn invoke(&self, route: &Route) -> crate::Result<RouteResponse> {
            Ok(RouteResponse::from(route.uri().to_string()))
        }
    }

    let mut router = router("/anything/here");
    router.any("{path*}", "unregistered");
    router.set_invoker(Echo);
    assert_eq!(router.respond().body_string(), "{path*}");
}

#[test]
fn test_from_config() {
    let config = RouterConfig {
        base_url: "https://example.com".to_string(),
        signature_key: "a-random-32-character-secret-signature-key".to_string(),
        signature_name: "sig".to_string(),
        base_uri: Some("app".to_string()),
        domains: vec![Domain::new("example.ch", "ch.localhost", "http://ch.localhost")],
        ..RouterConfig::default()
    };
    let request = RequestData::new(Method::GET, "/app/blog", Some("ch.localhost"));
    let mut router = Router::from_config(&config, request);
    router.get("blog", "blog").name("blog").domain("example.ch");
    router.get("unsubscribe/{user}", "unsubscribe").signed("unsubscribe", true);

    assert_eq!(router.dispatch().unwrap().uri(), "blog");
    assert_eq!(
        router.url("blog", Params::new()).unwrap().generate().unwrap(),
        "http://ch.localhost/blog"
    );
    assert_eq!(
        router.route("unsubscribe").map(Route::uri),
        Some("unsubscribe/{user}/{?sig}/{?expires}")
    );
}
