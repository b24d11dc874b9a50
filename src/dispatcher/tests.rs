use std::collections::HashMap;

use http::Method;

use super::*;
use crate::constrainer::{Constrainer, Constraint};
use crate::error::RoutingError;
use crate::handler::Handler;
use crate::params::Params;
use crate::request::RequestData;
use crate::route::{Route, RouteFactory};
use crate::url::{Expiration, UrlGenerator};

const KEY: &str = "a-random-32-character-secret-signature-key";

fn route(method: &str, uri: &str) -> Route {
    RouteFactory::default().create_route(method, uri, Handler::named(uri))
}

fn generator() -> UrlGenerator {
    UrlGenerator::new("https://example.com", KEY)
}

fn get(uri: &str) -> RequestData {
    RequestData::new(Method::GET, uri, None)
}

fn dispatch(routes: &[Route], request: &RequestData) -> crate::Result<Route> {
    RouteDispatcher::default().dispatch_routes(routes, request, &generator())
}

#[test]
fn test_pattern_source() {
    let constrainer = Constrainer::new();
    let none = HashMap::new();

    let (source, names) = pattern_source("{?locale}/blog/{id}", &none, &constrainer);
    assert_eq!(source, "^(?P<p0>/(?:[^/]+))?/blog(?P<p1>/(?:[^/]+))$");
    assert_eq!(names, vec!["locale", "id"]);

    let (source, names) = pattern_source("files/{path*}/ignored", &none, &constrainer);
    assert_eq!(source, "^/files(?P<p0>/(?:[^?]+))$");
    assert_eq!(names, vec!["path"]);

    let mut constraints = HashMap::new();
    constraints.insert("id".to_string(), Constraint::from(":num:1:3"));
    let (source, _) = pattern_source("blog.v2/{id}", &constraints, &constrainer);
    assert_eq!(source, r"^/blog\.v2(?P<p0>/(?:[0-9]{1,3}))$");
}

#[test]
fn test_static_routes_first_match_wins() {
    let routes = vec![route("GET", "about"), route("GET", "about"), route("GET", "blog")];
    let matched = dispatch(&routes, &get("/about/")).unwrap();
    assert_eq!(matched.uri(), "about");
    assert!(matched.request_parameters().is_empty());
    assert_eq!(matched.params().request_uri.as_deref(), Some("/about/"));
    assert_eq!(matched.params().request_method.as_deref(), Some("GET"));

    let err = dispatch(&routes, &get("contact")).unwrap_err();
    assert!(matches!(err, RoutingError::RouteNotFound { ref uri, .. } if uri == "contact"));
}

#[test]
fn test_placeholders_and_constraints() {
    let mut blog = route("GET", "blog/{id}");
    blog.constrain("id", ":num");
    let routes = vec![blog, route("GET", "blog/{slug}")];

    let by_id = dispatch(&routes, &get("blog/45")).unwrap();
    assert_eq!(by_id.uri(), "blog/{id}");
    assert_eq!(by_id.request_parameters().get("id"), Some("45"));

    let by_slug = dispatch(&routes, &get("blog/hello-world")).unwrap();
    assert_eq!(by_slug.uri(), "blog/{slug}");
    assert_eq!(by_slug.request_parameters().get("slug"), Some("hello-world"));
}

#[test]
fn test_alternation_constraints_stay_inside_their_segment() {
    let mut blog = route("GET", "blog/{id}");
    blog.constrain("id", "[0-9]+|new");
    let mut about = route("GET", "{?locale}/about");
    about.constrain("locale", "de|en");
    let routes = vec![blog, about];

    let new = dispatch(&routes, &get("/blog/new")).unwrap();
    assert_eq!(new.request_parameters().get("id"), Some("new"));
    assert!(dispatch(&routes, &get("/blog/45")).is_ok());
    assert!(dispatch(&routes, &get("/blognew")).is_err());
    assert!(dispatch(&routes, &get("/blog/old")).is_err());

    let localized = dispatch(&routes, &get("/en/about")).unwrap();
    assert_eq!(localized.request_parameters().get("locale"), Some("en"));
    assert!(dispatch(&routes, &get("/about")).is_ok());
    assert!(dispatch(&routes, &get("/fr/about")).is_err());
}

#[test]
fn test_post_match_rule_check() {
    let mut user = route("GET", "users/{id}");
    user.constrain("id", ":id:5:10");
    let routes = vec![user];

    assert!(dispatch(&routes, &get("users/10")).is_ok());
    // Matches the regex ([0-9]{1,5}) but is below the minimum.
    assert!(dispatch(&routes, &get("users/9")).is_err());
}

#[test]
fn test_optional_and_wildcard_segments() {
    let routes = vec![route("GET", "{?locale}/shop"), route("GET", "files/{path*}"), route("GET", "{?page}")];

    let plain = dispatch(&routes, &get("shop")).unwrap();
    assert_eq!(plain.request_parameters().get("locale"), Some(""));
    let localized = dispatch(&routes, &get("/en/shop")).unwrap();
    assert_eq!(localized.request_parameters().get("locale"), Some("en"));

    let files = dispatch(&routes, &get("files/a/b/c.txt")).unwrap();
    assert_eq!(files.request_parameters().get("path"), Some("a/b/c.txt"));

    let home = dispatch(&routes, &get("/")).unwrap();
    assert_eq!(home.uri(), "{?page}");
}

#[test]
fn test_method_specs() {
    let routes = vec![route("GET|HEAD", "page"), route("*", "any"), route("POST", "form")];
    let head = RequestData::new(Method::HEAD, "page", None);
    assert!(dispatch(&routes, &head).is_ok());

    let delete = RequestData::new(Method::DELETE, "any", None);
    assert!(dispatch(&routes, &delete).is_ok());
    let custom = RequestData::new(RequestData::parse_method("purge"), "any", None);
    assert!(dispatch(&routes, &custom).is_err());

    assert!(dispatch(&routes, &get("form")).is_err());
    let post = RequestData::new(Method::POST, "form", None);
    assert!(dispatch(&routes, &post).is_ok());
}

#[test]
fn test_query_constraint() {
    let mut strict = route("GET", "strict");
    strict.query(None::<&str>);
    let mut letters = route("GET", "letters");
    letters.query("^[a-zA-Z=]+?$");
    let routes = vec![strict, letters, route("GET", "blog/{id}")];

    assert!(dispatch(&routes, &get("strict")).is_ok());
    assert!(dispatch(&routes, &get("strict?page=1")).is_err());

    assert!(dispatch(&routes, &get("letters?key=value")).is_ok());
    assert!(dispatch(&routes, &get("letters?key=value56")).is_err());

    let blog = dispatch(&routes, &get("blog/5?page=2&id=9")).unwrap();
    assert_eq!(blog.request_parameters().get("id"), Some("5"));
    assert_eq!(blog.request_parameters().get("page"), Some("2"));
}

#[test]
fn test_domain_filter() {
    let mut bound = route("GET", "blog");
    bound.domain("example.com");
    let routes = vec![bound];

    assert!(dispatch(&routes, &get("blog")).is_err());
    let other = RequestData::new(Method::GET, "blog", Some("example.ch"));
    assert!(dispatch(&routes, &other).is_err());

    let request = RequestData::new(Method::GET, "blog", Some("example.com"));
    let matched = dispatch(&routes, &request).unwrap();
    assert_eq!(matched.params().domain.as_deref(), Some("example.com"));
    assert_eq!(matched.params().request_domain.as_deref(), Some("example.com"));
}

#[test]
fn test_locale_refinement() {
    let mut about = route("GET", "{?locale}/about");
    about.locales(["de", "en"]).locale_omit("en");
    let routes = vec![about];

    let omitted = dispatch(&routes, &get("about")).unwrap();
    assert_eq!(omitted.params().locale.as_deref(), Some("en"));
    assert_eq!(omitted.request_parameters().get("locale"), Some("en"));

    let german = dispatch(&routes, &get("de/about")).unwrap();
    assert_eq!(german.params().locale.as_deref(), Some("de"));

    assert!(dispatch(&routes, &get("en/about")).is_err());
    assert!(dispatch(&routes, &get("fr/about")).is_err());
}

#[test]
fn test_signed_route_verification() {
    let mut unsubscribe = route("GET", "unsubscribe/{id}");
    unsubscribe.signed("unsubscribe", true);
    let routes = vec![unsubscribe];
    let params = Params::from([("id", "5")]);

    let url = generator()
        .generate_signed(routes[0].uri(), &params, None, false, None)
        .unwrap();
    let path = url.trim_start_matches("https://example.com");
    let matched = dispatch(&routes, &get(path)).unwrap();
    assert_eq!(matched.request_parameters().get("id"), Some("5"));

    let tampered = path.replace("/5/", "/6/");
    let err = dispatch(&routes, &get(&tampered)).unwrap_err();
    assert!(matches!(err, RoutingError::InvalidSignature { .. }));
    assert_eq!(err.route().map(Route::uri), Some(routes[0].uri()));

    let expired = generator()
        .generate_signed(
            routes[0].uri(),
            &params,
            Some(Expiration::Timestamp(1_634_767_200)),
            false,
            None,
        )
        .unwrap();
    let err = dispatch(&routes, &get(expired.trim_start_matches("https://example.com"))).unwrap_err();
    assert!(matches!(err, RoutingError::InvalidSignature { .. }));
}

#[test]
fn test_signed_without_validation_skips_check() {
    let mut preview = route("GET", "preview/{id}");
    preview.signed("preview", false);
    let routes = vec![preview];

    assert!(dispatch(&routes, &get("preview/5/not-a-signature")).is_ok());
}

#[test]
fn test_custom_refinement_can_reject() {
    use crate::route::Refined;

    let mut even = route("GET", "items/{n}");
    even.matches(|route| {
        let even = route
            .request_parameters()
            .get("n")
            .and_then(|n| n.parse::<u32>().ok())
            .is_some_and(|n| n % 2 == 0);
        Ok(if even { Refined::Continue(route) } else { Refined::Reject })
    });
    let routes = vec![even, route("GET", "items/{any}")];

    assert_eq!(dispatch(&routes, &get("items/4")).unwrap().uri(), "items/{n}");
    assert_eq!(dispatch(&routes, &get("items/5")).unwrap().uri(), "items/{any}");
}

#[test]
fn test_dispatcher_rules() {
    let mut dispatcher = RouteDispatcher::default();
    dispatcher.rule("locale").regex("(de|en)");
    assert!(dispatcher.constrainer().has_rule("locale"));

    let mut localized = route("GET", "{locale}/news");
    localized.constrain("locale", ":locale");
    let routes = vec![localized];

    assert!(dispatcher.dispatch_routes(&routes, &get("de/news"), &generator()).is_ok());
    assert!(dispatcher.dispatch_routes(&routes, &get("fr/news"), &generator()).is_err());
}
