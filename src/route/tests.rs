use serde_json::{json, Value};

use super::{
    normalize_pattern, refine, QueryConstraint, Refined, Route, RouteFactory, RouteRegistrar,
};
use crate::constrainer::Constraint;
use crate::domain::{Domain, Domains};
use crate::error::RoutingError;
use crate::params::Params;

/// Bare route table for exercising the registrar without a router.
#[derive(Default)]
struct Table {
    factory: RouteFactory,
    routes: Vec<Route>,
}

impl RouteRegistrar for Table {
    fn factory(&self) -> &RouteFactory {
        &self.factory
    }

    fn push_route(&mut self, route: Route) -> &mut Route {
        let index = self.routes.len();
        self.routes.push(route);
        &mut self.routes[index]
    }

    fn extend_routes(&mut self, routes: Vec<Route>) {
        self.routes.extend(routes);
    }
}

impl Table {
    fn find(&self, name: &str) -> &Route {
        self.routes
            .iter()
            .find(|r| r.route_name() == Some(name))
            .unwrap_or_else(|| panic!("route {name} not registered"))
    }
}

fn route(uri: &str) -> Route {
    RouteFactory::default().create_route("GET", uri, "handler".into())
}

fn with_request(mut route: Route, parameters: Params) -> Route {
    route.params_mut().request_parameters = parameters;
    route
}

#[test]
fn test_normalize_pattern() {
    assert_eq!(normalize_pattern("/blog//{id}/"), "blog/{id}");
    assert_eq!(normalize_pattern("/"), "");
    assert_eq!(route("/about/").uri(), "about");
}

#[test]
fn test_query_constraint_from() {
    assert_eq!(QueryConstraint::from("*"), QueryConstraint::Any);
    assert_eq!(QueryConstraint::from(None::<&str>), QueryConstraint::Deny);
    assert_eq!(
        QueryConstraint::from(Some("^page=[0-9]+$")),
        QueryConstraint::Pattern("^page=[0-9]+$".to_string())
    );
}

#[test]
fn test_signed_appends_suffix_once() {
    let mut route = route("unsubscribe/{user}");
    route.signed("unsubscribe", true);
    route.signed("unsubscribe.again", false);

    assert_eq!(route.uri(), "unsubscribe/{user}/{?signature}/{?expires}");
    assert_eq!(route.route_name(), Some("unsubscribe.again"));
    assert_eq!(route.params().signed, Some(false));
    assert!(route.is_signed());

    let mut custom = RouteFactory::new("sig", "valid_until").create_route("GET", "download", "dl".into());
    custom.signed("download", true);
    assert_eq!(custom.uri(), "download/{?sig}/{?valid_until}");
}

#[test]
fn test_for_domain_forks_route() {
    let factory = RouteFactory::default().with_domains(Domains::new([
        Domain::new("example.ch", "ch.localhost", "http://ch.localhost"),
        Domain::new("example.de", "de.localhost", "http://de.localhost"),
    ]));
    let mut route = factory.create_route("GET", "blog", "blog".into());
    route.domain("example.ch").domain_with("example.de", |mut route| {
        route.locale("de");
        route
    });

    assert_eq!(route.params().domain.as_deref(), Some("ch.localhost"));
    assert_eq!(route.params().domain_uri.as_deref(), Some("http://ch.localhost"));
    assert_eq!(route.params().domains.len(), 2);

    let german = route.for_domain("de.localhost");
    assert_eq!(german.params().domain.as_deref(), Some("de.localhost"));
    assert_eq!(german.params().domain_uri.as_deref(), Some("http://de.localhost"));
    assert_eq!(german.params().locale.as_deref(), Some("de"));

    // Resolved by key as well, and the receiver is untouched.
    assert_eq!(
        route.for_domain("example.de").params().domain.as_deref(),
        Some("de.localhost")
    );
    assert!(route.params().locale.is_none());

    let unbound = route.for_domain("other.localhost");
    assert_eq!(unbound.params().domain.as_deref(), Some("ch.localhost"));
}

#[test]
fn test_base_url_for_precedence() {
    let mut plain = route("about");
    assert_eq!(plain.base_url_for(None, "https://example.com"), None);
    plain.base_url("https://cdn.example.com");
    assert_eq!(
        plain.base_url_for(None, "https://example.com").as_deref(),
        Some("https://cdn.example.com")
    );

    let mut domained = route("about");
    domained
        .domain("example.org")
        .locale_base_urls([("de", "https://example.de")]);
    assert_eq!(
        domained.base_url_for(None, "https://example.com").as_deref(),
        Some("https://example.org")
    );
    assert_eq!(
        domained.base_url_for(None, "http://localhost").as_deref(),
        Some("http://example.org")
    );
    assert_eq!(
        domained.base_url_for(Some("de"), "https://example.com").as_deref(),
        Some("https://example.de")
    );
}

#[test]
fn test_parameter_value() {
    let mut route = route("about");
    route.name("about").parameter("menu", true).middleware(["auth"]);

    assert_eq!(route.parameter_value("uri"), Some(json!("about")));
    assert_eq!(route.parameter_value("name"), Some(json!("about")));
    assert_eq!(route.parameter_value("menu"), Some(Value::Bool(true)));
    assert_eq!(route.parameter_value("middleware"), Some(json!(["auth"])));
    assert_eq!(route.parameter_value("locale"), None);
    assert_eq!(route.parameter_value("signed"), None);
    assert_eq!(route.parameter_value("unknown"), None);
}

#[test]
fn test_locale_refinement() {
    let mut localized = route("{?locale}/about");
    localized.locales(["de", "en"]).locale_omit("en");

    let matched = refine(with_request(localized.clone(), Params::from([("locale", "de")])))
        .unwrap()
        .unwrap();
    assert_eq!(matched.params().locale.as_deref(), Some("de"));

    let omitted = refine(with_request(localized.clone(), Params::from([("locale", "")])))
        .unwrap()
        .unwrap();
    assert_eq!(omitted.params().locale.as_deref(), Some("en"));
    assert_eq!(omitted.request_parameters().get("locale"), Some("en"));

    // Spelling out the omitted locale and unlisted locales are both rejected.
    for locale in ["en", "fr"] {
        let rejected = refine(with_request(localized.clone(), Params::from([("locale", locale)])));
        assert!(rejected.unwrap().is_none(), "{locale} should be rejected");
    }
}

#[test]
fn test_locale_refinement_without_locale_errors() {
    let mut open = route("{?locale}/about");
    open.locales(Vec::<String>::new());

    let err = refine(with_request(open, Params::from([("locale", "")]))).unwrap_err();
    assert!(matches!(err, RoutingError::TranslationMissing { .. }));
    assert_eq!(err.route().map(Route::uri), Some("{?locale}/about"));
}

#[test]
fn test_translation_refinement() {
    let mut translated = route("{locale}/{slug}");
    translated
        .locales(["de", "en", "fr"])
        .trans("slug", [("de", "ueber-uns"), ("en", "about")])
        .locale_fallbacks([("fr", "en")]);

    let accepted = |locale: &str, slug: &str| {
        refine(with_request(
            translated.clone(),
            Params::from([("locale", locale), ("slug", slug)]),
        ))
        .unwrap()
        .is_some()
    };

    assert!(accepted("de", "ueber-uns"));
    assert!(accepted("en", "about"));
    assert!(!accepted("de", "about"));
    // fr has no translation of its own and falls back to en.
    assert!(accepted("fr", "about"));
}

#[test]
fn test_custom_refinements_run_in_order() {
    let mut custom = route("blog/{id}");
    custom
        .matches(|mut route| {
            route.params_mut().request_parameters.insert("seen", "first");
            Ok(Refined::Continue(route))
        })
        .matches_keyed("even", |route| {
            let even = route
                .request_parameters()
                .get("id")
                .and_then(|id| id.parse::<u32>().ok())
                .is_some_and(|id| id % 2 == 0);
            Ok(if even { Refined::Continue(route) } else { Refined::Reject })
        });

    let refined = refine(with_request(custom.clone(), Params::from([("id", "4")])))
        .unwrap()
        .unwrap();
    assert_eq!(refined.request_parameters().get("seen"), Some("first"));
    assert!(refine(with_request(custom, Params::from([("id", "5")])))
        .unwrap()
        .is_none());
}

#[test]
fn test_group_prefix_and_overlay() {
    let mut table = Table::default();
    table.group("/admin/", |group| {
        group.get("dashboard", "dashboard").name("admin.dashboard");
        group
            .get("users/{id}", "user")
            .name("admin.user")
            .middleware(["own"])
            .constrain("id", ":alpha");
        group.group("reports", |reports| {
            reports.get("daily", "daily").name("admin.reports.daily");
        });
        // Shared settings may follow the children.
        group
            .middleware(["auth"])
            .constrain("id", ":num")
            .locale_omit("en")
            .parameter("menu", "admin");
    });

    assert_eq!(table.routes.len(), 3);

    let dashboard = table.find("admin.dashboard");
    assert_eq!(dashboard.uri(), "admin/dashboard");
    assert_eq!(dashboard.params().middleware, vec!["auth"]);
    assert_eq!(dashboard.params().locale_omit.as_deref(), Some("en"));
    assert_eq!(dashboard.parameter_value("menu"), Some(json!("admin")));

    let user = table.find("admin.user");
    assert_eq!(user.params().middleware, vec!["own"]);
    assert_eq!(
        user.params().constraints.get("id"),
        Some(&Constraint::from(":alpha"))
    );

    let daily = table.find("admin.reports.daily");
    assert_eq!(daily.uri(), "admin/reports/daily");
    assert_eq!(daily.params().middleware, vec!["auth"]);
}

#[test]
fn test_resource_expansion() {
    let mut table = Table::default();
    table.resource("products", "ProductsController", |products| {
        products.except(["delete"]);
    });

    let expanded: Vec<(&str, &str, Option<&str>)> = table
        .routes
        .iter()
        .map(|r| (r.method(), r.uri(), r.route_name()))
        .collect();
    assert_eq!(
        expanded,
        vec![
            ("GET", "products", Some("products.index")),
            ("GET", "products/create", Some("products.create")),
            ("POST", "products", Some("products.store")),
            ("GET", "products/{id}", Some("products.show")),
            ("GET", "products/{id}/edit", Some("products.edit")),
            ("PUT|PATCH", "products/{id}", Some("products.update")),
        ]
    );

    let show = table.find("products.show");
    assert_eq!(show.handler().key().as_deref(), Some("ProductsController@show"));
    assert_eq!(
        show.params().constraints.get("id"),
        Some(&Constraint::from("[0-9]+"))
    );
    assert!(table.find("products.index").params().constraints.is_empty());
}

#[test]
fn test_resource_options() {
    let mut table = Table::default();
    table.group("admin", |group| {
        group.resource("blog/posts", "PostsController", |posts| {
            posts
                .only(["index", "show", "publish"])
                .placeholder("slug")
                .constrain(None)
                .action("publish", "POST", "/{placeholder}/publish")
                .middleware(&[], &["auth"])
                .middleware(&["show"], &["cache"])
                .parameter("index", "menu", true)
                .shared_parameter("section", "blog");
        });
    });

    assert_eq!(table.routes.len(), 3);

    let index = table.find("admin.blog.posts.index");
    assert_eq!(index.uri(), "admin/blog/posts");
    assert_eq!(index.params().middleware, vec!["auth"]);
    assert_eq!(index.parameter_value("menu"), Some(Value::Bool(true)));
    assert_eq!(index.parameter_value("section"), Some(json!("blog")));

    let show = table.find("admin.blog.posts.show");
    assert_eq!(show.uri(), "admin/blog/posts/{slug}");
    assert_eq!(show.params().middleware, vec!["cache"]);
    assert!(show.params().constraints.is_empty());
    assert_eq!(show.parameter_value("menu"), None);

    let publish = table.find("admin.blog.posts.publish");
    assert_eq!(publish.method(), "POST");
    assert_eq!(publish.uri(), "admin/blog/posts/{slug}/publish");
}
