use std::collections::HashMap;

use serde_json::Value;

use super::core::{Route, RouteFactory};
use crate::constrainer::Constraint;
use crate::handler::Handler;

#[derive(Debug, Clone)]
struct Action {
    name: String,
    method: String,
    /// Appended to the resource name, `{placeholder}` is substituted.
    suffix: String,
    constrained: bool,
}

impl Action {
    fn new(name: &str, method: &str, suffix: &str, constrained: bool) -> Self {
        Self {
            name: name.to_owned(),
            method: method.to_owned(),
            suffix: suffix.to_owned(),
            constrained,
        }
    }
}

/// CRUD route set for one controller.
///
/// | Action   | Method      | URI                    |
/// |----------|-------------|------------------------|
/// | `index`  | `GET`       | `{name}`               |
/// | `create` | `GET`       | `{name}/create`        |
/// | `store`  | `POST`      | `{name}`               |
/// | `show`   | `GET`       | `{name}/{id}`          |
/// | `edit`   | `GET`       | `{name}/{id}/edit`     |
/// | `update` | `PUT\|PATCH` | `{name}/{id}`          |
/// | `delete` | `DELETE`    | `{name}/{id}`          |
///
/// Route names are `<prefix>.<action>`; the prefix is [`RouteResource::name`]
/// or the resource URI with `/` turned into `.`.
#[derive(Debug)]
pub struct RouteResource {
    factory: RouteFactory,
    name: String,
    controller: String,
    placeholder: String,
    placeholder_constraint: Option<Constraint>,
    actions: Vec<Action>,
    only: Option<Vec<String>>,
    except: Option<Vec<String>>,
    middleware: Vec<(Vec<String>, Vec<String>)>,
    domains: Vec<String>,
    base_url: Option<String>,
    parameters: Vec<(String, String, Value)>,
    shared_parameters: Vec<(String, Value)>,
    route_name: Option<String>,
}

impl RouteResource {
    pub(crate) fn new(factory: RouteFactory, name: &str, controller: &str) -> Self {
        Self {
            factory,
            name: name.to_owned(),
            controller: controller.to_owned(),
            placeholder: "id".to_owned(),
            placeholder_constraint: Some(Constraint::from("[0-9]+")),
            actions: vec![
                Action::new("index", "GET", "", false),
                Action::new("create", "GET", "/create", false),
                Action::new("store", "POST", "", false),
                Action::new("show", "GET", "/{placeholder}", true),
                Action::new("edit", "GET", "/{placeholder}/edit", true),
                Action::new("update", "PUT|PATCH", "/{placeholder}", true),
                Action::new("delete", "DELETE", "/{placeholder}", true),
            ],
            only: None,
            except: None,
            middleware: Vec::new(),
            domains: Vec::new(),
            base_url: None,
            parameters: Vec::new(),
            shared_parameters: Vec::new(),
            route_name: None,
        }
    }

    /// Rename the identifier placeholder (`id` by default).
    pub fn placeholder(&mut self, placeholder: &str) -> &mut Self {
        self.placeholder = placeholder.to_owned();
        self
    }

    /// Constrain the identifier placeholder, `None` to accept any segment.
    pub fn constrain(&mut self, constraint: Option<Constraint>) -> &mut Self {
        self.placeholder_constraint = constraint;
        self
    }

    /// Route-name prefix.
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.route_name = Some(name.to_owned());
        self
    }

    /// Add or replace an action. `suffix` may use `{placeholder}`.
    pub fn action(&mut self, action: &str, method: &str, suffix: &str) -> &mut Self {
        let constrained = suffix.contains("{placeholder}");
        let def = Action::new(action, method, suffix, constrained);
        match self.actions.iter_mut().find(|a| a.name == action) {
            Some(existing) => *existing = def,
            None => self.actions.push(def),
        }
        self
    }

    pub fn only<I, S>(&mut self, actions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    pub fn except<I, S>(&mut self, actions: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.except = Some(actions.into_iter().map(Into::into).collect());
        self
    }

    /// Middleware for the listed actions; an empty list means every action.
    /// A later call for the same action replaces the earlier one.
    pub fn middleware(&mut self, actions: &[&str], middleware: &[&str]) -> &mut Self {
        self.middleware.push((
            actions.iter().map(|s| (*s).to_owned()).collect(),
            middleware.iter().map(|s| (*s).to_owned()).collect(),
        ));
        self
    }

    pub fn domain(&mut self, domain: &str) -> &mut Self {
        self.domains.push(domain.to_owned());
        self
    }

    pub fn base_url(&mut self, base_url: &str) -> &mut Self {
        self.base_url = Some(base_url.to_owned());
        self
    }

    /// Parameter for one action.
    pub fn parameter(&mut self, action: &str, name: &str, value: impl Into<Value>) -> &mut Self {
        self.parameters
            .push((action.to_owned(), name.to_owned(), value.into()));
        self
    }

    /// Parameter for every action.
    pub fn shared_parameter(&mut self, name: &str, value: impl Into<Value>) -> &mut Self {
        self.shared_parameters.push((name.to_owned(), value.into()));
        self
    }

    fn is_selected(&self, action: &str) -> bool {
        let listed = |list: &Option<Vec<String>>| {
            list.as_ref().map(|l| l.iter().any(|a| a == action))
        };
        listed(&self.only).unwrap_or(true) && !listed(&self.except).unwrap_or(false)
    }

    fn middleware_map(&self) -> HashMap<&str, &[String]> {
        let mut mapped = HashMap::new();
        for (actions, middleware) in &self.middleware {
            if actions.is_empty() {
                for action in &self.actions {
                    mapped.insert(action.name.as_str(), middleware.as_slice());
                }
            } else {
                for action in actions {
                    mapped.insert(action.as_str(), middleware.as_slice());
                }
            }
        }
        mapped
    }

    fn route_name_for(&self, action: &str) -> String {
        match &self.route_name {
            Some(prefix) => format!("{prefix}.{action}"),
            None => {
                let prefix: String = self
                    .name
                    .trim_matches('/')
                    .chars()
                    .filter(|c| !matches!(c, '{' | '}' | '?' | '*'))
                    .map(|c| if c == '/' { '.' } else { c })
                    .collect();
                format!("{}.{action}", prefix.to_lowercase())
            }
        }
    }

    pub(crate) fn into_routes(self) -> Vec<Route> {
        let middleware = self.middleware_map();
        let placeholder = format!("{{{}}}", self.placeholder);
        let mut routes = Vec::new();

        for action in self.actions.iter().filter(|a| self.is_selected(&a.name)) {
            let uri = format!(
                "{}{}",
                self.name,
                action.suffix.replace("{placeholder}", &placeholder)
            );
            let handler = Handler::action(&self.controller, &action.name);
            let mut route = self.factory.create_route(&action.method, &uri, handler);
            route.name(self.route_name_for(&action.name));

            if let Some(mw) = middleware.get(action.name.as_str()) {
                route.middleware(mw.iter().cloned());
            }
            if action.constrained {
                if let Some(constraint) = &self.placeholder_constraint {
                    route.constrain(&self.placeholder, constraint.clone());
                }
            }
            for (_, name, value) in self.parameters.iter().filter(|(a, _, _)| *a == action.name) {
                route.parameter(name, value.clone());
            }
            for (name, value) in &self.shared_parameters {
                route.parameter(name, value.clone());
            }
            if let Some(base_url) = &self.base_url {
                route.base_url(base_url.as_str());
            }
            for domain in &self.domains {
                route.domain(domain);
            }
            routes.push(route);
        }
        routes
    }
}
