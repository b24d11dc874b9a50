//! Run-once listeners fired when a named route is matched.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::debug;

use crate::route::Route;

/// Listener callback, called once with the matched route.
pub type MatchedListener = Box<dyn FnOnce(&Route) + Send>;

/// Listeners bucketed by route name and priority.
///
/// Higher priorities run first; listeners of equal priority run in
/// registration order. Firing removes every listener of that route.
#[derive(Default)]
pub struct MatchedRouteHandler {
    listeners: HashMap<String, BTreeMap<i32, Vec<MatchedListener>>>,
}

impl MatchedRouteHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, route_name: &str, listener: F, priority: i32)
    where
        F: FnOnce(&Route) + Send + 'static,
    {
        self.listeners
            .entry(route_name.to_owned())
            .or_default()
            .entry(priority)
            .or_default()
            .push(Box::new(listener));
    }

    #[must_use]
    pub fn has_listeners(&self, route_name: &str) -> bool {
        self.listeners.contains_key(route_name)
    }

    /// Fire and deregister the listeners of `route`. Unnamed routes are ignored.
    pub fn handle(&mut self, route: &Route) {
        let Some(name) = route.route_name() else {
            return;
        };
        let Some(buckets) = self.listeners.remove(name) else {
            return;
        };
        debug!(route_name = %name, buckets = buckets.len(), "Firing matched route listeners");
        for (_, listeners) in buckets.into_iter().rev() {
            for listener in listeners {
                listener(route);
            }
        }
    }
}

impl fmt::Debug for MatchedRouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, buckets)| (name.as_str(), buckets.values().map(Vec::len).sum()))
            .collect();
        f.debug_struct("MatchedRouteHandler")
            .field("listeners", &counts)
            .finish()
    }
}
