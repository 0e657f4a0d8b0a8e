// Controller compiler: frozen registries into mountable route bindings

use crate::dispatch::{dispatch, ErrorChannel};
use crate::registry::ActionRegistry;
use crate::{BoxedHandler, Container, HttpMethod, HttpRequest, Injectable, Route, Router};
use std::sync::Arc;
use tracing::debug;

/// One compiled route binding, ready to mount
pub struct RouteBinding {
    pub method: HttpMethod,
    pub path: String,
    pub handler: BoxedHandler,
}

/// The compiled output for one controller, in registry order
pub struct RouteSet {
    bindings: Vec<RouteBinding>,
}

impl RouteSet {
    pub fn bindings(&self) -> &[RouteBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Compile a controller's frozen registry into route bindings.
///
/// Each binding closes over the root container, the entry's action, and
/// the error channel, and runs the dispatch pipeline per request. Registry
/// order is preserved; overlapping templates keep their registration
/// priority when mounted.
pub fn compile_to_routes<C: Injectable>(
    registry: &ActionRegistry,
    container: &Container,
    channel: &Arc<dyn ErrorChannel>,
) -> RouteSet {
    let bindings = registry
        .entries()
        .iter()
        .map(|entry| {
            let container = container.clone();
            let channel = channel.clone();
            let action = entry.action.clone();

            let handler = BoxedHandler::new(move |req: HttpRequest| {
                let container = container.clone();
                let channel = channel.clone();
                let action = action.clone();
                async move { Ok(dispatch::<C>(&container, &action, channel.as_ref(), req).await) }
            });

            RouteBinding {
                method: entry.method,
                path: entry.route.clone(),
                handler,
            }
        })
        .collect();

    debug!(
        controller = std::any::type_name::<C>(),
        routes = registry.len(),
        "Controller compiled"
    );

    RouteSet { bindings }
}

/// Prefix every binding with `base_path` and install it into the router.
/// Duplicate `(method, path)` pairs are not deduplicated here; the
/// router's own override semantics apply.
pub fn mount(router: &mut Router, base_path: &str, route_set: RouteSet) {
    for binding in route_set.bindings {
        let path = join_paths(base_path, &binding.path);
        debug!(method = binding.method.as_str(), path = %path, "Route mounted");
        router.add_route(Route {
            method: binding.method,
            path,
            handler: binding.handler,
        });
    }
}

/// Compile and mount in one step
pub fn mount_controller<C: Injectable>(
    router: &mut Router,
    base_path: &str,
    registry: &ActionRegistry,
    container: &Container,
    channel: &Arc<dyn ErrorChannel>,
) {
    let route_set = compile_to_routes::<C>(registry, container, channel);
    mount(router, base_path, route_set);
}

fn join_paths(base: &str, route: &str) -> String {
    let base = base.trim_end_matches('/');
    let route = route.trim_start_matches('/');
    match (base.is_empty(), route.is_empty()) {
        (true, true) => "/".to_string(),
        (true, false) => format!("/{}", route),
        (false, true) => base.to_string(),
        (false, false) => format!("{}/{}", base, route),
    }
}
