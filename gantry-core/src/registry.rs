// Action registry and the registration builder
//
// The builder is the registration protocol: parameter bindings accumulate
// on a per-method map, and attaching the handler is the single point that
// validates completeness and appends the frozen entry. Bindings cannot be
// added after validation, so binding-before-handler ordering is enforced
// by construction rather than assumed.

use crate::action::{Action, BoundMethod, Outcome};
use crate::{Error, HttpMethod, Injectable, ParamSource};
use serde_json::Value;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

/// One routable binding: a path template, a verb, and the action to run.
///
/// Created once at registration time, never mutated afterward.
#[derive(Debug)]
pub struct ActionEntry {
    pub route: String,
    pub method: HttpMethod,
    pub action: Action,
}

/// Per-controller, ordered, frozen collection of action entries.
///
/// Insertion order is registration order, and registration order is the
/// order routes are mounted in.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    entries: Vec<ActionEntry>,
}

impl ActionRegistry {
    pub fn entries(&self) -> &[ActionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Collects route registrations for one controller type.
///
/// # Example
///
/// ```ignore
/// let registry = ControllerBuilder::<UserController>::new()
///     .get("/:id")
///     .bind(0, ParamSource::FromRoute("id".into()))
///     .handler(1, |ctrl, args| ctrl.find(args))?
///     .build();
/// ```
pub struct ControllerBuilder<C: Injectable> {
    entries: Vec<ActionEntry>,
    _marker: PhantomData<fn() -> C>,
}

impl<C: Injectable> ControllerBuilder<C> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Open a method registration for an arbitrary verb
    pub fn route(self, method: HttpMethod, route: impl Into<String>) -> MethodBuilder<C> {
        MethodBuilder {
            parent: self,
            method,
            route: route.into(),
            bindings: HashMap::new(),
        }
    }

    pub fn get(self, route: impl Into<String>) -> MethodBuilder<C> {
        self.route(HttpMethod::GET, route)
    }

    pub fn put(self, route: impl Into<String>) -> MethodBuilder<C> {
        self.route(HttpMethod::PUT, route)
    }

    pub fn post(self, route: impl Into<String>) -> MethodBuilder<C> {
        self.route(HttpMethod::POST, route)
    }

    pub fn patch(self, route: impl Into<String>) -> MethodBuilder<C> {
        self.route(HttpMethod::PATCH, route)
    }

    pub fn delete(self, route: impl Into<String>) -> MethodBuilder<C> {
        self.route(HttpMethod::DELETE, route)
    }

    /// Freeze the accumulated entries. Infallible: every entry was
    /// validated when its handler was attached.
    pub fn build(self) -> ActionRegistry {
        debug!(
            controller = std::any::type_name::<C>(),
            routes = self.entries.len(),
            "Action registry frozen"
        );
        ActionRegistry {
            entries: self.entries,
        }
    }
}

impl<C: Injectable> Default for ControllerBuilder<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Registration state for a single controller method.
pub struct MethodBuilder<C: Injectable> {
    parent: ControllerBuilder<C>,
    method: HttpMethod,
    route: String,
    bindings: HashMap<usize, ParamSource>,
}

impl<C: Injectable> MethodBuilder<C> {
    /// Record the extraction source for the parameter at `index`.
    ///
    /// Bindings at distinct indices accumulate independently; binding the
    /// same index twice keeps the last write.
    pub fn bind(mut self, index: usize, source: ParamSource) -> Self {
        trace!(
            route = %self.route,
            method = self.method.as_str(),
            index,
            "Parameter source bound"
        );
        self.bindings.insert(index, source);
        self
    }

    /// Attach the handler, validating that every index in `[0, arity)` has
    /// a bound source. A gap is a configuration error raised here, before
    /// any route is compiled or any request is served.
    pub fn handler<F>(self, arity: usize, f: F) -> Result<ControllerBuilder<C>, Error>
    where
        F: Fn(&C, Vec<Value>) -> Result<Outcome, Error> + Send + Sync + 'static,
    {
        let mut sources = Vec::with_capacity(arity);
        for index in 0..arity {
            match self.bindings.get(&index) {
                Some(source) => sources.push(source.clone()),
                None => {
                    return Err(Error::UnboundParameter {
                        method: self.method.as_str(),
                        route: self.route,
                        index,
                        arity,
                    });
                }
            }
        }

        let method: BoundMethod = Arc::new(move |target, args| {
            let ctrl = target.downcast_ref::<C>().ok_or_else(|| {
                Error::Internal(format!(
                    "controller type mismatch: expected {}",
                    std::any::type_name::<C>()
                ))
            })?;
            f(ctrl, args)
        });

        debug!(
            controller = std::any::type_name::<C>(),
            route = %self.route,
            http_method = self.method.as_str(),
            arity,
            "Action registered"
        );

        let mut parent = self.parent;
        parent.entries.push(ActionEntry {
            route: self.route,
            method: self.method,
            action: Action::new(sources, method),
        });
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;
    use serde_json::json;

    struct Ctrl;

    impl Injectable for Ctrl {
        fn construct(_container: &Container) -> Result<Self, Error> {
            Ok(Ctrl)
        }
    }

    #[test]
    fn test_missing_binding_fails_registration() {
        let result = ControllerBuilder::<Ctrl>::new()
            .get("/:id")
            .bind(0, ParamSource::FromRoute("id".to_string()))
            // index 1 never bound
            .handler(2, |_, args| Ok(Outcome::Ready(json!(args))));

        match result {
            Err(Error::UnboundParameter { index, arity, .. }) => {
                assert_eq!(index, 1);
                assert_eq!(arity, 2);
            }
            other => panic!("expected UnboundParameter, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_zero_arity_needs_no_bindings() {
        let registry = ControllerBuilder::<Ctrl>::new()
            .get("/ping")
            .handler(0, |_, _| Ok(Outcome::Ready(json!("pong"))))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entries_keep_registration_order() {
        let registry = ControllerBuilder::<Ctrl>::new()
            .get("/a")
            .handler(0, |_, _| Ok(Outcome::Ready(Value::Null)))
            .unwrap()
            .post("/b")
            .handler(0, |_, _| Ok(Outcome::Ready(Value::Null)))
            .unwrap()
            .delete("/c")
            .handler(0, |_, _| Ok(Outcome::Ready(Value::Null)))
            .unwrap()
            .build();

        let routes: Vec<_> = registry
            .entries()
            .iter()
            .map(|e| (e.method, e.route.as_str()))
            .collect();
        assert_eq!(
            routes,
            vec![
                (HttpMethod::GET, "/a"),
                (HttpMethod::POST, "/b"),
                (HttpMethod::DELETE, "/c"),
            ]
        );
    }

    #[test]
    fn test_distinct_indices_accumulate() {
        let registry = ControllerBuilder::<Ctrl>::new()
            .post("/users")
            .bind(0, ParamSource::FromBody("name".to_string()))
            .bind(1, ParamSource::FromQuery("notify".to_string()))
            .handler(2, |_, args| Ok(Outcome::Ready(json!(args))))
            .unwrap()
            .build();

        let entry = &registry.entries()[0];
        assert_eq!(entry.action.arity(), 2);

        let mut req = crate::HttpRequest::new("POST".to_string(), "/users".to_string());
        req.body = br#"{"name":"ada"}"#.to_vec();
        req.query_params
            .insert("notify".to_string(), "true".to_string());

        match entry.action.execute(&Ctrl, &req).unwrap() {
            Outcome::Ready(v) => assert_eq!(v, json!(["ada", "true"])),
            Outcome::Deferred(_) => panic!("expected ready outcome"),
        }
    }

    #[test]
    fn test_same_index_last_write_wins() {
        let registry = ControllerBuilder::<Ctrl>::new()
            .get("/:id")
            .bind(0, ParamSource::FromQuery("id".to_string()))
            .bind(0, ParamSource::FromRoute("id".to_string()))
            .handler(1, |_, args| Ok(Outcome::Ready(json!(args))))
            .unwrap()
            .build();

        let mut req = crate::HttpRequest::new("GET".to_string(), "/7".to_string());
        req.path_params.insert("id".to_string(), "7".to_string());
        req.query_params
            .insert("id".to_string(), "clobbered".to_string());

        match registry.entries()[0].action.execute(&Ctrl, &req).unwrap() {
            Outcome::Ready(v) => assert_eq!(v, json!(["7"])),
            Outcome::Deferred(_) => panic!("expected ready outcome"),
        }
    }
}
