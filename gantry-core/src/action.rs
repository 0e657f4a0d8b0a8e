// Bound actions: ordered parameter sources plus a target method

use crate::{Error, HttpRequest, ParamSource};
use futures_util::future::BoxFuture;
use serde_json::Value;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;

/// The result of invoking a handler method: either a value that is ready
/// now, or one still being produced.
///
/// The dispatcher is the only place a `Deferred` outcome is awaited, so
/// callers never branch on "is this a future" anywhere else.
pub enum Outcome {
    Ready(Value),
    Deferred(BoxFuture<'static, Result<Value, Error>>),
}

impl Outcome {
    /// An immediately available value
    pub fn ready(value: Value) -> Self {
        Outcome::Ready(value)
    }

    /// A value still being produced
    pub fn deferred<F>(fut: F) -> Self
    where
        F: Future<Output = Result<Value, Error>> + Send + 'static,
    {
        Outcome::Deferred(Box::pin(fut))
    }
}

impl std::fmt::Debug for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Ready(v) => f.debug_tuple("Ready").field(v).finish(),
            Outcome::Deferred(_) => f.debug_tuple("Deferred").field(&"..").finish(),
        }
    }
}

/// A type-erased controller method taking the extracted arguments.
///
/// The concrete controller type is recovered by downcast inside the
/// closure built at registration time (see `registry::MethodBuilder`).
pub type BoundMethod =
    Arc<dyn Fn(&(dyn Any + Send + Sync), Vec<Value>) -> Result<Outcome, Error> + Send + Sync>;

/// An ordered list of parameter sources bound to a target method.
///
/// Executing extracts one value per source, in index order, and invokes
/// the method with them in that exact order. The method's result passes
/// through unmodified; a `Deferred` outcome stays deferred.
#[derive(Clone)]
pub struct Action {
    sources: Vec<ParamSource>,
    method: BoundMethod,
}

impl Action {
    pub fn new(sources: Vec<ParamSource>, method: BoundMethod) -> Self {
        Self { sources, method }
    }

    /// Number of arguments this action extracts
    pub fn arity(&self) -> usize {
        self.sources.len()
    }

    /// Extract all arguments from the request and invoke the bound method
    /// on the target instance.
    pub fn execute(
        &self,
        target: &(dyn Any + Send + Sync),
        req: &HttpRequest,
    ) -> Result<Outcome, Error> {
        let args: Vec<Value> = self.sources.iter().map(|s| s.extract(req)).collect();
        (self.method)(target, args)
    }
}

impl std::fmt::Debug for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Action")
            .field("sources", &self.sources)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Target;

    fn echo_action() -> Action {
        let method: BoundMethod = Arc::new(|target, args| {
            assert!(target.downcast_ref::<Target>().is_some());
            Ok(Outcome::Ready(Value::Array(args)))
        });
        Action::new(
            vec![
                ParamSource::FromRoute("id".to_string()),
                ParamSource::FromQuery("page".to_string()),
            ],
            method,
        )
    }

    #[test]
    fn test_arguments_extracted_in_index_order() {
        let mut req = HttpRequest::new("GET".to_string(), "/users/7".to_string());
        req.path_params.insert("id".to_string(), "7".to_string());
        req.query_params.insert("page".to_string(), "3".to_string());

        let action = echo_action();
        assert_eq!(action.arity(), 2);

        let outcome = action.execute(&Target, &req).unwrap();
        match outcome {
            Outcome::Ready(v) => assert_eq!(v, json!(["7", "3"])),
            Outcome::Deferred(_) => panic!("expected ready outcome"),
        }
    }

    #[test]
    fn test_missing_values_extract_as_null() {
        let req = HttpRequest::new("GET".to_string(), "/users/7".to_string());

        let action = echo_action();
        let outcome = action.execute(&Target, &req).unwrap();
        match outcome {
            Outcome::Ready(v) => assert_eq!(v, json!([null, null])),
            Outcome::Deferred(_) => panic!("expected ready outcome"),
        }
    }

    #[test]
    fn test_method_error_passes_through() {
        let method: BoundMethod =
            Arc::new(|_, _| Err(Error::BadRequest("nope".to_string())));
        let action = Action::new(vec![], method);

        let req = HttpRequest::new("GET".to_string(), "/".to_string());
        let err = action.execute(&Target, &req).unwrap_err();
        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_deferred_outcome_stays_deferred() {
        let method: BoundMethod = Arc::new(|_, _| {
            Ok(Outcome::deferred(async { Ok(json!({"result": 7})) }))
        });
        let action = Action::new(vec![], method);

        let req = HttpRequest::new("GET".to_string(), "/".to_string());
        match action.execute(&Target, &req).unwrap() {
            Outcome::Deferred(fut) => assert_eq!(fut.await.unwrap(), json!({"result": 7})),
            Outcome::Ready(_) => panic!("expected deferred outcome"),
        }
    }
}
