// Per-request dispatch pipeline
//
// One request moves through: scope creation, controller resolution, action
// execution, outcome normalization. Success writes the value as the body;
// any failure, sync or deferred, reaches the error channel through a
// single forwarding call.

use crate::action::Outcome;
use crate::{Action, Container, Error, HttpRequest, HttpResponse, Injectable, Provider};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// The inbound request, registered in the request scope so constructor
/// injection can depend on it.
pub struct ScopedRequest(pub HttpRequest);

impl Provider for ScopedRequest {}

/// Response scratch registered in the request scope. Services resolved
/// during the request may adjust the status or add headers; the dispatcher
/// folds the seed into the final response on success.
pub struct ResponseSeed {
    status: Mutex<u16>,
    headers: Mutex<HashMap<String, String>>,
}

impl ResponseSeed {
    pub fn new() -> Self {
        Self {
            status: Mutex::new(200),
            headers: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_status(&self, status: u16) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_header(&self, key: impl Into<String>, value: impl Into<String>) {
        self.headers
            .lock()
            .unwrap()
            .insert(key.into(), value.into());
    }

    fn snapshot(&self) -> (u16, HashMap<String, String>) {
        (
            *self.status.lock().unwrap(),
            self.headers.lock().unwrap().clone(),
        )
    }
}

impl Default for ResponseSeed {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for ResponseSeed {}

/// The single downstream stage every dispatch failure is forwarded to.
///
/// The dispatcher hands over the error value unmodified; the channel alone
/// decides the wire-level status and body.
#[async_trait]
pub trait ErrorChannel: Send + Sync + 'static {
    async fn forward(&self, error: Error, request: &HttpRequest) -> HttpResponse;
}

/// Default channel: renders `{"error": ..., "status": ...}` from the
/// error's status mapping.
pub struct DefaultErrorChannel;

#[async_trait]
impl ErrorChannel for DefaultErrorChannel {
    async fn forward(&self, error: Error, request: &HttpRequest) -> HttpResponse {
        let status = error.status_code();
        warn!(
            method = %request.method,
            path = %request.path,
            status,
            error = %error,
            "Request failed"
        );

        let body = serde_json::json!({
            "error": error.to_string(),
            "status": status,
        });
        HttpResponse::new(status)
            .with_json(&body)
            .unwrap_or_else(|_| HttpResponse::internal_server_error())
    }
}

/// Run one request through the dispatch pipeline.
///
/// States: scope created, controller resolved, action executing, then
/// succeeded or failed. Both terminal states produce a response; failures
/// are never surfaced as `Err` from here.
pub async fn dispatch<C: Injectable>(
    container: &Container,
    action: &Action,
    channel: &dyn ErrorChannel,
    request: HttpRequest,
) -> HttpResponse {
    let request_id = Uuid::new_v4();
    debug!(
        %request_id,
        method = %request.method,
        path = %request.path,
        controller = std::any::type_name::<C>(),
        "Dispatching request"
    );

    let scope = container.child();
    scope.register(ScopedRequest(request.clone()));
    scope.register(ResponseSeed::new());

    let result = run_action::<C>(&scope, action, &request).await;

    // Sync throws and deferred rejections converge here; the error value
    // crosses to the channel unmodified.
    match result.and_then(|value| write_success(&scope, value)) {
        Ok(response) => {
            debug!(%request_id, status = response.status, "Request succeeded");
            response
        }
        Err(error) => channel.forward(error, &request).await,
    }
}

/// Resolve the controller from the scope, execute the action, and settle
/// the outcome. The `Deferred` arm is the one suspension point of the
/// whole pipeline.
async fn run_action<C: Injectable>(
    scope: &Container,
    action: &Action,
    request: &HttpRequest,
) -> Result<Value, Error> {
    let controller = C::construct(scope)?;
    let outcome = action.execute(&controller, request)?;
    match outcome {
        Outcome::Ready(value) => Ok(value),
        Outcome::Deferred(fut) => fut.await,
    }
}

/// Fold the scope's response seed into the final response and write the
/// handler's value as the body. Strings go out verbatim; anything else is
/// serialized as JSON; `Null` leaves the body empty.
fn write_success(scope: &Container, value: Value) -> Result<HttpResponse, Error> {
    let seed = scope.resolve::<ResponseSeed>()?;
    let (status, headers) = seed.snapshot();

    let mut response = match value {
        Value::Null => HttpResponse::new(status),
        Value::String(s) => HttpResponse::new(status)
            .with_header("Content-Type".to_string(), "text/plain".to_string())
            .with_body(s.into_bytes()),
        other => HttpResponse::new(status).with_json(&other)?,
    };

    for (key, val) in headers {
        response = response.with_header(key, val);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_seed_defaults() {
        let seed = ResponseSeed::new();
        let (status, headers) = seed.snapshot();
        assert_eq!(status, 200);
        assert!(headers.is_empty());
    }

    #[test]
    fn test_response_seed_adjustments() {
        let seed = ResponseSeed::new();
        seed.set_status(201);
        seed.set_header("X-Trace", "abc");

        let (status, headers) = seed.snapshot();
        assert_eq!(status, 201);
        assert_eq!(headers.get("X-Trace"), Some(&"abc".to_string()));
    }

    #[tokio::test]
    async fn test_default_channel_renders_status_and_body() {
        let req = HttpRequest::new("GET".to_string(), "/x".to_string());
        let resp = DefaultErrorChannel
            .forward(Error::NotFound("user 9".to_string()), &req)
            .await;

        assert_eq!(resp.status, 404);
        let body: serde_json::Value = serde_json::from_slice(&resp.body).unwrap();
        assert_eq!(body["status"], 404);
        assert!(body["error"].as_str().unwrap().contains("user 9"));
    }
}
