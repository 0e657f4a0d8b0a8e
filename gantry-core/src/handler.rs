// Type-erased request handler storage
//
// Routes need to hold handlers of different concrete types in one table,
// so the handler future is erased at storage time. The inner call stays
// monomorphized inside the wrapper.

use crate::{Error, HttpRequest, HttpResponse};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A handler that can process HTTP requests.
pub trait Handler: Send + Sync + 'static {
    /// The future returned by `call`.
    type Future: Future<Output = Result<HttpResponse, Error>> + Send + 'static;

    /// Handle an HTTP request.
    fn call(&self, req: HttpRequest) -> Self::Future;
}

impl<F, Fut> Handler for F
where
    F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<HttpResponse, Error>> + Send + 'static,
{
    type Future = Fut;

    #[inline]
    fn call(&self, req: HttpRequest) -> Self::Future {
        self(req)
    }
}

/// Type-erased handler for storing in route tables.
pub struct BoxedHandler {
    inner: Arc<dyn ErasedHandler>,
}

impl BoxedHandler {
    /// Wrap any handler for storage.
    pub fn new<H: Handler>(handler: H) -> Self {
        Self {
            inner: Arc::new(HandlerWrapper { handler }),
        }
    }

    /// Call the handler.
    #[inline]
    pub fn call(
        &self,
        req: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> {
        self.inner.call(req)
    }
}

impl Clone for BoxedHandler {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

trait ErasedHandler: Send + Sync {
    fn call(
        &self,
        req: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>>;
}

struct HandlerWrapper<H: Handler> {
    handler: H,
}

impl<H: Handler> ErasedHandler for HandlerWrapper<H> {
    #[inline]
    fn call(
        &self,
        req: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, Error>> + Send>> {
        Box::pin(self.handler.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_handler(_req: HttpRequest) -> Result<HttpResponse, Error> {
        Ok(HttpResponse::ok())
    }

    #[tokio::test]
    async fn test_boxed_handler() {
        let boxed = BoxedHandler::new(test_handler);
        let req = HttpRequest::new("GET".to_string(), "/test".to_string());
        let response = boxed.call(req).await.unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_clone_boxed_handler() {
        let h1 = BoxedHandler::new(test_handler);
        let h2 = h1.clone();

        let r1 = h1
            .call(HttpRequest::new("GET".to_string(), "/a".to_string()))
            .await
            .unwrap();
        let r2 = h2
            .call(HttpRequest::new("GET".to_string(), "/b".to_string()))
            .await
            .unwrap();

        assert_eq!(r1.status, 200);
        assert_eq!(r2.status, 200);
    }

    #[test]
    fn test_handler_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BoxedHandler>();
    }
}
