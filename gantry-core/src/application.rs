// Application bootstrapper and HTTP server

use crate::dispatch::{DefaultErrorChannel, ErrorChannel};
use crate::registry::ActionRegistry;
use crate::{compiler, Container, Error, HttpRequest, Injectable, Router};
use http_body_util::{BodyExt, Full};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, body::Incoming as IncomingBody};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

/// The main application struct
pub struct Application {
    pub container: Container,
    router: Router,
    channel: Arc<dyn ErrorChannel>,
}

impl Application {
    /// Create an application around a root container
    pub fn new(container: Container) -> Self {
        Self {
            container,
            router: Router::new(),
            channel: Arc::new(DefaultErrorChannel),
        }
    }

    /// Replace the downstream error channel
    pub fn with_error_channel(mut self, channel: Arc<dyn ErrorChannel>) -> Self {
        self.channel = channel;
        self
    }

    /// Compile a controller's registry and mount it under `base_path`
    pub fn mount<C: Injectable>(&mut self, base_path: &str, registry: &ActionRegistry) {
        compiler::mount_controller::<C>(
            &mut self.router,
            base_path,
            registry,
            &self.container,
            &self.channel,
        );
        info!(
            controller = std::any::type_name::<C>(),
            base_path, "Controller mounted"
        );
    }

    /// Get a reference to the DI container
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Get a reference to the route table
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Start the HTTP server on the specified port
    pub async fn listen(self, port: u16) -> Result<(), Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = TcpListener::bind(addr).await?;

        info!(%addr, "Server listening");

        let router = Arc::new(self.router);
        let channel = self.channel;

        loop {
            let (stream, _) = listener.accept().await?;
            let io = TokioIo::new(stream);
            let router = router.clone();
            let channel = channel.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<IncomingBody>| {
                    let router = router.clone();
                    let channel = channel.clone();
                    async move { handle_request(req, router, channel).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!(error = ?err, "Error serving connection");
                }
            });
        }
    }
}

/// Handle an incoming HTTP request
async fn handle_request(
    req: Request<IncomingBody>,
    router: Arc<Router>,
    channel: Arc<dyn ErrorChannel>,
) -> Result<Response<Full<bytes::Bytes>>, hyper::Error> {
    // Convert hyper request to our HttpRequest
    let method = req.method().to_string();
    let path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let mut request = HttpRequest::new(method, path);

    for (name, value) in req.headers() {
        if let Ok(value_str) = value.to_str() {
            request
                .headers
                .insert(name.to_string(), value_str.to_string());
        }
    }

    let body_bytes = req.collect().await?.to_bytes();
    request.body = body_bytes.to_vec();

    // Dispatch failures are already rendered by the route handlers; only
    // router-level misses surface as errors here, and they go through the
    // same channel.
    let response = match router.route(request.clone()).await {
        Ok(resp) => resp,
        Err(err) => channel.forward(err, &request).await,
    };

    let mut builder = Response::builder().status(response.status);
    for (key, value) in response.headers {
        builder = builder.header(key, value);
    }

    let body = Full::new(bytes::Bytes::from(response.body));
    Ok(builder
        .body(body)
        .unwrap_or_else(|_| Response::new(Full::new(bytes::Bytes::new()))))
}
