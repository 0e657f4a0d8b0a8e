// Route table and request matching

use crate::{BoxedHandler, Error, HttpMethod, HttpRequest, HttpResponse};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Route definition with handler
#[derive(Clone)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
    pub handler: BoxedHandler,
}

/// Router for managing routes and dispatching requests.
///
/// Routes match in registration order. Registering an exact duplicate
/// `(method, path)` replaces the earlier entry in place, so the last
/// registration wins.
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Add a route to the router
    pub fn add_route(&mut self, route: Route) {
        if let Some(existing) = self
            .routes
            .iter_mut()
            .find(|r| r.method == route.method && r.path == route.path)
        {
            debug!(
                method = route.method.as_str(),
                path = %route.path,
                "Replacing duplicate route registration"
            );
            *existing = route;
            return;
        }

        trace!(method = route.method.as_str(), path = %route.path, "Route added");
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find a route matching the request and dispatch it
    pub async fn route(&self, mut request: HttpRequest) -> Result<HttpResponse, Error> {
        let (path, query_string) = request
            .path
            .split_once('?')
            .map(|(p, q)| (p.to_string(), Some(q.to_string())))
            .unwrap_or((request.path.clone(), None));

        if let Some(query) = query_string {
            request.query_params = parse_query_string(&query);
        }

        let method = HttpMethod::from_str(&request.method)
            .ok_or_else(|| Error::MethodNotAllowed(request.method.clone()))?;

        for route in &self.routes {
            if route.method != method {
                continue;
            }

            if let Some(params) = match_path(&route.path, &path) {
                trace!(method = method.as_str(), path = %path, template = %route.path, "Route matched");
                request.path_params = params;
                return route.handler.call(request).await;
            }
        }

        Err(Error::RouteNotFound(format!("{} {}", request.method, path)))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Match a route path template against a request path.
/// Returns the extracted `:name` parameters on a match, None otherwise.
fn match_path(pattern: &str, path: &str) -> Option<HashMap<String, String>> {
    let pattern_parts: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if pattern_parts.len() != path_parts.len() {
        return None;
    }

    let mut params = HashMap::new();

    for (pattern_part, path_part) in pattern_parts.iter().zip(path_parts.iter()) {
        if let Some(param_name) = pattern_part.strip_prefix(':') {
            params.insert(param_name.to_string(), path_part.to_string());
        } else if pattern_part != path_part {
            return None;
        }
    }

    Some(params)
}

/// Parse a query string into a map of parameters
fn parse_query_string(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let mut split = part.splitn(2, '=');
            let key = split.next()?;
            let value = split.next().unwrap_or("");
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_route(method: HttpMethod, path: &str, status: u16) -> Route {
        Route {
            method,
            path: path.to_string(),
            handler: BoxedHandler::new(move |_req: HttpRequest| async move {
                Ok(HttpResponse::new(status))
            }),
        }
    }

    #[test]
    fn test_match_path_static() {
        let result = match_path("/users", "/users");
        assert!(result.is_some());
        assert_eq!(result.unwrap().len(), 0);
    }

    #[test]
    fn test_match_path_with_param() {
        let result = match_path("/users/:id", "/users/123").unwrap();
        assert_eq!(result.get("id"), Some(&"123".to_string()));
    }

    #[test]
    fn test_match_path_no_match() {
        assert!(match_path("/users/:id", "/posts/123").is_none());
        assert!(match_path("/users/:id", "/users").is_none());
    }

    #[test]
    fn test_match_path_multiple_params() {
        let params = match_path("/users/:user_id/posts/:post_id", "/users/1/posts/2").unwrap();
        assert_eq!(params.get("user_id"), Some(&"1".to_string()));
        assert_eq!(params.get("post_id"), Some(&"2".to_string()));
    }

    #[test]
    fn test_match_path_param_with_special_chars() {
        let params = match_path("/users/:id", "/users/abc-123").unwrap();
        assert_eq!(params.get("id"), Some(&"abc-123".to_string()));
    }

    #[test]
    fn test_parse_query_string() {
        let params = parse_query_string("name=john&age=30");
        assert_eq!(params.get("name"), Some(&"john".to_string()));
        assert_eq!(params.get("age"), Some(&"30".to_string()));
    }

    #[test]
    fn test_parse_query_string_empty() {
        assert!(parse_query_string("").is_empty());
    }

    #[test]
    fn test_parse_query_string_no_value() {
        let params = parse_query_string("flag&debug=true");
        assert_eq!(params.get("flag"), Some(&"".to_string()));
        assert_eq!(params.get("debug"), Some(&"true".to_string()));
    }

    #[test]
    fn test_duplicate_route_replaced_last_wins() {
        let mut router = Router::new();
        router.add_route(noop_route(HttpMethod::GET, "/x", 201));
        router.add_route(noop_route(HttpMethod::GET, "/x", 204));

        assert_eq!(router.routes().len(), 1);
    }

    #[test]
    fn test_same_template_different_verbs_coexist() {
        let mut router = Router::new();
        router.add_route(noop_route(HttpMethod::GET, "/x/:id", 200));
        router.add_route(noop_route(HttpMethod::POST, "/x/:id", 201));

        assert_eq!(router.routes().len(), 2);
    }

    #[tokio::test]
    async fn test_route_dispatch_with_query() {
        let mut router = Router::new();
        router.add_route(Route {
            method: HttpMethod::GET,
            path: "/echo".to_string(),
            handler: BoxedHandler::new(|req: HttpRequest| async move {
                let q = req.query("q").cloned().unwrap_or_default();
                Ok(HttpResponse::ok().with_body(q.into_bytes()))
            }),
        });

        let req = HttpRequest::new("GET".to_string(), "/echo?q=hello".to_string());
        let resp = router.route(req).await.unwrap();
        assert_eq!(resp.body, b"hello");
    }

    #[tokio::test]
    async fn test_route_miss_is_not_found() {
        let router = Router::new();
        let req = HttpRequest::new("GET".to_string(), "/nowhere".to_string());
        let err = router.route(req).await.unwrap_err();
        assert!(matches!(err, Error::RouteNotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_dispatches_latest_handler() {
        let mut router = Router::new();
        router.add_route(noop_route(HttpMethod::GET, "/x", 201));
        router.add_route(noop_route(HttpMethod::GET, "/x", 204));

        let resp = router
            .route(HttpRequest::new("GET".to_string(), "/x".to_string()))
            .await
            .unwrap();
        assert_eq!(resp.status, 204);
    }
}
