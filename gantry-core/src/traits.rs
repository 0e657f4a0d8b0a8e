// Core traits for the Gantry framework

use std::any::TypeId;

/// Trait for types that can be provided by the DI container
pub trait Provider: Send + Sync + 'static {
    /// Returns the TypeId of the provider
    fn type_id(&self) -> TypeId {
        TypeId::of::<Self>()
    }
}

/// Trait for controllers resolvable through a dependency context.
///
/// `construct` performs constructor injection: every collaborator the
/// controller needs is resolved from the supplied container. At dispatch
/// time the container is the per-request scope, so constructors may also
/// depend on the current request (see `dispatch::ScopedRequest`).
pub trait Injectable: Send + Sync + Sized + 'static {
    fn construct(container: &crate::Container) -> Result<Self, crate::Error>;
}

/// HTTP methods routable by this crate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    GET,
    PUT,
    POST,
    PATCH,
    DELETE,
}

impl HttpMethod {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "PUT" => Some(HttpMethod::PUT),
            "POST" => Some(HttpMethod::POST),
            "PATCH" => Some(HttpMethod::PATCH),
            "DELETE" => Some(HttpMethod::DELETE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::PUT => "PUT",
            HttpMethod::POST => "POST",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_round_trip() {
        for m in [
            HttpMethod::GET,
            HttpMethod::PUT,
            HttpMethod::POST,
            HttpMethod::PATCH,
            HttpMethod::DELETE,
        ] {
            assert_eq!(HttpMethod::from_str(m.as_str()), Some(m));
        }
    }

    #[test]
    fn test_method_from_lowercase() {
        assert_eq!(HttpMethod::from_str("get"), Some(HttpMethod::GET));
        assert_eq!(HttpMethod::from_str("options"), None);
    }
}
