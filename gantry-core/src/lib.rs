// Core library for the Gantry framework
// Declarative controller routing: action registration, compilation into
// routable handlers, and dependency-scoped per-request dispatch

pub mod action;
pub mod application;
pub mod compiler;
pub mod container;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod http;
pub mod logging;
pub mod param;
pub mod registry;
pub mod routing;
pub mod status;
pub mod traits;

// Re-export commonly used types
pub use action::{Action, Outcome};
pub use application::*;
pub use compiler::{compile_to_routes, mount, mount_controller, RouteBinding, RouteSet};
pub use container::*;
pub use dispatch::{dispatch, DefaultErrorChannel, ErrorChannel, ResponseSeed, ScopedRequest};
pub use error::*;
pub use handler::{BoxedHandler, Handler};
pub use http::*;
pub use param::ParamSource;
pub use registry::{ActionEntry, ActionRegistry, ControllerBuilder, MethodBuilder};
pub use routing::{Route, Router};
pub use status::*;
pub use traits::*;
