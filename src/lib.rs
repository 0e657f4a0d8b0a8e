// Gantry - a declarative controller routing layer for Rust
//
// Controllers register their routes and parameter sources through an
// explicit builder; the compiler turns the frozen registry into mounted
// routes dispatched against a per-request dependency scope.

// Re-export core functionality
pub use gantry_core::*;
