//! Vidseek API server library.
//!
//! Exposes config, state and the router so the binary and the integration
//! tests build the same application.

pub mod config;
pub mod router;
pub mod routes;
pub mod state;
