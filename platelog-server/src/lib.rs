//! HTTP layer for the platelog analytics backend.
//!
//! Split out as a library so the router can be driven directly in
//! integration tests without binding a socket.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
