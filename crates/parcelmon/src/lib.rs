//! HTTP read surface for the parcelmon delivery cache.
//!
//! The binary in `main.rs` wires configuration, logging and the monitor
//! lifecycle around [`server::router`].

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{AppState, router, serve, start_and_install};
