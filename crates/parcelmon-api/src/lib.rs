// parcelmon-api: Async Rust client for the CarLo WebAPI parcel-tracking endpoints

pub mod auth;
pub mod client;
mod deliveries;
pub mod error;
pub mod models;
mod session;
pub mod transport;

pub use auth::Credentials;
pub use client::CarloClient;
pub use error::Error;
pub use models::DeliveryRecord;
pub use transport::TransportConfig;
