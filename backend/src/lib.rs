//! Task board HTTP API.
//!
//! Layers, outermost first: [`routes`] (axum handlers) → [`service`] /
//! [`auth`] → [`store`] (Redis or in-memory).

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
