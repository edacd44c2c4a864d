//! Network layer.
//!
//! Plain listeners are bound directly with `tokio::net::TcpListener` in the
//! binary; TLS termination (optional) goes through `axum-server` with the
//! certificate material loaded here.

pub mod tls;

pub use tls::load_tls_config;
