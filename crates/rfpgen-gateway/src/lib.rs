//! HTTP gateway exposing the proposal pipeline with bearer auth and a health endpoint.

mod error;
mod handlers;
mod router;
mod server;

#[cfg(test)]
mod testing;

pub use error::GatewayError;
pub use server::GatewayServer;
