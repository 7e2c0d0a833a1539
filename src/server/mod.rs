//! HTTP hosting for the dispatcher.

pub mod http_server;

pub use http_server::{AppState, RpcHttpServer};
