//! # JSON-RPC 2.0
//!
//! * `types` - wire envelopes and error codes
//! * `dispatcher` - server-side routing, validation, batches and notifications
//! * `client` - client with HTTP and in-process transports

pub mod client;
pub mod dispatcher;
pub mod types;

pub use client::{Client, HttpTransport, LocalTransport, Transport};
pub use dispatcher::{Dispatcher, DispatcherOptions, Handler};
pub use types::{error_codes, Outcome, RpcError, RpcRequest, RpcResponse, IDL_METHOD, JSONRPC_VERSION};
