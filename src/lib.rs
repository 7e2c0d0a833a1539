//! # Barrister
//!
//! Barrister is an interface definition language for JSON-RPC 2.0 services.
//! This crate parses and validates IDL documents, checks JSON values against
//! the declared types, and dispatches JSON-RPC requests to handler
//! implementations with validation on the way in and out.
//!
//! ## Modules
//!
//! * `idl` - AST, parser, validator, import loader and printer
//! * `registry` - namespace-aware type lookup with inherited fields
//! * `validation` - validation of JSON values against IDL types
//! * `rpc` - JSON-RPC envelopes, dispatcher and client
//! * `server` - HTTP hosting of a dispatcher
//! * `config` - TOML configuration
//! * `logging` - logger setup for binaries
//!
//! ## Example
//!
//! ```rust,no_run
//! use barrister::idl::parse;
//! use barrister::rpc::{Dispatcher, Handler, RpcError};
//! use async_trait::async_trait;
//! use serde_json::{json, Value};
//!
//! struct Calc;
//!
//! #[async_trait]
//! impl Handler for Calc {
//!     async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
//!         match method {
//!             "add" => Ok(json!(params[0].as_i64().unwrap_or(0) + params[1].as_i64().unwrap_or(0))),
//!             _ => Err(RpcError::method_not_found(method)),
//!         }
//!     }
//! }
//!
//! # async fn run() -> barrister::BarristerResult<()> {
//! let idl = parse("interface Calc { add(a int, b int) int }")?;
//! let mut dispatcher = Dispatcher::new(idl)?;
//! dispatcher.register("Calc", Calc)?;
//! let reply = dispatcher
//!     .handle_json(r#"{"jsonrpc":"2.0","method":"Calc.add","params":[1,2],"id":1}"#)
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod idl;
pub mod logging;
pub mod registry;
pub mod rpc;
pub mod server;
pub mod validation;

pub use config::{ConfigError, ServerConfig};
pub use error::{BarristerError, BarristerResult};
pub use idl::{parse, Idl, IdlLoader, TypeRef};
pub use logging::LoggingSystem;
pub use registry::TypeRegistry;
pub use rpc::{Client, Dispatcher, Handler, RpcError};
pub use server::RpcHttpServer;
pub use validation::{validate_value, IntPolicy, TypeError, ValueValidator};
