//! JSON-RPC 2.0 dispatcher.
//!
//! Routes `Interface.method` requests to registered [`Handler`]s, validating
//! parameters before the call and the result after it. Batches run
//! concurrently and answer in request order. Notifications are executed but
//! never answered.

use super::types::{RpcError, RpcResponse, IDL_METHOD, JSONRPC_VERSION};
use crate::error::{BarristerError, BarristerResult};
use crate::idl::{Idl, IdlValidator, Method, ValidationErrors, ValidatorOptions};
use crate::registry::TypeRegistry;
use crate::validation::{IntPolicy, ValueValidator};
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Implementation of one IDL interface.
///
/// `params` arrive already validated and bound positionally in declaration
/// order. Return an [`RpcError`] with an application code (>= 1000) for
/// domain failures; it reaches the caller unchanged.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherOptions {
    pub validator: ValidatorOptions,
    pub int_policy: IntPolicy,
}

/// A request that passed envelope checks.
struct Call {
    method: String,
    params: Vec<Value>,
    /// Params were sent by name, which is not supported.
    named_params: bool,
    /// `None` for notifications.
    id: Option<Value>,
}

pub struct Dispatcher {
    registry: Arc<TypeRegistry>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    int_policy: IntPolicy,
    idl_json: Value,
}

impl Dispatcher {
    /// Builds a dispatcher for a validated IDL.
    ///
    /// # Errors
    ///
    /// Returns [`BarristerError::Validation`] when the IDL has semantic
    /// errors.
    pub fn new(idl: Idl) -> BarristerResult<Self> {
        Self::with_options(idl, DispatcherOptions::default())
    }

    pub fn with_options(idl: Idl, options: DispatcherOptions) -> BarristerResult<Self> {
        let errors = IdlValidator::new(options.validator).validate(&idl);
        if !errors.is_empty() {
            return Err(BarristerError::Validation(ValidationErrors::new(errors)));
        }
        let idl_json = idl.to_value()?;
        Ok(Self {
            registry: Arc::new(TypeRegistry::new(&idl)),
            handlers: HashMap::new(),
            int_policy: options.int_policy,
            idl_json,
        })
    }

    /// Registers the implementation of `interface` (bare name).
    pub fn register<H>(&mut self, interface: &str, handler: H) -> BarristerResult<()>
    where
        H: Handler + 'static,
    {
        self.register_arc(interface, Arc::new(handler))
    }

    pub fn register_arc(&mut self, interface: &str, handler: Arc<dyn Handler>) -> BarristerResult<()> {
        if self.registry.interface(interface).is_none() {
            return Err(BarristerError::UnknownInterface(interface.to_string()));
        }
        debug!("Registered handler for interface {}", interface);
        self.handlers.insert(interface.to_string(), handler);
        Ok(())
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn idl(&self) -> &Idl {
        self.registry.idl()
    }

    /// The IDL in its JSON form, as returned by `barrister-idl`.
    pub fn idl_json(&self) -> &Value {
        &self.idl_json
    }

    /// Handles a raw request body. `None` means nothing is to be sent back.
    pub async fn handle_json(&self, body: &str) -> Option<String> {
        let request: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => {
                warn!("Rejecting unparseable request: {}", e);
                let response = RpcResponse::failure(Value::Null, RpcError::parse_error(format!("Invalid JSON: {}", e)));
                return Some(response.to_value().to_string());
            }
        };
        self.handle_value(request).await.map(|v| v.to_string())
    }

    /// Handles a decoded request: a single envelope or a batch.
    pub async fn handle_value(&self, request: Value) -> Option<Value> {
        match request {
            Value::Array(items) if items.is_empty() => Some(
                RpcResponse::failure(Value::Null, RpcError::invalid_request("Empty batch array")).into(),
            ),
            Value::Array(items) => {
                debug!("Dispatching batch of {} requests", items.len());
                let responses: Vec<Value> = join_all(items.into_iter().map(|item| self.handle_single(item)))
                    .await
                    .into_iter()
                    .flatten()
                    .collect();
                if responses.is_empty() {
                    None
                } else {
                    Some(Value::Array(responses))
                }
            }
            single => self.handle_single(single).await,
        }
    }

    async fn handle_single(&self, request: Value) -> Option<Value> {
        let call = match parse_envelope(request) {
            Ok(call) => call,
            Err(error) => {
                debug!("Invalid request envelope: {:?}", error.detail());
                return Some(RpcResponse::failure(Value::Null, error).into());
            }
        };

        let outcome = self.execute(&call).await;
        let Some(id) = call.id else {
            if let Err(error) = &outcome {
                debug!("Notification {} failed: {}", call.method, error);
            }
            return None;
        };
        let response = match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::failure(id, error),
        };
        Some(response.into())
    }

    async fn execute(&self, call: &Call) -> Result<Value, RpcError> {
        if call.method == IDL_METHOD {
            return Ok(self.idl_json.clone());
        }
        let (interface_name, method_name) = call
            .method
            .split_once('.')
            .filter(|(i, m)| !i.is_empty() && !m.is_empty())
            .ok_or_else(|| RpcError::method_not_found(format!("Invalid method format: {}", call.method)))?;

        let interface = self
            .registry
            .interface(interface_name)
            .ok_or_else(|| RpcError::method_not_found(format!("Unknown interface '{}'", interface_name)))?;
        let handler = self.handlers.get(interface_name).ok_or_else(|| {
            RpcError::method_not_found(format!("Interface '{}' not registered", interface_name))
        })?;
        let method = interface.method(method_name).ok_or_else(|| {
            RpcError::method_not_found(format!(
                "Method '{}' not found in interface '{}'",
                method_name, interface_name
            ))
        })?;

        if call.named_params {
            return Err(RpcError::invalid_params(
                "Named parameters are not supported; pass params as an array",
            ));
        }

        check_params(&self.validator(), method, &interface.namespace, &call.params)?;

        debug!("Invoking {}", call.method);
        let result = handler.call(method_name, call.params.clone()).await?;

        self.validator()
            .validate_in(&result, &method.return_type, Some(&interface.namespace), method.return_optional)
            .map_err(|e| {
                warn!("{} returned an invalid result: {}", call.method, e);
                RpcError::internal(format!("Response validation failed: {}", e))
            })?;
        Ok(result)
    }

    fn validator(&self) -> ValueValidator<'_> {
        ValueValidator::new(&self.registry).with_int_policy(self.int_policy)
    }
}

/// Checks positional params against a method's declaration.
pub(crate) fn check_params(
    validator: &ValueValidator<'_>,
    method: &Method,
    scope: &str,
    params: &[Value],
) -> Result<(), RpcError> {
    if params.len() != method.parameters.len() {
        return Err(RpcError::invalid_params(format!(
            "Expected {} parameters, got {}",
            method.parameters.len(),
            params.len()
        )));
    }
    for (idx, (param, value)) in method.parameters.iter().zip(params).enumerate() {
        validator
            .validate_named(&param.name, value, &param.type_ref, Some(scope), false)
            .map_err(|e| {
                RpcError::invalid_params(format!(
                    "Parameter {} ({}) validation failed: {}",
                    idx, param.name, e
                ))
            })?;
    }
    Ok(())
}

/// Checks the envelope of one request.
fn parse_envelope(request: Value) -> Result<Call, RpcError> {
    let Value::Object(mut envelope) = request else {
        return Err(RpcError::invalid_request("Request must be an object"));
    };

    if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(RpcError::invalid_request("jsonrpc must be '2.0'"));
    }
    let method = match envelope.remove("method") {
        Some(Value::String(method)) => method,
        _ => return Err(RpcError::invalid_request("method must be a string")),
    };
    let id = match envelope.remove("id") {
        None => None,
        Some(id @ (Value::Null | Value::String(_) | Value::Number(_))) => Some(id),
        Some(_) => return Err(RpcError::invalid_request("id must be a string, number or null")),
    };
    let (params, named_params) = match envelope.remove("params") {
        None | Some(Value::Null) => (Vec::new(), false),
        Some(Value::Array(params)) => (params, false),
        Some(Value::Object(_)) => (Vec::new(), true),
        Some(_) => return Err(RpcError::invalid_request("params must be an array or object")),
    };

    Ok(Call {
        method,
        params,
        named_params,
        id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_rejects_bad_version() {
        let err = parse_envelope(json!({"jsonrpc": "1.0", "method": "A.b", "id": 1})).err().unwrap();
        assert_eq!(err.code, -32600);
    }

    #[test]
    fn envelope_rejects_object_id() {
        let err = parse_envelope(json!({"jsonrpc": "2.0", "method": "A.b", "id": {}})).err().unwrap();
        assert_eq!(err.code, -32600);
    }

    #[test]
    fn envelope_keeps_absent_id_apart_from_null() {
        let call = parse_envelope(json!({"jsonrpc": "2.0", "method": "A.b"})).ok().unwrap();
        assert!(call.id.is_none());
        let call = parse_envelope(json!({"jsonrpc": "2.0", "method": "A.b", "id": null})).ok().unwrap();
        assert_eq!(call.id, Some(Value::Null));
    }
}
