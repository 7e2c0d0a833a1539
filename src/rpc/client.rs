//! JSON-RPC client.
//!
//! A [`Client`] sends requests through a [`Transport`]: [`HttpTransport`]
//! for remote servers, [`LocalTransport`] for an in-process [`Dispatcher`].
//! When built with an IDL the client checks params before sending and
//! results after receiving, the same way the server does.

use super::dispatcher::{check_params, Dispatcher};
use super::types::{RpcError, RpcRequest, RpcResponse, IDL_METHOD};
use crate::config::ClientConfig;
use crate::error::{BarristerError, BarristerResult};
use crate::idl::{Idl, IdlValidator, Interface, Method, ValidationErrors};
use crate::registry::TypeRegistry;
use crate::validation::{IntPolicy, ValueValidator};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Carries one encoded request (single or batch) to a server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Returns `None` when the server sent nothing back.
    async fn send(&self, request: Value) -> BarristerResult<Option<Value>>;
}

/// HTTP POST transport.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: &str) -> BarristerResult<Self> {
        Self::with_config(url, &ClientConfig::default())
    }

    pub fn with_config(url: &str, config: &ClientConfig) -> BarristerResult<Self> {
        Self::with_timeout(url, config.timeout())
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> BarristerResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Value) -> BarristerResult<Option<Value>> {
        let response = self.client.post(&self.url).json(&request).send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(BarristerError::Transport(format!(
                "{} answered HTTP {}",
                self.url, status
            )));
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}

/// Sends requests straight to a dispatcher in the same process.
pub struct LocalTransport {
    dispatcher: Arc<Dispatcher>,
}

impl LocalTransport {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, request: Value) -> BarristerResult<Option<Value>> {
        Ok(self.dispatcher.handle_value(request).await)
    }
}

pub struct Client {
    transport: Arc<dyn Transport>,
    next_id: AtomicU64,
    registry: Option<Arc<TypeRegistry>>,
    int_policy: IntPolicy,
}

impl Client {
    /// A client that sends requests unchecked.
    pub fn new<T: Transport + 'static>(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            next_id: AtomicU64::new(1),
            registry: None,
            int_policy: IntPolicy::default(),
        }
    }

    /// A client that validates params and results against `idl`.
    pub fn with_idl<T: Transport + 'static>(transport: T, idl: &Idl) -> BarristerResult<Self> {
        let errors = IdlValidator::default().validate(idl);
        if !errors.is_empty() {
            return Err(BarristerError::Validation(ValidationErrors::new(errors)));
        }
        let mut client = Self::new(transport);
        client.registry = Some(Arc::new(TypeRegistry::new(idl)));
        Ok(client)
    }

    pub fn with_int_policy(mut self, int_policy: IntPolicy) -> Self {
        self.int_policy = int_policy;
        self
    }

    /// Calls `method` (`Interface.method`) and returns its result.
    ///
    /// Error responses surface as [`BarristerError::Rpc`].
    pub async fn call(&self, method: &str, params: Vec<Value>) -> BarristerResult<Value> {
        self.check_request(method, &params)?;
        let id = self.next_id();
        let request = RpcRequest::new(method, params, id);
        let reply = self
            .transport
            .send(serde_json::to_value(&request)?)
            .await?
            .ok_or_else(|| BarristerError::Transport(format!("no response to {}", method)))?;
        let response: RpcResponse = serde_json::from_value(reply)?;
        let result = response.into_result()?;
        self.check_result(method, &result)?;
        Ok(result)
    }

    /// Sends a notification; the server never answers it.
    pub async fn notify(&self, method: &str, params: Vec<Value>) -> BarristerResult<()> {
        self.check_request(method, &params)?;
        let request = RpcRequest::notification(method, params);
        self.transport.send(serde_json::to_value(&request)?).await?;
        Ok(())
    }

    /// Sends several calls as one batch; results come back in call order.
    pub async fn batch(
        &self,
        calls: Vec<(String, Vec<Value>)>,
    ) -> BarristerResult<Vec<Result<Value, RpcError>>> {
        if calls.is_empty() {
            return Ok(Vec::new());
        }
        for (method, params) in &calls {
            self.check_request(method, params)?;
        }

        let mut methods = Vec::with_capacity(calls.len());
        let mut requests = Vec::with_capacity(calls.len());
        for (method, params) in calls {
            let id = self.next_id();
            requests.push(serde_json::to_value(RpcRequest::new(method.clone(), params, id))?);
            methods.push((id, method));
        }

        let reply = self
            .transport
            .send(Value::Array(requests))
            .await?
            .ok_or_else(|| BarristerError::Transport("no response to batch".to_string()))?;
        let responses: Vec<RpcResponse> = match reply {
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<_, _>>()?,
            // a whole-batch failure comes back as a single error object
            single => {
                let response: RpcResponse = serde_json::from_value(single)?;
                return match response.into_result() {
                    Err(error) => Err(BarristerError::Rpc(error)),
                    Ok(_) => Err(BarristerError::Transport(
                        "batch answered with a single result".to_string(),
                    )),
                };
            }
        };

        let mut by_id: HashMap<u64, RpcResponse> = responses
            .into_iter()
            .filter_map(|r| r.id.as_u64().map(|id| (id, r)))
            .collect();

        let mut results = Vec::with_capacity(methods.len());
        for (id, method) in methods {
            let outcome = match by_id.remove(&id) {
                Some(response) => response.into_result().and_then(|value| {
                    self.check_result(&method, &value)
                        .map(|_| value)
                        .map_err(|e| match e {
                            BarristerError::Rpc(err) => err,
                            other => RpcError::internal(other.to_string()),
                        })
                }),
                None => Err(RpcError::internal(format!("no response for request {}", id))),
            };
            results.push(outcome);
        }
        Ok(results)
    }

    /// Fetches the server's IDL through `barrister-idl`.
    pub async fn fetch_idl(&self) -> BarristerResult<Idl> {
        let value = self.call(IDL_METHOD, Vec::new()).await?;
        Ok(serde_json::from_value(value)?)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn lookup<'a>(registry: &'a TypeRegistry, method: &str) -> Result<(&'a Interface, &'a Method), RpcError> {
        let (interface_name, method_name) = method
            .split_once('.')
            .ok_or_else(|| RpcError::method_not_found(format!("Invalid method format: {}", method)))?;
        let interface = registry
            .interface(interface_name)
            .ok_or_else(|| RpcError::method_not_found(format!("Unknown interface '{}'", interface_name)))?;
        let def = interface.method(method_name).ok_or_else(|| {
            RpcError::method_not_found(format!(
                "Method '{}' not found in interface '{}'",
                method_name, interface_name
            ))
        })?;
        Ok((interface, def))
    }

    fn check_request(&self, method: &str, params: &[Value]) -> BarristerResult<()> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };
        if method == IDL_METHOD {
            return Ok(());
        }
        let (interface, def) = Self::lookup(registry, method)?;
        let validator = ValueValidator::new(registry).with_int_policy(self.int_policy);
        check_params(&validator, def, &interface.namespace, params)?;
        Ok(())
    }

    fn check_result(&self, method: &str, result: &Value) -> BarristerResult<()> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };
        if method == IDL_METHOD {
            return Ok(());
        }
        let (interface, def) = Self::lookup(registry, method)?;
        ValueValidator::new(registry)
            .with_int_policy(self.int_policy)
            .validate_in(result, &def.return_type, Some(&interface.namespace), def.return_optional)
            .map_err(|e| RpcError::internal(format!("Response validation failed: {}", e)))?;
        Ok(())
    }
}
