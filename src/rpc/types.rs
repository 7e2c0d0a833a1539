//! JSON-RPC 2.0 wire types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Introspection method returning the IDL in its JSON form.
pub const IDL_METHOD: &str = "barrister-idl";

/// Error codes used by the dispatcher.
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
    /// Application errors start here by convention.
    pub const APPLICATION_MIN: i64 = 1000;
}

/// The `error` member of a response.
///
/// Protocol errors carry the standard JSON-RPC message with the detail in
/// `data`; application errors travel exactly as the handler produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("RPC error {code}: {message}")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn parse_error(detail: impl Into<String>) -> Self {
        Self::new(error_codes::PARSE_ERROR, "Parse error").with_data(Value::String(detail.into()))
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_REQUEST, "Invalid Request").with_data(Value::String(detail.into()))
    }

    pub fn method_not_found(detail: impl Into<String>) -> Self {
        Self::new(error_codes::METHOD_NOT_FOUND, "Method not found").with_data(Value::String(detail.into()))
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, "Invalid params").with_data(Value::String(detail.into()))
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, "Internal error").with_data(Value::String(detail.into()))
    }

    /// An application-defined error (codes >= 1000 by convention).
    pub fn application(code: i64, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    pub fn is_application(&self) -> bool {
        self.code >= error_codes::APPLICATION_MIN
    }

    /// The detail text carried in `data`, if it is a string.
    pub fn detail(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("code".to_string(), Value::from(self.code));
        map.insert("message".to_string(), Value::String(self.message.clone()));
        if let Some(data) = &self.data {
            map.insert("data".to_string(), data.clone());
        }
        Value::Object(map)
    }
}

/// Distinguishes an absent `id` (notification) from `"id": null`.
fn deserialize_some<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A request envelope as sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    /// `None` marks a notification.
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: impl Into<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: Some(id.into()),
        }
    }

    pub fn notification(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id: None,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Either side of a response; flattening it guarantees exactly one of
/// `result` or `error` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(RpcError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(default)]
    pub id: Value,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: Outcome::Result(result),
            id,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            outcome: Outcome::Error(error),
            id,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }

    pub fn into_result(self) -> Result<Value, RpcError> {
        match self.outcome {
            Outcome::Result(value) => Ok(value),
            Outcome::Error(error) => Err(error),
        }
    }

    /// Wire form as a JSON value.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("jsonrpc".to_string(), Value::String(self.jsonrpc.clone()));
        match &self.outcome {
            Outcome::Result(value) => map.insert("result".to_string(), value.clone()),
            Outcome::Error(error) => map.insert("error".to_string(), error.to_value()),
        };
        map.insert("id".to_string(), self.id.clone());
        Value::Object(map)
    }
}

impl From<RpcResponse> for Value {
    fn from(response: RpcResponse) -> Self {
        response.to_value()
    }
}
