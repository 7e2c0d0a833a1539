//! Abstract Syntax Tree (AST) definitions for the Barrister IDL.
//!
//! The AST is produced once per parse and never mutated afterwards. It is
//! also the JSON document served by the `barrister-idl` introspection method,
//! so every node derives `Serialize`/`Deserialize` with camelCase keys.
//! Source positions are kept for diagnostics only and never serialized.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 1-based line/column location in IDL source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Root of a parsed IDL document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idl {
    /// Declared namespace names, in order of first declaration.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    /// Raw `import` paths. Resolved by [`crate::idl::loader::IdlLoader`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub imports: Vec<String>,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub structs: Vec<Struct>,
    #[serde(default)]
    pub enums: Vec<Enum>,
}

impl Idl {
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.structs.is_empty() && self.enums.is_empty()
    }

    /// Serializes the AST to its compact JSON form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the AST to indented JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reads an AST from its JSON form. The result is not validated.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the AST as a `serde_json::Value` (the introspection payload).
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|i| i.name == name)
    }
}

/// Joins a namespace and a bare name into the registry key form.
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}

/// Strips any namespace prefix: `"inc.Response"` -> `"Response"`.
pub fn base_name(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A service interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interface {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub methods: Vec<Method>,
    #[serde(skip)]
    pub pos: Position,
}

impl Interface {
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// An interface method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    pub return_type: TypeRef,
    #[serde(default, skip_serializing_if = "is_false")]
    pub return_optional: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip)]
    pub pos: Position,
}

/// A positional method parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(skip)]
    pub pos: Position,
}

/// A struct definition with optional single-parent extension.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Struct {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip)]
    pub pos: Position,
}

impl Struct {
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    #[serde(default, skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip)]
    pub pos: Position,
}

/// An enum definition. Values are matched case-sensitively by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(default)]
    pub values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip)]
    pub pos: Position,
}

impl Enum {
    pub fn qualified_name(&self) -> String {
        qualify(&self.namespace, &self.name)
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.name == value)
    }

    pub fn value_names(&self) -> Vec<&str> {
        self.values.iter().map(|v| v.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(skip)]
    pub pos: Position,
}

/// The four builtin scalar types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinType {
    String,
    Int,
    Float,
    Bool,
}

impl BuiltinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltinType::String => "string",
            BuiltinType::Int => "int",
            BuiltinType::Float => "float",
            BuiltinType::Bool => "bool",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(BuiltinType::String),
            "int" => Some(BuiltinType::Int),
            "float" => Some(BuiltinType::Float),
            "bool" => Some(BuiltinType::Bool),
            _ => None,
        }
    }
}

/// A reference to a type in a field, parameter or return position.
///
/// Serialized externally tagged: `{"builtIn": "int"}`, `{"array": ...}`,
/// `{"mapValue": ...}`, `{"userDefined": "ns.Name"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeRef {
    #[serde(rename = "builtIn")]
    Builtin(BuiltinType),
    #[serde(rename = "array")]
    Array(Box<TypeRef>),
    /// Map keyed by string; the payload is the value type.
    #[serde(rename = "mapValue")]
    Map(Box<TypeRef>),
    #[serde(rename = "userDefined")]
    UserDefined(String),
}

impl TypeRef {
    pub fn string() -> Self {
        TypeRef::Builtin(BuiltinType::String)
    }

    pub fn int() -> Self {
        TypeRef::Builtin(BuiltinType::Int)
    }

    pub fn float() -> Self {
        TypeRef::Builtin(BuiltinType::Float)
    }

    pub fn bool() -> Self {
        TypeRef::Builtin(BuiltinType::Bool)
    }

    pub fn array(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn map(value: TypeRef) -> Self {
        TypeRef::Map(Box::new(value))
    }

    pub fn user(name: impl Into<String>) -> Self {
        TypeRef::UserDefined(name.into())
    }

    /// Collects every user-defined name referenced, including nested ones.
    pub fn user_defined_names(&self) -> Vec<&str> {
        match self {
            TypeRef::Builtin(_) => Vec::new(),
            TypeRef::Array(inner) | TypeRef::Map(inner) => inner.user_defined_names(),
            TypeRef::UserDefined(name) => vec![name.as_str()],
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Builtin(b) => write!(f, "{}", b.as_str()),
            TypeRef::Array(inner) => write!(f, "[]{}", inner),
            TypeRef::Map(inner) => write!(f, "map[string]{}", inner),
            TypeRef::UserDefined(name) => write!(f, "{}", name),
        }
    }
}
