//! Value validation engine.
//!
//! Checks decoded JSON values against IDL type references. Validation is
//! fail-fast: the first mismatch is reported with the exact path to the
//! offending value, e.g. `order.items[2].sku` or `prices["eur"]`.

use crate::idl::ast::{BuiltinType, Enum, Struct, TypeRef};
use crate::registry::{Resolution, TypeRegistry, UserType};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// How `int` positions treat numbers written with a fraction part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntPolicy {
    /// Any number without a fractional component (`5.0` passes).
    #[default]
    Lenient,
    /// Only numbers written as integers.
    Strict,
}

/// A value that does not satisfy its type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    /// Path to the value; empty for the root.
    pub path: String,
    pub reason: String,
}

impl TypeError {
    fn at(path: &Path, reason: impl Into<String>) -> Self {
        Self {
            path: path.render(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.reason)
        } else {
            write!(f, "{}: {}", self.path, self.reason)
        }
    }
}

impl std::error::Error for TypeError {}

/// JSON type name used in error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

enum Segment<'v> {
    Name(&'v str),
    Index(usize),
    Key(&'v str),
}

#[derive(Default)]
struct Path<'v> {
    segments: Vec<Segment<'v>>,
}

impl<'v> Path<'v> {
    fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Name(name) if out.is_empty() => out.push_str(name),
                Segment::Name(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                Segment::Index(idx) => out.push_str(&format!("[{}]", idx)),
                Segment::Key(key) => out.push_str(&format!("[{:?}]", key)),
            }
        }
        out
    }
}

/// Validates `value` against `type_ref` with the default lenient policy.
pub fn validate_value(
    value: &Value,
    type_ref: &TypeRef,
    registry: &TypeRegistry,
    optional: bool,
) -> Result<(), TypeError> {
    ValueValidator::new(registry).validate(value, type_ref, optional)
}

/// Validates values against types resolved through a [`TypeRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct ValueValidator<'r> {
    registry: &'r TypeRegistry,
    int_policy: IntPolicy,
}

impl<'r> ValueValidator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            int_policy: IntPolicy::default(),
        }
    }

    pub fn with_int_policy(mut self, int_policy: IntPolicy) -> Self {
        self.int_policy = int_policy;
        self
    }

    pub fn validate(&self, value: &Value, type_ref: &TypeRef, optional: bool) -> Result<(), TypeError> {
        self.validate_in(value, type_ref, None, optional)
    }

    /// Validates with user-defined names resolved from namespace `scope`.
    pub fn validate_in(
        &self,
        value: &Value,
        type_ref: &TypeRef,
        scope: Option<&str>,
        optional: bool,
    ) -> Result<(), TypeError> {
        let mut path = Path::default();
        self.check(value, type_ref, scope, optional, &mut path)
    }

    /// Validates a named value (a parameter, say); the name starts the path.
    pub fn validate_named(
        &self,
        name: &str,
        value: &Value,
        type_ref: &TypeRef,
        scope: Option<&str>,
        optional: bool,
    ) -> Result<(), TypeError> {
        let mut path = Path::default();
        path.segments.push(Segment::Name(name));
        self.check(value, type_ref, scope, optional, &mut path)
    }

    fn check<'v>(
        &self,
        value: &'v Value,
        type_ref: &TypeRef,
        scope: Option<&str>,
        optional: bool,
        path: &mut Path<'v>,
    ) -> Result<(), TypeError> {
        if value.is_null() {
            return if optional {
                Ok(())
            } else {
                Err(TypeError::at(path, format!("null is not allowed for required {}", type_ref)))
            };
        }

        match type_ref {
            TypeRef::Builtin(builtin) => self.check_builtin(value, *builtin, path),
            TypeRef::Array(element) => {
                let items = value.as_array().ok_or_else(|| {
                    TypeError::at(path, format!("expected array, got {}", json_type_name(value)))
                })?;
                for (idx, item) in items.iter().enumerate() {
                    path.segments.push(Segment::Index(idx));
                    self.check(item, element, scope, false, path)?;
                    path.segments.pop();
                }
                Ok(())
            }
            TypeRef::Map(value_type) => {
                let entries = value.as_object().ok_or_else(|| {
                    TypeError::at(path, format!("expected object for map, got {}", json_type_name(value)))
                })?;
                for (key, item) in entries {
                    path.segments.push(Segment::Key(key));
                    self.check(item, value_type, scope, false, path)?;
                    path.segments.pop();
                }
                Ok(())
            }
            TypeRef::UserDefined(name) => match self.registry.resolve(name, scope) {
                Resolution::Found(UserType::Struct(def)) => self.check_struct(value, def, path),
                Resolution::Found(UserType::Enum(def)) => check_enum(value, def, path),
                Resolution::Ambiguous(_) => Err(TypeError::at(path, format!("ambiguous type '{}'", name))),
                Resolution::Interface | Resolution::NotFound => {
                    Err(TypeError::at(path, format!("unknown type '{}'", name)))
                }
            },
        }
    }

    fn check_builtin(&self, value: &Value, builtin: BuiltinType, path: &Path<'_>) -> Result<(), TypeError> {
        let ok = match builtin {
            BuiltinType::String => value.is_string(),
            BuiltinType::Bool => value.is_boolean(),
            BuiltinType::Float => value.is_number(),
            BuiltinType::Int => match value {
                Value::Number(n) => return self.check_int(n, path),
                _ => false,
            },
        };
        if ok {
            Ok(())
        } else {
            Err(TypeError::at(
                path,
                format!("expected {}, got {}", builtin.as_str(), json_type_name(value)),
            ))
        }
    }

    fn check_int(&self, number: &Number, path: &Path<'_>) -> Result<(), TypeError> {
        if number.is_i64() || number.is_u64() {
            return Ok(());
        }
        let whole = number
            .as_f64()
            .map(|f| f.is_finite() && f.fract() == 0.0)
            .unwrap_or(false);
        match self.int_policy {
            IntPolicy::Lenient if whole => Ok(()),
            IntPolicy::Lenient => Err(TypeError::at(
                path,
                format!("expected int, got non-integer number {}", number),
            )),
            IntPolicy::Strict => Err(TypeError::at(
                path,
                format!("expected int, got number {} written with a fraction", number),
            )),
        }
    }

    fn check_struct<'v>(&self, value: &'v Value, def: &Struct, path: &mut Path<'v>) -> Result<(), TypeError> {
        let object = value.as_object().ok_or_else(|| {
            TypeError::at(
                path,
                format!("expected object for struct {}, got {}", def.name, json_type_name(value)),
            )
        })?;

        for resolved in self.registry.resolved_fields(&def.qualified_name(), None) {
            let field = resolved.field;
            let present = object
                .get_key_value(field.name.as_str())
                .filter(|(_, v)| !v.is_null());
            let Some((key, item)) = present else {
                if field.optional {
                    continue;
                }
                return Err(TypeError::at(path, format!("missing required field '{}'", field.name)));
            };
            path.segments.push(Segment::Name(key));
            self.check(item, &field.type_ref, Some(resolved.scope()), false, path)?;
            path.segments.pop();
        }
        Ok(())
    }
}

fn check_enum(value: &Value, def: &Enum, path: &Path<'_>) -> Result<(), TypeError> {
    let Some(text) = value.as_str() else {
        return Err(TypeError::at(
            path,
            format!("expected string for enum {}, got {}", def.name, json_type_name(value)),
        ));
    };
    if def.contains(text) {
        Ok(())
    } else {
        Err(TypeError::at(
            path,
            format!(
                "invalid value '{}' for enum {} (expected one of: {})",
                text,
                def.name,
                def.value_names().join(", ")
            ),
        ))
    }
}
