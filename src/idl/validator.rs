//! Semantic validation of a parsed IDL.
//!
//! The validator never stops at the first problem: every check runs over the
//! whole document and all findings are returned together.

use super::ast::{Idl, Position, Struct, TypeRef};
use super::errors::{ValidationError, ValidationErrors};
use crate::registry::{Resolution, TypeRegistry, UserType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("identifier pattern compiles"));

/// Whether `name` is a legal IDL identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Reject definitions outside any declared namespace.
    pub require_namespace: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IdlValidator {
    options: ValidatorOptions,
}

/// Validates with default options.
pub fn validate(idl: &Idl) -> Vec<ValidationError> {
    IdlValidator::default().validate(idl)
}

impl IdlValidator {
    pub fn new(options: ValidatorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Runs every check and returns all errors found (empty when valid).
    pub fn validate(&self, idl: &Idl) -> Vec<ValidationError> {
        let registry = TypeRegistry::new(idl);
        let mut errors = Vec::new();

        self.check_namespaces(idl, &mut errors);
        check_identifiers(idl, &mut errors);
        check_duplicate_types(idl, &mut errors);
        check_interface_names(idl, &mut errors);
        check_members(idl, &mut errors);
        check_extends(idl, &registry, &mut errors);
        check_type_refs(idl, &registry, &mut errors);
        check_required_cycles(idl, &registry, &mut errors);

        if !errors.is_empty() {
            log::debug!("IDL validation found {} errors", errors.len());
        }
        errors
    }

    /// Like [`validate`](Self::validate), as a `Result`.
    pub fn check(&self, idl: &Idl) -> Result<(), ValidationErrors> {
        ValidationErrors::new(self.validate(idl)).into_result()
    }

    fn check_namespaces(&self, idl: &Idl, errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();
        let used = idl
            .interfaces
            .iter()
            .map(|i| &i.namespace)
            .chain(idl.structs.iter().map(|s| &s.namespace))
            .chain(idl.enums.iter().map(|e| &e.namespace))
            .filter(|ns| !ns.is_empty());

        for ns in idl.namespaces.iter().chain(used) {
            if seen.insert(ns.as_str()) && !is_valid_identifier(ns) {
                errors.push(ValidationError::new(
                    format!("namespace {}", ns),
                    first_position_in(idl, ns),
                    format!("invalid namespace name '{}'", ns),
                ));
            }
        }

        if !self.options.require_namespace {
            return;
        }
        let unscoped = idl
            .interfaces
            .iter()
            .filter(|i| i.namespace.is_empty())
            .map(|i| (format!("interface {}", i.name), i.pos))
            .chain(
                idl.structs
                    .iter()
                    .filter(|s| s.namespace.is_empty())
                    .map(|s| (format!("struct {}", s.name), s.pos)),
            )
            .chain(
                idl.enums
                    .iter()
                    .filter(|e| e.namespace.is_empty())
                    .map(|e| (format!("enum {}", e.name), e.pos)),
            );
        for (construct, pos) in unscoped {
            errors.push(ValidationError::new(
                construct,
                pos,
                "definition must belong to a declared namespace",
            ));
        }
    }
}

fn first_position_in(idl: &Idl, ns: &str) -> Position {
    idl.interfaces
        .iter()
        .filter(|i| i.namespace == ns)
        .map(|i| i.pos)
        .chain(idl.structs.iter().filter(|s| s.namespace == ns).map(|s| s.pos))
        .chain(idl.enums.iter().filter(|e| e.namespace == ns).map(|e| e.pos))
        .min()
        .unwrap_or_default()
}

fn check_identifiers(idl: &Idl, errors: &mut Vec<ValidationError>) {
    let mut check = |construct: String, name: &str, pos: Position| {
        if !is_valid_identifier(name) {
            errors.push(ValidationError::new(
                construct,
                pos,
                format!("invalid identifier '{}'", name),
            ));
        }
    };

    for iface in &idl.interfaces {
        check(format!("interface {}", iface.qualified_name()), &iface.name, iface.pos);
        for method in &iface.methods {
            check(format!("method {}.{}", iface.name, method.name), &method.name, method.pos);
            for param in &method.parameters {
                check(
                    format!("parameter {}.{}({})", iface.name, method.name, param.name),
                    &param.name,
                    param.pos,
                );
            }
        }
    }
    for def in &idl.structs {
        let qualified = def.qualified_name();
        check(format!("struct {}", qualified), &def.name, def.pos);
        for field in &def.fields {
            check(format!("field {}.{}", qualified, field.name), &field.name, field.pos);
        }
    }
    for def in &idl.enums {
        let qualified = def.qualified_name();
        check(format!("enum {}", qualified), &def.name, def.pos);
        for value in &def.values {
            check(format!("enum value {}.{}", qualified, value.name), &value.name, value.pos);
        }
    }
}

fn check_duplicate_types(idl: &Idl, errors: &mut Vec<ValidationError>) {
    let definitions = idl
        .interfaces
        .iter()
        .map(|i| ("interface", i.qualified_name(), i.pos))
        .chain(idl.structs.iter().map(|s| ("struct", s.qualified_name(), s.pos)))
        .chain(idl.enums.iter().map(|e| ("enum", e.qualified_name(), e.pos)));

    let mut first_seen: HashMap<String, Position> = HashMap::new();
    for (kind, qualified, pos) in definitions {
        match first_seen.get(&qualified) {
            Some(first) => errors.push(ValidationError::new(
                format!("{} {}", kind, qualified),
                pos,
                format!("duplicate type name '{}' (first defined at {})", qualified, first),
            )),
            None => {
                first_seen.insert(qualified, pos);
            }
        }
    }
}

fn check_interface_names(idl: &Idl, errors: &mut Vec<ValidationError>) {
    let mut owners: HashMap<&str, &str> = HashMap::new();
    for iface in &idl.interfaces {
        match owners.get(iface.name.as_str()) {
            // same-namespace duplicates are already reported as duplicate types
            Some(ns) if *ns != iface.namespace => errors.push(ValidationError::new(
                format!("interface {}", iface.qualified_name()),
                iface.pos,
                format!(
                    "interface name '{}' is already used in namespace '{}'",
                    iface.name, ns
                ),
            )),
            Some(_) => {}
            None => {
                owners.insert(&iface.name, &iface.namespace);
            }
        }
    }
}

fn check_members(idl: &Idl, errors: &mut Vec<ValidationError>) {
    for iface in &idl.interfaces {
        let mut methods = HashSet::new();
        for method in &iface.methods {
            let construct = format!("method {}.{}", iface.name, method.name);
            if !methods.insert(method.name.as_str()) {
                errors.push(ValidationError::new(
                    construct.clone(),
                    method.pos,
                    format!("duplicate method '{}'", method.name),
                ));
            }
            let mut params = HashSet::new();
            for param in &method.parameters {
                if !params.insert(param.name.as_str()) {
                    errors.push(ValidationError::new(
                        construct.clone(),
                        param.pos,
                        format!("duplicate parameter '{}'", param.name),
                    ));
                }
            }
        }
    }
    for def in &idl.structs {
        let mut fields = HashSet::new();
        for field in &def.fields {
            if !fields.insert(field.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("struct {}", def.qualified_name()),
                    field.pos,
                    format!("duplicate field '{}'", field.name),
                ));
            }
        }
    }
    for def in &idl.enums {
        let mut values = HashSet::new();
        for value in &def.values {
            if !values.insert(value.name.as_str()) {
                errors.push(ValidationError::new(
                    format!("enum {}", def.qualified_name()),
                    value.pos,
                    format!("duplicate enum value '{}'", value.name),
                ));
            }
        }
    }
}

fn check_extends(idl: &Idl, registry: &TypeRegistry, errors: &mut Vec<ValidationError>) {
    for def in &idl.structs {
        let Some(parent) = &def.extends else { continue };
        let problem = match registry.resolve(parent, Some(&def.namespace)) {
            Resolution::Found(UserType::Struct(_)) => None,
            Resolution::Found(UserType::Enum(_)) => {
                Some(format!("cannot extend enum '{}'; only structs can be extended", parent))
            }
            Resolution::Interface => Some(format!(
                "cannot extend interface '{}'; only structs can be extended",
                parent
            )),
            Resolution::Ambiguous(candidates) => Some(format!(
                "ambiguous parent '{}' (candidates: {})",
                parent,
                candidates.join(", ")
            )),
            Resolution::NotFound => Some(format!("extends unknown struct '{}'", parent)),
        };
        if let Some(message) = problem {
            errors.push(ValidationError::new(
                format!("struct {}", def.qualified_name()),
                def.pos,
                message,
            ));
        }
    }

    let mut reported: HashSet<Vec<String>> = HashSet::new();
    for start in &idl.structs {
        let mut path: Vec<&Struct> = vec![start];
        let mut current = start;
        while let Some(parent) = current
            .extends
            .as_deref()
            .and_then(|p| registry.resolve_struct(p, Some(&current.namespace)))
        {
            let parent_key = parent.qualified_name();
            if let Some(idx) = path.iter().position(|s| s.qualified_name() == parent_key) {
                let cycle = &path[idx..];
                if reported.insert(cycle_key(cycle)) {
                    let mut names: Vec<String> = cycle.iter().map(|s| s.qualified_name()).collect();
                    names.push(parent_key);
                    errors.push(ValidationError::new(
                        format!("struct {}", cycle[0].qualified_name()),
                        cycle[0].pos,
                        format!("extends cycle: {}", names.join(" -> ")),
                    ));
                }
                break;
            }
            path.push(parent);
            current = parent;
        }
    }
}

fn check_type_refs(idl: &Idl, registry: &TypeRegistry, errors: &mut Vec<ValidationError>) {
    let mut check = |construct: &dyn Fn() -> String, type_ref: &TypeRef, scope: &str, pos: Position| {
        for name in type_ref.user_defined_names() {
            let problem = match registry.resolve(name, Some(scope)) {
                Resolution::Found(_) => continue,
                Resolution::Ambiguous(candidates) => format!(
                    "ambiguous type '{}' (candidates: {})",
                    name,
                    candidates.join(", ")
                ),
                Resolution::Interface => {
                    format!("'{}' is an interface, not a struct or enum", name)
                }
                Resolution::NotFound => format!("unknown type '{}'", name),
            };
            errors.push(ValidationError::new(construct(), pos, problem));
        }
    };

    for iface in &idl.interfaces {
        for method in &iface.methods {
            for param in &method.parameters {
                check(
                    &|| format!("parameter {}.{}({})", iface.name, method.name, param.name),
                    &param.type_ref,
                    &iface.namespace,
                    param.pos,
                );
            }
            check(
                &|| format!("method {}.{}", iface.name, method.name),
                &method.return_type,
                &iface.namespace,
                method.pos,
            );
        }
    }
    for def in &idl.structs {
        for field in &def.fields {
            check(
                &|| format!("field {}.{}", def.qualified_name(), field.name),
                &field.type_ref,
                &def.namespace,
                field.pos,
            );
        }
    }
}

/// Reports structs that can only be built by embedding themselves through
/// required fields. Optional fields, arrays and maps end the chain.
fn check_required_cycles(idl: &Idl, registry: &TypeRegistry, errors: &mut Vec<ValidationError>) {
    let mut reported: HashSet<Vec<String>> = HashSet::new();
    for start in &idl.structs {
        let start_key = start.qualified_name();
        let mut visited = HashSet::new();
        let mut path = vec![start];
        if let Some(cycle) = required_path_to(registry, start, &start_key, &mut visited, &mut path) {
            if reported.insert(cycle_key(&cycle)) {
                let mut names: Vec<String> = cycle.iter().map(|s| s.qualified_name()).collect();
                names.push(start_key);
                errors.push(ValidationError::new(
                    format!("struct {}", start.qualified_name()),
                    start.pos,
                    format!(
                        "required fields form a cycle ({}); no finite value can satisfy it",
                        names.join(" -> ")
                    ),
                ));
            }
        }
    }
}

fn required_path_to<'a>(
    registry: &'a TypeRegistry,
    current: &'a Struct,
    target: &str,
    visited: &mut HashSet<String>,
    path: &mut Vec<&'a Struct>,
) -> Option<Vec<&'a Struct>> {
    for resolved in registry.resolved_fields(&current.qualified_name(), None) {
        if resolved.field.optional {
            continue;
        }
        let TypeRef::UserDefined(name) = &resolved.field.type_ref else {
            continue;
        };
        let Some(next) = registry.resolve_struct(name, Some(resolved.scope())) else {
            continue;
        };
        let next_key = next.qualified_name();
        if next_key == target {
            return Some(path.clone());
        }
        if visited.insert(next_key) {
            path.push(next);
            if let Some(found) = required_path_to(registry, next, target, visited, path) {
                return Some(found);
            }
            path.pop();
        }
    }
    None
}

fn cycle_key(cycle: &[&Struct]) -> Vec<String> {
    let mut key: Vec<String> = cycle.iter().map(|s| s.qualified_name()).collect();
    key.sort();
    key
}
