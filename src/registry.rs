//! Type registry and field resolver.
//!
//! Built once from a validated [`Idl`] and read-only afterwards. Structs and
//! enums are keyed by their qualified name (`ns.Name`, or the bare name for
//! the empty namespace); bare names resolve too as long as only one
//! namespace defines them.

use crate::idl::ast::{base_name, qualify, Enum, Field, Idl, Interface, Struct};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A user-defined type found by name.
#[derive(Debug, Clone, Copy)]
pub enum UserType<'a> {
    Struct(&'a Struct),
    Enum(&'a Enum),
}

/// Outcome of resolving a user-defined type name.
#[derive(Debug, Clone)]
pub enum Resolution<'a> {
    Found(UserType<'a>),
    /// The bare name is defined in several namespaces; holds the candidates.
    Ambiguous(Vec<String>),
    /// The name refers to an interface, which is not a value type.
    Interface,
    NotFound,
}

/// A flattened struct field together with the struct that declared it.
///
/// Inherited fields keep their declaring struct so nested type names are
/// resolved in the parent's namespace.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedField<'a> {
    pub field: &'a Field,
    pub owner: &'a Struct,
}

impl<'a> ResolvedField<'a> {
    pub fn scope(&self) -> &'a str {
        &self.owner.namespace
    }
}

/// The definitions of one namespace, in declaration order.
#[derive(Debug, Default, Clone)]
pub struct NamespaceTypes<'a> {
    pub interfaces: Vec<&'a Interface>,
    pub structs: Vec<&'a Struct>,
    pub enums: Vec<&'a Enum>,
}

#[derive(Debug, Clone)]
pub struct TypeRegistry {
    idl: Idl,
    structs: HashMap<String, usize>,
    enums: HashMap<String, usize>,
    interfaces: HashMap<String, usize>,
    /// Bare name -> qualified keys of every struct or enum using it.
    by_bare_name: HashMap<String, Vec<String>>,
}

impl TypeRegistry {
    pub fn new(idl: &Idl) -> Self {
        let idl = idl.clone();
        let mut structs = HashMap::new();
        let mut enums = HashMap::new();
        let mut interfaces = HashMap::new();
        let mut by_bare_name: HashMap<String, Vec<String>> = HashMap::new();

        for (idx, def) in idl.structs.iter().enumerate() {
            let key = def.qualified_name();
            if !structs.contains_key(&key) {
                structs.insert(key.clone(), idx);
                note_bare_name(&mut by_bare_name, &def.name, key);
            }
        }
        for (idx, def) in idl.enums.iter().enumerate() {
            let key = def.qualified_name();
            if !enums.contains_key(&key) {
                enums.insert(key.clone(), idx);
                note_bare_name(&mut by_bare_name, &def.name, key);
            }
        }
        for (idx, def) in idl.interfaces.iter().enumerate() {
            interfaces.entry(def.name.clone()).or_insert(idx);
        }

        log::debug!(
            "Type registry built: {} structs, {} enums, {} interfaces",
            structs.len(),
            enums.len(),
            interfaces.len()
        );

        Self {
            idl,
            structs,
            enums,
            interfaces,
            by_bare_name,
        }
    }

    /// The AST this registry was built from.
    pub fn idl(&self) -> &Idl {
        &self.idl
    }

    /// Interface by bare name.
    pub fn interface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.get(name).map(|&idx| &self.idl.interfaces[idx])
    }

    /// Resolves a user-defined type name as seen from `scope`.
    ///
    /// Order: `scope.Name` for unqualified names, then the exact key, then
    /// the bare name when only one namespace defines it. A qualified name
    /// only ever matches its exact key.
    pub fn resolve(&self, name: &str, scope: Option<&str>) -> Resolution<'_> {
        let qualified = name.contains('.');
        if let Some(scope) = scope.filter(|s| !s.is_empty() && !qualified) {
            if let Some(found) = self.lookup_key(&qualify(scope, name)) {
                return Resolution::Found(found);
            }
        }
        if let Some(found) = self.lookup_key(name) {
            return Resolution::Found(found);
        }
        if qualified {
            return match self.interface(base_name(name)) {
                Some(def) if def.qualified_name() == name => Resolution::Interface,
                _ => Resolution::NotFound,
            };
        }

        match self.by_bare_name.get(name).map(Vec::as_slice) {
            Some([key]) => match self.lookup_key(key) {
                Some(found) => Resolution::Found(found),
                None => Resolution::NotFound,
            },
            Some(keys) if keys.len() > 1 => Resolution::Ambiguous(keys.to_vec()),
            _ if self.interfaces.contains_key(name) => Resolution::Interface,
            _ => Resolution::NotFound,
        }
    }

    pub fn resolve_struct(&self, name: &str, scope: Option<&str>) -> Option<&Struct> {
        match self.resolve(name, scope) {
            Resolution::Found(UserType::Struct(def)) => Some(def),
            _ => None,
        }
    }

    pub fn resolve_enum(&self, name: &str, scope: Option<&str>) -> Option<&Enum> {
        match self.resolve(name, scope) {
            Resolution::Found(UserType::Enum(def)) => Some(def),
            _ => None,
        }
    }

    pub fn find_struct(&self, name: &str) -> Option<&Struct> {
        self.resolve_struct(name, None)
    }

    /// Enum by exact name, retried with any namespace prefix stripped.
    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enums
            .get(name)
            .map(|&idx| &self.idl.enums[idx])
            .or_else(|| self.resolve_enum(base_name(name), None))
    }

    /// Flattened fields of a struct, parent fields first.
    ///
    /// A field redeclared by a child replaces the inherited one at the
    /// parent's position. Unknown structs yield an empty list.
    pub fn get_struct_fields(&self, name: &str) -> Vec<&Field> {
        self.resolved_fields(name, None)
            .into_iter()
            .map(|resolved| resolved.field)
            .collect()
    }

    /// Like [`get_struct_fields`](Self::get_struct_fields), keeping the
    /// declaring struct of every field.
    pub fn resolved_fields(&self, name: &str, scope: Option<&str>) -> Vec<ResolvedField<'_>> {
        let mut out = Vec::new();
        if let Some(def) = self.resolve_struct(name, scope) {
            let mut visited = HashSet::new();
            self.collect_fields(def, &mut visited, &mut out);
        }
        out
    }

    fn collect_fields<'a>(
        &'a self,
        def: &'a Struct,
        visited: &mut HashSet<String>,
        out: &mut Vec<ResolvedField<'a>>,
    ) {
        // a repeated struct means a malformed extends chain
        if !visited.insert(def.qualified_name()) {
            return;
        }
        if let Some(parent) = &def.extends {
            if let Some(parent) = self.resolve_struct(parent, Some(&def.namespace)) {
                self.collect_fields(parent, visited, out);
            }
        }
        for field in &def.fields {
            let resolved = ResolvedField { field, owner: def };
            match out.iter().position(|f| f.field.name == field.name) {
                Some(idx) => out[idx] = resolved,
                None => out.push(resolved),
            }
        }
    }

    /// Definitions grouped by namespace, namespaces in sorted order.
    pub fn namespaces(&self) -> BTreeMap<String, NamespaceTypes<'_>> {
        let mut grouped: BTreeMap<String, NamespaceTypes<'_>> = BTreeMap::new();
        for ns in &self.idl.namespaces {
            grouped.entry(ns.clone()).or_default();
        }
        for def in &self.idl.interfaces {
            grouped.entry(def.namespace.clone()).or_default().interfaces.push(def);
        }
        for def in &self.idl.structs {
            grouped.entry(def.namespace.clone()).or_default().structs.push(def);
        }
        for def in &self.idl.enums {
            grouped.entry(def.namespace.clone()).or_default().enums.push(def);
        }
        grouped
    }

    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.idl.structs.iter()
    }

    pub fn enums(&self) -> impl Iterator<Item = &Enum> {
        self.idl.enums.iter()
    }

    fn lookup_key(&self, key: &str) -> Option<UserType<'_>> {
        if let Some(&idx) = self.structs.get(key) {
            return Some(UserType::Struct(&self.idl.structs[idx]));
        }
        self.enums
            .get(key)
            .map(|&idx| UserType::Enum(&self.idl.enums[idx]))
    }
}

fn note_bare_name(index: &mut HashMap<String, Vec<String>>, bare: &str, key: String) {
    let keys = index.entry(bare.to_string()).or_default();
    if !keys.contains(&key) {
        keys.push(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idl::parse;

    fn registry(text: &str) -> TypeRegistry {
        TypeRegistry::new(&parse(text).unwrap())
    }

    #[test]
    fn bare_name_resolves_when_unique() {
        let reg = registry("namespace inc\nstruct Response { ok bool }");
        assert!(reg.find_struct("Response").is_some());
        assert!(reg.find_struct("inc.Response").is_some());
        assert!(reg.find_struct("other.Response").is_none());
    }

    #[test]
    fn scope_wins_over_unnamespaced_type() {
        let reg = registry("struct Thing { x int }\nnamespace b\nstruct Thing { y int }");
        assert_eq!(reg.resolve_struct("Thing", Some("b")).unwrap().namespace, "b");
        assert_eq!(reg.resolve_struct("Thing", None).unwrap().namespace, "");
        assert_eq!(reg.resolve_struct("Thing", Some("other")).unwrap().namespace, "");
    }

    #[test]
    fn find_enum_strips_unknown_prefix() {
        let reg = registry("namespace inc\nenum Color { red }");
        assert!(reg.find_enum("zzz.Color").is_some());
        assert!(reg.resolve_enum("zzz.Color", None).is_none());
    }

    #[test]
    fn ambiguous_bare_name_needs_scope() {
        let reg = registry(
            "namespace a\nstruct Item { x int }\nnamespace b\nstruct Item { y int }",
        );
        assert!(matches!(reg.resolve("Item", None), Resolution::Ambiguous(keys) if keys.len() == 2));
        assert_eq!(reg.resolve_struct("Item", Some("b")).unwrap().fields[0].name, "y");
    }

    #[test]
    fn cyclic_extends_terminates() {
        let reg = registry("struct A extends B { a int }\nstruct B extends A { b int }");
        let names: Vec<_> = reg.get_struct_fields("A").iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn interface_name_is_not_a_type() {
        let reg = registry("interface Svc { ping() bool }");
        assert!(matches!(reg.resolve("Svc", None), Resolution::Interface));
    }
}
