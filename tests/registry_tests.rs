use barrister::idl::parse;
use barrister::registry::{Resolution, UserType};
use barrister::TypeRegistry;

fn registry(text: &str) -> TypeRegistry {
    TypeRegistry::new(&parse(text).unwrap())
}

fn field_names(registry: &TypeRegistry, name: &str) -> Vec<String> {
    registry
        .get_struct_fields(name)
        .into_iter()
        .map(|f| f.name.clone())
        .collect()
}

#[test]
fn child_fields_follow_inherited_fields() {
    let reg = registry("struct Base { id string }\nstruct Child extends Base { name string }\n");
    assert_eq!(field_names(&reg, "Child"), vec!["id", "name"]);
    assert_eq!(field_names(&reg, "Base"), vec!["id"]);
}

#[test]
fn multi_level_inheritance_keeps_order() {
    let reg = registry(
        "struct A { a1 int  a2 int }\n\
         struct B extends A { b1 int }\n\
         struct C extends B { c1 int  c2 int }\n",
    );
    assert_eq!(field_names(&reg, "C"), vec!["a1", "a2", "b1", "c1", "c2"]);
}

#[test]
fn redeclared_field_replaces_inherited_in_place() {
    let reg = registry("struct A { x int  y int }\nstruct B extends A { x string  z int }\n");
    let fields = reg.get_struct_fields("B");
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["x", "y", "z"]);
    assert_eq!(fields[0].type_ref, barrister::TypeRef::string());
}

#[test]
fn unknown_struct_has_no_fields() {
    let reg = registry("struct A { x int }");
    assert!(reg.get_struct_fields("Nope").is_empty());
}

#[test]
fn qualified_and_bare_lookups() {
    let reg = registry("namespace inc\nstruct Response { ok bool }\nenum Kind { a b }\n");
    assert!(reg.find_struct("inc.Response").is_some());
    assert!(reg.find_struct("Response").is_some());
    assert!(reg.find_enum("Kind").is_some());
    assert!(reg.find_enum("other.Kind").is_some());
    assert!(reg.find_struct("Kind").is_none());
}

#[test]
fn scope_prefers_local_definition() {
    let reg = registry(
        "namespace a\nstruct Thing { x int }\n\
         namespace b\nstruct Thing { y int }\n",
    );
    match reg.resolve("Thing", Some("b")) {
        Resolution::Found(UserType::Struct(def)) => assert_eq!(def.qualified_name(), "b.Thing"),
        other => panic!("unexpected resolution {:?}", other),
    }
    match reg.resolve("Thing", None) {
        Resolution::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
        other => panic!("unexpected resolution {:?}", other),
    }
}

#[test]
fn namespaced_type_shadows_unnamespaced_one() {
    let reg = registry(
        "struct Thing { x int }\n\
         namespace b\nstruct Thing { y int }\nstruct Holder { t Thing }\n",
    );
    match reg.resolve("Thing", Some("b")) {
        Resolution::Found(UserType::Struct(def)) => assert_eq!(def.qualified_name(), "b.Thing"),
        other => panic!("unexpected resolution {:?}", other),
    }
    assert_eq!(field_names(&reg, "Thing"), vec!["x"]);
    assert_eq!(field_names(&reg, "b.Thing"), vec!["y"]);
}

#[test]
fn unknown_qualifier_does_not_resolve() {
    let reg = registry("namespace inc\nstruct R { ok bool }\n");
    assert!(matches!(reg.resolve("nosuchns.R", None), Resolution::NotFound));
    assert!(matches!(reg.resolve("nosuchns.R", Some("inc")), Resolution::NotFound));
    assert!(reg.resolve_struct("inc.R", None).is_some());
}

#[test]
fn inherited_fields_keep_declaring_scope() {
    let reg = registry(
        "namespace base\nstruct Meta { tag string }\nstruct Parent { meta Meta }\n\
         namespace app\nstruct Child extends base.Parent { name string }\n",
    );
    let fields = reg.resolved_fields("app.Child", None);
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].field.name, "meta");
    assert_eq!(fields[0].scope(), "base");
    assert_eq!(fields[1].scope(), "app");
}

#[test]
fn groups_definitions_by_namespace() {
    let reg = registry(
        "struct Loose { x int }\n\
         namespace shop\nstruct Item { sku string }\nenum Color { red }\ninterface Store { ping() bool }\n",
    );
    let grouped = reg.namespaces();
    let keys: Vec<_> = grouped.keys().cloned().collect();
    assert_eq!(keys, vec!["".to_string(), "shop".to_string()]);
    let shop = &grouped["shop"];
    assert_eq!(shop.structs.len(), 1);
    assert_eq!(shop.enums.len(), 1);
    assert_eq!(shop.interfaces.len(), 1);
    assert_eq!(grouped[""].structs[0].name, "Loose");
}

#[test]
fn interface_lookup_by_bare_name() {
    let reg = registry("namespace shop\ninterface Store { ping() bool }\n");
    assert!(reg.interface("Store").is_some());
    assert!(matches!(reg.resolve("Store", None), Resolution::Interface));
}
