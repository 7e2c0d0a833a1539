use barrister::idl::parse;
use barrister::{validate_value, IntPolicy, TypeRef, TypeRegistry, ValueValidator};
use serde_json::json;

fn registry(text: &str) -> TypeRegistry {
    TypeRegistry::new(&parse(text).unwrap())
}

const SHOP: &str = r#"
namespace shop

enum Color { red green blue }

struct Base { id string }

struct Item extends Base {
    sku string
    color Color [optional]
}

struct Order {
    customer string
    items []Item
    prices map[string]float [optional]
}
"#;

#[test]
fn user_with_optional_email() {
    let reg = registry("struct User { id string  email string [optional] }");
    let user = TypeRef::user("User");

    assert!(validate_value(&json!({"id": "u1"}), &user, &reg, false).is_ok());
    assert!(validate_value(&json!({"id": "u1", "email": "a@b.c"}), &user, &reg, false).is_ok());

    let err = validate_value(&json!({}), &user, &reg, false).unwrap_err();
    assert_eq!(err.reason, "missing required field 'id'");
    assert_eq!(err.path, "");
}

#[test]
fn enum_values_are_case_sensitive() {
    let reg = registry("enum Color { red green blue }");
    let color = TypeRef::user("Color");

    assert!(validate_value(&json!("red"), &color, &reg, false).is_ok());

    let err = validate_value(&json!("RED"), &color, &reg, false).unwrap_err();
    assert_eq!(
        err.reason,
        "invalid value 'RED' for enum Color (expected one of: red, green, blue)"
    );

    let err = validate_value(&json!(4), &color, &reg, false).unwrap_err();
    assert_eq!(err.reason, "expected string for enum Color, got number");
}

#[test]
fn builtins() {
    let reg = registry("");
    let check = |value: serde_json::Value, t: TypeRef| validate_value(&value, &t, &reg, false);

    assert!(check(json!("x"), TypeRef::string()).is_ok());
    assert!(check(json!(1), TypeRef::string()).is_err());
    assert!(check(json!(true), TypeRef::bool()).is_ok());
    assert!(check(json!("true"), TypeRef::bool()).is_err());
    assert!(check(json!(1.5), TypeRef::float()).is_ok());
    assert!(check(json!(2), TypeRef::float()).is_ok());
    assert!(check(json!(-7), TypeRef::int()).is_ok());
    assert!(check(json!(7.25), TypeRef::int()).is_err());

    let err = check(json!([1]), TypeRef::string()).unwrap_err();
    assert_eq!(err.to_string(), "expected string, got array");
}

#[test]
fn null_needs_optional() {
    let reg = registry("");
    assert!(validate_value(&json!(null), &TypeRef::int(), &reg, true).is_ok());
    let err = validate_value(&json!(null), &TypeRef::int(), &reg, false).unwrap_err();
    assert_eq!(err.reason, "null is not allowed for required int");
}

#[test]
fn null_array_element_is_rejected() {
    let reg = registry("");
    let err = validate_value(&json!([1, null]), &TypeRef::array(TypeRef::int()), &reg, false).unwrap_err();
    assert_eq!(err.path, "[1]");
}

#[test]
fn inherited_fields_are_required() {
    let reg = registry(SHOP);
    let item = TypeRef::user("shop.Item");

    assert!(validate_value(&json!({"id": "i1", "sku": "S-1"}), &item, &reg, false).is_ok());
    let err = validate_value(&json!({"sku": "S-1"}), &item, &reg, false).unwrap_err();
    assert_eq!(err.reason, "missing required field 'id'");
}

#[test]
fn unknown_fields_are_ignored() {
    let reg = registry(SHOP);
    let value = json!({"id": "i1", "sku": "S-1", "weight": 3});
    assert!(validate_value(&value, &TypeRef::user("Item"), &reg, false).is_ok());
}

#[test]
fn nested_error_reports_full_path() {
    let reg = registry(SHOP);
    let order = json!({
        "customer": "c1",
        "items": [
            {"id": "1", "sku": "a"},
            {"id": "2", "sku": "b"},
            {"id": "3", "sku": 42}
        ]
    });
    let validator = ValueValidator::new(&reg);
    let err = validator
        .validate_named("order", &order, &TypeRef::user("Order"), Some("shop"), false)
        .unwrap_err();
    assert_eq!(err.path, "order.items[2].sku");
    assert_eq!(err.reason, "expected string, got number");
    assert_eq!(err.to_string(), "order.items[2].sku: expected string, got number");
}

#[test]
fn nested_enum_error_path() {
    let reg = registry(SHOP);
    let order = json!({
        "customer": "c1",
        "items": [{"id": "1", "sku": "a", "color": "purple"}]
    });
    let err = validate_value(&order, &TypeRef::user("Order"), &reg, false).unwrap_err();
    assert_eq!(err.path, "items[0].color");
}

#[test]
fn map_values_are_checked() {
    let reg = registry(SHOP);
    let order = json!({
        "customer": "c1",
        "items": [],
        "prices": {"usd": 1.5, "eur": "cheap"}
    });
    let err = validate_value(&order, &TypeRef::user("Order"), &reg, false).unwrap_err();
    assert_eq!(err.path, "prices[\"eur\"]");
    assert_eq!(err.reason, "expected float, got string");
}

#[test]
fn map_requires_object() {
    let reg = registry("");
    let err = validate_value(&json!([1, 2]), &TypeRef::map(TypeRef::int()), &reg, false).unwrap_err();
    assert_eq!(err.reason, "expected object for map, got array");
}

#[test]
fn struct_requires_object() {
    let reg = registry(SHOP);
    let err = validate_value(&json!("x"), &TypeRef::user("Base"), &reg, false).unwrap_err();
    assert_eq!(err.reason, "expected object for struct Base, got string");
}

#[test]
fn unknown_type_is_an_error() {
    let reg = registry("");
    let err = validate_value(&json!({}), &TypeRef::user("Ghost"), &reg, false).unwrap_err();
    assert_eq!(err.reason, "unknown type 'Ghost'");
}

#[test]
fn field_type_resolves_in_declaring_namespace() {
    let reg = registry(
        "struct Thing { x int }\n\
         namespace b\nstruct Thing { y int }\nstruct Holder { t Thing }\n",
    );
    let holder = TypeRef::user("b.Holder");
    assert!(validate_value(&json!({"t": {"y": 1}}), &holder, &reg, false).is_ok());
    let err = validate_value(&json!({"t": {"x": 1}}), &holder, &reg, false).unwrap_err();
    assert_eq!(err.path, "t");
    assert_eq!(err.reason, "missing required field 'y'");
}

#[test]
fn unknown_namespace_qualifier_is_unknown_type() {
    let reg = registry("namespace inc\nstruct R { ok bool }\n");
    let err = validate_value(&json!({"ok": true}), &TypeRef::user("zzz.R"), &reg, false).unwrap_err();
    assert_eq!(err.reason, "unknown type 'zzz.R'");
}

#[test]
fn whole_number_float_as_int_depends_on_policy() {
    let reg = registry("");
    let lenient = ValueValidator::new(&reg);
    let strict = ValueValidator::new(&reg).with_int_policy(IntPolicy::Strict);

    assert!(lenient.validate(&json!(3.0), &TypeRef::int(), false).is_ok());
    assert!(strict.validate(&json!(3.0), &TypeRef::int(), false).is_err());
    assert!(strict.validate(&json!(3), &TypeRef::int(), false).is_ok());
}

#[test]
fn deep_nesting_of_containers() {
    let reg = registry("");
    let t = TypeRef::array(TypeRef::map(TypeRef::array(TypeRef::int())));
    assert!(validate_value(&json!([{"a": [1, 2]}, {"b": []}]), &t, &reg, false).is_ok());
    let err = validate_value(&json!([{"a": [1, 2]}, {"b": [3, "x"]}]), &t, &reg, false).unwrap_err();
    assert_eq!(err.path, "[1][\"b\"][1]");
}
