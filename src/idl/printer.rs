//! Renders an AST back into IDL text.

use super::ast::{Enum, Idl, Interface, Struct};
use std::fmt::Write;

const INDENT: &str = "    ";

/// Renders `idl` as IDL source.
///
/// Unnamespaced definitions come first, then one `namespace` block per
/// namespace in first-seen order. Parsing the output yields an equivalent AST.
pub fn to_idl_text(idl: &Idl) -> String {
    let mut out = String::new();
    for import in &idl.imports {
        let _ = writeln!(out, "import \"{}\"", import);
    }
    if !idl.imports.is_empty() {
        out.push('\n');
    }

    let mut order: Vec<&str> = vec![""];
    let declared = idl.namespaces.iter().map(String::as_str);
    let used = idl
        .interfaces
        .iter()
        .map(|i| i.namespace.as_str())
        .chain(idl.structs.iter().map(|s| s.namespace.as_str()))
        .chain(idl.enums.iter().map(|e| e.namespace.as_str()));
    for ns in declared.chain(used) {
        if !order.contains(&ns) {
            order.push(ns);
        }
    }

    let mut blocks: Vec<String> = Vec::new();
    for ns in order {
        let mut block = Vec::new();
        block.extend(idl.interfaces.iter().filter(|i| i.namespace == ns).map(render_interface));
        block.extend(idl.structs.iter().filter(|s| s.namespace == ns).map(render_struct));
        block.extend(idl.enums.iter().filter(|e| e.namespace == ns).map(render_enum));
        if !ns.is_empty() {
            block.insert(0, format!("namespace {}\n", ns));
        }
        blocks.extend(block);
    }

    out.push_str(&blocks.join("\n"));
    out
}

fn render_comment(out: &mut String, comment: &str, indent: &str) {
    if comment.is_empty() {
        return;
    }
    for line in comment.lines() {
        if line.is_empty() {
            let _ = writeln!(out, "{}//", indent);
        } else {
            let _ = writeln!(out, "{}// {}", indent, line);
        }
    }
}

fn render_interface(def: &Interface) -> String {
    let mut out = String::new();
    render_comment(&mut out, &def.comment, "");
    let _ = writeln!(out, "interface {} {{", def.name);
    for method in &def.methods {
        render_comment(&mut out, &method.comment, INDENT);
        let params: Vec<String> = method
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.name, p.type_ref))
            .collect();
        let _ = write!(
            out,
            "{}{}({}) {}",
            INDENT,
            method.name,
            params.join(", "),
            method.return_type
        );
        if method.return_optional {
            out.push_str(" [optional]");
        }
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

fn render_struct(def: &Struct) -> String {
    let mut out = String::new();
    render_comment(&mut out, &def.comment, "");
    match &def.extends {
        Some(parent) => {
            let _ = writeln!(out, "struct {} extends {} {{", def.name, parent);
        }
        None => {
            let _ = writeln!(out, "struct {} {{", def.name);
        }
    }
    for field in &def.fields {
        render_comment(&mut out, &field.comment, INDENT);
        let _ = write!(out, "{}{} {}", INDENT, field.name, field.type_ref);
        if field.optional {
            out.push_str(" [optional]");
        }
        out.push('\n');
    }
    out.push_str("}\n");
    out
}

fn render_enum(def: &Enum) -> String {
    let mut out = String::new();
    render_comment(&mut out, &def.comment, "");
    let _ = writeln!(out, "enum {} {{", def.name);
    for value in &def.values {
        render_comment(&mut out, &value.comment, INDENT);
        let _ = writeln!(out, "{}{}", INDENT, value.name);
    }
    out.push_str("}\n");
    out
}
