//! Parser for the Barrister IDL.
//!
//! Text is tokenized and structured by the pest grammar in `idl.pest`; this
//! module walks the resulting pairs into the [`Idl`] AST. Doc comments are
//! not part of the grammar. They are recovered from the source lines that
//! directly precede each construct.

use super::ast::{
    BuiltinType, Enum, EnumValue, Field, Idl, Interface, Method, Parameter, Position, Struct,
    TypeRef,
};
use super::errors::SyntaxError;
use pest::error::{ErrorVariant, LineColLocation};
use pest::iterators::Pair;
use pest::Parser;

#[derive(pest_derive::Parser)]
#[grammar = "idl/idl.pest"]
struct IdlGrammar;

/// Parser for IDL source text.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlParser;

impl IdlParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses IDL text into an AST.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] carrying the line and column of the first
    /// malformed construct.
    pub fn parse(&self, input: &str) -> Result<Idl, SyntaxError> {
        let mut pairs = IdlGrammar::parse(Rule::idl_file, input)
            .map_err(|e| syntax_error(input, e))?;
        let file = pairs
            .next()
            .ok_or_else(|| SyntaxError::new(Position::new(1, 1), "empty parse result"))?;

        let mut builder = AstBuilder {
            docs: DocComments::new(input),
            namespace: String::new(),
            idl: Idl::default(),
        };
        for pair in file.into_inner() {
            builder.definition(pair)?;
        }
        log::debug!(
            "Parsed IDL: {} interfaces, {} structs, {} enums",
            builder.idl.interfaces.len(),
            builder.idl.structs.len(),
            builder.idl.enums.len()
        );
        Ok(builder.idl)
    }
}

/// Parses IDL text with a default [`IdlParser`].
pub fn parse(input: &str) -> Result<Idl, SyntaxError> {
    IdlParser::new().parse(input)
}

struct AstBuilder<'a> {
    docs: DocComments<'a>,
    /// Namespace in effect for definitions that follow.
    namespace: String,
    idl: Idl,
}

impl<'a> AstBuilder<'a> {
    fn definition(&mut self, pair: Pair<'_, Rule>) -> Result<(), SyntaxError> {
        match pair.as_rule() {
            Rule::namespace_decl => {
                let pos = position(&pair);
                let name = required(significant(pair), Rule::ident, pos, "namespace name")?;
                let name = name.as_str().to_string();
                if !self.idl.namespaces.contains(&name) {
                    self.idl.namespaces.push(name.clone());
                }
                self.namespace = name;
            }
            Rule::import_decl => {
                let pos = position(&pair);
                let literal = required(significant(pair), Rule::string_literal, pos, "import path")?;
                let path = literal
                    .into_inner()
                    .next()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                if path.is_empty() {
                    return Err(SyntaxError::new(pos, "import path must not be empty"));
                }
                self.idl.imports.push(path);
            }
            Rule::interface_def => {
                let interface = self.interface(pair)?;
                self.idl.interfaces.push(interface);
            }
            Rule::struct_def => {
                let def = self.struct_def(pair)?;
                self.idl.structs.push(def);
            }
            Rule::enum_def => {
                let def = self.enum_def(pair)?;
                self.idl.enums.push(def);
            }
            Rule::EOI => {}
            other => {
                return Err(SyntaxError::new(
                    position(&pair),
                    format!("unexpected {}", describe_rule(other)),
                ))
            }
        }
        Ok(())
    }

    fn interface(&self, pair: Pair<'_, Rule>) -> Result<Interface, SyntaxError> {
        let pos = position(&pair);
        let comment = self.docs.above(pos);
        let mut inner = significant(pair).into_iter();
        let name = next_ident(&mut inner, pos, "interface name")?;
        let methods = inner
            .filter(|p| p.as_rule() == Rule::method_def)
            .map(|p| self.method(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Interface {
            name,
            namespace: self.namespace.clone(),
            comment,
            methods,
            pos,
        })
    }

    fn method(&self, pair: Pair<'_, Rule>) -> Result<Method, SyntaxError> {
        let pos = position(&pair);
        let comment = self.docs.above(pos);
        let mut inner = significant(pair).into_iter();
        let name = next_ident(&mut inner, pos, "method name")?;

        let mut parameters = Vec::new();
        let mut return_type = None;
        let mut return_optional = false;
        for part in inner {
            match part.as_rule() {
                Rule::param => parameters.push(self.parameter(part)?),
                Rule::type_ref => return_type = Some(type_ref(part)?),
                Rule::optional_flag => return_optional = true,
                _ => {}
            }
        }
        let return_type = return_type.ok_or_else(|| {
            SyntaxError::new(pos, format!("method '{}' is missing a return type", name))
        })?;

        Ok(Method {
            name,
            parameters,
            return_type,
            return_optional,
            comment,
            pos,
        })
    }

    fn parameter(&self, pair: Pair<'_, Rule>) -> Result<Parameter, SyntaxError> {
        let pos = position(&pair);
        let mut inner = significant(pair).into_iter();
        let name = next_ident(&mut inner, pos, "parameter name")?;
        let type_pair = inner
            .find(|p| p.as_rule() == Rule::type_ref)
            .ok_or_else(|| SyntaxError::new(pos, format!("parameter '{}' is missing a type", name)))?;
        Ok(Parameter {
            name,
            type_ref: type_ref(type_pair)?,
            pos,
        })
    }

    fn struct_def(&self, pair: Pair<'_, Rule>) -> Result<Struct, SyntaxError> {
        let pos = position(&pair);
        let comment = self.docs.above(pos);
        let mut inner = significant(pair).into_iter();
        let name = next_ident(&mut inner, pos, "struct name")?;

        let mut extends = None;
        let mut fields = Vec::new();
        for part in inner {
            match part.as_rule() {
                Rule::extends_clause => {
                    let parent = significant(part)
                        .into_iter()
                        .find(|p| p.as_rule() == Rule::qualified_name)
                        .map(|p| p.as_str().to_string());
                    extends = parent;
                }
                Rule::field_def => fields.push(self.field(part)?),
                _ => {}
            }
        }

        Ok(Struct {
            name,
            namespace: self.namespace.clone(),
            extends,
            fields,
            comment,
            pos,
        })
    }

    fn field(&self, pair: Pair<'_, Rule>) -> Result<Field, SyntaxError> {
        let pos = position(&pair);
        let comment = self.docs.above(pos);
        let mut inner = significant(pair).into_iter();
        let name = next_ident(&mut inner, pos, "field name")?;

        let mut field_type = None;
        let mut optional = false;
        for part in inner {
            match part.as_rule() {
                Rule::type_ref => field_type = Some(type_ref(part)?),
                Rule::optional_flag => optional = true,
                _ => {}
            }
        }
        let type_ref = field_type
            .ok_or_else(|| SyntaxError::new(pos, format!("field '{}' is missing a type", name)))?;

        Ok(Field {
            name,
            type_ref,
            optional,
            comment,
            pos,
        })
    }

    fn enum_def(&self, pair: Pair<'_, Rule>) -> Result<Enum, SyntaxError> {
        let pos = position(&pair);
        let comment = self.docs.above(pos);
        let mut inner = significant(pair).into_iter();
        let name = next_ident(&mut inner, pos, "enum name")?;
        let values = inner
            .filter(|p| p.as_rule() == Rule::enum_value)
            .map(|p| {
                let value_pos = position(&p);
                EnumValue {
                    name: p.as_str().trim().to_string(),
                    comment: self.docs.above(value_pos),
                    pos: value_pos,
                }
            })
            .collect();

        Ok(Enum {
            name,
            namespace: self.namespace.clone(),
            values,
            comment,
            pos,
        })
    }
}

fn type_ref(pair: Pair<'_, Rule>) -> Result<TypeRef, SyntaxError> {
    let pos = position(&pair);
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SyntaxError::new(pos, "expected type"))?;

    match inner.as_rule() {
        Rule::builtin_type => BuiltinType::from_name(inner.as_str())
            .map(TypeRef::Builtin)
            .ok_or_else(|| SyntaxError::new(pos, format!("unknown builtin '{}'", inner.as_str()))),
        Rule::array_type | Rule::map_type => {
            let is_map = inner.as_rule() == Rule::map_type;
            let element = inner
                .into_inner()
                .find(|p| p.as_rule() == Rule::type_ref)
                .ok_or_else(|| SyntaxError::new(pos, "expected element type"))?;
            let element = type_ref(element)?;
            Ok(if is_map {
                TypeRef::map(element)
            } else {
                TypeRef::array(element)
            })
        }
        Rule::user_type => Ok(TypeRef::UserDefined(inner.as_str().trim().to_string())),
        other => Err(SyntaxError::new(
            pos,
            format!("unexpected {} in type position", describe_rule(other)),
        )),
    }
}

/// Inner pairs with keyword tokens removed.
fn significant(pair: Pair<'_, Rule>) -> Vec<Pair<'_, Rule>> {
    pair.into_inner().filter(|p| !is_keyword(p.as_rule())).collect()
}

fn is_keyword(rule: Rule) -> bool {
    matches!(
        rule,
        Rule::kw_namespace
            | Rule::kw_import
            | Rule::kw_interface
            | Rule::kw_struct
            | Rule::kw_enum
            | Rule::kw_extends
            | Rule::kw_map
            | Rule::kw_string
    )
}

fn required<'i>(
    pairs: Vec<Pair<'i, Rule>>,
    rule: Rule,
    pos: Position,
    what: &str,
) -> Result<Pair<'i, Rule>, SyntaxError> {
    pairs
        .into_iter()
        .find(|p| p.as_rule() == rule)
        .ok_or_else(|| SyntaxError::new(pos, format!("expected {}", what)))
}

fn next_ident<'i>(
    pairs: &mut impl Iterator<Item = Pair<'i, Rule>>,
    pos: Position,
    what: &str,
) -> Result<String, SyntaxError> {
    match pairs.next() {
        Some(p) if p.as_rule() == Rule::ident => Ok(p.as_str().to_string()),
        _ => Err(SyntaxError::new(pos, format!("expected {}", what))),
    }
}

fn position(pair: &Pair<'_, Rule>) -> Position {
    let (line, column) = pair.as_span().start_pos().line_col();
    Position::new(line, column)
}

fn syntax_error(input: &str, err: pest::error::Error<Rule>) -> SyntaxError {
    let (line, column) = match err.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    let message = match &err.variant {
        ErrorVariant::ParsingError { positives, .. } => {
            let mut expected: Vec<&str> = positives.iter().map(|r| describe_rule(*r)).collect();
            expected.dedup();
            let found = token_at(input, line, column);
            match (expected.is_empty(), found) {
                (true, Some(found)) => format!("unexpected '{}'", found),
                (true, None) => "unexpected end of input".to_string(),
                (false, Some(found)) => format!("expected {}, found '{}'", expected.join(" or "), found),
                (false, None) => format!("expected {}, found end of input", expected.join(" or ")),
            }
        }
        ErrorVariant::CustomError { message } => message.clone(),
    };
    SyntaxError {
        line,
        column,
        message,
    }
}

/// The word (or single symbol) starting at a 1-based line/column.
fn token_at(input: &str, line: usize, column: usize) -> Option<String> {
    let text = input.lines().nth(line.checked_sub(1)?)?;
    let rest: String = text.chars().skip(column.saturating_sub(1)).collect();
    let rest = rest.trim_start();
    let first = rest.chars().next()?;
    if first.is_ascii_alphanumeric() || first == '_' {
        Some(
            rest.chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
                .collect(),
        )
    } else {
        Some(first.to_string())
    }
}

fn describe_rule(rule: Rule) -> &'static str {
    match rule {
        Rule::EOI => "end of input",
        Rule::ident => "identifier",
        Rule::qualified_name | Rule::user_type => "type name",
        Rule::namespace_decl | Rule::kw_namespace => "'namespace'",
        Rule::import_decl | Rule::kw_import => "'import'",
        Rule::interface_def | Rule::kw_interface => "'interface'",
        Rule::struct_def | Rule::kw_struct => "'struct'",
        Rule::enum_def | Rule::kw_enum => "'enum'",
        Rule::extends_clause | Rule::kw_extends => "'extends'",
        Rule::kw_map | Rule::map_type => "map type",
        Rule::kw_string => "'string'",
        Rule::string_literal | Rule::string_inner => "quoted path",
        Rule::method_def => "method",
        Rule::param => "parameter",
        Rule::field_def => "field",
        Rule::enum_value => "enum value",
        Rule::optional_flag => "'[optional]'",
        Rule::type_ref | Rule::builtin_type => "type",
        Rule::array_type => "array type",
        _ => "token",
    }
}

/// Line-level view of the source used to recover `//` doc comments.
struct DocComments<'a> {
    lines: Vec<&'a str>,
}

impl<'a> DocComments<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().collect(),
        }
    }

    /// The contiguous block of `//` lines directly above `pos`.
    ///
    /// Only constructs that start their line may carry a comment; a blank
    /// line ends the block.
    fn above(&self, pos: Position) -> String {
        let Some(line) = pos.line.checked_sub(1).and_then(|i| self.lines.get(i)) else {
            return String::new();
        };
        let lead: String = line.chars().take(pos.column.saturating_sub(1)).collect();
        if !lead.trim().is_empty() {
            return String::new();
        }

        let mut block = Vec::new();
        let mut idx = pos.line - 1;
        while idx > 0 {
            idx -= 1;
            match self.lines[idx].trim().strip_prefix("//") {
                Some(text) => block.push(text.trim()),
                None => break,
            }
        }
        block.reverse();
        block.join("\n")
    }
}
