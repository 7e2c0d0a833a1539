//! # IDL
//!
//! The Barrister interface definition language: text in, AST out.
//!
//! ## Components
//!
//! * `ast` - AST node types and their JSON form
//! * `parser` - pest-based parser producing the AST
//! * `validator` - semantic checks over a parsed AST
//! * `loader` - file loading with `import` resolution
//! * `printer` - AST back to IDL text

pub mod ast;
pub mod errors;
pub mod loader;
pub mod parser;
pub mod printer;
pub mod validator;

pub use ast::{
    BuiltinType, Enum, EnumValue, Field, Idl, Interface, Method, Parameter, Position, Struct,
    TypeRef,
};
pub use errors::{SyntaxError, ValidationError, ValidationErrors};
pub use loader::{IdlLoader, ImportError};
pub use parser::{parse, IdlParser};
pub use printer::to_idl_text;
pub use validator::{is_valid_identifier, validate, IdlValidator, ValidatorOptions};
