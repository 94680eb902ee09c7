//! Scripting language front end for uiml.
//!
//! This crate provides:
//! - Lexer (tokenizer) using `logos`, with a template-literal text mode
//! - Recursive descent parser for expressions, statements and modules
//! - AST types shared through `Arc`, stamped by an injectable id generator
//! - A constant-folding simplifier
//! - Parsers that split attribute values into text and `{expression}` parts
//!
//! # Example
//!
//! ```
//! use uiml_script::{parse_expression, simplify_expression, LiteralValue, NodeIdGenerator};
//!
//! let ids = NodeIdGenerator::new();
//! let expr = parse_expression("1 + 2 * 3", &ids).unwrap();
//! let folded = simplify_expression(&expr, &ids);
//! assert_eq!(folded.as_literal(), Some(&LiteralValue::Number(7.0)));
//! ```

mod ast;
pub mod coerce;
mod error;
mod lexer;
mod literal;
mod parser;
mod simplify;
mod value_parser;

pub use ast::*;
pub use error::{ErrorCode, ParseError};
pub use lexer::{Lexer, Token, TokenKind, MAX_LOOKAHEAD};
pub use literal::{parse_number, unescape, NumericValue, MAX_SAFE_INTEGER};
pub use parser::{expression_to_pattern, parse_expression, parse_module, parse_statements, Parser};
pub use simplify::{simplify_expression, simplify_statement, simplify_statements, truthy, type_name};
pub use source_map::Span;
pub use value_parser::{parse_parameter_string, parse_property_value, PropertyValue, ValueSegment};
