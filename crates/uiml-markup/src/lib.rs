//! Markup front end for uiml.
//!
//! This crate provides:
//! - A context-sensitive scanner that keeps trivia as tokens
//! - A recovering parser building a lossless `rowan` tree
//! - Typed accessors over that tree
//!
//! # Example
//!
//! ```
//! use uiml_markup::parse;
//!
//! let parse = parse("<Stack gap='4'><Text>Hello</Text></Stack>");
//! assert!(parse.errors().is_empty());
//!
//! let root = parse.document().root().unwrap();
//! assert_eq!(root.name().as_deref(), Some("Stack"));
//! assert_eq!(parse.syntax().text().to_string(), "<Stack gap='4'><Text>Hello</Text></Stack>");
//! ```

mod ast;
mod error;
mod parser;
mod scanner;
mod syntax_kind;

pub use ast::*;
pub use error::{ErrorCode, MarkupError};
pub use parser::{parse, Parse};
pub use scanner::{unescape_entities, ScanMode, Scanner, Token, ENTITIES};
pub use source_map::Span;
pub use syntax_kind::{MarkupLanguage, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken};
