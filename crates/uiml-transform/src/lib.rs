//! Markup to component-definition transform for uiml.
//!
//! This crate turns a markup document into the component tree the runtime
//! renders. It handles:
//! - Namespace resolution of element type names
//! - Helper elements (`property`, `event`, `variable`, ...)
//! - Parsing every embedded script, with errors mapped back into the document
//! - Harvesting code-behind declarations
//!
//! # Example
//!
//! ```
//! use uiml_transform::{compile, CompileOptions};
//!
//! let output = compile(
//!     r#"<App><Button label="Count: {count}" onClick="count++" /></App>"#,
//!     &CompileOptions::default(),
//! );
//! assert!(output.diagnostics.is_empty());
//!
//! let app = output.component.unwrap();
//! let app = app.as_component().unwrap();
//! assert_eq!(app.children[0].type_name, "Button");
//! ```

mod component;
mod diagnostic;
mod embedded;
mod error;
mod namespace;
mod script;
mod transform;

pub use component::{
    CollectedDeclarations, ComponentDef, ComponentOrCompound, CompoundComponentDef, EventHandler, Handler, PropValue,
};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use embedded::EmbeddedText;
pub use error::{TransformCode, TransformError};
pub use namespace::{rewrite_scheme, NamespaceStack, APP_NAMESPACE, CORE_NAMESPACE};
pub use script::{code_behind, collect_declarations, handler, property_value};
pub use source_map::Span;

use transform::Transformer;
use uiml_script::NodeIdGenerator;

/// Options for [`compile`].
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// The file being compiled, used in log output.
    pub file_name: Option<String>,
    /// Parse event handlers and methods ahead of time.
    pub parse_events: bool,
    /// Fold constant subexpressions of parsed scripts.
    pub simplify: bool,
    /// Source of node ids for every parsed script.
    pub ids: NodeIdGenerator,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            parse_events: true,
            simplify: false,
            ids: NodeIdGenerator::new(),
        }
    }
}

/// Result of [`compile`].
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// The component tree; `None` when an error stopped compilation.
    pub component: Option<ComponentOrCompound>,
    /// Every diagnostic, markup ones first.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompileOutput {
    /// Returns true if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity == Severity::Error)
    }
}

/// Compiles a markup document: scan, parse, then transform.
///
/// Markup errors stop compilation before the transform. Script errors are
/// collected and the transform continues; any other transform error stops it.
pub fn compile(source: &str, options: &CompileOptions) -> CompileOutput {
    let file = options.file_name.as_deref().unwrap_or("<input>");
    log::debug!("compiling {file} ({} bytes)", source.len());

    let parse = uiml_markup::parse(source);
    let mut diagnostics: Vec<Diagnostic> = parse.errors().iter().cloned().map(Diagnostic::from).collect();
    if diagnostics.iter().any(|d| d.severity == Severity::Error) {
        log::debug!("{file}: {} markup diagnostics, skipping transform", diagnostics.len());
        return CompileOutput {
            component: None,
            diagnostics,
        };
    }

    let (component, transform_diagnostics) = Transformer::new(source, options).run(&parse.document());
    diagnostics.extend(transform_diagnostics);
    log::debug!("{file}: compiled with {} diagnostics", diagnostics.len());
    CompileOutput { component, diagnostics }
}
