//! Component definition tree produced by the transform.

use indexmap::IndexMap;
use smol_str::SmolStr;
use source_map::Span;
use std::sync::Arc;
use uiml_script::{ArrowFunction, Expr, ParseError, Stmt, ValueSegment};

/// A property, variable or field value.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    /// Plain text.
    Literal(String),
    /// A single `{expression}`; keeps the expression's type at run time.
    Expression(Expr),
    /// Text mixed with expressions; evaluates to a string.
    Template(Vec<ValueSegment>),
    /// A component passed as a value (`<template>`, or component content of
    /// a `<property>`).
    Component(Box<ComponentDef>),
    /// `<item>` children of a `<property>`.
    List(Vec<PropValue>),
    /// `<field>` children of a `<property>`.
    Object(IndexMap<SmolStr, PropValue>),
}

impl PropValue {
    /// Returns the text of a literal value.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            PropValue::Literal(text) => Some(text),
            _ => None,
        }
    }
}

/// Parsed form of an event handler or method.
#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    /// A statement list, run with the event in scope.
    Statements(Vec<Stmt>),
    /// A single arrow function, called with the event arguments.
    Arrow(Expr),
}

/// An event handler or API method.
#[derive(Debug, Clone, PartialEq)]
pub struct EventHandler {
    /// The source text of the handler, entities replaced.
    pub source: String,
    /// The parsed handler; `None` when parsing was not requested or failed.
    pub parsed: Option<Handler>,
    /// The location of the handler text.
    pub span: Span,
}

/// Top-level declarations of a code-behind script.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectedDeclarations {
    /// `var` declarations with their initializers.
    pub vars: IndexMap<SmolStr, Option<Expr>>,
    /// Function declarations.
    pub functions: IndexMap<SmolStr, Arc<ArrowFunction>>,
}

impl CollectedDeclarations {
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.functions.is_empty()
    }
}

/// One component instance in the tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentDef {
    /// The component type; namespaced types are `namespace.Name`.
    pub type_name: SmolStr,
    /// From the `id` attribute.
    pub uid: Option<SmolStr>,
    /// Rendering condition.
    pub when: Option<PropValue>,
    pub test_id: Option<PropValue>,
    pub props: IndexMap<SmolStr, PropValue>,
    pub events: IndexMap<SmolStr, EventHandler>,
    /// Reactive variables scoped to this component.
    pub vars: IndexMap<SmolStr, PropValue>,
    /// Methods exposed to other components.
    pub api: IndexMap<SmolStr, EventHandler>,
    pub children: Vec<ComponentDef>,
    pub uses: Vec<SmolStr>,
    pub loaders: Vec<ComponentDef>,
    /// Raw code-behind text.
    pub script: Option<String>,
    pub script_collected: Option<CollectedDeclarations>,
    pub script_error: Option<ParseError>,
    /// The element this component was built from.
    pub span: Span,
}

impl ComponentDef {
    pub fn new(type_name: impl Into<SmolStr>, span: Span) -> Self {
        Self {
            type_name: type_name.into(),
            span,
            ..Self::default()
        }
    }

    /// Returns the literal text of a prop.
    pub fn literal_prop(&self, name: &str) -> Option<&str> {
        self.props.get(name).and_then(PropValue::as_literal)
    }
}

/// A reusable component definition (`<Component name="...">`).
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundComponentDef {
    /// The capitalized name the component is used by.
    pub name: SmolStr,
    /// The body. Several children, or declared vars, are wrapped in a
    /// `Fragment`.
    pub component: Box<ComponentDef>,
    pub api: IndexMap<SmolStr, EventHandler>,
    pub vars: IndexMap<SmolStr, PropValue>,
    pub script: Option<String>,
    pub script_collected: Option<CollectedDeclarations>,
    pub script_error: Option<ParseError>,
    pub span: Span,
}

/// What a markup document compiles to.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentOrCompound {
    Component(ComponentDef),
    Compound(CompoundComponentDef),
}

impl ComponentOrCompound {
    pub fn as_component(&self) -> Option<&ComponentDef> {
        match self {
            ComponentOrCompound::Component(component) => Some(component),
            ComponentOrCompound::Compound(_) => None,
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundComponentDef> {
        match self {
            ComponentOrCompound::Compound(compound) => Some(compound),
            ComponentOrCompound::Component(_) => None,
        }
    }
}
