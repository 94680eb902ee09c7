//! Parsing of embedded scripts: property values, handlers and code-behind.

use crate::component::{CollectedDeclarations, Handler, PropValue};
use uiml_script::{
    parse_module, parse_property_value, parse_statements, simplify_expression, simplify_statements, ExprKind,
    NodeIdGenerator, ParseError, Pattern, PropertyValue, Stmt, StmtKind, ValueSegment,
};

/// Parses an attribute or helper value into a [`PropValue`].
pub fn property_value(source: &str, ids: &NodeIdGenerator, simplify: bool) -> Result<PropValue, ParseError> {
    let value = match parse_property_value(source, ids)? {
        PropertyValue::Literal(text) => PropValue::Literal(text),
        PropertyValue::Expression(expr) if simplify => PropValue::Expression(simplify_expression(&expr, ids)),
        PropertyValue::Expression(expr) => PropValue::Expression(expr),
        PropertyValue::Template(segments) if simplify => PropValue::Template(
            segments
                .into_iter()
                .map(|segment| match segment {
                    ValueSegment::Expression(expr) => ValueSegment::Expression(simplify_expression(&expr, ids)),
                    literal => literal,
                })
                .collect(),
        ),
        PropertyValue::Template(segments) => PropValue::Template(segments),
    };
    Ok(value)
}

/// Parses an event handler or method body.
///
/// A lone arrow function becomes [`Handler::Arrow`]; anything else is kept
/// as a statement list.
pub fn handler(source: &str, ids: &NodeIdGenerator, simplify: bool) -> Result<Handler, ParseError> {
    let mut statements = parse_statements(source, ids)?;
    if let [statement] = statements.as_slice() {
        if let StmtKind::Expression(expr) = &statement.kind {
            if matches!(expr.kind, ExprKind::Arrow(_)) {
                let expr = if simplify {
                    simplify_expression(expr, ids)
                } else {
                    expr.clone()
                };
                return Ok(Handler::Arrow(expr));
            }
        }
    }
    if simplify {
        if let Some(simplified) = simplify_statements(&statements, ids) {
            statements = simplified;
        }
    }
    Ok(Handler::Statements(statements))
}

/// Parses a code-behind script and collects its top-level declarations.
pub fn code_behind(source: &str, ids: &NodeIdGenerator) -> Result<CollectedDeclarations, ParseError> {
    let statements = parse_module(source, ids)?;
    Ok(collect_declarations(&statements))
}

/// Collects top-level `var` and function declarations.
///
/// Other statements are left to the runtime, which executes the whole script.
pub fn collect_declarations(statements: &[Stmt]) -> CollectedDeclarations {
    let mut collected = CollectedDeclarations::default();
    for statement in statements {
        match &statement.kind {
            StmtKind::Var(declarators) => {
                for declarator in declarators {
                    match &declarator.target {
                        Pattern::Identifier { name, .. } => {
                            collected.vars.insert(name.clone(), declarator.init.clone());
                        }
                        pattern => {
                            for name in pattern.bound_names() {
                                collected.vars.insert(name, None);
                            }
                        }
                    }
                }
            }
            StmtKind::Function(function) => {
                if let Some(name) = &function.name {
                    collected.functions.insert(name.clone(), function.clone());
                }
            }
            other => log::trace!("code-behind statement {:?} is not collected", other.node_type()),
        }
    }
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use uiml_script::LiteralValue;

    #[test]
    fn test_collect_declarations() {
        let ids = NodeIdGenerator::new();
        let collected = code_behind(
            "import { format } from './format';
             var count = 0, label;
             var { a, b } = pair();
             let local = 1;
             function increment(by) { count += by; }
             async function load() {}",
            &ids,
        )
        .unwrap();
        let vars: Vec<&str> = collected.vars.keys().map(|k| k.as_str()).collect();
        assert_eq!(vars, vec!["count", "label", "a", "b"]);
        assert!(collected.vars["label"].is_none());
        let functions: Vec<&str> = collected.functions.keys().map(|k| k.as_str()).collect();
        assert_eq!(functions, vec!["increment", "load"]);
        assert!(collected.functions["load"].is_async);
    }

    #[test]
    fn test_handler_forms() {
        let ids = NodeIdGenerator::new();
        assert!(matches!(handler("(e) => submit(e)", &ids, false), Ok(Handler::Arrow(_))));
        let Ok(Handler::Statements(statements)) = handler("count++; save()", &ids, false) else {
            panic!("expected statements");
        };
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_simplified_property_value() {
        let ids = NodeIdGenerator::new();
        let PropValue::Expression(expr) = property_value("{2 ** 3}", &ids, true).unwrap() else {
            panic!("expected expression");
        };
        assert_eq!(expr.as_literal(), Some(&LiteralValue::Number(8.0)));
    }
}
