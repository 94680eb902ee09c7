//! Constant folding and algebraic identities over the AST.
//!
//! Simplification is bottom-up and runs each node to a fixed point. A node
//! is rebuilt only when one of its children changed or a rule fired;
//! otherwise the very same `Arc` is returned, so callers can detect "no
//! change" with [`Arc::ptr_eq`].

use crate::ast::*;
use crate::coerce::{compare_strings, number_to_string, power, string_to_number, to_int32, to_uint32};
use std::cmp::Ordering;
use num_bigint::BigInt;
use num_traits::Zero;
use std::sync::Arc;

/// Simplifies an expression to a fixed point.
pub fn simplify_expression(expr: &Expr, ids: &NodeIdGenerator) -> Expr {
    let mut current = expr.clone();
    loop {
        let next = simplify_expr(&current, ids);
        if Arc::ptr_eq(&next, &current) {
            return current;
        }
        current = next;
    }
}

/// Simplifies every expression inside a statement.
pub fn simplify_statement(stmt: &Stmt, ids: &NodeIdGenerator) -> Stmt {
    let mut current = stmt.clone();
    loop {
        let next = simplify_stmt(&current, ids);
        if Arc::ptr_eq(&next, &current) {
            return current;
        }
        current = next;
    }
}

/// Simplifies a statement list; returns `None` when nothing changed.
pub fn simplify_statements(stmts: &[Stmt], ids: &NodeIdGenerator) -> Option<Vec<Stmt>> {
    let mut changed = false;
    let out = stmt_list(stmts, &mut changed, ids);
    changed.then_some(out)
}

// =============================================================================
// Expressions
// =============================================================================

fn simplify_expr(expr: &Expr, ids: &NodeIdGenerator) -> Expr {
    let rebuilt = match simplify_children(expr, ids) {
        Some(kind) => rebuild(expr, kind, ids),
        None => expr.clone(),
    };

    let mut current = rebuilt;
    while let Some(next) = apply_rules(&current, ids) {
        current = next;
    }
    current
}

fn rebuild(expr: &Expr, kind: ExprKind, ids: &NodeIdGenerator) -> Expr {
    Arc::new(Expression {
        id: ids.next_id(),
        span: expr.span,
        kind,
    })
}

fn literal(expr: &Expr, value: LiteralValue, ids: &NodeIdGenerator) -> Expr {
    rebuild(expr, ExprKind::Literal(value), ids)
}

fn child(expr: &Expr, changed: &mut bool, ids: &NodeIdGenerator) -> Expr {
    let next = simplify_expr(expr, ids);
    if !Arc::ptr_eq(&next, expr) {
        *changed = true;
    }
    next
}

fn children(exprs: &[Expr], changed: &mut bool, ids: &NodeIdGenerator) -> Vec<Expr> {
    exprs.iter().map(|e| child(e, changed, ids)).collect()
}

/// Simplifies the children of `expr`; returns the new kind if any changed.
fn simplify_children(expr: &Expr, ids: &NodeIdGenerator) -> Option<ExprKind> {
    let mut changed = false;
    let c = &mut changed;
    let kind = match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Identifier { .. } | ExprKind::NoArg => return None,
        ExprKind::TemplateLiteral { parts } => ExprKind::TemplateLiteral {
            parts: children(parts, c, ids),
        },
        ExprKind::ArrayLiteral { items } => ExprKind::ArrayLiteral {
            items: children(items, c, ids),
        },
        ExprKind::ObjectLiteral { properties } => ExprKind::ObjectLiteral {
            properties: properties
                .iter()
                .map(|property| match property {
                    ObjectProperty::KeyValue { key, value } => ObjectProperty::KeyValue {
                        key: match key {
                            PropertyKey::Named(name) => PropertyKey::Named(name.clone()),
                            PropertyKey::Computed(key) => PropertyKey::Computed(child(key, c, ids)),
                        },
                        value: child(value, c, ids),
                    },
                    ObjectProperty::Shorthand { .. } => property.clone(),
                    ObjectProperty::Spread(operand) => ObjectProperty::Spread(child(operand, c, ids)),
                })
                .collect(),
        },
        ExprKind::Unary { op, operand } => ExprKind::Unary {
            op: *op,
            operand: child(operand, c, ids),
        },
        ExprKind::Prefix { op, operand } => ExprKind::Prefix {
            op: *op,
            operand: child(operand, c, ids),
        },
        ExprKind::Postfix { op, operand } => ExprKind::Postfix {
            op: *op,
            operand: child(operand, c, ids),
        },
        ExprKind::Binary { op, left, right } => ExprKind::Binary {
            op: *op,
            left: child(left, c, ids),
            right: child(right, c, ids),
        },
        ExprKind::Sequence { expressions, loose } => ExprKind::Sequence {
            expressions: children(expressions, c, ids),
            loose: *loose,
        },
        ExprKind::Conditional {
            condition,
            consequent,
            alternate,
        } => ExprKind::Conditional {
            condition: child(condition, c, ids),
            consequent: child(consequent, c, ids),
            alternate: child(alternate, c, ids),
        },
        ExprKind::Call {
            callee,
            arguments,
            optional,
        } => ExprKind::Call {
            callee: child(callee, c, ids),
            arguments: children(arguments, c, ids),
            optional: *optional,
        },
        ExprKind::Member {
            object,
            member,
            optional,
        } => ExprKind::Member {
            object: child(object, c, ids),
            member: member.clone(),
            optional: *optional,
        },
        ExprKind::ComputedMember {
            object,
            member,
            optional,
        } => ExprKind::ComputedMember {
            object: child(object, c, ids),
            member: child(member, c, ids),
            optional: *optional,
        },
        ExprKind::Spread { operand } => ExprKind::Spread {
            operand: child(operand, c, ids),
        },
        ExprKind::Assignment { op, target, value } => ExprKind::Assignment {
            op: *op,
            target: target.clone(),
            value: child(value, c, ids),
        },
        ExprKind::Arrow(function) => {
            let body = match &function.body {
                ArrowBody::Expression(body) => ArrowBody::Expression(child(body, c, ids)),
                ArrowBody::Block(stmts) => ArrowBody::Block(stmt_list(stmts, c, ids)),
            };
            ExprKind::Arrow(Arc::new(ArrowFunction {
                name: function.name.clone(),
                params: function.params.clone(),
                body,
                is_async: function.is_async,
            }))
        }
        ExprKind::New { callee, arguments } => ExprKind::New {
            callee: child(callee, c, ids),
            arguments: children(arguments, c, ids),
        },
        ExprKind::Await { operand } => ExprKind::Await {
            operand: child(operand, c, ids),
        },
    };
    changed.then_some(kind)
}

/// Applies one folding rule or identity at the root of `expr`.
fn apply_rules(expr: &Expr, ids: &NodeIdGenerator) -> Option<Expr> {
    match &expr.kind {
        ExprKind::Unary { op, operand } => {
            let value = fold_unary(*op, operand.as_literal()?)?;
            Some(literal(expr, value, ids))
        }
        ExprKind::Binary { op, left, right } => {
            if let (Some(l), Some(r)) = (left.as_literal(), right.as_literal()) {
                if let Some(value) = fold_binary(*op, l, r) {
                    return Some(literal(expr, value, ids));
                }
            }
            if let Some(l) = left.as_literal() {
                if let Some(picked) = fold_logical(*op, l, left, right) {
                    return Some(picked);
                }
            }
            identity(*op, left, right)
        }
        _ => None,
    }
}

fn is_number(expr: &Expr, n: f64) -> bool {
    matches!(expr.as_literal(), Some(LiteralValue::Number(v)) if *v == n)
}

/// `x+0`, `0+x`, `x-0`, `x*1`, `1*x`, `x*0`, `0*x`, `x/1`.
fn identity(op: BinaryOp, left: &Expr, right: &Expr) -> Option<Expr> {
    match op {
        BinaryOp::Add if is_number(right, 0.0) => Some(left.clone()),
        BinaryOp::Add if is_number(left, 0.0) => Some(right.clone()),
        BinaryOp::Subtract if is_number(right, 0.0) => Some(left.clone()),
        BinaryOp::Multiply if is_number(right, 1.0) => Some(left.clone()),
        BinaryOp::Multiply if is_number(left, 1.0) => Some(right.clone()),
        BinaryOp::Multiply if is_number(right, 0.0) => Some(right.clone()),
        BinaryOp::Multiply if is_number(left, 0.0) => Some(left.clone()),
        BinaryOp::Divide if is_number(right, 1.0) => Some(left.clone()),
        _ => None,
    }
}

/// `&&`, `||` and `??` with a literal left side pick one operand.
fn fold_logical(op: BinaryOp, l: &LiteralValue, left: &Expr, right: &Expr) -> Option<Expr> {
    let take_right = match op {
        BinaryOp::LogicalAnd => truthy(l),
        BinaryOp::LogicalOr => !truthy(l),
        BinaryOp::NullCoalesce => matches!(l, LiteralValue::Null | LiteralValue::Undefined),
        _ => return None,
    };
    Some(if take_right { right.clone() } else { left.clone() })
}

// =============================================================================
// Literal semantics
// =============================================================================

/// Truthiness of a literal.
pub fn truthy(value: &LiteralValue) -> bool {
    match value {
        LiteralValue::Undefined | LiteralValue::Null => false,
        LiteralValue::Boolean(b) => *b,
        LiteralValue::Number(n) => *n != 0.0 && !n.is_nan(),
        LiteralValue::BigInt(b) => !b.is_zero(),
        LiteralValue::String(s) => !s.is_empty(),
    }
}

/// The `typeof` name of a literal.
pub fn type_name(value: &LiteralValue) -> &'static str {
    match value {
        LiteralValue::Undefined => "undefined",
        LiteralValue::Null => "object",
        LiteralValue::Boolean(_) => "boolean",
        LiteralValue::Number(_) => "number",
        LiteralValue::BigInt(_) => "bigint",
        LiteralValue::String(_) => "string",
    }
}

fn to_number(value: &LiteralValue) -> Option<f64> {
    match value {
        LiteralValue::Undefined => Some(f64::NAN),
        LiteralValue::Null => Some(0.0),
        LiteralValue::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
        LiteralValue::Number(n) => Some(*n),
        LiteralValue::String(s) => Some(string_to_number(s)),
        // Mixing bigint with number throws at run time; leave it alone.
        LiteralValue::BigInt(_) => None,
    }
}

fn to_display(value: &LiteralValue) -> String {
    match value {
        LiteralValue::Undefined => "undefined".to_string(),
        LiteralValue::Null => "null".to_string(),
        LiteralValue::Boolean(b) => b.to_string(),
        LiteralValue::Number(n) => number_to_string(*n),
        LiteralValue::BigInt(b) => b.to_string(),
        LiteralValue::String(s) => s.clone(),
    }
}

fn fold_unary(op: UnaryOp, value: &LiteralValue) -> Option<LiteralValue> {
    let folded = match op {
        UnaryOp::Not => LiteralValue::Boolean(!truthy(value)),
        UnaryOp::Typeof => LiteralValue::String(type_name(value).to_string()),
        UnaryOp::Plus => LiteralValue::Number(to_number(value)?),
        UnaryOp::Minus => match value {
            LiteralValue::BigInt(b) => LiteralValue::BigInt(-b),
            other => LiteralValue::Number(-to_number(other)?),
        },
        UnaryOp::BitwiseNot => match value {
            LiteralValue::BigInt(b) => LiteralValue::BigInt(-b - BigInt::from(1)),
            other => LiteralValue::Number(f64::from(!to_int32(to_number(other)?))),
        },
        UnaryOp::Delete => return None,
    };
    Some(folded)
}

fn fold_binary(op: BinaryOp, l: &LiteralValue, r: &LiteralValue) -> Option<LiteralValue> {
    use LiteralValue as L;

    if let (L::BigInt(a), L::BigInt(b)) = (l, r) {
        return fold_bigint(op, a, b);
    }

    let value = match op {
        BinaryOp::Add => {
            if matches!(l, L::String(_)) || matches!(r, L::String(_)) {
                L::String(format!("{}{}", to_display(l), to_display(r)))
            } else {
                L::Number(to_number(l)? + to_number(r)?)
            }
        }
        BinaryOp::Subtract => L::Number(to_number(l)? - to_number(r)?),
        BinaryOp::Multiply => L::Number(to_number(l)? * to_number(r)?),
        BinaryOp::Divide => L::Number(to_number(l)? / to_number(r)?),
        BinaryOp::Remainder => L::Number(to_number(l)? % to_number(r)?),
        BinaryOp::Exponent => L::Number(power(to_number(l)?, to_number(r)?)),
        BinaryOp::ShiftLeft => {
            let shift = to_uint32(to_number(r)?) & 31;
            L::Number(f64::from(to_int32(to_number(l)?).wrapping_shl(shift)))
        }
        BinaryOp::SignedShiftRight => {
            let shift = to_uint32(to_number(r)?) & 31;
            L::Number(f64::from(to_int32(to_number(l)?) >> shift))
        }
        BinaryOp::ShiftRight => {
            let shift = to_uint32(to_number(r)?) & 31;
            L::Number(f64::from(to_uint32(to_number(l)?) >> shift))
        }
        BinaryOp::BitwiseAnd => L::Number(f64::from(to_int32(to_number(l)?) & to_int32(to_number(r)?))),
        BinaryOp::BitwiseOr => L::Number(f64::from(to_int32(to_number(l)?) | to_int32(to_number(r)?))),
        BinaryOp::BitwiseXor => L::Number(f64::from(to_int32(to_number(l)?) ^ to_int32(to_number(r)?))),
        BinaryOp::LessThan | BinaryOp::LessThanOrEqual | BinaryOp::GreaterThan | BinaryOp::GreaterThanOrEqual => {
            L::Boolean(compare(op, l, r)?)
        }
        BinaryOp::StrictEqual => L::Boolean(strict_equals(l, r)),
        BinaryOp::StrictNotEqual => L::Boolean(!strict_equals(l, r)),
        BinaryOp::Equal => L::Boolean(loose_equals(l, r)?),
        BinaryOp::NotEqual => L::Boolean(!loose_equals(l, r)?),
        BinaryOp::LogicalAnd => {
            if truthy(l) {
                r.clone()
            } else {
                l.clone()
            }
        }
        BinaryOp::LogicalOr => {
            if truthy(l) {
                l.clone()
            } else {
                r.clone()
            }
        }
        BinaryOp::NullCoalesce => {
            if matches!(l, L::Null | L::Undefined) {
                r.clone()
            } else {
                l.clone()
            }
        }
        BinaryOp::In => return None,
    };
    Some(value)
}

fn fold_bigint(op: BinaryOp, a: &BigInt, b: &BigInt) -> Option<LiteralValue> {
    use LiteralValue as L;
    let value = match op {
        BinaryOp::Add => L::BigInt(a + b),
        BinaryOp::Subtract => L::BigInt(a - b),
        BinaryOp::Multiply => L::BigInt(a * b),
        BinaryOp::Divide if !b.is_zero() => L::BigInt(a / b),
        BinaryOp::Remainder if !b.is_zero() => L::BigInt(a % b),
        BinaryOp::LessThan => L::Boolean(a < b),
        BinaryOp::LessThanOrEqual => L::Boolean(a <= b),
        BinaryOp::GreaterThan => L::Boolean(a > b),
        BinaryOp::GreaterThanOrEqual => L::Boolean(a >= b),
        BinaryOp::Equal | BinaryOp::StrictEqual => L::Boolean(a == b),
        BinaryOp::NotEqual | BinaryOp::StrictNotEqual => L::Boolean(a != b),
        _ => return None,
    };
    Some(value)
}

fn compare(op: BinaryOp, l: &LiteralValue, r: &LiteralValue) -> Option<bool> {
    if let (LiteralValue::String(a), LiteralValue::String(b)) = (l, r) {
        let ordering = compare_strings(a, b);
        return Some(match op {
            BinaryOp::LessThan => ordering == Ordering::Less,
            BinaryOp::LessThanOrEqual => ordering != Ordering::Greater,
            BinaryOp::GreaterThan => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        });
    }
    let (a, b) = (to_number(l)?, to_number(r)?);
    Some(match op {
        BinaryOp::LessThan => a < b,
        BinaryOp::LessThanOrEqual => a <= b,
        BinaryOp::GreaterThan => a > b,
        _ => a >= b,
    })
}

fn strict_equals(l: &LiteralValue, r: &LiteralValue) -> bool {
    match (l, r) {
        (LiteralValue::Number(a), LiteralValue::Number(b)) => a == b,
        _ => l == r,
    }
}

fn loose_equals(l: &LiteralValue, r: &LiteralValue) -> Option<bool> {
    use LiteralValue as L;
    let nullish = |v: &L| matches!(v, L::Null | L::Undefined);
    if nullish(l) || nullish(r) {
        return Some(nullish(l) && nullish(r));
    }
    if std::mem::discriminant(l) == std::mem::discriminant(r) {
        return Some(strict_equals(l, r));
    }
    Some(to_number(l)? == to_number(r)?)
}

// =============================================================================
// Statements
// =============================================================================

fn stmt_list(stmts: &[Stmt], changed: &mut bool, ids: &NodeIdGenerator) -> Vec<Stmt> {
    stmts
        .iter()
        .map(|s| {
            let next = simplify_stmt(s, ids);
            if !Arc::ptr_eq(&next, s) {
                *changed = true;
            }
            next
        })
        .collect()
}

fn opt_child(expr: &Option<Expr>, changed: &mut bool, ids: &NodeIdGenerator) -> Option<Expr> {
    expr.as_ref().map(|e| child(e, changed, ids))
}

fn stmt_child(stmt: &Stmt, changed: &mut bool, ids: &NodeIdGenerator) -> Stmt {
    let next = simplify_stmt(stmt, ids);
    if !Arc::ptr_eq(&next, stmt) {
        *changed = true;
    }
    next
}

fn declarators(decls: &[Declarator], changed: &mut bool, ids: &NodeIdGenerator) -> Vec<Declarator> {
    decls
        .iter()
        .map(|d| Declarator {
            target: d.target.clone(),
            init: opt_child(&d.init, changed, ids),
        })
        .collect()
}

fn simplify_stmt(stmt: &Stmt, ids: &NodeIdGenerator) -> Stmt {
    let mut changed = false;
    let c = &mut changed;
    let kind = match &stmt.kind {
        StmtKind::Empty | StmtKind::Break | StmtKind::Continue | StmtKind::Import(_) => return stmt.clone(),
        StmtKind::Expression(e) => StmtKind::Expression(child(e, c, ids)),
        StmtKind::Let(d) => StmtKind::Let(declarators(d, c, ids)),
        StmtKind::Const(d) => StmtKind::Const(declarators(d, c, ids)),
        StmtKind::Var(d) => StmtKind::Var(declarators(d, c, ids)),
        StmtKind::Block(body) => StmtKind::Block(stmt_list(body, c, ids)),
        StmtKind::If {
            condition,
            then_branch,
            else_branch,
        } => StmtKind::If {
            condition: child(condition, c, ids),
            then_branch: stmt_child(then_branch, c, ids),
            else_branch: else_branch.as_ref().map(|s| stmt_child(s, c, ids)),
        },
        StmtKind::Return(value) => StmtKind::Return(opt_child(value, c, ids)),
        StmtKind::While { condition, body } => StmtKind::While {
            condition: child(condition, c, ids),
            body: stmt_child(body, c, ids),
        },
        StmtKind::DoWhile { body, condition } => StmtKind::DoWhile {
            body: stmt_child(body, c, ids),
            condition: child(condition, c, ids),
        },
        StmtKind::For {
            init,
            condition,
            update,
            body,
        } => StmtKind::For {
            init: init.as_ref().map(|s| stmt_child(s, c, ids)),
            condition: opt_child(condition, c, ids),
            update: opt_child(update, c, ids),
            body: stmt_child(body, c, ids),
        },
        StmtKind::ForIn(each) => StmtKind::ForIn(for_each(each, c, ids)),
        StmtKind::ForOf(each) => StmtKind::ForOf(for_each(each, c, ids)),
        StmtKind::Throw(value) => StmtKind::Throw(child(value, c, ids)),
        StmtKind::Try {
            block,
            catch_param,
            catch_block,
            finally_block,
        } => StmtKind::Try {
            block: stmt_list(block, c, ids),
            catch_param: catch_param.clone(),
            catch_block: catch_block.as_ref().map(|b| stmt_list(b, c, ids)),
            finally_block: finally_block.as_ref().map(|b| stmt_list(b, c, ids)),
        },
        StmtKind::Switch { discriminant, cases } => StmtKind::Switch {
            discriminant: child(discriminant, c, ids),
            cases: cases
                .iter()
                .map(|case| SwitchCase {
                    test: opt_child(&case.test, c, ids),
                    body: stmt_list(&case.body, c, ids),
                })
                .collect(),
        },
        StmtKind::Function(function) => {
            let ArrowBody::Block(body) = &function.body else {
                return stmt.clone();
            };
            StmtKind::Function(Arc::new(ArrowFunction {
                name: function.name.clone(),
                params: function.params.clone(),
                body: ArrowBody::Block(stmt_list(body, c, ids)),
                is_async: function.is_async,
            }))
        }
    };

    if !changed {
        return stmt.clone();
    }
    Arc::new(Statement {
        id: ids.next_id(),
        span: stmt.span,
        kind,
    })
}

fn for_each(each: &ForEachLoop, changed: &mut bool, ids: &NodeIdGenerator) -> Arc<ForEachLoop> {
    Arc::new(ForEachLoop {
        binding: each.binding,
        target: each.target.clone(),
        source: child(&each.source, changed, ids),
        body: stmt_child(&each.body, changed, ids),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_expression, parse_statements};
    use pretty_assertions::assert_eq;

    fn simplified(source: &str) -> Expr {
        let ids = NodeIdGenerator::new();
        let expr = parse_expression(source, &ids).unwrap();
        simplify_expression(&expr, &ids)
    }

    fn folds_to(source: &str) -> LiteralValue {
        simplified(source)
            .as_literal()
            .cloned()
            .unwrap_or_else(|| panic!("{source} did not fold to a literal"))
    }

    #[test]
    fn test_arithmetic_folding() {
        assert_eq!(folds_to("1 + 2 * 3"), LiteralValue::Number(7.0));
        assert_eq!(folds_to("2 ** 2"), LiteralValue::Number(4.0));
        assert_eq!(folds_to("7 % 4 - -1"), LiteralValue::Number(4.0));
        assert_eq!(folds_to("'a' + 1"), LiteralValue::String("a1".into()));
        assert_eq!(folds_to("'3' * '4'"), LiteralValue::Number(12.0));
    }

    #[test]
    fn test_bitwise_and_shift_folding() {
        assert_eq!(folds_to("5 & 3 | 8"), LiteralValue::Number(9.0));
        assert_eq!(folds_to("~5"), LiteralValue::Number(-6.0));
        assert_eq!(folds_to("-1 >>> 28"), LiteralValue::Number(15.0));
        assert_eq!(folds_to("1 << 33"), LiteralValue::Number(2.0));
    }

    #[test]
    fn test_comparison_and_equality_folding() {
        assert_eq!(folds_to("1 < 2"), LiteralValue::Boolean(true));
        assert_eq!(folds_to("'b' > 'a'"), LiteralValue::Boolean(true));
        assert_eq!(folds_to("'\\u{FFFF}' < '\\u{10000}'"), LiteralValue::Boolean(false));
        assert_eq!(folds_to("'\\u{10000}' <= '\\u{E000}'"), LiteralValue::Boolean(true));
        assert_eq!(folds_to("null == undefined"), LiteralValue::Boolean(true));
        assert_eq!(folds_to("null === undefined"), LiteralValue::Boolean(false));
        assert_eq!(folds_to("'1' == 1"), LiteralValue::Boolean(true));
        assert_eq!(folds_to("typeof null"), LiteralValue::String("object".into()));
        assert_eq!(folds_to("!''"), LiteralValue::Boolean(true));
    }

    #[test]
    fn test_logical_folding() {
        assert_eq!(folds_to("0 || 'x'"), LiteralValue::String("x".into()));
        assert_eq!(folds_to("null ?? 3"), LiteralValue::Number(3.0));
        assert_eq!(simplified("true && y").as_identifier(), Some("y"));
    }

    #[test]
    fn test_identities() {
        assert_eq!(folds_to("x * 0"), LiteralValue::Number(0.0));
        assert_eq!(simplified("x / 1").as_identifier(), Some("x"));
        assert_eq!(simplified("0 + x").as_identifier(), Some("x"));
        assert_eq!(simplified("x - (2 - 2)").as_identifier(), Some("x"));
        assert_eq!(simplified("1 * x * 1").as_identifier(), Some("x"));
    }

    #[test]
    fn test_unchanged_tree_keeps_identity() {
        let ids = NodeIdGenerator::new();
        let expr = parse_expression("f(a, b.c) + [d]", &ids).unwrap();
        let result = simplify_expression(&expr, &ids);
        assert!(Arc::ptr_eq(&expr, &result));
    }

    #[test]
    fn test_idempotent() {
        let ids = NodeIdGenerator::new();
        let expr = parse_expression("g(1 + 2, x * 1) ? `${2 * 3}` : y", &ids).unwrap();
        let once = simplify_expression(&expr, &ids);
        assert!(!Arc::ptr_eq(&expr, &once));
        let twice = simplify_expression(&once, &ids);
        assert!(Arc::ptr_eq(&once, &twice));
    }

    #[test]
    fn test_bigint_folding() {
        assert!(matches!(
            folds_to("9007199254740993 + 9007199254740993"),
            LiteralValue::BigInt(_)
        ));
        assert!(simplified("9007199254740993 + 1").as_literal().is_none());
    }

    #[test]
    fn test_statement_simplification() {
        let ids = NodeIdGenerator::new();
        let stmts = parse_statements("let a = 2 * 3; if (a) { return a + 0 }", &ids).unwrap();
        let simplified = simplify_statements(&stmts, &ids).unwrap();
        let StmtKind::Let(decls) = &simplified[0].kind else {
            panic!("expected let");
        };
        assert_eq!(
            decls[0].init.as_ref().and_then(|e| e.as_literal()),
            Some(&LiteralValue::Number(6.0))
        );
        assert!(simplify_statements(&simplified, &ids).is_none());

        let untouched = parse_statements("while (a) b();", &ids).unwrap();
        let result = simplify_statement(&untouched[0], &ids);
        assert!(Arc::ptr_eq(&untouched[0], &result));
    }
}
