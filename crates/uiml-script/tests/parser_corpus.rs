use std::sync::Arc;
use uiml_script::*;

/// Renders an expression as an s-expression.
fn sexpr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(LiteralValue::String(s)) => format!("{s:?}"),
        ExprKind::Literal(LiteralValue::Number(n)) => coerce::number_to_string(*n),
        ExprKind::Literal(LiteralValue::BigInt(b)) => format!("{b}n"),
        ExprKind::Literal(LiteralValue::Boolean(b)) => b.to_string(),
        ExprKind::Literal(LiteralValue::Null) => "null".to_string(),
        ExprKind::Literal(LiteralValue::Undefined) => "undefined".to_string(),
        ExprKind::Identifier { name } => name.to_string(),
        ExprKind::Binary { op, left, right } => format!("({} {} {})", op.as_str(), sexpr(left), sexpr(right)),
        ExprKind::Unary { op, operand } => format!("({} {})", op.as_str(), sexpr(operand)),
        ExprKind::Prefix { op, operand } => format!("(pre{:?} {})", op, sexpr(operand)),
        ExprKind::Postfix { op, operand } => format!("(post{:?} {})", op, sexpr(operand)),
        ExprKind::Conditional {
            condition,
            consequent,
            alternate,
        } => format!("(? {} {} {})", sexpr(condition), sexpr(consequent), sexpr(alternate)),
        ExprKind::Call { callee, arguments, .. } => {
            let args: Vec<_> = arguments.iter().map(sexpr).collect();
            format!("(call {} [{}])", sexpr(callee), args.join(" "))
        }
        ExprKind::Member { object, member, .. } => format!("(. {} {})", sexpr(object), member),
        ExprKind::ComputedMember { object, member, .. } => format!("([] {} {})", sexpr(object), sexpr(member)),
        ExprKind::Assignment { op, target, value } => {
            let op = match op {
                AssignmentOp::Assign => "=".to_string(),
                AssignmentOp::Compound(op) => format!("{}=", op.as_str()),
            };
            format!("({} {} {})", op, sexpr(target), sexpr(value))
        }
        ExprKind::Arrow(arrow) => {
            let names: Vec<_> = arrow.params.items.iter().flat_map(|p| p.bound_names()).collect();
            let prefix = if arrow.is_async { "async-arrow" } else { "arrow" };
            match &arrow.body {
                ArrowBody::Expression(body) => format!("({prefix} [{}] {})", names.join(" "), sexpr(body)),
                ArrowBody::Block(stmts) => format!("({prefix} [{}] {{{}}})", names.join(" "), stmts.len()),
            }
        }
        other => format!("<{:?}>", other.node_type()),
    }
}

fn parsed(source: &str) -> String {
    sexpr(&parse_expression(source, &NodeIdGenerator::new()).unwrap())
}

fn folded(source: &str) -> String {
    let ids = NodeIdGenerator::new();
    let expr = parse_expression(source, &ids).unwrap();
    sexpr(&simplify_expression(&expr, &ids))
}

#[test]
fn test_precedence_and_folding() {
    insta::assert_snapshot!(parsed("1+2*3"), @"(+ 1 (* 2 3))");
    insta::assert_snapshot!(folded("1+2*3"), @"7");
    insta::assert_snapshot!(folded("2**2"), @"4");
    insta::assert_snapshot!(folded("x*0"), @"0");
    insta::assert_snapshot!(folded("x/1"), @"x");
}

#[test]
fn test_operator_shapes() {
    insta::assert_snapshot!(parsed("-a ** 2"), @"(- (** a 2))");
    insta::assert_snapshot!(parsed("a = b ? c : d || e"), @"(= a (? b c (|| d e)))");
    insta::assert_snapshot!(parsed("a += b -= 1"), @"(+= a (-= b 1))");
    insta::assert_snapshot!(parsed("x++ + ++y"), @"(+ (postIncrement x) (preIncrement y))");
    insta::assert_snapshot!(parsed("a.b[c](d)"), @"(call ([] (. a b) c) [d])");
    insta::assert_snapshot!(parsed("'a' in o === !b"), @"(=== (in \"a\" o) (! b))");
}

#[test]
fn test_arrow_and_async_forms() {
    insta::assert_snapshot!(parsed("x => x * 2"), @"(arrow [x] (* x 2))");
    insta::assert_snapshot!(parsed("async (a, b) => a + b"), @"(async-arrow [a b] (+ a b))");
    insta::assert_snapshot!(parsed("async x => { }"), @"(async-arrow [x] {0})");
    insta::assert_snapshot!(parsed("async(1, 2)"), @"(call async [1 2])");
    insta::assert_snapshot!(parsed("async"), @"async");
}

#[test]
fn test_simplifier_identity_and_idempotence() {
    let ids = NodeIdGenerator::new();
    for source in ["a + b", "f(x)[y]", "c ? d : e", "`t${u}`", "v => v + w"] {
        let expr = parse_expression(source, &ids).unwrap();
        let result = simplify_expression(&expr, &ids);
        assert!(Arc::ptr_eq(&expr, &result), "{source} should be unchanged");
    }
    for source in ["(1 + x) * 1 + 0", "[1 + 1, 'a' + 'b']", "() => 2 * 3"] {
        let expr = parse_expression(source, &ids).unwrap();
        let once = simplify_expression(&expr, &ids);
        let twice = simplify_expression(&once, &ids);
        assert!(Arc::ptr_eq(&once, &twice), "{source} should be idempotent");
    }
}

#[test]
fn test_const_async_declaration() {
    let statements = parse_statements("const async = 42; async + 1", &NodeIdGenerator::new()).unwrap();
    assert_eq!(statements.len(), 2);
    let StmtKind::Expression(expr) = &statements[1].kind else {
        panic!("expected expression statement");
    };
    insta::assert_snapshot!(sexpr(expr), @"(+ async 1)");
}
