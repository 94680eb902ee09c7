use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use smol_str::SmolStr;
use uiml_engine::{EngineError, EngineOptions, EvalContext, Thread, Value};
use uiml_script::{parse_expression, parse_statements, NodeIdGenerator};

fn run(thread: &mut Thread, source: &str) -> Result<Option<Value>, EngineError> {
    let statements = parse_statements(source, &NodeIdGenerator::new()).unwrap();
    thread.execute(&statements)
}

fn eval(thread: &mut Thread, source: &str) -> Value {
    let expr = parse_expression(source, &NodeIdGenerator::new()).unwrap();
    thread.evaluate(&expr).unwrap()
}

fn app_state() -> Value {
    let mut user = IndexMap::new();
    user.insert(SmolStr::new("name"), Value::from("Ada"));
    let mut state = IndexMap::new();
    state.insert(SmolStr::new("count"), Value::Number(1.0));
    state.insert(SmolStr::new("user"), Value::object(user));
    state.insert(
        SmolStr::new("items"),
        Value::array(vec![Value::Number(1.0), Value::Number(2.0)]),
    );
    Value::object(state)
}

fn read_only_thread() -> Thread {
    let context = EvalContext::new().with_read_only("appState", app_state());
    Thread::new(context, EngineOptions::default())
}

#[test]
fn test_read_only_mutations_are_fatal() {
    let cases = [
        ("appState.count = 2", "appState.count"),
        ("appState.user.name += '!'", "appState.user.name"),
        ("appState.count++", "appState.count"),
        ("delete appState.user", "appState.user"),
        ("appState.items.push(3)", "appState.items"),
        ("appState = null", "appState"),
        ("let alias = appState.user; alias.name = 'x'", "appState.user.name"),
    ];
    for (source, expected_path) in cases {
        let mut thread = read_only_thread();
        match run(&mut thread, source) {
            Err(EngineError::ReadOnly { path, .. }) => assert_eq!(path, expected_path, "{source}"),
            other => panic!("{source}: expected a read-only error, got {other:?}"),
        }
    }
}

#[test]
fn test_read_only_values_can_be_read() {
    let mut thread = read_only_thread();
    run(
        &mut thread,
        "let total = 0;
         for (const n of appState.items) total += n;
         let copy = { ...appState.user, age: 36 };
         copy.name = 'Grace';
         let first = appState.items.slice(0, 1);
         first.push(5);",
    )
    .unwrap();
    assert_eq!(thread.variable("total"), Some(Value::Number(3.0)));
    assert_eq!(eval(&mut thread, "copy.name + ' ' + appState.user.name"), Value::from("Grace Ada"));
    assert_eq!(eval(&mut thread, "first.length"), Value::Number(2.0));
    assert_eq!(eval(&mut thread, "appState.items.includes(2)"), Value::Bool(true));
}

#[test]
fn test_closures_capture_live_blocks() {
    let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
    run(
        &mut thread,
        "function counter() {
           let n = 0;
           return () => ++n;
         }
         const next = counter();
         next(); next();
         let value = next();
         const add = (a, ...rest) => a + rest.length;
         let spread = add(...[1, 2, 3, 4]);",
    )
    .unwrap();
    assert_eq!(thread.variable("value"), Some(Value::Number(3.0)));
    assert_eq!(thread.variable("spread"), Some(Value::Number(4.0)));
}

#[test]
fn test_destructuring() {
    let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
    run(
        &mut thread,
        "const { a, b: [first, , third], ...others } = { a: 1, b: [10, 20, 30], c: 3, d: 4 };
         let x = 1, y = 2;
         [x, y] = [y, x];",
    )
    .unwrap();
    assert_eq!(thread.variable("a"), Some(Value::Number(1.0)));
    assert_eq!(thread.variable("third"), Some(Value::Number(30.0)));
    assert_eq!(eval(&mut thread, "others.c + others.d"), Value::Number(7.0));
    assert_eq!(eval(&mut thread, "`${x}${y}`"), Value::from("21"));
}

#[test]
fn test_host_functions_and_globals() {
    let context = EvalContext::new()
        .with_global("double", Value::native("double", |args| {
            Ok(Value::Number(args.first().map_or(f64::NAN, Value::to_number) * 2.0))
        }))
        .with_global("fail", Value::native("fail", |_| Err(Value::from("host failure"))))
        .with_global("counter", Value::Number(0.0));
    let mut thread = Thread::new(context, EngineOptions::default());
    run(
        &mut thread,
        "counter = double(21);
         let caught;
         try { fail(); } catch (e) { caught = e; }
         undeclared = 'global';",
    )
    .unwrap();
    assert_eq!(thread.context().global("counter"), Some(&Value::Number(42.0)));
    assert_eq!(thread.variable("caught"), Some(Value::from("host failure")));
    assert_eq!(thread.variable("undeclared"), Some(Value::from("global")));
}

#[test]
fn test_type_errors_are_catchable() {
    let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
    run(
        &mut thread,
        "let messages = [];
         try { missing(); } catch (e) { messages.push(e.message); }
         try { undefined.x; } catch (e) { messages.push(e.name); }
         const o = { f: 1 };
         try { o.f(); } catch (e) { messages.push(e.message); }
         let safe = o.g?.();",
    )
    .unwrap();
    assert_eq!(
        eval(&mut thread, "messages.join('|')"),
        Value::from("missing is not a function|TypeError|f is not a function")
    );
    assert_eq!(thread.variable("safe"), Some(Value::Undefined));
}

#[test]
fn test_huge_array_writes_are_range_errors() {
    let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
    run(
        &mut thread,
        "let a = [1, 2];
         let errors = [];
         try { a[4294967294] = 1; } catch (e) { errors.push(e.name); }
         try { a.length = 4294967295; } catch (e) { errors.push(e.name); }
         a[4] = 5;",
    )
    .unwrap();
    assert_eq!(
        eval(&mut thread, "errors.join('|')"),
        Value::from("RangeError|RangeError")
    );
    assert_eq!(eval(&mut thread, "a.length"), Value::Number(5.0));

    let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
    let error = run(&mut thread, "let b = []; b[16777216] = 0;").unwrap_err();
    assert!(matches!(error, EngineError::Uncaught { .. }), "{error}");
    assert_eq!(uiml_engine::MAX_ARRAY_LENGTH, 16_777_216);
}

#[test]
fn test_runaway_recursion_is_a_range_error() {
    let options = EngineOptions {
        max_call_depth: 32,
        ..EngineOptions::default()
    };
    let mut thread = Thread::new(EvalContext::default(), options);
    let error = run(&mut thread, "function f(n) { return f(n + 1); } f(0);").unwrap_err();
    insta::assert_snapshot!(error.to_string(), @"uncaught RangeError: maximum call stack size exceeded");
}

#[test]
fn test_async_and_await_run_synchronously() {
    let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
    run(
        &mut thread,
        "async function load() { return 'data'; }
         let result = await load();",
    )
    .unwrap();
    assert_eq!(thread.variable("result"), Some(Value::from("data")));
}

#[test]
fn test_diagnostics_are_collected() {
    let mut thread = Thread::new(EvalContext::default(), EngineOptions::default());
    run(&mut thread, "for (let i = 0; i < 3; i++) { if (i) { continue; } }").unwrap();
    let diagnostics = thread.diagnostics();
    assert!(diagnostics.processed_statements > 3);
    assert_eq!(diagnostics.max_loop_depth, 1);
    assert!(diagnostics.max_block_depth >= 2);
    assert!(diagnostics.unwinds >= 2);
    assert!(diagnostics.reenqueues >= 3);
}
