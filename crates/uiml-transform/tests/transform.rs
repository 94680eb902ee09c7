use pretty_assertions::assert_eq;
use uiml_transform::{compile, CompileOptions, ComponentDef, CompoundComponentDef, Handler, PropValue, Severity};

fn component(source: &str) -> ComponentDef {
    let output = compile(source, &CompileOptions::default());
    assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);
    match output.component.and_then(|c| c.as_component().cloned()) {
        Some(component) => component,
        None => panic!("expected a component for {source}"),
    }
}

fn compound(source: &str) -> CompoundComponentDef {
    let output = compile(source, &CompileOptions::default());
    assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);
    match output.component.and_then(|c| c.as_compound().cloned()) {
        Some(compound) => compound,
        None => panic!("expected a compound component for {source}"),
    }
}

fn error_codes(source: &str) -> Vec<&'static str> {
    compile(source, &CompileOptions::default())
        .diagnostics
        .iter()
        .map(|d| d.code.as_str())
        .collect()
}

#[test]
fn test_handler_error_is_anchored_in_attribute() {
    let source = r#"<App><Button onClick="{ foo(bar }" /></App>"#;
    let output = compile(source, &CompileOptions::default());

    assert_eq!(output.diagnostics.len(), 1);
    let diagnostic = &output.diagnostics[0];
    assert_eq!(diagnostic.code.as_str(), "T012");
    assert_eq!(diagnostic.severity, Severity::Error);
    assert!(diagnostic.message.contains("missing closing parenthesis"), "{}", diagnostic.message);

    let value_start = source.find("{ foo").unwrap();
    let value_end = value_start + "{ foo(bar }".len();
    let start = usize::from(diagnostic.span.start);
    assert!((value_start..value_end).contains(&start), "{:?}", diagnostic.span);
    assert_eq!(&source[start..start + 1], "}");

    // Script errors do not stop the transform.
    let app = output.component.as_ref().unwrap();
    let button = &app.as_component().unwrap().children[0];
    let click = &button.events["click"];
    assert_eq!(click.source, "{ foo(bar }");
    assert!(click.parsed.is_none());
    assert!(output.has_errors());
}

#[test]
fn test_attribute_segmentation() {
    let button = component(
        r#"<Button id="save" when="{visible}" testId="btn" label="Save" disabled
              var.clicks="{0}" method.focus="doFocus()" event.hover="log()" onClick="clicks++" />"#,
    );
    assert_eq!(button.uid.as_deref(), Some("save"));
    assert!(matches!(button.when, Some(PropValue::Expression(_))));
    assert_eq!(button.test_id.as_ref().and_then(PropValue::as_literal), Some("btn"));
    assert_eq!(button.literal_prop("label"), Some("Save"));
    assert_eq!(button.literal_prop("disabled"), Some("true"));
    assert!(matches!(button.vars["clicks"], PropValue::Expression(_)));
    assert_eq!(button.api["focus"].source, "doFocus()");

    let events: Vec<&str> = button.events.keys().map(|k| k.as_str()).collect();
    assert_eq!(events, vec!["hover", "click"]);
    assert!(matches!(button.events["click"].parsed, Some(Handler::Statements(_))));
}

#[test]
fn test_arrow_handler() {
    let button = component(r#"<Button onClick="(e) => submit(e)" />"#);
    assert!(matches!(button.events["click"].parsed, Some(Handler::Arrow(_))));
}

#[test]
fn test_events_are_not_parsed_on_request() {
    let options = CompileOptions {
        parse_events: false,
        ..CompileOptions::default()
    };
    let output = compile(r#"<Button onClick="{ foo(bar }" />"#, &options);
    assert!(output.diagnostics.is_empty());
    let button = output.component.unwrap();
    assert!(button.as_component().unwrap().events["click"].parsed.is_none());
}

#[test]
fn test_text_content() {
    let text = component("<Text>\n  a &lt;\n   b  </Text>");
    assert_eq!(text.literal_prop("value"), Some("a < b"));

    let text = component("<Text><![CDATA[<b>bold</b>]]></Text>");
    assert_eq!(text.literal_prop("value"), Some("<b>bold</b>"));

    let text = component("<Text>Count: {count}</Text>");
    assert!(matches!(text.props["value"], PropValue::Template(_)));

    let text = component(r#"<Text value="explicit">ignored</Text>"#);
    assert_eq!(text.literal_prop("value"), Some("explicit"));
}

#[test]
fn test_namespaces() {
    let app = component(
        r#"<App xmlns:c="component-ns">
             <c:Card />
             <Charts xmlns="component-ns:Vendor"><Pie /></Charts>
             <Button />
           </App>"#,
    );
    let types: Vec<&str> = app.children.iter().map(|c| c.type_name.as_str()).collect();
    assert_eq!(types, vec!["#app-ns.Card", "Vendor.Charts", "Button"]);
    assert_eq!(app.children[1].children[0].type_name, "Vendor.Pie");

    let output = compile("<App><x:Thing /></App>", &CompileOptions::default());
    assert!(output.component.is_none());
    insta::assert_snapshot!(output.diagnostics[0].message, @"invalid namespace 'x'");
}

#[test]
fn test_helpers() {
    let list = component(
        r#"<List>
             <property name="items">
               <item value="a" />
               <item>{1 + 1}</item>
             </property>
             <property name="style">
               <field name="color" value="red" />
             </property>
             <property name="header"><Text>Title</Text></property>
             <template name="itemTemplate"><Text>{$item}</Text></template>
             <variable name="count" value="{0}" />
             <event name="select">count++</event>
             <method name="reset" value="count = 0" />
             <uses value="count, selected" />
             <loaders><DataLoader id="load" /></loaders>
           </List>"#,
    );
    assert!(list.children.is_empty());

    let PropValue::List(items) = &list.props["items"] else {
        panic!("expected a list");
    };
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_literal(), Some("a"));
    assert!(matches!(items[1], PropValue::Expression(_)));

    let PropValue::Object(style) = &list.props["style"] else {
        panic!("expected an object");
    };
    assert_eq!(style["color"].as_literal(), Some("red"));

    let PropValue::Component(header) = &list.props["header"] else {
        panic!("expected a component");
    };
    assert_eq!(header.type_name, "Text");
    assert_eq!(header.literal_prop("value"), Some("Title"));
    assert!(matches!(&list.props["itemTemplate"], PropValue::Component(c) if c.type_name == "Text"));

    assert!(matches!(list.vars["count"], PropValue::Expression(_)));
    assert_eq!(list.events["select"].source, "count++");
    assert!(matches!(list.events["select"].parsed, Some(Handler::Statements(_))));
    assert_eq!(list.api["reset"].source, "count = 0");
    assert_eq!(list.uses, vec!["count", "selected"]);
    assert_eq!(list.loaders[0].uid.as_deref(), Some("load"));
}

#[test]
fn test_code_behind() {
    let app = component(
        "<App>
           <Text>{label}</Text>
           <script>
             var label = 'hi';
             function rename(to) { label = to; }
           </script>
         </App>",
    );
    assert!(app.script.as_deref().unwrap().contains("function rename"));
    let collected = app.script_collected.unwrap();
    let vars: Vec<&str> = collected.vars.keys().map(|k| k.as_str()).collect();
    assert_eq!(vars, vec!["label"]);
    assert!(collected.functions.contains_key("rename"));
}

#[test]
fn test_code_behind_error_is_collected() {
    let source = "<App><script>var = 1;</script></App>";
    let output = compile(source, &CompileOptions::default());
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].code.as_str(), "T012");

    let script_start = source.find("var").unwrap();
    assert!(usize::from(output.diagnostics[0].span.start) >= script_start);

    let app = output.component.unwrap();
    let app = app.as_component().unwrap();
    assert!(app.script_error.is_some());
    assert!(app.script_collected.is_none());
}

#[test]
fn test_compound_component() {
    let counter = compound(
        r#"<Component name="Counter" var.count="{0}" method.reset="count = 0">
             <Button label="{count}" onClick="count++" />
             <script>var step = 1;</script>
           </Component>"#,
    );
    assert_eq!(counter.name, "Counter");
    assert_eq!(counter.component.type_name, "Fragment");
    assert!(counter.component.vars.contains_key("count"));
    assert_eq!(counter.component.children[0].type_name, "Button");
    assert!(counter.vars.contains_key("count"));
    assert_eq!(counter.api["reset"].source, "count = 0");
    assert!(counter.script_collected.unwrap().vars.contains_key("step"));

    let single = compound(r#"<Component name="Single"><Text>one</Text></Component>"#);
    assert_eq!(single.component.type_name, "Text");
}

#[test]
fn test_transform_errors() {
    let cases = [
        ("  ", "T001"),
        ("<App><script>var a;</script><script>var b;</script></App>", "T002"),
        (r#"<App><Component name="Inner"><A /></Component></App>"#, "T003"),
        ("<App>Hello<Button /></App>", "T004"),
        (r#"<App><property value="x" /></App>"#, "T005"),
        ("<Component><A /></Component>", "T005"),
        (r#"<App><variable name="x" /></App>"#, "T006"),
        (r#"<App a.b.c="1" />"#, "T007"),
        (r#"<Component name="counter"><A /></Component>"#, "T008"),
        (r#"<Component name="Empty"></Component>"#, "T009"),
        (r#"<App><item value="x" /></App>"#, "T010"),
        (r#"<App><uses value="a b" /></App>"#, "T011"),
        (r#"<App xmlns:c="" />"#, "T013"),
    ];
    for (source, code) in cases {
        assert_eq!(error_codes(source), vec![code], "{source}");
    }
}

#[test]
fn test_markup_errors_stop_compilation() {
    let output = compile("<App><Button></App>", &CompileOptions::default());
    assert!(output.component.is_none());
    assert_eq!(output.diagnostics[0].code.as_str(), "U002");
}

#[test]
fn test_markup_warnings_do_not_stop_compilation() {
    let output = compile(r#"<App Label="x" />"#, &CompileOptions::default());
    assert_eq!(output.diagnostics.len(), 1);
    assert_eq!(output.diagnostics[0].severity, Severity::Warning);
    assert!(!output.has_errors());
    assert!(output.component.is_some());
}
