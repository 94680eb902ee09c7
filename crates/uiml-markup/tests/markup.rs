use pretty_assertions::assert_eq;
use uiml_markup::{parse, ErrorCode, ScanMode, Scanner, SyntaxKind};

#[test]
fn test_token_round_trip() {
    let sources = [
        "<App xmlns:c=\"component-ns\">\n  <c:Card when='{ok}'/>\n</App>",
        "<Stack>\r\n<!-- note --><Text>a &lt; b</Text><script>var n = 1;</script></Stack>",
        "<A x='1' x='2'><B></A>",
        "<A><![CDATA[ <raw> ]]></A>",
    ];
    for source in sources {
        for token in Scanner::new(source, ScanMode::Full) {
            assert_eq!(token.span.text(source), token.text.as_str(), "{source}");
        }
        assert_eq!(parse(source).syntax().text().to_string(), source);
    }
}

#[test]
fn test_self_closing_stack() {
    let parse = parse("<Stack attr='val' />");
    assert!(parse.errors().is_empty());
    let roots: Vec<_> = parse.document().root_elements().collect();
    assert_eq!(roots.len(), 1);

    let stack = &roots[0];
    assert_eq!(stack.name().as_deref(), Some("Stack"));
    assert!(stack.is_self_closing());
    let attributes: Vec<_> = stack.attributes().collect();
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].key().unwrap().full_name(), "attr");
    assert_eq!(attributes[0].value().unwrap().raw_text().as_deref(), Some("'val'"));
}

#[test]
fn test_unterminated_comment() {
    let parse = parse("<Stack><!--unterminated");
    let unterminated: Vec<_> = parse
        .errors()
        .iter()
        .filter(|error| error.code == ErrorCode::UnterminatedComment)
        .collect();
    assert_eq!(unterminated.len(), 1);

    let error_node = parse
        .syntax()
        .descendants()
        .find(|node| node.kind() == SyntaxKind::Error)
        .expect("error node");
    assert_eq!(error_node.text().to_string(), "<!--unterminated");
}

#[test]
fn test_diagnostics_are_positioned() {
    let source = "<App>\n  <Button Label='x' label='y'/>\n</App>";
    let parse = parse(source);
    let rendered: Vec<String> = parse
        .errors()
        .iter()
        .map(|error| format!("{} {}", error, error.span.text(source)))
        .collect();
    insta::assert_snapshot!(rendered.join("\n"), @"U005: attribute name 'Label' must not start with an uppercase letter Label");
}

#[test]
fn test_recovery_continues_after_errors() {
    let source = "<App>\n  <A x=>\n  </A>\n  <B #/>\n  <C/>\n</App>";
    let parse = parse(source);
    let codes: Vec<&str> = parse.errors().iter().map(|e| e.code.as_str()).collect();
    assert_eq!(codes, vec!["U007", "U101"]);
    let app = parse.document().root().unwrap();
    let names: Vec<String> = app
        .children()
        .iter()
        .filter_map(|content| match content {
            uiml_markup::Content::Element(element) => element.name().map(|n| n.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["A", "B", "C"]);
}
