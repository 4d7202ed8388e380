use vireo_template::{ParseError, SourceKind, SourceNode, parse_root, parse_template};

#[test]
fn parse_element_with_text() {
    let ast = parse_template("<div>hi</div>").unwrap();
    assert_eq!(ast.len(), 1);
    match &ast[0] {
        SourceNode::Element { name, children, .. } => {
            assert_eq!(name, "div");
            assert_eq!(children.len(), 1);
            assert!(matches!(children[0], SourceNode::Text(_)));
        }
        _ => panic!("expected element"),
    }
}

#[test]
fn placeholders_stay_inside_text() {
    let ast = parse_template("<p>Hello {{ name }}!</p>").unwrap();
    assert_eq!(ast[0].children(), &[SourceNode::text("Hello {{ name }}!")]);
}

#[test]
fn parse_attribute_forms() {
    let ast = parse_template(r#"<input class="x" title='say "hi"' size=3 disabled/>"#).unwrap();
    let attrs = ast[0].attributes();
    assert_eq!(
        attrs,
        &[
            ("class".to_string(), "x".to_string()),
            ("title".to_string(), "say \"hi\"".to_string()),
            ("size".to_string(), "3".to_string()),
            ("disabled".to_string(), String::new()),
        ]
    );
    assert!(ast[0].children().is_empty());
}

#[test]
fn void_elements_need_no_close_tag() {
    let ast = parse_template("<p>a<br>b<img src=x.png></p>").unwrap();
    let kids = ast[0].children();
    assert_eq!(kids.len(), 4);
    assert_eq!(kids[1].name(), Some("br"));
    assert_eq!(kids[3].name(), Some("img"));
    assert_eq!(kids[3].attributes()[0].1, "x.png");
}

#[test]
fn whitespace_and_comments_are_kept() {
    let ast = parse_template("<ul>\n  <!-- items -->\n  <li>a</li>\n</ul>").unwrap();
    let kinds: Vec<SourceKind> = ast[0].children().iter().map(SourceNode::kind).collect();
    assert_eq!(
        kinds,
        vec![
            SourceKind::Text,
            SourceKind::Comment,
            SourceKind::Text,
            SourceKind::Element,
            SourceKind::Text,
        ]
    );
    assert_eq!(ast[0].children()[1], SourceNode::Comment(" items ".into()));
    assert!(ast[0].children()[0].is_whitespace());
}

#[test]
fn mismatched_close_tag_is_an_error() {
    let err = parse_template("<div><span>x</div></span>").unwrap_err();
    assert!(matches!(err, ParseError::Syntax(_)));
}

#[test]
fn parse_root_skips_surrounding_whitespace() {
    let root = parse_root("\n  <!-- app -->\n<div id=\"app\">{{msg}}</div>\n").unwrap();
    assert_eq!(root.name(), Some("div"));
}

#[test]
fn parse_root_rejects_multiple_roots() {
    assert_eq!(parse_root("<a></a><b></b>"), Err(ParseError::RootCount(2)));
    assert_eq!(parse_root("   "), Err(ParseError::RootCount(0)));
}

#[test]
fn entities_are_decoded() {
    let ast = parse_template(r#"<p title="a &amp; b">x &lt; y</p>"#).unwrap();
    assert_eq!(ast[0].attributes()[0].1, "a & b");
    assert_eq!(ast[0].children()[0].text_content(), Some("x < y"));
}
