use vireo_dom::{NodeId, Props, VNode, h, text};

#[test]
fn equality_ignores_surface_handles() {
    let a = h("div", vec![("id", "x")], vec![text("hi")]);
    let mut b = a.clone();
    b.set_el(NodeId::new(7));
    assert_eq!(a, b);
    assert_eq!(b.el(), Some(NodeId::new(7)));
    assert_eq!(a.el(), None);
}

#[test]
fn equality_ignores_attribute_order() {
    let a = h("p", vec![("a", "1"), ("b", "2")], vec![]);
    let b = h("p", vec![("b", "2"), ("a", "1")], vec![]);
    assert_eq!(a, b);
}

#[test]
fn text_and_element_never_equal() {
    assert_ne!(text("div"), h("div", Props::new(), vec![]));
}

#[test]
fn later_attribute_overwrites() {
    let p = Props::new().set("class", "a").set("class", "b");
    assert_eq!(p.len(), 1);
    assert_eq!(p.get("class"), Some("b"));
}

#[test]
fn detached_strips_every_handle() {
    let mut child = text("x");
    child.set_el(NodeId::new(2));
    let mut root = h("div", Props::new(), vec![child]);
    root.set_el(NodeId::new(1));

    let copy = root.detached();
    assert_eq!(copy.el(), None);
    assert_eq!(copy.children()[0].el(), None);
    assert_eq!(copy, root);
}

#[test]
fn accessors_match_kind() {
    let t = text("hello");
    assert!(t.is_text());
    assert_eq!(t.text_value(), Some("hello"));
    assert_eq!(t.tag(), None);
    assert!(t.children().is_empty());

    let e = h("span", (), vec![t]);
    assert_eq!(e.tag(), Some("span"));
    assert_eq!(e.text_value(), None);
    assert!(matches!(e.children(), [VNode::Text { .. }]));
}
