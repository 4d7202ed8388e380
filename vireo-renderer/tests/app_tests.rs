use std::cell::RefCell;
use std::rc::Rc;

use vireo_core::{Object, Value};
use vireo_template::{BindError, CompileError, SourceKind};
use vireo_renderer::{App, AppError, MemorySurface, Options, Surface};

fn surface(markup: &str) -> Rc<RefCell<MemorySurface>> {
    Rc::new(RefCell::new(MemorySurface::from_html(markup).unwrap()))
}

fn html(app: &App<MemorySurface>) -> String {
    app.surface().borrow().html()
}

#[test]
fn mount_renders_and_replaces_target() {
    let s = surface(r#"<body><div id="a">{{msg}}</div></body>"#);
    let target = s.borrow().query("#a").unwrap();
    let mut app = App::new(s.clone(), Object::from_iter([("msg", "hi")]));
    app.mount("#a").unwrap();

    assert_eq!(html(&app), r#"<body><div id="a">hi</div></body>"#);
    assert_eq!(app.render_count(), 1);
    let el = app.el().unwrap();
    assert_ne!(el, target);
    assert!(!s.borrow().is_attached(target));
    assert!(s.borrow().is_attached(el));
    assert_eq!(app.vnode().unwrap().children()[0].text_value(), Some("hi"));
}

#[test]
fn write_rerenders_with_one_text_write() {
    let s = surface(r#"<div id="a">{{msg}}</div>"#);
    let mut app = App::new(s.clone(), Object::from_iter([("msg", "hi")]));
    app.mount("#a").unwrap();
    let el = app.el().unwrap();
    s.borrow_mut().take_ops();

    app.set("msg", "bye").unwrap();

    assert_eq!(html(&app), r#"<div id="a">bye</div>"#);
    assert_eq!(app.render_count(), 2);
    assert_eq!(app.el(), Some(el));
    assert_eq!(app.last_report().text_writes, 1);
    assert_eq!(s.borrow().ops().len(), 1);
}

#[test]
fn identical_write_does_not_render() {
    let s = surface(r#"<div id="a">{{msg}}</div>"#);
    let mut app = App::new(s, Object::from_iter([("msg", "hi")]));
    app.mount("#a").unwrap();
    app.set("msg", "hi").unwrap();
    assert_eq!(app.render_count(), 1);
}

#[test]
fn unread_property_does_not_render() {
    let s = surface(r#"<div id="a">{{msg}}</div>"#);
    let mut app = App::new(s, Object::from_iter([("msg", "hi"), ("other", "x")]));
    app.mount("#a").unwrap();
    app.set("other", "y").unwrap();
    assert_eq!(app.render_count(), 1);
    assert_eq!(app.get("other").unwrap(), Value::from("y"));
}

#[test]
fn nested_write_rerenders() {
    let s = surface(r#"<p id="a">{{ user.name }} ({{ user.age }})</p>"#);
    let user = Object::from_iter([("name", Value::from("Ada")), ("age", Value::from(36))]);
    let mut app = App::new(s, Object::from_iter([("user", user.clone())]));
    app.mount("#a").unwrap();
    assert_eq!(html(&app), r#"<p id="a">Ada (36)</p>"#);

    user.set("age", 37);
    assert_eq!(app.take_error(), None);
    assert_eq!(html(&app), r#"<p id="a">Ada (37)</p>"#);
    assert_eq!(app.render_count(), 2);
}

#[test]
fn replaced_object_is_tracked_after_render() {
    let s = surface(r#"<p id="a">{{ sel.name }}</p>"#);
    let first = Object::from_iter([("name", "one")]);
    let second = Object::from_iter([("name", "two")]);
    let mut app = App::new(s, Object::from_iter([("sel", first.clone())]));
    app.mount("#a").unwrap();

    app.set("sel", second.clone()).unwrap();
    assert_eq!(html(&app), r#"<p id="a">two</p>"#);

    second.set("name", "deux");
    assert_eq!(html(&app), r#"<p id="a">deux</p>"#);

    // the old object no longer feeds the output
    first.set("name", "uno");
    assert_eq!(html(&app), r#"<p id="a">deux</p>"#);
}

#[test]
fn sibling_write_patches_in_place() {
    let s = surface(r#"<ul id="a"><li>{{ a }}</li><li>{{ b }}</li></ul>"#);
    let mut app = App::new(s, Object::from_iter([("a", 1), ("b", 2)]));
    app.mount("#a").unwrap();
    app.set("b", 3).unwrap();
    let report = app.last_report();
    assert_eq!(report.replaced, 0);
    assert_eq!(report.patched, 5);
    assert_eq!(html(&app), r#"<ul id="a"><li>1</li><li>3</li></ul>"#);
}

#[test]
fn bind_error_keeps_previous_render() {
    let s = surface(r#"<p id="a">{{ user.name }}</p>"#);
    let mut app = App::new(s, Object::from_iter([("user", Object::from_iter([("name", "Ada")]))]));
    app.mount("#a").unwrap();
    let before = app.vnode();

    let err = app.set("user", Value::Null).unwrap_err();
    assert_eq!(
        err,
        AppError::Bind(BindError::UnresolvedPath { path: "user.name".into(), segment: "name".into() })
    );
    assert_eq!(html(&app), r#"<p id="a">Ada</p>"#);
    assert_eq!(app.vnode(), before);
    assert_eq!(app.render_count(), 1);

    // recovers on the next good write
    app.set("user", Object::from_iter([("name", "Bob")])).unwrap();
    assert_eq!(html(&app), r#"<p id="a">Bob</p>"#);
}

#[test]
fn set_reports_only_its_own_render_failure() {
    let s = surface(r#"<p id="a">{{ a.b.c }}</p>"#);
    let a = Object::from_iter([("b", Object::from_iter([("c", 1)]))]);
    let data = Object::from_iter([("a", Value::from(a.clone())), ("other", Value::from(1))]);
    let mut app = App::new(s, data);
    app.mount("#a").unwrap();

    // a nested write fails to render and the error is kept
    a.set("b", Value::Null);

    // an unrelated write renders nothing and reports nothing
    assert_eq!(app.set("other", 2), Ok(()));
    assert_eq!(app.render_count(), 1);
    assert_eq!(
        app.take_error(),
        Some(AppError::Bind(BindError::UnresolvedPath { path: "a.b.c".into(), segment: "c".into() }))
    );
    assert_eq!(app.take_error(), None);
}

#[test]
fn set_with_successful_render_clears_earlier_failure() {
    let s = surface(r#"<p id="a">{{ a.b.c }}</p>"#);
    let a = Object::from_iter([("b", Object::from_iter([("c", 1)]))]);
    let mut app = App::new(s, Object::from_iter([("a", a.clone())]));
    app.mount("#a").unwrap();

    a.set("b", Value::Null);
    let fresh = Object::from_iter([("b", Object::from_iter([("c", 5)]))]);
    assert_eq!(app.set("a", fresh), Ok(()));
    assert_eq!(html(&app), r#"<p id="a">5</p>"#);
    assert_eq!(app.take_error(), None);
}

#[test]
fn failed_first_render_leaves_target_in_place() {
    let s = surface(r#"<p id="a">{{ missing }}</p>"#);
    let mut app = App::new(s.clone(), Object::new());
    let err = app.mount("#a").unwrap_err();
    assert!(matches!(err, AppError::Bind(_)));
    assert!(!app.is_mounted());
    assert_eq!(app.el(), None);
    assert_eq!(s.borrow().html(), r#"<p id="a">{{ missing }}</p>"#);
}

#[test]
fn unknown_property_is_rejected() {
    let app = App::new(surface("<div></div>"), Object::from_iter([("msg", "hi")]));
    assert_eq!(app.get("nope"), Err(AppError::UnknownProperty("nope".into())));
    assert_eq!(app.set("nope", 1), Err(AppError::UnknownProperty("nope".into())));
    assert_eq!(app.keys(), &["msg".to_string()]);
}

#[test]
fn missing_target_is_reported() {
    let mut app = App::new(surface("<div></div>"), Object::new());
    assert_eq!(app.mount("#nowhere"), Err(AppError::TargetNotFound("#nowhere".into())));
}

#[test]
fn comment_target_cannot_compile() {
    let s = surface("<div><!-- note --></div>");
    let div = s.borrow().query("div").unwrap();
    let comment = s.borrow().children_of(div)[0];
    let mut app = App::new(s, Object::new());
    assert_eq!(
        app.mount(comment),
        Err(AppError::Compile(CompileError::UnsupportedRoot { kind: SourceKind::Comment }))
    );
}

#[test]
fn text_target_renders_as_text() {
    let s = surface("<div>{{ n }} left</div>");
    let div = s.borrow().query("div").unwrap();
    let text_node = s.borrow().children_of(div)[0];
    let mut app = App::new(s, Object::from_iter([("n", 3)]));
    app.mount(text_node).unwrap();
    assert_eq!(html(&app), "<div>3 left</div>");
    app.set("n", 2).unwrap();
    assert_eq!(html(&app), "<div>2 left</div>");
    assert_eq!(app.last_report().text_writes, 1);
}

#[test]
fn second_mount_is_rejected() {
    let mut app = App::new(surface(r#"<div id="a"></div>"#), Object::new());
    app.mount("#a").unwrap();
    assert_eq!(app.mount("#a"), Err(AppError::AlreadyMounted));
}

#[test]
fn options_with_el_mount_immediately() {
    let s = surface(r#"<section class="app">{{ n }}</section>"#);
    let app = App::with_options(
        s,
        Options { el: Some(".app".into()), data: Object::from_iter([("n", 1.5)]) },
    )
    .unwrap();
    assert!(app.is_mounted());
    assert_eq!(html(&app), r#"<section class="app">1.5</section>"#);
}

#[test]
fn options_without_el_stay_unmounted() {
    let app = App::with_options(surface("<div></div>"), Options::default()).unwrap();
    assert!(!app.is_mounted());
    assert_eq!(app.render_count(), 0);
}

#[test]
fn dropping_the_app_stops_rendering() {
    let s = surface(r#"<div id="a">{{msg}}</div>"#);
    let data = Object::from_iter([("msg", "hi")]);
    let mut app = App::new(s.clone(), data.clone());
    app.mount("#a").unwrap();
    drop(app);
    data.set("msg", "later");
    assert_eq!(s.borrow().html(), r#"<div id="a">hi</div>"#);
}
