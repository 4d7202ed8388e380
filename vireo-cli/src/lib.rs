use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Context, Result, anyhow, bail};
use vireo_core::{Array, Object, Value};
use vireo_dom::VNode;
use vireo_renderer::{App, MemorySurface, NodeData, Target};
use vireo_template::{compile, parse_root, placeholders};

/// A `path=value` mutation given on the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub path: String,
    pub value: Value,
}

/// Parse `user.name="Ann"`. The right-hand side is read as JSON; anything that
/// is not valid JSON is taken as a plain string.
pub fn parse_assignment(arg: &str) -> Result<Assignment> {
    let (path, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected PATH=VALUE, got `{arg}`"))?;
    let path = path.trim();
    if path.is_empty() || path.split('.').any(str::is_empty) {
        bail!("invalid property path `{path}`");
    }
    let value = match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => json_to_value(&json),
        Err(_) => Value::from(raw),
    };
    Ok(Assignment { path: path.to_string(), value })
}

pub fn json_to_value(json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s.as_str()),
        serde_json::Value::Array(items) => {
            Value::Array(Array::from(items.iter().map(json_to_value).collect::<Vec<_>>()))
        }
        serde_json::Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.as_str(), json_to_value(v))).collect())
        }
    }
}

/// Instance data from JSON text. The top level has to be an object.
pub fn parse_data(json: &str) -> Result<Object> {
    let parsed: serde_json::Value = serde_json::from_str(json).context("invalid data JSON")?;
    match json_to_value(&parsed) {
        Value::Object(obj) => Ok(obj),
        other => bail!("data must be a JSON object, got `{other}`"),
    }
}

/// Inputs of one `vireo render` invocation.
#[derive(Debug, Default)]
pub struct RenderRequest {
    pub markup: String,
    pub data: Object,
    /// Mount selector; the first element of the document when absent.
    pub el: Option<String>,
    pub sets: Vec<Assignment>,
}

/// Mount the template, then apply each assignment in order. Returns the
/// document HTML after the first render and after every assignment.
pub fn render(request: RenderRequest) -> Result<Vec<String>> {
    let surface = MemorySurface::from_html(&request.markup).context("failed to parse template")?;
    let surface = Rc::new(RefCell::new(surface));
    let mut app = App::new(surface.clone(), request.data);
    match request.el.as_deref() {
        Some(sel) => app.mount(sel)?,
        None => {
            let first = first_element(&surface.borrow())
                .ok_or_else(|| anyhow!("template has no element to mount"))?;
            app.mount(Target::Node(first))?
        }
    }

    let mut snapshots = vec![surface.borrow().html()];
    for assignment in &request.sets {
        assign(&app, assignment)
            .with_context(|| format!("failed to apply `{}`", assignment.path))?;
        snapshots.push(surface.borrow().html());
    }
    Ok(snapshots)
}

/// Write one assignment through the reactive data, re-rendering as needed.
pub fn assign(app: &App<MemorySurface>, assignment: &Assignment) -> Result<()> {
    let mut segments: Vec<&str> = assignment.path.split('.').collect();
    let last = segments.pop().ok_or_else(|| anyhow!("empty path"))?;
    if segments.is_empty() {
        app.set(last, assignment.value.clone())?;
        return Ok(());
    }

    let mut parent = app.data().clone();
    for (i, segment) in segments.iter().enumerate() {
        let next = match parent.peek(segment) {
            Some(Value::Object(obj)) => obj,
            Some(other) => bail!("`{}` is {other:?}, not an object", segments[..=i].join(".")),
            None => bail!("`{}` does not exist", segments[..=i].join(".")),
        };
        parent = next;
    }
    tracing::debug!(path = %assignment.path, value = %assignment.value, "assign");
    parent.set(last, assignment.value.clone());
    match app.take_error() {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}

/// Compile a template and list its placeholder expressions in document order.
pub fn check(markup: &str) -> Result<Vec<String>> {
    let root = parse_root(markup).context("failed to parse template")?;
    let ast = compile(&root)?;
    let mut found = Vec::new();
    collect_placeholders(&ast, &mut found);
    Ok(found)
}

fn collect_placeholders(node: &VNode, out: &mut Vec<String>) {
    match node {
        VNode::Text { value, .. } => out.extend(placeholders(value).into_iter().map(String::from)),
        VNode::Element { children, .. } => {
            for child in children {
                collect_placeholders(child, out);
            }
        }
    }
}

fn first_element(surface: &MemorySurface) -> Option<vireo_dom::NodeId> {
    surface
        .children_of(surface.root())
        .iter()
        .copied()
        .find(|&id| matches!(surface.data(id), Some(NodeData::Element { .. })))
}
