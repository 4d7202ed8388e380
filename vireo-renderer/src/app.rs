use std::cell::RefCell;
use std::rc::Rc;

use vireo_core::{Object, Value, Watcher, observe_object};
use vireo_dom::{NodeId, VNode};
use vireo_template::{bind, compile};

use crate::error::AppError;
use crate::patch::{PatchReport, Rendered, patch};
use crate::surface::Surface;

/// Where to mount: a selector resolved through [`Surface::query`], or a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Selector(&'a str),
    Node(NodeId),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(s: &'a str) -> Self {
        Target::Selector(s)
    }
}

impl From<NodeId> for Target<'_> {
    fn from(n: NodeId) -> Self {
        Target::Node(n)
    }
}

/// Construction options. With `el` set the instance mounts right away.
#[derive(Debug, Default)]
pub struct Options {
    pub el: Option<String>,
    pub data: Object,
}

#[derive(Default)]
struct RenderState {
    rendered: Option<Rendered>,
    last_error: Option<AppError>,
    last_report: PatchReport,
    renders: usize,
    // render cycles started, failed ones included
    cycles: usize,
}

/// Root instance: owns the data, the compiled template and the one watcher
/// that re-renders on change.
///
/// Every write to a data slot the template reads re-renders synchronously
/// before the write returns. Do not hold a borrow of the surface across a
/// write.
pub struct App<S: Surface + 'static> {
    surface: Rc<RefCell<S>>,
    data: Object,
    keys: Vec<String>,
    ast: Option<Rc<VNode>>,
    watcher: Option<Watcher>,
    state: Rc<RefCell<RenderState>>,
}

impl<S: Surface + 'static> App<S> {
    /// Observe `data` and remember its top-level keys. Nothing renders until
    /// [`App::mount`].
    pub fn new(surface: Rc<RefCell<S>>, data: Object) -> Self {
        observe_object(&data);
        let keys = data.keys();
        App {
            surface,
            data,
            keys,
            ast: None,
            watcher: None,
            state: Rc::new(RefCell::new(RenderState::default())),
        }
    }

    pub fn with_options(surface: Rc<RefCell<S>>, options: Options) -> Result<Self, AppError> {
        let mut app = App::new(surface, options.data);
        if let Some(el) = options.el.as_deref() {
            app.mount(el)?;
        }
        Ok(app)
    }

    /// Compile the target's own markup as the template, replace the target
    /// with the first render and start watching.
    pub fn mount<'a>(&mut self, target: impl Into<Target<'a>>) -> Result<(), AppError> {
        if self.watcher.is_some() {
            return Err(AppError::AlreadyMounted);
        }
        let target = target.into();
        let (node, source) = {
            let surface = self.surface.borrow();
            let node = match target {
                Target::Selector(sel) => surface
                    .query(sel)
                    .ok_or_else(|| AppError::TargetNotFound(sel.to_string()))?,
                Target::Node(node) => node,
            };
            let source = surface
                .source_tree(node)
                .ok_or_else(|| AppError::TargetNotFound(node.to_string()))?;
            (node, source)
        };
        let ast = Rc::new(compile(&source)?);
        self.state.borrow_mut().rendered = Some(Rendered::Surface(node));

        let watcher = {
            let ast = ast.clone();
            let data = self.data.clone();
            let surface = self.surface.clone();
            let state = self.state.clone();
            Watcher::new(move || {
                let result = render(&ast, &data, &surface, &state);
                let mut st = state.borrow_mut();
                st.cycles += 1;
                match result {
                    Ok(report) => {
                        st.renders += 1;
                        st.last_report = report;
                        st.last_error = None;
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "render failed");
                        st.last_error = Some(err);
                    }
                }
            })
        };

        // A failed first paint leaves the target in place; dropping the
        // watcher unsubscribes it everywhere.
        let first = self.state.borrow_mut().last_error.take();
        if let Some(err) = first {
            self.state.borrow_mut().rendered = None;
            return Err(err);
        }
        tracing::debug!(%node, "mounted");
        self.ast = Some(ast);
        self.watcher = Some(watcher);
        Ok(())
    }

    /// Read a top-level data property.
    pub fn get(&self, key: &str) -> Result<Value, AppError> {
        self.check_key(key)?;
        Ok(self.data.get(key).unwrap_or(Value::Null))
    }

    /// Write a top-level data property. Returns the render error if a
    /// re-render caused by this write failed. Failures from earlier writes
    /// stay with [`App::take_error`].
    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), AppError> {
        self.check_key(key)?;
        let before = self.state.borrow().cycles;
        self.data.set(key, value);
        let mut st = self.state.borrow_mut();
        if st.cycles == before {
            return Ok(());
        }
        match st.last_error.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Error of the last failed re-render, if it has not been reported yet.
    /// Writes through nested objects surface their failures here.
    pub fn take_error(&self) -> Option<AppError> {
        self.state.borrow_mut().last_error.take()
    }

    pub fn data(&self) -> &Object {
        &self.data
    }

    /// Top-level keys collected at construction.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn surface(&self) -> &Rc<RefCell<S>> {
        &self.surface
    }

    pub fn ast(&self) -> Option<&VNode> {
        self.ast.as_deref()
    }

    pub fn watcher(&self) -> Option<&Watcher> {
        self.watcher.as_ref()
    }

    pub fn is_mounted(&self) -> bool {
        self.watcher.is_some()
    }

    /// The tree of the last successful render.
    pub fn vnode(&self) -> Option<VNode> {
        match self.state.borrow().rendered.as_ref()? {
            Rendered::Tree(tree) => Some(tree.clone()),
            Rendered::Surface(_) => None,
        }
    }

    /// Surface node currently showing the root of the template.
    pub fn el(&self) -> Option<NodeId> {
        match self.state.borrow().rendered.as_ref()? {
            Rendered::Tree(tree) => tree.el(),
            Rendered::Surface(node) => Some(*node),
        }
    }

    /// Successful render cycles so far.
    pub fn render_count(&self) -> usize {
        self.state.borrow().renders
    }

    pub fn last_report(&self) -> PatchReport {
        self.state.borrow().last_report
    }

    fn check_key(&self, key: &str) -> Result<(), AppError> {
        if self.keys.iter().any(|k| k == key) {
            Ok(())
        } else {
            Err(AppError::UnknownProperty(key.to_string()))
        }
    }
}

// One render cycle. Binding happens before anything is borrowed, so a failing
// bind commits nothing and leaves the previous render in place.
fn render<S: Surface>(
    ast: &VNode,
    data: &Object,
    surface: &RefCell<S>,
    state: &RefCell<RenderState>,
) -> Result<PatchReport, AppError> {
    let mut next = bind(ast, data)?;
    let previous = state.borrow_mut().rendered.take().ok_or(AppError::NotMounted)?;
    let outcome = patch(&mut *surface.borrow_mut(), &previous, &mut next);
    let mut st = state.borrow_mut();
    match outcome {
        Ok(report) => {
            st.rendered = Some(Rendered::Tree(next));
            Ok(report)
        }
        Err(err) => {
            st.rendered = Some(previous);
            Err(err.into())
        }
    }
}
