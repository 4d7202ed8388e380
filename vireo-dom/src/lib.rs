use indexmap::IndexMap;

/// Handle to a node that lives on a rendering surface.
///
/// The surface hands these out; a VNode only remembers which surface node it
/// was materialized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index)
    }
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub enum VNode {
    Element {
        tag: String,
        props: Props,
        children: Vec<VNode>,
        el: Option<NodeId>,
    },
    Text {
        value: String,
        el: Option<NodeId>,
    },
}

impl VNode {
    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Text { .. } => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            VNode::Text { .. } => &[],
        }
    }

    pub fn text_value(&self) -> Option<&str> {
        match self {
            VNode::Text { value, .. } => Some(value),
            VNode::Element { .. } => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, VNode::Text { .. })
    }

    /// The surface node this VNode was materialized into, if any.
    pub fn el(&self) -> Option<NodeId> {
        match self {
            VNode::Element { el, .. } | VNode::Text { el, .. } => *el,
        }
    }

    pub fn set_el(&mut self, id: NodeId) {
        match self {
            VNode::Element { el, .. } | VNode::Text { el, .. } => *el = Some(id),
        }
    }

    /// Copy with every surface handle dropped.
    pub fn detached(&self) -> VNode {
        match self {
            VNode::Element { tag, props, children, .. } => VNode::Element {
                tag: tag.clone(),
                props: props.clone(),
                children: children.iter().map(VNode::detached).collect(),
                el: None,
            },
            VNode::Text { value, .. } => VNode::Text { value: value.clone(), el: None },
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn count(&self) -> usize {
        1 + self.children().iter().map(VNode::count).sum::<usize>()
    }
}

/// Structural equality: surface handles are not compared.
impl PartialEq for VNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                VNode::Element { tag: tag_a, props: props_a, children: children_a, .. },
                VNode::Element { tag: tag_b, props: props_b, children: children_b, .. },
            ) => tag_a == tag_b && props_a == props_b && children_a == children_b,
            (VNode::Text { value: a, .. }, VNode::Text { value: b, .. }) => a == b,
            _ => false,
        }
    }
}

/// Element attributes. Keys are unique; later writes replace earlier ones.
/// Source order is kept so materialization is deterministic, but it does not
/// take part in equality.
#[derive(Debug, Clone, Default)]
pub struct Props {
    pub attrs: IndexMap<String, String>,
}

impl Props {
    pub fn new() -> Self {
        Self { attrs: IndexMap::new() }
    }
    pub fn set(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.attrs.insert(k.into(), v.into());
        self
    }
    pub fn get(&self, k: &str) -> Option<&str> {
        self.attrs.get(k).map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.attrs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.attrs.len() == other.attrs.len()
            && self.attrs.iter().all(|(k, v)| other.attrs.get(k) == Some(v))
    }
}

// Allow concise props creation
impl From<()> for Props {
    fn from(_: ()) -> Self {
        Props::default()
    }
}
impl From<Vec<(&str, &str)>> for Props {
    fn from(v: Vec<(&str, &str)>) -> Self {
        let mut p = Props::new();
        for (k, v) in v {
            p.attrs.insert(k.to_string(), v.to_string());
        }
        p
    }
}
impl From<Vec<(String, String)>> for Props {
    fn from(v: Vec<(String, String)>) -> Self {
        Props { attrs: v.into_iter().collect() }
    }
}

pub fn h(tag: impl Into<String>, props: impl Into<Props>, children: Vec<VNode>) -> VNode {
    VNode::Element {
        tag: tag.into(),
        props: props.into(),
        children,
        el: None,
    }
}
pub fn text(t: impl Into<String>) -> VNode {
    VNode::Text { value: t.into(), el: None }
}
