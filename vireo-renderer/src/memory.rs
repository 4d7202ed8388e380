//! Arena-backed in-memory surface.
//!
//! Used by the tests and the CLI. Every mutation the reconciler performs is
//! appended to an operation log, so callers can assert on exactly what a
//! render did to the surface.

use indexmap::IndexMap;
use vireo_dom::NodeId;
use vireo_template::{ParseError, SourceNode, parse_template};

use crate::surface::Surface;

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Element {
        tag: String,
        attrs: IndexMap<String, String>,
    },
    Text(String),
    Comment(String),
}

/// One recorded surface mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    CreateElement(NodeId, String),
    CreateText(NodeId, String),
    SetAttribute(NodeId, String, String),
    Append { parent: NodeId, child: NodeId },
    InsertBefore { parent: NodeId, node: NodeId, reference: Option<NodeId> },
    Remove { parent: NodeId, child: NodeId },
    SetText(NodeId, String),
}

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct MemorySurface {
    nodes: Vec<Slot>,
    ops: Vec<Op>,
}

impl Default for MemorySurface {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySurface {
    /// An empty document.
    pub fn new() -> Self {
        MemorySurface {
            nodes: vec![Slot { data: NodeData::Document, parent: None, children: Vec::new() }],
            ops: Vec::new(),
        }
    }

    /// A document holding the parsed markup. Loading is not recorded in the
    /// operation log.
    pub fn from_html(markup: &str) -> Result<Self, ParseError> {
        let mut surface = Self::new();
        let root = surface.root();
        for node in parse_template(markup)? {
            surface.load(root, &node);
        }
        Ok(surface)
    }

    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    /// Materialize a source tree under `parent` without logging.
    pub fn load(&mut self, parent: NodeId, source: &SourceNode) -> NodeId {
        let data = match source {
            SourceNode::Element { name, attributes, .. } => NodeData::Element {
                tag: name.clone(),
                attrs: attributes.iter().cloned().collect(),
            },
            SourceNode::Text(t) => NodeData::Text(t.clone()),
            SourceNode::Comment(c) => NodeData::Comment(c.clone()),
        };
        let id = self.alloc(data);
        self.attach(parent, id, None);
        for child in source.children() {
            self.load(id, child);
        }
        id
    }

    pub fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.slot(node).map(|s| &s.data)
    }

    pub fn children_of(&self, node: NodeId) -> &[NodeId] {
        self.slot(node).map_or(&[], |s| s.children.as_slice())
    }

    pub fn tag_of(&self, node: NodeId) -> Option<&str> {
        match self.data(node)? {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        match self.data(node)? {
            NodeData::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut cur = Some(node);
        while let Some(id) = cur {
            if id == self.root() {
                return true;
            }
            cur = self.slot(id).and_then(|s| s.parent);
        }
        false
    }

    /// Number of nodes ever allocated, attached or not.
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    pub fn take_ops(&mut self) -> Vec<Op> {
        std::mem::take(&mut self.ops)
    }

    /// Serialize the whole document.
    pub fn html(&self) -> String {
        self.inner_html(self.root())
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children_of(node) {
            self.write_html(child, &mut out);
        }
        out
    }

    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(slot) = self.slot(node) else { return };
        match &slot.data {
            NodeData::Document => {
                for &child in &slot.children {
                    self.write_html(child, out);
                }
            }
            NodeData::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    escape_into(v, true, out);
                    out.push('"');
                }
                out.push('>');
                if slot.children.is_empty() && VOID_TAGS.contains(&tag.to_ascii_lowercase().as_str())
                {
                    return;
                }
                for &child in &slot.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
            NodeData::Text(t) => escape_into(t, false, out),
            NodeData::Comment(c) => {
                out.push_str("<!--");
                out.push_str(c);
                out.push_str("-->");
            }
        }
    }

    fn slot(&self, node: NodeId) -> Option<&Slot> {
        self.nodes.get(node.index())
    }

    fn slot_mut(&mut self, node: NodeId) -> Option<&mut Slot> {
        self.nodes.get_mut(node.index())
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(Slot { data, parent: None, children: Vec::new() });
        id
    }

    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.slot(node).and_then(|s| s.parent) else { return };
        if let Some(p) = self.slot_mut(parent) {
            p.children.retain(|&c| c != node);
        }
        if let Some(s) = self.slot_mut(node) {
            s.parent = None;
        }
    }

    // Moves `node` under `parent`, before `reference` when it is a child of
    // `parent`, at the end otherwise.
    fn attach(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        if self.slot(parent).is_none() || self.slot(node).is_none() || parent == node {
            tracing::warn!(%parent, %node, "attach with unknown node ignored");
            return;
        }
        self.detach(node);
        let Some(p) = self.slot_mut(parent) else { return };
        let at = reference.and_then(|r| p.children.iter().position(|&c| c == r));
        if reference.is_some() && at.is_none() {
            tracing::warn!(%parent, ?reference, "reference is not a child, appending");
        }
        match at {
            Some(i) => p.children.insert(i, node),
            None => p.children.push(node),
        }
        if let Some(s) = self.slot_mut(node) {
            s.parent = Some(parent);
        }
    }

    fn find(&self, node: NodeId, pred: &dyn Fn(&NodeData) -> bool) -> Option<NodeId> {
        let slot = self.slot(node)?;
        if pred(&slot.data) {
            return Some(node);
        }
        slot.children.iter().find_map(|&c| self.find(c, pred))
    }
}

impl Surface for MemorySurface {
    fn create_element(&mut self, tag: &str) -> NodeId {
        let id = self.alloc(NodeData::Element { tag: tag.to_string(), attrs: IndexMap::new() });
        self.ops.push(Op::CreateElement(id, tag.to_string()));
        id
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.alloc(NodeData::Text(text.to_string()));
        self.ops.push(Op::CreateText(id, text.to_string()));
        id
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        match self.slot_mut(node).map(|s| &mut s.data) {
            Some(NodeData::Element { attrs, .. }) => {
                attrs.insert(name.to_string(), value.to_string());
            }
            _ => {
                tracing::warn!(%node, name, "set_attribute on a non-element ignored");
                return;
            }
        }
        self.ops.push(Op::SetAttribute(node, name.to_string(), value.to_string()));
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.attach(parent, child, None);
        self.ops.push(Op::Append { parent, child });
    }

    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>) {
        self.attach(parent, node, reference);
        self.ops.push(Op::InsertBefore { parent, node, reference });
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.parent_of(child) != Some(parent) {
            tracing::warn!(%parent, %child, "remove_child of a non-child ignored");
            return;
        }
        self.detach(child);
        self.ops.push(Op::Remove { parent, child });
    }

    fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.slot(node)?.parent
    }

    fn next_sibling_of(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent_of(node)?;
        let siblings = self.children_of(parent);
        let i = siblings.iter().position(|&c| c == node)?;
        siblings.get(i + 1).copied()
    }

    fn text_of(&self, node: NodeId) -> Option<String> {
        let slot = self.slot(node)?;
        match &slot.data {
            NodeData::Text(t) => Some(t.clone()),
            NodeData::Comment(_) => None,
            NodeData::Document | NodeData::Element { .. } => Some(
                slot.children
                    .iter()
                    .filter_map(|&c| match self.data(c) {
                        Some(NodeData::Comment(_)) => None,
                        _ => self.text_of(c),
                    })
                    .collect(),
            ),
        }
    }

    fn set_text(&mut self, node: NodeId, value: &str) {
        let is_text = match self.data(node) {
            Some(NodeData::Text(_)) => true,
            Some(NodeData::Element { .. }) => false,
            _ => {
                tracing::warn!(%node, "set_text on unsupported node ignored");
                return;
            }
        };
        if is_text {
            if let Some(s) = self.slot_mut(node) {
                s.data = NodeData::Text(value.to_string());
            }
        } else {
            // text content of an element replaces all of its children
            let children = self.children_of(node).to_vec();
            for c in children {
                self.detach(c);
            }
            if !value.is_empty() {
                let t = self.alloc(NodeData::Text(value.to_string()));
                self.attach(node, t, None);
            }
        }
        self.ops.push(Op::SetText(node, value.to_string()));
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        let selector = selector.trim();
        let root = self.root();
        if let Some(id) = selector.strip_prefix('#') {
            self.find(root, &|d| {
                matches!(d, NodeData::Element { attrs, .. } if attrs.get("id").is_some_and(|v| v == id))
            })
        } else if let Some(class) = selector.strip_prefix('.') {
            self.find(root, &|d| {
                matches!(d, NodeData::Element { attrs, .. }
                    if attrs.get("class").is_some_and(|v| v.split_whitespace().any(|c| c == class)))
            })
        } else {
            self.find(root, &|d| {
                matches!(d, NodeData::Element { tag, .. } if tag.eq_ignore_ascii_case(selector))
            })
        }
    }

    fn source_tree(&self, node: NodeId) -> Option<SourceNode> {
        let slot = self.slot(node)?;
        let source = match &slot.data {
            NodeData::Document => return None,
            NodeData::Element { tag, attrs } => SourceNode::Element {
                name: tag.clone(),
                attributes: attrs.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
                children: slot
                    .children
                    .iter()
                    .filter_map(|&c| self.source_tree(c))
                    .collect(),
            },
            NodeData::Text(t) => SourceNode::Text(t.clone()),
            NodeData::Comment(c) => SourceNode::Comment(c.clone()),
        };
        Some(source)
    }
}

fn escape_into(s: &str, attr: bool, out: &mut String) {
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
}
