/// Kind of a template-source node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Element,
    Text,
    Comment,
}

/// A template as the host hands it over: elements with ordered attributes,
/// text, and anything else the host keeps around (comments).
#[derive(Debug, Clone, PartialEq)]
pub enum SourceNode {
    Element {
        name: String,
        attributes: Vec<(String, String)>,
        children: Vec<SourceNode>,
    },
    Text(String),
    Comment(String),
}

impl SourceNode {
    pub fn element(
        name: impl Into<String>,
        attributes: Vec<(&str, &str)>,
        children: Vec<SourceNode>,
    ) -> Self {
        SourceNode::Element {
            name: name.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            children,
        }
    }

    pub fn text(t: impl Into<String>) -> Self {
        SourceNode::Text(t.into())
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            SourceNode::Element { .. } => SourceKind::Element,
            SourceNode::Text(_) => SourceKind::Text,
            SourceNode::Comment(_) => SourceKind::Comment,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SourceNode::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &[(String, String)] {
        match self {
            SourceNode::Element { attributes, .. } => attributes,
            _ => &[],
        }
    }

    pub fn children(&self) -> &[SourceNode] {
        match self {
            SourceNode::Element { children, .. } => children,
            _ => &[],
        }
    }

    /// Literal text of a text node.
    pub fn text_content(&self) -> Option<&str> {
        match self {
            SourceNode::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, SourceNode::Text(t) if t.chars().all(char::is_whitespace))
    }
}
