use vireo_dom::{Props, VNode, h, text};

use crate::error::CompileError;
use crate::source::SourceNode;

/// Compile a template-source tree into the placeholder-bearing AST.
///
/// Elements keep their name and every attribute; text keeps its literal
/// content with `{{ }}` spans unresolved. Child nodes of any other kind are
/// skipped. The result is never mutated afterwards and is re-bound on every
/// render.
pub fn compile(source: &SourceNode) -> Result<VNode, CompileError> {
    let ast = compile_node(source).ok_or(CompileError::UnsupportedRoot { kind: source.kind() })?;
    tracing::debug!(nodes = ast.count(), "compiled template");
    Ok(ast)
}

fn compile_node(source: &SourceNode) -> Option<VNode> {
    match source {
        SourceNode::Element { name, attributes, children } => {
            let mut props = Props::new();
            for (k, v) in attributes {
                props.attrs.insert(k.clone(), v.clone());
            }
            let children = children.iter().filter_map(compile_node).collect();
            Some(h(name.as_str(), props, children))
        }
        SourceNode::Text(t) => Some(text(t.as_str())),
        SourceNode::Comment(_) => None,
    }
}
