use vireo_dom::NodeId;
use vireo_template::SourceNode;

/// The rendering surface the reconciler writes to.
///
/// Backends own the concrete node objects and hand out [`NodeId`]s. The
/// reconciler never builds surface nodes any other way.
pub trait Surface {
    fn create_element(&mut self, tag: &str) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;
    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);
    fn append_child(&mut self, parent: NodeId, child: NodeId);
    /// Insert `node` before `reference`; `None` appends.
    fn insert_before(&mut self, parent: NodeId, node: NodeId, reference: Option<NodeId>);
    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    fn parent_of(&self, node: NodeId) -> Option<NodeId>;
    fn next_sibling_of(&self, node: NodeId) -> Option<NodeId>;
    fn text_of(&self, node: NodeId) -> Option<String>;
    fn set_text(&mut self, node: NodeId, value: &str);

    /// Resolve a mount selector (`#id`, `.class` or a tag name).
    fn query(&self, selector: &str) -> Option<NodeId>;
    /// Read a node back as template source, so it can serve as its own
    /// template.
    fn source_tree(&self, node: NodeId) -> Option<SourceNode>;
}
