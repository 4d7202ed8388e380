use vireo_dom::{NodeId, VNode};

use crate::error::PatchError;
use crate::surface::Surface;

/// What the surface showed before a patch.
#[derive(Debug, Clone)]
pub enum Rendered {
    /// A raw surface node that has never been rendered over (first paint).
    Surface(NodeId),
    /// The resolved tree of the previous render, carrying live handles.
    Tree(VNode),
}

/// Work done by one patch.
///
/// `patched` counts same-position pairs compared (the root included),
/// `appended` and `removed` count child-list growth and shrinkage,
/// `replaced` counts subtrees rebuilt because tag or kind changed, `created`
/// counts surface nodes built and `text_writes` text replacements that were
/// not skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub created: usize,
    pub patched: usize,
    pub appended: usize,
    pub removed: usize,
    pub replaced: usize,
    pub text_writes: usize,
}

/// Bring the surface from `previous` to `next`, storing handles into `next`.
pub fn patch<S: Surface + ?Sized>(
    surface: &mut S,
    previous: &Rendered,
    next: &mut VNode,
) -> Result<PatchReport, PatchError> {
    let mut reconciler = Reconciler::new(surface);
    reconciler.patch(previous, next)?;
    let report = reconciler.finish();
    tracing::debug!(?report, "patched");
    Ok(report)
}

pub struct Reconciler<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    report: PatchReport,
}

impl<'s, S: Surface + ?Sized> Reconciler<'s, S> {
    pub fn new(surface: &'s mut S) -> Self {
        Reconciler { surface, report: PatchReport::default() }
    }

    pub fn finish(self) -> PatchReport {
        self.report
    }

    pub fn patch(&mut self, previous: &Rendered, next: &mut VNode) -> Result<(), PatchError> {
        match previous {
            Rendered::Surface(target) => self.mount(*target, next),
            Rendered::Tree(old) => self.patch_node(old, next),
        }
    }

    /// First paint: build `next` from scratch, put it where `target` is and
    /// drop `target`.
    pub fn mount(&mut self, target: NodeId, next: &mut VNode) -> Result<(), PatchError> {
        let parent = self.surface.parent_of(target).ok_or(PatchError::Detached(target))?;
        let reference = self.surface.next_sibling_of(target);
        let el = self.create_elm(next);
        self.surface.insert_before(parent, el, reference);
        self.surface.remove_child(parent, target);
        Ok(())
    }

    /// Same-level comparison of two nodes at the same position.
    pub fn patch_node(&mut self, old: &VNode, new: &mut VNode) -> Result<(), PatchError> {
        let el = old.el().ok_or(PatchError::MissingHandle)?;
        self.report.patched += 1;

        match (old, new) {
            (VNode::Text { value: old_text, .. }, VNode::Text { value: new_text, el: new_el }) => {
                *new_el = Some(el);
                if *old_text != *new_text {
                    self.surface.set_text(el, new_text);
                    self.report.text_writes += 1;
                }
                Ok(())
            }
            (
                VNode::Element { tag: old_tag, children: old_children, .. },
                VNode::Element { tag: new_tag, children: new_children, el: new_el, .. },
            ) if *old_tag == *new_tag => {
                *new_el = Some(el);
                self.update_children(el, old_children, new_children)
            }
            (old, new) => self.replace(old, el, new),
        }
    }

    /// Positional child reconciliation: pair up the common prefix, append what
    /// is new at the end, remove what is left over at the end.
    pub fn update_children(
        &mut self,
        parent: NodeId,
        old: &[VNode],
        new: &mut [VNode],
    ) -> Result<(), PatchError> {
        let common = old.len().min(new.len());
        for (o, n) in old.iter().zip(new.iter_mut()) {
            self.patch_node(o, n)?;
        }
        for n in new.iter_mut().skip(common) {
            let el = self.create_elm(n);
            self.surface.append_child(parent, el);
            self.report.appended += 1;
        }
        for o in old.iter().skip(common) {
            let el = o.el().ok_or(PatchError::MissingHandle)?;
            self.surface.remove_child(parent, el);
            self.report.removed += 1;
        }
        Ok(())
    }

    /// Materialize `vnode` and its subtree, recording every handle.
    pub fn create_elm(&mut self, vnode: &mut VNode) -> NodeId {
        self.report.created += 1;
        match vnode {
            VNode::Text { value, el } => {
                let id = self.surface.create_text(value);
                *el = Some(id);
                id
            }
            VNode::Element { tag, props, children, el } => {
                let id = self.surface.create_element(tag);
                for (k, v) in props.iter() {
                    self.surface.set_attribute(id, k, v);
                }
                for child in children.iter_mut() {
                    let child_id = self.create_elm(child);
                    self.surface.append_child(id, child_id);
                }
                *el = Some(id);
                id
            }
        }
    }

    // Tag or kind changed: rebuild the subtree in place.
    fn replace(&mut self, old: &VNode, el: NodeId, new: &mut VNode) -> Result<(), PatchError> {
        let parent = self.surface.parent_of(el).ok_or(PatchError::Detached(el))?;
        tracing::debug!(from = ?old.tag(), to = ?new.tag(), "replacing subtree");
        let fresh = self.create_elm(new);
        self.surface.insert_before(parent, fresh, Some(el));
        self.surface.remove_child(parent, el);
        self.report.replaced += 1;
        Ok(())
    }
}
