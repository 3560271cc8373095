use crate::projection::node::NodeId;
use crate::projection::tree::ProjectionTree;

/// Decides whether a node may use the cheap interpolated transform.
///
/// The cheap path is only valid when nothing else in the node's lineage is being projected and
/// the transition does not resume from another node's recorded position.
#[derive(Clone, Copy, Debug)]
pub struct HardwareAccelerationAnalyzer<'a> {
    tree: &'a ProjectionTree,
}

impl<'a> HardwareAccelerationAnalyzer<'a> {
    pub fn new(tree: &'a ProjectionTree) -> Self {
        Self { tree }
    }

    /// `false` for unknown nodes.
    pub fn can_use_hardware_acceleration(&self, id: NodeId) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        node.resume_from.is_none()
            && !self.has_projecting_ancestor(id)
            && !self.has_projecting_descendant(id)
    }

    pub fn has_projecting_ancestor(&self, id: NodeId) -> bool {
        let mut cur = self.tree.get(id).and_then(|n| n.parent);
        while let Some(pid) = cur {
            let Some(parent) = self.tree.get(pid) else {
                return false;
            };
            if parent.is_projecting() {
                return true;
            }
            cur = parent.parent;
        }
        false
    }

    pub fn has_projecting_descendant(&self, id: NodeId) -> bool {
        let Some(node) = self.tree.get(id) else {
            return false;
        };
        let mut stack: Vec<NodeId> = node.children.clone();
        while let Some(cid) = stack.pop() {
            let Some(child) = self.tree.get(cid) else {
                continue;
            };
            if child.is_projecting() {
                return true;
            }
            stack.extend(child.children.iter().copied());
        }
        false
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/acceleration.rs"]
mod tests;
