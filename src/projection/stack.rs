//! Continuity stacks: nodes that share a continuity key and the lead among them.
//!
//! The most recently added member is the lead. When the lead leaves, the most recently added
//! remaining member is promoted. Stacks exist only while they have members.

use std::collections::BTreeMap;

use crate::projection::node::NodeId;

/// Lead change produced by a stack mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Promotion {
    pub key: String,
    /// `None` when the stack emptied.
    pub new_lead: Option<NodeId>,
    pub prev_lead: Option<NodeId>,
}

/// Outcome of moving a node between continuity keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Relink {
    /// Lead change in the stack the node left, if the node was its lead.
    pub left: Option<Promotion>,
    /// Lead change in the stack the node joined.
    pub joined: Option<Promotion>,
}

#[derive(Clone, Debug, Default)]
pub struct ContinuityStack {
    members: Vec<NodeId>,
    lead: Option<NodeId>,
    prev_lead: Option<NodeId>,
}

impl ContinuityStack {
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn lead(&self) -> Option<NodeId> {
        self.lead
    }

    pub fn prev_lead(&self) -> Option<NodeId> {
        self.prev_lead
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn add(&mut self, node: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        self.members.retain(|m| *m != node);
        self.members.push(node);
        self.set_lead(node)
    }

    fn set_lead(&mut self, node: NodeId) -> (Option<NodeId>, Option<NodeId>) {
        let prev = self.lead.filter(|l| *l != node);
        if prev.is_some() {
            self.prev_lead = prev;
        }
        self.lead = Some(node);
        (Some(node), prev)
    }

    /// Returns the lead change when `node` was the lead.
    fn remove(&mut self, node: NodeId) -> Option<(Option<NodeId>, Option<NodeId>)> {
        let before = self.members.len();
        self.members.retain(|m| *m != node);
        if self.members.len() == before {
            return None;
        }
        if self.prev_lead == Some(node) {
            self.prev_lead = None;
        }
        if self.lead != Some(node) {
            return None;
        }
        self.prev_lead = Some(node);
        self.lead = self.members.last().copied();
        Some((self.lead, Some(node)))
    }
}

#[derive(Clone, Debug, Default)]
pub struct ContinuityStackRegistry {
    stacks: BTreeMap<String, ContinuityStack>,
}

impl ContinuityStackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `node` under `key` (creating the stack) and make it the lead.
    ///
    /// Adding an existing member moves it to the most-recent position.
    pub fn add(&mut self, key: &str, node: NodeId) -> Promotion {
        let stack = self.stacks.entry(key.to_string()).or_default();
        let (new_lead, prev_lead) = stack.add(node);
        tracing::debug!(key, ?node, ?prev_lead, "continuity stack add");
        Promotion {
            key: key.to_string(),
            new_lead,
            prev_lead,
        }
    }

    /// Remove `node` from `key`. Returns the promotion when the lead changed; deletes the
    /// stack once it is empty.
    pub fn remove(&mut self, key: &str, node: NodeId) -> Option<Promotion> {
        let stack = self.stacks.get_mut(key)?;
        let change = stack.remove(node);
        if stack.is_empty() {
            self.stacks.remove(key);
        }
        let (new_lead, prev_lead) = change?;
        tracing::debug!(key, ?node, ?new_lead, "continuity stack lead removed");
        Some(Promotion {
            key: key.to_string(),
            new_lead,
            prev_lead,
        })
    }

    /// Make an existing member the lead.
    pub fn promote(&mut self, key: &str, node: NodeId) -> Option<Promotion> {
        let stack = self.stacks.get_mut(key)?;
        if !stack.contains(node) || stack.lead == Some(node) {
            return None;
        }
        let (new_lead, prev_lead) = stack.set_lead(node);
        Some(Promotion {
            key: key.to_string(),
            new_lead,
            prev_lead,
        })
    }

    /// Hand the lead from `node` to the most recent other member accepted by `eligible`.
    ///
    /// `node` stays a member. No-op when `node` is not the lead or nobody is eligible.
    pub fn relegate(
        &mut self,
        key: &str,
        node: NodeId,
        eligible: impl Fn(NodeId) -> bool,
    ) -> Option<Promotion> {
        let stack = self.stacks.get(key)?;
        if stack.lead != Some(node) {
            return None;
        }
        let next = stack
            .members
            .iter()
            .rev()
            .copied()
            .find(|m| *m != node && eligible(*m))?;
        self.promote(key, next)
    }

    /// Move `node` from `from` to `to` in one step.
    ///
    /// The node leaves the old stack (promoting its successor there) and becomes the lead of
    /// the new one. Identical keys are a no-op.
    pub fn relink(&mut self, node: NodeId, from: Option<&str>, to: Option<&str>) -> Relink {
        if from == to {
            return Relink::default();
        }
        let left = from.and_then(|key| self.remove(key, node));
        let joined = to.map(|key| self.add(key, node));
        Relink { left, joined }
    }

    pub fn lead(&self, key: &str) -> Option<NodeId> {
        self.stacks.get(key).and_then(ContinuityStack::lead)
    }

    pub fn stack(&self, key: &str) -> Option<&ContinuityStack> {
        self.stacks.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }

    /// Keys whose stack lists `node`.
    pub fn stacks_containing(&self, node: NodeId) -> Vec<&str> {
        self.stacks
            .iter()
            .filter(|(_, s)| s.contains(node))
            .map(|(k, _)| k.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/projection/stack.rs"]
mod tests;
