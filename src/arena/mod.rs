use std::collections::{HashMap, HashSet};
use std::ops::{Index, IndexMut};

use crate::node::{Node, NodeKind};
use crate::{Error, Result};

/// Stable handle to a node inside an [`Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(idx, node)| (NodeId(idx), node))
    }

    /// Adds a node after checking its structural invariants: mapping
    /// content is key/value pairs, a document holds at most one root, and
    /// every referenced node already exists.
    pub fn add(&mut self, node: Node) -> Result<NodeId> {
        match node.kind() {
            NodeKind::Mapping if node.content.len() % 2 != 0 => {
                return Err(Error::invalid_node(format!(
                    "mapping content must hold key/value pairs, got {} nodes",
                    node.content.len()
                )));
            }
            NodeKind::Document if node.content.len() > 1 => {
                return Err(Error::invalid_node(format!(
                    "document holds at most one root node, got {}",
                    node.content.len()
                )));
            }
            NodeKind::Scalar | NodeKind::Alias if !node.content.is_empty() => {
                return Err(Error::invalid_node(format!(
                    "{} nodes have no content",
                    node.kind()
                )));
            }
            _ => {}
        }
        let dangling = node
            .content
            .iter()
            .chain(node.alias.iter())
            .any(|id| id.0 >= self.nodes.len());
        if dangling {
            return Err(Error::invalid_node("node refers to a missing node"));
        }
        Ok(self.alloc(node))
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// Appends `child` to a sequence or document.
    pub fn push(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check(child)?;
        let node = self.node_mut(parent)?;
        match node.kind() {
            NodeKind::Sequence => {}
            NodeKind::Document if node.content.is_empty() => {}
            NodeKind::Document => {
                return Err(Error::invalid_node("document already has a root node"));
            }
            kind => {
                return Err(Error::invalid_node(format!(
                    "cannot push a single child onto a {kind} node"
                )));
            }
        }
        node.content.push(child);
        Ok(())
    }

    pub fn push_pair(&mut self, mapping: NodeId, key: NodeId, value: NodeId) -> Result<()> {
        self.check(key)?;
        self.check(value)?;
        let node = self.node_mut(mapping)?;
        if !node.is_mapping() {
            return Err(Error::invalid_node(format!(
                "cannot push a pair onto a {} node",
                node.kind()
            )));
        }
        node.content.push(key);
        node.content.push(value);
        Ok(())
    }

    fn check(&self, id: NodeId) -> Result<()> {
        if id.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(Error::invalid_node("node refers to a missing node"))
        }
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| Error::invalid_node("node refers to a missing node"))
    }

    /// Key/value pairs of a mapping node.
    pub fn pairs(&self, mapping: NodeId) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self[mapping]
            .content
            .chunks_exact(2)
            .map(|pair| (pair[0], pair[1]))
    }

    /// Follows alias links until a non-alias node; `None` on a cycle made
    /// only of aliases.
    pub fn resolve_alias(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        for _ in 0..=self.nodes.len() {
            let node = self.get(current)?;
            match (node.kind(), node.alias) {
                (NodeKind::Alias, Some(target)) => current = target,
                (NodeKind::Alias, None) => return None,
                _ => return Some(current),
            }
        }
        None
    }

    /// Copies the subtree under `id` inside this arena. Aliases whose target
    /// lies in the subtree point at the copied target afterwards; aliases
    /// to nodes outside keep sharing the original.
    pub fn copy_subtree(&mut self, id: NodeId) -> NodeId {
        let mut memo = HashMap::new();
        let mut aliases = Vec::new();
        let copy = self.copy_structure(id, &mut memo, &mut aliases);
        for alias_id in aliases {
            if let Some(target) = self.nodes[alias_id.0].alias {
                if let Some(&mapped) = memo.get(&target) {
                    self.nodes[alias_id.0].alias = Some(mapped);
                }
            }
        }
        copy
    }

    fn copy_structure(
        &mut self,
        id: NodeId,
        memo: &mut HashMap<NodeId, NodeId>,
        aliases: &mut Vec<NodeId>,
    ) -> NodeId {
        if let Some(&done) = memo.get(&id) {
            return done;
        }
        let mut node = self.nodes[id.0].clone();
        let children = std::mem::take(&mut node.content);
        let has_alias = node.alias.is_some();
        let copy = self.alloc(node);
        memo.insert(id, copy);
        if has_alias {
            aliases.push(copy);
        }
        let content = children
            .into_iter()
            .map(|child| self.copy_structure(child, memo, aliases))
            .collect();
        self.nodes[copy.0].content = content;
        copy
    }

    /// Structural equality ignoring source positions. Pairs already under
    /// comparison count as equal, so cyclic graphs terminate.
    pub fn structurally_eq(&self, a: NodeId, other: &Arena, b: NodeId) -> bool {
        let mut visited = HashSet::new();
        self.eq_inner(a, other, b, &mut visited)
    }

    fn eq_inner(
        &self,
        a: NodeId,
        other: &Arena,
        b: NodeId,
        visited: &mut HashSet<(NodeId, NodeId)>,
    ) -> bool {
        if !visited.insert((a, b)) {
            return true;
        }
        let (Some(left), Some(right)) = (self.get(a), other.get(b)) else {
            return false;
        };
        let same_fields = left.kind() == right.kind()
            && left.style == right.style
            && left.tag == right.tag
            && left.value == right.value
            && left.anchor == right.anchor
            && left.head_comment == right.head_comment
            && left.line_comment == right.line_comment
            && left.foot_comment == right.foot_comment
            && left.content.len() == right.content.len();
        if !same_fields {
            return false;
        }
        let aliases_match = match (left.alias, right.alias) {
            (None, None) => true,
            (Some(x), Some(y)) => self.eq_inner(x, other, y, visited),
            _ => false,
        };
        aliases_match
            && left
                .content
                .iter()
                .zip(right.content.iter())
                .all(|(x, y)| self.eq_inner(*x, other, *y, visited))
    }
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

/// A node graph with a designated root, usually a document node.
#[derive(Debug, Clone)]
pub struct Tree {
    pub arena: Arena,
    pub root: NodeId,
}

impl Tree {
    pub fn new(arena: Arena, root: NodeId) -> Self {
        Self { arena, root }
    }

    /// A document with no content.
    pub fn empty_document() -> Self {
        let mut arena = Arena::new();
        let root = arena.alloc(Node::document());
        Self { arena, root }
    }

    /// Wraps a single node as the root of a fresh document.
    pub fn document_with(node: Node) -> Result<Self> {
        let mut tree = Self::empty_document();
        let child = tree.arena.add(node)?;
        tree.arena.push(tree.root, child)?;
        Ok(tree)
    }

    pub fn root_node(&self) -> &Node {
        &self.arena[self.root]
    }

    /// The root value: the document's only child, or the root itself when
    /// the tree is not rooted at a document.
    pub fn content_root(&self) -> Option<NodeId> {
        let root = self.root_node();
        if root.is_document() {
            root.content.first().copied()
        } else {
            Some(self.root)
        }
    }

    /// Value under the scalar key `key` of the mapping `mapping`.
    pub fn get_key(&self, mapping: NodeId, key: &str) -> Option<NodeId> {
        let mapping = self.arena.resolve_alias(mapping)?;
        if !self.arena[mapping].is_mapping() {
            return None;
        }
        self.arena.pairs(mapping).find_map(|(k, v)| {
            let k = self.arena.resolve_alias(k)?;
            (self.arena[k].is_scalar() && self.arena[k].value == key).then_some(v)
        })
    }

    /// Copies every node reachable from the root into a new tree. Aliases
    /// that shared a target still share the copy of that target.
    pub fn deep_copy(&self) -> Tree {
        let mut arena = Arena::with_capacity(self.arena.len());
        let mut memo = HashMap::new();
        let mut pending = Vec::new();
        let root = copy_across(&self.arena, self.root, &mut arena, &mut memo, &mut pending);
        while let Some(alias_id) = pending.pop() {
            let Some(target) = arena[alias_id].alias else {
                continue;
            };
            let mapped = match memo.get(&target) {
                Some(&mapped) => mapped,
                None => copy_across(&self.arena, target, &mut arena, &mut memo, &mut pending),
            };
            arena[alias_id].alias = Some(mapped);
        }
        Tree { arena, root }
    }

    pub fn structurally_eq(&self, other: &Tree) -> bool {
        self.arena
            .structurally_eq(self.root, &other.arena, other.root)
    }
}

impl Index<NodeId> for Tree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }
}

impl IndexMut<NodeId> for Tree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.arena[id]
    }
}

// Alias fields keep pointing into `src` until the caller remaps them.
fn copy_across(
    src: &Arena,
    id: NodeId,
    dst: &mut Arena,
    memo: &mut HashMap<NodeId, NodeId>,
    pending: &mut Vec<NodeId>,
) -> NodeId {
    if let Some(&done) = memo.get(&id) {
        return done;
    }
    let mut node = src[id].clone();
    let children = std::mem::take(&mut node.content);
    let has_alias = node.alias.is_some();
    let copy = dst.alloc(node);
    memo.insert(id, copy);
    if has_alias {
        pending.push(copy);
    }
    let content = children
        .into_iter()
        .map(|child| copy_across(src, child, dst, memo, pending))
        .collect();
    dst[copy].content = content;
    copy
}
