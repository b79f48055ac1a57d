use std::collections::HashSet;

/// Index of a node in a [`ResourceTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Capabilities a resource node can carry.
///
/// Classification is by capability set, not by position in the tree: a node
/// is root-capable or config-capable because of what it is, wherever it
/// hangs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// The node is the top of a deployed unit
    Root,

    /// The node holds a unit's configuration, distinct from its deployed
    /// content
    Config,
}

/// A node in the resource tree.
///
/// The parent link is a back-reference only; a node does not own its parent.
#[derive(Debug, Clone)]
pub struct ResourceNode {
    name: String,
    parent: Option<NodeId>,
    capabilities: HashSet<Capability>,
}

impl ResourceNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Classification contract the configuration propagator walks through.
///
/// Keeping this a trait decouples ancestor search from the concrete tree
/// representation; [`ResourceTree`] is the arena-backed implementation.
pub trait ResourceClassifier {
    fn node(&self, id: NodeId) -> Option<&ResourceNode>;

    fn parent(&self, id: NodeId) -> Option<NodeId>;

    fn is_root(&self, id: NodeId) -> bool;

    fn is_config(&self, id: NodeId) -> bool;
}

/// Arena-backed resource tree.
///
/// Nodes refer to their parents by index, which keeps upward search cheap
/// and avoids cyclic ownership between parents and children.
#[derive(Debug, Default)]
pub struct ResourceTree {
    nodes: Vec<ResourceNode>,
}

impl ResourceTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node under `parent` (or as a top of the tree when `None`) and
    /// returns its index.
    pub fn add_node<I>(&mut self, name: impl Into<String>, parent: Option<NodeId>, capabilities: I) -> NodeId
    where
        I: IntoIterator<Item = Capability>,
    {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ResourceNode {
            name: name.into(),
            parent,
            capabilities: capabilities.into_iter().collect(),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl ResourceClassifier for ResourceTree {
    fn node(&self, id: NodeId) -> Option<&ResourceNode> {
        self.nodes.get(id.0)
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(ResourceNode::parent)
    }

    fn is_root(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| node.has_capability(Capability::Root))
    }

    fn is_config(&self, id: NodeId) -> bool {
        self.node(id)
            .is_some_and(|node| node.has_capability(Capability::Config))
    }
}
