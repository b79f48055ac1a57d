pub mod watcher;

use anyhow::Result;

use crate::tree::{NodeId, ResourceNode};
use crate::types::state::ResourceState;

/// External boundary that applies configuration updates to deployed units.
///
/// Implementations own their own synchronization when updates race and must
/// be idempotent under repeated identical calls. The owning root may be
/// absent when the updated subtree has no root-capable ancestor.
pub trait DeploymentNotifier: Send + Sync {
    fn update_configuration(&self, root: Option<&ResourceNode>, state: &ResourceState)
        -> Result<()>;
}

/// Kind of an outbound resource response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Created,
    Read,
    Updated,
    Deleted,
}

/// An outbound response flowing out of the resource engine, observed by the
/// configuration watcher.
#[derive(Debug, Clone)]
pub struct ResourceResponse {
    pub kind: ResponseKind,
    pub node: NodeId,
    pub state: ResourceState,
}

impl ResourceResponse {
    pub fn new(kind: ResponseKind, node: NodeId, state: ResourceState) -> Self {
        Self { kind, node, state }
    }
}
