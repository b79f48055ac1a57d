use std::sync::Arc;

use anyhow::Result;
use log::debug;

use crate::tree::ResourceClassifier;

use super::{DeploymentNotifier, ResourceResponse, ResponseKind};

/// Watches outbound responses and propagates configuration updates to the
/// deployment boundary.
///
/// Runs inline on the response path; the ancestor walk itself never blocks,
/// and heavier work belongs to the [`DeploymentNotifier`].
pub struct ConfigurationWatcher {
    notifier: Arc<dyn DeploymentNotifier>,
}

impl ConfigurationWatcher {
    pub fn new(notifier: Arc<dyn DeploymentNotifier>) -> Self {
        Self { notifier }
    }

    /// Observes one outbound response.
    ///
    /// Update responses whose node has a config-capable ancestor are
    /// forwarded to the deployment boundary; every other response passes
    /// through untouched. A missing root ancestor still notifies, with no
    /// root; a missing config ancestor notifies nothing at all.
    pub fn observe<C: ResourceClassifier>(&self, tree: &C, resp: &ResourceResponse) -> Result<()> {
        if resp.kind != ResponseKind::Updated {
            return Ok(());
        }

        let mut current = Some(resp.node);

        let mut config_state = None;
        while let Some(id) = current {
            if tree.is_config(id) {
                config_state = Some(&resp.state);
                break;
            }
            current = tree.parent(id);
        }

        // The root search resumes where the config search stopped, so a node
        // carrying both capabilities is its own root.
        let mut root = None;
        while let Some(id) = current {
            if tree.is_root(id) {
                root = tree.node(id);
                break;
            }
            current = tree.parent(id);
        }

        if let Some(state) = config_state {
            debug!(
                "Propagating configuration update to deployment manager, root: {:?}",
                root.map(|node| node.name())
            );
            self.notifier.update_configuration(root, state)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use crate::tree::{Capability, ResourceTree};
    use crate::types::state::ResourceState;

    use super::*;

    #[derive(Default)]
    struct RecordingNotifier {
        calls: Mutex<Vec<Option<String>>>,
    }

    impl RecordingNotifier {
        fn roots(&self) -> Vec<Option<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl DeploymentNotifier for RecordingNotifier {
        fn update_configuration(
            &self,
            root: Option<&crate::tree::ResourceNode>,
            _state: &ResourceState,
        ) -> Result<()> {
            let root = root.map(|node| node.name().to_string());
            self.calls.lock().unwrap().push(root);
            Ok(())
        }
    }

    #[test]
    fn test_non_update_passes_through() {
        let mut tree = ResourceTree::new();
        let root = tree.add_node("app", None, [Capability::Root]);
        let config = tree.add_node("config", Some(root), [Capability::Config]);

        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = ConfigurationWatcher::new(notifier.clone());

        for kind in [ResponseKind::Created, ResponseKind::Read, ResponseKind::Deleted] {
            let resp = ResourceResponse::new(kind, config, ResourceState::new());
            watcher.observe(&tree, &resp).unwrap();
        }
        assert!(notifier.roots().is_empty(), "only updates are propagated");
    }

    #[test]
    fn test_config_node_is_its_own_root() {
        // A node carrying both capabilities is found as the root too
        let mut tree = ResourceTree::new();
        let unit = tree.add_node("unit", None, [Capability::Root, Capability::Config]);
        let leaf = tree.add_node("leaf", Some(unit), []);

        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = ConfigurationWatcher::new(notifier.clone());

        let resp = ResourceResponse::new(ResponseKind::Updated, leaf, ResourceState::new());
        watcher.observe(&tree, &resp).unwrap();

        assert_eq!(notifier.roots(), [Some("unit".to_string())]);
    }

    #[test]
    fn test_config_without_root_notifies_with_none() {
        let mut tree = ResourceTree::new();
        let config = tree.add_node("config", None, [Capability::Config]);
        let leaf = tree.add_node("leaf", Some(config), []);

        let notifier = Arc::new(RecordingNotifier::default());
        let watcher = ConfigurationWatcher::new(notifier.clone());

        let resp = ResourceResponse::new(ResponseKind::Updated, leaf, ResourceState::new());
        watcher.observe(&tree, &resp).unwrap();

        assert_eq!(notifier.roots(), [None]);
    }
}
