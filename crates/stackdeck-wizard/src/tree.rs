//! Tri-state checkbox tree mirroring the application choices.
//!
//! Leaves are applications and carry their version/archive. Every other
//! node is an aggregate whose state is recomputed from its children after
//! each change; it has no truth of its own.

use crate::catalog::{Catalog, Origin};
use crate::error::WizardError;
use crate::resolver::{resolve_visible, AppGroup};
use crate::selection::{SelectedApp, Selection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckState {
    Unchecked,
    Checked,
    Indeterminate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKind {
    Community {
        id: String,
    },
    Platform {
        id: String,
    },
    AppType {
        origin: Origin,
    },
    App {
        origin: Origin,
        name: String,
        version: String,
        archive: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(flatten)]
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub state: CheckState,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::App { .. })
    }

    pub fn label(&self) -> &str {
        match &self.kind {
            NodeKind::Community { id } | NodeKind::Platform { id } => id,
            NodeKind::AppType { origin } => &origin.app_type,
            NodeKind::App { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckboxTree {
    nodes: Vec<Node>,
}

const ROOT: NodeId = NodeId(0);

impl CheckboxTree {
    /// A tree holding only the community root.
    pub fn new(community: &str) -> Self {
        Self {
            nodes: vec![Node {
                id: ROOT,
                kind: NodeKind::Community {
                    id: community.to_string(),
                },
                parent: None,
                children: Vec::new(),
                state: CheckState::Unchecked,
            }],
        }
    }

    /// root → platform (nested only) → app-type → application.
    pub fn from_groups(community: &str, groups: &[AppGroup]) -> Self {
        let mut tree = Self::new(community);
        for group in groups {
            let parent = match group.origin.platform.as_deref() {
                Some(platform) => match tree.platform(platform) {
                    Some(id) => id,
                    None => tree.push(
                        ROOT,
                        NodeKind::Platform {
                            id: platform.to_string(),
                        },
                    ),
                },
                None => ROOT,
            };
            let type_node = tree.push(
                parent,
                NodeKind::AppType {
                    origin: group.origin.clone(),
                },
            );
            for app in &group.apps {
                tree.push(
                    type_node,
                    NodeKind::App {
                        origin: group.origin.clone(),
                        name: app.clone(),
                        version: String::new(),
                        archive: String::new(),
                    },
                );
            }
        }
        tree
    }

    /// Tree over the applications the selection currently offers, with
    /// the selected ones checked.
    pub fn from_selection(catalog: &Catalog, selection: &Selection) -> Self {
        let visible = resolve_visible(catalog, selection);
        let community = selection.community.as_deref().unwrap_or_default();
        let mut tree = Self::from_groups(community, &visible.apps);
        for entry in &selection.apps {
            let Some(leaf) = tree.leaf(&entry.origin(), &entry.app) else {
                continue;
            };
            if let NodeKind::App {
                version, archive, ..
            } = &mut tree.nodes[leaf.0].kind
            {
                version.clone_from(&entry.version);
                archive.clone_from(&entry.archive);
            }
            tree.nodes[leaf.0].state = CheckState::Checked;
            tree.recompute_ancestors(leaf);
        }
        tree
    }

    fn push(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            parent: Some(parent),
            children: Vec::new(),
            state: CheckState::Unchecked,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn root(&self) -> NodeId {
        ROOT
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn state(&self, id: NodeId) -> Option<CheckState> {
        self.node(id).map(|n| n.state)
    }

    pub fn platform(&self, platform: &str) -> Option<NodeId> {
        self.nodes[ROOT.0].children.iter().copied().find(|&id| {
            matches!(&self.nodes[id.0].kind, NodeKind::Platform { id: pid } if pid == platform)
        })
    }

    pub fn group(&self, origin: &Origin) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| matches!(&n.kind, NodeKind::AppType { origin: o } if o == origin))
            .map(|n| n.id)
    }

    pub fn leaf(&self, origin: &Origin, app: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| {
                matches!(&n.kind, NodeKind::App { origin: o, name, .. } if o == origin && name == app)
            })
            .map(|n| n.id)
    }

    /// Check or uncheck a node and every application below it, then
    /// recompute the aggregates up to the root. Unchecking an application
    /// discards its version and archive.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<(), WizardError> {
        if self.node(id).is_none() {
            return Err(WizardError::UnknownNode(id.0));
        }
        let target = if checked {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        };

        let subtree = self.subtree(id);
        for &node_id in &subtree {
            let node = &mut self.nodes[node_id.0];
            if let NodeKind::App {
                version, archive, ..
            } = &mut node.kind
            {
                node.state = target;
                if !checked {
                    version.clear();
                    archive.clear();
                }
            }
        }
        // Children come after their parent, so reverse order is bottom-up.
        for &node_id in subtree.iter().rev() {
            if !self.nodes[node_id.0].is_leaf() {
                self.nodes[node_id.0].state = self.aggregate(node_id);
            }
        }
        self.recompute_ancestors(id);
        Ok(())
    }

    /// Walk from `id` to the root, recomputing each ancestor from its
    /// direct children.
    pub fn recompute_ancestors(&mut self, id: NodeId) {
        let mut cursor = self.node(id).and_then(|n| n.parent);
        while let Some(parent) = cursor {
            self.nodes[parent.0].state = self.aggregate(parent);
            cursor = self.nodes[parent.0].parent;
        }
    }

    /// Checked iff every child is checked, unchecked iff no child is
    /// checked or partially checked. A node without children is unchecked.
    fn aggregate(&self, id: NodeId) -> CheckState {
        let children = &self.nodes[id.0].children;
        if children.is_empty() {
            return CheckState::Unchecked;
        }
        let states = children.iter().map(|c| self.nodes[c.0].state);
        if states.clone().all(|s| s == CheckState::Checked) {
            CheckState::Checked
        } else if states.clone().all(|s| s == CheckState::Unchecked) {
            CheckState::Unchecked
        } else {
            CheckState::Indeterminate
        }
    }

    /// `id` followed by all its descendants, parents before children.
    fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = vec![id];
        let mut i = 0;
        while i < out.len() {
            out.extend(self.nodes[out[i].0].children.iter().copied());
            i += 1;
        }
        out.sort();
        out
    }

    pub fn set_version(&mut self, id: NodeId, value: &str) -> Result<(), WizardError> {
        let (version, _) = self.leaf_config(id)?;
        *version = value.to_string();
        Ok(())
    }

    pub fn set_archive(&mut self, id: NodeId, value: &str) -> Result<(), WizardError> {
        let (_, archive) = self.leaf_config(id)?;
        *archive = value.to_string();
        Ok(())
    }

    /// Version and archive of a checked application.
    fn leaf_config(&mut self, id: NodeId) -> Result<(&mut String, &mut String), WizardError> {
        let node = self
            .nodes
            .get_mut(id.0)
            .ok_or(WizardError::UnknownNode(id.0))?;
        let checked = node.state == CheckState::Checked;
        match &mut node.kind {
            NodeKind::App { name, .. } if !checked => Err(WizardError::AppNotSelected(name.clone())),
            NodeKind::App {
                version, archive, ..
            } => Ok((version, archive)),
            _ => Err(WizardError::UnknownNode(id.0)),
        }
    }

    /// Checked applications in tree order.
    pub fn checked_apps(&self) -> Vec<SelectedApp> {
        self.nodes
            .iter()
            .filter(|n| n.state == CheckState::Checked)
            .filter_map(|n| match &n.kind {
                NodeKind::App {
                    origin,
                    name,
                    version,
                    archive,
                } => Some(SelectedApp {
                    app: name.clone(),
                    platform: origin.platform.clone(),
                    app_type: origin.app_type.clone(),
                    version: version.clone(),
                    archive: archive.clone(),
                }),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Platform P with app-types A and B, two applications each.
    fn two_by_two() -> CheckboxTree {
        let groups = vec![
            AppGroup {
                origin: Origin::new(Some("p"), "a"),
                apps: vec!["a1".into(), "a2".into()],
            },
            AppGroup {
                origin: Origin::new(Some("p"), "b"),
                apps: vec!["b1".into(), "b2".into()],
            },
        ];
        CheckboxTree::from_groups("x", &groups)
    }

    fn leaves(tree: &CheckboxTree) -> Vec<NodeId> {
        tree.nodes().iter().filter(|n| n.is_leaf()).map(|n| n.id).collect()
    }

    #[test]
    fn checking_a_platform_checks_every_leaf() {
        let mut tree = two_by_two();
        let p = tree.platform("p").expect("platform");
        tree.set_checked(p, true).expect("check");

        assert!(leaves(&tree)
            .iter()
            .all(|&l| tree.state(l) == Some(CheckState::Checked)));
        assert_eq!(tree.state(p), Some(CheckState::Checked));
        assert_eq!(tree.state(tree.root()), Some(CheckState::Checked));
    }

    #[test]
    fn unchecking_one_leaf_makes_the_platform_indeterminate() {
        let mut tree = two_by_two();
        let p = tree.platform("p").expect("platform");
        tree.set_checked(p, true).expect("check");

        let a1 = tree.leaf(&Origin::new(Some("p"), "a"), "a1").expect("leaf");
        tree.set_checked(a1, false).expect("uncheck");

        assert_eq!(tree.state(p), Some(CheckState::Indeterminate));
        let b = tree.group(&Origin::new(Some("p"), "b")).expect("group");
        assert_eq!(tree.state(b), Some(CheckState::Checked));
    }

    #[test]
    fn unchecking_all_leaves_unchecks_the_platform() {
        let mut tree = two_by_two();
        let p = tree.platform("p").expect("platform");
        tree.set_checked(p, true).expect("check");
        for leaf in leaves(&tree) {
            tree.set_checked(leaf, false).expect("uncheck");
        }
        assert_eq!(tree.state(p), Some(CheckState::Unchecked));
        assert_eq!(tree.state(tree.root()), Some(CheckState::Unchecked));
    }

    #[test]
    fn partially_checked_child_propagates_to_the_root() {
        let mut tree = two_by_two();
        let a1 = tree.leaf(&Origin::new(Some("p"), "a"), "a1").expect("leaf");
        tree.set_checked(a1, true).expect("check");

        let a = tree.group(&Origin::new(Some("p"), "a")).expect("group");
        assert_eq!(tree.state(a), Some(CheckState::Indeterminate));
        // B is fully unchecked, A partial: P must not report unchecked.
        let p = tree.platform("p").expect("platform");
        assert_eq!(tree.state(p), Some(CheckState::Indeterminate));
        assert_eq!(tree.state(tree.root()), Some(CheckState::Indeterminate));
    }

    #[test]
    fn node_without_children_is_never_checked() {
        let mut tree = CheckboxTree::from_groups(
            "x",
            &[AppGroup {
                origin: Origin::new(None, "empty"),
                apps: Vec::new(),
            }],
        );
        let empty = tree.group(&Origin::new(None, "empty")).expect("group");
        tree.set_checked(empty, true).expect("check");
        assert_eq!(tree.state(empty), Some(CheckState::Unchecked));
        assert_eq!(tree.state(tree.root()), Some(CheckState::Unchecked));

        let bare = CheckboxTree::new("x");
        assert_eq!(bare.state(bare.root()), Some(CheckState::Unchecked));
    }

    #[test]
    fn unchecking_clears_application_config() {
        let mut tree = two_by_two();
        let b2 = tree.leaf(&Origin::new(Some("p"), "b"), "b2").expect("leaf");
        tree.set_checked(b2, true).expect("check");
        tree.set_version(b2, "1.2.3").expect("version");
        tree.set_archive(b2, "/tmp/b2.tar.gz").expect("archive");
        assert_eq!(tree.checked_apps()[0].version, "1.2.3");

        let b = tree.group(&Origin::new(Some("p"), "b")).expect("group");
        tree.set_checked(b, false).expect("uncheck group");
        tree.set_checked(b2, true).expect("recheck");
        let app = &tree.checked_apps()[0];
        assert!(app.version.is_empty());
        assert!(app.archive.is_empty());
    }

    #[test]
    fn config_of_unchecked_application_cannot_be_edited() {
        let mut tree = two_by_two();
        let a2 = tree.leaf(&Origin::new(Some("p"), "a"), "a2").expect("leaf");
        let err = tree.set_version(a2, "1.0").expect_err("unchecked");
        assert_eq!(err, WizardError::AppNotSelected("a2".into()));
    }

    #[test]
    fn unknown_node_is_reported() {
        let mut tree = two_by_two();
        assert_eq!(
            tree.set_checked(NodeId(99), true),
            Err(WizardError::UnknownNode(99))
        );
    }

    #[test]
    fn flat_community_tree_has_no_platform_level() {
        let catalog = Catalog::builtin();
        let mut selection = Selection::default();
        selection.set_community("be");
        selection.set_app_types(vec!["ihm".into(), "flux".into()]);
        let tree = CheckboxTree::from_selection(&catalog, &selection);
        let root = tree.node(tree.root()).expect("root");
        assert_eq!(root.children.len(), 2);
        assert!(root
            .children
            .iter()
            .all(|c| matches!(tree.node(*c).map(|n| &n.kind), Some(NodeKind::AppType { .. }))));
    }

    #[test]
    fn tree_from_selection_restores_checked_leaves() {
        let catalog = Catalog::builtin();
        let mut selection = Selection::default();
        selection.set_community("fr");
        selection.set_platforms(vec!["core".into(), "acore".into()]);
        selection.set_app_types(vec!["flux".into()]);
        let mut entry = SelectedApp::new(&Origin::new(Some("acore"), "flux"), "acore");
        entry.version = "2.1.0".into();
        selection.apps.push(entry.clone());

        let tree = CheckboxTree::from_selection(&catalog, &selection);
        assert_eq!(tree.checked_apps(), vec![entry]);
        let acore = tree.platform("acore").expect("platform");
        assert_eq!(tree.state(acore), Some(CheckState::Checked));
        assert_eq!(tree.state(tree.root()), Some(CheckState::Indeterminate));
    }
}
