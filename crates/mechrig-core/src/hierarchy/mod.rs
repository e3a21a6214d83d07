//! Hierarchy analysis.
//!
//! Turns a flat selection of parented scene nodes into a forest of
//! [`BoneNode`]s. One bone is created per part group encountered along a
//! root-to-leaf path; nodes that share their parent context's group fold
//! into that bone. Mirrored groups produce a Left/Right pair.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::CompiledConventions;
use crate::error::{ErrorCode, RigError, RigResult, RigWarning, WarningCode};
use crate::scene::{NodeId, SceneGraph};


/// Which half of a mirrored pair a bone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Unmirrored (center) bone.
    #[default]
    None,
    /// Left bone of a mirrored pair.
    Left,
    /// Right bone of a mirrored pair; geometry is reflected.
    Right,
}

impl Side {
    /// Returns the side as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::None => "none",
            Side::Left => "left",
            Side::Right => "right",
        }
    }

    /// Returns true for the reflected side.
    pub fn is_reflected(&self) -> bool {
        matches!(self, Side::Right)
    }
}

/// Index of a bone node within its [`BoneTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BoneId(pub usize);

/// Abstract bone produced by the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneNode {
    /// Emitted bone name (sided, with a `.NNN` counter if reused).
    pub name: String,
    /// Group name with the mirror marker removed.
    pub base_name: String,
    /// Part group this bone stands for.
    pub group: String,
    /// Scene node whose transform places the bone.
    pub representative: NodeId,
    /// Every selected scene node folded into this bone, in visit order.
    pub members: Vec<NodeId>,
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
    pub side: Side,
    /// Other half of a mirrored pair.
    pub sibling: Option<BoneId>,
    /// True once a pivot-override node replaced the representative.
    pub pivot_overridden: bool,
}

/// Forest of bone nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoneTree {
    nodes: Vec<BoneNode>,
    roots: Vec<BoneId>,
}

impl BoneTree {
    /// Returns a bone node.
    pub fn get(&self, id: BoneId) -> &BoneNode {
        &self.nodes[id.0]
    }

    /// Root bones in traversal order.
    pub fn roots(&self) -> &[BoneId] {
        &self.roots
    }

    /// Number of bone nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no bones.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a bone node by emitted name.
    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.nodes.iter().position(|n| n.name == name).map(BoneId)
    }

    /// All bone nodes with their ids, in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (BoneId, &BoneNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (BoneId(i), n))
    }

    /// Bone ids in depth-first order, parents before children.
    pub fn depth_first(&self) -> Vec<BoneId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<BoneId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    /// Returns true if any bone comes from a mirrored group.
    pub fn has_mirrored(&self) -> bool {
        self.nodes.iter().any(|n| n.side != Side::None)
    }

    fn push(&mut self, node: BoneNode) -> BoneId {
        let id = BoneId(self.nodes.len());
        match node.parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }
}

/// Output of [`analyze`].
#[derive(Debug, Clone)]
pub struct Analysis {
    pub tree: BoneTree,
    pub warnings: Vec<RigWarning>,
}

/// Bones a traversal is currently inside of.
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    left: Option<BoneId>,
    right: Option<BoneId>,
}

struct Analyzer<'a, S: SceneGraph> {
    scene: &'a S,
    conventions: &'a CompiledConventions,
    selected: HashSet<NodeId>,
    tree: BoneTree,
    /// Bone reuse key: (parent bone, group, side).
    reuse: HashMap<(Option<BoneId>, String, Side), BoneId>,
    name_counts: HashMap<String, usize>,
    visited: HashSet<NodeId>,
    warnings: Vec<RigWarning>,
}

/// Builds the bone forest for a selection.
///
/// Fails with a validation error if the selection is empty, if a selected
/// node has no part group, or if no selected node is a root.
#[instrument(skip_all, fields(selected = selection.len()))]
pub fn analyze<S: SceneGraph>(
    scene: &S,
    selection: &[NodeId],
    conventions: &CompiledConventions,
) -> RigResult<Analysis> {
    if selection.is_empty() {
        return Err(RigError::validation(
            ErrorCode::EmptySelection,
            "nothing is selected",
        ));
    }

    for &id in selection {
        if scene.part_group(id).is_none() {
            return Err(RigError::validation_at(
                ErrorCode::MissingPartGroup,
                "node is not assigned to any part group",
                scene.node_name(id),
            ));
        }
    }

    let selected: HashSet<NodeId> = selection.iter().copied().collect();
    let mut seen = HashSet::new();
    let roots: Vec<NodeId> = selection
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .filter(|&id| match scene.parent(id) {
            Some(parent) => !selected.contains(&parent),
            None => true,
        })
        .collect();

    if roots.is_empty() {
        return Err(RigError::validation(
            ErrorCode::NoRootNode,
            "no root node found: every selected node has its parent in the selection",
        ));
    }

    let mut analyzer = Analyzer {
        scene,
        conventions,
        selected,
        tree: BoneTree::default(),
        reuse: HashMap::new(),
        name_counts: HashMap::new(),
        visited: HashSet::new(),
        warnings: Vec::new(),
    };

    for root in roots {
        analyzer.traverse(root, Context::default());
    }

    let mut unreachable: Vec<&str> = selection
        .iter()
        .filter(|id| !analyzer.visited.contains(id))
        .map(|&id| scene.node_name(id))
        .collect();
    if !unreachable.is_empty() {
        unreachable.sort_unstable();
        unreachable.dedup();
        let warning = RigWarning::new(
            WarningCode::UnreachableNodes,
            format!(
                "nodes are parented in a cycle and were skipped: {}",
                unreachable.join(", ")
            ),
        );
        warn!(code = %warning.code, "{}", warning.message);
        analyzer.warnings.push(warning);
    }

    debug!(bones = analyzer.tree.len(), roots = analyzer.tree.roots.len(), "hierarchy analyzed");
    Ok(Analysis {
        tree: analyzer.tree,
        warnings: analyzer.warnings,
    })
}

impl<'a, S: SceneGraph> Analyzer<'a, S> {
    fn traverse(&mut self, node: NodeId, context: Context) {
        self.visited.insert(node);
        let group = self.scene.part_group(node).unwrap_or_default().to_string();

        let context_group = context.left.map(|b| self.tree.get(b).group.as_str());
        let next = if context_group == Some(group.as_str()) {
            self.fold_into(node, context);
            context
        } else {
            self.open_bone(node, &group, context)
        };

        for child in self.scene.children(node) {
            if self.selected.contains(&child) && !self.visited.contains(&child) {
                self.traverse(child, next);
            }
        }
    }

    /// Creates (or reuses) the bone(s) for a node whose group differs from its context.
    ///
    /// Under a sided context even an unmirrored group opens an `_L`/`_R`
    /// pair, one under each parent half. This keeps the left and right
    /// subtrees of every mirrored bone identical in shape.
    fn open_bone(&mut self, node: NodeId, group: &str, context: Context) -> Context {
        // A sided context keeps its descendants sided.
        let mirrored = self.conventions.is_mirrored(group) || context.right.is_some();
        if mirrored {
            let left = self.bone_for(node, group, Side::Left, context.left);
            let right = self.bone_for(node, group, Side::Right, context.right.or(context.left));
            self.tree.nodes[left.0].sibling = Some(right);
            self.tree.nodes[right.0].sibling = Some(left);
            Context {
                left: Some(left),
                right: Some(right),
            }
        } else {
            let bone = self.bone_for(node, group, Side::None, context.left);
            Context {
                left: Some(bone),
                right: None,
            }
        }
    }

    fn bone_for(&mut self, node: NodeId, group: &str, side: Side, parent: Option<BoneId>) -> BoneId {
        let key = (parent, group.to_string(), side);
        if let Some(&existing) = self.reuse.get(&key) {
            self.tree.nodes[existing.0].members.push(node);
            return existing;
        }

        let base_name = self.conventions.base_name(group);
        let name = self.unique_name(self.conventions.sided_name(&base_name, side));
        debug!(bone = %name, node = self.scene.node_name(node), "bone node created");

        let id = self.tree.push(BoneNode {
            name,
            base_name,
            group: group.to_string(),
            representative: node,
            members: vec![node],
            parent,
            children: Vec::new(),
            side,
            sibling: None,
            pivot_overridden: false,
        });
        self.reuse.insert(key, id);
        id
    }

    fn fold_into(&mut self, node: NodeId, context: Context) {
        let scene = self.scene;
        let name = scene.node_name(node);
        let is_pivot = self.conventions.is_pivot(name);
        let bones = [context.left, context.right];

        for bone in bones.into_iter().flatten() {
            let entry = &mut self.tree.nodes[bone.0];
            entry.members.push(node);
            if !is_pivot {
                continue;
            }
            if entry.pivot_overridden {
                // Only report once per pair.
                if entry.side != Side::Right {
                    let warning = RigWarning::with_entity(
                        WarningCode::PivotOverrideIgnored,
                        format!(
                            "pivot '{}' ignored; '{}' already dictates the pivot",
                            name,
                            scene.node_name(entry.representative)
                        ),
                        entry.name.clone(),
                    );
                    warn!(code = %warning.code, bone = %entry.name, "{}", warning.message);
                    self.warnings.push(warning);
                }
            } else {
                entry.representative = node;
                entry.pivot_overridden = true;
                debug!(bone = %entry.name, pivot = name, "pivot override");
            }
        }
    }

    fn unique_name(&mut self, name: String) -> String {
        let count = self.name_counts.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count == 1 {
            name
        } else {
            format!("{}.{:03}", name, *count - 1)
        }
    }
}
