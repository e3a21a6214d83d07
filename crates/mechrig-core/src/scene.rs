//! Read-only scene graph access.
//!
//! The host owns the real scene; the engine only ever reads it through
//! [`SceneGraph`]. [`Scene`] is the in-memory implementation built from a
//! [`SceneDocument`].

use std::collections::HashMap;

use glam::{DMat4, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::{ErrorCode, RigError, RigResult};

/// Handle to a node of a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Read access to the host's scene graph.
pub trait SceneGraph {
    /// Looks up a node by name.
    fn find(&self, name: &str) -> Option<NodeId>;

    /// All nodes in traversal order.
    fn node_ids(&self) -> Vec<NodeId>;

    /// Name of a node.
    fn node_name(&self, id: NodeId) -> &str;

    /// World transform of a node.
    fn world_transform(&self, id: NodeId) -> DMat4;

    /// Parent of a node.
    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// Children of a node, in traversal order.
    fn children(&self, id: NodeId) -> Vec<NodeId>;

    /// Part group the node belongs to.
    fn part_group(&self, id: NodeId) -> Option<&str>;

    /// Local bounding-box dimensions.
    fn dimensions(&self, id: NodeId) -> DVec3;

    /// Name of the node targeted by the node's mirror modifier, if any.
    fn mirror_target(&self, id: NodeId) -> Option<&str>;
}

fn identity() -> DMat4 {
    DMat4::IDENTITY
}

/// A node as authored in a scene document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneNode {
    /// Unique node name.
    pub name: String,
    /// Part group membership.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Name of the parent node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// World transform, column-major.
    #[serde(default = "identity")]
    pub transform: DMat4,
    /// Local bounding-box dimensions.
    #[serde(default)]
    pub dimensions: DVec3,
    /// Target of a mirror modifier on this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mirror_target: Option<String>,
}

impl SceneNode {
    /// Creates a node at the origin with no group or parent.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group: None,
            parent: None,
            transform: DMat4::IDENTITY,
            dimensions: DVec3::ZERO,
            mirror_target: None,
        }
    }

    /// Sets the part group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Sets the parent node.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Sets the world transform.
    pub fn with_transform(mut self, transform: DMat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the world translation, keeping the rest of the transform.
    pub fn at(mut self, translation: DVec3) -> Self {
        self.transform.w_axis = translation.extend(1.0);
        self
    }

    /// Sets the bounding-box dimensions.
    pub fn with_dimensions(mut self, dimensions: DVec3) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Sets the mirror modifier target.
    pub fn with_mirror_target(mut self, target: impl Into<String>) -> Self {
        self.mirror_target = Some(target.into());
        self
    }
}

/// In-memory scene graph.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    by_name: HashMap<String, NodeId>,
    parents: Vec<Option<NodeId>>,
    children: Vec<Vec<NodeId>>,
}

impl Scene {
    /// Builds a scene, resolving parent links by name.
    pub fn new(nodes: Vec<SceneNode>) -> RigResult<Self> {
        let mut by_name = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if by_name.insert(node.name.clone(), NodeId(i)).is_some() {
                return Err(RigError::validation_at(
                    ErrorCode::DuplicateNode,
                    "node name is used more than once",
                    &node.name,
                ));
            }
        }

        let mut parents = Vec::with_capacity(nodes.len());
        let mut children = vec![Vec::new(); nodes.len()];
        for (i, node) in nodes.iter().enumerate() {
            let parent = match node.parent {
                Some(ref name) => {
                    let id = by_name.get(name).copied().ok_or_else(|| {
                        RigError::validation_at(
                            ErrorCode::UnknownNode,
                            format!("parent '{}' does not exist", name),
                            &node.name,
                        )
                    })?;
                    children[id.0].push(NodeId(i));
                    Some(id)
                }
                None => None,
            };
            parents.push(parent);
        }

        Ok(Self {
            nodes,
            by_name,
            parents,
            children,
        })
    }

    /// Returns the authored node.
    pub fn node(&self, id: NodeId) -> &SceneNode {
        &self.nodes[id.0]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the scene has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Resolves a list of node names.
    pub fn resolve<S: AsRef<str>>(&self, names: &[S]) -> RigResult<Vec<NodeId>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.find(name).ok_or_else(|| {
                    RigError::validation_at(ErrorCode::UnknownNode, "node does not exist", name)
                })
            })
            .collect()
    }
}

impl SceneGraph for Scene {
    fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    fn node_ids(&self) -> Vec<NodeId> {
        (0..self.nodes.len()).map(NodeId).collect()
    }

    fn node_name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    fn world_transform(&self, id: NodeId) -> DMat4 {
        self.nodes[id.0].transform
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.0]
    }

    fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.children[id.0].clone()
    }

    fn part_group(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].group.as_deref()
    }

    fn dimensions(&self, id: NodeId) -> DVec3 {
        self.nodes[id.0].dimensions
    }

    fn mirror_target(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].mirror_target.as_deref()
    }
}

/// Scene plus selection as read from a JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDocument {
    /// All nodes of the scene.
    pub nodes: Vec<SceneNode>,
    /// Names of the selected nodes.
    pub selection: Vec<String>,
    /// Name of the node defining the mirror plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection_origin: Option<String>,
}

/// A scene with its selection and reflection origin resolved.
#[derive(Debug, Clone)]
pub struct SceneInput {
    pub scene: Scene,
    pub selection: Vec<NodeId>,
    pub reflection_origin: Option<NodeId>,
}

impl SceneDocument {
    /// Parses a scene document from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Builds the scene and resolves the selection and reflection origin.
    pub fn into_input(self) -> RigResult<SceneInput> {
        let scene = Scene::new(self.nodes)?;
        let selection = scene.resolve(&self.selection)?;
        let reflection_origin = match self.reflection_origin {
            Some(ref name) => Some(scene.resolve(std::slice::from_ref(name))?[0]),
            None => None,
        };
        Ok(SceneInput {
            scene,
            selection,
            reflection_origin,
        })
    }
}
