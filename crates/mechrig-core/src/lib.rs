//! Mechanical Rig Synthesis Library
//!
//! This crate turns a hierarchy of rigid mechanical parts into a skeleton
//! and an animator-facing IK control rig.
//!
//! # Overview
//!
//! A run has four stages, each pure with respect to its inputs:
//!
//! - **Hierarchy analysis**: selected scene nodes are grouped by part group
//!   into a forest of abstract bones; mirrored groups become left/right pairs
//! - **Skeleton synthesis**: every bone is placed from its representative's
//!   transform, reflected through the reflection origin on the right side
//! - **Linkage solving**: cylinder/rod pairs are aimed at each other and
//!   wired with track-to constraints
//! - **Control-rig generation**: control, solver, and pole bones plus an
//!   IK constraint whose influence is driven by an FK/IK blend property
//!
//! # Example
//!
//! ```
//! use glam::DVec3;
//! use mechrig_core::{RigConfig, BoneConfig, RigEngine, Scene, SceneGraph, SceneNode, SynthesisSettings};
//!
//! let scene = Scene::new(vec![
//!     SceneNode::new("Origin"),
//!     SceneNode::new("Body").with_group("Body"),
//!     SceneNode::new("Arm")
//!         .with_group("Arm_Mirrored")
//!         .with_parent("Body")
//!         .at(DVec3::new(1.0, 0.0, 0.0)),
//! ])
//! .unwrap();
//! let selection = scene.resolve(&["Body", "Arm"]).unwrap();
//! let origin = scene.find("Origin");
//!
//! let engine = RigEngine::with_settings(SynthesisSettings::default()).unwrap();
//! let synthesis = engine.synthesize(&scene, &selection, origin, None).unwrap();
//! assert!(synthesis.skeleton.contains("Arm_R"));
//!
//! let config = RigConfig::new().with_bone("Arm_L", BoneConfig::ik(2));
//! let rig = engine.control_rig(&synthesis.skeleton, &config).unwrap();
//! assert!(rig.skeleton.contains("Arm_L_IK_Solver"));
//! ```
//!
//! # Modules
//!
//! - [`scene`]: read-only scene graph access and the scene document
//! - [`hierarchy`]: the hierarchy analyzer
//! - [`mirror`]: reflection through the reflection origin
//! - [`skeleton`]: concrete skeleton, edit/pose phases, and synthesis
//! - [`linkage`]: piston pairing and look-at alignment
//! - [`rig`]: IK control-rig generation and display settings
//! - [`collab`]: plans for the host's geometry, binding, and export collaborators
//! - [`validation`]: non-mutating selection checks
//! - [`editor`]: editor-side selection synchronization

pub mod collab;
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod hash;
pub mod hierarchy;
pub mod linkage;
pub mod mirror;
pub mod rig;
pub mod scene;
pub mod skeleton;
pub mod validation;

// Re-export commonly used types at the crate root
pub use collab::{
    assign_skin, plan_binding, plan_duplication, BindTarget, Binding, DuplicationEntry,
    ExportSettings, SkinAssignment, TaggedGeometry,
};
pub use config::{CompiledConventions, RigConventions, SynthesisSettings};
pub use engine::{GeometryPlan, RigEngine};
pub use error::{
    ErrorCode, ErrorKind, RigError, RigResult, RigWarning, ValidationReport, WarningCode,
};
pub use hash::canonical_hash;
pub use hierarchy::{analyze, Analysis, BoneId, BoneNode, BoneTree, Side};
pub use linkage::{PistonLink, PistonRole};
pub use mirror::ReflectionOrigin;
pub use rig::{apply_controls, BoneConfig, ControlRig, IkTask, RigConfig, WidgetShape};
pub use scene::{NodeId, Scene, SceneDocument, SceneGraph, SceneInput, SceneNode};
pub use skeleton::{synthesize, Bone, BoneKind, Skeleton, Synthesis, SynthesisRequest};
pub use validation::validate_selection;
