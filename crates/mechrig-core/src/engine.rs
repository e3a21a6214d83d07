//! Host-facing entry points.
//!
//! [`RigEngine`] bundles compiled naming conventions and synthesis settings
//! and exposes the three operations a host calls: validation, skeleton
//! synthesis, and control-rig generation. Every call is pure with respect
//! to its inputs.

use tracing::instrument;

use crate::collab::{plan_binding, plan_duplication, Binding, DuplicationEntry};
use crate::config::{CompiledConventions, RigConventions, SynthesisSettings};
use crate::error::{RigResult, ValidationReport};
use crate::hierarchy::{analyze, Analysis};
use crate::mirror::ReflectionOrigin;
use crate::rig::{apply_controls, ControlRig, RigConfig};
use crate::scene::{NodeId, SceneGraph};
use crate::skeleton::{synthesize, Skeleton, Synthesis, SynthesisRequest};
use crate::validation::validate_selection;

/// Geometry work for the host collaborators.
#[derive(Debug, Clone)]
pub struct GeometryPlan {
    pub duplication: Vec<DuplicationEntry>,
    pub bindings: Vec<Binding>,
}

/// Rig synthesis engine.
#[derive(Debug, Clone)]
pub struct RigEngine {
    conventions: CompiledConventions,
    settings: SynthesisSettings,
}

impl RigEngine {
    /// Compiles the conventions and checks the settings.
    pub fn new(conventions: &RigConventions, settings: SynthesisSettings) -> RigResult<Self> {
        settings.validate()?;
        Ok(Self {
            conventions: conventions.compile()?,
            settings,
        })
    }

    /// Engine with the default conventions and the given settings.
    pub fn with_settings(settings: SynthesisSettings) -> RigResult<Self> {
        Self::new(&RigConventions::default(), settings)
    }

    pub fn conventions(&self) -> &CompiledConventions {
        &self.conventions
    }

    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    /// Runs the hierarchy, mirroring, and piston checks without synthesizing.
    pub fn validate<S: SceneGraph>(
        &self,
        scene: &S,
        selection: &[NodeId],
        reflection_origin: Option<NodeId>,
    ) -> ValidationReport {
        validate_selection(
            scene,
            selection,
            reflection_origin,
            &self.conventions,
            &self.settings,
        )
    }

    /// Analyzes the selection into a bone forest.
    pub fn analyze<S: SceneGraph>(&self, scene: &S, selection: &[NodeId]) -> RigResult<Analysis> {
        analyze(scene, selection, &self.conventions)
    }

    /// Synthesizes a skeleton, updating `existing` if given.
    ///
    /// Analyzer warnings are merged into the result.
    #[instrument(skip_all, fields(selected = selection.len()))]
    pub fn synthesize<S: SceneGraph>(
        &self,
        scene: &S,
        selection: &[NodeId],
        reflection_origin: Option<NodeId>,
        existing: Option<&Skeleton>,
    ) -> RigResult<Synthesis> {
        let analysis = self.analyze(scene, selection)?;
        let origin = self.reflection_origin(scene, &analysis, reflection_origin)?;
        let mut synthesis = synthesize(
            scene,
            SynthesisRequest {
                tree: &analysis.tree,
                reflection_origin: origin.as_ref(),
                existing,
            },
            &self.conventions,
            &self.settings,
        )?;

        let mut warnings = analysis.warnings;
        warnings.append(&mut synthesis.warnings);
        synthesis.warnings = warnings;
        Ok(synthesis)
    }

    /// Plans duplication and binding for the host's geometry collaborators.
    pub fn plan_geometry<S: SceneGraph>(
        &self,
        scene: &S,
        selection: &[NodeId],
        reflection_origin: Option<NodeId>,
    ) -> RigResult<GeometryPlan> {
        let analysis = self.analyze(scene, selection)?;
        let origin = self.reflection_origin(scene, &analysis, reflection_origin)?;
        let duplication =
            plan_duplication(scene, &analysis.tree, origin.as_ref(), &self.conventions);
        let bindings = plan_binding(scene, &analysis.tree, &duplication);
        Ok(GeometryPlan {
            duplication,
            bindings,
        })
    }

    /// Builds or updates the IK control rig of a skeleton.
    pub fn control_rig(&self, skeleton: &Skeleton, config: &RigConfig) -> RigResult<ControlRig> {
        apply_controls(skeleton, config, &self.conventions, &self.settings)
    }

    /// The reflection origin, resolved only when the tree has mirrored bones.
    fn reflection_origin<S: SceneGraph>(
        &self,
        scene: &S,
        analysis: &Analysis,
        node: Option<NodeId>,
    ) -> RigResult<Option<ReflectionOrigin>> {
        match node {
            Some(id) if analysis.tree.has_mirrored() => ReflectionOrigin::new(
                scene.node_name(id),
                scene.world_transform(id),
                self.settings.epsilon,
            )
            .map(Some),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Scene, SceneNode};
    use glam::DVec3;

    fn scene() -> Scene {
        Scene::new(vec![
            SceneNode::new("Origin"),
            SceneNode::new("Body").with_group("Body"),
            SceneNode::new("Arm")
                .with_group("Arm_Mirrored")
                .with_parent("Body")
                .with_mirror_target("Origin")
                .at(DVec3::new(1.0, 0.0, 0.0)),
        ])
        .unwrap()
    }

    #[test]
    fn test_engine_rejects_bad_settings() {
        let err = RigEngine::with_settings(SynthesisSettings::default().with_scale_factor(0.0))
            .unwrap_err();
        assert_eq!(err.code(), "R007");
    }

    #[test]
    fn test_engine_synthesize() {
        let engine = RigEngine::with_settings(SynthesisSettings::default()).unwrap();
        let scene = scene();
        let selection = scene.resolve(&["Body", "Arm"]).unwrap();
        let origin = scene.find("Origin");

        assert!(engine.validate(&scene, &selection, origin).is_ok());
        let synthesis = engine.synthesize(&scene, &selection, origin, None).unwrap();
        let names: Vec<&str> = synthesis.skeleton.bones.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["Body", "Arm_L", "Arm_R"]);
        assert_eq!(synthesis.created.len(), 3);

        let plan = engine.plan_geometry(&scene, &selection, origin).unwrap();
        assert_eq!(plan.duplication.len(), 3);
        assert_eq!(plan.bindings.len(), 3);
    }

    #[test]
    fn test_engine_missing_origin() {
        let engine = RigEngine::with_settings(SynthesisSettings::default()).unwrap();
        let scene = scene();
        let selection = scene.resolve(&["Body", "Arm"]).unwrap();
        let err = engine.synthesize(&scene, &selection, None, None).unwrap_err();
        assert_eq!(err.code(), "R006");
    }
}
