//! Tests for control-rig generation.

use glam::DVec3;
use pretty_assertions::assert_eq;

use super::*;
use crate::config::RigConventions;
use crate::error::WarningCode;
use crate::hierarchy::Side;
use crate::linkage::{PistonLink, PistonRole};
use crate::skeleton::{Axis, IkAxes, RotationLimit};

fn conventions() -> CompiledConventions {
    RigConventions::default().compile().unwrap()
}

/// Body -> UpperArm_L -> Forearm_L with the elbow bent toward +Y, plus a piston.
fn arm_skeleton() -> Skeleton {
    let mut skeleton = Skeleton::new("Rig");
    {
        let mut edit = skeleton.edit();
        edit.upsert(Bone::new(
            "Body",
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(0.0, 0.0, 2.0),
            DVec3::X,
        ));
        let mut upper = Bone::new(
            "UpperArm_L",
            DVec3::new(1.0, 0.0, 2.0),
            DVec3::new(1.0, 0.3, 1.0),
            DVec3::X,
        )
        .with_parent("Body");
        upper.side = Side::Left;
        edit.upsert(upper);
        let mut forearm = Bone::new(
            "Forearm_L",
            DVec3::new(1.0, 0.3, 1.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::X,
        )
        .with_parent("UpperArm_L")
        .with_limit(RotationLimit::hinge(Axis::X));
        forearm.side = Side::Left;
        edit.upsert(forearm);
        let mut piston = Bone::new(
            "Piston_A_Cyl",
            DVec3::ZERO,
            DVec3::new(0.0, 1.0, 0.0),
            DVec3::Z,
        )
        .with_parent("Body");
        piston.piston = Some(PistonLink {
            id: "A".into(),
            role: PistonRole::Cyl,
            counterpart: None,
        });
        edit.upsert(piston);
    }
    skeleton
}

fn apply(skeleton: &Skeleton, config: &RigConfig) -> ControlRig {
    apply_controls(
        skeleton,
        config,
        &conventions(),
        &SynthesisSettings::default(),
    )
    .unwrap()
}

fn forearm_ik(chain_length: u8) -> RigConfig {
    RigConfig::new().with_bone("Forearm_L", BoneConfig::ik(chain_length))
}

#[test]
fn test_ik_apparatus_created() {
    let skeleton = arm_skeleton();
    let rig = apply(&skeleton, &forearm_ik(2));

    assert_eq!(
        rig.tasks,
        vec![IkTask {
            owner: "Forearm_L".into(),
            control: "Forearm_L_IK".into(),
            solver: "Forearm_L_IK_Solver".into(),
            pole: "Forearm_L_IK_Pole".into(),
            chain_length: 2,
        }]
    );
    assert!(rig.warnings.is_empty());

    let out = &rig.skeleton;
    let forearm = out.bone("Forearm_L").unwrap();
    let control = out.bone("Forearm_L_IK").unwrap();
    let solver = out.bone("Forearm_L_IK_Solver").unwrap();
    let pole = out.bone("Forearm_L_IK_Pole").unwrap();

    assert_eq!(control.kind, BoneKind::Control);
    assert!(!control.deform);
    assert_eq!(control.side, Side::Left);
    assert_eq!(control.head, forearm.head);
    assert_eq!(control.parent, None);

    assert_eq!(solver.kind, BoneKind::Solver);
    assert_eq!(solver.head, forearm.tail);
    assert_eq!(solver.parent.as_deref(), Some("Forearm_L_IK"));

    // Elbow bends toward +Y, so the pole sits in front of the joint.
    assert_eq!(pole.kind, BoneKind::Pole);
    assert!(pole.head.y > forearm.head.y);
    assert!((pole.head.x - 1.0).abs() < 1e-12);
    assert!((pole.head.z - 1.0).abs() < 1e-12);
}

#[test]
fn test_ik_constraint_and_driver() {
    let rig = apply(&arm_skeleton(), &forearm_ik(2));
    let out = &rig.skeleton;

    let ik = out.pose_bone("Forearm_L").unwrap().ik().unwrap();
    assert_eq!(
        *ik,
        IkConstraint {
            target: "Forearm_L_IK_Solver".into(),
            pole: Some("Forearm_L_IK_Pole".into()),
            pole_angle: 0.0,
            chain_count: 2,
            influence: 1.0,
        }
    );

    assert_eq!(out.property("Forearm_L_IK", "IK_FK"), Some(1.0));
    assert_eq!(
        out.drivers,
        vec![Driver::ik_blend("Forearm_L", "Forearm_L_IK", "IK_FK")]
    );
    let influence = out.drivers[0].evaluate(|bone, prop| out.property(bone, prop));
    assert_eq!(influence, Some(1.0));
}

#[test]
fn test_blend_property_drives_influence() {
    let mut rig = apply(&arm_skeleton(), &forearm_ik(2)).skeleton;
    rig.pose_setup()
        .pose_bone_mut("Forearm_L_IK")
        .unwrap()
        .properties
        .get_mut("IK_FK")
        .unwrap()
        .set(0.25);

    let influence = rig.drivers[0].evaluate(|bone, prop| rig.property(bone, prop));
    assert_eq!(influence, Some(0.25));

    // A user-set blend survives a rerun.
    let rerun = apply(&rig, &forearm_ik(2));
    assert_eq!(rerun.skeleton.property("Forearm_L_IK", "IK_FK"), Some(0.25));
}

#[test]
fn test_helper_display() {
    let rig = apply(&arm_skeleton(), &forearm_ik(2));
    let out = &rig.skeleton;
    let colors = BoneColorScheme::default();

    let solver_collection = out.collection_of("Forearm_L_IK_Solver").unwrap();
    assert_eq!(solver_collection.name, "Mechanism");
    assert!(!solver_collection.visible);
    assert!(!solver_collection.selectable);
    let solver_pose = out.pose_bone("Forearm_L_IK_Solver").unwrap();
    assert_eq!(solver_pose.color, Some(colors.mechanism));
    assert_eq!(solver_pose.shape, None);

    assert_eq!(out.collection_of("Forearm_L_IK").unwrap().name, "Left");
    assert_eq!(out.collection_of("Forearm_L_IK_Pole").unwrap().name, "Left");

    let control = out.bone("Forearm_L_IK").unwrap();
    let control_pose = out.pose_bone("Forearm_L_IK").unwrap();
    assert_eq!(control_pose.color, Some(colors.left));
    assert_eq!(
        control_pose.shape,
        CustomShape::for_bone(WidgetShape::Box, control.length(), 1.5)
    );
    assert_eq!(
        out.pose_bone("Forearm_L_IK_Pole").unwrap().shape.as_ref().map(|s| s.widget.as_str()),
        Some("WGT_Bone_SPHERE")
    );
}

#[test]
fn test_lock_propagation() {
    let settings = SynthesisSettings::default();
    let rig = apply(&arm_skeleton(), &forearm_ik(2));
    let out = &rig.skeleton;

    assert_eq!(
        out.pose_bone("Forearm_L").unwrap().ik_axes,
        IkAxes::from_limit(&RotationLimit::hinge(Axis::X), settings.epsilon)
    );
    assert!(!out.pose_bone("Forearm_L").unwrap().ik_axes.is_free());
    // No limit on the upper arm; Body is outside the chain.
    assert!(out.pose_bone("UpperArm_L").unwrap().ik_axes.is_free());
    assert!(out.pose_bone("Body").unwrap().ik_axes.is_free());
}

#[test]
fn test_dangling_chain_is_clamped() {
    let rig = apply(&arm_skeleton(), &forearm_ik(5));

    assert_eq!(rig.tasks[0].chain_length, 3);
    assert_eq!(rig.warnings.len(), 1);
    assert_eq!(rig.warnings[0].code, WarningCode::DanglingChain);
    assert_eq!(rig.warnings[0].entity.as_deref(), Some("Forearm_L"));
    assert_eq!(
        rig.skeleton.pose_bone("Forearm_L").unwrap().ik().unwrap().chain_count,
        3
    );
}

#[test]
fn test_single_link_on_root() {
    let config = RigConfig::new().with_bone("Body", BoneConfig::ik(1));
    let rig = apply(&arm_skeleton(), &config);

    assert!(rig.warnings.is_empty());
    assert_eq!(rig.tasks[0].chain_length, 1);
    // A rootless owner still gets a pole off its axis.
    let body = rig.skeleton.bone("Body").unwrap();
    let pole = rig.skeleton.bone("Body_IK_Pole").unwrap();
    assert!((pole.head - body.head).length() > 0.1);
}

#[test]
fn test_rerun_is_idempotent() {
    let first = apply(&arm_skeleton(), &forearm_ik(2));
    let second = apply(&first.skeleton, &forearm_ik(2));

    assert!(second.tasks.is_empty());
    assert_eq!(second.updated, vec!["Forearm_L".to_string()]);
    assert_eq!(
        first.skeleton.fingerprint().unwrap(),
        second.skeleton.fingerprint().unwrap()
    );
}

#[test]
fn test_rerun_updates_chain_length() {
    let first = apply(&arm_skeleton(), &forearm_ik(2));
    let second = apply(&first.skeleton, &forearm_ik(1));

    assert_eq!(second.updated, vec!["Forearm_L".to_string()]);
    assert_eq!(
        second.skeleton.pose_bone("Forearm_L").unwrap().ik().unwrap().chain_count,
        1
    );
    assert_eq!(
        first.skeleton.bones.len(),
        second.skeleton.bones.len()
    );
}

#[test]
fn test_shortened_chain_unlocks_dropped_links() {
    let mut skeleton = arm_skeleton();
    {
        let mut edit = skeleton.edit();
        let upper = edit
            .bone("UpperArm_L")
            .unwrap()
            .clone()
            .with_limit(RotationLimit::hinge(Axis::Z));
        edit.upsert(upper);
    }

    let first = apply(&skeleton, &forearm_ik(2));
    let upper_axes = first.skeleton.pose_bone("UpperArm_L").unwrap().ik_axes;
    assert!(!upper_axes.is_free());

    let second = apply(&first.skeleton, &forearm_ik(1));
    assert!(second.skeleton.pose_bone("UpperArm_L").unwrap().ik_axes.is_free());
    assert_eq!(
        second.skeleton.pose_bone("Forearm_L").unwrap().ik_axes,
        first.skeleton.pose_bone("Forearm_L").unwrap().ik_axes
    );

    // Growing the chain back locks the ancestor again.
    let third = apply(&second.skeleton, &forearm_ik(2));
    assert_eq!(third.skeleton.pose_bone("UpperArm_L").unwrap().ik_axes, upper_axes);
}

#[test]
fn test_withdraw_ik() {
    let first = apply(&arm_skeleton(), &forearm_ik(2));
    let withdrawn = apply(&first.skeleton, &RigConfig::new());

    assert_eq!(withdrawn.removed, vec!["Forearm_L".to_string()]);
    let out = &withdrawn.skeleton;
    assert!(!out.contains("Forearm_L_IK"));
    assert!(!out.contains("Forearm_L_IK_Solver"));
    assert!(!out.contains("Forearm_L_IK_Pole"));
    assert!(out.pose_bone("Forearm_L").unwrap().ik().is_none());
    assert!(out.drivers.is_empty());
    assert!(out.pose_bone("Forearm_L").unwrap().ik_axes.is_free());
    assert!(out.collection_of("Forearm_L_IK_Solver").is_none());

    // Withdrawing again changes nothing.
    let again = apply(out, &RigConfig::new());
    assert!(again.removed.is_empty());
    assert_eq!(
        out.fingerprint().unwrap(),
        again.skeleton.fingerprint().unwrap()
    );
}

#[test]
fn test_display_pass() {
    let config = RigConfig::new().with_bone(
        "Body",
        BoneConfig::default().with_shape(WidgetShape::None),
    );
    let rig = apply(&arm_skeleton(), &config);
    let out = &rig.skeleton;
    let colors = BoneColorScheme::default();

    assert_eq!(out.collection_of("Body").unwrap().name, "Center");
    assert_eq!(out.collection_of("UpperArm_L").unwrap().name, "Left");
    assert_eq!(out.collection_of("Piston_A_Cyl").unwrap().name, "Mechanics");
    assert_eq!(
        out.pose_bone("Piston_A_Cyl").unwrap().color,
        Some(colors.mechanics)
    );
    assert_eq!(out.pose_bone("UpperArm_L").unwrap().color, Some(colors.left));

    assert_eq!(out.pose_bone("Body").unwrap().shape, None);
    let upper = out.bone("UpperArm_L").unwrap();
    assert_eq!(
        out.pose_bone("UpperArm_L").unwrap().shape,
        CustomShape::for_bone(WidgetShape::Circle, upper.length(), 1.0)
    );
    assert!(rig.tasks.is_empty());
}

#[test]
fn test_input_untouched() {
    let skeleton = arm_skeleton();
    let before = skeleton.clone();
    let _ = apply(&skeleton, &forearm_ik(2));
    assert_eq!(skeleton, before);
}

#[test]
fn test_invalid_config() {
    let config = RigConfig::new().with_bone("Tail", BoneConfig::ik(1));
    let err = apply_controls(
        &arm_skeleton(),
        &config,
        &conventions(),
        &SynthesisSettings::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), "R010");

    // Helper bones cannot be configured.
    let rigged = apply(&arm_skeleton(), &forearm_ik(2)).skeleton;
    let config = RigConfig::new().with_bone("Forearm_L_IK", BoneConfig::ik(1));
    let err = apply_controls(
        &rigged,
        &config,
        &conventions(),
        &SynthesisSettings::default(),
    )
    .unwrap_err();
    assert_eq!(err.entity(), Some("Forearm_L_IK"));
}
