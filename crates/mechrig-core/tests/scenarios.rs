//! End-to-end scenarios through the public API.
//!
//! These cover the reference rigs: a body with a mirrored arm, a hinge,
//! a piston pair, and IK chains on straight and rootless limbs.

use glam::DVec3;
use pretty_assertions::assert_eq;

use mechrig_core::skeleton::{Axis, Constraint, IkAxisState, RotationLimit, TRACK_TO_CONSTRAINT};
use mechrig_core::{
    BoneConfig, ReflectionOrigin, RigConfig, RigEngine, Scene, SceneDocument, SceneGraph,
    SceneInput, SceneNode, Side, SynthesisSettings, WarningCode,
};

const BODY_ARM: &str = r#"{
    "nodes": [
        {"name": "Origin", "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0.5,0,0,1]},
        {"name": "Body", "group": "Body",
         "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,1,1],
         "dimensions": [1, 1, 1]},
        {"name": "Arm", "group": "Arm_Mirrored", "parent": "Body",
         "transform": [1,0,0,0, 0,1,0,0, 0,0,1,0, 2,0.2,1.5,1],
         "dimensions": [0.2, 0.2, 2],
         "mirror_target": "Origin"}
    ],
    "selection": ["Body", "Arm"],
    "reflection_origin": "Origin"
}"#;

fn engine() -> RigEngine {
    RigEngine::with_settings(SynthesisSettings::default()).unwrap()
}

fn body_arm() -> SceneInput {
    SceneDocument::from_json(BODY_ARM)
        .unwrap()
        .into_input()
        .unwrap()
}

fn origin_of(input: &SceneInput) -> ReflectionOrigin {
    let id = input.reflection_origin.unwrap();
    ReflectionOrigin::new(
        input.scene.node_name(id),
        input.scene.world_transform(id),
        1e-9,
    )
    .unwrap()
}

#[test]
fn test_body_arm_forest() {
    let input = body_arm();
    let analysis = engine().analyze(&input.scene, &input.selection).unwrap();
    let tree = &analysis.tree;

    assert_eq!(tree.roots().len(), 1);
    let body = tree.get(tree.roots()[0]);
    assert_eq!(body.name, "Body");
    let children: Vec<(&str, Side)> = body
        .children
        .iter()
        .map(|&id| (tree.get(id).name.as_str(), tree.get(id).side))
        .collect();
    assert_eq!(children, vec![("Arm_L", Side::Left), ("Arm_R", Side::Right)]);
}

#[test]
fn test_body_arm_skeleton() {
    let input = body_arm();
    let synthesis = engine()
        .synthesize(&input.scene, &input.selection, input.reflection_origin, None)
        .unwrap();
    let skeleton = &synthesis.skeleton;

    let names: Vec<&str> = skeleton.bones.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Body", "Arm_L", "Arm_R"]);
    assert!(synthesis.warnings.is_empty());

    let origin = origin_of(&input);
    let left = skeleton.bone("Arm_L").unwrap();
    let right = skeleton.bone("Arm_R").unwrap();
    assert!(right
        .head
        .abs_diff_eq(origin.reflect_point(left.head), 1e-12));
    // Mirror plane is x = 0.5.
    assert!(right.head.abs_diff_eq(DVec3::new(-1.0, 0.2, 1.5), 1e-12));
}

#[test]
fn test_reflection_is_involution() {
    let input = body_arm();
    let origin = origin_of(&input);
    let synthesis = engine()
        .synthesize(&input.scene, &input.selection, input.reflection_origin, None)
        .unwrap();

    for bone in &synthesis.skeleton.bones {
        let head = origin.reflect_point(origin.reflect_point(bone.head));
        let tail = origin.reflect_point(origin.reflect_point(bone.tail));
        assert!(head.abs_diff_eq(bone.head, 1e-9), "{}", bone.name);
        assert!(tail.abs_diff_eq(bone.tail, 1e-9), "{}", bone.name);
    }
}

#[test]
fn test_hinge_elbow() {
    let scene = Scene::new(vec![
        SceneNode::new("Upper").with_group("Upper"),
        SceneNode::new("ElbowPart")
            .with_group("Hinge_Elbow")
            .with_parent("Upper"),
        SceneNode::new("WristPart")
            .with_group("Elbow")
            .with_parent("ElbowPart"),
    ])
    .unwrap();
    let synthesis = engine()
        .synthesize(&scene, &scene.node_ids(), None, None)
        .unwrap();

    let elbow = synthesis.skeleton.bone("Hinge_Elbow").unwrap();
    let limit = elbow.limit.unwrap();
    assert_eq!(limit, RotationLimit::hinge(Axis::Y));
    assert!(limit.x.locked && !limit.y.locked && limit.z.locked);
    assert!(synthesis.skeleton.bone("Elbow").unwrap().limit.is_none());
}

#[test]
fn test_piston_pair_tails_meet() {
    let scene = Scene::new(vec![
        SceneNode::new("Frame").with_group("Frame"),
        SceneNode::new("Barrel")
            .with_group("Piston_Lift_Cyl")
            .with_parent("Frame")
            .at(DVec3::new(0.0, -1.0, 0.5)),
        SceneNode::new("Shaft")
            .with_group("Piston_Lift_Rod")
            .with_parent("Frame")
            .at(DVec3::new(0.3, 1.2, 2.0)),
    ])
    .unwrap();
    let synthesis = engine()
        .synthesize(&scene, &scene.node_ids(), None, None)
        .unwrap();
    let skeleton = &synthesis.skeleton;

    let cyl = skeleton.bone("Piston_Lift_Cyl").unwrap();
    let rod = skeleton.bone("Piston_Lift_Rod").unwrap();
    assert_eq!(cyl.tail, rod.head);
    assert_eq!(rod.tail, cyl.head);
    let pairs = [
        ("Piston_Lift_Cyl", "Piston_Lift_Rod"),
        ("Piston_Lift_Rod", "Piston_Lift_Cyl"),
    ];
    for (name, target) in pairs {
        let pose = skeleton.pose_bone(name).unwrap();
        match pose.constraint(TRACK_TO_CONSTRAINT) {
            Some(Constraint::TrackTo(track)) => {
                assert_eq!(track.target, target)
            }
            other => panic!("expected track-to on {name}, got {other:?}"),
        }
    }
}

#[test]
fn test_validation_does_not_need_synthesis() {
    let mut document = SceneDocument::from_json(BODY_ARM).unwrap();
    for node in &mut document.nodes {
        node.mirror_target = None;
    }
    let input = document.into_input().unwrap();
    let report = engine().validate(&input.scene, &input.selection, input.reflection_origin);

    assert!(report.is_ok());
    assert!(report.has_warning(WarningCode::MirrorModifierMissing));
}

#[test]
fn test_ik_on_root_bone() {
    let scene = Scene::new(vec![SceneNode::new("Boom").with_group("Boom")]).unwrap();
    let engine = engine();
    let skeleton = engine
        .synthesize(&scene, &scene.node_ids(), None, None)
        .unwrap()
        .skeleton;

    let exact = engine
        .control_rig(&skeleton, &RigConfig::new().with_bone("Boom", BoneConfig::ik(1)))
        .unwrap();
    assert!(exact.warnings.is_empty());
    assert_eq!(exact.tasks[0].chain_length, 1);

    let long = engine
        .control_rig(&skeleton, &RigConfig::new().with_bone("Boom", BoneConfig::ik(3)))
        .unwrap();
    assert_eq!(long.tasks[0].chain_length, 1);
    assert_eq!(long.warnings.len(), 1);
    assert_eq!(long.warnings[0].code, WarningCode::DanglingChain);
}

#[test]
fn test_straight_chain_pole_is_off_the_line() {
    let scene = Scene::new(vec![
        SceneNode::new("Upper").with_group("Upper"),
        SceneNode::new("Lower")
            .with_group("Lower")
            .with_parent("Upper")
            .at(DVec3::new(0.0, 0.0, 0.2)),
    ])
    .unwrap();
    let engine = engine();
    let skeleton = engine
        .synthesize(&scene, &scene.node_ids(), None, None)
        .unwrap()
        .skeleton;
    let rig = engine
        .control_rig(&skeleton, &RigConfig::new().with_bone("Lower", BoneConfig::ik(2)))
        .unwrap();

    let pole = rig.skeleton.bone("Lower_IK_Pole").unwrap();
    let offset = DVec3::new(pole.head.x, pole.head.y, 0.0);
    assert!(offset.length() > 1e-6);
}

#[test]
fn test_control_rig_end_to_end() {
    let input = body_arm();
    let engine = engine();
    let skeleton = engine
        .synthesize(&input.scene, &input.selection, input.reflection_origin, None)
        .unwrap()
        .skeleton;
    let config = RigConfig::new()
        .with_bone("Arm_L", BoneConfig::ik(2))
        .with_bone("Arm_R", BoneConfig::ik(2));
    let rig = engine.control_rig(&skeleton, &config).unwrap();
    let out = &rig.skeleton;

    assert_eq!(rig.tasks.len(), 2);
    assert_eq!(out.bones.len(), 9);
    assert_eq!(out.drivers.len(), 2);
    for driver in &out.drivers {
        assert_eq!(driver.evaluate(|b, p| out.property(b, p)), Some(1.0));
    }
    assert_eq!(out.collection_of("Arm_R_IK").unwrap().name, "Right");
    assert_eq!(out.collection_of("Body").unwrap().name, "Center");
    assert_eq!(
        out.pose_bone("Arm_L").unwrap().ik_axes.x,
        IkAxisState::Free
    );
}
