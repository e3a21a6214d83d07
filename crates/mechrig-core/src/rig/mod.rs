//! IK control-rig generation.
//!
//! For every deform bone flagged `use_ik`, the generator adds a control
//! bone (the user's handle), a solver bone parented to it (the IK target),
//! and a pole bone, then wires an IK constraint whose influence is driven
//! by an FK/IK blend property on the control. Rotation limits along the
//! chain become IK axis locks.
//!
//! The work is split into four passes so that topology edits and pose
//! wiring never interleave:
//! 1. analysis over a read-only skeleton and a [`BoneSnapshot`];
//! 2. one edit phase creating and removing helper bones;
//! 3. one pose-setup phase for display, constraints, and drivers;
//! 4. IK lock propagation from the snapshot.

mod collection;
mod color;
mod config;
mod pole;
mod widget;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::{CompiledConventions, SynthesisSettings};
use crate::error::{RigError, RigResult, RigWarning};
use crate::skeleton::{
    Bone, BoneKind, BoneSnapshot, Constraint, CustomProperty, Driver, IkAxes, IkConstraint,
    PoseSetupPhase, Skeleton, IK_CONSTRAINT,
};

pub use collection::{BoneCollection, CollectionPreset};
pub use color::{BoneColor, BoneColorScheme};
pub use config::{BoneConfig, RigConfig};
pub use pole::{place_pole, PolePlacement};
pub use widget::{CustomShape, WidgetShape};

/// Scale of the control bone's box widget relative to its length.
const CONTROL_WIDGET_SCALE: f64 = 1.5;

/// Length of the control bone relative to its owner.
const CONTROL_LENGTH_RATIO: f64 = 0.5;

/// Length of solver and pole bones relative to their owner.
const HELPER_LENGTH_RATIO: f64 = 0.25;

/// An IK apparatus created in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IkTask {
    pub owner: String,
    pub control: String,
    pub solver: String,
    pub pole: String,
    /// Chain length after clamping to the owner's ancestry.
    pub chain_length: u8,
}

/// Result of [`apply_controls`].
#[derive(Debug, Clone)]
pub struct ControlRig {
    pub skeleton: Skeleton,
    /// Apparatus created in this run.
    pub tasks: Vec<IkTask>,
    /// Owners whose existing IK constraint was kept and re-chained.
    pub updated: Vec<String>,
    /// Owners whose apparatus was withdrawn.
    pub removed: Vec<String>,
    pub warnings: Vec<RigWarning>,
}

/// What pass 1 decided for one owner.
#[derive(Debug, Clone)]
enum Plan {
    Create {
        task: IkTask,
        control: Bone,
        solver: Bone,
        pole: Bone,
    },
    Update {
        owner: String,
        chain_length: u8,
        old_chain: u8,
    },
    Remove {
        owner: String,
        helpers: [String; 3],
        old_chain: Option<u8>,
    },
}

/// Builds the control rig for a skeleton.
///
/// The input skeleton is not mutated. Running this twice with the same
/// configuration yields the same skeleton.
#[instrument(skip_all, fields(skeleton = %skeleton.name, requests = config.ik_requests().count()))]
pub fn apply_controls(
    skeleton: &Skeleton,
    config: &RigConfig,
    conventions: &CompiledConventions,
    settings: &SynthesisSettings,
) -> RigResult<ControlRig> {
    config.validate(skeleton)?;

    // Pass 1: analysis
    let snapshot = skeleton.snapshot();
    let mut warnings = Vec::new();
    let mut plans = Vec::new();
    for owner in skeleton.bones_of_kind(BoneKind::Deform) {
        if let Some(plan) = plan_owner(skeleton, owner, config, conventions, settings, &mut warnings) {
            plans.push(plan);
        }
    }

    let mut rig = skeleton.clone();

    // Pass 2: topology
    if plans.iter().any(|p| !matches!(p, Plan::Update { .. })) {
        let mut edit = rig.edit();
        for plan in &plans {
            match plan {
                Plan::Create {
                    control,
                    solver,
                    pole,
                    ..
                } => {
                    edit.upsert(control.clone());
                    edit.upsert(solver.clone());
                    edit.upsert(pole.clone());
                }
                Plan::Remove { helpers, .. } => {
                    for helper in helpers {
                        edit.remove(helper);
                    }
                }
                Plan::Update { .. } => {}
            }
        }
    }

    // Pass 3: display, constraints, drivers
    {
        let mut pose = rig.pose_setup();
        for bone in skeleton.bones_of_kind(BoneKind::Deform) {
            let preset = display_preset(bone, conventions);
            let shape = config.bone(&bone.name).control_shape;
            pose.assign_collection(&bone.name, preset);
            let pose_bone = pose.pose_bone_mut(&bone.name)?;
            pose_bone.color = Some(config.colors.color_for(preset));
            pose_bone.shape = CustomShape::for_bone(shape, bone.length(), 1.0);
        }
        for plan in &plans {
            wire(&mut pose, plan, skeleton, config, conventions)?;
        }
    }

    // Pass 4: IK locks, previous chains cleared first so active chains win.
    {
        let mut pose = rig.pose_setup();
        for plan in &plans {
            let (owner, count) = match plan {
                Plan::Remove {
                    owner,
                    old_chain: Some(count),
                    ..
                } => (owner, *count),
                Plan::Update {
                    owner, old_chain, ..
                } => (owner, *old_chain),
                _ => continue,
            };
            for link in snapshot.chain(owner, usize::from(count)) {
                pose.pose_bone_mut(&link.name)?.ik_axes = IkAxes::default();
            }
        }
        for plan in &plans {
            let (owner, count) = match plan {
                Plan::Create { task, .. } => (&task.owner, task.chain_length),
                Plan::Update {
                    owner,
                    chain_length,
                    ..
                } => (owner, *chain_length),
                Plan::Remove { .. } => continue,
            };
            propagate_locks(&mut pose, &snapshot, owner, count, settings.epsilon)?;
        }
    }

    let mut tasks = Vec::new();
    let mut updated = Vec::new();
    let mut removed = Vec::new();
    for plan in plans {
        match plan {
            Plan::Create { task, .. } => tasks.push(task),
            Plan::Update { owner, .. } => updated.push(owner),
            Plan::Remove { owner, .. } => removed.push(owner),
        }
    }

    info!(
        created = tasks.len(),
        updated = updated.len(),
        removed = removed.len(),
        "control rig applied"
    );
    Ok(ControlRig {
        skeleton: rig,
        tasks,
        updated,
        removed,
        warnings,
    })
}

fn plan_owner(
    skeleton: &Skeleton,
    owner: &Bone,
    config: &RigConfig,
    conventions: &CompiledConventions,
    settings: &SynthesisSettings,
    warnings: &mut Vec<RigWarning>,
) -> Option<Plan> {
    let bone_config = config.bone(&owner.name);
    let control = conventions.control_name(&owner.name);
    let solver = conventions.solver_name(&owner.name);
    let pole = conventions.pole_name(&owner.name);
    let existing_ik = skeleton
        .pose_bone(&owner.name)
        .and_then(|p| p.ik())
        .filter(|ik| ik.target == solver);

    if !bone_config.use_ik {
        let has_helpers = [&control, &solver, &pole]
            .iter()
            .any(|name| skeleton.contains(name));
        if !has_helpers && existing_ik.is_none() {
            return None;
        }
        debug!(owner = %owner.name, "IK withdrawn");
        return Some(Plan::Remove {
            owner: owner.name.clone(),
            old_chain: existing_ik.map(|ik| ik.chain_count),
            helpers: [control, solver, pole],
        });
    }

    let chain_length = clamp_chain(skeleton, &owner.name, bone_config.chain_length, warnings);
    let complete =
        skeleton.contains(&control) && skeleton.contains(&solver) && skeleton.contains(&pole);
    if let (Some(ik), true) = (existing_ik, complete) {
        return Some(Plan::Update {
            owner: owner.name.clone(),
            chain_length,
            old_chain: ik.chain_count,
        });
    }

    let (control_bone, solver_bone, pole_bone) =
        build_apparatus(skeleton, owner, &control, &solver, &pole, settings);
    Some(Plan::Create {
        task: IkTask {
            owner: owner.name.clone(),
            control,
            solver,
            pole,
            chain_length,
        },
        control: control_bone,
        solver: solver_bone,
        pole: pole_bone,
    })
}

/// Clamps a requested chain length to the owner's ancestry.
fn clamp_chain(
    skeleton: &Skeleton,
    owner: &str,
    requested: u8,
    warnings: &mut Vec<RigWarning>,
) -> u8 {
    let available = u8::try_from(skeleton.available_links(owner)).unwrap_or(u8::MAX);
    if requested <= available {
        return requested;
    }
    let warning = RigWarning::from(RigError::DanglingChain {
        bone: owner.to_string(),
        requested,
        available,
    });
    warn!(code = %warning.code, bone = owner, "{}", warning.message);
    warnings.push(warning);
    available
}

/// Control at the owner's head, solver at its tail, pole off the bend.
fn build_apparatus(
    skeleton: &Skeleton,
    owner: &Bone,
    control: &str,
    solver: &str,
    pole: &str,
    settings: &SynthesisSettings,
) -> (Bone, Bone, Bone) {
    let frame = owner.frame();
    let direction = frame.y_axis;
    let length = owner.length();

    let mut control_bone = Bone::new(
        control,
        owner.head,
        owner.head + direction * length * CONTROL_LENGTH_RATIO,
        owner.roll_axis,
    )
    .helper(BoneKind::Control);
    control_bone.side = owner.side;

    let mut solver_bone = Bone::new(
        solver,
        owner.tail,
        owner.tail + direction * length * HELPER_LENGTH_RATIO,
        owner.roll_axis,
    )
    .helper(BoneKind::Solver)
    .with_parent(control);
    solver_bone.side = owner.side;

    let top = owner
        .parent
        .as_deref()
        .and_then(|p| skeleton.bone(p))
        .map(|p| p.head)
        .unwrap_or(owner.head);
    let placement = place_pole(top, owner.head, owner.tail, frame.z_axis, settings.epsilon);
    let mut pole_bone = Bone::new(
        pole,
        placement.position,
        placement.position + direction * length * HELPER_LENGTH_RATIO,
        owner.roll_axis,
    )
    .helper(BoneKind::Pole);
    pole_bone.side = owner.side;

    debug!(owner = %owner.name, collinear = placement.collinear, "IK apparatus planned");
    (control_bone, solver_bone, pole_bone)
}

/// Collection for a deform bone: pistons go to Mechanics, the rest by side.
fn display_preset(bone: &Bone, conventions: &CompiledConventions) -> CollectionPreset {
    if bone.piston.is_some() {
        CollectionPreset::Mechanics
    } else {
        CollectionPreset::for_side(conventions.display_side(&bone.name))
    }
}

fn wire(
    pose: &mut PoseSetupPhase<'_>,
    plan: &Plan,
    skeleton: &Skeleton,
    config: &RigConfig,
    conventions: &CompiledConventions,
) -> RigResult<()> {
    match plan {
        Plan::Create {
            task,
            control,
            pole,
            ..
        } => {
            let owner_preset = skeleton
                .bone(&task.owner)
                .map(|b| display_preset(b, conventions))
                .unwrap_or(CollectionPreset::Center);
            let owner_color = config.colors.color_for(owner_preset);

            pose.pose_bone_mut(&task.owner)?
                .set_constraint(Constraint::Ik(IkConstraint {
                    target: task.solver.clone(),
                    pole: Some(task.pole.clone()),
                    pole_angle: 0.0,
                    chain_count: task.chain_length,
                    influence: 1.0,
                }));

            let blend = conventions.blend_property();
            pose.assign_collection(&task.control, owner_preset);
            let control_pose = pose.pose_bone_mut(&task.control)?;
            control_pose
                .properties
                .entry(blend.to_string())
                .or_insert_with(|| CustomProperty::new(1.0, 0.0, 1.0));
            control_pose.color = Some(owner_color);
            control_pose.shape =
                CustomShape::for_bone(WidgetShape::Box, control.length(), CONTROL_WIDGET_SCALE);

            pose.assign_collection(&task.solver, CollectionPreset::Mechanism);
            let solver_pose = pose.pose_bone_mut(&task.solver)?;
            solver_pose.color = Some(config.colors.color_for(CollectionPreset::Mechanism));
            solver_pose.shape = None;

            pose.assign_collection(&task.pole, owner_preset);
            let pole_pose = pose.pose_bone_mut(&task.pole)?;
            pole_pose.color = Some(owner_color);
            pole_pose.shape = CustomShape::for_bone(WidgetShape::Sphere, pole.length(), 1.0);

            pose.set_driver(Driver::ik_blend(&task.owner, &task.control, blend));
        }
        Plan::Update {
            owner,
            chain_length,
            ..
        } => {
            if let Some(ik) = pose.pose_bone_mut(owner)?.ik_mut() {
                ik.chain_count = *chain_length;
            }
        }
        Plan::Remove { owner, .. } => {
            pose.pose_bone_mut(owner)?.remove_constraint(IK_CONSTRAINT);
            pose.remove_drivers(owner, IK_CONSTRAINT);
        }
    }
    Ok(())
}

/// Copies rotation limits along the chain into IK axis locks.
fn propagate_locks(
    pose: &mut PoseSetupPhase<'_>,
    snapshot: &BoneSnapshot,
    owner: &str,
    count: u8,
    epsilon: f64,
) -> RigResult<()> {
    for link in snapshot.chain(owner, usize::from(count)) {
        let axes = link
            .limit
            .map(|limit| IkAxes::from_limit(&limit, epsilon))
            .unwrap_or_default();
        pose.pose_bone_mut(&link.name)?.ik_axes = axes;
    }
    Ok(())
}
