//! Editor-side state for the bone configuration list.
//!
//! The host fires change callbacks both when the user picks a row in the
//! bone list and when the bone selection in the viewport changes. Each
//! callback updates the other side, which fires the other callback again.
//! [`SelectionSync`] breaks that loop. It belongs to the editor layer only;
//! the engine stages never consult it.

use std::cell::Cell;

use crate::skeleton::{BoneKind, Skeleton};

/// Re-entrancy flag for selection synchronization.
#[derive(Debug, Default)]
pub struct SelectionSync {
    syncing: Cell<bool>,
}

/// Clears the flag of its [`SelectionSync`] when dropped.
#[derive(Debug)]
pub struct SyncGuard<'a> {
    sync: &'a SelectionSync,
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.sync.syncing.set(false);
    }
}

impl SelectionSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a synchronization is in progress.
    pub fn is_syncing(&self) -> bool {
        self.syncing.get()
    }

    /// Starts a synchronization, or returns `None` if one is already running.
    pub fn begin(&self) -> Option<SyncGuard<'_>> {
        if self.syncing.replace(true) {
            return None;
        }
        Some(SyncGuard { sync: self })
    }
}

/// Bone list of the configuration panel, kept in step with the selection.
#[derive(Debug, Default)]
pub struct BoneList {
    /// Deform bone names, in skeleton order.
    rows: Vec<String>,
    active: Option<usize>,
    selected: Option<String>,
    sync: SelectionSync,
}

impl BoneList {
    /// Lists the configurable bones of a skeleton.
    pub fn new(skeleton: &Skeleton) -> Self {
        Self {
            rows: skeleton
                .bones_of_kind(BoneKind::Deform)
                .map(|b| b.name.clone())
                .collect(),
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The user picked a row; selects its bone.
    pub fn on_row_changed(&mut self, index: usize) {
        let Some(_guard) = self.sync.begin() else {
            return;
        };
        if let Some(name) = self.rows.get(index) {
            self.active = Some(index);
            self.selected = Some(name.clone());
        }
    }

    /// The viewport selection changed; activates the matching row.
    ///
    /// Helper bones have no row, so selecting one leaves the list alone.
    pub fn on_selection_changed(&mut self, bone: &str) {
        let Some(_guard) = self.sync.begin() else {
            return;
        };
        self.selected = Some(bone.to_string());
        if let Some(index) = self.rows.iter().position(|r| r == bone) {
            self.active = Some(index);
        }
    }

    /// Flag shared with host callbacks that run outside this list.
    pub fn sync(&self) -> &SelectionSync {
        &self.sync
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;
    use glam::DVec3;

    fn skeleton() -> Skeleton {
        let mut skeleton = Skeleton::new("Rig");
        {
            let mut edit = skeleton.edit();
            edit.upsert(Bone::new("Body", DVec3::ZERO, DVec3::Z, DVec3::X));
            edit.upsert(Bone::new("Arm_L", DVec3::X, DVec3::new(1.0, 0.0, 1.0), DVec3::X));
            edit.upsert(
                Bone::new("Arm_L_IK", DVec3::X, DVec3::new(1.0, 0.0, 0.5), DVec3::X)
                    .helper(BoneKind::Control),
            );
        }
        skeleton
    }

    #[test]
    fn test_guard_blocks_reentry() {
        let sync = SelectionSync::new();
        {
            let guard = sync.begin();
            assert!(guard.is_some());
            assert!(sync.is_syncing());
            assert!(sync.begin().is_none());
        }
        assert!(!sync.is_syncing());
        assert!(sync.begin().is_some());
    }

    #[test]
    fn test_row_and_selection_follow_each_other() {
        let mut list = BoneList::new(&skeleton());
        assert_eq!(list.rows(), &["Body".to_string(), "Arm_L".to_string()]);

        list.on_row_changed(1);
        assert_eq!(list.selected(), Some("Arm_L"));
        assert_eq!(list.active(), Some(1));

        list.on_selection_changed("Body");
        assert_eq!(list.active(), Some(0));

        list.on_selection_changed("Arm_L_IK");
        assert_eq!(list.selected(), Some("Arm_L_IK"));
        assert_eq!(list.active(), Some(0));
    }

    #[test]
    fn test_callbacks_ignored_while_syncing() {
        let mut list = BoneList::new(&skeleton());
        list.on_row_changed(0);

        // Flag held by a host-side update.
        list.sync.syncing.set(true);
        list.on_row_changed(1);
        assert_eq!(list.active(), Some(0));
        list.sync.syncing.set(false);

        list.on_row_changed(1);
        assert_eq!(list.active(), Some(1));
    }
}
