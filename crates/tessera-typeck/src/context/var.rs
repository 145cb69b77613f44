//! Type variables, their constraints, and the undo trail.
//!
//! A variable is resolved at most once. Every resolution and every constraint
//! transfer made while a snapshot is open is recorded on the [`Trail`], so a
//! failed unification can be undone as a whole.

use crate::context::TraitId;
use crate::region::{LifetimeId, RegionId};
use crate::types::TypeId;
use tessera_mem::Idx;

/// Handle to a type variable.
pub type VarId = Idx<TypeVariable>;

/// Restriction attached to a type variable and checked when it is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeConstraint {
    /// The resolution must be a subtype of this type.
    SubtypeOf(TypeId),
    /// The resolution must implement this trait.
    Implements(TraitId),
    /// The resolution must be structurally equal to this type.
    Equals(TypeId),
    /// A reference resolution must live at least as long as the region.
    InRegion(RegionId),
    /// A reference resolution must outlive this lifetime.
    Outlives(LifetimeId),
}

/// An inference variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVariable {
    /// The variable's own type (`TyKind::Var`)
    pub ty: TypeId,
    /// Resolution, set at most once
    pub resolution: Option<TypeId>,
    /// Constraints in attachment order
    pub constraints: Vec<TypeConstraint>,
}

impl TypeVariable {
    /// Whether the variable has been resolved.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

/// One undoable mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UndoEntry {
    /// The variable was resolved; undo clears the resolution.
    Resolve(VarId),
    /// Constraints were appended; undo truncates back to `len`.
    Constrain { var: VarId, len: usize },
}

/// Open transaction marker returned by `TypeContext::snapshot`.
#[derive(Debug)]
#[must_use = "a snapshot must be committed or rolled back"]
pub struct Snapshot {
    pub(crate) trail_len: usize,
}

/// Undo log for variable mutations.
#[derive(Debug, Default)]
pub(crate) struct Trail {
    entries: Vec<UndoEntry>,
    open: usize,
}

impl Trail {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Whether any snapshot is open.
    pub(crate) fn in_snapshot(&self) -> bool {
        self.open > 0
    }

    pub(crate) fn record(&mut self, entry: UndoEntry) {
        if self.in_snapshot() {
            self.entries.push(entry);
        }
    }

    pub(crate) fn open(&mut self) -> Snapshot {
        self.open += 1;
        Snapshot {
            trail_len: self.entries.len(),
        }
    }

    /// Closes the snapshot keeping its effects.
    pub(crate) fn commit(&mut self, snapshot: Snapshot) {
        self.open = self.open.saturating_sub(1);
        if self.open == 0 {
            self.entries.clear();
        } else {
            debug_assert!(snapshot.trail_len <= self.entries.len());
        }
    }

    /// Closes the snapshot, returning its entries newest first.
    pub(crate) fn rollback(&mut self, snapshot: Snapshot) -> Vec<UndoEntry> {
        self.open = self.open.saturating_sub(1);
        let mut undone = self.entries.split_off(snapshot.trail_len);
        undone.reverse();
        undone
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_outside_snapshot_is_dropped() {
        let mut trail = Trail::new();
        trail.record(UndoEntry::Resolve(VarId::from_raw(0)));
        assert_eq!(trail.len(), 0);
    }

    #[test]
    fn test_rollback_newest_first() {
        let mut trail = Trail::new();
        let snap = trail.open();
        trail.record(UndoEntry::Resolve(VarId::from_raw(0)));
        trail.record(UndoEntry::Resolve(VarId::from_raw(1)));
        let undone = trail.rollback(snap);
        assert_eq!(
            undone,
            vec![
                UndoEntry::Resolve(VarId::from_raw(1)),
                UndoEntry::Resolve(VarId::from_raw(0)),
            ]
        );
        assert!(!trail.in_snapshot());
    }

    #[test]
    fn test_nested_commit_keeps_entries_for_outer() {
        let mut trail = Trail::new();
        let outer = trail.open();
        let inner = trail.open();
        trail.record(UndoEntry::Resolve(VarId::from_raw(3)));
        trail.commit(inner);
        assert_eq!(trail.len(), 1);
        let undone = trail.rollback(outer);
        assert_eq!(undone.len(), 1);
    }
}
