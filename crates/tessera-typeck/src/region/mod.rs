//! Lifetimes, regions and borrow bookkeeping.
//!
//! A [`Lifetime`] is tied to the lexical scope depth it was created at; a
//! [`Region`] is a borrowable place owned by a lifetime. The tracker counts
//! live borrows per region and logs every borrow against the scope that made
//! it, so leaving a scope releases that scope's borrows in reverse order.
//!
//! # Example
//!
//! ```
//! use tessera_typeck::region::{BorrowError, RegionTracker};
//! use tessera_typeck::types::Mutability;
//! use tessera_mem::Symbol;
//!
//! let mut regions = RegionTracker::new();
//! regions.enter_scope();
//! let lt = regions.create_lifetime(None, false, 1);
//! let r = regions.create_region(Symbol::new(30), lt, true);
//!
//! regions.check_borrow(r, Mutability::Immutable).unwrap();
//! assert!(matches!(
//!     regions.check_borrow(r, Mutability::Mutable),
//!     Err(BorrowError::Conflict { .. })
//! ));
//!
//! regions.exit_scope();
//! assert_eq!(regions.region(r).immutable_borrows, 0);
//! ```

use crate::types::Mutability;
use std::fmt;
use tessera_log::trace;
use tessera_mem::{Arena, Idx, Symbol};

/// Handle to a lifetime.
pub type LifetimeId = Idx<Lifetime>;

/// Handle to a region.
pub type RegionId = Idx<Region>;

/// A compile-time validity span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    /// Source name without the quote; `None` for anonymous lifetimes
    pub name: Option<Symbol>,
    /// Scope depth the lifetime was declared at
    pub scope_depth: u32,
    /// `'static`
    pub is_static: bool,
}

/// A borrowable place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Name of the owning binding
    pub name: Symbol,
    /// How long the place lives
    pub lifetime: LifetimeId,
    /// Whether mutable borrows are allowed at all
    pub is_mutable: bool,
    /// Live `&` borrows
    pub immutable_borrows: u32,
    /// Live `&mut` borrows
    pub mutable_borrows: u32,
}

/// Borrow bookkeeping failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowError {
    /// The requested borrow overlaps a live borrow.
    Conflict {
        /// Region being borrowed
        region: RegionId,
        /// Requested borrow kind
        requested: Mutability,
        /// Live `&` borrows at the time
        immutable: u32,
        /// Live `&mut` borrows at the time
        mutable: u32,
    },
    /// `&mut` of a region that does not allow mutation.
    ImmutableRegion {
        /// Region being borrowed
        region: RegionId,
    },
    /// Release without a matching borrow.
    NotBorrowed {
        /// Region being released
        region: RegionId,
        /// Released borrow kind
        mutability: Mutability,
    },
}

impl fmt::Display for BorrowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BorrowError::Conflict {
                requested: Mutability::Mutable,
                immutable,
                mutable,
                ..
            } => write!(
                f,
                "cannot borrow mutably: {immutable} shared and {mutable} mutable borrows are live"
            ),
            BorrowError::Conflict { .. } => {
                write!(f, "cannot borrow immutably while mutably borrowed")
            }
            BorrowError::ImmutableRegion { .. } => {
                write!(f, "cannot borrow an immutable binding as mutable")
            }
            BorrowError::NotBorrowed { mutability, .. } => {
                let kind = if mutability.is_mut() { "mutable" } else { "shared" };
                write!(f, "release of a {kind} borrow that is not live")
            }
        }
    }
}

impl std::error::Error for BorrowError {}

/// Owns lifetimes and regions, and the per-scope borrow log.
#[derive(Debug, Clone)]
pub struct RegionTracker {
    lifetimes: Arena<Lifetime>,
    regions: Arena<Region>,
    static_lifetime: LifetimeId,
    /// One frame per open scope; the outermost frame is never popped.
    borrow_log: Vec<Vec<(RegionId, Mutability)>>,
}

impl Default for RegionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl RegionTracker {
    /// Creates a tracker holding only `'static`.
    #[must_use]
    pub fn new() -> Self {
        let mut lifetimes = Arena::new();
        let static_lifetime = lifetimes.alloc(Lifetime {
            name: None,
            scope_depth: 0,
            is_static: true,
        });
        Self {
            lifetimes,
            regions: Arena::new(),
            static_lifetime,
            borrow_log: vec![Vec::new()],
        }
    }

    /// The shared `'static` lifetime.
    #[must_use]
    pub fn static_lifetime(&self) -> LifetimeId {
        self.static_lifetime
    }

    /// Creates a lifetime at `scope_depth`.
    pub fn create_lifetime(
        &mut self,
        name: Option<Symbol>,
        is_static: bool,
        scope_depth: u32,
    ) -> LifetimeId {
        self.lifetimes.alloc(Lifetime {
            name,
            scope_depth: if is_static { 0 } else { scope_depth },
            is_static,
        })
    }

    /// Creates a region owned by `lifetime` with no live borrows.
    pub fn create_region(
        &mut self,
        name: Symbol,
        lifetime: LifetimeId,
        is_mutable: bool,
    ) -> RegionId {
        self.regions.alloc(Region {
            name,
            lifetime,
            is_mutable,
            immutable_borrows: 0,
            mutable_borrows: 0,
        })
    }

    /// Looks up a lifetime.
    #[must_use]
    pub fn lifetime(&self, id: LifetimeId) -> &Lifetime {
        &self.lifetimes[id]
    }

    /// Looks up a region.
    #[must_use]
    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id]
    }

    /// `'static` outlives everything; otherwise the shallower scope outlives
    /// the deeper one (equal depths outlive each other).
    #[must_use]
    pub fn lifetime_outlives(&self, a: LifetimeId, b: LifetimeId) -> bool {
        let la = &self.lifetimes[a];
        let lb = &self.lifetimes[b];
        if la.is_static {
            return true;
        }
        if lb.is_static {
            return false;
        }
        la.scope_depth <= lb.scope_depth
    }

    /// Registers a borrow of `region`.
    ///
    /// # Errors
    ///
    /// `ImmutableRegion` for `&mut` of an immutable place; `Conflict` when a
    /// mutable borrow meets any live borrow, or a shared borrow meets a live
    /// mutable one.
    pub fn check_borrow(
        &mut self,
        region: RegionId,
        mutability: Mutability,
    ) -> Result<(), BorrowError> {
        let r = &mut self.regions[region];
        match mutability {
            Mutability::Mutable => {
                if !r.is_mutable {
                    return Err(BorrowError::ImmutableRegion { region });
                }
                if r.immutable_borrows > 0 || r.mutable_borrows > 0 {
                    return Err(BorrowError::Conflict {
                        region,
                        requested: mutability,
                        immutable: r.immutable_borrows,
                        mutable: r.mutable_borrows,
                    });
                }
                r.mutable_borrows += 1;
            }
            Mutability::Immutable => {
                if r.mutable_borrows > 0 {
                    return Err(BorrowError::Conflict {
                        region,
                        requested: mutability,
                        immutable: r.immutable_borrows,
                        mutable: r.mutable_borrows,
                    });
                }
                r.immutable_borrows += 1;
            }
        }
        if let Some(frame) = self.borrow_log.last_mut() {
            frame.push((region, mutability));
        }
        trace!("borrow {:?} of region {}", mutability, region.into_raw());
        Ok(())
    }

    /// Ends one borrow of `region` before its scope closes.
    ///
    /// The newest matching entry is dropped from the borrow log, searching the
    /// innermost frame first, so closing its scope does not release it again.
    ///
    /// # Errors
    ///
    /// `NotBorrowed` if no such borrow is live.
    pub fn release_borrow(
        &mut self,
        region: RegionId,
        mutability: Mutability,
    ) -> Result<(), BorrowError> {
        let logged = self.borrow_log.iter_mut().rev().find_map(|frame| {
            let at = frame.iter().rposition(|&entry| entry == (region, mutability))?;
            Some((frame, at))
        });
        let Some((frame, at)) = logged else {
            return Err(BorrowError::NotBorrowed { region, mutability });
        };
        frame.remove(at);
        self.uncount(region, mutability);
        trace!("released {:?} of region {}", mutability, region.into_raw());
        Ok(())
    }

    fn uncount(&mut self, region: RegionId, mutability: Mutability) {
        let r = &mut self.regions[region];
        let counter = match mutability {
            Mutability::Mutable => &mut r.mutable_borrows,
            Mutability::Immutable => &mut r.immutable_borrows,
        };
        *counter = counter.saturating_sub(1);
    }

    /// Opens a borrow frame.
    pub fn enter_scope(&mut self) {
        self.borrow_log.push(Vec::new());
    }

    /// Closes the innermost frame, releasing its outstanding borrows newest
    /// first.
    pub fn exit_scope(&mut self) {
        if self.borrow_log.len() <= 1 {
            return;
        }
        let Some(frame) = self.borrow_log.pop() else {
            return;
        };
        for (region, mutability) in frame.into_iter().rev() {
            self.uncount(region, mutability);
        }
    }

    /// Number of lifetimes, `'static` included.
    #[must_use]
    pub fn lifetime_count(&self) -> usize {
        self.lifetimes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker_with_region(is_mutable: bool) -> (RegionTracker, RegionId) {
        let mut t = RegionTracker::new();
        let lt = t.create_lifetime(None, false, 1);
        let r = t.create_region(Symbol::new(40), lt, is_mutable);
        (t, r)
    }

    #[test]
    fn test_static_outlives_everything() {
        let mut t = RegionTracker::new();
        let deep = t.create_lifetime(None, false, 7);
        let st = t.static_lifetime();
        assert!(t.lifetime_outlives(st, deep));
        assert!(!t.lifetime_outlives(deep, st));
    }

    #[test]
    fn test_shallower_outlives_deeper() {
        let mut t = RegionTracker::new();
        let outer = t.create_lifetime(None, false, 1);
        let inner = t.create_lifetime(None, false, 3);
        let peer = t.create_lifetime(None, false, 1);
        assert!(t.lifetime_outlives(outer, inner));
        assert!(!t.lifetime_outlives(inner, outer));
        assert!(t.lifetime_outlives(outer, peer));
        assert!(t.lifetime_outlives(peer, outer));
    }

    #[test]
    fn test_shared_borrows_stack() {
        let (mut t, r) = tracker_with_region(false);
        assert!(t.check_borrow(r, Mutability::Immutable).is_ok());
        assert!(t.check_borrow(r, Mutability::Immutable).is_ok());
        assert_eq!(t.region(r).immutable_borrows, 2);
    }

    #[test]
    fn test_mutable_excludes_everything() {
        let (mut t, r) = tracker_with_region(true);
        assert!(t.check_borrow(r, Mutability::Mutable).is_ok());
        assert!(matches!(
            t.check_borrow(r, Mutability::Immutable),
            Err(BorrowError::Conflict { .. })
        ));
        assert!(matches!(
            t.check_borrow(r, Mutability::Mutable),
            Err(BorrowError::Conflict { .. })
        ));
        assert_eq!(t.region(r).mutable_borrows, 1);
    }

    #[test]
    fn test_mutable_borrow_of_immutable_region() {
        let (mut t, r) = tracker_with_region(false);
        assert_eq!(
            t.check_borrow(r, Mutability::Mutable),
            Err(BorrowError::ImmutableRegion { region: r })
        );
    }

    #[test]
    fn test_release_without_borrow() {
        let (mut t, r) = tracker_with_region(true);
        assert!(matches!(
            t.release_borrow(r, Mutability::Mutable),
            Err(BorrowError::NotBorrowed { .. })
        ));
    }

    #[test]
    fn test_exit_scope_releases_only_inner_borrows() {
        let (mut t, r) = tracker_with_region(true);
        t.check_borrow(r, Mutability::Immutable).unwrap();
        t.enter_scope();
        t.check_borrow(r, Mutability::Immutable).unwrap();
        assert_eq!(t.region(r).immutable_borrows, 2);
        t.exit_scope();
        assert_eq!(t.region(r).immutable_borrows, 1);
        // The outermost frame is never popped.
        t.exit_scope();
        assert_eq!(t.region(r).immutable_borrows, 1);
    }

    #[test]
    fn test_early_release_is_not_released_again() {
        let (mut t, r) = tracker_with_region(true);
        t.check_borrow(r, Mutability::Immutable).unwrap();
        t.enter_scope();
        t.check_borrow(r, Mutability::Immutable).unwrap();
        t.release_borrow(r, Mutability::Immutable).unwrap();
        assert_eq!(t.region(r).immutable_borrows, 1);

        t.exit_scope();
        // the outer borrow is still live
        assert_eq!(t.region(r).immutable_borrows, 1);
        assert!(matches!(
            t.check_borrow(r, Mutability::Mutable),
            Err(BorrowError::Conflict { .. })
        ));
    }

    #[test]
    fn test_release_reaches_outer_frames() {
        let (mut t, r) = tracker_with_region(true);
        t.check_borrow(r, Mutability::Mutable).unwrap();
        t.enter_scope();
        t.release_borrow(r, Mutability::Mutable).unwrap();
        assert_eq!(t.region(r).mutable_borrows, 0);
        assert!(matches!(
            t.release_borrow(r, Mutability::Mutable),
            Err(BorrowError::NotBorrowed { .. })
        ));
        t.exit_scope();
        assert!(t.check_borrow(r, Mutability::Immutable).is_ok());
    }
}
