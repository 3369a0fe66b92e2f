//! Debug-only reentrancy guard.
//!
//! `ChainedHashMap` calls into user code (`K: Hash`, `K: Eq`) while walking
//! and splicing chains. If that code reaches back into the same map, the map
//! would observe half-updated links. In debug builds the guard turns that into
//! a panic naming both operations; in release builds it compiles away.

use core::cell::Cell;
use core::marker::PhantomData;

/// Per-map tracker. Public entry points open a section with
/// `let _g = self.reentrancy.enter("op");`.
#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<Option<&'static str>>,
    // !Sync in every build profile, not only when `active` exists.
    _nosync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(None),
            _nosync: PhantomData,
        }
    }

    /// Open a guarded section for operation `op`. Panics in debug builds if
    /// another section on the same map is still open.
    #[inline]
    pub(crate) fn enter(&self, op: &'static str) -> ReentrancyGuard<'_> {
        #[cfg(debug_assertions)]
        {
            if let Some(outer) = self.active.get() {
                panic!("reentrant call to ChainedHashMap::{op} during ChainedHashMap::{outer}");
            }
            self.active.set(Some(op));
            return ReentrancyGuard { owner: self };
        }

        #[cfg(not(debug_assertions))]
        {
            let _ = op;
            return ReentrancyGuard { _owner: PhantomData };
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// Closes the section on drop.
pub(crate) struct ReentrancyGuard<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _owner: PhantomData<&'a DebugReentrancy>,
}

impl Drop for ReentrancyGuard<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            debug_assert!(self.owner.active.get().is_some());
            self.owner.active.set(None);
        }
    }
}
