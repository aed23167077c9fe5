//! A call-scoped reentrancy guard.

use core::cell::Cell;

/// Rejects reentrant entry into a guarded section.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: Cell<bool>,
}

impl ReentrancyGuard {
    /// Creates an unlocked guard.
    pub const fn new() -> Self {
        Self { entered: Cell::new(false) }
    }

    /// Enters the guarded section, or returns [`None`] if it is already entered.
    ///
    /// The section is left when the returned token is dropped.
    pub fn enter(&self) -> Option<Entered<'_>> {
        if self.entered.replace(true) {
            return None;
        }
        Some(Entered { entered: &self.entered })
    }

    /// Returns whether the guarded section is currently entered.
    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

/// Proof of being inside a guarded section.
#[derive(Debug)]
#[must_use = "the guarded section is left as soon as the token is dropped"]
pub struct Entered<'a> {
    entered: &'a Cell<bool>,
}

impl Drop for Entered<'_> {
    fn drop(&mut self) {
        self.entered.set(false);
    }
}
