//! A store shared between the components of one ledger.

use core::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// A handle to a store shared by every component of a ledger.
///
/// Ledger execution is serialized and the handle is neither `Send` nor `Sync`. Borrows must not
/// be held across a call into untrusted code, which may reenter the ledger.
#[derive(Debug, Default)]
pub struct SharedStore<S>(Rc<RefCell<S>>);

impl<S> SharedStore<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self(Rc::new(RefCell::new(store)))
    }

    /// Borrows the store immutably.
    pub fn borrow(&self) -> Ref<'_, S> {
        self.0.borrow()
    }

    /// Borrows the store mutably.
    pub fn borrow_mut(&self) -> RefMut<'_, S> {
        self.0.borrow_mut()
    }
}

impl<S> Clone for SharedStore<S> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}
