//! Pause flag management.

use canal_primitives::{AccessError, BridgeEvent, CallContext, PauseType, Role};
use canal_storage::{EventStorage, PauseStorage};
use tracing::info;

/// Sets and clears pause flags over a store.
#[derive(Debug)]
pub struct PauseManager<'s, S> {
    store: &'s mut S,
}

impl<'s, S> PauseManager<'s, S>
where
    S: PauseStorage + EventStorage,
{
    /// Creates a pause manager over `store`.
    pub const fn new(store: &'s mut S) -> Self {
        Self { store }
    }

    /// Sets `pause_type`.
    pub fn pause(&mut self, ctx: &CallContext, pause_type: PauseType) -> Result<(), AccessError> {
        ctx.require_role(Role::PauseManager)?;
        if self.store.is_paused(pause_type) {
            return Err(AccessError::IsPaused(pause_type));
        }

        self.store.set_paused(pause_type, true);
        self.store.emit(BridgeEvent::Paused { caller: ctx.caller, pause_type });
        info!(target: "ledger", %pause_type, caller = %ctx.caller, "Paused");
        Ok(())
    }

    /// Clears `pause_type`.
    pub fn unpause(&mut self, ctx: &CallContext, pause_type: PauseType) -> Result<(), AccessError> {
        ctx.require_role(Role::PauseManager)?;
        if !self.store.is_paused(pause_type) {
            return Err(AccessError::IsNotPaused(pause_type));
        }

        self.store.set_paused(pause_type, false);
        self.store.emit(BridgeEvent::Unpaused { caller: ctx.caller, pause_type });
        info!(target: "ledger", %pause_type, caller = %ctx.caller, "Unpaused");
        Ok(())
    }
}
