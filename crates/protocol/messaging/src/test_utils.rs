//! Test utilities for the message bridge.

use crate::{DeliveryCall, ExecutionError, Executor};
use alloy_primitives::{
    Address, Bytes, U256,
    map::{HashMap, HashSet},
};
use core::{cell::RefCell, fmt};
use std::rc::Rc;

type DeliveryHook = Rc<dyn Fn(DeliveryCall<'_>) -> Result<(), ExecutionError>>;

/// A delivery observed by the [`MockExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// The exposed message sender.
    pub sender: Address,
    /// The recipient.
    pub recipient: Address,
    /// The delivered value.
    pub value: U256,
    /// The executed call data.
    pub calldata: Bytes,
}

#[derive(Debug, Clone, Default)]
struct World {
    balances: HashMap<Address, U256>,
    deliveries: Vec<Delivery>,
}

#[derive(Debug, Default)]
struct MockState {
    world: World,
    snapshots: Vec<World>,
    rejecting: HashSet<Address>,
}

/// An [`Executor`] that credits balances in memory.
///
/// Deliveries and transfers to a rejecting account fail. An optional hook runs after every
/// delivery with no internal borrow held, so it may call back into the ledger.
#[derive(Default)]
pub struct MockExecutor {
    state: RefCell<MockState>,
    hook: RefCell<Option<DeliveryHook>>,
}

impl fmt::Debug for MockExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockExecutor")
            .field("state", &self.state)
            .field("hook", &self.hook.borrow().is_some())
            .finish()
    }
}

impl MockExecutor {
    /// Creates an executor with no balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes deliveries and transfers to `account` fail.
    pub fn set_rejecting(&self, account: Address) {
        self.state.borrow_mut().rejecting.insert(account);
    }

    /// Makes deliveries and transfers to `account` succeed again.
    pub fn clear_rejecting(&self, account: Address) {
        self.state.borrow_mut().rejecting.remove(&account);
    }

    /// Installs a hook run at the end of every delivery. A failing hook fails the delivery.
    pub fn set_hook(
        &self,
        hook: impl Fn(DeliveryCall<'_>) -> Result<(), ExecutionError> + 'static,
    ) {
        *self.hook.borrow_mut() = Some(Rc::new(hook));
    }

    /// Returns the balance credited to `account`.
    pub fn balance(&self, account: Address) -> U256 {
        self.state.borrow().world.balances.get(&account).copied().unwrap_or_default()
    }

    /// Returns every committed or pending delivery, oldest first.
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.state.borrow().world.deliveries.clone()
    }

    fn credit(&self, account: Address, amount: U256) -> Result<(), ExecutionError> {
        let mut state = self.state.borrow_mut();
        if state.rejecting.contains(&account) {
            return Err(ExecutionError::Reverted(format!("{account} rejects transfers")));
        }
        *state.world.balances.entry(account).or_default() += amount;
        Ok(())
    }
}

impl Executor for MockExecutor {
    type Checkpoint = usize;

    fn deliver(&self, call: DeliveryCall<'_>) -> Result<(), ExecutionError> {
        self.credit(call.recipient, call.value)?;
        self.state.borrow_mut().world.deliveries.push(Delivery {
            sender: call.sender,
            recipient: call.recipient,
            value: call.value,
            calldata: call.calldata.clone(),
        });

        let hook = self.hook.borrow().clone();
        hook.map_or(Ok(()), |hook| hook(call))
    }

    fn transfer(&self, recipient: Address, amount: U256) -> Result<(), ExecutionError> {
        self.credit(recipient, amount)
    }

    fn checkpoint(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let world = state.world.clone();
        state.snapshots.push(world);
        state.snapshots.len() - 1
    }

    fn commit(&self, checkpoint: usize) {
        self.state.borrow_mut().snapshots.truncate(checkpoint);
    }

    fn revert(&self, checkpoint: usize) {
        let mut state = self.state.borrow_mut();
        state.snapshots.truncate(checkpoint + 1);
        if let Some(world) = state.snapshots.pop() {
            state.world = world;
        }
    }
}
