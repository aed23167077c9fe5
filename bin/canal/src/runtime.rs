//! The executor and verifier the CLI runs ledgers with.

use alloy_primitives::{
    Address, U256,
    map::{HashMap, HashSet},
};
use canal_messaging::{DeliveryCall, ExecutionError, Executor};
use canal_rollup::{ProofVerifier, VerifierError};
use core::cell::RefCell;
use tracing::{debug, trace};

#[derive(Debug, Default)]
struct Accounts {
    balances: HashMap<Address, U256>,
    rejecting: HashSet<Address>,
    /// Previous balances of credited accounts, most recent last.
    journal: Vec<(Address, U256)>,
    depth: usize,
}

/// An [`Executor`] that credits value to in-memory balances.
///
/// Call data is not executed. Balance changes are journaled while a checkpoint is open and
/// undone on revert.
#[derive(Debug, Default)]
pub struct SimulatedExecutor {
    accounts: RefCell<Accounts>,
}

impl SimulatedExecutor {
    /// Creates an executor with no balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes deliveries and transfers to `account` fail.
    pub fn set_rejecting(&self, account: Address) {
        self.accounts.borrow_mut().rejecting.insert(account);
    }

    /// Returns the balance credited to `account`.
    pub fn balance(&self, account: Address) -> U256 {
        self.accounts.borrow().balances.get(&account).copied().unwrap_or_default()
    }

    fn credit(&self, account: Address, amount: U256) -> Result<(), ExecutionError> {
        let mut accounts = self.accounts.borrow_mut();
        if accounts.rejecting.contains(&account) {
            return Err(ExecutionError::Reverted(format!("{account} rejects value")));
        }

        let previous = accounts.balances.get(&account).copied().unwrap_or_default();
        let balance = previous.checked_add(amount).ok_or_else(|| {
            ExecutionError::Reverted(format!("balance of {account} would overflow"))
        })?;
        if accounts.depth > 0 {
            accounts.journal.push((account, previous));
        }
        accounts.balances.insert(account, balance);
        Ok(())
    }
}

impl Executor for SimulatedExecutor {
    type Checkpoint = usize;

    fn deliver(&self, call: DeliveryCall<'_>) -> Result<(), ExecutionError> {
        self.credit(call.recipient, call.value)?;
        debug!(
            target: "canal::executor",
            sender = %call.sender,
            recipient = %call.recipient,
            value = %call.value,
            calldata_len = call.calldata.len(),
            "Delivered message"
        );
        Ok(())
    }

    fn transfer(&self, recipient: Address, amount: U256) -> Result<(), ExecutionError> {
        self.credit(recipient, amount)
    }

    fn checkpoint(&self) -> usize {
        let mut accounts = self.accounts.borrow_mut();
        accounts.depth += 1;
        accounts.journal.len()
    }

    fn commit(&self, _checkpoint: usize) {
        let mut accounts = self.accounts.borrow_mut();
        accounts.depth = accounts.depth.saturating_sub(1);
        if accounts.depth == 0 {
            accounts.journal.clear();
        }
    }

    fn revert(&self, checkpoint: usize) {
        let mut accounts = self.accounts.borrow_mut();
        while accounts.journal.len() > checkpoint {
            if let Some((account, previous)) = accounts.journal.pop() {
                accounts.balances.insert(account, previous);
            }
        }
        accounts.depth = accounts.depth.saturating_sub(1);
        if accounts.depth == 0 {
            accounts.journal.clear();
        }
        trace!(target: "canal::executor", checkpoint, "Reverted balances");
    }
}

/// A development verifier that accepts or rejects every proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevVerifier {
    accept: bool,
}

impl DevVerifier {
    /// Creates a verifier returning `accept` for every proof.
    pub const fn new(accept: bool) -> Self {
        Self { accept }
    }
}

impl ProofVerifier for DevVerifier {
    fn verify(&self, _proof: &[u8], public_inputs: &[U256]) -> Result<bool, VerifierError> {
        debug!(target: "canal::verifier", accept = self.accept, ?public_inputs, "Verifying proof");
        Ok(self.accept)
    }
}
