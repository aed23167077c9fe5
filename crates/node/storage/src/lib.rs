#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod traits;
pub use traits::{
    Checkpoint, EventStorage, LedgerStorage, MessageStorage, PauseStorage, RateLimitStorage,
    RollupStorage, Transactional,
};

mod memory;
pub use memory::MemoryDb;

mod shared;
pub use shared::SharedStore;
