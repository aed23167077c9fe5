#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod access;
pub use access::{AccessError, CallContext, PauseType, Role};

mod events;
pub use events::BridgeEvent;

mod limits;
pub use limits::RateLimitState;

mod message;
pub use message::{EMPTY_HASH, Message, hash_pair, rolling_hash};

mod rollup;
pub use rollup::{DataChunk, FinalizationData, FinalizedState, SubmissionData};

mod status;
pub use status::{InboxStatus, OutboxStatus};
