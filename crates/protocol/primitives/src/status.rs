//! Inbox and outbox statuses.

/// The status of an inbound message hash on this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum InboxStatus {
    /// The message has never been made deliverable.
    #[default]
    Unknown,
    /// The message can be claimed.
    Received,
    /// The message has been claimed.
    Claimed,
}

/// The status of an outbound message hash sent from this layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum OutboxStatus {
    /// The message was never sent.
    #[default]
    Unknown,
    /// The message was sent and awaits acknowledgement from the remote layer.
    Sent,
    /// The remote layer acknowledged the message.
    Received,
}
