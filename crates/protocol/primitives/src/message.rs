//! The cross-layer message and its canonical hash.

use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::SolValue;

/// The zero hash. Used as the rolling-hash seed and as the "absent" marker throughout the bridge.
pub const EMPTY_HASH: B256 = B256::ZERO;

/// A message sent from one layer to the other.
///
/// The `number` is assigned by the sending layer at send time and is strictly increasing per
/// channel. Once created a message is immutable; it is identified by [`Message::hash`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Message {
    /// The account that sent the message.
    pub sender: Address,
    /// The account the message is delivered to.
    pub recipient: Address,
    /// The fee paid to whoever claims the message on the destination layer.
    pub fee: U256,
    /// The value transferred to the recipient on delivery, excluding the fee.
    pub value: U256,
    /// The sequence number of the message.
    pub number: u64,
    /// The call data executed against the recipient.
    pub calldata: Bytes,
}

impl Message {
    /// Returns the canonical encoding of the message.
    ///
    /// This is the Solidity ABI parameter encoding of
    /// `(address sender, address recipient, uint256 fee, uint256 value, uint256 number, bytes calldata)`.
    pub fn encode(&self) -> Vec<u8> {
        (
            self.sender,
            self.recipient,
            self.fee,
            self.value,
            U256::from(self.number),
            self.calldata.clone(),
        )
            .abi_encode_params()
    }

    /// Returns the canonical hash of the message.
    ///
    /// The same hash is used as the inbox/outbox key and as the leaf of remote message trees.
    pub fn hash(&self) -> B256 {
        keccak256(self.encode())
    }
}

/// Computes the next link of a rolling hash chain: `keccak256(previous ‖ message_hash)`.
pub fn rolling_hash(previous: B256, message_hash: B256) -> B256 {
    hash_pair(previous, message_hash)
}

/// Hashes the concatenation of two 32 byte words.
pub fn hash_pair(left: B256, right: B256) -> B256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(left.as_slice());
    buf[32..].copy_from_slice(right.as_slice());
    keccak256(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, bytes, hex};

    fn message() -> Message {
        Message {
            sender: address!("0x1111111111111111111111111111111111111111"),
            recipient: address!("0x2222222222222222222222222222222222222222"),
            fee: U256::from(5),
            value: U256::from(100),
            number: 1,
            calldata: bytes!("deadbeef"),
        }
    }

    #[test]
    fn test_encode_layout() {
        let encoded = message().encode();
        // six head words, the bytes length word and one padded data word.
        assert_eq!(encoded.len(), 32 * 8);
        // the dynamic `bytes` offset points right past the head.
        assert_eq!(U256::from_be_slice(&encoded[160..192]), U256::from(192));
        assert_eq!(U256::from_be_slice(&encoded[128..160]), U256::from(1));
        assert_eq!(U256::from_be_slice(&encoded[192..224]), U256::from(4));
        assert_eq!(&encoded[224..228], hex!("deadbeef").as_slice());
    }

    #[test]
    fn test_hash_changes_with_every_field() {
        let base = message();
        let hash = base.hash();

        let mutations: Vec<Message> = vec![
            Message { sender: Address::ZERO, ..base.clone() },
            Message { recipient: Address::ZERO, ..base.clone() },
            Message { fee: U256::from(6), ..base.clone() },
            Message { value: U256::from(101), ..base.clone() },
            Message { number: 2, ..base.clone() },
            Message { calldata: Bytes::new(), ..base.clone() },
        ];
        for mutated in mutations {
            assert_ne!(mutated.hash(), hash);
        }
    }

    #[test]
    fn test_rolling_hash_is_ordered_pair_hash() {
        let a = b256!("0x0000000000000000000000000000000000000000000000000000000000000001");
        let b = b256!("0x0000000000000000000000000000000000000000000000000000000000000002");
        assert_eq!(rolling_hash(a, b), keccak256([a.as_slice(), b.as_slice()].concat()));
        assert_ne!(rolling_hash(a, b), rolling_hash(b, a));
    }
}
