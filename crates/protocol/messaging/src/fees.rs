//! Distribution of a claimed message's fee.

use alloy_primitives::U256;

/// How the fee of a claimed message is split between the fee receiver and the recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeePolicy {
    /// Whether fees exceeding the delivery cost are partly refunded.
    pub refund_enabled: bool,
    /// The part of the fee kept by the fee receiver when refunding.
    pub delivery_cost: U256,
}

/// The payments owed for a claimed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    /// Paid to the fee receiver.
    pub fee: U256,
    /// Refunded to the message recipient.
    pub refund: U256,
}

impl FeePolicy {
    /// Splits `fee` for a message with or without call data.
    ///
    /// Only messages without call data are refunded: the receiver keeps the delivery cost and
    /// the rest goes back to the recipient.
    pub fn split(&self, fee: U256, has_calldata: bool) -> FeeSplit {
        if self.refund_enabled && !has_calldata && fee > self.delivery_cost {
            return FeeSplit { fee: self.delivery_cost, refund: fee - self.delivery_cost };
        }
        FeeSplit { fee, refund: U256::ZERO }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::disabled(false, 100, false, 100, 0)]
    #[case::refunded(true, 100, false, 30, 70)]
    #[case::with_calldata(true, 100, true, 100, 0)]
    #[case::below_cost(true, 20, false, 20, 0)]
    fn test_split(
        #[case] refund_enabled: bool,
        #[case] fee: u64,
        #[case] has_calldata: bool,
        #[case] expected_fee: u64,
        #[case] expected_refund: u64,
    ) {
        let policy = FeePolicy { refund_enabled, delivery_cost: U256::from(30) };
        assert_eq!(
            policy.split(U256::from(fee), has_calldata),
            FeeSplit { fee: U256::from(expected_fee), refund: U256::from(expected_refund) }
        );
    }
}
