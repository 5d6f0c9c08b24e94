use binary_sv2::{impl_sv2_codec, Seq064K, B016M};

/// Message used by JDS to ask for the transactions of a [`crate::DeclareMiningJob`] it could
/// not find in its mempool.
///
/// Transactions are given by their position in the `wtxid_list` of the declaration, 0-indexed
/// and not counting the coinbase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideMissingTransactions {
    /// Must be the same as the received [`crate::DeclareMiningJob::request_id`].
    pub request_id: u32,
    pub unknown_tx_position_list: Seq064K<u16>,
}

impl_sv2_codec!(ProvideMissingTransactions {
    request_id,
    unknown_tx_position_list
});

/// Message used by JDC to answer [`ProvideMissingTransactions`] with the full transactions, in
/// the order they were requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvideMissingTransactionsSuccess {
    /// Must be the same as the received [`ProvideMissingTransactions::request_id`].
    pub request_id: u32,
    pub transaction_list: Seq064K<B016M>,
}

impl_sv2_codec!(ProvideMissingTransactionsSuccess {
    request_id,
    transaction_list
});

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use binary_sv2::{from_bytes, to_bytes};
    use core::convert::TryFrom;

    #[test]
    fn positions_are_two_bytes_each() {
        let request = ProvideMissingTransactions {
            request_id: 3,
            unknown_tx_position_list: Seq064K::new(vec![0, 258]).unwrap(),
        };
        let encoded = to_bytes(&request).unwrap();
        assert_eq!(encoded, vec![3, 0, 0, 0, 2, 0, 0, 0, 2, 1]);
        assert_eq!(
            from_bytes::<ProvideMissingTransactions>(&encoded).unwrap(),
            request
        );
    }

    #[test]
    fn missing_transactions_round_trip() {
        let success = ProvideMissingTransactionsSuccess {
            request_id: 3,
            transaction_list: Seq064K::new(vec![
                B016M::try_from(vec![0xaa; 300]).unwrap(),
                B016M::try_from(vec![0xbb]).unwrap(),
            ])
            .unwrap(),
        };
        let encoded = to_bytes(&success).unwrap();
        assert_eq!(encoded.len(), 4 + 2 + (3 + 300) + (3 + 1));
        assert_eq!(
            from_bytes::<ProvideMissingTransactionsSuccess>(&encoded).unwrap(),
            success
        );
    }
}
