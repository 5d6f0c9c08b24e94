use binary_sv2::{impl_sv2_codec, Seq064K, Str0255, B016M, B064K};

/// Message used by a downstream to request data about all transactions in a block template.
///
/// Data includes the full transaction data and any additional data required to block validation.
///
/// Note that the coinbase transaction is excluded from this data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTransactionData {
    /// Identifier of the template that the downstream node is requesting transaction data for.
    pub template_id: u64,
}

impl_sv2_codec!(RequestTransactionData { template_id });

/// Message used by an upstream (Template Provider) to respond successfully to a
/// [`RequestTransactionData`] message.
///
/// A response to [`RequestTransactionData`] which contains the set of full transaction data and
/// excess data required for validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTransactionDataSuccess {
    /// The template identifier that the transactions are in reference to.
    pub template_id: u64,
    /// Extra data which the Pool may require to validate the work (as defined in the Template
    /// Distribution Protocol).
    pub excess_data: B064K,
    /// The transaction data, serialized as a series of `B0_16M` byte arrays.
    pub transaction_list: Seq064K<B016M>,
}

impl_sv2_codec!(RequestTransactionDataSuccess {
    template_id,
    excess_data,
    transaction_list
});

/// Message used by an upstream (Template Provider) to respond with an error to a
/// [`RequestTransactionData`] message.
///
/// Possible error codes: `template-id-not-found`, `stale-template-id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTransactionDataError {
    /// The template identifier that the data was requested for.
    pub template_id: u64,
    /// Reason why no transaction data has been provided.
    pub error_code: Str0255,
}

impl_sv2_codec!(RequestTransactionDataError {
    template_id,
    error_code
});
