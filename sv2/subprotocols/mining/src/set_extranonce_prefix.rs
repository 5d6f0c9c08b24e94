use binary_sv2::{impl_sv2_codec, B032};

/// Message used by upstream to change downstream node’s extranonce prefix.
///
/// The new extranonce prefix size must be less than or equal to the extranonce size negotiated
/// when the channel was opened. It takes effect with the next job sent on the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetExtranoncePrefix {
    /// Extended or Standard Channel identifier.
    pub channel_id: u32,
    /// New extranonce prefix.
    pub extranonce_prefix: B032,
}

impl_sv2_codec!(SetExtranoncePrefix {
    channel_id,
    extranonce_prefix
});
