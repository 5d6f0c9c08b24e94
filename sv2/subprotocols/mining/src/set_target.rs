use binary_sv2::{impl_sv2_codec, U256};

/// Message used by upstream to control the downstream submission rate by adjusting the
/// difficulty target on a specified channel.
///
/// All submits leading to hashes higher than the specified target are expected to be rejected
/// by the upstream. When the target is set on a group channel, it applies to every channel of
/// the group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetTarget {
    /// Channel identifier.
    pub channel_id: u32,
    /// Maximum value of produced hash that will be accepted by a upstream to accept shares.
    pub maximum_target: U256,
}

impl_sv2_codec!(SetTarget {
    channel_id,
    maximum_target
});
