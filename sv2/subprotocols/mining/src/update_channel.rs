use binary_sv2::{impl_sv2_codec, Str0255, U256};

/// Message used by a downstream to notify an upstream about changes on a specified channel.
///
/// A downstream performing device aggregation (i.e. a proxy) must send this message when its
/// downstream channels change. The update can be debounced so that it is not sent more often
/// than once per second.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateChannel {
    /// Channel identification.
    pub channel_id: u32,
    /// See [`crate::OpenStandardMiningChannel::nominal_hash_rate`].
    pub nominal_hash_rate: f32,
    /// Maximum target requested by the device.
    ///
    /// When it is smaller than the target currently used on the channel, the upstream must
    /// reflect it by sending an appropriate [`crate::SetTarget`] message.
    pub maximum_target: U256,
}

impl_sv2_codec!(UpdateChannel {
    channel_id,
    nominal_hash_rate,
    maximum_target
});

/// Message used by upstream to notify downstream about an error in the [`UpdateChannel`]
/// message.
///
/// Possible error codes: `max-target-out-of-range`, `invalid-channel-id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateChannelError {
    pub channel_id: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(UpdateChannelError {
    channel_id,
    error_code
});
