use binary_sv2::impl_sv2_codec;

/// Message used by an upstream role for announcing a mining channel endpoint change.
///
/// This message should be sent when a mining channel’s upstream or downstream endpoint changes
/// and that channel had previously exchanged message(s) with `channel_msg` bitset of unknown
/// `extension_type`.
///
/// When receiving the message, the downstream must reset any state associated with
/// `extension_type`s on that channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEndpointChanged {
    /// Unique identifier of the channel that has changed its endpoint.
    pub channel_id: u32,
}

impl_sv2_codec!(ChannelEndpointChanged { channel_id });
