use binary_sv2::{impl_sv2_codec, Str0255};

/// Message used by a downstream to close a mining channel.
///
/// If you are sending this message through a proxy on behalf of multiple downstreams, you must
/// send it for each open channel separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseChannel {
    /// Channel id of the channel to be closed.
    pub channel_id: u32,
    /// Reason for closing the channel.
    pub reason_code: Str0255,
}

impl_sv2_codec!(CloseChannel {
    channel_id,
    reason_code
});
