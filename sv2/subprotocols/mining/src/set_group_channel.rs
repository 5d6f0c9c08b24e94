use binary_sv2::{impl_sv2_codec, Seq064K};

/// Message used by upstream to associate a set of Standard Channel(s) to a Group Channel.
///
/// A channel becomes part of a group as a result of receiving this message. Each channel can be
/// part of a single group at a time; if it was already part of another group, it is removed
/// from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetGroupChannel {
    /// Identifier of the Group Channel.
    pub group_channel_id: u32,
    /// Identifiers of the Standard Channels belonging to the Group Channel.
    pub channel_ids: Seq064K<u32>,
}

impl_sv2_codec!(SetGroupChannel {
    group_channel_id,
    channel_ids
});

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use binary_sv2::{from_bytes, to_bytes};

    #[quickcheck_macros::quickcheck]
    fn test_set_group_channel(group_channel_id: u32, channel_ids: Vec<u32>) -> bool {
        let channel_ids: Vec<u32> = channel_ids.into_iter().take(1000).collect();
        let len = channel_ids.len();
        let sgc = SetGroupChannel {
            group_channel_id,
            channel_ids: Seq064K::new(channel_ids).unwrap(),
        };
        let encoded = to_bytes(&sgc).unwrap();
        encoded.len() == 4 + 2 + 4 * len && from_bytes::<SetGroupChannel>(&encoded) == Ok(sgc)
    }
}
