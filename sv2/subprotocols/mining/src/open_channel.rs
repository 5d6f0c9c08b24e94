use binary_sv2::{impl_sv2_codec, Str0255, B032, U256};
use core::convert::TryFrom;

/// Message used by a downstream to request opening a Standard Channel.
///
/// Upon receiving `SetupConnectionSuccess` message, the downstream should open channel(s) on the
/// connection within a reasonable period, otherwise the upstream should close the connection for
/// inactivity.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenStandardMiningChannel {
    /// Specified by downstream role.
    ///
    /// Used for matching responses from upstream. The value must be connection-wide unique and
    /// is not interpreted by the upstream.
    pub request_id: u32,
    /// Unconstrained sequence of bytes.
    ///
    /// Whatever is needed by upstream role to identify/authenticate the downstream, e.g.
    /// "test.worker1". It is highly recommended to use UTF-8 encoding.
    pub user_identity: Str0255,
    /// Expected hash rate of the device (or cumulative hashrate on the channel if multiple devices
    /// are connected downstream) in h/s.
    ///
    /// Proxy must send 0.0f when there are no mining devices connected yet.
    pub nominal_hash_rate: f32,
    /// Maximum target which can be accepted by the connected device(s).
    ///
    /// Upstream must accept the target or respond by sending [`OpenMiningChannelError`] message.
    pub max_target: U256,
}

impl_sv2_codec!(OpenStandardMiningChannel {
    request_id,
    user_identity,
    nominal_hash_rate,
    max_target
});

impl OpenStandardMiningChannel {
    pub fn get_request_id_as_u32(&self) -> u32 {
        self.request_id
    }

    /// Replaces the request id, used by proxies that multiplex downstream requests.
    pub fn update_id(&mut self, new_id: u32) {
        self.request_id = new_id;
    }
}

/// Message used by upstream to accept [`OpenStandardMiningChannel`] request from downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenStandardMiningChannelSuccess {
    /// Extracted from the corresponding [`OpenStandardMiningChannel`] message.
    pub request_id: u32,
    /// Newly assigned identifier of the channel, stable for the whole lifetime of the connection.
    ///
    /// This will also be used for broadcasting new jobs by [`crate::NewMiningJob`].
    pub channel_id: u32,
    /// Initial target for the mining channel.
    pub target: U256,
    /// Bytes used as implicit first part of extranonce for the scenario when the job is served by
    /// the downstream role for a set of standard channels that belong to the same group.
    pub extranonce_prefix: B032,
    /// Group channel into which the new channel belongs. See [`crate::SetGroupChannel`].
    pub group_channel_id: u32,
}

impl_sv2_codec!(OpenStandardMiningChannelSuccess {
    request_id,
    channel_id,
    target,
    extranonce_prefix,
    group_channel_id
});

impl OpenStandardMiningChannelSuccess {
    pub fn get_request_id_as_u32(&self) -> u32 {
        self.request_id
    }

    pub fn update_id(&mut self, new_id: u32) {
        self.request_id = new_id;
    }
}

/// Message used by a downstream to request opening an Extended Channel with an upstream role.
///
/// The main difference with [`OpenStandardMiningChannel`] is that the extranonce size is not
/// fixed: the upstream sets it based on [`OpenExtendedMiningChannel::min_extranonce_size`].
#[derive(Debug, Clone, PartialEq)]
pub struct OpenExtendedMiningChannel {
    pub request_id: u32,
    pub user_identity: Str0255,
    /// Expected hash rate in h/s.
    pub nominal_hash_rate: f32,
    pub max_target: U256,
    /// Minimum size of extranonce needed by the downstream device/role.
    pub min_extranonce_size: u16,
}

impl_sv2_codec!(OpenExtendedMiningChannel {
    request_id,
    user_identity,
    nominal_hash_rate,
    max_target,
    min_extranonce_size
});

impl OpenExtendedMiningChannel {
    pub fn get_request_id_as_u32(&self) -> u32 {
        self.request_id
    }
}

/// Message used by upstream to accept [`OpenExtendedMiningChannel`] request from downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenExtendedMiningChannelSuccess {
    pub request_id: u32,
    /// Newly assigned identifier of the channel, stable for the whole lifetime of the connection.
    ///
    /// This will also be used for broadcasting new jobs by [`crate::NewExtendedMiningJob`].
    pub channel_id: u32,
    /// Initial target for the mining channel.
    pub target: U256,
    /// Extranonce size (in bytes) set for the channel.
    pub extranonce_size: u16,
    /// Bytes used as implicit first part of extranonce.
    pub extranonce_prefix: B032,
}

impl_sv2_codec!(OpenExtendedMiningChannelSuccess {
    request_id,
    channel_id,
    target,
    extranonce_size,
    extranonce_prefix
});

/// Message used by upstream to reject [`OpenExtendedMiningChannel`] or
/// [`OpenStandardMiningChannel`] request from downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenMiningChannelError {
    pub request_id: u32,
    /// Human-readable error code(s), e.g. `unknown-user` or `max-target-out-of-range`.
    pub error_code: Str0255,
}

impl_sv2_codec!(OpenMiningChannelError {
    request_id,
    error_code
});

impl OpenMiningChannelError {
    /// Builds the error from a code. Codes longer than 255 bytes are replaced by an empty code.
    pub fn new(request_id: u32, error_code: &str) -> Self {
        Self {
            request_id,
            error_code: Str0255::try_from(error_code).unwrap_or_default(),
        }
    }

    pub fn new_max_target_out_of_range(request_id: u32) -> Self {
        Self::new(request_id, "max-target-out-of-range")
    }

    pub fn unsupported_extranonce_size(request_id: u32) -> Self {
        Self::new(request_id, "unsupported-min-extranonce-size")
    }

    pub fn new_unknown_user(request_id: u32) -> Self {
        Self::new(request_id, "unknown-user")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::from_arbitrary_vec_to_array;
    use alloc::{string::String, vec::Vec};
    use binary_sv2::{from_bytes, to_bytes, GetSize};

    #[quickcheck_macros::quickcheck]
    fn test_open_standard_mining_channel_fns(
        request_id: u32,
        user_identity: String,
        nominal_hash_rate: f32,
        max_target: Vec<u8>,
        new_request_id: u32,
    ) -> bool {
        let user_identity: String = user_identity.chars().take(60).collect();
        let mut osmc = OpenStandardMiningChannel {
            request_id,
            user_identity: Str0255::try_from(user_identity).unwrap(),
            nominal_hash_rate,
            max_target: U256::from(from_arbitrary_vec_to_array(max_target)),
        };
        let test_request_id_1 = osmc.get_request_id_as_u32();
        osmc.update_id(new_request_id);
        request_id == test_request_id_1 && osmc.get_request_id_as_u32() == new_request_id
    }

    #[test]
    fn open_standard_mining_channel_layout() {
        let osmc = OpenStandardMiningChannel {
            request_id: 1,
            user_identity: Str0255::try_from("user").unwrap(),
            nominal_hash_rate: 10.0,
            max_target: U256::from([0xff; 32]),
        };
        let encoded = to_bytes(&osmc).unwrap();
        assert_eq!(encoded.len(), 4 + 1 + 4 + 4 + 32);
        assert_eq!(&encoded[..5], &[1, 0, 0, 0, 4]);
        assert_eq!(&encoded[5..9], b"user");
        assert_eq!(&encoded[9..13], &10.0_f32.to_le_bytes());
        assert_eq!(from_bytes::<OpenStandardMiningChannel>(&encoded).unwrap(), osmc);
    }

    #[quickcheck_macros::quickcheck]
    fn test_open_extended_mining_channel_success(
        request_id: u32,
        channel_id: u32,
        target: Vec<u8>,
        extranonce_size: u16,
        extranonce_prefix: Vec<u8>,
    ) -> bool {
        let extranonce_prefix: Vec<u8> = extranonce_prefix.into_iter().take(32).collect();
        let oemcs = OpenExtendedMiningChannelSuccess {
            request_id,
            channel_id,
            target: U256::from(from_arbitrary_vec_to_array(target)),
            extranonce_size,
            extranonce_prefix: B032::try_from(extranonce_prefix).unwrap(),
        };
        let encoded = to_bytes(&oemcs).unwrap();
        encoded.len() == oemcs.get_size()
            && from_bytes::<OpenExtendedMiningChannelSuccess>(&encoded) == Ok(oemcs)
    }

    #[test]
    fn open_mining_channel_error_codes() {
        let e = OpenMiningChannelError::new_max_target_out_of_range(7);
        assert_eq!(e.request_id, 7);
        assert_eq!(e.error_code.as_utf8(), Some("max-target-out-of-range"));
        let long: String = core::iter::repeat('a').take(300).collect();
        assert!(OpenMiningChannelError::new(1, &long).error_code.is_empty());
    }
}
