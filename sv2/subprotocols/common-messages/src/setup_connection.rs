use crate::{
    SV2_JOB_DECLARATION_PROTOCOL_DISCRIMINANT, SV2_MINING_PROTOCOL_DISCRIMINANT,
    SV2_TEMPLATE_DISTRIBUTION_PROTOCOL_DISCRIMINANT,
};
use binary_sv2::{impl_sv2_codec, Decodable, Encodable, Error, GetSize, Str0255};
use core::convert::TryFrom;

/// Used by downstream to initiate a Stratum V2 connection with an upstream role.
///
/// This is usually the first message sent by a downstream role on a newly established
/// connection, right after the Noise handshake.
///
/// `flags` is a bit field whose meaning depends on `protocol`. For the mining protocol:
///
/// | bit | name                       |
/// |-----|----------------------------|
/// | 0   | `REQUIRES_STANDARD_JOBS`   |
/// | 1   | `REQUIRES_WORK_SELECTION`  |
/// | 2   | `REQUIRES_VERSION_ROLLING` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConnection {
    /// Protocol to be used for the connection.
    pub protocol: Protocol,
    /// The minimum protocol version supported.
    pub min_version: u16,
    /// The maximum protocol version supported.
    pub max_version: u16,
    /// Flags indicating optional protocol features supported by the downstream.
    pub flags: u32,
    /// ASCII representation of the connection hostname or IP address.
    pub endpoint_host: Str0255,
    /// Connection port value.
    pub endpoint_port: u16,
    pub vendor: Str0255,
    pub hardware_version: Str0255,
    pub firmware: Str0255,
    /// Device identifier, chosen by the downstream.
    pub device_id: Str0255,
}

impl_sv2_codec!(SetupConnection {
    protocol,
    min_version,
    max_version,
    flags,
    endpoint_host,
    endpoint_port,
    vendor,
    hardware_version,
    firmware,
    device_id,
});

impl SetupConnection {
    /// Highest version in both `[min_version, max_version]` and the given range.
    pub fn get_version(&self, min_version: u16, max_version: u16) -> Option<u16> {
        if self.min_version > max_version || min_version > self.max_version {
            None
        } else {
            Some(self.max_version.min(max_version))
        }
    }

    /// Checks that every flag in `required_flags` is also in `available_flags`.
    pub fn check_flags(available_flags: u32, required_flags: u32) -> bool {
        required_flags & !available_flags == 0
    }

    pub fn requires_standard_job(&self) -> bool {
        has_requires_std_job(self.flags)
    }
}

/// Returns `true` if the `REQUIRES_STANDARD_JOBS` bit of a mining protocol `flags` is set.
pub fn has_requires_std_job(flags: u32) -> bool {
    flags & 0b001 != 0
}

/// Returns `true` if the `REQUIRES_WORK_SELECTION` bit of a mining protocol `flags` is set.
pub fn has_work_selection(flags: u32) -> bool {
    flags & 0b010 != 0
}

/// Returns `true` if the `REQUIRES_VERSION_ROLLING` bit of a mining protocol `flags` is set.
pub fn has_version_rolling(flags: u32) -> bool {
    flags & 0b100 != 0
}

/// Message used by an upstream role to accept a connection setup request from a downstream role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupConnectionSuccess {
    /// Selected version based on the [`SetupConnection::min_version`] and
    /// [`SetupConnection::max_version`] sent by the downstream role.
    pub used_version: u16,
    /// Flags indicating optional protocol features supported by the upstream.
    pub flags: u32,
}

impl_sv2_codec!(SetupConnectionSuccess {
    used_version,
    flags
});

/// Message used by an upstream role to reject a connection setup request.
///
/// Possible error codes: `unsupported-feature-flags`, `unsupported-protocol`,
/// `protocol-version-mismatch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupConnectionError {
    /// Flags that caused the error, only set for `unsupported-feature-flags`.
    pub flags: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(SetupConnectionError { flags, error_code });

/// Subprotocol requested by a [`SetupConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
#[allow(clippy::enum_variant_names)]
pub enum Protocol {
    MiningProtocol = SV2_MINING_PROTOCOL_DISCRIMINANT,
    JobDeclarationProtocol = SV2_JOB_DECLARATION_PROTOCOL_DISCRIMINANT,
    TemplateDistributionProtocol = SV2_TEMPLATE_DISTRIBUTION_PROTOCOL_DISCRIMINANT,
}

impl TryFrom<u8> for Protocol {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            SV2_MINING_PROTOCOL_DISCRIMINANT => Ok(Protocol::MiningProtocol),
            SV2_JOB_DECLARATION_PROTOCOL_DISCRIMINANT => Ok(Protocol::JobDeclarationProtocol),
            SV2_TEMPLATE_DISTRIBUTION_PROTOCOL_DISCRIMINANT => {
                Ok(Protocol::TemplateDistributionProtocol)
            }
            v => Err(Error::ValueIsNotAValidProtocol(v)),
        }
    }
}

impl GetSize for Protocol {
    fn get_size(&self) -> usize {
        1
    }
}

impl Encodable for Protocol {
    fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
        (*self as u8).to_bytes(dst)
    }
}

impl Decodable for Protocol {
    fn from_slice(src: &[u8]) -> Result<(Self, usize), Error> {
        let (v, used) = u8::from_slice(src)?;
        Ok((Protocol::try_from(v)?, used))
    }
}
