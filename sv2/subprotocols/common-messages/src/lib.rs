//! # Stratum V2 Common Messages Crate
//!
//! `common_messages_sv2` implements the messages shared by every Stratum V2 subprotocol: the
//! connection setup handshake (`SetupConnection` and its answers), `ChannelEndpointChanged` and
//! `Reconnect`.
//!
//! Every message implements [`binary_sv2::Encodable`] and [`binary_sv2::Decodable`]. The
//! `MESSAGE_TYPE_*` and `CHANNEL_BIT_*` constants are the values to put in the frame header.

#![no_std]

extern crate alloc;

mod channel_endpoint_changed;
mod reconnect;
mod setup_connection;

pub use channel_endpoint_changed::ChannelEndpointChanged;
pub use reconnect::Reconnect;
pub use setup_connection::{
    has_requires_std_job, has_version_rolling, has_work_selection, Protocol, SetupConnection,
    SetupConnectionError, SetupConnectionSuccess,
};

pub const SV2_MINING_PROTOCOL_DISCRIMINANT: u8 = 0;
pub const SV2_JOB_DECLARATION_PROTOCOL_DISCRIMINANT: u8 = 1;
pub const SV2_TEMPLATE_DISTRIBUTION_PROTOCOL_DISCRIMINANT: u8 = 2;

// Common message types.
pub const MESSAGE_TYPE_SETUP_CONNECTION: u8 = 0x0;
pub const MESSAGE_TYPE_SETUP_CONNECTION_SUCCESS: u8 = 0x1;
pub const MESSAGE_TYPE_SETUP_CONNECTION_ERROR: u8 = 0x2;
pub const MESSAGE_TYPE_CHANNEL_ENDPOINT_CHANGED: u8 = 0x3;
pub const MESSAGE_TYPE_RECONNECT: u8 = 0x04;

pub const CHANNEL_BIT_SETUP_CONNECTION: bool = false;
pub const CHANNEL_BIT_SETUP_CONNECTION_SUCCESS: bool = false;
pub const CHANNEL_BIT_SETUP_CONNECTION_ERROR: bool = false;
pub const CHANNEL_BIT_CHANNEL_ENDPOINT_CHANGED: bool = true;
pub const CHANNEL_BIT_RECONNECT: bool = false;
