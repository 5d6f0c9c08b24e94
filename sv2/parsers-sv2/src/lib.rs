#![no_std]

//! # Parsing, Serializing, and Message Type Identification
//!
//! Provides logic to convert raw Stratum V2 (Sv2) message data into Rust types, and to convert
//! those types back into Sv2 frames.
//!
//! ## Responsibilities
//! - **Parsing**: Converts raw Sv2 message bytes into Rust enums ([`CommonMessages`], [`Mining`],
//!   [`JobDeclaration`], [`TemplateDistribution`] and the union of all of them, [`AnyMessage`]).
//! - **Serialization**: every enum implements [`binary_sv2::Encodable`], so it can be framed with
//!   [`framing_sv2::framing::Sv2Frame::from_message`].
//! - **Message Metadata**: [`IsSv2Message`] gives the message type and channel bit to put in the
//!   frame header.
//!
//! ## Supported Subprotocols
//! - **Common Messages**: Shared across all Sv2 roles.
//! - **Mining Protocol**: Channel management, job dispatch and shares submission.
//! - **Job Declaration**: Job tokens, declaration of custom jobs and their transactions.
//! - **Template Distribution**: Block template updates, transaction data and solutions.

pub mod error;
extern crate alloc;

use binary_sv2::{from_bytes, Encodable, GetSize};
use core::convert::TryFrom;
pub use error::ParserError;
use framing_sv2::framing::Sv2Frame;

use common_messages_sv2::*;
use job_declaration_sv2::{
    AllocateMiningJobToken, AllocateMiningJobTokenSuccess, DeclareMiningJob, DeclareMiningJobError,
    DeclareMiningJobSuccess, ProvideMissingTransactions, ProvideMissingTransactionsSuccess,
    PushSolution, *,
};
use mining_sv2::{
    CloseChannel, NewExtendedMiningJob, NewMiningJob, OpenExtendedMiningChannel,
    OpenExtendedMiningChannelSuccess, OpenMiningChannelError, OpenStandardMiningChannel,
    OpenStandardMiningChannelSuccess, SetCustomMiningJob, SetCustomMiningJobError,
    SetCustomMiningJobSuccess, SetExtranoncePrefix, SetGroupChannel,
    SetNewPrevHash as MiningSetNewPrevHash, SetTarget, SubmitSharesError, SubmitSharesExtended,
    SubmitSharesStandard, SubmitSharesSuccess, UpdateChannel, UpdateChannelError, *,
};
use template_distribution_sv2::{
    CoinbaseOutputConstraints, NewTemplate, RequestTransactionData, RequestTransactionDataError,
    RequestTransactionDataSuccess, SetNewPrevHash, SubmitSolution, *,
};

/// Converts a message type number to a human-readable name
pub fn message_type_to_name(msg_type: u8) -> &'static str {
    match msg_type {
        // Common messages (0x00-0x0F)
        MESSAGE_TYPE_SETUP_CONNECTION => "SetupConnection",
        MESSAGE_TYPE_SETUP_CONNECTION_SUCCESS => "SetupConnectionSuccess",
        MESSAGE_TYPE_SETUP_CONNECTION_ERROR => "SetupConnectionError",
        MESSAGE_TYPE_CHANNEL_ENDPOINT_CHANGED => "ChannelEndpointChanged",
        MESSAGE_TYPE_RECONNECT => "Reconnect",

        // Mining messages (0x10-0x2F)
        MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL => "OpenStandardMiningChannel",
        MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL_SUCCESS => "OpenStandardMiningChannelSuccess",
        MESSAGE_TYPE_OPEN_MINING_CHANNEL_ERROR => "OpenMiningChannelError",
        MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL => "OpenExtendedMiningChannel",
        MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL_SUCCESS => "OpenExtendedMiningChannelSuccess",
        MESSAGE_TYPE_NEW_MINING_JOB => "NewMiningJob",
        MESSAGE_TYPE_UPDATE_CHANNEL => "UpdateChannel",
        MESSAGE_TYPE_UPDATE_CHANNEL_ERROR => "UpdateChannelError",
        MESSAGE_TYPE_CLOSE_CHANNEL => "CloseChannel",
        MESSAGE_TYPE_SET_EXTRANONCE_PREFIX => "SetExtranoncePrefix",
        MESSAGE_TYPE_SUBMIT_SHARES_STANDARD => "SubmitSharesStandard",
        MESSAGE_TYPE_SUBMIT_SHARES_EXTENDED => "SubmitSharesExtended",
        MESSAGE_TYPE_SUBMIT_SHARES_SUCCESS => "SubmitSharesSuccess",
        MESSAGE_TYPE_SUBMIT_SHARES_ERROR => "SubmitSharesError",
        MESSAGE_TYPE_NEW_EXTENDED_MINING_JOB => "NewExtendedMiningJob",
        MESSAGE_TYPE_MINING_SET_NEW_PREV_HASH => "SetNewPrevHash",
        MESSAGE_TYPE_SET_TARGET => "SetTarget",
        MESSAGE_TYPE_SET_CUSTOM_MINING_JOB => "SetCustomMiningJob",
        MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_SUCCESS => "SetCustomMiningJobSuccess",
        MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_ERROR => "SetCustomMiningJobError",
        MESSAGE_TYPE_SET_GROUP_CHANNEL => "SetGroupChannel",

        // Job Declaration messages (0x50-0x6F)
        MESSAGE_TYPE_ALLOCATE_MINING_JOB_TOKEN => "AllocateMiningJobToken",
        MESSAGE_TYPE_ALLOCATE_MINING_JOB_TOKEN_SUCCESS => "AllocateMiningJobTokenSuccess",
        MESSAGE_TYPE_PROVIDE_MISSING_TRANSACTIONS => "ProvideMissingTransactions",
        MESSAGE_TYPE_PROVIDE_MISSING_TRANSACTIONS_SUCCESS => "ProvideMissingTransactionsSuccess",
        MESSAGE_TYPE_DECLARE_MINING_JOB => "DeclareMiningJob",
        MESSAGE_TYPE_DECLARE_MINING_JOB_SUCCESS => "DeclareMiningJobSuccess",
        MESSAGE_TYPE_DECLARE_MINING_JOB_ERROR => "DeclareMiningJobError",
        MESSAGE_TYPE_PUSH_SOLUTION => "PushSolution",

        // Template Distribution messages (0x70-0x7F)
        MESSAGE_TYPE_COINBASE_OUTPUT_CONSTRAINTS => "CoinbaseOutputConstraints",
        MESSAGE_TYPE_NEW_TEMPLATE => "NewTemplate",
        MESSAGE_TYPE_SET_NEW_PREV_HASH => "SetNewPrevHash",
        MESSAGE_TYPE_REQUEST_TRANSACTION_DATA => "RequestTransactionData",
        MESSAGE_TYPE_REQUEST_TRANSACTION_DATA_SUCCESS => "RequestTransactionDataSuccess",
        MESSAGE_TYPE_REQUEST_TRANSACTION_DATA_ERROR => "RequestTransactionDataError",
        MESSAGE_TYPE_SUBMIT_SOLUTION => "SubmitSolution",

        _ => "Unknown Message",
    }
}

/// A trait that every Sv2 message parser must implement.
/// It gives the header fields needed to turn a Rust type into a raw message.
pub trait IsSv2Message {
    /// get message type
    fn message_type(&self) -> u8;
    /// get channel bit
    fn channel_bit(&self) -> bool;
}

// Generates, for one subprotocol:
//  - the enum of its messages and the `*Types` enum of its message types;
//  - `IsSv2Message`, `GetSize` and `Encodable` for the message enum;
//  - `TryFrom<(u8, &[u8])>` dispatching on the message type;
//  - `From<Message>` for the subprotocol enum and for `AnyMessage`.
macro_rules! subprotocol_parser {
    (
        $(#[$meta:meta])*
        $name:ident, $types:ident, $any_variant:ident {
            $($variant:ident($message:ty) => ($msg_type:expr, $channel_bit:expr)),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq)]
        pub enum $name {
            $($variant($message)),*
        }

        #[doc = concat!("Message types of the [`", stringify!($name), "`] messages.")]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        #[allow(clippy::enum_variant_names)]
        pub enum $types {
            $($variant = $msg_type),*
        }

        impl TryFrom<u8> for $types {
            type Error = ParserError;

            fn try_from(v: u8) -> Result<$types, ParserError> {
                $(
                    if v == $msg_type {
                        return Ok($types::$variant);
                    }
                )*
                Err(ParserError::UnexpectedMessage(v))
            }
        }

        impl IsSv2Message for $name {
            fn message_type(&self) -> u8 {
                match self {
                    $(Self::$variant(_) => $msg_type),*
                }
            }

            fn channel_bit(&self) -> bool {
                match self {
                    $(Self::$variant(_) => $channel_bit),*
                }
            }
        }

        impl GetSize for $name {
            fn get_size(&self) -> usize {
                match self {
                    $(Self::$variant(m) => m.get_size()),*
                }
            }
        }

        impl Encodable for $name {
            fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, binary_sv2::Error> {
                match self {
                    $(Self::$variant(m) => m.to_bytes(dst)),*
                }
            }
        }

        impl<'a> TryFrom<(u8, &'a [u8])> for $name {
            type Error = ParserError;

            fn try_from(v: (u8, &'a [u8])) -> Result<Self, Self::Error> {
                let msg_type = $types::try_from(v.0)?;
                match msg_type {
                    $($types::$variant => {
                        let message: $message = from_bytes(v.1)?;
                        Ok(Self::$variant(message))
                    }),*
                }
            }
        }

        $(
            impl From<$message> for $name {
                fn from(v: $message) -> Self {
                    Self::$variant(v)
                }
            }

            impl From<$message> for AnyMessage {
                fn from(v: $message) -> Self {
                    AnyMessage::$any_variant(v.into())
                }
            }
        )*
    };
}

subprotocol_parser!(
    /// Messages that are common to all Sv2 subprotocols, used to set up connections and manage
    /// endpoints.
    CommonMessages, CommonMessageTypes, Common {
        SetupConnection(SetupConnection) =>
            (MESSAGE_TYPE_SETUP_CONNECTION, CHANNEL_BIT_SETUP_CONNECTION),
        SetupConnectionSuccess(SetupConnectionSuccess) =>
            (MESSAGE_TYPE_SETUP_CONNECTION_SUCCESS, CHANNEL_BIT_SETUP_CONNECTION_SUCCESS),
        SetupConnectionError(SetupConnectionError) =>
            (MESSAGE_TYPE_SETUP_CONNECTION_ERROR, CHANNEL_BIT_SETUP_CONNECTION_ERROR),
        ChannelEndpointChanged(ChannelEndpointChanged) =>
            (MESSAGE_TYPE_CHANNEL_ENDPOINT_CHANGED, CHANNEL_BIT_CHANNEL_ENDPOINT_CHANGED),
        Reconnect(Reconnect) => (MESSAGE_TYPE_RECONNECT, CHANNEL_BIT_RECONNECT),
    }
);

subprotocol_parser!(
    /// Mining subprotocol messages.
    ///
    /// Once parsed, the [`Mining`] enum can be passed through the routing and processing layers
    /// of a role (e.g. a pool or a proxy) and matched on to reach the channel logic.
    Mining, MiningTypes, Mining {
        OpenStandardMiningChannel(OpenStandardMiningChannel) => (
            MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL,
            CHANNEL_BIT_OPEN_STANDARD_MINING_CHANNEL
        ),
        OpenStandardMiningChannelSuccess(OpenStandardMiningChannelSuccess) => (
            MESSAGE_TYPE_OPEN_STANDARD_MINING_CHANNEL_SUCCESS,
            CHANNEL_BIT_OPEN_STANDARD_MINING_CHANNEL_SUCCESS
        ),
        OpenMiningChannelError(OpenMiningChannelError) => (
            MESSAGE_TYPE_OPEN_MINING_CHANNEL_ERROR,
            CHANNEL_BIT_OPEN_MINING_CHANNEL_ERROR
        ),
        OpenExtendedMiningChannel(OpenExtendedMiningChannel) => (
            MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL,
            CHANNEL_BIT_OPEN_EXTENDED_MINING_CHANNEL
        ),
        OpenExtendedMiningChannelSuccess(OpenExtendedMiningChannelSuccess) => (
            MESSAGE_TYPE_OPEN_EXTENDED_MINING_CHANNEL_SUCCESS,
            CHANNEL_BIT_OPEN_EXTENDED_MINING_CHANNEL_SUCCESS
        ),
        NewMiningJob(NewMiningJob) => (MESSAGE_TYPE_NEW_MINING_JOB, CHANNEL_BIT_NEW_MINING_JOB),
        UpdateChannel(UpdateChannel) => (MESSAGE_TYPE_UPDATE_CHANNEL, CHANNEL_BIT_UPDATE_CHANNEL),
        UpdateChannelError(UpdateChannelError) =>
            (MESSAGE_TYPE_UPDATE_CHANNEL_ERROR, CHANNEL_BIT_UPDATE_CHANNEL_ERROR),
        CloseChannel(CloseChannel) => (MESSAGE_TYPE_CLOSE_CHANNEL, CHANNEL_BIT_CLOSE_CHANNEL),
        SetExtranoncePrefix(SetExtranoncePrefix) =>
            (MESSAGE_TYPE_SET_EXTRANONCE_PREFIX, CHANNEL_BIT_SET_EXTRANONCE_PREFIX),
        SubmitSharesStandard(SubmitSharesStandard) =>
            (MESSAGE_TYPE_SUBMIT_SHARES_STANDARD, CHANNEL_BIT_SUBMIT_SHARES_STANDARD),
        SubmitSharesExtended(SubmitSharesExtended) =>
            (MESSAGE_TYPE_SUBMIT_SHARES_EXTENDED, CHANNEL_BIT_SUBMIT_SHARES_EXTENDED),
        SubmitSharesSuccess(SubmitSharesSuccess) =>
            (MESSAGE_TYPE_SUBMIT_SHARES_SUCCESS, CHANNEL_BIT_SUBMIT_SHARES_SUCCESS),
        SubmitSharesError(SubmitSharesError) =>
            (MESSAGE_TYPE_SUBMIT_SHARES_ERROR, CHANNEL_BIT_SUBMIT_SHARES_ERROR),
        NewExtendedMiningJob(NewExtendedMiningJob) =>
            (MESSAGE_TYPE_NEW_EXTENDED_MINING_JOB, CHANNEL_BIT_NEW_EXTENDED_MINING_JOB),
        SetNewPrevHash(MiningSetNewPrevHash) =>
            (MESSAGE_TYPE_MINING_SET_NEW_PREV_HASH, CHANNEL_BIT_MINING_SET_NEW_PREV_HASH),
        SetTarget(SetTarget) => (MESSAGE_TYPE_SET_TARGET, CHANNEL_BIT_SET_TARGET),
        SetCustomMiningJob(SetCustomMiningJob) =>
            (MESSAGE_TYPE_SET_CUSTOM_MINING_JOB, CHANNEL_BIT_SET_CUSTOM_MINING_JOB),
        SetCustomMiningJobSuccess(SetCustomMiningJobSuccess) => (
            MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_SUCCESS,
            CHANNEL_BIT_SET_CUSTOM_MINING_JOB_SUCCESS
        ),
        SetCustomMiningJobError(SetCustomMiningJobError) => (
            MESSAGE_TYPE_SET_CUSTOM_MINING_JOB_ERROR,
            CHANNEL_BIT_SET_CUSTOM_MINING_JOB_ERROR
        ),
        SetGroupChannel(SetGroupChannel) =>
            (MESSAGE_TYPE_SET_GROUP_CHANNEL, CHANNEL_BIT_SET_GROUP_CHANNEL),
    }
);

subprotocol_parser!(
    /// Job Declaration subprotocol messages, exchanged between a Job Declarator Client and a Job
    /// Declarator Server.
    JobDeclaration, JobDeclarationTypes, JobDeclaration {
        AllocateMiningJobToken(AllocateMiningJobToken) => (
            MESSAGE_TYPE_ALLOCATE_MINING_JOB_TOKEN,
            CHANNEL_BIT_ALLOCATE_MINING_JOB_TOKEN
        ),
        AllocateMiningJobTokenSuccess(AllocateMiningJobTokenSuccess) => (
            MESSAGE_TYPE_ALLOCATE_MINING_JOB_TOKEN_SUCCESS,
            CHANNEL_BIT_ALLOCATE_MINING_JOB_TOKEN_SUCCESS
        ),
        ProvideMissingTransactions(ProvideMissingTransactions) => (
            MESSAGE_TYPE_PROVIDE_MISSING_TRANSACTIONS,
            CHANNEL_BIT_PROVIDE_MISSING_TRANSACTIONS
        ),
        ProvideMissingTransactionsSuccess(ProvideMissingTransactionsSuccess) => (
            MESSAGE_TYPE_PROVIDE_MISSING_TRANSACTIONS_SUCCESS,
            CHANNEL_BIT_PROVIDE_MISSING_TRANSACTIONS_SUCCESS
        ),
        DeclareMiningJob(DeclareMiningJob) =>
            (MESSAGE_TYPE_DECLARE_MINING_JOB, CHANNEL_BIT_DECLARE_MINING_JOB),
        DeclareMiningJobSuccess(DeclareMiningJobSuccess) =>
            (MESSAGE_TYPE_DECLARE_MINING_JOB_SUCCESS, CHANNEL_BIT_DECLARE_MINING_JOB_SUCCESS),
        DeclareMiningJobError(DeclareMiningJobError) =>
            (MESSAGE_TYPE_DECLARE_MINING_JOB_ERROR, CHANNEL_BIT_DECLARE_MINING_JOB_ERROR),
        PushSolution(PushSolution) => (MESSAGE_TYPE_PUSH_SOLUTION, CHANNEL_BIT_PUSH_SOLUTION),
    }
);

subprotocol_parser!(
    /// A parser of messages of Template Distribution subprotocol, to be used for parsing raw
    /// messages.
    TemplateDistribution, TemplateDistributionTypes, TemplateDistribution {
        CoinbaseOutputConstraints(CoinbaseOutputConstraints) => (
            MESSAGE_TYPE_COINBASE_OUTPUT_CONSTRAINTS,
            CHANNEL_BIT_COINBASE_OUTPUT_CONSTRAINTS
        ),
        NewTemplate(NewTemplate) => (MESSAGE_TYPE_NEW_TEMPLATE, CHANNEL_BIT_NEW_TEMPLATE),
        SetNewPrevHash(SetNewPrevHash) =>
            (MESSAGE_TYPE_SET_NEW_PREV_HASH, CHANNEL_BIT_SET_NEW_PREV_HASH),
        RequestTransactionData(RequestTransactionData) =>
            (MESSAGE_TYPE_REQUEST_TRANSACTION_DATA, CHANNEL_BIT_REQUEST_TRANSACTION_DATA),
        RequestTransactionDataSuccess(RequestTransactionDataSuccess) => (
            MESSAGE_TYPE_REQUEST_TRANSACTION_DATA_SUCCESS,
            CHANNEL_BIT_REQUEST_TRANSACTION_DATA_SUCCESS
        ),
        RequestTransactionDataError(RequestTransactionDataError) => (
            MESSAGE_TYPE_REQUEST_TRANSACTION_DATA_ERROR,
            CHANNEL_BIT_REQUEST_TRANSACTION_DATA_ERROR
        ),
        SubmitSolution(SubmitSolution) => (MESSAGE_TYPE_SUBMIT_SOLUTION, CHANNEL_BIT_SUBMIT_SOLUTION),
    }
);

/// A parser of all possible SV2 messages
#[derive(Clone, Debug, PartialEq)]
pub enum AnyMessage {
    Common(CommonMessages),
    Mining(Mining),
    JobDeclaration(JobDeclaration),
    TemplateDistribution(TemplateDistribution),
}

impl From<CommonMessages> for AnyMessage {
    fn from(m: CommonMessages) -> Self {
        AnyMessage::Common(m)
    }
}

impl From<Mining> for AnyMessage {
    fn from(m: Mining) -> Self {
        AnyMessage::Mining(m)
    }
}

impl From<JobDeclaration> for AnyMessage {
    fn from(m: JobDeclaration) -> Self {
        AnyMessage::JobDeclaration(m)
    }
}

impl From<TemplateDistribution> for AnyMessage {
    fn from(m: TemplateDistribution) -> Self {
        AnyMessage::TemplateDistribution(m)
    }
}

impl GetSize for AnyMessage {
    fn get_size(&self) -> usize {
        match self {
            AnyMessage::Common(a) => a.get_size(),
            AnyMessage::Mining(a) => a.get_size(),
            AnyMessage::JobDeclaration(a) => a.get_size(),
            AnyMessage::TemplateDistribution(a) => a.get_size(),
        }
    }
}

impl Encodable for AnyMessage {
    fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, binary_sv2::Error> {
        match self {
            AnyMessage::Common(a) => a.to_bytes(dst),
            AnyMessage::Mining(a) => a.to_bytes(dst),
            AnyMessage::JobDeclaration(a) => a.to_bytes(dst),
            AnyMessage::TemplateDistribution(a) => a.to_bytes(dst),
        }
    }
}

impl IsSv2Message for AnyMessage {
    fn message_type(&self) -> u8 {
        match self {
            AnyMessage::Common(a) => a.message_type(),
            AnyMessage::Mining(a) => a.message_type(),
            AnyMessage::JobDeclaration(a) => a.message_type(),
            AnyMessage::TemplateDistribution(a) => a.message_type(),
        }
    }

    fn channel_bit(&self) -> bool {
        match self {
            AnyMessage::Common(a) => a.channel_bit(),
            AnyMessage::Mining(a) => a.channel_bit(),
            AnyMessage::JobDeclaration(a) => a.channel_bit(),
            AnyMessage::TemplateDistribution(a) => a.channel_bit(),
        }
    }
}

impl<'a> TryFrom<(u8, &'a [u8])> for AnyMessage {
    type Error = ParserError;

    fn try_from(v: (u8, &'a [u8])) -> Result<Self, Self::Error> {
        if CommonMessageTypes::try_from(v.0).is_ok() {
            Ok(Self::Common(CommonMessages::try_from(v)?))
        } else if MiningTypes::try_from(v.0).is_ok() {
            Ok(Self::Mining(Mining::try_from(v)?))
        } else if JobDeclarationTypes::try_from(v.0).is_ok() {
            Ok(Self::JobDeclaration(JobDeclaration::try_from(v)?))
        } else if TemplateDistributionTypes::try_from(v.0).is_ok() {
            Ok(Self::TemplateDistribution(TemplateDistribution::try_from(
                v,
            )?))
        } else {
            Err(ParserError::UnexpectedMessage(v.0))
        }
    }
}

impl TryFrom<AnyMessage> for Sv2Frame<AnyMessage> {
    type Error = ParserError;

    fn try_from(v: AnyMessage) -> Result<Self, ParserError> {
        let extension_type = 0;
        let channel_bit = v.channel_bit();
        let message_type = v.message_type();
        Sv2Frame::from_message(v, message_type, extension_type, channel_bit)
            .ok_or(ParserError::BadPayloadSize)
    }
}
