//! # Stratum V2 Channels
//!
//! `channels_sv2` keeps the state of Sv2 mining channels on the server side.
//!
//! - [`extranonce_prefix`]: unique extranonce prefixes for every channel a server opens.
//! - [`target`]: conversions between hashrate, target and difficulty.
//! - [`server`]: standard, extended and group channels, their jobs and share validation.
//! - [`policy`]: the pool policy applied to new channels, loaded from TOML.
//!
//! Channels do not do any I/O. The caller feeds them the template distribution messages
//! (`NewTemplate`, `SetNewPrevHash`) and the mining messages of the downstream, and sends the
//! messages they produce.

pub mod bip141;
pub mod chain_tip;
pub mod extranonce_prefix;
pub mod id_factory;
mod merkle_root;
pub mod outputs;
pub mod policy;
pub mod server;
pub mod target;
pub mod txout;
