use binary_sv2::{impl_sv2_codec, Str0255};

/// Message used by an upstream role to ask the downstream to reconnect elsewhere.
///
/// An empty `new_host` means "reconnect to the same host", a `new_port` of 0 means "reconnect to
/// the same port".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconnect {
    pub new_host: Str0255,
    pub new_port: u16,
}

impl_sv2_codec!(Reconnect { new_host, new_port });
