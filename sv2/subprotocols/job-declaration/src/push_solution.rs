use binary_sv2::{impl_sv2_codec, B032, U256};

/// Message used by JDC to push a block to JDS as soon as it finds one, so the JDS can
/// propagate it too.
///
/// The JDC is also expected to send the block through `SubmitSolution` of the Template
/// Distribution Protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSolution {
    /// Full extranonce that forms a valid submission.
    pub extranonce: B032,
    pub prev_hash: U256,
    pub nonce: u32,
    /// Unix timestamp of the block header.
    pub ntime: u32,
    /// Compact network target of the block.
    pub nbits: u32,
    /// Block header version, general purpose bits rolled as per BIP320.
    pub version: u32,
}

impl_sv2_codec!(PushSolution {
    extranonce,
    prev_hash,
    nonce,
    ntime,
    nbits,
    version
});
