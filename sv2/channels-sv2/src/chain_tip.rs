//! # Chain Tip
use binary_sv2::U256;
use mining_sv2::SetNewPrevHash as SetNewPrevHashMp;
use template_distribution_sv2::SetNewPrevHash as SetNewPrevHashTdp;

/// The chain tip the channel is mining on, carried by `SetNewPrevHash` messages.
///
/// Used for:
/// - creating non-future jobs
/// - validating shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    prev_hash: U256,
    nbits: u32,
    min_ntime: u32,
}

impl ChainTip {
    pub fn new(prev_hash: U256, nbits: u32, min_ntime: u32) -> Self {
        Self {
            prev_hash,
            nbits,
            min_ntime,
        }
    }

    /// Hash of the previous block.
    pub fn prev_hash(&self) -> &U256 {
        &self.prev_hash
    }

    /// Network target in compact form.
    pub fn nbits(&self) -> u32 {
        self.nbits
    }

    /// Smallest `nTime` a job on this tip may use.
    pub fn min_ntime(&self) -> u32 {
        self.min_ntime
    }
}

impl From<SetNewPrevHashTdp> for ChainTip {
    fn from(m: SetNewPrevHashTdp) -> Self {
        Self::new(m.prev_hash, m.n_bits, m.header_timestamp)
    }
}

impl From<&SetNewPrevHashTdp> for ChainTip {
    fn from(m: &SetNewPrevHashTdp) -> Self {
        Self::new(m.prev_hash.clone(), m.n_bits, m.header_timestamp)
    }
}

impl From<SetNewPrevHashMp> for ChainTip {
    fn from(m: SetNewPrevHashMp) -> Self {
        Self::new(m.prev_hash, m.nbits, m.min_ntime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_timestamp_becomes_min_ntime() {
        let m = SetNewPrevHashTdp {
            template_id: 3,
            prev_hash: [7; 32].into(),
            header_timestamp: 1746839905,
            n_bits: 503543726,
            target: [0xff; 32].into(),
        };
        let tip = ChainTip::from(&m);
        assert_eq!(tip.min_ntime(), 1746839905);
        assert_eq!(tip.nbits(), 503543726);
        assert_eq!(tip.prev_hash().to_array(), [7; 32]);
        assert_eq!(tip, ChainTip::from(m));
    }
}
