//! Plain representation of a coinbase output, as handed over by the pool policy or a template
//! source.
use bitcoin::{Amount, ScriptBuf, TxOut};
use serde::Deserialize;

/// A transaction output: `value` in satoshis and the raw `script_pubkey`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct TxOutput {
    pub value: u64,
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    pub fn new(value: u64, script_pubkey: Vec<u8>) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }

    pub fn to_txout(&self) -> TxOut {
        TxOut {
            value: Amount::from_sat(self.value),
            script_pubkey: ScriptBuf::from_bytes(self.script_pubkey.clone()),
        }
    }
}

impl From<TxOutput> for TxOut {
    fn from(out: TxOutput) -> Self {
        TxOut {
            value: Amount::from_sat(out.value),
            script_pubkey: ScriptBuf::from_bytes(out.script_pubkey),
        }
    }
}

impl From<&TxOut> for TxOutput {
    fn from(out: &TxOut) -> Self {
        Self {
            value: out.value.to_sat(),
            script_pubkey: out.script_pubkey.to_bytes(),
        }
    }
}

impl From<TxOut> for TxOutput {
    fn from(out: TxOut) -> Self {
        Self::from(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_both_ways() {
        let output = TxOutput::new(5_000_000_000, vec![0, 20, 1, 2, 3]);
        let txout = output.to_txout();
        assert_eq!(txout.value.to_sat(), 5_000_000_000);
        assert_eq!(txout.script_pubkey.as_bytes(), &[0, 20, 1, 2, 3]);
        assert_eq!(TxOutput::from(txout.clone()), output);
        assert_eq!(TxOut::from(output), txout);
    }
}
