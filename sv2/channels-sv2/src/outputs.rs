//! Utilities to deserialize coinbase outputs.
use bitcoin::{consensus::Decodable, transaction::TxOut};
use std::{fmt, io::Cursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputsDeserializationError;

impl fmt::Display for OutputsDeserializationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to deserialize coinbase outputs")
    }
}

impl std::error::Error for OutputsDeserializationError {}

/// Deserializes the outputs of a `NewTemplate` message.
///
/// Template outputs are concatenated without a count prefix, the count comes from
/// `coinbase_tx_outputs_count`.
pub fn deserialize_template_outputs(
    serialized_outputs: &[u8],
    coinbase_tx_outputs_count: u32,
) -> Result<Vec<TxOut>, OutputsDeserializationError> {
    let mut cursor = Cursor::new(serialized_outputs);

    (0..coinbase_tx_outputs_count)
        .map(|_| TxOut::consensus_decode(&mut cursor).map_err(|_| OutputsDeserializationError))
        .collect()
}

/// Deserializes the outputs of a `SetCustomMiningJob` message, a consensus encoded vector.
pub fn deserialize_outputs(
    serialized_outputs: &[u8],
) -> Result<Vec<TxOut>, OutputsDeserializationError> {
    let mut reader = serialized_outputs;
    Vec::<TxOut>::consensus_decode(&mut reader).map_err(|_| OutputsDeserializationError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::{consensus::serialize, Amount, ScriptBuf};

    fn outputs() -> Vec<TxOut> {
        vec![
            TxOut {
                value: Amount::from_sat(10),
                script_pubkey: ScriptBuf::from_bytes(vec![0x51]),
            },
            TxOut {
                value: Amount::from_sat(0),
                script_pubkey: ScriptBuf::from_bytes(vec![0x6a, 1, 2]),
            },
        ]
    }

    #[test]
    fn template_outputs_have_no_count_prefix() {
        let mut bytes = vec![];
        for output in outputs() {
            bytes.extend_from_slice(&serialize(&output));
        }
        assert_eq!(deserialize_template_outputs(&bytes, 2).unwrap(), outputs());
        assert!(deserialize_template_outputs(&bytes, 3).is_err());
    }

    #[test]
    fn custom_job_outputs_are_a_vector() {
        let bytes = serialize(&outputs());
        assert_eq!(deserialize_outputs(&bytes).unwrap(), outputs());
        assert!(deserialize_outputs(&bytes[..bytes.len() - 1]).is_err());
    }
}
