use bitcoin::{
    consensus,
    hashes::{sha256d::Hash as DHash, Hash, HashEngine},
    Transaction,
};
use tracing::error;

/// Merkle root of a block whose coinbase is `coinbase_tx_prefix || extranonce ||
/// coinbase_tx_suffix`, with `path` the merkle branch of the coinbase.
///
/// Returns `None` if the three parts do not make a valid transaction.
pub fn merkle_root_from_path<T: AsRef<[u8]>>(
    coinbase_tx_prefix: &[u8],
    coinbase_tx_suffix: &[u8],
    extranonce: &[u8],
    path: &[T],
) -> Option<[u8; 32]> {
    let mut coinbase =
        Vec::with_capacity(coinbase_tx_prefix.len() + extranonce.len() + coinbase_tx_suffix.len());
    coinbase.extend_from_slice(coinbase_tx_prefix);
    coinbase.extend_from_slice(extranonce);
    coinbase.extend_from_slice(coinbase_tx_suffix);

    let coinbase: Transaction = match consensus::deserialize(&coinbase) {
        Ok(tx) => tx,
        Err(e) => {
            error!("Invalid coinbase, can not compute merkle root: {}", e);
            return None;
        }
    };

    let txid = coinbase.compute_txid().to_byte_array();
    Some(fold_path(txid, path))
}

// sha256d(root || node) for every node of the branch
fn fold_path<T: AsRef<[u8]>>(txid: [u8; 32], path: &[T]) -> [u8; 32] {
    path.iter().fold(txid, |root, node| {
        let mut engine = DHash::engine();
        engine.input(&root);
        engine.input(node.as_ref());
        DHash::from_engine(engine).to_byte_array()
    })
}
