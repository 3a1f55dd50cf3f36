//! UTXO selection
//!
//! Inputs are taken in strategy order until they pay for the amount plus the
//! fee of a transaction with a change output. Change under the dust threshold
//! is given to the miner instead.

use crate::account::Utxo;
use crate::amount::Amount;
use crate::transaction::UtxoStrategy;
use std::cmp::Reverse;

const TX_OVERHEAD_BYTES: u64 = 10;
const INPUT_BYTES: u64 = 148;
const OUTPUT_BYTES: u64 = 34;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub inputs: Vec<Utxo>,
    pub fee: Amount,
    /// Zero when there is no change output
    pub change: Amount,
}

pub fn estimate_size(inputs: usize, outputs: usize) -> u64 {
    TX_OVERHEAD_BYTES + INPUT_BYTES * inputs as u64 + OUTPUT_BYTES * outputs as u64
}

/// UTXOs in the order a strategy spends them. Ties break on `(txid, vout)`.
pub fn order(utxos: &[Utxo], strategy: UtxoStrategy) -> Vec<Utxo> {
    let mut ordered = utxos.to_vec();
    match strategy {
        UtxoStrategy::DeepOutputsFirst => {
            ordered.sort_by(|a, b| {
                (a.block_height.unwrap_or(u64::MAX), &a.txid, a.vout).cmp(&(b.block_height.unwrap_or(u64::MAX), &b.txid, b.vout))
            });
        }
        UtxoStrategy::OptimizeSize => {
            ordered.sort_by(|a, b| (Reverse(&a.value), &a.txid, a.vout).cmp(&(Reverse(&b.value), &b.txid, b.vout)));
        }
        UtxoStrategy::MergeOutputs => {
            ordered.sort_by(|a, b| (&a.value, &a.txid, a.vout).cmp(&(&b.value, &b.txid, b.vout)));
        }
    }
    ordered
}

/// `None` when the UTXO set cannot pay `amount` at `fee_per_byte`.
pub fn select(utxos: &[Utxo], amount: &Amount, fee_per_byte: &Amount, strategy: UtxoStrategy, dust: &Amount) -> Option<Selection> {
    let mut inputs = Vec::new();
    let mut total = Amount::zero();
    for utxo in order(utxos, strategy) {
        total = &total + &utxo.value;
        inputs.push(utxo);

        let with_change = amount + &(fee_per_byte * estimate_size(inputs.len(), 2));
        if let Some(change) = total.checked_sub(&with_change) {
            return Some(if change < *dust {
                Selection { fee: total.checked_sub(amount)?, change: Amount::zero(), inputs }
            } else {
                Selection { fee: with_change.checked_sub(amount)?, change, inputs }
            });
        }

        let without_change = amount + &(fee_per_byte * estimate_size(inputs.len(), 1));
        if total >= without_change {
            return Some(Selection { fee: total.checked_sub(amount)?, change: Amount::zero(), inputs });
        }
    }
    None
}
