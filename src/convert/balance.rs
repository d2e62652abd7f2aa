//! Running account balances up to a cut-off date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::homebank::HomebankFile;

/// Computes every account's balance as of `cutoff` (inclusive): initial
/// balance plus all transaction amounts up to that date, in source order.
///
/// Transactions are sorted ascending by date, so accumulation stops at the
/// first later date. A transaction on an unknown account key accumulates
/// into a fresh zero-initialized entry.
pub fn balances_up_to(file: &HomebankFile, cutoff: NaiveDate) -> BTreeMap<u32, Decimal> {
    let mut balances: BTreeMap<u32, Decimal> = file
        .accounts
        .iter()
        .map(|(key, account)| (*key, account.initial_balance))
        .collect();

    for txn in &file.transactions {
        if txn.date > cutoff {
            break;
        }
        *balances.entry(txn.account_key).or_default() += txn.amount;
    }

    balances
}
