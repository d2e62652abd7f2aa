//! The conversion engine: strategy dispatch per source transaction,
//! opening-balance carryover between years, account/payee declarations, and
//! the year-by-year journal builder.
//!
//! Booking model:
//! - expense:  Expenses:Category / Liabilities:Creditors:Payee ↔ account
//! - income:   Assets:Debtors:Payee / Income:Category ↔ account
//! - transfer: account A ↔ account B (duplicate kxfer leg suppressed)
//! - split:    one category posting per split entry, payee clearing legs
//!   when a payee is attached

mod balance;
mod naming;

pub use balance::balances_up_to;
pub use naming::{
    account_name, account_prefix, account_type_tag, category_account, category_path,
    payee_account, sanitize, CREDITORS_ROOT, DEBTORS_ROOT, EXPENSES_ROOT, INCOME_ROOT,
    OPENING_EQUITY_ACCOUNT, UNCATEGORIZED,
};

use std::collections::{BTreeMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::errors::ConvertError;
use crate::homebank::{Account, Category, HomebankFile, Payee, Transaction, TxnStatus};
use crate::journal::{
    AccountDeclaration, JournalTransaction, Posting, StatusMark, TypeTag, YearJournal,
};

/// Description used for internal transfers without a payee.
const INTERNAL_TRANSFER_LABEL: &str = "Internal Transfer";
/// Payee line of the opening-balance transactions.
const OPENING_PAYEE: &str = "Opening Balances";

/// Fixed root account declarations emitted into every journal.
const ROOT_DECLARATIONS: [(&str, TypeTag); 14] = [
    ("Assets", TypeTag::Asset),
    ("Assets:Bank", TypeTag::Cash),
    ("Assets:Cash", TypeTag::Cash),
    ("Assets:Fixed Assets", TypeTag::Asset),
    ("Assets:Savings", TypeTag::Asset),
    ("Assets:Debtors", TypeTag::Asset),
    ("Liabilities", TypeTag::Liability),
    ("Liabilities:Credit Card", TypeTag::Liability),
    ("Liabilities:Loans", TypeTag::Liability),
    ("Liabilities:Creditors", TypeTag::Liability),
    ("Equity", TypeTag::Equity),
    ("Equity:Opening Balances", TypeTag::Equity),
    ("Income", TypeTag::Revenue),
    ("Expenses", TypeTag::Expense),
];

fn status_mark(status: TxnStatus) -> StatusMark {
    match status {
        TxnStatus::Reconciled => StatusMark::Reconciled,
        TxnStatus::Cleared => StatusMark::Cleared,
        TxnStatus::None | TxnStatus::Remind => StatusMark::None,
    }
}

/// Payee name and note of a transaction's description line.
fn description(txn: &Transaction, file: &HomebankFile) -> (String, String) {
    let payee_name = txn
        .payee_key
        .and_then(|key| file.payees.get(&key))
        .map(|payee| payee.name.clone())
        .unwrap_or_default();

    let mut parts = Vec::new();
    if !txn.wording.is_empty() {
        parts.push(txn.wording.as_str());
    }
    if !txn.info.is_empty() {
        parts.push(txn.info.as_str());
    }
    (payee_name, parts.join(" – "))
}

fn resolve_account<'a>(
    txn: &Transaction,
    file: &'a HomebankFile,
) -> Result<&'a Account, ConvertError> {
    file.accounts
        .get(&txn.account_key)
        .ok_or(ConvertError::MissingAccount {
            key: txn.account_key,
            date: txn.date,
        })
}

/// ISO code of an account's currency, base currency when it does not resolve.
fn account_currency<'a>(file: &'a HomebankFile, account: &Account, base_iso: &'a str) -> &'a str {
    file.currencies
        .get(&account.currency_key)
        .map(|currency| currency.iso.as_str())
        .unwrap_or(base_iso)
}

/// Converts a simple (non-split, non-transfer) transaction.
///
/// Without a payee this is a plain two-posting entry. With a payee the
/// four-posting clearing pattern routes the amount through the payee's
/// creditor/debtor account: the two payee postings net to zero on the same
/// account but stay separate lines so per-payee reports see the gross
/// pass-through amount.
fn convert_simple(
    txn: &Transaction,
    file: &HomebankFile,
    base_iso: &str,
) -> Result<JournalTransaction, ConvertError> {
    let account = resolve_account(txn, file)?;
    let iso = account_currency(file, account, base_iso);

    let (payee_name, note) = description(txn, file);
    let account_acc = account_name(account);
    let category_acc = category_account(txn.category_key, txn.amount, &file.categories);
    let amount = txn.amount;

    let mut postings = Vec::new();
    if !payee_name.is_empty() {
        let payee_acc = payee_account(&payee_name, amount);
        let magnitude = amount.abs();

        if amount < Decimal::ZERO {
            postings.push(Posting::new(category_acc, magnitude, iso));
            postings.push(Posting::new(payee_acc.clone(), -magnitude, iso));
            postings.push(Posting::new(payee_acc, magnitude, iso));
            postings.push(Posting::new(account_acc, -magnitude, iso));
        } else {
            postings.push(Posting::new(payee_acc.clone(), magnitude, iso));
            postings.push(Posting::new(category_acc, -magnitude, iso));
            postings.push(Posting::new(account_acc, magnitude, iso));
            postings.push(Posting::new(payee_acc, -magnitude, iso));
        }
    } else if amount < Decimal::ZERO {
        postings.push(Posting::new(category_acc, amount.abs(), iso));
        postings.push(Posting::new(account_acc, amount, iso));
    } else {
        postings.push(Posting::new(account_acc, amount, iso));
        postings.push(Posting::new(category_acc, -amount, iso));
    }

    Ok(JournalTransaction {
        date: txn.date,
        status: status_mark(txn.status),
        payee: payee_name,
        note,
        postings,
        comment: String::new(),
    })
}

/// Converts one leg of an internal transfer into the paired two-posting
/// entry: `+amount` on the source account, `−amount` on the destination.
fn convert_transfer(
    txn: &Transaction,
    dst_key: u32,
    file: &HomebankFile,
    base_iso: &str,
) -> Result<JournalTransaction, ConvertError> {
    let src = resolve_account(txn, file)?;
    let dst = file
        .accounts
        .get(&dst_key)
        .ok_or(ConvertError::MissingTransferAccount {
            key: dst_key,
            date: txn.date,
        })?;
    let iso = account_currency(file, src, base_iso);

    let (payee_name, note) = description(txn, file);
    let postings = vec![
        Posting::new(account_name(src), txn.amount, iso),
        Posting::new(account_name(dst), -txn.amount, iso),
    ];

    let payee = if payee_name.is_empty() {
        INTERNAL_TRANSFER_LABEL.to_string()
    } else {
        payee_name
    };

    Ok(JournalTransaction {
        date: txn.date,
        status: status_mark(txn.status),
        payee,
        note,
        postings,
        comment: String::new(),
    })
}

/// Converts a split transaction.
///
/// Each split resolves its own category account; the Income/Expenses
/// fallback is governed by the split's own signed amount, while the payee
/// clearing direction follows the transaction total.
fn convert_split(
    txn: &Transaction,
    file: &HomebankFile,
    base_iso: &str,
) -> Result<JournalTransaction, ConvertError> {
    let account = resolve_account(txn, file)?;
    if txn.splits.is_empty() {
        return Err(ConvertError::EmptySplit(txn.date));
    }
    let iso = account_currency(file, account, base_iso);

    let (payee_name, note) = description(txn, file);
    let account_acc = account_name(account);
    let total = txn.amount;

    let mut postings = Vec::new();
    if !payee_name.is_empty() {
        let payee_acc = payee_account(&payee_name, total);
        let total_magnitude = total.abs();

        // Category/payee pair per split, then one closing pair moving the
        // transaction total between the clearing account and the real one.
        for split in &txn.splits {
            let split_magnitude = split.amount.abs();
            let category_acc = category_account(split.category_key, split.amount, &file.categories);
            if total < Decimal::ZERO {
                postings.push(
                    Posting::new(category_acc, split_magnitude, iso)
                        .with_comment(split.memo.clone()),
                );
                postings.push(Posting::new(payee_acc.clone(), -split_magnitude, iso));
            } else {
                postings.push(
                    Posting::new(payee_acc.clone(), split_magnitude, iso)
                        .with_comment(split.memo.clone()),
                );
                postings.push(Posting::new(category_acc, -split_magnitude, iso));
            }
        }

        if total < Decimal::ZERO {
            postings.push(Posting::new(payee_acc, total_magnitude, iso));
            postings.push(Posting::new(account_acc, -total_magnitude, iso));
        } else {
            postings.push(Posting::new(account_acc, total_magnitude, iso));
            postings.push(Posting::new(payee_acc, -total_magnitude, iso));
        }
    } else {
        for split in &txn.splits {
            let category_acc = category_account(split.category_key, split.amount, &file.categories);
            // Negated so the category leg offsets the account leg for either
            // sign of the split.
            postings.push(
                Posting::new(category_acc, -split.amount, iso).with_comment(split.memo.clone()),
            );
        }
        postings.push(Posting::new(account_acc, total, iso));
    }

    Ok(JournalTransaction {
        date: txn.date,
        status: status_mark(txn.status),
        payee: payee_name,
        note,
        postings,
        comment: String::new(),
    })
}

/// Converts a single source transaction, dispatching to the transfer, split,
/// or simple rule in that priority order.
///
/// Returns `Ok(None)` for the suppressed second leg of an internal transfer.
pub fn convert_transaction(
    txn: &Transaction,
    file: &HomebankFile,
    base_iso: &str,
    seen_kxfer: &mut HashSet<u32>,
) -> Result<Option<JournalTransaction>, ConvertError> {
    if let (Some(kxfer), Some(dst_key)) = (txn.kxfer, txn.dst_account_key) {
        // The id is consumed even if this leg fails to convert, so its twin
        // cannot produce a half transfer later.
        if !seen_kxfer.insert(kxfer) {
            return Ok(None);
        }
        return convert_transfer(txn, dst_key, file, base_iso).map(Some);
    }
    if txn.is_split() {
        return convert_split(txn, file, base_iso).map(Some);
    }
    convert_simple(txn, file, base_iso).map(Some)
}

/// Builds the opening-balance transaction for `year` from the balances as of
/// Dec 31 of the previous year. Returns `None` when no resolvable account
/// carries a non-zero balance.
fn opening_balance(
    year: i32,
    balances: &BTreeMap<u32, Decimal>,
    file: &HomebankFile,
    base_iso: &str,
) -> Option<JournalTransaction> {
    let mut postings = Vec::new();
    for (key, balance) in balances {
        if balance.is_zero() {
            continue;
        }
        let Some(account) = file.accounts.get(key) else {
            continue;
        };
        let iso = account_currency(file, account, base_iso);
        postings.push(Posting::new(account_name(account), *balance, iso));
    }
    if postings.is_empty() {
        return None;
    }

    // Equity counter-posting without an amount, inferred by the consumer.
    postings.push(Posting::inferred(OPENING_EQUITY_ACCOUNT, base_iso));

    Some(JournalTransaction {
        date: NaiveDate::from_ymd_opt(year, 1, 1).expect("first of January always exists"),
        status: StatusMark::Reconciled,
        payee: OPENING_PAYEE.to_string(),
        note: year.to_string(),
        postings,
        comment: String::new(),
    })
}

/// All account declarations for one journal: fixed roots, real accounts,
/// per-payee clearing accounts, category accounts.
fn account_declarations(file: &HomebankFile) -> Vec<AccountDeclaration> {
    let mut declarations: Vec<AccountDeclaration> = ROOT_DECLARATIONS
        .iter()
        .map(|(account, tag)| AccountDeclaration::new(*account, *tag))
        .collect();

    let mut accounts: Vec<&Account> = file.accounts.values().collect();
    accounts.sort_by(|a, b| a.name.cmp(&b.name));
    for account in accounts {
        let mut declaration =
            AccountDeclaration::new(account_name(account), account_type_tag(account.kind));
        if account.is_closed() {
            declaration = declaration.closed();
        }
        declarations.push(declaration);
    }

    let mut payees: Vec<&Payee> = file.payees.values().collect();
    payees.sort_by(|a, b| a.name.cmp(&b.name));
    for payee in payees {
        let safe_name = sanitize(&payee.name);
        if safe_name.is_empty() {
            continue;
        }
        declarations.push(AccountDeclaration::new(
            format!("{DEBTORS_ROOT}:{safe_name}"),
            TypeTag::Asset,
        ));
        declarations.push(AccountDeclaration::new(
            format!("{CREDITORS_ROOT}:{safe_name}"),
            TypeTag::Liability,
        ));
    }

    let mut categories: Vec<&Category> = file.categories.values().collect();
    categories.sort_by(|a, b| a.name.cmp(&b.name));
    for category in categories {
        let (root, tag) = if category.is_income() {
            (INCOME_ROOT, TypeTag::Revenue)
        } else {
            (EXPENSES_ROOT, TypeTag::Expense)
        };
        declarations.push(AccountDeclaration::new(
            format!("{}:{}", root, category_path(category.key, &file.categories)),
            tag,
        ));
    }

    declarations
}

fn payee_declarations(file: &HomebankFile) -> Vec<String> {
    let mut payees: Vec<&Payee> = file.payees.values().collect();
    payees.sort_by(|a, b| a.name.cmp(&b.name));
    payees
        .into_iter()
        .map(|payee| sanitize(&payee.name))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Builds the journal for a single year. Conversion failures skip the
/// offending transaction with a diagnostic and construction continues.
fn build_journal(
    year: i32,
    min_year: i32,
    file: &HomebankFile,
    base_iso: &str,
    seen_kxfer: &mut HashSet<u32>,
) -> YearJournal {
    let mut journal = YearJournal {
        year,
        base_currency_iso: base_iso.to_string(),
        account_declarations: account_declarations(file),
        payee_declarations: payee_declarations(file),
        transactions: Vec::new(),
    };

    if year > min_year {
        let prev_year_end =
            NaiveDate::from_ymd_opt(year - 1, 12, 31).expect("last of December always exists");
        let balances = balances_up_to(file, prev_year_end);
        if let Some(opening) = opening_balance(year, &balances, file, base_iso) {
            journal.transactions.push(opening);
        }
    }

    for txn in file.transactions.iter().filter(|t| t.date.year() == year) {
        match convert_transaction(txn, file, base_iso, seen_kxfer) {
            Ok(Some(converted)) => {
                debug_assert!(
                    converted.is_balanced(),
                    "unbalanced postings on {}",
                    converted.date
                );
                journal.transactions.push(converted);
            }
            // Suppressed duplicate leg of an internal transfer.
            Ok(None) => {}
            Err(err) => tracing::warn!("skipping transaction: {err}"),
        }
    }

    journal
}

/// Converts a parsed export into one journal per calendar year, oldest
/// first. The transfer-dedup set is threaded through all years so the first
/// occurrence of a kxfer id wins globally.
pub fn convert(file: &HomebankFile) -> Result<Vec<YearJournal>, ConvertError> {
    let base_currency = file
        .base_currency()
        .ok_or(ConvertError::MissingBaseCurrency(file.base_currency_key))?;
    let base_iso = base_currency.iso.clone();

    if file.transactions.is_empty() {
        tracing::warn!("no transactions found, returning an empty journal list");
        return Ok(Vec::new());
    }

    let mut years: Vec<i32> = file.transactions.iter().map(|t| t.date.year()).collect();
    years.sort_unstable();
    years.dedup();
    tracing::info!("years with transactions: {years:?}");
    let min_year = years[0];

    let mut seen_kxfer = HashSet::new();
    let journals = years
        .iter()
        .map(|&year| build_journal(year, min_year, file, &base_iso, &mut seen_kxfer))
        .collect();

    Ok(journals)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_marks_map_like_the_export() {
        assert_eq!(status_mark(TxnStatus::None), StatusMark::None);
        assert_eq!(status_mark(TxnStatus::Cleared), StatusMark::Cleared);
        assert_eq!(status_mark(TxnStatus::Reconciled), StatusMark::Reconciled);
        assert_eq!(status_mark(TxnStatus::Remind), StatusMark::None);
    }

    #[test]
    fn root_declarations_cover_every_fixed_prefix() {
        let roots: Vec<&str> = ROOT_DECLARATIONS.iter().map(|(name, _)| *name).collect();
        for prefix in [
            "Assets:Bank",
            "Assets:Cash",
            "Assets:Fixed Assets",
            "Liabilities:Credit Card",
            "Liabilities:Loans",
            "Assets:Savings",
        ] {
            assert!(roots.contains(&prefix), "missing root for {prefix}");
        }
        assert!(roots.contains(&OPENING_EQUITY_ACCOUNT));
    }
}
