//! Shared fixture builders for the integration tests.

use chrono::NaiveDate;
use homebank2hledger::homebank::{
    Account, AccountKind, Category, Currency, HomebankFile, Payee, Split, Transaction, TxnStatus,
    GF_INCOME, OF_SPLIT,
};
use rust_decimal::Decimal;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn eur(key: u32) -> Currency {
    Currency {
        key,
        iso: "EUR".into(),
        name: "Euro".into(),
        symbol: "€".into(),
        decimal_char: ",".into(),
        group_char: ".".into(),
        fraction: 2,
        rate: Decimal::ZERO,
    }
}

pub fn account(key: u32, name: &str, kind: AccountKind, initial: Decimal) -> Account {
    Account {
        key,
        name: name.into(),
        kind,
        currency_key: 1,
        initial_balance: initial,
        flags: 0,
        number: String::new(),
        bank_name: String::new(),
        notes: String::new(),
        group_key: None,
    }
}

pub fn payee(key: u32, name: &str) -> Payee {
    Payee {
        key,
        name: name.into(),
        default_category_key: None,
        default_paymode: None,
    }
}

pub fn category(key: u32, name: &str, income: bool, parent_key: Option<u32>) -> Category {
    Category {
        key,
        name: name.into(),
        flags: if income { GF_INCOME } else { 0 },
        parent_key,
    }
}

pub fn txn(date: NaiveDate, amount: Decimal, account_key: u32) -> Transaction {
    Transaction {
        date,
        amount,
        account_key,
        flags: 0,
        status: TxnStatus::None,
        paymode: 0,
        payee_key: None,
        category_key: None,
        wording: String::new(),
        info: String::new(),
        tags: Vec::new(),
        kxfer: None,
        dst_account_key: None,
        splits: Vec::new(),
    }
}

pub fn split(amount: Decimal, category_key: Option<u32>, memo: &str) -> Split {
    Split {
        amount,
        category_key,
        memo: memo.into(),
    }
}

pub fn split_txn(
    date: NaiveDate,
    total: Decimal,
    account_key: u32,
    splits: Vec<Split>,
) -> Transaction {
    let mut transaction = txn(date, total, account_key);
    transaction.flags = OF_SPLIT;
    transaction.splits = splits;
    transaction
}

pub fn transfer(
    date: NaiveDate,
    amount: Decimal,
    account_key: u32,
    dst_account_key: u32,
    kxfer: u32,
) -> Transaction {
    let mut transaction = txn(date, amount, account_key);
    transaction.kxfer = Some(kxfer);
    transaction.dst_account_key = Some(dst_account_key);
    transaction
}

/// A file with one EUR base currency, a checking and a wallet account, the
/// payee REWE, and the categories Groceries (expense) and Salary (income).
pub fn base_file() -> HomebankFile {
    let mut file = HomebankFile::default();
    file.base_currency_key = 1;
    file.currencies.insert(1, eur(1));
    file.accounts.insert(
        1,
        account(
            1,
            "Checking",
            AccountKind::Bank,
            Decimal::from_str_exact("1000.00").unwrap(),
        ),
    );
    file.accounts.insert(
        2,
        account(
            2,
            "Wallet",
            AccountKind::Cash,
            Decimal::from_str_exact("50.00").unwrap(),
        ),
    );
    file.payees.insert(1, payee(1, "REWE"));
    file.categories
        .insert(1, category(1, "Groceries", false, None));
    file.categories.insert(2, category(2, "Salary", true, None));
    file
}
