//! Output model handed to the journal writer.
//!
//! Everything here is a plain value record; the writer owns all text layout
//! (number formatting, alignment, directives).

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A posting amount. `Inferred` leaves the amount off the posting line so the
/// consumer balances the transaction itself; only the opening-balance equity
/// leg uses it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PostingAmount {
    Fixed(Decimal),
    Inferred,
}

impl PostingAmount {
    pub fn fixed(&self) -> Option<Decimal> {
        match self {
            PostingAmount::Fixed(value) => Some(*value),
            PostingAmount::Inferred => None,
        }
    }
}

/// One signed amount against one named account within a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub account: String,
    pub amount: PostingAmount,
    /// ISO 4217 code.
    pub currency: String,
    pub comment: String,
}

impl Posting {
    pub fn new(account: impl Into<String>, amount: Decimal, currency: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            amount: PostingAmount::Fixed(amount),
            currency: currency.into(),
            comment: String::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    pub fn inferred(account: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            amount: PostingAmount::Inferred,
            currency: currency.into(),
            comment: String::new(),
        }
    }
}

/// The three-valued transaction status mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusMark {
    #[default]
    None,
    Cleared,
    Reconciled,
}

impl StatusMark {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusMark::None => "",
            StatusMark::Cleared => "!",
            StatusMark::Reconciled => "*",
        }
    }
}

/// hledger account classification tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    Asset,
    Cash,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Asset => "A",
            TypeTag::Cash => "C",
            TypeTag::Liability => "L",
            TypeTag::Equity => "E",
            TypeTag::Revenue => "R",
            TypeTag::Expense => "X",
        }
    }
}

/// An `account` directive: target account name, classification tag, and
/// whether the source account is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDeclaration {
    pub account: String,
    pub type_tag: TypeTag,
    pub closed: bool,
}

impl AccountDeclaration {
    pub fn new(account: impl Into<String>, type_tag: TypeTag) -> Self {
        Self {
            account: account.into(),
            type_tag,
            closed: false,
        }
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }
}

/// A complete journal transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalTransaction {
    pub date: NaiveDate,
    pub status: StatusMark,
    pub payee: String,
    pub note: String,
    pub postings: Vec<Posting>,
    pub comment: String,
}

impl JournalTransaction {
    /// Sums the fixed posting amounts per currency.
    pub fn currency_sums(&self) -> BTreeMap<&str, Decimal> {
        let mut sums: BTreeMap<&str, Decimal> = BTreeMap::new();
        for posting in &self.postings {
            if let PostingAmount::Fixed(amount) = posting.amount {
                *sums.entry(posting.currency.as_str()).or_default() += amount;
            }
        }
        sums
    }

    /// Returns true if every currency's fixed postings sum to zero, allowing
    /// at most one inferred posting to absorb the remainder.
    pub fn is_balanced(&self) -> bool {
        let inferred = self
            .postings
            .iter()
            .filter(|p| p.amount == PostingAmount::Inferred)
            .count();
        if inferred > 1 {
            return false;
        }
        if inferred == 1 {
            return true;
        }
        self.currency_sums().values().all(Decimal::is_zero)
    }
}

/// A journal for one calendar year, self-contained with its declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearJournal {
    pub year: i32,
    pub base_currency_iso: String,
    pub account_declarations: Vec<AccountDeclaration>,
    pub payee_declarations: Vec<String>,
    pub transactions: Vec<JournalTransaction>,
}
