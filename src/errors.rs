use chrono::NaiveDate;
use thiserror::Error;

/// Error type for failures while decoding a HomeBank XHB export.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid XML: {0}")]
    Xml(String),
    #[error("unexpected root element <{0}> (expected <homebank>)")]
    UnexpectedRoot(String),
    #[error("required element <properties> missing")]
    MissingProperties,
    #[error("required attribute '{attr}' missing in <{element}>")]
    MissingAttribute {
        element: &'static str,
        attr: &'static str,
    },
    #[error("invalid integer '{value}' for attribute '{attr}' in <{element}>")]
    InvalidInteger {
        element: &'static str,
        attr: &'static str,
        value: String,
    },
    #[error("invalid decimal '{value}' for attribute '{attr}' in <{element}>")]
    InvalidDecimal {
        element: &'static str,
        attr: &'static str,
        value: String,
    },
    #[error("invalid date value '{value}' in <{element}>")]
    InvalidDate {
        element: &'static str,
        value: String,
    },
    #[error("inconsistent split lists in <ope>: {categories} categories, {amounts} amounts")]
    SplitListMismatch { categories: usize, amounts: usize },
    #[error("<{element}> with key 0 is not valid")]
    ZeroKey { element: &'static str },
}

/// Error type for failures while converting transactions to journal entries.
///
/// `MissingBaseCurrency` is structural and aborts the whole conversion; the
/// remaining variants are per-transaction and cause a skip-and-continue.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("base currency {0} is not defined")]
    MissingBaseCurrency(u32),
    #[error("account {key} not found for transaction on {date}")]
    MissingAccount { key: u32, date: NaiveDate },
    #[error("destination account {key} not found for internal transfer on {date}")]
    MissingTransferAccount { key: u32, date: NaiveDate },
    #[error("split transaction on {0} has no split entries")]
    EmptySplit(NaiveDate),
}
