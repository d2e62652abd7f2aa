//! Converts HomeBank (.xhb) exports into per-year hledger journal files:
//! balanced double-entry postings, opening-balance carryover between years,
//! and account/payee declarations.

pub mod convert;
pub mod currency;
pub mod errors;
pub mod homebank;
pub mod journal;
pub mod utils;
pub mod writer;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup debug log.
pub fn init(verbose: bool) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(verbose);
        tracing::debug!("homebank2hledger tracing initialized.");
    });
}
