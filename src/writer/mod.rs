//! Renders year journals into hledger journal files.
//!
//! All text layout lives here: number formatting, column alignment,
//! directives, and the file/include structure. The conversion engine only
//! supplies value records.

use std::fs;
use std::io;
use std::path::Path;

use rust_decimal::Decimal;

use crate::currency::{format_amount, AmountFormat};
use crate::journal::{
    AccountDeclaration, JournalTransaction, Posting, PostingAmount, YearJournal,
};

const INDENT: &str = "    ";
/// Width of the account column in posting lines. Longer names push the
/// amount right; they are never truncated.
const ACCOUNT_COLUMN: usize = 48;
/// Width of the account column in `account` directives.
const DECLARATION_COLUMN: usize = 55;

fn format_posting(posting: &Posting, format: &AmountFormat) -> String {
    let mut line = match posting.amount {
        PostingAmount::Inferred => format!("{INDENT}{}", posting.account),
        PostingAmount::Fixed(amount) => format!(
            "{INDENT}{:<width$}  {} {}",
            posting.account,
            format_amount(amount, format),
            posting.currency,
            width = ACCOUNT_COLUMN
        ),
    };
    if !posting.comment.is_empty() {
        line.push_str("  ; ");
        line.push_str(&posting.comment);
    }
    line
}

fn format_transaction(txn: &JournalTransaction, format: &AmountFormat) -> Vec<String> {
    let mut lines = Vec::with_capacity(txn.postings.len() + 1);

    let status = txn.status.as_str();
    let status_part = if status.is_empty() {
        String::new()
    } else {
        format!(" {status}")
    };

    let description = match (txn.payee.is_empty(), txn.note.is_empty()) {
        (false, false) => format!("{} | {}", txn.payee, txn.note),
        (false, true) => txn.payee.clone(),
        (true, false) => txn.note.clone(),
        (true, true) => "(no description)".to_string(),
    };

    let mut header = format!("{}{status_part} {description}", txn.date.format("%Y-%m-%d"));
    if !txn.comment.is_empty() {
        header.push_str("  ; ");
        header.push_str(&txn.comment);
    }
    lines.push(header);

    for posting in &txn.postings {
        lines.push(format_posting(posting, format));
    }

    lines
}

fn format_declaration(declaration: &AccountDeclaration) -> String {
    // The closed marker rides in the same comment as the type tag: a second
    // ';' would make hledger read everything after it as part of the type
    // code.
    let tag = declaration.type_tag.as_str();
    if declaration.closed {
        format!(
            "account {:<width$} ; type: {tag}, closed: true",
            declaration.account,
            width = DECLARATION_COLUMN
        )
    } else {
        format!(
            "account {:<width$} ; type: {tag}",
            declaration.account,
            width = DECLARATION_COLUMN
        )
    }
}

/// Renders one year journal as text.
pub fn format_journal(journal: &YearJournal, format: &AmountFormat) -> String {
    let mut sections: Vec<String> = Vec::new();

    sections.push(format!(
        "; ============================================================\n\
         ; hledger journal {}\n\
         ; generated by homebank2hledger\n\
         ; ============================================================\n",
        journal.year
    ));

    sections.push(format!("decimal-mark {}\n", format.decimal_char));
    sections.push(format!(
        "commodity {} {}\n",
        format_amount(Decimal::from(1000), format),
        journal.base_currency_iso
    ));

    if !journal.account_declarations.is_empty() {
        sections.push("; --- account declarations ---".to_string());
        for declaration in &journal.account_declarations {
            sections.push(format_declaration(declaration));
        }
        sections.push(String::new());
    }

    if !journal.payee_declarations.is_empty() {
        sections.push("; --- payees ---".to_string());
        for payee in &journal.payee_declarations {
            sections.push(format!("payee {payee}"));
        }
        sections.push(String::new());
    }

    if !journal.transactions.is_empty() {
        sections.push("; --- transactions ---".to_string());
        for txn in &journal.transactions {
            sections.push(format_transaction(txn, format).join("\n"));
            sections.push(String::new());
        }
    }

    sections.join("\n")
}

/// Renders the main journal that includes every year file.
pub fn format_main_journal(years: &[i32]) -> String {
    let mut lines = vec![
        "; ============================================================".to_string(),
        "; hledger main journal".to_string(),
        "; every year journal is pulled in via include.".to_string(),
        "; ============================================================".to_string(),
        String::new(),
    ];
    for year in years {
        lines.push(format!("include {year}.journal"));
    }
    lines.push(String::new());
    lines.join("\n")
}

/// Writes one `<year>.journal` per journal plus `main.journal` into
/// `output_dir`, creating the directory if needed.
pub fn write_journals(
    journals: &[YearJournal],
    format: &AmountFormat,
    output_dir: &Path,
) -> io::Result<()> {
    fs::create_dir_all(output_dir)?;

    let mut years: Vec<i32> = journals.iter().map(|journal| journal.year).collect();
    years.sort_unstable();

    for journal in journals {
        let path = output_dir.join(format!("{}.journal", journal.year));
        fs::write(&path, format_journal(journal, format))?;
        tracing::info!(
            "wrote {} ({} transactions)",
            path.display(),
            journal.transactions.len()
        );
    }

    let main_path = output_dir.join("main.journal");
    fs::write(&main_path, format_main_journal(&years))?;
    tracing::info!("wrote {}", main_path.display());

    Ok(())
}
