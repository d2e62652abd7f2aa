use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use homebank2hledger::currency::AmountFormat;
use homebank2hledger::{convert, homebank, init, writer};

/// Converts HomeBank (.xhb) exports into hledger journal files, one per
/// calendar year, plus a main.journal with include directives.
#[derive(Debug, Parser)]
#[command(name = "homebank2hledger", version)]
struct Cli {
    /// HomeBank export file (.xhb).
    input: PathBuf,
    /// Directory for the generated journal files.
    output_dir: PathBuf,
    /// Verbose log output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init(cli.verbose);

    let file = match homebank::parse_xhb(&cli.input) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("error reading '{}': {err}", cli.input.display());
            return ExitCode::from(1);
        }
    };

    let journals = match convert::convert(&file) {
        Ok(journals) => journals,
        Err(err) => {
            eprintln!("conversion failed: {err}");
            return ExitCode::from(2);
        }
    };

    if journals.is_empty() {
        eprintln!("no transactions found, no journal files written");
        return ExitCode::SUCCESS;
    }

    let format = file
        .base_currency()
        .map(AmountFormat::from_currency)
        .unwrap_or_default();

    if let Err(err) = writer::write_journals(&journals, &format, &cli.output_dir) {
        eprintln!("error writing journal files: {err}");
        return ExitCode::from(3);
    }

    let total: usize = journals.iter().map(|j| j.transactions.len()).sum();
    eprintln!(
        "wrote {} journal file(s) with {} transactions to '{}'",
        journals.len(),
        total,
        cli.output_dir.display()
    );
    ExitCode::SUCCESS
}
