//! Match command implementation.

use crate::cli::MatchArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rfp_extractor::{read_records, ServiceCatalog};

/// Execute the match command.
pub async fn execute_match(args: MatchArgs, formatter: &Formatter) -> Result<()> {
    if !(0.0..=1.0).contains(&args.min_score) {
        return Err(CliError::InvalidInput(format!(
            "--min-score must be within [0.0, 1.0], got {}",
            args.min_score
        )));
    }

    let records = read_records(&args.records)?;
    let catalog = ServiceCatalog::load(&args.catalog)?;
    if catalog.is_empty() {
        eprintln!("{}", formatter.warning("Service catalog is empty"));
    }

    let matches = catalog.match_records(&records, args.min_score);
    println!("{}", formatter.format_matches(&matches)?);
    eprintln!(
        "{}",
        formatter.info(&format!("{} of {} record(s) matched a service", matches.len(), records.len()))
    );

    Ok(())
}
