//! CLI command definitions and argument parsing.

use crate::config::{OutputFormat, Preset};
use clap::{Parser, Subcommand};
use rfp_domain::RecordKind;
use std::path::PathBuf;

/// RFP Extract - Pull requirements and risks out of tender documents.
#[derive(Debug, Parser)]
#[command(name = "rfp")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "RFP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract requirements or risks from a text document
    Extract(ExtractArgs),

    /// Match exported requirements against a service catalog
    Match(MatchArgs),

    /// Print the effective configuration as TOML
    Config,
}

/// Record kind argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum KindArg {
    /// Obligations the bidder must meet
    Requirement,
    /// Exposure the bidder would take on
    Risk,
}

impl From<KindArg> for RecordKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Requirement => RecordKind::Requirement,
            KindArg::Risk => RecordKind::Risk,
        }
    }
}

/// Extractor preset argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PresetArg {
    /// Balanced defaults
    Default,
    /// Smaller chunks, stricter thresholds
    Aggressive,
    /// Larger chunks, keeps more candidates
    Lenient,
}

impl From<PresetArg> for Preset {
    fn from(preset: PresetArg) -> Self {
        match preset {
            PresetArg::Default => Preset::Default,
            PresetArg::Aggressive => Preset::Aggressive,
            PresetArg::Lenient => Preset::Lenient,
        }
    }
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Plain-text document; form feeds separate pages
    pub input: PathBuf,

    /// What to extract
    #[arg(short, long, value_enum, default_value = "requirement")]
    pub kind: KindArg,

    /// Write the records as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Identifier recorded in the run metadata (defaults to the file stem)
    #[arg(long)]
    pub source_id: Option<String>,

    /// Try this configured provider before the others
    #[arg(long)]
    pub provider: Option<String>,

    /// Replace the extractor settings with a preset
    #[arg(long, value_enum)]
    pub preset: Option<PresetArg>,

    /// Skip LLM providers and use pattern matching only
    #[arg(long, conflicts_with_all = ["provider", "no_patterns"])]
    pub offline: bool,

    /// Disable pattern matching
    #[arg(long)]
    pub no_patterns: bool,

    /// Override the confidence threshold for the selected kind
    #[arg(long)]
    pub min_confidence: Option<f64>,
}

/// Arguments for the match command.
#[derive(Debug, Parser)]
pub struct MatchArgs {
    /// Records file written by `extract --output`
    pub records: PathBuf,

    /// Service catalog (JSON)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Minimum overlap score for a match (0.0-1.0)
    #[arg(long, default_value = "0.3")]
    pub min_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_extract_args() {
        let cli = Cli::parse_from([
            "rfp", "extract", "tender.txt", "--kind", "risk", "--provider", "openai", "-o", "out.json",
        ]);
        match cli.command {
            Command::Extract(args) => {
                assert_eq!(args.input, PathBuf::from("tender.txt"));
                assert!(matches!(args.kind, KindArg::Risk));
                assert_eq!(args.provider.as_deref(), Some("openai"));
                assert_eq!(args.output, Some(PathBuf::from("out.json")));
                assert!(!args.offline);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_offline_conflicts_with_provider() {
        let result = Cli::try_parse_from(["rfp", "extract", "t.txt", "--offline", "--provider", "ollama"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_match_defaults() {
        let cli = Cli::parse_from(["rfp", "match", "records.json", "--catalog", "services.json"]);
        match cli.command {
            Command::Match(args) => {
                assert_eq!(args.min_score, 0.3);
                assert_eq!(args.catalog, PathBuf::from("services.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
