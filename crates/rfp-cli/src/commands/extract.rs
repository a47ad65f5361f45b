//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::{Config, Preset};
use crate::error::{CliError, Result};
use crate::output::Formatter;
use rfp_domain::{Document, RecordKind};
use rfp_extractor::{write_records, ExtractionRequest, Extractor, ExtractorConfig};
use rfp_llm::{build_chain, MockProvider, ProviderChain};
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Execute the extract command.
pub async fn execute_extract(args: ExtractArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let extractor_config = extractor_config(&args, config)?;
    let chain = provider_chain(&args, config)?;
    let model_name = chain.names().join(" > ");

    let raw = fs::read_to_string(&args.input)?;
    let document = Document::from_paged_text(&raw);
    let source_id = args.source_id.clone().unwrap_or_else(|| {
        args.input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    });

    let cancel = Arc::new(AtomicBool::new(false));
    let extractor = Extractor::new(chain, extractor_config)?
        .with_model_name(model_name)
        .with_cancellation(cancel.clone());

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, stopping after the current chunk");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let request = ExtractionRequest {
        document,
        kind: args.kind.into(),
        source_id,
    };
    let result = extractor.extract(request).await;
    interrupt.abort();
    let result = result?;

    for failure in &result.failures {
        eprintln!("{}", formatter.chunk_failure(failure));
    }
    for warning in &result.warnings {
        eprintln!("{}", formatter.warning(&warning.to_string()));
    }
    eprintln!("{}", formatter.run_summary(&result));

    match &args.output {
        Some(path) => {
            write_records(path, &result.records)?;
            println!(
                "{}",
                formatter.success(&format!("Wrote {} record(s) to {}", result.records.len(), path.display()))
            );
        }
        None => println!("{}", formatter.format_records(&result.records)?),
    }

    Ok(())
}

/// Extractor settings after applying the preset and command-line overrides.
fn extractor_config(args: &ExtractArgs, config: &Config) -> Result<ExtractorConfig> {
    let mut extractor_config = match args.preset {
        Some(preset) => Preset::from(preset).extractor_config(),
        None => config.extractor.clone(),
    };

    if args.offline {
        extractor_config.pattern_matching = true;
    }
    if args.no_patterns {
        extractor_config.pattern_matching = false;
    }
    if let Some(threshold) = args.min_confidence {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(CliError::InvalidInput(format!(
                "--min-confidence must be within [0.0, 1.0], got {}",
                threshold
            )));
        }
        match RecordKind::from(args.kind) {
            RecordKind::Requirement => extractor_config.min_confidence_requirement = threshold,
            RecordKind::Risk => extractor_config.min_confidence_risk = threshold,
        }
    }

    extractor_config.validate().map_err(CliError::Config)?;
    Ok(extractor_config)
}

/// The provider chain for this run.
///
/// `--offline` swaps the configured providers for one that always answers
/// with an empty list, so only pattern matches come through.
fn provider_chain(args: &ExtractArgs, config: &Config) -> Result<ProviderChain> {
    if args.offline {
        info!("Offline mode, LLM providers disabled");
        return Ok(ProviderChain::new().with_provider(MockProvider::new("[]").with_name("offline")));
    }

    let chain = build_chain(&config.providers);
    if chain.is_empty() {
        return Err(CliError::Config(
            "No usable LLM provider configured; add [[providers]] to the config or pass --offline".to_string(),
        ));
    }

    match &args.provider {
        Some(name) if !chain.names().contains(&name.as_str()) => Err(CliError::InvalidInput(format!(
            "Provider '{}' is not configured (available: {})",
            name,
            chain.names().join(", ")
        ))),
        Some(name) => Ok(chain.prefer(name.clone())),
        None => Ok(chain),
    }
}
