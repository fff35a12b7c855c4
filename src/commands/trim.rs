use anyhow::{Context, Result};
use std::time::Duration;

use crate::cli::TrimArgs;
use crate::output::{ConsoleProgress, DirectorySink, DocumentReport};
use crate::pipeline::{ExtractionPipeline, PipelineConfig};
use crate::registry::DocumentRegistry;

use super::{collect_inputs, ingest_all};

pub async fn run(args: TrimArgs) -> Result<()> {
    let files = collect_inputs(&args.inputs)?;

    let mut registry = DocumentRegistry::new();
    ingest_all(&mut registry, &files);

    if registry.is_empty() {
        anyhow::bail!("No PDF documents to process");
    }

    if let Some(pages) = &args.pages {
        for index in 0..registry.len() {
            registry.update_range(index, pages);
        }
    }

    for arg in &args.ranges {
        let (position, expression) = parse_range_override(arg)?;
        if position > registry.len() {
            log::warn!(
                "Ignoring --range {}: only {} document(s) were loaded",
                arg,
                registry.len()
            );
            eprintln!(
                "warning: ignoring --range {}: only {} document(s) were loaded",
                arg,
                registry.len()
            );
            continue;
        }
        registry.update_range(position - 1, expression);
    }

    // highest first so the remaining positions still match the command line
    let mut skip = args.skip.clone();
    skip.sort_unstable_by(|a, b| b.cmp(a));
    skip.dedup();
    for position in skip {
        match position.checked_sub(1).and_then(|i| registry.remove(i)) {
            Some(doc) => log::info!("Skipping {} (position {})", doc.name(), position),
            None => {
                log::warn!("Ignoring --skip {}: no such document", position);
                eprintln!("warning: ignoring --skip {}: no such document", position);
            }
        }
    }

    if registry.is_empty() {
        anyhow::bail!("Every document was skipped");
    }

    let pipeline = ExtractionPipeline::new(PipelineConfig {
        release_delay: Duration::from_millis(args.release_delay_ms),
    });
    let mut progress = ConsoleProgress::new(!args.quiet && !args.json);
    let mut sink = DirectorySink::create(&args.output_dir, args.force)?;

    let results = pipeline
        .run(registry.documents(), args.compression, &mut progress, &mut sink)
        .await?;

    let reports: Vec<_> = results
        .iter()
        .map(|r| DocumentReport::new(r, &args.output_dir))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        for report in &reports {
            match (&report.output, &report.error) {
                (Some(output), _) => println!(
                    "{} -> {} ({} page(s))",
                    report.source,
                    output,
                    report.page_count.unwrap_or_default()
                ),
                (None, Some(error)) => println!("{}: failed: {}", report.source, error),
                (None, None) => {}
            }
        }
    }

    let failed = reports.iter().filter(|r| r.output.is_none()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} document(s) failed", failed, reports.len());
    }

    Ok(())
}

/// Parse "N=EXPR" where N is a 1-based document position.
fn parse_range_override(arg: &str) -> Result<(usize, &str)> {
    let (position, expression) = arg
        .split_once('=')
        .with_context(|| format!("Invalid range override {:?}, expected N=EXPR", arg))?;
    let position: usize = position
        .trim()
        .parse()
        .with_context(|| format!("Invalid document position in {:?}", arg))?;

    if position == 0 {
        anyhow::bail!("Document positions start at 1: {:?}", arg);
    }

    Ok((position, expression.trim()))
}
