use anyhow::{Context, Result};
use log::info;
use std::collections::HashSet;
use std::io::BufRead;
use std::path::PathBuf;

use affyconv::convert::{ConversionOptions, Converter, TsvSink};
use affyconv::formats::calvin::ParseOptions;
use affyconv::formats::CalvinFile;
use affyconv::genotypes::{ChpGenotypes, GenotypeIterator, TableGenotypes};
use affyconv::models::ClusterModelStore;
use affyconv::text::open_text;

use super::config::Config;

/// Command-line inputs of the convert command
pub struct ConvertArgs {
    pub chp: Vec<PathBuf>,
    pub calls: Option<PathBuf>,
    pub confidences: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub models: Option<PathBuf>,
    pub adjust_clusters: bool,
    pub markers: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
}

/// Convert CHP files or apt text tables to a per-sample TSV
pub fn run(args: ConvertArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    }
    .conversion;

    let models_path = args.models.or(config.models);
    let output = args.output.or(config.output);
    let mut options = ConversionOptions {
        adjust_clusters: args.adjust_clusters || config.adjust_clusters.unwrap_or(false),
        ..Default::default()
    };
    if let Some(interval) = config.progress_interval {
        options.progress_interval = interval;
    }

    let has_tables = args.calls.is_some() || args.confidences.is_some() || args.summary.is_some();
    if args.chp.is_empty() && !has_tables {
        anyhow::bail!("Expected CHP files or --calls/--confidences/--summary tables");
    }

    let mut source = if args.chp.is_empty() {
        GenotypeIterator::Tables(TableGenotypes::open(
            args.calls.as_deref(),
            args.confidences.as_deref(),
            args.summary.as_deref(),
        )?)
    } else {
        let parse = ParseOptions {
            drop_bulk_parameters: true,
        };
        let files = args
            .chp
            .iter()
            .map(|path| {
                info!("Reading AGCC file {}", path.display());
                CalvinFile::open(path, parse.clone())
                    .with_context(|| format!("Failed to read {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        GenotypeIterator::Chp(ChpGenotypes::new(files)?)
    };

    let models = models_path
        .as_deref()
        .map(|path| {
            ClusterModelStore::from_path(path)
                .with_context(|| format!("Failed to load SNP models {}", path.display()))
        })
        .transpose()?;

    let mut sink = TsvSink::new(super::open_output(output.as_deref())?);
    if let Some(path) = &args.markers {
        sink = sink.with_localized_markers(read_marker_list(path)?);
    }

    let stats = Converter::new(models.as_ref(), options)
        .run(&mut source, &mut sink)
        .context("Conversion failed")?;

    info!("Conversion complete:");
    info!("  Markers: {}", stats.markers);
    info!("  Missing models: {}", stats.missing_models);
    info!("  Skipped: {}", stats.skipped);
    Ok(())
}

/// One marker id per line; blank and `#` lines are ignored
fn read_marker_list(path: &std::path::Path) -> Result<HashSet<String>> {
    let reader = open_text(path)
        .with_context(|| format!("Failed to open marker list {}", path.display()))?;
    let mut markers = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() && !id.starts_with('#') {
            markers.insert(id.to_string());
        }
    }
    info!("Loaded {} localized markers", markers.len());
    Ok(markers)
}
