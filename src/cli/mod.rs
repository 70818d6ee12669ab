use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod convert;
mod info;
mod sex;

/// affyconv - Affymetrix genotype file converter
#[derive(Parser)]
#[command(name = "affyconv")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the contents of Calvin (AGCC) or XDA CEL files
    Info {
        /// Input CHP/CEL files
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Also list data rows and cell entries
        #[arg(long)]
        rows: bool,

        /// Print container metadata as JSON
        #[arg(long, conflicts_with_all = ["rows", "chip_summary"])]
        json: bool,

        /// Tabulate the chip summary parameters of CHP files
        #[arg(long)]
        chip_summary: bool,

        /// Tabulate the scanner DAT headers of CEL files
        #[arg(long, conflicts_with_all = ["rows", "json", "chip_summary"])]
        cel_summary: bool,
    },

    /// Convert genotypes to a per-sample TSV with BAF and LRR
    Convert {
        /// AGCC CHP genotype files
        #[arg(value_name = "CHP", conflicts_with_all = ["calls", "confidences", "summary"])]
        chp: Vec<PathBuf>,

        /// apt-probeset-genotype calls table
        #[arg(long, value_name = "FILE")]
        calls: Option<PathBuf>,

        /// apt-probeset-genotype confidences table
        #[arg(long, value_name = "FILE")]
        confidences: Option<PathBuf>,

        /// apt-probeset-genotype summary table
        #[arg(long, value_name = "FILE")]
        summary: Option<PathBuf>,

        /// SNP posterior (cluster model) table
        #[arg(long, value_name = "FILE")]
        models: Option<PathBuf>,

        /// Re-centre clusters on this cohort's calls before computing BAF/LRR
        #[arg(long)]
        adjust_clusters: bool,

        /// Only write markers listed in this file (one id per line)
        #[arg(long, value_name = "FILE")]
        markers: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output TSV file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Write the inferred sex of each sample from an apt report file
    Sex {
        /// apt-probeset-genotype report file
        #[arg(long, value_name = "FILE")]
        report: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info {
            files,
            rows,
            json,
            chip_summary,
            cel_summary,
        } => info::run(files, rows, json, chip_summary, cel_summary),
        Commands::Convert {
            chp,
            calls,
            confidences,
            summary,
            models,
            adjust_clusters,
            markers,
            config,
            output,
        } => convert::run(convert::ConvertArgs {
            chp,
            calls,
            confidences,
            summary,
            models,
            adjust_clusters,
            markers,
            config,
            output,
        }),
        Commands::Sex { report, output } => sex::run(report, output),
    }
}

/// Buffered writer to a file, or to stdout when no path is given
fn open_output(path: Option<&std::path::Path>) -> Result<Box<dyn std::io::Write>> {
    use anyhow::Context;
    use std::io::BufWriter;

    Ok(match path {
        Some(path) => Box::new(BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}
