//! # affyconv
//!
//! A command-line tool for inspecting Affymetrix genotyping files and
//! converting them to per-sample genotype, BAF and LRR tables.
//!
//! ## Usage
//!
//! ```bash
//! # Print the structure of a CHP file
//! affyconv info sample.AxiomGT1.chp
//!
//! # Convert apt-probeset-genotype output
//! affyconv convert --calls AxiomGT1.calls.txt --summary AxiomGT1.summary.txt \
//!     --models AxiomGT1.snp-posteriors.txt -o genotypes.tsv
//!
//! # Sex estimates from the report
//! affyconv sex --report AxiomGT1.report.txt
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
