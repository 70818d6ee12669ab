use anyhow::{Context, Result};
use log::info;
use std::io::Write;
use std::path::PathBuf;

use affyconv::report::Report;

/// Write `<sample>\t<sex code>` lines from an apt report file
pub fn run(report: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let parsed = Report::from_path(&report)
        .with_context(|| format!("Failed to read report file {}", report.display()))?;
    info!("Report lists {} samples", parsed.len());

    let mut out = super::open_output(output.as_deref())?;
    parsed.write_sex_table(&mut out)?;
    out.flush()?;
    Ok(())
}
