use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;

use affyconv::formats::calvin::ParseOptions;
use affyconv::formats::summary::{
    write_calvin_summary, write_cel_summary_tsv, write_chip_summary_tsv, write_xda_summary,
};
use affyconv::formats::{ArrayFile, CalvinFile, OpenOptions};

/// Display the contents of Calvin or XDA CEL files
pub fn run(
    files: Vec<PathBuf>,
    rows: bool,
    json: bool,
    chip_summary: bool,
    cel_summary: bool,
) -> Result<()> {
    for file in &files {
        if !file.exists() {
            anyhow::bail!("File does not exist: {}", file.display());
        }
    }

    let mut out = super::open_output(None)?;
    // Listing rows needs every file fully loaded.
    let options = OpenOptions {
        batch: files.len() > 1 && !rows,
    };

    if cel_summary {
        let cels = files
            .iter()
            .map(|path| {
                ArrayFile::open(path, OpenOptions { batch: true })
                    .with_context(|| format!("Failed to read {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        write_cel_summary_tsv(&cels, &mut out)?;
        out.flush()?;
        return Ok(());
    }

    if chip_summary {
        let parse = ParseOptions {
            drop_bulk_parameters: files.len() > 1,
        };
        let containers = files
            .iter()
            .map(|path| {
                CalvinFile::open(path, parse.clone())
                    .with_context(|| format!("Failed to read {}", path.display()))
            })
            .collect::<Result<Vec<_>>>()?;
        write_chip_summary_tsv(&containers, &mut out)?;
        out.flush()?;
        return Ok(());
    }

    for path in &files {
        let file = ArrayFile::open(path, options)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        match file {
            ArrayFile::Calvin(mut calvin) if !json => {
                write_calvin_summary(&mut calvin, &mut out, rows)?
            }
            ArrayFile::Xda(cel) if !json => write_xda_summary(&cel, &mut out, rows)?,
            ArrayFile::Calvin(calvin) => {
                let value = serde_json::json!({
                    "file": calvin.display_name(),
                    "size": calvin.size(),
                    "version": calvin.version(),
                    "header": calvin.header(),
                    "groups": calvin.groups(),
                });
                serde_json::to_writer_pretty(&mut out, &value)?;
                writeln!(out)?;
            }
            ArrayFile::Xda(cel) => {
                serde_json::to_writer_pretty(&mut out, &cel)?;
                writeln!(out)?;
            }
        }
    }
    out.flush()?;
    Ok(())
}
