//! apt-probeset-genotype report files
//!
//! The report lists one CEL file per line with the gender apt inferred
//! for it in the second column.

mod error;


pub use error::ReportError;

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use csv::StringRecord;
use log::info;
use serde::Serialize;

use crate::text::open_text;

/// Inferred sex of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sex {
    /// Anything but `male` or `female`
    Unknown,
    /// `male`
    Male,
    /// `female`
    Female,
}

impl Sex {
    /// Parse the `computed_gender` column
    pub fn from_gender(gender: &str) -> Self {
        match gender {
            "male" => Sex::Male,
            "female" => Sex::Female,
            _ => Sex::Unknown,
        }
    }

    /// PLINK-style code: 1 male, 2 female, 0 unknown
    pub fn code(&self) -> u8 {
        match self {
            Sex::Unknown => 0,
            Sex::Male => 1,
            Sex::Female => 2,
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// One report line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    /// CEL file name as listed
    pub cel_file: String,
    /// Inferred sex
    pub sex: Sex,
}

impl ReportEntry {
    /// CEL file name without a trailing `.CEL`
    pub fn sample_name(&self) -> &str {
        self.cel_file
            .strip_suffix(".CEL")
            .unwrap_or(&self.cel_file)
    }
}

/// Parsed report file
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    /// Samples in file order
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Read a plain or gzip-compressed report file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        info!("Reading report file {}", path.display());
        Self::from_reader(open_text(path)?)
    }

    /// Read a report from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, ReportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut record = StringRecord::new();
        if !csv_reader.read_record(&mut record)? {
            return Err(ReportError::MissingInformation(1));
        }
        match record.get(1) {
            Some("computed_gender") => {}
            Some(other) => return Err(ReportError::NotGenders(other.to_string())),
            None => return Err(ReportError::MissingInformation(record_line(&record))),
        }

        let mut entries = Vec::new();
        while csv_reader.read_record(&mut record)? {
            let (Some(cel_file), Some(gender)) = (record.get(0), record.get(1)) else {
                return Err(ReportError::MissingInformation(record_line(&record)));
            };
            entries.push(ReportEntry {
                cel_file: cel_file.to_string(),
                sex: Sex::from_gender(gender),
            });
        }
        Ok(Self { entries })
    }

    /// Write `<sample>\t<code>` per sample
    pub fn write_sex_table<W: Write>(&self, writer: &mut W) -> Result<(), ReportError> {
        for entry in &self.entries {
            writeln!(writer, "{}\t{}", entry.sample_name(), entry.sex)?;
        }
        Ok(())
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the report lists no samples
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn record_line(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}
