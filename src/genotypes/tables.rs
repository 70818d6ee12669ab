//! Genotypes from apt text tables

use std::fmt;
use std::io::BufRead;
use std::path::Path;

use csv::StringRecord;
use log::{debug, info, warn};

use super::{Call, Fields, GenotypeError, GenotypeRecordSet, GenotypeSource};
use crate::text::{first_content_line, open_text};

const ID_COLUMN: &str = "probeset_id";
const CEL_SUFFIX: &str = ".CEL";

/// Kind of apt text table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// `*.calls.txt`: -1/0/1/2 per sample
    Calls,
    /// `*.confidences.txt`: call confidence per sample
    Confidences,
    /// `*.summary.txt`: `<id>-A` / `<id>-B` intensity line pairs
    Summary,
}

impl TableKind {
    /// Name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            TableKind::Calls => "calls",
            TableKind::Confidences => "confidences",
            TableKind::Summary => "summary",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One open table positioned after its header
struct Table {
    kind: TableKind,
    reader: csv::Reader<Box<dyn BufRead>>,
    samples: Vec<String>,
    record: StringRecord,
}

impl Table {
    fn new(kind: TableKind, mut input: Box<dyn BufRead>) -> Result<Self, GenotypeError> {
        let header = first_content_line(&mut input)?.ok_or(GenotypeError::EmptyTable(kind.name()))?;
        let mut columns = header.split('\t');
        if columns.next() != Some(ID_COLUMN) {
            return Err(GenotypeError::MalformedHeader {
                table: kind.name(),
                line: header.clone(),
            });
        }
        let samples = columns
            .map(|s| s.strip_suffix(CEL_SUFFIX).unwrap_or(s).to_string())
            .collect();

        let reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .comment(Some(b'#'))
            .from_reader(input);

        Ok(Self {
            kind,
            reader,
            samples,
            record: StringRecord::new(),
        })
    }

    /// Read the next data line; `false` at end of table
    fn advance(&mut self) -> Result<bool, GenotypeError> {
        if !self.reader.read_record(&mut self.record)? {
            return Ok(false);
        }
        let expected = self.samples.len() + 1;
        if self.record.len() != expected {
            return Err(GenotypeError::ColumnCount {
                table: self.kind.name(),
                expected,
                found: self.record.len(),
            });
        }
        Ok(true)
    }

    fn id(&self) -> &str {
        self.record.get(0).unwrap_or_default()
    }

    fn values(&self) -> impl Iterator<Item = &str> {
        self.record.iter().skip(1)
    }

    fn parse_floats(&self, marker: &str, out: &mut [f32]) -> Result<(), GenotypeError> {
        for (slot, value) in out.iter_mut().zip(self.values()) {
            *slot = value
                .trim()
                .parse()
                .map_err(|_| GenotypeError::InvalidNumber {
                    table: self.kind.name(),
                    marker: marker.to_string(),
                    value: value.to_string(),
                })?;
        }
        Ok(())
    }
}

/// Lockstep reader over the calls, confidences and summary tables
///
/// Any subset of the three tables may be supplied; every supplied table must
/// list the same samples in the same order and the same markers in the same
/// order.
pub struct TableGenotypes {
    calls: Option<Table>,
    confidences: Option<Table>,
    summary: Option<Table>,
    samples: Vec<String>,
    record: GenotypeRecordSet,
    markers: u64,
    ended: bool,
}

impl TableGenotypes {
    /// Open plain or gzip-compressed tables from disk
    pub fn open(
        calls: Option<&Path>,
        confidences: Option<&Path>,
        summary: Option<&Path>,
    ) -> Result<Self, GenotypeError> {
        let open = |path: Option<&Path>, kind: TableKind| -> Result<_, GenotypeError> {
            path.map(|p| {
                info!("Reading {} file {}", kind, p.display());
                open_text(p)
            })
            .transpose()
            .map_err(GenotypeError::from)
        };
        Self::from_readers(
            open(calls, TableKind::Calls)?,
            open(confidences, TableKind::Confidences)?,
            open(summary, TableKind::Summary)?,
        )
    }

    /// Build the stream from already opened tables
    pub fn from_readers(
        calls: Option<Box<dyn BufRead>>,
        confidences: Option<Box<dyn BufRead>>,
        summary: Option<Box<dyn BufRead>>,
    ) -> Result<Self, GenotypeError> {
        let calls = calls.map(|r| Table::new(TableKind::Calls, r)).transpose()?;
        let confidences = confidences
            .map(|r| Table::new(TableKind::Confidences, r))
            .transpose()?;
        let summary = summary
            .map(|r| Table::new(TableKind::Summary, r))
            .transpose()?;

        let (samples, reference) = match [&calls, &confidences, &summary]
            .into_iter()
            .flatten()
            .next()
        {
            Some(table) => (table.samples.clone(), table.kind.name()),
            None => return Err(GenotypeError::NoInput),
        };
        for table in [&confidences, &summary].into_iter().flatten() {
            if table.samples != samples {
                return Err(GenotypeError::SampleMismatch {
                    table: table.kind.name(),
                    reference,
                });
            }
        }

        let record = GenotypeRecordSet::new(samples.len());
        Ok(Self {
            calls,
            confidences,
            summary,
            samples,
            record,
            markers: 0,
            ended: false,
        })
    }

    fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        [&mut self.calls, &mut self.confidences, &mut self.summary]
            .into_iter()
            .flatten()
    }

    fn check_marker(&mut self, id: &str, first: bool) -> Result<(), GenotypeError> {
        if first {
            self.record.marker_id.clear();
            self.record.marker_id.push_str(id);
        } else if self.record.marker_id != id {
            return Err(GenotypeError::MarkerMismatch {
                expected: self.record.marker_id.clone(),
                found: id.to_string(),
            });
        }
        Ok(())
    }

    fn read_calls(&mut self, first: bool) -> Result<(), GenotypeError> {
        let Some(table) = self.calls.as_ref() else {
            return Ok(());
        };
        let id = table.id().to_string();
        for (slot, value) in self.record.calls.iter_mut().zip(table.values()) {
            *slot = value
                .trim()
                .parse::<i32>()
                .ok()
                .and_then(Call::from_table_code)
                .ok_or_else(|| GenotypeError::InvalidCall {
                    marker: id.clone(),
                    value: value.to_string(),
                })?;
        }
        self.check_marker(&id, first)
    }

    fn read_confidences(&mut self, first: bool) -> Result<(), GenotypeError> {
        let Some(table) = self.confidences.as_ref() else {
            return Ok(());
        };
        let id = table.id().to_string();
        table.parse_floats(&id, &mut self.record.confidences)?;
        self.check_marker(&id, first)
    }

    // The summary table holds two lines per marker; the first A line has
    // already been read by `pull`. Single-allele markers have an A line only
    // and are passed over.
    fn read_summary(&mut self, first: bool) -> Result<(), GenotypeError> {
        let Some(table) = self.summary.as_mut() else {
            return Ok(());
        };
        let mut x = vec![0f32; self.samples.len()];
        let marker = loop {
            let a_id = table.id().to_string();
            let marker = a_id
                .strip_suffix("-A")
                .ok_or_else(|| GenotypeError::SummaryPair {
                    expected: "<probeset_id>-A".to_string(),
                    found: a_id.clone(),
                })?
                .to_string();
            table.parse_floats(&marker, &mut x)?;

            if !table.advance()? {
                return Err(GenotypeError::SummaryTruncated(a_id));
            }
            if table.id().strip_suffix("-B") == Some(marker.as_str()) {
                break marker;
            }
            debug!("Skipping unpaired summary line {}", a_id);
        };
        let mut y = vec![0f32; self.samples.len()];
        table.parse_floats(&marker, &mut y)?;

        for (sample, (&x, &y)) in x.iter().zip(&y).enumerate() {
            self.record.set_signals(sample, x, y);
        }
        self.check_marker(&marker, first)
    }
}

impl GenotypeSource for TableGenotypes {
    fn pull(&mut self) -> Result<Option<&GenotypeRecordSet>, GenotypeError> {
        if self.ended {
            return Ok(None);
        }

        let mut advanced = Vec::new();
        let mut exhausted = Vec::new();
        for table in self.tables_mut() {
            if table.advance()? {
                advanced.push(table.kind.name());
            } else {
                exhausted.push(table.kind.name());
            }
        }
        if advanced.is_empty() {
            self.ended = true;
            return Ok(None);
        }
        if !exhausted.is_empty() {
            return Err(GenotypeError::Desync {
                markers: self.markers,
                detail: format!(
                    "{} file(s) ended while {} file(s) continue",
                    exhausted.join(", "),
                    advanced.join(", ")
                ),
            });
        }

        let calls_first = self.calls.is_some();
        let confidences_first = !calls_first && self.confidences.is_some();
        let summary_first = !calls_first && !confidences_first;
        self.read_calls(calls_first)?;
        self.read_confidences(confidences_first)?;
        self.read_summary(summary_first)?;

        self.markers += 1;
        Ok(Some(&self.record))
    }

    fn at_end(&self) -> bool {
        self.ended
    }

    fn samples(&self) -> &[String] {
        &self.samples
    }

    fn fields(&self) -> Fields {
        Fields {
            calls: self.calls.is_some(),
            confidences: self.confidences.is_some(),
            intensities: self.summary.is_some(),
        }
    }

    fn finish(&mut self) -> Result<(), GenotypeError> {
        for table in self.tables_mut() {
            if table.advance()? {
                warn!("End of {} file was not reached", table.kind);
            }
        }
        Ok(())
    }
}
