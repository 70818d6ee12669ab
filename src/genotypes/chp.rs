//! Genotypes from one CHP container per sample

use std::io::{Read, Seek};

use byteorder::{BigEndian, ByteOrder};
use log::{debug, info};

use super::{Call, Fields, GenotypeError, GenotypeRecordSet, GenotypeSource, Representation};
use crate::formats::calvin::{CalvinFile, DataSet};
use crate::formats::summary::decode_probe_set_name;

/// Data type identifier of genotyping CHP containers
pub const MULTI_DATA_TYPE: &str = "affymetrix-multi-data-type-analysis";

const GROUP_NAME: &str = "MultiData";
const SET_NAME: &str = "Genotype";

const PROBE_SET_COLUMN: usize = 0;
const CALL_COLUMN: usize = 1;
const CONFIDENCE_COLUMN: usize = 2;
const FIRST_INTENSITY_COLUMN: usize = 3;
const SECOND_INTENSITY_COLUMN: usize = 4;
const FORCED_CALL_COLUMN: usize = 5;

/// Validated per-sample layout of the `Genotype` data set
struct SampleLayout {
    representation: Representation,
    offsets: [usize; 5],
    rows: u32,
}

impl SampleLayout {
    fn from_data_set(file: &str, data_set: &DataSet) -> Result<Self, GenotypeError> {
        let unexpected = |reason: String| GenotypeError::UnexpectedColumns {
            file: file.to_string(),
            reason,
        };
        if data_set.columns.len() <= FORCED_CALL_COLUMN {
            return Err(unexpected(format!(
                "{} columns, expected at least {}",
                data_set.columns.len(),
                FORCED_CALL_COLUMN + 1
            )));
        }

        let name = |i: usize| data_set.columns[i].name.as_str();
        for (index, expected) in [
            (PROBE_SET_COLUMN, "ProbeSetName"),
            (CALL_COLUMN, "Call"),
            (CONFIDENCE_COLUMN, "Confidence"),
            (FORCED_CALL_COLUMN, "Forced Call"),
        ] {
            if name(index) != expected {
                return Err(unexpected(format!(
                    "column {} is {:?}, expected {:?}",
                    index,
                    name(index),
                    expected
                )));
            }
        }

        let representation = match (name(FIRST_INTENSITY_COLUMN), name(SECOND_INTENSITY_COLUMN)) {
            ("Log Ratio", _) | (_, "Strength") => Representation::ContrastSize,
            ("Signal A", _) | (_, "Signal B") => Representation::SignalPair,
            (a, b) => {
                return Err(unexpected(format!(
                    "intensity columns {:?} and {:?} are neither Log Ratio/Strength nor Signal A/Signal B",
                    a, b
                )))
            }
        };

        let minimum_widths = [4, 1, 4, 4, 4];
        for (index, &minimum) in minimum_widths.iter().enumerate() {
            if data_set.columns[index].width < minimum {
                return Err(unexpected(format!(
                    "column {} is {} bytes wide",
                    name(index),
                    data_set.columns[index].width
                )));
            }
        }

        let mut offsets = [0usize; 5];
        offsets.copy_from_slice(&data_set.column_offsets[..5]);
        Ok(Self {
            representation,
            offsets,
            rows: data_set.row_count,
        })
    }
}

/// Lockstep reader over the `MultiData/Genotype` data sets of several CHP
/// containers
///
/// Each pull reads exactly one row from every container.
pub struct ChpGenotypes<R> {
    files: Vec<CalvinFile<R>>,
    layouts: Vec<SampleLayout>,
    samples: Vec<String>,
    record: GenotypeRecordSet,
    buffer: Vec<u8>,
    row: u32,
    ended: bool,
}

impl<R: Read + Seek> ChpGenotypes<R> {
    /// Validate the containers and position the stream before the first marker
    pub fn new(files: Vec<CalvinFile<R>>) -> Result<Self, GenotypeError> {
        if files.is_empty() {
            return Err(GenotypeError::NoInput);
        }

        let mut layouts = Vec::with_capacity(files.len());
        let mut samples = Vec::with_capacity(files.len());
        for file in &files {
            let name = file.display_name().to_string();
            if file.header().data_type_id != MULTI_DATA_TYPE {
                return Err(GenotypeError::NotMultiDataAnalysis {
                    file: name,
                    found: file.header().data_type_id.clone(),
                });
            }
            let group = file
                .groups()
                .first()
                .filter(|g| g.name == GROUP_NAME)
                .ok_or_else(|| GenotypeError::MissingGenotypeData {
                    file: name.clone(),
                    what: "multi data",
                })?;
            let data_set = group
                .data_sets
                .first()
                .filter(|s| s.name == SET_NAME)
                .ok_or_else(|| GenotypeError::MissingGenotypeData {
                    file: name.clone(),
                    what: "genotype data",
                })?;

            let layout = SampleLayout::from_data_set(&name, data_set)?;
            debug!(
                "{}: {} markers, {:?} intensities",
                name, layout.rows, layout.representation
            );
            layouts.push(layout);
            samples.push(name);
        }
        info!("Reading genotypes from {} CHP files", files.len());

        let record = GenotypeRecordSet::new(files.len());
        Ok(Self {
            files,
            layouts,
            samples,
            record,
            buffer: Vec::new(),
            row: 0,
            ended: false,
        })
    }

    /// Intensity representation of each sample
    pub fn representations(&self) -> Vec<Representation> {
        self.layouts.iter().map(|l| l.representation).collect()
    }

    /// Markers read so far
    pub fn markers_read(&self) -> u32 {
        self.row
    }

    fn read_sample(&mut self, sample: usize) -> Result<(), GenotypeError> {
        self.files[sample].read_row(0, 0, self.row, &mut self.buffer)?;
        let layout = &self.layouts[sample];
        let [name_at, call_at, confidence_at, first_at, second_at] = layout.offsets;
        let row = self.buffer.as_slice();

        let name = decode_probe_set_name(&row[name_at..call_at])?;
        if sample == 0 {
            self.record.marker_id.clear();
            self.record.marker_id.push_str(name);
        } else if self.record.marker_id != name {
            return Err(GenotypeError::MarkerMismatch {
                expected: self.record.marker_id.clone(),
                found: name.to_string(),
            });
        }

        let code = row[call_at];
        self.record.calls[sample] =
            Call::from_chp_code(code).ok_or_else(|| GenotypeError::InvalidCall {
                marker: self.record.marker_id.clone(),
                value: code.to_string(),
            })?;
        self.record.confidences[sample] = BigEndian::read_f32(&row[confidence_at..]);

        let first = BigEndian::read_f32(&row[first_at..]);
        let second = BigEndian::read_f32(&row[second_at..]);
        match layout.representation {
            Representation::ContrastSize => self.record.set_contrast_size(sample, first, second),
            Representation::SignalPair => self.record.set_signals(sample, first, second),
        }
        Ok(())
    }
}

impl<R: Read + Seek> GenotypeSource for ChpGenotypes<R> {
    fn pull(&mut self) -> Result<Option<&GenotypeRecordSet>, GenotypeError> {
        if self.ended {
            return Ok(None);
        }

        let exhausted = self.layouts.iter().filter(|l| self.row >= l.rows).count();
        if exhausted == self.layouts.len() {
            self.ended = true;
            return Ok(None);
        }
        if exhausted > 0 {
            let ended: Vec<&str> = self
                .layouts
                .iter()
                .zip(&self.samples)
                .filter(|(l, _)| self.row >= l.rows)
                .map(|(_, s)| s.as_str())
                .collect();
            return Err(GenotypeError::Desync {
                markers: self.row as u64,
                detail: format!("CHP files ended early: {}", ended.join(", ")),
            });
        }

        for sample in 0..self.files.len() {
            self.read_sample(sample)?;
        }
        self.row += 1;
        Ok(Some(&self.record))
    }

    fn at_end(&self) -> bool {
        self.ended
    }

    fn samples(&self) -> &[String] {
        &self.samples
    }

    fn fields(&self) -> Fields {
        Fields::all()
    }
}
