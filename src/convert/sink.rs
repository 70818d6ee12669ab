//! Record sinks

use std::collections::HashSet;
use std::io::Write;

use super::{ConvertError, MarkerOutput};

/// What a sink did with a marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    /// The marker was written
    Written,
    /// The marker has no known position and was dropped
    Unlocalized,
}

/// Destination of converted markers
pub trait RecordSink {
    /// Called once with the sample names before the first marker
    fn begin(&mut self, _samples: &[String]) -> Result<(), ConvertError> {
        Ok(())
    }

    /// Handle one marker
    fn emit(&mut self, marker: &MarkerOutput<'_>) -> Result<Emit, ConvertError>;

    /// Called once after the last marker
    fn finish(&mut self) -> Result<(), ConvertError> {
        Ok(())
    }
}

const TSV_HEADER: [&str; 10] = [
    "marker", "sample", "call", "confidence", "x", "y", "contrast", "size", "baf", "lrr",
];

const MISSING: &str = ".";

/// Long-format TSV sink: one line per marker and sample
///
/// Missing or undefined values are written as `.`.
pub struct TsvSink<W: Write> {
    writer: csv::Writer<W>,
    samples: Vec<String>,
    localized: Option<HashSet<String>>,
}

impl<W: Write> TsvSink<W> {
    /// Sink writing every marker
    pub fn new(writer: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .delimiter(b'\t')
                .quote_style(csv::QuoteStyle::Never)
                .from_writer(writer),
            samples: Vec::new(),
            localized: None,
        }
    }

    /// Only write markers in `markers`; the others are reported unlocalized
    pub fn with_localized_markers(mut self, markers: HashSet<String>) -> Self {
        self.localized = Some(markers);
        self
    }

    /// Flush and return the underlying writer
    pub fn into_inner(self) -> Result<W, ConvertError> {
        self.writer
            .into_inner()
            .map_err(|e| ConvertError::IoError(e.into_error()))
    }
}

fn value(present: bool, v: f32) -> String {
    if present && !v.is_nan() {
        v.to_string()
    } else {
        MISSING.to_string()
    }
}

impl<W: Write> RecordSink for TsvSink<W> {
    fn begin(&mut self, samples: &[String]) -> Result<(), ConvertError> {
        self.samples = samples.to_vec();
        self.writer.write_record(TSV_HEADER)?;
        Ok(())
    }

    fn emit(&mut self, marker: &MarkerOutput<'_>) -> Result<Emit, ConvertError> {
        let record = marker.record;
        if let Some(localized) = &self.localized {
            if !localized.contains(&record.marker_id) {
                return Ok(Emit::Unlocalized);
            }
        }

        let fields = marker.fields;
        for (i, sample) in self.samples.iter().enumerate() {
            let call = if fields.calls {
                record.calls[i].to_string()
            } else {
                MISSING.to_string()
            };
            let baf = marker.baf.map_or(f32::NAN, |b| b[i]);
            let lrr = marker.lrr.map_or(f32::NAN, |l| l[i]);
            self.writer.write_record([
                record.marker_id.as_str(),
                sample.as_str(),
                call.as_str(),
                &value(fields.confidences, record.confidences[i]),
                &value(fields.intensities, record.norm_x[i]),
                &value(fields.intensities, record.norm_y[i]),
                &value(fields.intensities, record.contrast[i]),
                &value(fields.intensities, record.size[i]),
                &value(true, baf),
                &value(true, lrr),
            ])?;
        }
        Ok(Emit::Written)
    }

    fn finish(&mut self) -> Result<(), ConvertError> {
        self.writer.flush()?;
        Ok(())
    }
}
