//! Reader for the Calvin (Command Console / AGCC) generic container
//!
//! A Calvin file is a self-describing tree:
//!
//! ```text
//! magic (59) | version (1) | group count | first group offset
//! generic data header ─┬─ parameters
//!                      └─ parent headers (same grammar, any depth)
//! data group ──► data group ──► ...        (linked by absolute offsets)
//!   └─ data set ──► data set ──► ...       (linked by absolute offsets)
//!        └─ parameters, column layout, row count, rows
//! ```
//!
//! Parsing walks the header tree and the group/data set chains, seeking to
//! every recorded offset and checking that the stream ends exactly after the
//! last group. Row payloads stay on disk and are read on demand with
//! [`CalvinFile::read_row`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use affyconv::formats::calvin::{CalvinFile, ParseOptions};
//!
//! let mut chp = CalvinFile::open("sample.AxiomGT1.chp", ParseOptions::default())?;
//! println!("{} ({})", chp.display_name(), chp.header().data_type_id);
//! let mut row = Vec::new();
//! chp.read_row(0, 0, 0, &mut row)?;
//! # Ok::<(), affyconv::formats::FormatError>(())
//! ```

mod data;
mod header;


pub use data::{ColumnDescriptor, ColumnType, DataGroup, DataSet};
pub use header::{DataHeader, Parameter, ParameterType, ParameterValue, BULK_PARAMETER_PREFIX};

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};
use log::debug;

use super::binary::{at_eof, capacity_hint, seek_to, stream_len};
use super::dat::DatHeader;
use super::FormatError;

/// Leading byte of a Calvin container
pub const CALVIN_MAGIC: u8 = 59;

/// Supported Calvin container version
pub const CALVIN_VERSION: u8 = 1;

/// Data type of AGCC CEL files
pub const INTENSITY_DATA_TYPE: &str = "affymetrix-calvin-intensity";

/// Data type of the scan acquisition parent header of AGCC CEL files
pub const SCAN_ACQUISITION_DATA_TYPE: &str = "affymetrix-calvin-scan-acquisition";

/// Parameter holding the scanner DAT header in the scan acquisition header
pub const PARTIAL_DAT_HEADER: &str = "affymetrix-partial-dat-header";

/// Analysis suffixes stripped from display names after `.chp`
const ANALYSIS_SUFFIXES: [&str; 3] = ["AxiomGT1", "birdseed-v2", "brlmm-p"];

/// Options controlling how much of a container is retained
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Drop the value of the bulk apt option parameter
    /// ([`BULK_PARAMETER_PREFIX`]). Used when many files are opened together.
    pub drop_bulk_parameters: bool,
}

/// An open Calvin container
///
/// The container owns its reader; data sets only describe row layout.
pub struct CalvinFile<R> {
    reader: R,
    version: u8,
    header: DataHeader,
    groups: Vec<DataGroup>,
    first_group_offset: u64,
    size: u64,
    display_name: String,
    position: u64,
}

impl CalvinFile<BufReader<File>> {
    /// Open and parse a Calvin container from disk
    pub fn open<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let mut file = Self::from_reader(reader, options)?;
        file.display_name = display_name(path);
        Ok(file)
    }
}

impl<R: Read + Seek> CalvinFile<R> {
    /// Parse a Calvin container from a seekable reader positioned at its start
    pub fn from_reader(mut reader: R, options: ParseOptions) -> Result<Self, FormatError> {
        let size = stream_len(&mut reader)?;

        let magic = reader.read_u8()?;
        if magic != CALVIN_MAGIC {
            return Err(FormatError::BadSignature {
                format: "AGCC",
                expected: CALVIN_MAGIC as i32,
                found: magic as i32,
            });
        }
        let version = reader.read_u8()?;
        if version != CALVIN_VERSION {
            return Err(FormatError::UnsupportedVersion {
                format: "AGCC",
                expected: CALVIN_VERSION as i32,
                found: version as i32,
            });
        }
        let n_groups = reader.read_i32::<BigEndian>()?;
        if n_groups < 0 {
            return Err(FormatError::negative("data group count", n_groups));
        }
        let first_group_offset = reader.read_u32::<BigEndian>()? as u64;

        let header = DataHeader::read_from(&mut reader, &options)?;

        seek_to(&mut reader, first_group_offset, size)?;
        let mut groups = Vec::with_capacity(capacity_hint(n_groups as usize));
        for _ in 0..n_groups {
            groups.push(DataGroup::read_from(&mut reader, size, &options)?);
        }

        let position = reader.stream_position()?;
        if !at_eof(&mut reader)? {
            return Err(FormatError::TrailingData(position));
        }
        debug!(
            "Parsed AGCC container: {} groups, type {}",
            groups.len(),
            header.data_type_id
        );

        Ok(Self {
            reader,
            version,
            header,
            groups,
            first_group_offset,
            size,
            display_name: String::new(),
            position: size,
        })
    }

    /// Read one row of a data set into `buffer`
    ///
    /// Sequential rows are read without seeking; any other row seeks to its
    /// absolute offset first.
    pub fn read_row(
        &mut self,
        group: usize,
        set: usize,
        row: u32,
        buffer: &mut Vec<u8>,
    ) -> Result<(), FormatError> {
        let data_set = self
            .groups
            .get(group)
            .and_then(|g| g.data_sets.get(set))
            .ok_or(FormatError::MissingDataSet { group, set })?;
        if row >= data_set.row_count {
            return Err(FormatError::RowOutOfRange {
                data_set: data_set.name.clone(),
                row,
                rows: data_set.row_count,
            });
        }
        let width = data_set.row_width;
        let offset = data_set.first_row_offset + row as u64 * width as u64;
        if self.position != offset {
            seek_to(&mut self.reader, offset, self.size)?;
        }
        buffer.resize(width, 0);
        // Keep the cached position unknown until the read succeeds.
        self.position = u64::MAX;
        self.reader.read_exact(buffer)?;
        self.position = offset + width as u64;
        Ok(())
    }
}

impl<R> CalvinFile<R> {
    /// Container version
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Root generic data header
    pub fn header(&self) -> &DataHeader {
        &self.header
    }

    /// Data groups in file order
    pub fn groups(&self) -> &[DataGroup] {
        &self.groups
    }

    /// Data set by position
    pub fn data_set(&self, group: usize, set: usize) -> Option<&DataSet> {
        self.groups.get(group)?.data_sets.get(set)
    }

    /// Offset of the first data group
    pub fn first_group_offset(&self) -> u64 {
        self.first_group_offset
    }

    /// Total container size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Sample name derived from the file name
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Scanner DAT header of an AGCC CEL file
    ///
    /// The container must hold calvin intensities and its first parent
    /// header must be the scan acquisition header.
    pub fn dat_header(&self) -> Result<DatHeader, FormatError> {
        let missing = |reason| FormatError::MissingDatHeader {
            file: self.display_name.clone(),
            reason,
        };
        if self.header.data_type_id != INTENSITY_DATA_TYPE {
            return Err(missing("does not contain calvin intensities"));
        }
        let scan = self
            .header
            .parents
            .first()
            .filter(|parent| parent.data_type_id == SCAN_ACQUISITION_DATA_TYPE)
            .ok_or_else(|| missing("is missing scan acquisition information"))?;
        let text = scan
            .find_parameter(PARTIAL_DAT_HEADER)
            .and_then(Parameter::as_text)
            .ok_or_else(|| missing("is missing DAT header"))?;
        DatHeader::parse(&text)
    }

    /// Override the display name (used for in-memory containers)
    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.display_name = name.into();
    }
}

/// Derive a sample name from a container path
///
/// Strips the directory and a trailing `.chp`; after that, a trailing
/// `.AxiomGT1`, `.birdseed-v2` or `.brlmm-p` is stripped as well.
pub fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let Some(stem) = file_name.strip_suffix(".chp") else {
        return file_name;
    };
    match stem.rsplit_once('.') {
        Some((base, suffix)) if ANALYSIS_SUFFIXES.contains(&suffix) => base.to_string(),
        _ => stem.to_string(),
    }
}
