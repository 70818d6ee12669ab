//! Data groups, data sets and their column layout

use std::io::{Read, Seek};

use byteorder::{BigEndian, ReadBytesExt};
use serde::Serialize;

use super::header::{wide_len, Parameter};
use super::ParseOptions;
use crate::formats::binary::{capacity_hint, read_string16, seek_to};
use crate::formats::FormatError;

/// Column value type codes used in data set column descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnType {
    /// Signed byte (code 0)
    Int8,
    /// Unsigned byte (code 1)
    UInt8,
    /// Signed short (code 2)
    Int16,
    /// Unsigned short (code 3)
    UInt16,
    /// Signed int (code 4)
    Int32,
    /// Unsigned int (code 5)
    UInt32,
    /// Float (code 6)
    Float,
    /// Length-prefixed ASCII string (code 7)
    Ascii,
    /// Length-prefixed UTF-16 string (code 8)
    Text,
    /// Code outside the documented range
    Unknown(i8),
}

impl ColumnType {
    /// Map a raw type code
    pub fn from_code(code: i8) -> Self {
        match code {
            0 => ColumnType::Int8,
            1 => ColumnType::UInt8,
            2 => ColumnType::Int16,
            3 => ColumnType::UInt16,
            4 => ColumnType::Int32,
            5 => ColumnType::UInt32,
            6 => ColumnType::Float,
            7 => ColumnType::Ascii,
            8 => ColumnType::Text,
            other => ColumnType::Unknown(other),
        }
    }
}

/// Name, type and byte width of one data set column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnDescriptor {
    /// Column name, e.g. `ProbeSetName`
    pub name: String,
    /// Raw type code
    pub type_code: i8,
    /// Width of the column in every row
    pub width: usize,
}

impl ColumnDescriptor {
    /// Decoded column type
    pub fn column_type(&self) -> ColumnType {
        ColumnType::from_code(self.type_code)
    }

    fn read_from<R: Read>(reader: &mut R) -> Result<Self, FormatError> {
        let name = read_string16(reader)?;
        let type_code = reader.read_i8()?;
        let width = reader.read_i32::<BigEndian>()?;
        if width < 0 {
            return Err(FormatError::negative("column width", width));
        }
        Ok(Self {
            name,
            type_code,
            width: width as usize,
        })
    }

    fn encoded_len(&self) -> u64 {
        wide_len(&self.name) + 1 + 4
    }
}

/// Data set metadata and row layout
///
/// Rows are not loaded; they are read on demand through the owning
/// [`CalvinFile`](super::CalvinFile) at `first_row_offset + row * row_width`.
#[derive(Debug, Clone, Serialize)]
pub struct DataSet {
    /// Absolute offset of the first row
    pub first_row_offset: u64,
    /// Absolute offset of the next data set (0 when none is recorded)
    pub next_offset: u64,
    /// Data set name, e.g. `Genotype`
    pub name: String,
    /// Data set parameters
    pub parameters: Vec<Parameter>,
    /// Column layout
    pub columns: Vec<ColumnDescriptor>,
    /// Number of rows
    pub row_count: u32,
    /// Byte offset of each column within a row
    #[serde(skip)]
    pub column_offsets: Vec<usize>,
    /// Sum of the column widths
    pub row_width: usize,
}

impl DataSet {
    /// Parse data set metadata at the current position, then move to the
    /// recorded next-data-set offset
    pub(crate) fn read_from<R: Read + Seek>(
        reader: &mut R,
        length: u64,
        options: &ParseOptions,
    ) -> Result<Self, FormatError> {
        let first_row_offset = reader.read_u32::<BigEndian>()? as u64;
        let next_offset = reader.read_u32::<BigEndian>()? as u64;
        let name = read_string16(reader)?;

        let n_parameters = reader.read_i32::<BigEndian>()?;
        if n_parameters < 0 {
            return Err(FormatError::negative("parameter count", n_parameters));
        }
        let mut parameters = Vec::with_capacity(capacity_hint(n_parameters as usize));
        for _ in 0..n_parameters {
            parameters.push(Parameter::read_from(reader, options)?);
        }

        let n_columns = reader.read_u32::<BigEndian>()?;
        let mut columns = Vec::with_capacity(capacity_hint(n_columns as usize));
        for _ in 0..n_columns {
            columns.push(ColumnDescriptor::read_from(reader)?);
        }
        let row_count = reader.read_u32::<BigEndian>()?;

        let mut column_offsets = Vec::with_capacity(columns.len());
        let mut row_width = 0usize;
        for column in &columns {
            column_offsets.push(row_width);
            row_width = row_width.checked_add(column.width).ok_or_else(|| {
                FormatError::InvalidValue(format!("row width overflow in data set {}", name))
            })?;
        }

        let data_set = Self {
            first_row_offset,
            next_offset,
            name,
            parameters,
            columns,
            row_count,
            column_offsets,
            row_width,
        };
        data_set.check_row_region(length)?;

        // The next set's metadata sits after this set's rows.
        if next_offset != 0 {
            seek_to(reader, next_offset, length)?;
        }
        Ok(data_set)
    }

    fn check_row_region(&self, length: u64) -> Result<(), FormatError> {
        let declared = (self.row_count as u64).saturating_mul(self.row_width as u64);
        let mismatch = |region: u64| FormatError::RowWidthMismatch {
            data_set: self.name.clone(),
            rows: self.row_count,
            row_width: self.row_width,
            region,
        };
        if self.next_offset != 0 {
            let region = self
                .next_offset
                .checked_sub(self.first_row_offset)
                .ok_or_else(|| mismatch(0))?;
            if region != declared {
                return Err(mismatch(region));
            }
        } else if self.first_row_offset.saturating_add(declared) > length {
            return Err(mismatch(length.saturating_sub(self.first_row_offset)));
        }
        Ok(())
    }

    /// Find a column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Find a data set parameter by name
    pub fn find_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Bytes of metadata preceding the rows
    pub fn encoded_len(&self) -> u64 {
        let parameters: u64 = self.parameters.iter().map(Parameter::encoded_len).sum();
        let columns: u64 = self.columns.iter().map(ColumnDescriptor::encoded_len).sum();
        4 + 4 + wide_len(&self.name) + 4 + parameters + 4 + columns + 4
    }

    /// Byte slice of one column inside a row buffer
    pub fn column_bytes<'a>(&self, row: &'a [u8], column: usize) -> Option<&'a [u8]> {
        let start = *self.column_offsets.get(column)?;
        let width = self.columns.get(column)?.width;
        row.get(start..start + width)
    }
}

/// A named group of data sets
#[derive(Debug, Clone, Serialize)]
pub struct DataGroup {
    /// Absolute offset of the next group (0 when none is recorded)
    pub next_offset: u64,
    /// Absolute offset of the first data set
    pub first_set_offset: u64,
    /// Group name, e.g. `MultiData`
    pub name: String,
    /// Data sets in file order
    pub data_sets: Vec<DataSet>,
}

impl DataGroup {
    pub(crate) fn read_from<R: Read + Seek>(
        reader: &mut R,
        length: u64,
        options: &ParseOptions,
    ) -> Result<Self, FormatError> {
        let next_offset = reader.read_u32::<BigEndian>()? as u64;
        let first_set_offset = reader.read_u32::<BigEndian>()? as u64;
        let n_sets = reader.read_i32::<BigEndian>()?;
        if n_sets < 0 {
            return Err(FormatError::negative("data set count", n_sets));
        }
        let name = read_string16(reader)?;

        seek_to(reader, first_set_offset, length)?;
        let mut data_sets = Vec::with_capacity(capacity_hint(n_sets as usize));
        for _ in 0..n_sets {
            data_sets.push(DataSet::read_from(reader, length, options)?);
        }

        if next_offset != 0 {
            seek_to(reader, next_offset, length)?;
        }
        Ok(Self {
            next_offset,
            first_set_offset,
            name,
            data_sets,
        })
    }

    /// Find a data set by name
    pub fn data_set(&self, name: &str) -> Option<&DataSet> {
        self.data_sets.iter().find(|s| s.name == name)
    }

    /// Bytes of group metadata preceding the first data set
    pub fn encoded_len(&self) -> u64 {
        4 + 4 + 4 + wide_len(&self.name)
    }
}
