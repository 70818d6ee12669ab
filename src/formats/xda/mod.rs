//! Reader for XDA (binary, version 4) CEL files
//!
//! XDA CEL files have a fixed little-endian layout: a header with grid
//! dimensions and three length-prefixed text blocks, followed by four bulk
//! arrays (cell intensities, masked cells, outlier cells, sub-grids).


use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use serde::Serialize;

use super::binary::{at_eof, read_bytes};
use super::dat::DatHeader;
use super::FormatError;

/// Signature of an XDA CEL file (also its leading byte)
pub const XDA_MAGIC: i32 = 64;

/// Supported XDA CEL version
pub const XDA_VERSION: i32 = 4;

/// How much of the file to load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadMode {
    /// Header and all bulk arrays
    #[default]
    Full,
    /// Header only; used when scanning many files
    MetadataOnly,
}

/// Intensity summary of one cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Cell {
    /// Mean pixel intensity
    pub mean: f32,
    /// Pixel intensity standard deviation
    pub deviation: f32,
    /// Number of pixels
    pub pixels: i16,
}

/// Grid coordinate of a masked or outlier cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CellCoord {
    /// Column
    pub x: i16,
    /// Row
    pub y: i16,
}

/// Sub-grid descriptor
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubGrid {
    /// Sub-grid row
    pub row: i32,
    /// Sub-grid column
    pub col: i32,
    /// Corner coordinates: upper-left, upper-right, lower-left, lower-right (x, y)
    pub corners: [f32; 8],
    /// Cell bounds: left, top, right, bottom
    pub bounds: [i32; 4],
}

/// A parsed XDA CEL file
#[derive(Debug, Clone, Serialize)]
pub struct XdaCelFile {
    /// File name without directory
    pub file_name: String,
    /// Format version
    pub version: i32,
    /// Grid rows
    pub rows: i32,
    /// Grid columns
    pub cols: i32,
    /// Number of cells (rows × cols)
    pub cell_count: i32,
    /// Free-text header block (`Key=Value` lines)
    pub header: String,
    /// Algorithm name block
    pub algorithm: String,
    /// Algorithm parameters block
    pub parameters: String,
    /// Cell margin
    pub cell_margin: i32,
    /// Number of outlier cells
    pub outlier_count: u32,
    /// Number of masked cells
    pub masked_count: u32,
    /// Number of sub-grids
    pub subgrid_count: i32,
    /// Cell intensities, row-major (empty in metadata-only mode)
    #[serde(skip)]
    pub cells: Vec<Cell>,
    /// Masked cells (empty in metadata-only mode)
    #[serde(skip)]
    pub masked: Vec<CellCoord>,
    /// Outlier cells (empty in metadata-only mode)
    #[serde(skip)]
    pub outliers: Vec<CellCoord>,
    /// Sub-grids (empty in metadata-only mode)
    #[serde(skip)]
    pub subgrids: Vec<SubGrid>,
}

impl XdaCelFile {
    /// Open and parse an XDA CEL file from disk
    pub fn open<P: AsRef<Path>>(path: P, mode: LoadMode) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let mut cel = Self::from_reader(&mut reader, mode)?;
        cel.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(cel)
    }

    /// Parse an XDA CEL file from a reader positioned at its start
    pub fn from_reader<R: Read>(reader: &mut R, mode: LoadMode) -> Result<Self, FormatError> {
        let magic = reader.read_i32::<LittleEndian>()?;
        if magic != XDA_MAGIC {
            return Err(FormatError::BadSignature {
                format: "XDA CEL",
                expected: XDA_MAGIC,
                found: magic,
            });
        }
        let version = reader.read_i32::<LittleEndian>()?;
        if version != XDA_VERSION {
            return Err(FormatError::UnsupportedVersion {
                format: "XDA CEL",
                expected: XDA_VERSION,
                found: version,
            });
        }

        let rows = reader.read_i32::<LittleEndian>()?;
        let cols = reader.read_i32::<LittleEndian>()?;
        let cell_count = reader.read_i32::<LittleEndian>()?;
        if rows < 0 || cols < 0 || cell_count as i64 != rows as i64 * cols as i64 {
            return Err(FormatError::InvalidValue(format!(
                "XDA CEL cell count {} does not match {} rows × {} cols",
                cell_count, rows, cols
            )));
        }

        let header = read_block(reader, "header length")?;
        let algorithm = read_block(reader, "algorithm length")?;
        let parameters = read_block(reader, "parameters length")?;

        let cell_margin = reader.read_i32::<LittleEndian>()?;
        let outlier_count = reader.read_u32::<LittleEndian>()?;
        let masked_count = reader.read_u32::<LittleEndian>()?;
        let subgrid_count = reader.read_i32::<LittleEndian>()?;
        if subgrid_count < 0 {
            return Err(FormatError::negative("sub-grid count", subgrid_count));
        }

        let mut cel = Self {
            file_name: String::new(),
            version,
            rows,
            cols,
            cell_count,
            header,
            algorithm,
            parameters,
            cell_margin,
            outlier_count,
            masked_count,
            subgrid_count,
            cells: Vec::new(),
            masked: Vec::new(),
            outliers: Vec::new(),
            subgrids: Vec::new(),
        };
        if mode == LoadMode::MetadataOnly {
            return Ok(cel);
        }

        cel.cells = (0..cell_count)
            .map(|_| read_cell(reader))
            .collect::<Result<_, _>>()?;
        cel.masked = (0..masked_count)
            .map(|_| read_coord(reader))
            .collect::<Result<_, _>>()?;
        cel.outliers = (0..outlier_count)
            .map(|_| read_coord(reader))
            .collect::<Result<_, _>>()?;
        cel.subgrids = (0..subgrid_count)
            .map(|_| read_subgrid(reader))
            .collect::<Result<_, _>>()?;

        if !at_eof(reader)? {
            return Err(FormatError::TrailingData(cel.encoded_len()));
        }
        Ok(cel)
    }

    /// Look up a `Key=Value` entry of the header block
    pub fn header_value(&self, key: &str) -> Option<&str> {
        self.header.lines().find_map(|line| {
            let (k, v) = line.split_once('=')?;
            (k == key).then_some(v.trim_end_matches('\r'))
        })
    }

    /// Scanner DAT header from the `DatHeader=[range]...` header line
    pub fn dat_header(&self) -> Result<DatHeader, FormatError> {
        let text = self
            .header_value("DatHeader")
            .and_then(|value| value.strip_prefix('['))
            .and_then(|value| value.split_once(']'))
            .map(|(_, text)| text)
            .ok_or_else(|| FormatError::MissingDatHeader {
                file: self.file_name.clone(),
                reason: "is missing DAT header",
            })?;
        DatHeader::parse(text)
    }

    /// Cell at grid position `(x, y)`
    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        if x < 0 || y < 0 || x >= self.cols || y >= self.rows {
            return None;
        }
        self.cells.get((y * self.cols + x) as usize)
    }

    /// Total byte length implied by the header counts
    pub fn encoded_len(&self) -> u64 {
        let fixed = 4 * 5 + 4 * 3 + 4 * 4;
        let blocks = (self.header.len() + self.algorithm.len() + self.parameters.len()) as u64;
        fixed
            + blocks
            + self.cell_count as u64 * 10
            + (self.masked_count as u64 + self.outlier_count as u64) * 4
            + self.subgrid_count as u64 * 56
    }
}

fn read_block<R: Read>(reader: &mut R, what: &'static str) -> Result<String, FormatError> {
    let len = reader.read_i32::<LittleEndian>()?;
    if len < 0 {
        return Err(FormatError::negative(what, len));
    }
    let buffer = read_bytes(reader, len as u64)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

fn read_cell<R: Read>(reader: &mut R) -> Result<Cell, FormatError> {
    Ok(Cell {
        mean: reader.read_f32::<LittleEndian>()?,
        deviation: reader.read_f32::<LittleEndian>()?,
        pixels: reader.read_i16::<LittleEndian>()?,
    })
}

fn read_coord<R: Read>(reader: &mut R) -> Result<CellCoord, FormatError> {
    Ok(CellCoord {
        x: reader.read_i16::<LittleEndian>()?,
        y: reader.read_i16::<LittleEndian>()?,
    })
}

fn read_subgrid<R: Read>(reader: &mut R) -> Result<SubGrid, FormatError> {
    let row = reader.read_i32::<LittleEndian>()?;
    let col = reader.read_i32::<LittleEndian>()?;
    let mut corners = [0f32; 8];
    reader.read_f32_into::<LittleEndian>(&mut corners)?;
    let mut bounds = [0i32; 4];
    reader.read_i32_into::<LittleEndian>(&mut bounds)?;
    Ok(SubGrid {
        row,
        col,
        corners,
        bounds,
    })
}
