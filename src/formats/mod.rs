//! Binary container readers.
//!
//! Affymetrix tools write two unrelated binary containers:
//!
//! - [`calvin`] - the self-describing Command Console (AGCC) container used for
//!   CHP genotype results and AGCC CEL files (leading byte 59)
//! - [`xda`] - the fixed-layout XDA CEL array file (leading byte 64)
//!
//! CEL files of both families carry the scanner [`DatHeader`].
//!
//! [`ArrayFile::open`] peeks at the leading byte and dispatches to the right
//! reader. XDA CHP files (leading byte 65) are recognized but rejected.

pub(crate) mod binary;
pub mod calvin;
pub mod dat;
mod error;
pub mod summary;
pub mod xda;

pub use calvin::CalvinFile;
pub use dat::DatHeader;
pub use error::FormatError;
pub use xda::XdaCelFile;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::info;

/// Leading byte of XDA CHP files, which are not supported
pub const XDA_CHP_MAGIC: u8 = 65;

/// Container family identified by the leading byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Calvin / AGCC container
    Calvin,
    /// XDA CEL array file
    XdaCel,
}

impl FileKind {
    /// Identify a container from its leading byte
    pub fn from_magic(magic: u8) -> Result<Self, FormatError> {
        match magic {
            calvin::CALVIN_MAGIC => Ok(FileKind::Calvin),
            m if m as i32 == xda::XDA_MAGIC => Ok(FileKind::XdaCel),
            XDA_CHP_MAGIC => Err(FormatError::Unsupported(
                "Currently unable to read XDA CHP format".to_string(),
            )),
            other => Err(FormatError::UnknownMagic(other)),
        }
    }

    /// Peek at the leading byte of a stream, leaving it at its start
    pub fn detect<R: Read + Seek>(reader: &mut R) -> Result<Self, FormatError> {
        let mut magic = [0u8; 1];
        reader.read_exact(&mut magic)?;
        reader.seek(SeekFrom::Start(0))?;
        Self::from_magic(magic[0])
    }
}

/// Options applied when opening containers
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    /// Set when many files are opened together: drops bulk Calvin parameters
    /// and loads only XDA metadata
    pub batch: bool,
}

/// Either kind of binary container
pub enum ArrayFile<R = BufReader<File>> {
    /// Calvin / AGCC container
    Calvin(CalvinFile<R>),
    /// XDA CEL array file
    Xda(XdaCelFile),
}

impl ArrayFile<BufReader<File>> {
    /// Open a container, choosing the reader from its leading byte
    pub fn open<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let kind = {
            let mut file = File::open(path)?;
            FileKind::detect(&mut file)?
        };
        match kind {
            FileKind::Calvin => {
                info!("Reading AGCC file {}", path.display());
                let parse = calvin::ParseOptions {
                    drop_bulk_parameters: options.batch,
                };
                Ok(ArrayFile::Calvin(CalvinFile::open(path, parse)?))
            }
            FileKind::XdaCel => {
                info!("Reading XDA CEL file {}", path.display());
                let mode = if options.batch {
                    xda::LoadMode::MetadataOnly
                } else {
                    xda::LoadMode::Full
                };
                Ok(ArrayFile::Xda(XdaCelFile::open(path, mode)?))
            }
        }
    }
}

impl<R> ArrayFile<R> {
    /// Container family
    pub fn kind(&self) -> FileKind {
        match self {
            ArrayFile::Calvin(_) => FileKind::Calvin,
            ArrayFile::Xda(_) => FileKind::XdaCel,
        }
    }

    /// Name shown in reports
    pub fn display_name(&self) -> &str {
        match self {
            ArrayFile::Calvin(file) => file.display_name(),
            ArrayFile::Xda(file) => &file.file_name,
        }
    }

    /// Scanner DAT header, for CEL files of either family
    pub fn dat_header(&self) -> Result<DatHeader, FormatError> {
        match self {
            ArrayFile::Calvin(file) => file.dat_header(),
            ArrayFile::Xda(file) => file.dat_header(),
        }
    }
}
