//! Parameters and the recursive generic data header

use std::fmt;
use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ParseOptions;
use crate::formats::binary::{
    ascii_to_string, capacity_hint, read_ascii, read_string16, read_string8, utf16_be_bytes_to_string,
};
use crate::formats::FormatError;

/// Prefix of the embedded apt option blob dropped in filtering mode
pub const BULK_PARAMETER_PREFIX: &str = "affymetrix-algorithm-param-apt-opt-cel";

/// Value type of a [`Parameter`], derived from its MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParameterType {
    /// Signed 8-bit integer
    Int8,
    /// Unsigned 8-bit integer
    UInt8,
    /// Signed 16-bit integer
    Int16,
    /// Unsigned 16-bit integer
    UInt16,
    /// Signed 32-bit integer
    Int32,
    /// Unsigned 32-bit integer
    UInt32,
    /// 32-bit float
    Float,
    /// ASCII string
    Ascii,
    /// UTF-16 string
    Text,
}

impl ParameterType {
    /// Determine the type from a Calvin MIME type (exact match)
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            "text/x-calvin-integer-8" => Some(ParameterType::Int8),
            "text/x-calvin-unsigned-integer-8" => Some(ParameterType::UInt8),
            "text/x-calvin-integer-16" => Some(ParameterType::Int16),
            "text/x-calvin-unsigned-integer-16" => Some(ParameterType::UInt16),
            "text/x-calvin-integer-32" => Some(ParameterType::Int32),
            "text/x-calvin-unsigned-integer-32" => Some(ParameterType::UInt32),
            "text/x-calvin-float" => Some(ParameterType::Float),
            "text/ascii" => Some(ParameterType::Ascii),
            "text/plain" => Some(ParameterType::Text),
            _ => None,
        }
    }

    /// MIME type string written by Command Console
    pub fn mime_type(&self) -> &'static str {
        match self {
            ParameterType::Int8 => "text/x-calvin-integer-8",
            ParameterType::UInt8 => "text/x-calvin-unsigned-integer-8",
            ParameterType::Int16 => "text/x-calvin-integer-16",
            ParameterType::UInt16 => "text/x-calvin-unsigned-integer-16",
            ParameterType::Int32 => "text/x-calvin-integer-32",
            ParameterType::UInt32 => "text/x-calvin-unsigned-integer-32",
            ParameterType::Float => "text/x-calvin-float",
            ParameterType::Ascii => "text/ascii",
            ParameterType::Text => "text/plain",
        }
    }
}

/// Decoded parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// Any of the integer types, widened
    Integer(i64),
    /// 32-bit float
    Float(f32),
    /// ASCII or UTF-16 text
    Text(String),
    /// Value dropped in filtering mode
    Discarded,
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Integer(v) => write!(f, "{}", v),
            ParameterValue::Float(v) => write!(f, "{:.6}", v),
            ParameterValue::Text(s) => write!(f, "{}", s),
            ParameterValue::Discarded => Ok(()),
        }
    }
}

/// A named, typed value attached to a header or data set
#[derive(Debug, Clone, Serialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Raw value bytes as stored in the container
    #[serde(skip)]
    pub raw: Vec<u8>,
    /// MIME type descriptor
    pub mime_type: String,
    /// Type derived from the MIME type
    pub kind: ParameterType,
    /// Length of the value as declared in the container
    pub value_len: usize,
    /// Set when the value was dropped in filtering mode
    #[serde(skip)]
    pub discarded: bool,
}

impl Parameter {
    pub(crate) fn read_from<R: Read>(
        reader: &mut R,
        options: &ParseOptions,
    ) -> Result<Self, FormatError> {
        let name = read_string16(reader)?;
        let raw = read_string8(reader)?;
        let mime_type = read_string16(reader)?;
        let kind = ParameterType::from_mime_type(&mime_type)
            .ok_or_else(|| FormatError::UnknownMimeType(mime_type.clone()))?;

        let mut parameter = Parameter {
            name,
            value_len: raw.len(),
            raw,
            mime_type,
            kind,
            discarded: false,
        };
        if options.drop_bulk_parameters && parameter.name.starts_with(BULK_PARAMETER_PREFIX) {
            parameter.raw = Vec::new();
            parameter.discarded = true;
        }
        Ok(parameter)
    }

    /// Decode the raw bytes according to the parameter type
    pub fn value(&self) -> Result<ParameterValue, FormatError> {
        if self.discarded {
            return Ok(ParameterValue::Discarded);
        }
        let value = match self.kind {
            ParameterType::Int8 => ParameterValue::Integer(self.word()? as i8 as i64),
            ParameterType::UInt8 => ParameterValue::Integer(self.word()? as u8 as i64),
            ParameterType::Int16 => ParameterValue::Integer(self.word()? as i16 as i64),
            ParameterType::UInt16 => ParameterValue::Integer(self.word()? as u16 as i64),
            ParameterType::Int32 => ParameterValue::Integer(self.word()? as i32 as i64),
            ParameterType::UInt32 => ParameterValue::Integer(self.word()? as i64),
            ParameterType::Float => ParameterValue::Float(f32::from_bits(self.word()?)),
            ParameterType::Ascii => ParameterValue::Text(ascii_to_string(&self.raw)),
            ParameterType::Text => ParameterValue::Text(utf16_be_bytes_to_string(&self.raw)),
        };
        Ok(value)
    }

    /// Value as text, for string parameters
    pub fn as_text(&self) -> Option<String> {
        match self.value() {
            Ok(ParameterValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Value as float, for float parameters
    pub fn as_float(&self) -> Option<f32> {
        match self.value() {
            Ok(ParameterValue::Float(v)) => Some(v),
            _ => None,
        }
    }

    // Numeric values occupy the leading 4 bytes, big-endian.
    fn word(&self) -> Result<u32, FormatError> {
        let mut slice = self.raw.as_slice();
        slice.read_u32::<BigEndian>().map_err(|_| {
            FormatError::InvalidValue(format!(
                "parameter {} holds {} bytes, expected at least 4",
                self.name,
                self.raw.len()
            ))
        })
    }

    /// Number of bytes this parameter occupies in the container
    pub fn encoded_len(&self) -> u64 {
        wide_len(&self.name) + 4 + self.value_len as u64 + wide_len(&self.mime_type)
    }
}

/// Generic data header, with its chain of parent headers
#[derive(Debug, Clone, Default, Serialize)]
pub struct DataHeader {
    /// Data type identifier, e.g. `affymetrix-multi-data-type-analysis`
    pub data_type_id: String,
    /// Unique file identifier
    pub guid: String,
    /// Creation timestamp as written
    pub timestamp: String,
    /// Locale
    pub locale: String,
    /// Header parameters in file order
    pub parameters: Vec<Parameter>,
    /// Parent headers (the files this one was generated from)
    pub parents: Vec<DataHeader>,
}

impl DataHeader {
    pub(crate) fn read_from<R: Read>(
        reader: &mut R,
        options: &ParseOptions,
    ) -> Result<Self, FormatError> {
        let data_type_id = read_ascii(reader)?;
        let guid = read_ascii(reader)?;
        let timestamp = read_string16(reader)?;
        let locale = read_string16(reader)?;

        let n_parameters = reader.read_i32::<BigEndian>()?;
        if n_parameters < 0 {
            return Err(FormatError::negative("parameter count", n_parameters));
        }
        let mut parameters = Vec::with_capacity(capacity_hint(n_parameters as usize));
        for _ in 0..n_parameters {
            parameters.push(Parameter::read_from(reader, options)?);
        }

        let n_parents = reader.read_i32::<BigEndian>()?;
        if n_parents < 0 {
            return Err(FormatError::negative("parent header count", n_parents));
        }
        let mut parents = Vec::with_capacity(capacity_hint(n_parents as usize));
        for _ in 0..n_parents {
            parents.push(DataHeader::read_from(reader, options)?);
        }

        Ok(Self {
            data_type_id,
            guid,
            timestamp,
            locale,
            parameters,
            parents,
        })
    }

    /// Find a parameter of this header by name
    pub fn find_parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Find the first parent header with the given data type identifier
    pub fn find_parent(&self, data_type_id: &str) -> Option<&DataHeader> {
        self.parents.iter().find(|p| p.data_type_id == data_type_id)
    }

    /// Creation timestamp, when it parses as RFC 3339
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.timestamp.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Number of bytes this header, parents included, occupies in the container
    pub fn encoded_len(&self) -> u64 {
        let strings = 4
            + self.data_type_id.len() as u64
            + 4
            + self.guid.len() as u64
            + wide_len(&self.timestamp)
            + wide_len(&self.locale);
        let parameters: u64 = self.parameters.iter().map(Parameter::encoded_len).sum();
        let parents: u64 = self.parents.iter().map(DataHeader::encoded_len).sum();
        strings + 4 + parameters + 4 + parents
    }
}

pub(crate) fn wide_len(s: &str) -> u64 {
    4 + 2 * s.encode_utf16().count() as u64
}
