//! Scanner DAT header carried by CEL files
//!
//! XDA CEL files keep it on the `DatHeader=` line of their header block,
//! AGCC CEL files in the `affymetrix-partial-dat-header` parameter of the
//! scan acquisition parent header. The layout is fixed-width:
//!
//! ```text
//! [0..46101]  NA12878_A01:CLS=4733 RWS=4733 XIN=1  YIN=1  VE=30        2.0 05/26/09 14:22:02 50205660  M10   \x14  \x14 GenomeWideSNP_6.1sq \x14 ...
//! ```

use serde::Serialize;

use super::FormatError;

/// Field separator inside the trailing part of a DAT header
const SEPARATOR: &str = "\u{14} ";

/// Suffix of the chip type field
const CHIP_TYPE_SUFFIX: &str = ".1sq";

/// Scan parameters parsed from a DAT header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatHeader {
    /// DAT file name (scan name)
    pub dat_name: String,
    /// Image columns
    pub cls: String,
    /// Image rows
    pub rws: String,
    /// Pixel width
    pub xin: String,
    /// Pixel height
    pub yin: String,
    /// Scan speed
    pub ve: String,
    /// Scan temperature, often blank
    pub temperature: String,
    /// Laser power
    pub power: String,
    /// Scan date and time
    pub date: String,
    /// Scanner id
    pub scanner: String,
    /// Scanner number
    pub number: String,
    /// Chip type, without the `.1sq` suffix
    pub chip_type: String,
}

impl DatHeader {
    /// Column names, in the order of [`DatHeader::values`]
    pub const COLUMNS: [&'static str; 12] = [
        "DAT Name", "CLS", "RWS", "XIN", "YIN", "VE", "Temp", "Power", "Date", "Scanner", "Num",
        "ChipType",
    ];

    /// Parse the text following the pixel range (`[a..b]`), or a partial
    /// DAT header, both of which start with two padding characters
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        Self::parse_fields(text).ok_or_else(|| FormatError::MalformedDatHeader(text.to_string()))
    }

    fn parse_fields(text: &str) -> Option<Self> {
        let (dat_name, rest) = text.get(2..)?.split_once(':')?;
        // Offsets are relative to the `CLS=` that follows the name.
        let fixed = |start: usize, width: usize| -> Option<String> {
            rest.get(start..start + width).map(|s| s.trim_end().to_string())
        };

        let (scanner, tail) = rest.get(67..)?.split_once(' ')?;
        let (number, tail) = tail.get(1..)?.split_once(SEPARATOR)?;
        let (_, tail) = tail.split_once(SEPARATOR)?;
        let (chip_type, _) = tail.split_once(CHIP_TYPE_SUFFIX)?;

        Some(Self {
            dat_name: dat_name.to_string(),
            cls: fixed(4, 5)?,
            rws: fixed(13, 5)?,
            xin: fixed(22, 3)?,
            yin: fixed(29, 3)?,
            ve: fixed(35, 3)?,
            temperature: fixed(38, 7)?,
            power: fixed(45, 4)?,
            date: fixed(49, 18)?,
            scanner: scanner.to_string(),
            number: number.trim_end().to_string(),
            chip_type: chip_type.to_string(),
        })
    }

    /// Field values, in the order of [`DatHeader::COLUMNS`]
    pub fn values(&self) -> [&str; 12] {
        [
            &self.dat_name,
            &self.cls,
            &self.rws,
            &self.xin,
            &self.yin,
            &self.ve,
            &self.temperature,
            &self.power,
            &self.date,
            &self.scanner,
            &self.number,
            &self.chip_type,
        ]
    }
}
