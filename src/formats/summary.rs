//! Text renditions of container contents for inspection

use std::io::{Read, Seek, Write};

use byteorder::{BigEndian, ByteOrder};

use super::calvin::{CalvinFile, DataHeader, DataSet, Parameter, ParameterValue};
use super::dat::DatHeader;
use super::xda::XdaCelFile;
use super::{ArrayFile, FormatError};
use crate::genotypes::Call;

/// Chip summary parameters reported by [`write_chip_summary_tsv`]
pub const CHIP_SUMMARY_KEYS: [&str; 20] = [
    "computed_gender",
    "call_rate",
    "total_call_rate",
    "het_rate",
    "total_het_rate",
    "hom_rate",
    "total_hom_rate",
    "cluster_distance_mean",
    "cluster_distance_stdev",
    "allele_summarization_mean",
    "allele_summarization_stdev",
    "allele_deviation_mean",
    "allele_deviation_stdev",
    "allele_mad_residuals_mean",
    "allele_mad_residuals_stdev",
    "cn-probe-chrXY-ratio_gender_meanX",
    "cn-probe-chrXY-ratio_gender_meanY",
    "cn-probe-chrXY-ratio_gender_ratio",
    "cn-probe-chrXY-ratio_gender",
    "pm_mean",
];

const CHIP_SUMMARY_PREFIX: &str = "affymetrix-chipsummary-";

/// Columns that can be decoded when printing Genotype rows
#[derive(Clone, Copy)]
enum ColumnPrinter {
    ProbeSetName,
    Call,
    Float,
}

impl ColumnPrinter {
    fn for_column(name: &str) -> Option<Self> {
        match name {
            "ProbeSetName" => Some(ColumnPrinter::ProbeSetName),
            "Call" | "Forced Call" => Some(ColumnPrinter::Call),
            "Confidence" | "Log Ratio" | "Strength" | "Signal A" | "Signal B" => {
                Some(ColumnPrinter::Float)
            }
            _ => None,
        }
    }

    fn write<W: Write>(&self, bytes: &[u8], out: &mut W) -> Result<(), FormatError> {
        match self {
            ColumnPrinter::ProbeSetName => {
                let name = decode_probe_set_name(bytes)?;
                write!(out, "{}", name)?;
            }
            ColumnPrinter::Call => {
                let code = bytes.first().copied().unwrap_or(0);
                match Call::from_chp_code(code) {
                    Some(call) => write!(out, "{}", call)?,
                    None => write!(out, "..")?,
                }
            }
            ColumnPrinter::Float => {
                if bytes.len() < 4 {
                    return Err(FormatError::InvalidValue(format!(
                        "float column of {} bytes",
                        bytes.len()
                    )));
                }
                write!(out, "{}", BigEndian::read_f32(bytes))?;
            }
        }
        Ok(())
    }
}

/// Decode a `ProbeSetName` cell: a big-endian length followed by ASCII bytes
pub fn decode_probe_set_name(bytes: &[u8]) -> Result<&str, FormatError> {
    if bytes.len() < 4 {
        return Err(FormatError::InvalidValue(format!(
            "probe set name column of {} bytes",
            bytes.len()
        )));
    }
    let len = BigEndian::read_u32(bytes) as usize;
    let name = bytes.get(4..4 + len).ok_or_else(|| {
        FormatError::InvalidValue(format!(
            "probe set name of {} bytes exceeds column width {}",
            len,
            bytes.len() - 4
        ))
    })?;
    std::str::from_utf8(name)
        .map_err(|_| FormatError::InvalidValue("probe set name is not ASCII".to_string()))
}

fn write_parameters<W: Write>(parameters: &[Parameter], out: &mut W) -> Result<(), FormatError> {
    for parameter in parameters {
        let value = parameter.value()?;
        writeln!(out, "#%{}={}", parameter.name, value)?;
    }
    Ok(())
}

fn write_data_header<W: Write>(header: &DataHeader, out: &mut W) -> Result<(), FormatError> {
    if !header.guid.is_empty() {
        writeln!(out, "#%FileIdentifier={}", header.guid)?;
    }
    writeln!(out, "#%FileTypeIdentifier={}", header.data_type_id)?;
    writeln!(out, "#%FileLocale={}", header.locale)?;
    write_parameters(&header.parameters, out)?;
    for parent in &header.parents {
        write_data_header(parent, out)?;
    }
    Ok(())
}

fn write_data_set_header<W: Write>(data_set: &DataSet, out: &mut W) -> Result<(), FormatError> {
    writeln!(out, "#%SetName={}", data_set.name)?;
    writeln!(out, "#%Columns={}", data_set.columns.len())?;
    writeln!(out, "#%Rows={}", data_set.row_count)?;
    write_parameters(&data_set.parameters, out)?;
    let names: Vec<&str> = data_set.columns.iter().map(|c| c.name.as_str()).collect();
    writeln!(out, "{}", names.join("\t"))?;
    Ok(())
}

/// Print a Calvin container: header chain, groups, data sets and, in verbose
/// mode, the rows of `Genotype` data sets
pub fn write_calvin_summary<R: Read + Seek, W: Write>(
    file: &mut CalvinFile<R>,
    out: &mut W,
    verbose: bool,
) -> Result<(), FormatError> {
    writeln!(out, "#%File={}", file.display_name())?;
    writeln!(out, "#%FileSize={}", file.size())?;
    writeln!(out, "#%Magic={}", super::calvin::CALVIN_MAGIC)?;
    writeln!(out, "#%Version={}", file.version())?;
    write_data_header(file.header(), out)?;

    let mut row = Vec::new();
    for group in 0..file.groups().len() {
        writeln!(out, "#%GroupName={}", file.groups()[group].name)?;
        for set in 0..file.groups()[group].data_sets.len() {
            let data_set = file.groups()[group].data_sets[set].clone();
            write_data_set_header(&data_set, out)?;
            if data_set.row_count == 0 {
                continue;
            }
            if !verbose {
                writeln!(out, "... use --verbose to visualize Data Set ...")?;
                continue;
            }
            if data_set.name != "Genotype" {
                writeln!(out, "... can only visualize Genotype Data Set ...")?;
                continue;
            }

            let printers = data_set
                .columns
                .iter()
                .map(|c| {
                    ColumnPrinter::for_column(&c.name).ok_or_else(|| {
                        FormatError::InvalidValue(format!(
                            "Unknown column type {} in AGCC CHP file with type {}",
                            c.name, c.type_code
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            for r in 0..data_set.row_count {
                file.read_row(group, set, r, &mut row)?;
                for (c, printer) in printers.iter().enumerate() {
                    if c > 0 {
                        write!(out, "\t")?;
                    }
                    let bytes = data_set.column_bytes(&row, c).unwrap_or(&[]);
                    printer.write(bytes, out)?;
                }
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

/// Print an XDA CEL file in the text CEL layout; entries are listed only in
/// verbose mode
pub fn write_xda_summary<W: Write>(
    cel: &XdaCelFile,
    out: &mut W,
    verbose: bool,
) -> Result<(), FormatError> {
    writeln!(out, "[CEL]")?;
    writeln!(out, "Version=3")?;
    writeln!(out, "\n[HEADER]")?;
    write!(out, "{}", cel.header)?;
    writeln!(out, "\n[INTENSITY]")?;
    writeln!(out, "NumberCells={}", cel.cell_count)?;
    writeln!(out, "CellHeader=X\tY\tMEAN\tSTDV\tNPIXELS")?;
    if !verbose {
        writeln!(out, "... use --verbose to visualize Cell Entries ...")?;
    } else if cel.cols > 0 {
        for (i, cell) in cel.cells.iter().enumerate() {
            let i = i as i32;
            writeln!(
                out,
                "{:3}\t{:3}\t{:.1}\t{:.1}\t{:3}",
                i % cel.cols,
                i / cel.cols,
                cell.mean,
                cell.deviation,
                cell.pixels
            )?;
        }
    }

    writeln!(out, "\n[MASKS]")?;
    writeln!(out, "NumberCells={}", cel.masked_count)?;
    writeln!(out, "CellHeader=X\tY")?;
    if !verbose {
        writeln!(out, "... use --verbose to visualize Masked Entries ...")?;
    } else {
        for entry in &cel.masked {
            writeln!(out, "{}\t{}", entry.x, entry.y)?;
        }
    }

    writeln!(out, "\n[OUTLIERS]")?;
    writeln!(out, "NumberCells={}", cel.outlier_count)?;
    writeln!(out, "CellHeader=X\tY")?;
    if !verbose {
        writeln!(out, "... use --verbose to visualize Outlier Entries ...")?;
    } else {
        for entry in &cel.outliers {
            writeln!(out, "{}\t{}", entry.x, entry.y)?;
        }
    }

    writeln!(out, "\n[MODIFIED]")?;
    writeln!(out, "NumberCells=0")?;
    writeln!(out, "CellHeader=X\tY\tORIGMEAN")?;
    Ok(())
}

/// Tabulate the chip summary parameters of several CHP containers
pub fn write_chip_summary_tsv<R, W: Write>(
    files: &[CalvinFile<R>],
    out: &mut W,
) -> Result<(), FormatError> {
    write!(out, "chp_files")?;
    for key in CHIP_SUMMARY_KEYS {
        write!(out, "\t{}", key)?;
    }
    writeln!(out)?;

    for file in files {
        write!(out, "{}", file.display_name())?;
        for key in CHIP_SUMMARY_KEYS {
            let name = format!("{}{}", CHIP_SUMMARY_PREFIX, key);
            let parameter =
                file.header()
                    .find_parameter(&name)
                    .ok_or_else(|| FormatError::MissingParameter {
                        name: name.clone(),
                        file: file.display_name().to_string(),
                    })?;
            match parameter.value()? {
                ParameterValue::Float(v) => write!(out, "\t{:.5}", v)?,
                ParameterValue::Text(s) if parameter.kind == super::calvin::ParameterType::Ascii => {
                    write!(out, "\t{}", s)?
                }
                _ => {
                    return Err(FormatError::InvalidValue(format!(
                        "Unable to print parameter {} of type {:?} from {}",
                        name,
                        parameter.kind,
                        file.display_name()
                    )))
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Tabulate the scanner DAT headers of several CEL files, XDA or AGCC
pub fn write_cel_summary_tsv<R, W: Write>(
    files: &[ArrayFile<R>],
    out: &mut W,
) -> Result<(), FormatError> {
    write!(out, "cel_files")?;
    for column in DatHeader::COLUMNS {
        write!(out, "\t{}", column)?;
    }
    writeln!(out)?;

    for file in files {
        let header = file.dat_header()?;
        write!(out, "{}", file.display_name())?;
        for value in header.values() {
            write!(out, "\t{}", value)?;
        }
        writeln!(out)?;
    }
    Ok(())
}
