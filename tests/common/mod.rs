//! Synthetic Calvin CHP and XDA CEL files for integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use affyconv::formats::summary::CHIP_SUMMARY_KEYS;
use affyconv::genotypes::{Representation, MULTI_DATA_TYPE};

pub const AA: u8 = 6;
pub const BB: u8 = 7;
pub const AB: u8 = 8;
pub const NC: u8 = 11;

/// Width reserved for probe set names, excluding the length prefix
const NAME_WIDTH: usize = 16;

/// One `Genotype` row
#[derive(Debug, Clone)]
pub struct MarkerRow {
    pub id: &'static str,
    pub call: u8,
    pub confidence: f32,
    /// Log Ratio or Signal A
    pub first: f32,
    /// Strength or Signal B
    pub second: f32,
}

pub fn row(id: &'static str, call: u8, confidence: f32, first: f32, second: f32) -> MarkerRow {
    MarkerRow {
        id,
        call,
        confidence,
        first,
        second,
    }
}

/// Layout of a synthetic CHP container
pub struct ChpLayout {
    pub data_type: &'static str,
    pub representation: Representation,
    pub markers: Vec<MarkerRow>,
    pub chip_summary: bool,
}

impl ChpLayout {
    pub fn new(representation: Representation, markers: Vec<MarkerRow>) -> Self {
        Self {
            data_type: MULTI_DATA_TYPE,
            representation,
            markers,
            chip_summary: false,
        }
    }
}

fn put_i32(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn patch_u32(buf: &mut [u8], at: usize, v: u32) {
    buf[at..at + 4].copy_from_slice(&v.to_be_bytes());
}

fn put_ascii(buf: &mut Vec<u8>, s: &str) {
    put_i32(buf, s.len() as i32);
    buf.extend_from_slice(s.as_bytes());
}

fn put_wide(buf: &mut Vec<u8>, s: &str) {
    let units: Vec<u16> = s.encode_utf16().collect();
    put_i32(buf, units.len() as i32);
    for u in units {
        buf.extend_from_slice(&u.to_be_bytes());
    }
}

fn put_parameter(buf: &mut Vec<u8>, name: &str, value: &[u8], mime: &str) {
    put_wide(buf, name);
    put_i32(buf, value.len() as i32);
    buf.extend_from_slice(value);
    put_wide(buf, mime);
}

fn wide_bytes(s: &str) -> Vec<u8> {
    s.encode_utf16().flat_map(|u| u.to_be_bytes()).collect()
}

/// Value of a chip summary parameter in synthetic files
pub fn chip_summary_value(index: usize) -> f32 {
    index as f32 + 0.25
}

/// Serialize a CHP container
pub fn chp_bytes(layout: &ChpLayout) -> Vec<u8> {
    let mut buf = vec![59u8, 1];
    put_i32(&mut buf, 1);
    put_u32(&mut buf, 0);

    put_ascii(&mut buf, layout.data_type);
    put_ascii(&mut buf, "0000-guid");
    put_wide(&mut buf, "2021-06-01T12:00:00Z");
    put_wide(&mut buf, "en-US");
    let summary_count = if layout.chip_summary {
        CHIP_SUMMARY_KEYS.len()
    } else {
        0
    };
    put_i32(&mut buf, 1 + summary_count as i32);
    put_parameter(&mut buf, "program-name", &wide_bytes("apt-genotype-axiom"), "text/plain");
    if layout.chip_summary {
        for (i, key) in CHIP_SUMMARY_KEYS.iter().enumerate() {
            let name = format!("affymetrix-chipsummary-{}", key);
            if *key == "computed_gender" {
                put_parameter(&mut buf, &name, b"female\0\0", "text/ascii");
            } else {
                let value = chip_summary_value(i).to_bits().to_be_bytes();
                put_parameter(&mut buf, &name, &value, "text/x-calvin-float");
            }
        }
    }
    put_i32(&mut buf, 0);

    let first_group = buf.len() as u32;
    patch_u32(&mut buf, 6, first_group);

    let group_start = buf.len();
    put_u32(&mut buf, 0);
    put_u32(&mut buf, 0);
    put_i32(&mut buf, 1);
    put_wide(&mut buf, "MultiData");
    let first_set = buf.len() as u32;
    patch_u32(&mut buf, group_start + 4, first_set);

    let set_start = buf.len();
    put_u32(&mut buf, 0);
    put_u32(&mut buf, 0);
    put_wide(&mut buf, "Genotype");
    put_i32(&mut buf, 0);

    let (first, second) = match layout.representation {
        Representation::ContrastSize => ("Log Ratio", "Strength"),
        Representation::SignalPair => ("Signal A", "Signal B"),
    };
    let columns: [(&str, i8, i32); 6] = [
        ("ProbeSetName", 7, 4 + NAME_WIDTH as i32),
        ("Call", 1, 1),
        ("Confidence", 6, 4),
        (first, 6, 4),
        (second, 6, 4),
        ("Forced Call", 1, 1),
    ];
    put_u32(&mut buf, columns.len() as u32);
    for (name, code, width) in columns {
        put_wide(&mut buf, name);
        buf.push(code as u8);
        put_i32(&mut buf, width);
    }
    put_u32(&mut buf, layout.markers.len() as u32);
    let first_row = buf.len() as u32;
    patch_u32(&mut buf, set_start, first_row);

    for marker in &layout.markers {
        put_u32(&mut buf, marker.id.len() as u32);
        let mut name = marker.id.as_bytes().to_vec();
        name.resize(NAME_WIDTH, 0);
        buf.extend_from_slice(&name);
        buf.push(marker.call);
        buf.extend_from_slice(&marker.confidence.to_be_bytes());
        buf.extend_from_slice(&marker.first.to_be_bytes());
        buf.extend_from_slice(&marker.second.to_be_bytes());
        buf.push(marker.call);
    }
    let end = buf.len() as u32;
    patch_u32(&mut buf, set_start + 4, end);
    buf
}

/// Write a CHP container into `dir`
pub fn write_chp(dir: &Path, file_name: &str, layout: &ChpLayout) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, chp_bytes(layout)).unwrap();
    path
}

/// Partial DAT header of a GenomeWideSNP_6 scan
pub fn dat_header(scan: &str) -> String {
    format!(
        "  {}:CLS=4733 RWS=4733 XIN=1  YIN=1  VE=30        2.0 05/26/09 14:22:02 50205660  M10   \u{14}  \u{14} GenomeWideSNP_6.1sq \u{14}  \u{14}  \u{14} 3",
        scan
    )
}

/// Serialize an AGCC CEL header without data groups
pub fn agcc_cel_bytes(scan: &str) -> Vec<u8> {
    let mut buf = vec![59u8, 1];
    put_i32(&mut buf, 0);
    put_u32(&mut buf, 0);
    put_ascii(&mut buf, "affymetrix-calvin-intensity");
    put_ascii(&mut buf, "0001-guid");
    put_wide(&mut buf, "2009-05-26T14:30:00Z");
    put_wide(&mut buf, "en-US");
    put_i32(&mut buf, 0);
    put_i32(&mut buf, 1);

    put_ascii(&mut buf, "affymetrix-calvin-scan-acquisition");
    put_ascii(&mut buf, "0002-guid");
    put_wide(&mut buf, "");
    put_wide(&mut buf, "en-US");
    put_i32(&mut buf, 1);
    put_parameter(
        &mut buf,
        "affymetrix-partial-dat-header",
        &wide_bytes(&dat_header(scan)),
        "text/plain",
    );
    put_i32(&mut buf, 0);

    let end = buf.len() as u32;
    patch_u32(&mut buf, 6, end);
    buf
}

fn put_le(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

/// Serialize a 2×2 XDA CEL file with one masked and one outlier cell
pub fn xda_bytes() -> Vec<u8> {
    let mut buf = Vec::new();
    put_le(&mut buf, 64);
    put_le(&mut buf, 4);
    put_le(&mut buf, 2);
    put_le(&mut buf, 2);
    put_le(&mut buf, 4);
    let header = format!("Cols=2\nRows=2\nDatHeader=[0..46101]{}\n", dat_header("NA12878_A01"));
    for block in [header.as_str(), "Percentile", "Percentile:75"] {
        put_le(&mut buf, block.len() as i32);
        buf.extend_from_slice(block.as_bytes());
    }
    put_le(&mut buf, 2);
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf.extend_from_slice(&1u32.to_le_bytes());
    put_le(&mut buf, 0);
    for i in 0..4 {
        buf.extend_from_slice(&(100.0f32 * (i + 1) as f32).to_le_bytes());
        buf.extend_from_slice(&0.5f32.to_le_bytes());
        buf.extend_from_slice(&16i16.to_le_bytes());
    }
    for (x, y) in [(0i16, 1i16), (1, 0)] {
        buf.extend_from_slice(&x.to_le_bytes());
        buf.extend_from_slice(&y.to_le_bytes());
    }
    buf
}
