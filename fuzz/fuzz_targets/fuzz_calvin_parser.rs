#![no_main]

use affyconv::formats::calvin::{CalvinFile, ParseOptions};
use affyconv::formats::XdaCelFile;
use affyconv::formats::xda::LoadMode;
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

fuzz_target!(|data: &[u8]| {
    // Parsing must fail gracefully, never panic
    if let Ok(mut file) = CalvinFile::from_reader(Cursor::new(data), ParseOptions::default()) {
        let _ = file.dat_header();
        // Read every row of every data set to exercise the offset arithmetic
        let mut row = Vec::new();
        let layout: Vec<(usize, usize, u32)> = file
            .groups()
            .iter()
            .enumerate()
            .flat_map(|(g, group)| {
                group
                    .data_sets
                    .iter()
                    .enumerate()
                    .map(move |(s, set)| (g, s, set.row_count.min(1000)))
            })
            .collect();
        for (g, s, rows) in layout {
            for r in 0..rows {
                if file.read_row(g, s, r, &mut row).is_err() {
                    break;
                }
            }
        }
    }

    if let Ok(cel) = XdaCelFile::from_reader(&mut Cursor::new(data), LoadMode::MetadataOnly) {
        let _ = cel.dat_header();
    }
});
