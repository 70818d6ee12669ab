//! Genotype iteration and conversion over synthetic CHP files

mod common;

use common::*;

use affyconv::convert::{ConversionOptions, Converter, TsvSink};
use affyconv::formats::calvin::ParseOptions;
use affyconv::formats::CalvinFile;
use affyconv::genotypes::{
    contrast_size_to_signals, Call, ChpGenotypes, GenotypeError, GenotypeIterator,
    GenotypeSource, Representation,
};
use affyconv::models::ClusterModelStore;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

fn open_all(paths: &[PathBuf]) -> Vec<CalvinFile<BufReader<File>>> {
    paths
        .iter()
        .map(|p| CalvinFile::open(p, ParseOptions::default()).unwrap())
        .collect()
}

fn contrast_markers() -> Vec<MarkerRow> {
    vec![
        row("AX-100", AA, 0.01, 1.6, 10.6),
        row("AX-200", AB, 0.02, 0.1, 10.8),
        row("AX-300", NC, 0.9, -0.2, 9.0),
    ]
}

#[test]
fn test_lockstep_over_samples() {
    let dir = tempfile::tempdir().unwrap();
    let s1 = write_chp(
        dir.path(),
        "NA12878.AxiomGT1.chp",
        &ChpLayout::new(Representation::ContrastSize, contrast_markers()),
    );
    let s2 = write_chp(
        dir.path(),
        "NA12891.AxiomGT1.chp",
        &ChpLayout::new(
            Representation::ContrastSize,
            vec![
                row("AX-100", BB, 0.03, -1.5, 10.5),
                row("AX-200", AA | 0x10, 0.04, 1.5, 10.1),
                row("AX-300", AB, 0.05, 0.0, 9.5),
            ],
        ),
    );

    let mut genotypes = ChpGenotypes::new(open_all(&[s1, s2])).unwrap();
    assert_eq!(genotypes.samples(), &["NA12878".to_string(), "NA12891".to_string()]);
    assert!(genotypes.fields().intensities);

    let record = genotypes.pull().unwrap().unwrap();
    assert_eq!(record.marker_id, "AX-100");
    assert_eq!(record.calls, vec![Call::AA, Call::BB]);
    assert_eq!(record.confidences, vec![0.01, 0.03]);
    assert_eq!(record.contrast, vec![1.6, -1.5]);
    let (x, y) = contrast_size_to_signals(1.6, 10.6);
    assert_eq!((record.norm_x[0], record.norm_y[0]), (x, y));

    let record = genotypes.pull().unwrap().unwrap();
    assert_eq!(record.marker_id, "AX-200");
    // Forced-call flags live in the high nibble.
    assert_eq!(record.calls, vec![Call::AB, Call::AA]);

    let record = genotypes.pull().unwrap().unwrap();
    assert_eq!(record.calls, vec![Call::NoCall, Call::AB]);

    assert!(genotypes.pull().unwrap().is_none());
    assert!(genotypes.at_end());
    assert_eq!(genotypes.markers_read(), 3);
    assert!(genotypes.pull().unwrap().is_none());
}

#[test]
fn test_mixed_representations() {
    let dir = tempfile::tempdir().unwrap();
    let contrast = write_chp(
        dir.path(),
        "a.chp",
        &ChpLayout::new(Representation::ContrastSize, vec![row("SNP_A-1", AA, 0.0, 2.0, 10.0)]),
    );
    let signal = write_chp(
        dir.path(),
        "b.birdseed-v2.chp",
        &ChpLayout::new(Representation::SignalPair, vec![row("SNP_A-1", BB, 0.0, 256.0, 1024.0)]),
    );

    let mut genotypes = ChpGenotypes::new(open_all(&[contrast, signal])).unwrap();
    assert_eq!(
        genotypes.representations(),
        vec![Representation::ContrastSize, Representation::SignalPair]
    );
    assert_eq!(genotypes.samples()[1], "b");

    let record = genotypes.pull().unwrap().unwrap();
    assert_eq!(record.norm_x[1], 256.0);
    assert_eq!(record.norm_y[1], 1024.0);
    assert!((record.contrast[1] + 2.0).abs() < 1e-6);
    assert!((record.size[1] - 9.0).abs() < 1e-6);
    assert_eq!(record.contrast[0], 2.0);
}

#[test]
fn test_short_file_desync() {
    let dir = tempfile::tempdir().unwrap();
    let full = write_chp(
        dir.path(),
        "full.chp",
        &ChpLayout::new(Representation::ContrastSize, contrast_markers()),
    );
    let mut markers = contrast_markers();
    markers.truncate(2);
    let short = write_chp(
        dir.path(),
        "short.chp",
        &ChpLayout::new(Representation::ContrastSize, markers),
    );

    let mut genotypes = ChpGenotypes::new(open_all(&[full, short])).unwrap();
    assert!(genotypes.pull().unwrap().is_some());
    assert!(genotypes.pull().unwrap().is_some());
    match genotypes.pull() {
        Err(GenotypeError::Desync { markers, detail }) => {
            assert_eq!(markers, 2);
            assert!(detail.contains("short"));
        }
        other => panic!("expected desync, got {:?}", other.map(|r| r.cloned())),
    }
}

#[test]
fn test_marker_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_chp(
        dir.path(),
        "a.chp",
        &ChpLayout::new(Representation::ContrastSize, vec![row("AX-1", AA, 0.0, 1.0, 10.0)]),
    );
    let b = write_chp(
        dir.path(),
        "b.chp",
        &ChpLayout::new(Representation::ContrastSize, vec![row("AX-2", AA, 0.0, 1.0, 10.0)]),
    );
    let mut genotypes = ChpGenotypes::new(open_all(&[a, b])).unwrap();
    let err = genotypes.pull().unwrap_err();
    assert!(matches!(
        err,
        GenotypeError::MarkerMismatch { ref expected, ref found } if expected == "AX-1" && found == "AX-2"
    ));
}

#[test]
fn test_invalid_call_code() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_chp(
        dir.path(),
        "a.chp",
        &ChpLayout::new(Representation::ContrastSize, vec![row("AX-1", 3, 0.0, 1.0, 10.0)]),
    );
    let mut genotypes = ChpGenotypes::new(open_all(&[path])).unwrap();
    assert!(matches!(
        genotypes.pull().unwrap_err(),
        GenotypeError::InvalidCall { .. }
    ));
}

#[test]
fn test_rejects_other_data_types() {
    let dir = tempfile::tempdir().unwrap();
    let mut layout = ChpLayout::new(Representation::ContrastSize, contrast_markers());
    layout.data_type = "affymetrix-calvin-intensity";
    let path = write_chp(dir.path(), "a.CEL", &layout);
    let err = ChpGenotypes::new(open_all(&[path])).err().unwrap();
    assert!(matches!(err, GenotypeError::NotMultiDataAnalysis { .. }));

    let err = ChpGenotypes::<BufReader<File>>::new(Vec::new()).err().unwrap();
    assert!(matches!(err, GenotypeError::NoInput));
}

const POSTERIORS: &str = "\
#%affymetrix-algorithm-name=AxiomGT1
id\tBB\tAB\tAA\tCV
AX-100\t-1.5,0.02,10,9,10.5,0.1,0.001\t0.1,0.03,20,19,10.8,0.1,0.002\t1.6,0.04,30,29,10.6,0.1,0.003\t0,0,0,0
AX-200\t-1.4,0.02,5,4,10.2,0.1,0.001\t0.0,0.03,9,9,10.4,0.1,0.002\t1.5,0.04,6,5,10.1,0.1,0.003\t0,0,0,0
";

#[test]
fn test_convert_chp_to_tsv() {
    let dir = tempfile::tempdir().unwrap();
    let chp = write_chp(
        dir.path(),
        "NA12878.AxiomGT1.chp",
        &ChpLayout::new(Representation::ContrastSize, contrast_markers()),
    );
    let models_path = dir.path().join("AxiomGT1.snp-posteriors.txt");
    std::fs::write(&models_path, POSTERIORS).unwrap();
    let models = ClusterModelStore::from_path(&models_path).unwrap();

    let mut source = GenotypeIterator::Chp(ChpGenotypes::new(open_all(&[chp])).unwrap());
    let out_path = dir.path().join("out.tsv");
    let mut sink = TsvSink::new(File::create(&out_path).unwrap());
    let stats = Converter::new(Some(&models), ConversionOptions::default())
        .run(&mut source, &mut sink)
        .unwrap();
    drop(sink);

    assert_eq!(stats.markers, 3);
    assert_eq!(stats.missing_models, 1);
    assert_eq!(stats.skipped, 0);

    let text = std::fs::read_to_string(&out_path).unwrap();
    let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(&lines[1][..4], &["AX-100", "NA12878", "AA", "0.01"]);

    // Sample on the AA cluster centre.
    let baf: f32 = lines[1][8].parse().unwrap();
    let lrr: f32 = lines[1][9].parse().unwrap();
    assert!(baf.abs() < 1e-3);
    assert!(lrr.abs() < 1e-3);

    // No model for AX-300.
    assert_eq!(lines[3][8], ".");
    assert_eq!(lines[3][2], "NC");
}
