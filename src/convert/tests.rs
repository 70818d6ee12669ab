use super::*;
use crate::genotypes::{Call, GenotypeError, TableGenotypes};
use std::collections::HashSet;
use std::io::BufRead;

fn boxed(text: &'static str) -> Option<Box<dyn BufRead>> {
    Some(Box::new(text.as_bytes()))
}

const MODELS: &str = "\
M1;1000 100 1 0 1 10;600 600 1 0 1 10;100 1000 1 0 1 10
";

const CALLS: &str = "\
probeset_id\ts1.CEL\ts2.CEL
M1\t0\t2
M2\t1\t-1
";

const SUMMARY: &str = "\
probeset_id\ts1.CEL\ts2.CEL
M1-A\t900\t100
M1-B\t100\t1000
M2-A\t500\t400
M2-B\t500\t300
";

#[derive(Default)]
struct Recorder {
    samples: Vec<String>,
    markers: Vec<String>,
    models: Vec<Option<SnpModel>>,
    baf: Vec<Option<Vec<f32>>>,
    finished: bool,
}

impl RecordSink for Recorder {
    fn begin(&mut self, samples: &[String]) -> Result<(), ConvertError> {
        self.samples = samples.to_vec();
        Ok(())
    }

    fn emit(&mut self, marker: &MarkerOutput<'_>) -> Result<Emit, ConvertError> {
        self.markers.push(marker.record.marker_id.clone());
        self.models.push(marker.model.cloned());
        self.baf.push(marker.baf.map(|b| b.to_vec()));
        Ok(Emit::Written)
    }

    fn finish(&mut self) -> Result<(), ConvertError> {
        self.finished = true;
        Ok(())
    }
}

fn models() -> ClusterModelStore {
    ClusterModelStore::from_reader(MODELS.as_bytes()).unwrap()
}

#[test]
fn test_convert_counts_missing_models() {
    let models = models();
    let mut source = TableGenotypes::from_readers(boxed(CALLS), None, boxed(SUMMARY)).unwrap();
    let mut sink = Recorder::default();
    let stats = Converter::new(Some(&models), ConversionOptions::default())
        .run(&mut source, &mut sink)
        .unwrap();

    assert_eq!(
        stats,
        ConversionStats {
            markers: 2,
            missing_models: 1,
            skipped: 0
        }
    );
    assert!(sink.finished);
    assert_eq!(sink.samples, vec!["s1", "s2"]);
    assert_eq!(sink.markers, vec!["M1", "M2"]);
    assert!(sink.models[1].is_none());
    assert!(sink.baf[1].is_none());

    let baf = sink.baf[0].as_ref().unwrap();
    // s2 sits exactly on the BB cluster.
    assert!((baf[1] - 1.0).abs() < 1e-5);
    assert!(baf[0] < 0.1);
}

#[test]
fn test_convert_without_models() {
    let mut source = TableGenotypes::from_readers(boxed(CALLS), None, boxed(SUMMARY)).unwrap();
    let mut sink = Recorder::default();
    let stats = Converter::new(None, ConversionOptions::default())
        .run(&mut source, &mut sink)
        .unwrap();
    assert_eq!(stats.markers, 2);
    assert_eq!(stats.missing_models, 0);
    assert!(sink.baf.iter().all(Option::is_none));
}

#[test]
fn test_convert_adjusts_clusters() {
    let models = models();
    let mut source = TableGenotypes::from_readers(boxed(CALLS), None, boxed(SUMMARY)).unwrap();
    let mut sink = Recorder::default();
    let options = ConversionOptions {
        adjust_clusters: true,
        ..Default::default()
    };
    Converter::new(Some(&models), options)
        .run(&mut source, &mut sink)
        .unwrap();

    let adjusted = sink.models[0].as_ref().unwrap();
    // s1 is called AA at X = 900.
    assert!((adjusted.aa.mean_x - (0.2 * 1000.0 + 900.0) / 1.2).abs() < 1e-2);
    assert!((adjusted.aa.mean_weight - 1.2).abs() < 1e-6);
    // Nobody is called AB.
    assert!((adjusted.ab.mean_x - 600.0).abs() < 1e-2);
    // The store is untouched.
    assert_eq!(models.lookup("M1").unwrap().aa.mean_x, 1000.0);
}

#[test]
fn test_adjustment_needs_calls() {
    let models = models();
    let mut source = TableGenotypes::from_readers(None, None, boxed(SUMMARY)).unwrap();
    let mut sink = Recorder::default();
    let options = ConversionOptions {
        adjust_clusters: true,
        ..Default::default()
    };
    Converter::new(Some(&models), options)
        .run(&mut source, &mut sink)
        .unwrap();
    let model = sink.models[0].as_ref().unwrap();
    assert_eq!(model.aa.mean_x, 1000.0);
    assert!(sink.baf[0].is_some());
}

#[test]
fn test_convert_propagates_desync() {
    let confidences = "probeset_id\ts1\ts2\nM1\t0.1\t0.2\n";
    let mut source =
        TableGenotypes::from_readers(boxed(CALLS), boxed(confidences), None).unwrap();
    let mut sink = Recorder::default();
    let err = Converter::new(None, ConversionOptions::default())
        .run(&mut source, &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        ConvertError::Genotype(GenotypeError::Desync { .. })
    ));
    assert!(!sink.finished);
}

#[test]
fn test_tsv_sink_skips_unlocalized() {
    let models = models();
    let mut source = TableGenotypes::from_readers(boxed(CALLS), None, boxed(SUMMARY)).unwrap();
    let localized: HashSet<String> = ["M1".to_string()].into_iter().collect();
    let mut sink = TsvSink::new(Vec::new()).with_localized_markers(localized);
    let stats = Converter::new(Some(&models), ConversionOptions::default())
        .run(&mut source, &mut sink)
        .unwrap();
    assert_eq!(stats.skipped, 1);

    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        vec!["marker", "sample", "call", "confidence", "x", "y", "contrast", "size", "baf", "lrr"]
    );
    assert_eq!(&lines[1][..6], &["M1", "s1", "AA", ".", "900", "100"]);
    assert_eq!(&lines[2][..6], &["M1", "s2", "BB", ".", "100", "1000"]);
    assert_ne!(lines[2][8], ".");
}

#[test]
fn test_tsv_sink_without_intensities() {
    let mut source = TableGenotypes::from_readers(boxed(CALLS), None, None).unwrap();
    let mut sink = TsvSink::new(Vec::new());
    Converter::new(None, ConversionOptions::default())
        .run(&mut source, &mut sink)
        .unwrap();
    let text = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let last = text.lines().last().unwrap();
    assert_eq!(last, "M2\ts2\tNC\t.\t.\t.\t.\t.\t.\t.");
    assert!(text.contains(&format!("M2\ts1\t{}\t", Call::AB)));
}

#[test]
fn test_stats_display() {
    let stats = ConversionStats {
        markers: 10,
        missing_models: 2,
        skipped: 1,
    };
    assert_eq!(
        stats.to_string(),
        "Lines total/missing-model/skipped:\t10/2/1"
    );
}
