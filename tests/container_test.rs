//! Container detection and text summaries

mod common;

use common::*;

use affyconv::formats::calvin::ParseOptions;
use affyconv::formats::summary::{
    write_calvin_summary, write_cel_summary_tsv, write_chip_summary_tsv, write_xda_summary,
    CHIP_SUMMARY_KEYS,
};
use affyconv::formats::{ArrayFile, CalvinFile, DatHeader, FileKind, FormatError, OpenOptions};
use affyconv::genotypes::Representation;
use std::io::Cursor;

fn genotype_layout() -> ChpLayout {
    ChpLayout::new(
        Representation::ContrastSize,
        vec![
            row("AX-100", AA, 0.5, 1.25, 10.5),
            row("AX-200", NC | 0x20, 0.25, -0.5, 9.75),
        ],
    )
}

#[test]
fn test_file_kind_from_magic() {
    assert_eq!(FileKind::from_magic(59).unwrap(), FileKind::Calvin);
    assert_eq!(FileKind::from_magic(64).unwrap(), FileKind::XdaCel);
    assert!(matches!(
        FileKind::from_magic(65),
        Err(FormatError::Unsupported(_))
    ));
    assert!(matches!(
        FileKind::from_magic(0x1f),
        Err(FormatError::UnknownMagic(0x1f))
    ));

    let mut cursor = Cursor::new(xda_bytes());
    assert_eq!(FileKind::detect(&mut cursor).unwrap(), FileKind::XdaCel);
    assert_eq!(cursor.position(), 0);
}

#[test]
fn test_array_file_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let chp = write_chp(dir.path(), "s1.AxiomGT1.chp", &genotype_layout());
    let cel = dir.path().join("s1.CEL");
    std::fs::write(&cel, xda_bytes()).unwrap();
    let unknown = dir.path().join("s1.txt");
    std::fs::write(&unknown, b"probeset_id\n").unwrap();

    let opened = ArrayFile::open(&chp, OpenOptions::default()).unwrap();
    assert_eq!(opened.kind(), FileKind::Calvin);

    match ArrayFile::open(&cel, OpenOptions::default()).unwrap() {
        ArrayFile::Xda(file) => {
            assert_eq!(file.file_name, "s1.CEL");
            assert_eq!(file.cells.len(), 4);
            assert_eq!(file.header_value("Cols"), Some("2"));
        }
        ArrayFile::Calvin(_) => panic!("expected an XDA CEL file"),
    }

    // Batch mode loads XDA metadata only.
    match ArrayFile::open(&cel, OpenOptions { batch: true }).unwrap() {
        ArrayFile::Xda(file) => assert!(file.cells.is_empty()),
        ArrayFile::Calvin(_) => panic!("expected an XDA CEL file"),
    }

    assert!(ArrayFile::open(&unknown, OpenOptions::default()).is_err());
}

#[test]
fn test_calvin_summary() {
    let bytes = chp_bytes(&genotype_layout());
    let mut file = CalvinFile::from_reader(Cursor::new(bytes), ParseOptions::default()).unwrap();
    file.set_display_name("s1");

    let mut out = Vec::new();
    write_calvin_summary(&mut file, &mut out, false).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("#%File=s1\n"));
    assert!(text.contains("#%Magic=59\n"));
    assert!(text.contains("#%FileTypeIdentifier=affymetrix-multi-data-type-analysis\n"));
    assert!(text.contains("#%program-name=apt-genotype-axiom\n"));
    assert!(text.contains("#%GroupName=MultiData\n#%SetName=Genotype\n#%Columns=6\n#%Rows=2\n"));
    assert!(text.contains("ProbeSetName\tCall\tConfidence\tLog Ratio\tStrength\tForced Call\n"));
    assert!(text.contains("... use --verbose to visualize Data Set ..."));

    let mut out = Vec::new();
    write_calvin_summary(&mut file, &mut out, true).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("AX-100\tAA\t0.5\t1.25\t10.5\tAA\n"));
    assert!(text.contains("AX-200\tNC\t0.25\t-0.5\t9.75\tNC\n"));
}

#[test]
fn test_xda_summary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s1.CEL");
    std::fs::write(&path, xda_bytes()).unwrap();
    let ArrayFile::Xda(cel) = ArrayFile::open(&path, OpenOptions::default()).unwrap() else {
        panic!("expected an XDA CEL file");
    };

    let mut out = Vec::new();
    write_xda_summary(&cel, &mut out, true).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("[CEL]\nVersion=3\n\n[HEADER]\nCols=2\nRows=2\n"));
    assert!(text.contains("NumberCells=4\n"));
    assert!(text.contains("  1\t  1\t400.0\t0.5\t 16\n"));
    assert!(text.contains("[MASKS]\nNumberCells=1\nCellHeader=X\tY\n0\t1\n"));
    assert!(text.contains("[OUTLIERS]\nNumberCells=1\nCellHeader=X\tY\n1\t0\n"));
    assert!(text.ends_with("[MODIFIED]\nNumberCells=0\nCellHeader=X\tY\tORIGMEAN\n"));
}

#[test]
fn test_chip_summary_table() {
    let mut layout = genotype_layout();
    layout.chip_summary = true;
    let mut files = Vec::new();
    for name in ["s1", "s2"] {
        let mut file =
            CalvinFile::from_reader(Cursor::new(chp_bytes(&layout)), ParseOptions::default())
                .unwrap();
        file.set_display_name(name);
        files.push(file);
    }

    let mut out = Vec::new();
    write_chip_summary_tsv(&files, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0][0], "chp_files");
    assert_eq!(&lines[0][1..], &CHIP_SUMMARY_KEYS[..]);
    assert_eq!(lines[1][0], "s1");
    assert_eq!(lines[1][1], "female");
    assert_eq!(lines[1][2], format!("{:.5}", chip_summary_value(1)));
    assert_eq!(lines[2].len(), 21);
}

#[test]
fn test_chip_summary_missing_parameter() {
    let file =
        CalvinFile::from_reader(Cursor::new(chp_bytes(&genotype_layout())), ParseOptions::default())
            .unwrap();
    let err = write_chip_summary_tsv(&[file], &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(err, FormatError::MissingParameter { .. }));
}

#[test]
fn test_cel_summary_table() {
    let dir = tempfile::tempdir().unwrap();
    let xda = dir.path().join("NA12878.CEL");
    std::fs::write(&xda, xda_bytes()).unwrap();
    let agcc = dir.path().join("NA12891.CEL");
    std::fs::write(&agcc, agcc_cel_bytes("NA12891_A02")).unwrap();

    let files: Vec<ArrayFile> = [&xda, &agcc]
        .into_iter()
        .map(|path| ArrayFile::open(path, OpenOptions { batch: true }).unwrap())
        .collect();
    assert_eq!(files[1].kind(), FileKind::Calvin);

    let mut out = Vec::new();
    write_cel_summary_tsv(&files, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], format!("cel_files\t{}", DatHeader::COLUMNS.join("\t")));
    assert_eq!(
        lines[1],
        "NA12878.CEL\tNA12878_A01\t4733\t4733\t1\t1\t30\t\t2.0\t05/26/09 14:22:02\t50205660\tM10\tGenomeWideSNP_6"
    );
    assert!(lines[2].starts_with("NA12891.CEL\tNA12891_A02\t4733\t"));
    assert!(lines[2].ends_with("\tM10\tGenomeWideSNP_6"));
}

#[test]
fn test_cel_summary_rejects_chp() {
    let mut file =
        CalvinFile::from_reader(Cursor::new(chp_bytes(&genotype_layout())), ParseOptions::default())
            .unwrap();
    file.set_display_name("s1");
    let files: Vec<ArrayFile<Cursor<Vec<u8>>>> = vec![ArrayFile::Calvin(file)];
    let err = write_cel_summary_tsv(&files, &mut Vec::<u8>::new()).unwrap_err();
    assert!(matches!(
        err,
        FormatError::MissingDatHeader { file, .. } if file == "s1"
    ));
}
