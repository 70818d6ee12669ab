//! Plain and gzip-compressed text input
//!
//! apt writes its tables either plain or gzip-compressed; the two are told
//! apart by the gzip magic bytes, not by the file extension.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Open a text file, decompressing it when it starts with the gzip magic bytes
pub fn open_text<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let mut reader = BufReader::new(File::open(path)?);
    let is_gzip = reader.fill_buf()?.starts_with(&GZIP_MAGIC);
    if is_gzip {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// Read the first line that does not start with `#`
///
/// Returns `None` at end of input. The line terminator is stripped.
pub fn first_content_line<R: BufRead + ?Sized>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if !line.starts_with('#') {
            let trimmed = line.trim_end_matches(['\n', '\r']).len();
            line.truncate(trimmed);
            return Ok(Some(line));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Read, Write};

    #[test]
    fn test_first_content_line_skips_comments() {
        let mut input = "#%a=1\n#%b=2\nprobeset_id\tS1\r\nrest\n".as_bytes();
        let line = first_content_line(&mut input).unwrap();
        assert_eq!(line.as_deref(), Some("probeset_id\tS1"));
        let mut rest = String::new();
        input.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "rest\n");
    }

    #[test]
    fn test_first_content_line_empty() {
        let mut input = "#only comments\n".as_bytes();
        assert_eq!(first_content_line(&mut input).unwrap(), None);
    }

    #[test]
    fn test_open_text_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("calls.txt");
        std::fs::write(&plain, "probeset_id\tS1\n").unwrap();

        let gz = dir.path().join("calls.txt.gz");
        let mut encoder = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"probeset_id\tS1\n").unwrap();
        encoder.finish().unwrap();

        for path in [plain, gz] {
            let mut text = String::new();
            open_text(&path).unwrap().read_to_string(&mut text).unwrap();
            assert_eq!(text, "probeset_id\tS1\n");
        }
    }
}
