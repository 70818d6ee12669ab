//! Low-level decoding helpers shared by the container readers
//!
//! Calvin containers store every numeric field big-endian and every string
//! with a signed 32-bit length prefix: ASCII strings are `len` bytes, wide
//! strings are `len` UTF-16BE code units.

use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use super::FormatError;

/// Counts come from the file; cap up-front allocation and let vectors grow.
pub(crate) fn capacity_hint(count: usize) -> usize {
    count.min(4096)
}

/// Read exactly `len` bytes whose length came from the file
///
/// The buffer grows with the bytes actually present, so a corrupt length
/// prefix fails with `UnexpectedEof` instead of a huge allocation.
pub(crate) fn read_bytes<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>, FormatError> {
    let mut buffer = Vec::with_capacity(capacity_hint(len.min(usize::MAX as u64) as usize));
    reader.by_ref().take(len).read_to_end(&mut buffer)?;
    if (buffer.len() as u64) < len {
        return Err(io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, buffer.len()),
        )
        .into());
    }
    Ok(buffer)
}

/// Read a length-prefixed byte string
pub(crate) fn read_string8<R: Read>(reader: &mut R) -> Result<Vec<u8>, FormatError> {
    let len = reader.read_i32::<BigEndian>()?;
    if len < 0 {
        return Err(FormatError::negative("string length", len));
    }
    read_bytes(reader, len as u64)
}

/// Read a length-prefixed ASCII string
pub(crate) fn read_ascii<R: Read>(reader: &mut R) -> Result<String, FormatError> {
    let bytes = read_string8(reader)?;
    Ok(ascii_to_string(&bytes))
}

/// Read a length-prefixed UTF-16BE string
pub(crate) fn read_string16<R: Read>(reader: &mut R) -> Result<String, FormatError> {
    let len = reader.read_i32::<BigEndian>()?;
    if len < 0 {
        return Err(FormatError::negative("wide string length", len));
    }
    let bytes = read_bytes(reader, len as u64 * 2)?;
    Ok(utf16_be_bytes_to_string(&bytes))
}

/// Decode ASCII bytes, dropping NUL padding
pub(crate) fn ascii_to_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Decode UTF-16 code units, dropping NUL padding
pub(crate) fn utf16_to_string(units: &[u16]) -> String {
    let end = units.iter().position(|&u| u == 0).unwrap_or(units.len());
    char::decode_utf16(units[..end].iter().copied())
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Decode a byte buffer holding UTF-16BE code units
pub(crate) fn utf16_be_bytes_to_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    utf16_to_string(&units)
}

/// Returns true when no byte is left in the stream
pub(crate) fn at_eof<R: Read>(reader: &mut R) -> Result<bool, FormatError> {
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Ok(true),
            Ok(_) => return Ok(false),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Seek to an absolute offset recorded in the container
///
/// The offset must lie within the stream and the position reached must be
/// exactly the offset.
pub(crate) fn seek_to<R: Seek>(reader: &mut R, offset: u64, length: u64) -> Result<(), FormatError> {
    if offset > length {
        return Err(FormatError::BadOffset { offset, length });
    }
    let reached = reader.seek(SeekFrom::Start(offset))?;
    if reached != offset {
        return Err(FormatError::BadOffset { offset, length });
    }
    Ok(())
}

/// Length of the stream, leaving the position unchanged
pub(crate) fn stream_len<R: Seek>(reader: &mut R) -> Result<u64, FormatError> {
    let current = reader.stream_position()?;
    let length = reader.seek(SeekFrom::End(0))?;
    if current != length {
        reader.seek(SeekFrom::Start(current))?;
    }
    Ok(length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prefixed(len: i32, payload: &[u8]) -> Cursor<Vec<u8>> {
        let mut bytes = len.to_be_bytes().to_vec();
        bytes.extend_from_slice(payload);
        Cursor::new(bytes)
    }

    #[test]
    fn test_read_strings() {
        assert_eq!(read_ascii(&mut prefixed(3, b"abc")).unwrap(), "abc");
        assert_eq!(read_ascii(&mut prefixed(4, b"ab\0\0")).unwrap(), "ab");
        assert_eq!(
            read_string16(&mut prefixed(2, &[0, b'h', 0, b'i'])).unwrap(),
            "hi"
        );
        assert_eq!(read_string16(&mut prefixed(0, &[])).unwrap(), "");
    }

    #[test]
    fn test_huge_length_prefix_is_truncation() {
        for result in [
            read_string8(&mut prefixed(0x7fff_fff0, b"short")).map(|_| ()),
            read_string16(&mut prefixed(0x7fff_fff0, b"short")).map(|_| ()),
        ] {
            match result {
                Err(FormatError::IoError(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
                other => panic!("expected a truncation error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_negative_length_prefix() {
        assert!(matches!(
            read_string8(&mut prefixed(-1, b"")),
            Err(FormatError::NegativeLength { value: -1, .. })
        ));
    }
}
