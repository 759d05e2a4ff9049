//! Forward-only UTF-8 character reader

use super::SourceError;
use crate::config::compile_time::source::MAX_UNIT_SIZE;
use std::io::{BufRead, ErrorKind};

/// Decodes characters from a buffered byte source, reading every byte once.
///
/// After the first error the reader reports end of input.
pub struct CharReader<R> {
    inner: R,
    peeked: Option<char>,
    offset: u64,
    limit: u64,
    failed: bool,
}

impl<R: BufRead> CharReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_UNIT_SIZE)
    }

    /// Reader that fails once more than `limit` bytes have been read
    pub fn with_limit(inner: R, limit: u64) -> Self {
        Self {
            inner,
            peeked: None,
            offset: 0,
            limit,
            failed: false,
        }
    }

    /// Bytes consumed from the underlying source so far
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn next_char(&mut self) -> Result<Option<char>, SourceError> {
        match self.peeked.take() {
            Some(ch) => Ok(Some(ch)),
            None => self.decode(),
        }
    }

    pub fn peek_char(&mut self) -> Result<Option<char>, SourceError> {
        if self.peeked.is_none() {
            self.peeked = self.decode()?;
        }
        Ok(self.peeked)
    }

    fn decode(&mut self) -> Result<Option<char>, SourceError> {
        if self.failed {
            return Ok(None);
        }

        let result = self.decode_char();
        if result.is_err() {
            self.failed = true;
        }
        result
    }

    fn decode_char(&mut self) -> Result<Option<char>, SourceError> {
        let start = self.offset;
        let first = match self.read_byte()? {
            Some(byte) => byte,
            None => return Ok(None),
        };

        let width = utf8_width(first);
        if width == 0 {
            return Err(SourceError::InvalidEncoding { offset: start });
        }

        let mut buf = [first, 0, 0, 0];
        for slot in buf.iter_mut().take(width).skip(1) {
            *slot = self
                .read_byte()?
                .ok_or(SourceError::InvalidEncoding { offset: start })?;
        }

        std::str::from_utf8(&buf[..width])
            .ok()
            .and_then(|s| s.chars().next())
            .map(Some)
            .ok_or(SourceError::InvalidEncoding { offset: start })
    }

    fn read_byte(&mut self) -> Result<Option<u8>, SourceError> {
        loop {
            let buf = match self.inner.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(SourceError::Io {
                        message: e.to_string(),
                    })
                }
            };

            let Some(&byte) = buf.first() else {
                return Ok(None);
            };

            if self.offset >= self.limit {
                return Err(SourceError::UnitTooLarge {
                    size: self.offset + 1,
                    max_size: self.limit,
                });
            }

            self.inner.consume(1);
            self.offset += 1;
            return Ok(Some(byte));
        }
    }
}

/// Encoded length implied by a leading byte, 0 for a byte that cannot start a character
fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    fn read_all(bytes: &[u8]) -> (String, Option<SourceError>) {
        let mut reader = CharReader::new(Cursor::new(bytes.to_vec()));
        let mut text = String::new();
        loop {
            match reader.next_char() {
                Ok(Some(ch)) => text.push(ch),
                Ok(None) => return (text, None),
                Err(e) => return (text, Some(e)),
            }
        }
    }

    #[test]
    fn test_decodes_multibyte_characters() {
        let (text, error) = read_all("a€𝄞b".as_bytes());
        assert_eq!(text, "a€𝄞b");
        assert!(error.is_none());
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut reader = CharReader::new(Cursor::new(b"xy".to_vec()));
        assert_eq!(reader.peek_char().unwrap(), Some('x'));
        assert_eq!(reader.peek_char().unwrap(), Some('x'));
        assert_eq!(reader.next_char().unwrap(), Some('x'));
        assert_eq!(reader.next_char().unwrap(), Some('y'));
        assert_eq!(reader.next_char().unwrap(), None);
        assert_eq!(reader.next_char().unwrap(), None);
        assert_eq!(reader.offset(), 2);
    }

    #[test]
    fn test_invalid_utf8_reports_offset_then_ends() {
        let mut reader = CharReader::new(Cursor::new(vec![b'o', b'k', 0xFF, b'z']));
        assert_eq!(reader.next_char().unwrap(), Some('o'));
        assert_eq!(reader.next_char().unwrap(), Some('k'));
        assert_matches!(
            reader.next_char(),
            Err(SourceError::InvalidEncoding { offset: 2 })
        );
        assert_eq!(reader.next_char().unwrap(), None);
    }

    #[test]
    fn test_truncated_sequence_is_invalid() {
        let (text, error) = read_all(&[b'a', 0xE2, 0x82]);
        assert_eq!(text, "a");
        assert_matches!(error, Some(SourceError::InvalidEncoding { offset: 1 }));
    }

    #[test]
    fn test_size_limit() {
        let mut reader = CharReader::with_limit(Cursor::new(b"abcd".to_vec()), 3);
        for _ in 0..3 {
            assert!(reader.next_char().unwrap().is_some());
        }
        assert_matches!(
            reader.next_char(),
            Err(SourceError::UnitTooLarge { max_size: 3, .. })
        );
    }
}
