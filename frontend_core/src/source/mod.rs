//! Character sources: file-backed and in-memory translation units

mod reader;

pub use reader::CharReader;

use crate::config::compile_time::source::MAX_UNIT_SIZE;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use std::fs::{self, File};
use std::io::{BufReader, Cursor, ErrorKind};
use std::path::Path;
use std::sync::Arc;

/// Failures while opening or reading a unit
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("Source unit not found: {path}")]
    NotFound { path: String },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid source path: {path}")]
    InvalidPath { path: String },

    #[error("Source unit too large: {size} bytes (max: {max_size})")]
    UnitTooLarge { size: u64, max_size: u64 },

    #[error("Invalid UTF-8 at byte offset {offset}")]
    InvalidEncoding { offset: u64 },

    #[error("I/O error reading source: {message}")]
    Io { message: String },
}

impl SourceError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            SourceError::NotFound { .. } => codes::source::UNIT_NOT_FOUND,
            SourceError::PermissionDenied { .. } => codes::source::PERMISSION_DENIED,
            SourceError::InvalidPath { .. } => codes::source::INVALID_PATH,
            SourceError::UnitTooLarge { .. } => codes::source::UNIT_TOO_LARGE,
            SourceError::InvalidEncoding { .. } => codes::source::INVALID_ENCODING,
            SourceError::Io { .. } => codes::source::IO_ERROR,
        }
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}

/// A named character source. The name becomes the unit of every location.
#[derive(Debug)]
pub struct SourceUnit<R> {
    id: Arc<str>,
    reader: R,
    size_hint: Option<u64>,
}

impl SourceUnit<BufReader<File>> {
    /// Open a file, checking it against the compile-time size limit
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        log_debug!("Opening source unit", "path" => display);

        let metadata = fs::metadata(path).map_err(|e| {
            let error = io_error_for(&display, e.kind(), &e.to_string());
            log_error!(error.error_code(), "Cannot stat source unit", "path" => display);
            error
        })?;

        if !metadata.is_file() {
            let error = SourceError::InvalidPath {
                path: display.clone(),
            };
            log_error!(error.error_code(), "Path is not a file", "path" => display);
            return Err(error);
        }

        if metadata.len() > MAX_UNIT_SIZE {
            let error = SourceError::UnitTooLarge {
                size: metadata.len(),
                max_size: MAX_UNIT_SIZE,
            };
            log_error!(error.error_code(), "Source unit exceeds size limit",
                "path" => display,
                "size" => metadata.len(),
                "max_size" => MAX_UNIT_SIZE
            );
            return Err(error);
        }

        let file = File::open(path).map_err(|e| {
            let error = io_error_for(&display, e.kind(), &e.to_string());
            log_error!(error.error_code(), "Cannot open source unit", "path" => display);
            error
        })?;

        log_success!(codes::success::UNIT_OPENED, "Source unit opened",
            "path" => display,
            "size_bytes" => metadata.len()
        );

        Ok(Self {
            id: Arc::from(display.as_str()),
            reader: BufReader::new(file),
            size_hint: Some(metadata.len()),
        })
    }
}

impl SourceUnit<Cursor<Vec<u8>>> {
    /// In-memory unit over text
    pub fn from_text(id: impl Into<Arc<str>>, text: &str) -> Self {
        Self::from_bytes(id, text.as_bytes().to_vec())
    }

    /// In-memory unit over raw bytes, decoded lazily
    pub fn from_bytes(id: impl Into<Arc<str>>, bytes: Vec<u8>) -> Self {
        let size = bytes.len() as u64;
        Self {
            id: id.into(),
            reader: Cursor::new(bytes),
            size_hint: Some(size),
        }
    }
}

impl<R> SourceUnit<R> {
    /// Unit over an arbitrary buffered reader
    pub fn from_reader(id: impl Into<Arc<str>>, reader: R) -> Self {
        Self {
            id: id.into(),
            reader,
            size_hint: None,
        }
    }

    pub fn id(&self) -> &Arc<str> {
        &self.id
    }

    pub fn size_hint(&self) -> Option<u64> {
        self.size_hint
    }

    pub fn into_parts(self) -> (Arc<str>, R) {
        (self.id, self.reader)
    }
}

fn io_error_for(path: &str, kind: ErrorKind, message: &str) -> SourceError {
    match kind {
        ErrorKind::NotFound => SourceError::NotFound {
            path: path.to_string(),
        },
        ErrorKind::PermissionDenied => SourceError::PermissionDenied {
            path: path.to_string(),
        },
        _ => SourceError::Io {
            message: format!("{}: {}", path, message),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::{BufRead, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_file_unit() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "project(demo)").unwrap();

        let unit = SourceUnit::open(temp.path()).unwrap();
        assert_eq!(&**unit.id(), temp.path().display().to_string());
        assert_eq!(unit.size_hint(), Some(14));

        let (_, mut reader) = unit.into_parts();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "project(demo)\n");
    }

    #[test]
    fn test_open_missing_file() {
        let result = SourceUnit::open("/definitely/not/here.cmake");
        assert_matches!(result, Err(SourceError::NotFound { .. }));
    }

    #[test]
    fn test_open_directory_is_invalid_path() {
        let dir = tempfile::tempdir().unwrap();
        let result = SourceUnit::open(dir.path());
        assert_matches!(result, Err(SourceError::InvalidPath { .. }));
    }

    #[test]
    fn test_in_memory_unit() {
        let unit = SourceUnit::from_text("inline.cpp", "int x;");
        assert_eq!(&**unit.id(), "inline.cpp");
        assert_eq!(unit.size_hint(), Some(6));
    }

    #[test]
    fn test_reader_unit_has_no_size_hint() {
        let reader = std::io::BufReader::new("if(A)\nendif()\n".as_bytes());
        let unit = SourceUnit::from_reader("<stdin>", reader);
        assert_eq!(&**unit.id(), "<stdin>");
        assert_eq!(unit.size_hint(), None);

        let (id, reader) = unit.into_parts();
        assert_eq!(&*id, "<stdin>");
        assert_eq!(reader.lines().count(), 2);
    }

    #[test]
    fn test_error_codes() {
        let error = SourceError::InvalidEncoding { offset: 3 };
        assert_eq!(error.error_code(), codes::source::INVALID_ENCODING);
        assert!(!error.is_recoverable());
        assert_eq!(error.to_string(), "Invalid UTF-8 at byte offset 3");
    }
}
