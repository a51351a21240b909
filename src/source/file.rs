//! File-based reading source.
//!
//! Tails a newline-delimited JSON capture file, such as one written by a
//! serial logger.

use std::collections::VecDeque;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};
use vitalwatch_types::current_timestamp_ms;

use super::ReadingSource;
use crate::wire::{decode_slice, Decoded};

/// A source that reads sensor payloads appended to a file.
///
/// Each poll picks up lines appended since the previous read. A trailing
/// line without a newline is held back until it is complete, unless it
/// already parses on its own. If the file shrinks (rotated or truncated)
/// it is re-read from the start.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    offset: u64,
    /// Bytes after the last newline, kept undecoded until the line completes.
    partial: Vec<u8>,
    pending: VecDeque<Decoded>,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            offset: 0,
            partial: Vec::new(),
            pending: VecDeque::new(),
        }
    }

    /// Returns the path being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read whatever has been appended since the last call.
    fn read_new(&mut self) {
        let mut file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                return;
            }
        };

        let len = match file.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                return;
            }
        };

        if len < self.offset {
            debug!(path = %self.path.display(), "File shrank, re-reading from start");
            self.offset = 0;
            self.partial.clear();
        }
        if len == self.offset {
            return;
        }

        let mut bytes = Vec::new();
        let read = file
            .seek(SeekFrom::Start(self.offset))
            .and_then(|_| file.read_to_end(&mut bytes));
        if let Err(e) = read {
            self.last_error = Some(format!("Read error: {}", e));
            return;
        }
        self.offset += bytes.len() as u64;
        self.last_error = None;
        self.partial.extend_from_slice(&bytes);

        let buffered = std::mem::take(&mut self.partial);
        let mut lines = buffered.split(|&b| b == b'\n').peekable();
        while let Some(line) = lines.next() {
            let is_last = lines.peek().is_none();
            if is_last {
                // Bytes after the final newline: keep them unless they are complete
                if !is_blank(line) && serde_json::from_slice::<Value>(line).is_err() {
                    self.partial = line.to_vec();
                    continue;
                }
            }
            self.ingest(line);
        }
    }

    fn ingest(&mut self, line: &[u8]) {
        if is_blank(line) {
            return;
        }
        match decode_slice(line, current_timestamp_ms()) {
            Ok(decoded) => self.pending.push_back(decoded),
            Err(e) => {
                warn!(source = %self.description, "Skipping payload: {}", e);
                self.last_error = Some(format!("Parse error: {}", e));
            }
        }
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

impl ReadingSource for FileSource {
    fn poll(&mut self) -> Option<Decoded> {
        if self.pending.is_empty() {
            self.read_new();
        }
        self.pending.pop_front()
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use vitalwatch_types::Channel;

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/vitals.ndjson");
        assert_eq!(source.path(), Path::new("/tmp/vitals.ndjson"));
        assert_eq!(source.description(), "file: /tmp/vitals.ndjson");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_reads_lines_in_order() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"heartRate": 70}}"#).unwrap();
        writeln!(file, r#"{{"heartRate": 71}}"#).unwrap();

        let mut source = FileSource::new(file.path());

        let first = source.poll().unwrap();
        let second = source.poll().unwrap();
        assert_eq!(first.reading.get(Channel::HeartRate), Some(70.0));
        assert_eq!(second.reading.get(Channel::HeartRate), Some(71.0));
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_picks_up_appended_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"spo2": 97}}"#).unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_some());
        assert!(source.poll().is_none());

        writeln!(file, r#"{{"spo2": 96}}"#).unwrap();
        file.flush().unwrap();

        let next = source.poll().unwrap();
        assert_eq!(next.reading.get(Channel::Spo2), Some(96.0));
    }

    #[test]
    fn test_file_source_holds_back_partial_line() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"bloodSugar": 9"#).unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert!(source.error().is_none());

        writeln!(file, "5}}").unwrap();
        file.flush().unwrap();

        let decoded = source.poll().unwrap();
        assert_eq!(decoded.reading.get(Channel::BloodSugar), Some(95.0));
    }

    #[test]
    fn test_file_source_accepts_complete_last_line_without_newline() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"temperature": 36.6}}"#).unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(file.path());
        let decoded = source.poll().unwrap();
        assert_eq!(decoded.reading.get(Channel::Temperature), Some(36.6));

        // Appending a newline afterwards does not replay the line
        writeln!(file).unwrap();
        file.flush().unwrap();
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_keeps_split_multibyte_character() {
        let line = "{\"heartRate\": 70, \"note\": \"café\"}\n".as_bytes();
        // Split inside the two-byte 'é'
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&line[..split]).unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());
        assert_eq!(source.partial, &line[..split]);

        file.write_all(&line[split..]).unwrap();
        file.flush().unwrap();

        let decoded = source.poll().unwrap();
        assert_eq!(decoded.reading.get(Channel::HeartRate), Some(70.0));
        assert!(source.partial.is_empty());
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_skips_non_utf8_line() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xff\xfe\n{\"spo2\": 98}\n").unwrap();
        file.flush().unwrap();

        let mut source = FileSource::new(file.path());
        let decoded = source.poll().unwrap();
        assert_eq!(decoded.reading.get(Channel::Spo2), Some(98.0));
        assert!(source.error().unwrap().contains("Parse error"));
    }

    #[test]
    fn test_file_source_skips_invalid_lines() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();
        writeln!(file, r#"{{"heartRate": 80}}"#).unwrap();

        let mut source = FileSource::new(file.path());

        let decoded = source.poll().unwrap();
        assert_eq!(decoded.reading.get(Channel::HeartRate), Some(80.0));
        assert!(source.error().unwrap().contains("Parse error"));
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/vitals.ndjson");

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_rereads_truncated_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "{\"heartRate\": 70}\n{\"heartRate\": 71}\n").unwrap();

        let mut source = FileSource::new(file.path());
        while source.poll().is_some() {}

        std::fs::write(file.path(), "{\"heartRate\": 90}\n").unwrap();
        let decoded = source.poll().unwrap();
        assert_eq!(decoded.reading.get(Channel::HeartRate), Some(90.0));
    }
}
