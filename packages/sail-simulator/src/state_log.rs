//! state_log.rs — Append-only JSON-lines side channel
//!
//! One `StepRecord` per line, written with a single `write_all` and flushed
//! so a crashed run still leaves a readable log. Write failures are logged
//! and counted but never propagate into the physics step. A record torn by a
//! failed write is terminated before the next one, so at most that one line
//! is unreadable.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use sail_types::StepRecord;

use crate::error::{Result, SimError};

pub struct StateLog {
    sink: Box<dyn Write + Send>,
    written: u64,
    failed: u64,
    /// Last write may have left a partial line behind
    torn: bool,
}

impl StateLog {
    /// Create (truncating) the log file, making parent directories as needed
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| SimError::Io { path: dir.to_path_buf(), source })?;
        }
        let file: File = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| SimError::Io { path: path.to_path_buf(), source })?;
        debug!("State log → {:?}", path);
        Ok(Self::from_writer(file))
    }

    /// Log into any writer (in-memory buffers, pipes, ...)
    pub fn from_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            sink: Box::new(writer),
            written: 0,
            failed: 0,
            torn: false,
        }
    }

    /// Append one record. Never fails: errors are reported via `tracing`.
    pub fn append(&mut self, record: &StepRecord) {
        let mut line = match record.to_json_line() {
            Ok(l) => l,
            Err(e) => {
                self.failed += 1;
                warn!("State log: serialize failed at step {}: {e}", record.step);
                return;
            }
        };

        if self.torn {
            line.insert(0, '\n');
        }
        line.push('\n');

        let result = self.sink.write_all(line.as_bytes()).and_then(|_| self.sink.flush());

        match result {
            Ok(()) => {
                self.written += 1;
                self.torn = false;
            }
            Err(e) => {
                self.failed += 1;
                self.torn = true;
                // Only the first few failures are worth a warning each
                if self.failed <= 3 {
                    warn!("State log: write failed at step {}: {e}", record.step);
                }
            }
        }
    }

    pub fn records_written(&self) -> u64 { self.written }

    pub fn write_failures(&self) -> u64 { self.failed }
}

impl std::fmt::Debug for StateLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateLog")
            .field("written", &self.written)
            .field("failed", &self.failed)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Writer that always errors
    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    /// Shared in-memory writer so the test can inspect what was written
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().map_err(|_| io::Error::new(io::ErrorKind::Other, "poisoned"))?.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn test_broken_writer_is_counted_not_fatal() {
        let mut log = StateLog::from_writer(Broken);
        let record = crate::simulation::tests::sample_record();
        log.append(&record);
        log.append(&record);
        assert_eq!(log.records_written(), 0);
        assert_eq!(log.write_failures(), 2);
    }

    /// Accepts a few bytes of the first record, then fails once
    struct Flaky {
        out: SharedBuf,
        calls: u32,
    }

    impl Write for Flaky {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            match self.calls {
                1 => self.out.write(&buf[..buf.len().min(10)]),
                2 => Err(io::Error::new(io::ErrorKind::Other, "pipe hiccup")),
                _ => self.out.write(buf),
            }
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    #[test]
    fn test_torn_write_does_not_corrupt_next_record() {
        let buf = SharedBuf::default();
        let mut log = StateLog::from_writer(Flaky { out: buf.clone(), calls: 0 });
        let record = crate::simulation::tests::sample_record();
        log.append(&record);
        log.append(&record);
        assert_eq!(log.write_failures(), 1);
        assert_eq!(log.records_written(), 1);

        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(StepRecord::from_json_line(lines[0]).is_err());
        let parsed = StepRecord::from_json_line(lines[1]).unwrap();
        assert_eq!(parsed.step, record.step);
    }

    #[test]
    fn test_records_are_json_lines() {
        let buf = SharedBuf::default();
        let mut log = StateLog::from_writer(buf.clone());
        let record = crate::simulation::tests::sample_record();
        log.append(&record);
        log.append(&record);

        let bytes = buf.0.lock().unwrap().clone();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed = StepRecord::from_json_line(lines[0]).unwrap();
        assert_eq!(parsed.step, record.step);
        assert_eq!(log.records_written(), 2);
    }

    #[test]
    fn test_create_makes_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("sail-log-{}", std::process::id()));
        let path = dir.join("nested").join("run.jsonl");
        let mut log = StateLog::create(&path).unwrap();
        log.append(&crate::simulation::tests::sample_record());
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
