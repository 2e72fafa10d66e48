use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::error::EventSourceError;
use super::event::EventRecord;

/// The seam between the pipeline and whatever reads detector data.
///
/// A source hands out records in order, one per call, and returns `Ok(None)` once it is
/// exhausted.
pub trait EventSource {
    fn next_event(&mut self) -> Result<Option<EventRecord>, EventSourceError>;

    /// Number of records the source will yield in total, if known. Used for progress only.
    fn total_events(&self) -> Option<usize> {
        None
    }
}

/// An in-memory source over a list of records
#[derive(Debug, Clone, Default)]
pub struct MemoryEventSource {
    records: VecDeque<EventRecord>,
    total: usize,
}

impl MemoryEventSource {
    pub fn new(records: Vec<EventRecord>) -> Self {
        let total = records.len();
        Self {
            records: records.into(),
            total,
        }
    }
}

impl EventSource for MemoryEventSource {
    fn next_event(&mut self) -> Result<Option<EventRecord>, EventSourceError> {
        Ok(self.records.pop_front())
    }

    fn total_events(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// Reads event records from a YAML file containing a list of records.
///
/// The whole file is loaded on creation, so the file size should be kept reasonable.
#[derive(Debug)]
pub struct YamlEventSource {
    path: PathBuf,
    size_bytes: u64,
    inner: MemoryEventSource,
}

impl YamlEventSource {
    pub fn new(path: &Path) -> Result<Self, EventSourceError> {
        if !path.exists() {
            return Err(EventSourceError::BadFilePath(path.to_path_buf()));
        }
        let size_bytes = path.metadata()?.len();
        let yaml_str = std::fs::read_to_string(path)?;
        let records = serde_yaml::from_str::<Vec<EventRecord>>(&yaml_str)?;
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes,
            inner: MemoryEventSource::new(records),
        })
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    pub fn get_size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

impl EventSource for YamlEventSource {
    fn next_event(&mut self) -> Result<Option<EventRecord>, EventSourceError> {
        self.inner.next_event()
    }

    fn total_events(&self) -> Option<usize> {
        self.inner.total_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::PacketType;
    use std::io::Write;

    #[test]
    fn test_memory_source_order() {
        let mut source = MemoryEventSource::new(vec![
            EventRecord::new(1, vec![0], vec![1]),
            EventRecord::new(2, vec![0], vec![1]),
        ]);
        assert_eq!(source.total_events(), Some(2));
        let mut crates = Vec::new();
        while let Ok(Some(event)) = source.next_event() {
            crates.push(event.crate_id);
        }
        assert_eq!(crates, vec![1, 2]);
        assert!(matches!(source.next_event(), Ok(None)));
    }

    #[test]
    fn test_yaml_source() {
        let mut file = match tempfile::NamedTempFile::new() {
            Ok(f) => f,
            Err(_) => panic!(),
        };
        let yaml = "- crate: 4\n  ntubes: 2\n  tube_num: [0, 1]\n  qdc: [5, 6]\n\
                    - crate: 5\n  packet_type: notice\n  ntubes: 0\n  tube_num: []\n  qdc: []\n";
        if file.write_all(yaml.as_bytes()).is_err() {
            panic!();
        }

        let mut source = match YamlEventSource::new(file.path()) {
            Ok(s) => s,
            Err(e) => panic!("{e}"),
        };
        assert_eq!(source.total_events(), Some(2));
        assert!(source.get_size_bytes() > 0);
        let first = match source.next_event() {
            Ok(Some(e)) => e,
            _ => panic!(),
        };
        assert_eq!(first.crate_id, 4);
        assert_eq!(first.packet_type, PacketType::Event);
        let second = match source.next_event() {
            Ok(Some(e)) => e,
            _ => panic!(),
        };
        assert_eq!(second.packet_type, PacketType::Notice);
    }

    #[test]
    fn test_yaml_source_missing_file() {
        let result = YamlEventSource::new(Path::new("/definitely/not/here.yml"));
        assert!(matches!(result, Err(EventSourceError::BadFilePath(_))));
    }
}
