//! Flight snapshot file
//!
//! The whole flight set lives in one pretty-printed JSON array. Writes go to
//! a sibling `.tmp` file which is fsync'd and renamed over the snapshot, so a
//! reader never observes a half-written file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::flight::{Flight, FlightError};

pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. `Ok(None)` if the file does not exist.
    pub fn read(&self) -> Result<Option<Vec<Flight>>, FlightError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.corrupt(e.to_string())),
        };

        let flights: Vec<Flight> =
            serde_json::from_str(&content).map_err(|e| self.corrupt(e.to_string()))?;

        let mut seen = std::collections::HashSet::with_capacity(flights.len());
        for flight in &flights {
            if !seen.insert(flight.id.as_str()) {
                return Err(self.corrupt(format!("duplicate flight id {}", flight.id)));
            }
        }

        Ok(Some(flights))
    }

    /// Atomically replace the snapshot with `flights`.
    pub fn write(&self, flights: &[Flight]) -> Result<(), FlightError> {
        self.write_inner(flights)
            .map_err(|e| FlightError::Persistence(format!("{}: {}", self.path.display(), e)))
    }

    fn write_inner(&self, flights: &[Flight]) -> io::Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(flights)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let tmp_path = self.tmp_path();
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(&json)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "flights.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn corrupt(&self, reason: String) -> FlightError {
        FlightError::CorruptSnapshot {
            path: self.path.display().to_string(),
            reason,
        }
    }
}
