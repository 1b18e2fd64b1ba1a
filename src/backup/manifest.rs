//! Backup manifest (`BACKUP.log`)
//!
//! ## Format
//! ```text
//! BACKUP
//! \tSTART:\t<unix seconds>
//! \tEND:\t\t<unix seconds>
//! \tCOST:\t\t<seconds>
//! SUCCESS
//! ```
//! The file exists only for a backup that completed; it is written to a
//! temporary name and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{FrostError, Result};

pub const MANIFEST_FILE: &str = "BACKUP.log";
pub const TEMP_MANIFEST_FILE: &str = "temp.log";

/// Timing record of a completed backup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Manifest {
    pub start: u64,
    pub end: u64,
}

impl Manifest {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Wall-clock seconds the backup took
    pub fn cost(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn render(&self) -> String {
        format!(
            "BACKUP\n\tSTART:\t{}\n\tEND:\t\t{}\n\tCOST:\t\t{}\nSUCCESS",
            self.start,
            self.end,
            self.cost()
        )
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        if lines.next().map(str::trim) != Some("BACKUP") {
            return Err(malformed("missing BACKUP header"));
        }

        let start = field(lines.next(), "START:")?;
        let end = field(lines.next(), "END:")?;
        let cost = field(lines.next(), "COST:")?;

        if lines.next().map(str::trim) != Some("SUCCESS") {
            return Err(malformed("missing SUCCESS trailer"));
        }

        let manifest = Self::new(start, end);
        if manifest.cost() != cost {
            return Err(malformed("COST does not match START and END"));
        }
        Ok(manifest)
    }

    /// Write `BACKUP.log` into `dir` through a temporary file and a rename
    pub fn write_atomic(&self, dir: &Path) -> Result<PathBuf> {
        let temp = dir.join(TEMP_MANIFEST_FILE);
        let path = dir.join(MANIFEST_FILE);

        fs::write(&temp, self.render())?;
        fs::rename(&temp, &path)?;
        if temp.exists() {
            fs::remove_file(&temp)?;
        }
        Ok(path)
    }

    /// Read the `BACKUP.log` of a backup directory
    pub fn read(dir: &Path) -> Result<Self> {
        Self::parse(&fs::read_to_string(dir.join(MANIFEST_FILE))?)
    }
}

/// Seconds since the Unix epoch
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn field(line: Option<&str>, label: &str) -> Result<u64> {
    let line = line.ok_or_else(|| malformed(&format!("missing {} line", label)))?;
    line.trim()
        .strip_prefix(label)
        .and_then(|value| value.trim().parse().ok())
        .ok_or_else(|| malformed(&format!("bad {} line: {:?}", label, line)))
}

fn malformed(reason: &str) -> FrostError {
    FrostError::Backup(format!("malformed manifest: {}", reason))
}
