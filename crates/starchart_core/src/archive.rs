//! Durable universe archive.
//!
//! The whole [`Universe`] is written as one bincode blob prefixed by a format
//! version. Loading checks the version before decoding the body.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarchartError};
use crate::universe::Universe;

/// Current archive format version.
pub const ARCHIVE_VERSION: u32 = 2;

/// Versioned archive contents.
///
/// Field order is the on-disk layout; [`ArchiveRef`] must match it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Archive {
    /// Format version.
    pub version: u32,
    /// When the archive was written.
    pub saved_at: DateTime<Utc>,
    /// The stored universe.
    pub universe: Universe,
}

impl Archive {
    /// Wrap a universe at the current format version.
    #[must_use]
    pub fn new(universe: Universe, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            saved_at,
            universe,
        }
    }

    /// Encode to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        ArchiveRef::new(&self.universe, self.saved_at)
            .with_version(self.version)
            .to_bytes()
    }

    /// Decode from bytes, rejecting other format versions.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let version: u32 = bincode::deserialize(bytes)
            .map_err(|e| StarchartError::Archive(format!("Failed to read archive version: {e}")))?;
        if version != ARCHIVE_VERSION {
            return Err(StarchartError::Archive(format!(
                "Archive version mismatch: expected {ARCHIVE_VERSION}, got {version}"
            )));
        }
        bincode::deserialize(bytes)
            .map_err(|e| StarchartError::Archive(format!("Failed to deserialize archive: {e}")))
    }

    /// Write to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_file(path.as_ref(), &self.to_bytes()?)
    }

    /// Read from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| StarchartError::Archive(format!("Failed to read archive file: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

/// Borrowed archive view used for writing without copying the universe.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ArchiveRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    universe: &'a Universe,
}

impl<'a> ArchiveRef<'a> {
    /// Borrow a universe at the current format version.
    #[must_use]
    pub fn new(universe: &'a Universe, saved_at: DateTime<Utc>) -> Self {
        Self {
            version: ARCHIVE_VERSION,
            saved_at,
            universe,
        }
    }

    fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Encode to bytes readable by [`Archive::from_bytes`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| StarchartError::Archive(format!("Failed to serialize archive: {e}")))
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|e| StarchartError::Archive(format!("Failed to write archive file: {e}")))
}

impl Universe {
    /// Save the universe to an archive file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_file(path, &ArchiveRef::new(self, Utc::now()).to_bytes()?)?;
        tracing::info!(
            path = %path.display(),
            tick = self.clock().current_tick().unwrap_or_default(),
            "Saved universe archive"
        );
        Ok(())
    }

    /// Load a universe from an archive file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let archive = Archive::load(path)?;
        tracing::info!(
            path = %path.display(),
            saved_at = %archive.saved_at,
            "Loaded universe archive"
        );
        Ok(archive.universe)
    }
}
