//! Input validation: configuration files and tick dumps.

use std::path::Path;

use starchart_core::config::GameConstants;
use starchart_core::universe::{TickDump, Universe};

use crate::error::{Result, ToolError};

/// Load and validate a constants file.
///
/// # Errors
///
/// Returns an error if the file is missing, malformed, or lacks a constant.
pub fn validate_config(path: &Path) -> Result<GameConstants> {
    Ok(GameConstants::load(path)?)
}

/// Read a JSON tick dump.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a tick dump.
pub fn read_dump(path: &Path) -> Result<TickDump> {
    let contents = std::fs::read_to_string(path).map_err(|source| ToolError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ToolError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Check that a dump would be accepted by `universe` without applying it.
///
/// # Errors
///
/// Returns the first rule the dump breaks.
pub fn validate_dump(universe: &Universe, dump: &TickDump) -> Result<()> {
    universe.validate(dump)?;
    tracing::info!(
        tick = dump.tick.id,
        planets = dump.planets.len(),
        galaxies = dump.galaxies.len(),
        "Dump is valid"
    );
    Ok(())
}
