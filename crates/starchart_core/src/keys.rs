//! Natural keys for universe entities.
//!
//! Coordinates are 1-based; a zero component is never valid. Keys render
//! and parse in the game's colon notation (`x`, `x:y`, `x:y:z`).

use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StarchartError};

/// Behaviour shared by every natural key type.
pub trait NaturalKey:
    Clone + Eq + Ord + Hash + fmt::Debug + fmt::Display + Serialize + DeserializeOwned
{
    /// Reject keys with a missing or zero component.
    fn validate(&self) -> Result<()>;
}

fn require_nonzero(component: u32, name: &str, rendered: &dyn fmt::Display) -> Result<()> {
    if component == 0 {
        return Err(StarchartError::InvalidKey(format!(
            "{rendered}: {name} coordinate must be non-zero"
        )));
    }
    Ok(())
}

fn parse_components<const N: usize>(text: &str) -> Result<[u32; N]> {
    let parts: Vec<&str> = text.trim().split(':').collect();
    if parts.len() != N {
        return Err(StarchartError::InvalidKey(format!(
            "'{text}': expected {N} colon-separated coordinates"
        )));
    }
    let mut out = [0u32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| StarchartError::InvalidKey(format!("'{text}': '{part}' is not a coordinate")))?;
    }
    Ok(out)
}

/// Cluster key (`x`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterKey(pub u32);

impl ClusterKey {
    /// Create a validated cluster key.
    pub fn new(x: u32) -> Result<Self> {
        let key = Self(x);
        key.validate()?;
        Ok(key)
    }
}

impl NaturalKey for ClusterKey {
    fn validate(&self) -> Result<()> {
        require_nonzero(self.0, "x", self)
    }
}

impl fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ClusterKey {
    type Err = StarchartError;

    fn from_str(s: &str) -> Result<Self> {
        let [x] = parse_components::<1>(s)?;
        Self::new(x)
    }
}

/// Galaxy key (`x:y`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GalaxyKey {
    /// Cluster coordinate.
    pub x: u32,
    /// Galaxy coordinate within the cluster.
    pub y: u32,
}

impl GalaxyKey {
    /// Create a validated galaxy key.
    pub fn new(x: u32, y: u32) -> Result<Self> {
        let key = Self { x, y };
        key.validate()?;
        Ok(key)
    }

    /// The cluster containing this galaxy.
    #[must_use]
    pub const fn cluster(&self) -> ClusterKey {
        ClusterKey(self.x)
    }
}

impl NaturalKey for GalaxyKey {
    fn validate(&self) -> Result<()> {
        require_nonzero(self.x, "x", self)?;
        require_nonzero(self.y, "y", self)
    }
}

impl fmt::Display for GalaxyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

impl FromStr for GalaxyKey {
    type Err = StarchartError;

    fn from_str(s: &str) -> Result<Self> {
        let [x, y] = parse_components::<2>(s)?;
        Self::new(x, y)
    }
}

/// Planet key (`x:y:z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanetKey {
    /// Cluster coordinate.
    pub x: u32,
    /// Galaxy coordinate.
    pub y: u32,
    /// Planet slot within the galaxy.
    pub z: u32,
}

impl PlanetKey {
    /// Create a validated planet key.
    pub fn new(x: u32, y: u32, z: u32) -> Result<Self> {
        let key = Self { x, y, z };
        key.validate()?;
        Ok(key)
    }

    /// The galaxy containing this planet.
    #[must_use]
    pub const fn galaxy(&self) -> GalaxyKey {
        GalaxyKey {
            x: self.x,
            y: self.y,
        }
    }
}

impl NaturalKey for PlanetKey {
    fn validate(&self) -> Result<()> {
        require_nonzero(self.x, "x", self)?;
        require_nonzero(self.y, "y", self)?;
        require_nonzero(self.z, "z", self)
    }
}

impl fmt::Display for PlanetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}

impl FromStr for PlanetKey {
    type Err = StarchartError;

    fn from_str(s: &str) -> Result<Self> {
        let [x, y, z] = parse_components::<3>(s)?;
        Self::new(x, y, z)
    }
}

/// Alliance key: the alliance name as published in the dump.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AllianceKey(pub String);

impl AllianceKey {
    /// Create a validated alliance key.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let key = Self(name.into());
        key.validate()?;
        Ok(key)
    }

    /// The alliance name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl NaturalKey for AllianceKey {
    fn validate(&self) -> Result<()> {
        if self.0.trim().is_empty() {
            return Err(StarchartError::InvalidKey(
                "alliance name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for AllianceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
