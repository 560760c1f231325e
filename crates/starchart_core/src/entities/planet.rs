//! Planets.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EntityKind, Stats, UniverseEntity};
use crate::keys::PlanetKey;

/// Stable planet identifier assigned by the game. Survives relocation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlanetId(pub String);

impl PlanetId {
    /// Wrap a planet id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Special status flags published for a planet.
///
/// Stored and exchanged as the dump's comma-separated code list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlanetFlag {
    /// Newbie protection (`P`).
    Protection,
    /// Scheduled for deletion (`D`).
    Deleted,
    /// Reset this round (`R`).
    Reset,
    /// Vacation mode (`V`).
    Vacation,
    /// Account closed (`C`).
    Closed,
    /// Exiled this tick (`E`).
    Exile,
    /// Any code the dump format does not define yet.
    Other(String),
}

impl PlanetFlag {
    /// Parse one flag code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "P" => Self::Protection,
            "D" => Self::Deleted,
            "R" => Self::Reset,
            "V" => Self::Vacation,
            "C" => Self::Closed,
            "E" => Self::Exile,
            other => Self::Other(other.to_string()),
        }
    }

    /// The dump code for this flag.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Protection => "P",
            Self::Deleted => "D",
            Self::Reset => "R",
            Self::Vacation => "V",
            Self::Closed => "C",
            Self::Exile => "E",
            Self::Other(code) => code,
        }
    }

    /// Parse a comma-separated flag list such as `"P,V"`.
    #[must_use]
    pub fn parse_list(list: &str) -> Vec<Self> {
        list.split(',')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(Self::from_code)
            .collect()
    }

    /// Short label used in planet summaries.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Protection => "Prot",
            Self::Deleted => "Del",
            Self::Reset => "Reset",
            Self::Vacation => "Vac",
            Self::Closed => "Closed",
            Self::Exile => "Exile",
            Self::Other(code) => code,
        }
    }
}

mod flag_codes {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::PlanetFlag;

    pub fn serialize<S: Serializer>(
        flags: &[PlanetFlag],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let codes: Vec<&str> = flags.iter().map(PlanetFlag::code).collect();
        serializer.serialize_str(&codes.join(","))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<PlanetFlag>, D::Error> {
        let list = String::deserialize(deserializer)?;
        Ok(PlanetFlag::parse_list(&list))
    }
}

/// A planet as published in one dump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Planet {
    /// Stable planet id.
    pub id: PlanetId,
    /// Coordinates at this tick.
    pub key: PlanetKey,
    /// Planet name.
    pub planet_name: String,
    /// Ruler name.
    pub ruler_name: String,
    /// Race code.
    pub race: String,
    /// Special status flags, written as codes like `"P,V"`.
    #[serde(default, with = "flag_codes")]
    pub special: Vec<PlanetFlag>,
    /// Statistics.
    pub stats: Stats,
}

impl Planet {
    /// Create a planet with the given statistics and empty names.
    pub fn new(id: impl Into<String>, key: PlanetKey, stats: Stats) -> Self {
        Self {
            id: PlanetId::new(id),
            key,
            planet_name: String::new(),
            ruler_name: String::new(),
            race: String::new(),
            special: Vec::new(),
            stats,
        }
    }

    /// Check for a specific flag.
    #[must_use]
    pub fn has_flag(&self, flag: &PlanetFlag) -> bool {
        self.special.contains(flag)
    }
}

impl UniverseEntity for Planet {
    type Key = PlanetKey;
    const KIND: EntityKind = EntityKind::Planet;

    fn key(&self) -> PlanetKey {
        self.key
    }

    fn stats(&self) -> &Stats {
        &self.stats
    }

    fn identity(&self) -> Option<&str> {
        Some(self.id.as_str())
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) '{}' of '{}' ",
            self.key, self.race, self.ruler_name, self.planet_name
        )?;
        if !self.special.is_empty() {
            let labels: Vec<&str> = self.special.iter().map(PlanetFlag::label).collect();
            write!(f, "({}) ", labels.join(", "))?;
        }
        write!(f, "{} Idle: {}", self.stats.headline(), self.stats.idle)
    }
}
