//! Package version numbers
//!
//! Versions are one to four dot-separated numbers (`0.1.0.1`). Missing
//! components compare as zero, so `0.2` and `0.2.0.0` are the same version.

use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

const MAX_COMPONENTS: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct Version {
    parts: [u64; MAX_COMPONENTS],
    /// Number of components as written, for display
    len: usize,
}

impl Version {
    pub fn new(parts: &[u64]) -> Result<Self> {
        if parts.is_empty() || parts.len() > MAX_COMPONENTS {
            return Err(Error::InvalidVersion(format!(
                "expected 1 to {MAX_COMPONENTS} components, got {}",
                parts.len()
            )));
        }
        let mut padded = [0; MAX_COMPONENTS];
        padded[..parts.len()].copy_from_slice(parts);
        Ok(Self {
            parts: padded,
            len: parts.len(),
        })
    }

    pub fn parse(s: &str) -> Result<Self> {
        s.parse()
    }

    /// Components as written
    pub fn components(&self) -> &[u64] {
        &self.parts[..self.len]
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let parts = trimmed
            .split('.')
            .map(|p| p.parse::<u64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::InvalidVersion(s.to_string()))?;
        Self::new(&parts).map_err(|_| Error::InvalidVersion(s.to_string()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.components().iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
