/**
 * range.rs
 * Inclusive port ranges and their candidate expansion
 *
 * A range with end < start is empty and expands to nothing. Expansion is
 * rebuilt on every call, so two stages never share an iterator.
 */

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::PortError;

/// Inclusive port range, serialized as a `[start, end]` pair
///
/// `[]` is the empty range, so an empty list in a config file turns the
/// stage off instead of failing the parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<u16>", into = "Vec<u16>")]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Self {
        PortRange { start, end }
    }

    /// A range that expands to no candidates
    pub fn empty() -> Self {
        PortRange { start: 1, end: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of ports in the range
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    /// Check if port is within this range
    pub fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }

    /// Expand into candidate ports
    ///
    /// Ascending unless `randomize` is set, in which case the same set comes
    /// back uniformly shuffled.
    pub fn generate(&self, randomize: bool) -> Vec<u16> {
        if self.is_empty() {
            return Vec::new();
        }

        let mut ports: Vec<u16> = (self.start..=self.end).collect();
        if randomize {
            ports.shuffle(&mut rand::thread_rng());
        }
        ports
    }
}

impl From<(u16, u16)> for PortRange {
    fn from((start, end): (u16, u16)) -> Self {
        PortRange { start, end }
    }
}

impl From<PortRange> for (u16, u16) {
    fn from(range: PortRange) -> Self {
        (range.start, range.end)
    }
}

impl TryFrom<Vec<u16>> for PortRange {
    type Error = String;

    fn try_from(ports: Vec<u16>) -> Result<Self, Self::Error> {
        match ports.as_slice() {
            [] => Ok(PortRange::empty()),
            &[start, end] => Ok(PortRange::new(start, end)),
            other => Err(format!("expected [start, end] or [], got {} ports", other.len())),
        }
    }
}

impl From<PortRange> for Vec<u16> {
    fn from(range: PortRange) -> Self {
        if range.is_empty() {
            Vec::new()
        } else {
            vec![range.start, range.end]
        }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Parses `3000-3100`, or a bare `3000` as a single-port range
impl FromStr for PortRange {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| {
            part.trim()
                .parse::<u16>()
                .map_err(|e| PortError::InvalidConfig(format!("Invalid port range {:?}: {}", s, e)))
        };

        match s.split_once('-') {
            Some((start, end)) => Ok(PortRange::new(parse(start)?, parse(end)?)),
            None => {
                let port = parse(s)?;
                Ok(PortRange::new(port, port))
            }
        }
    }
}
