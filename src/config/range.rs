//! Interval notation for numeric option ranges
//!
//! Ranges are written the way the host declares them: `[1024,65535]` is closed,
//! `(0,100]` excludes zero, and `*` leaves an end unbounded (`[0,*)`).

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One end of a [`NumberRange`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Unbounded,
    Inclusive(f64),
    Exclusive(f64),
}

/// Allowed interval for a number option
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NumberRange {
    pub min: Bound,
    pub max: Bound,
}

impl Default for NumberRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl NumberRange {
    /// `(*,*)`
    pub fn unbounded() -> Self {
        Self {
            min: Bound::Unbounded,
            max: Bound::Unbounded,
        }
    }

    /// `[min,max]`
    pub fn closed(min: f64, max: f64) -> Self {
        Self {
            min: Bound::Inclusive(min),
            max: Bound::Inclusive(max),
        }
    }

    /// `[min,*)`
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Bound::Inclusive(min),
            max: Bound::Unbounded,
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        let above_min = match self.min {
            Bound::Unbounded => true,
            Bound::Inclusive(min) => value >= min,
            Bound::Exclusive(min) => value > min,
        };
        let below_max = match self.max {
            Bound::Unbounded => true,
            Bound::Inclusive(max) => value <= max,
            Bound::Exclusive(max) => value < max,
        };
        above_min && below_max
    }

    /// Whether either end is bounded
    pub fn is_bounded(&self) -> bool {
        self.min != Bound::Unbounded || self.max != Bound::Unbounded
    }

    /// Whether at least one integer satisfies both ends
    pub fn contains_integer(&self) -> bool {
        let lowest = match self.min {
            Bound::Unbounded => return self.is_satisfiable(),
            Bound::Inclusive(min) => min.ceil(),
            Bound::Exclusive(min) => min.floor() + 1.0,
        };
        self.contains(lowest)
    }

    /// Whether at least one number satisfies both ends
    pub fn is_satisfiable(&self) -> bool {
        match (self.min, self.max) {
            (Bound::Inclusive(min), Bound::Inclusive(max)) => min <= max,
            (Bound::Inclusive(min) | Bound::Exclusive(min), Bound::Inclusive(max) | Bound::Exclusive(max)) => {
                min < max
            }
            _ => true,
        }
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.min {
            Bound::Unbounded => f.write_str("(*")?,
            Bound::Inclusive(min) => write!(f, "[{min}")?,
            Bound::Exclusive(min) => write!(f, "({min}")?,
        }
        match self.max {
            Bound::Unbounded => f.write_str(",*)"),
            Bound::Inclusive(max) => write!(f, ",{max}]"),
            Bound::Exclusive(max) => write!(f, ",{max})"),
        }
    }
}

impl FromStr for NumberRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| Error::Parse(format!("invalid range '{s}': {reason}"));
        let s_trim = s.trim();

        let mut chars = s_trim.chars();
        let open = chars.next().ok_or_else(|| invalid("empty"))?;
        let close = chars.next_back().ok_or_else(|| invalid("missing closing bracket"))?;
        let inner = chars.as_str();

        let (low, high) = inner
            .split_once(',')
            .ok_or_else(|| invalid("expected two comma-separated ends"))?;

        let parse_end = |text: &str, inclusive: bool| -> Result<Bound, Error> {
            let text = text.trim();
            if text == "*" {
                return Ok(Bound::Unbounded);
            }
            let n: f64 = text.parse().map_err(|_| invalid("ends must be numbers or '*'"))?;
            Ok(if inclusive {
                Bound::Inclusive(n)
            } else {
                Bound::Exclusive(n)
            })
        };

        let min = match open {
            '[' => parse_end(low, true)?,
            '(' => parse_end(low, false)?,
            _ => return Err(invalid("must start with '[' or '('")),
        };
        let max = match close {
            ']' => parse_end(high, true)?,
            ')' => parse_end(high, false)?,
            _ => return Err(invalid("must end with ']' or ')'")),
        };

        Ok(Self { min, max })
    }
}

impl TryFrom<String> for NumberRange {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NumberRange> for String {
    fn from(range: NumberRange) -> Self {
        range.to_string()
    }
}
