//! Momentum classification types
//!
//! Horizons with their thresholds, mover categories and the mover records
//! emitted each cycle.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::HorizonConfig;
use crate::session::Session;

/// Direction of a qualifying move
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Price rose beyond the ripper threshold
    Ripper,
    /// Price fell beyond the dipper threshold
    Dipper,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ripper => "ripper",
            Direction::Dipper => "dipper",
        }
    }
}

/// What a horizon's percent change is measured against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    /// The sample at or before `current.bucket - n`
    Buckets(u32),
    /// The previous session's close recorded on the current sample
    PreviousClose,
}

/// A lookback window with independent ripper and dipper thresholds (percent)
#[derive(Debug, Clone, PartialEq)]
pub struct Horizon {
    pub label: String,
    pub lookback: Lookback,
    pub ripper_pct: Decimal,
    pub dipper_pct: Decimal,
}

impl Horizon {
    /// Horizon measured against a bucket offset
    pub fn buckets(label: impl Into<String>, offset: u32, ripper_pct: Decimal, dipper_pct: Decimal) -> Self {
        Self {
            label: label.into(),
            lookback: Lookback::Buckets(offset),
            ripper_pct,
            dipper_pct,
        }
    }

    /// Horizon measured against the previous close
    pub fn day(label: impl Into<String>, ripper_pct: Decimal, dipper_pct: Decimal) -> Self {
        Self {
            label: label.into(),
            lookback: Lookback::PreviousClose,
            ripper_pct,
            dipper_pct,
        }
    }

    /// Positive test: strictly above the ripper threshold
    pub fn is_ripper(&self, change_pct: Decimal) -> bool {
        change_pct > self.ripper_pct
    }

    /// Negative test: strictly below the negated dipper threshold
    pub fn is_dipper(&self, change_pct: Decimal) -> bool {
        change_pct < -self.dipper_pct
    }

    /// Category for this horizon in the given direction
    pub fn category(&self, direction: Direction) -> MoverCategory {
        MoverCategory {
            horizon: self.label.clone(),
            direction,
        }
    }
}

impl From<&HorizonConfig> for Horizon {
    fn from(config: &HorizonConfig) -> Self {
        Self {
            label: config.label.clone(),
            lookback: match config.offset_buckets {
                Some(offset) => Lookback::Buckets(offset),
                None => Lookback::PreviousClose,
            },
            ripper_pct: config.ripper_pct,
            dipper_pct: config.dipper_pct,
        }
    }
}

/// Horizon and direction, rendered as e.g. `5m_dipper`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MoverCategory {
    pub horizon: String,
    pub direction: Direction,
}

impl fmt::Display for MoverCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.horizon, self.direction.as_str())
    }
}

impl FromStr for MoverCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (horizon, direction) = s
            .rsplit_once('_')
            .ok_or_else(|| format!("invalid mover category: {s}"))?;
        let direction = match direction {
            "ripper" => Direction::Ripper,
            "dipper" => Direction::Dipper,
            other => return Err(format!("invalid mover direction: {other}")),
        };
        if horizon.is_empty() {
            return Err(format!("invalid mover category: {s}"));
        }
        Ok(Self {
            horizon: horizon.to_string(),
            direction,
        })
    }
}

/// A ticker that moved beyond a threshold over one horizon this cycle
///
/// Unique by `(category, ticker)`; the whole set is replaced every cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    pub category: MoverCategory,
    pub ticker: String,
    /// Current price the change was measured to
    pub price: Decimal,
    /// Percent change over the horizon (1.5 = +1.5%)
    pub change_pct: Decimal,
    pub session: Session,
    pub computed_at: DateTime<Utc>,
}

impl Mover {
    /// Identity within a mover set
    pub fn key(&self) -> (MoverCategory, String) {
        (self.category.clone(), self.ticker.clone())
    }
}
