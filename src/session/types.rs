//! Session label types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse trading period derived from local exchange time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    PreMarket,
    Regular,
    PostMarket,
    Closed,
}

impl Session {
    /// Stable label used in storage and output
    pub fn as_str(&self) -> &'static str {
        match self {
            Session::PreMarket => "Pre-Market",
            Session::Regular => "Regular",
            Session::PostMarket => "Post-Market",
            Session::Closed => "Closed",
        }
    }

    /// Whether the exchange is trading (including extended hours)
    pub fn is_open(&self) -> bool {
        !matches!(self, Session::Closed)
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Session {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pre-Market" => Ok(Session::PreMarket),
            "Regular" => Ok(Session::Regular),
            "Post-Market" => Ok(Session::PostMarket),
            "Closed" => Ok(Session::Closed),
            other => Err(format!("unknown session label: {other}")),
        }
    }
}
