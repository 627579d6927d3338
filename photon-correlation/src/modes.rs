use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// Encoding of the incoming photon records.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// channel + absolute time
    T2,
    /// channel + pulse number + time relative to the pulse
    T3,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "t2" => Ok(Mode::T2),
            "t3" => Ok(Mode::T3),
            other => Err(Error::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Mode::T2 => write!(f, "t2"),
            Mode::T3 => write!(f, "t3"),
        }
    }
}
