use std::fmt;
use std::str::FromStr;

use num_traits::ToPrimitive;

use crate::errors::Error;

/// Domain and resolution of a histogram axis, written `lower,bins,upper`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Limits {
    pub lower: f64,
    pub bins: usize,
    pub upper: f64,
}

impl Limits {
    pub fn new(lower: f64, bins: usize, upper: f64) -> Result<Self, Error> {
        if !lower.is_finite() || !upper.is_finite() {
            return Err(Error::InvalidConfiguration(format!(
                "Limits must be finite, got {},{},{}",
                lower, bins, upper
            )));
        }
        if bins == 0 {
            return Err(Error::InvalidConfiguration(String::from(
                "Limits need at least one bin",
            )));
        }
        if upper <= lower {
            return Err(Error::InvalidConfiguration(format!(
                "Upper limit {} must be greater than lower limit {}",
                upper, lower
            )));
        }
        Ok(Self { lower, bins, upper })
    }

    /// Largest absolute value reachable on this axis.
    pub fn reach(&self) -> f64 {
        self.lower.abs().max(self.upper.abs())
    }
}

impl FromStr for Limits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            Error::InvalidConfiguration(format!(
                "Could not parse limits '{}', expected lower,bins,upper",
                s
            ))
        };

        let fields: Vec<&str> = s.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(invalid());
        }
        let lower = fields[0].parse::<f64>().map_err(|_| invalid())?;
        let bins = fields[1].parse::<usize>().map_err(|_| invalid())?;
        let upper = fields[2].parse::<f64>().map_err(|_| invalid())?;
        Limits::new(lower, bins, upper)
    }
}

impl fmt::Display for Limits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{},{}", self.lower, self.bins, self.upper)
    }
}

/// Transform applied to a value before it is quantized into a bin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scale {
    Unknown,
    Linear,
    Log,
    /// Logarithmic bins preceded by a reserved bin holding exact zeros.
    LogZero,
}

impl Scale {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "linear" => Scale::Linear,
            "log" => Scale::Log,
            "log-zero" | "log_zero" => Scale::LogZero,
            _ => Scale::Unknown,
        }
    }

    /// Storage slots needed for `bins` bins under this scale.
    pub fn slots(&self, bins: usize) -> usize {
        match self {
            Scale::LogZero => bins + 1,
            _ => bins,
        }
    }
}

impl FromStr for Scale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Scale::from_name(s) {
            Scale::Unknown => Err(Error::UnknownScale(s.to_string())),
            scale => Ok(scale),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Scale::Unknown => "unknown",
            Scale::Linear => "linear",
            Scale::Log => "log",
            Scale::LogZero => "log-zero",
        };
        write!(f, "{}", name)
    }
}

/// Maps `value` to its bin, or `None` if the value is not counted.
///
/// Linear bins split `[lower, upper)` evenly. Logarithmic bins split
/// `[ln(lower), ln(upper))` evenly. Under `LogZero` an exact zero lands in the
/// reserved bin 0 and every logarithmic bin is shifted up by one.
#[inline]
pub fn to_bin<T: ToPrimitive>(value: T, limits: &Limits, scale: Scale) -> Option<usize> {
    let value = value.to_f64()?;
    match scale {
        Scale::Linear => linear_bin(value, limits),
        Scale::Log => log_bin(value, limits),
        Scale::LogZero => {
            if value == 0.0 {
                Some(0)
            } else {
                log_bin(value, limits).map(|bin| bin + 1)
            }
        }
        Scale::Unknown => None,
    }
}

#[inline(always)]
fn linear_bin(value: f64, limits: &Limits) -> Option<usize> {
    if value < limits.lower || value >= limits.upper {
        return None;
    }
    let fraction = (value - limits.lower) / (limits.upper - limits.lower);
    Some(clamp_bin(fraction, limits.bins))
}

#[inline(always)]
fn log_bin(value: f64, limits: &Limits) -> Option<usize> {
    if value <= 0.0 || value < limits.lower || value >= limits.upper {
        return None;
    }
    let log_lower = limits.lower.ln();
    let fraction = (value.ln() - log_lower) / (limits.upper.ln() - log_lower);
    Some(clamp_bin(fraction, limits.bins))
}

// Rounding can push a value just under `upper` onto `bins`.
#[inline(always)]
fn clamp_bin(fraction: f64, bins: usize) -> usize {
    let bin = (fraction * bins as f64).floor() as usize;
    bin.min(bins - 1)
}

/// Native-unit `[lower, upper)` bounds of a storage slot. The reserved zero
/// slot of `LogZero` reports `(0, 0)`.
pub fn bin_bounds(bin: usize, limits: &Limits, scale: Scale) -> (f64, f64) {
    let edge = |i: usize| (i as f64) / (limits.bins as f64);
    match scale {
        Scale::Linear | Scale::Unknown => {
            let width = limits.upper - limits.lower;
            (
                limits.lower + width * edge(bin),
                limits.lower + width * edge(bin + 1),
            )
        }
        Scale::Log => log_bounds(bin, limits),
        Scale::LogZero => {
            if bin == 0 {
                (0.0, 0.0)
            } else {
                log_bounds(bin - 1, limits)
            }
        }
    }
}

fn log_bounds(bin: usize, limits: &Limits) -> (f64, f64) {
    let log_lower = limits.lower.ln();
    let log_width = limits.upper.ln() - log_lower;
    let bins = limits.bins as f64;
    (
        (log_lower + log_width * (bin as f64) / bins).exp(),
        (log_lower + log_width * ((bin + 1) as f64) / bins).exp(),
    )
}

/// One histogram dimension.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Axis {
    pub limits: Limits,
    pub scale: Scale,
}

impl Axis {
    pub fn new(limits: Limits, scale: Scale) -> Result<Self, Error> {
        match scale {
            Scale::Unknown => Err(Error::UnknownScale(String::from("unknown"))),
            Scale::Log | Scale::LogZero if limits.lower <= 0.0 => {
                Err(Error::InvalidConfiguration(format!(
                    "The {} scale needs a positive lower limit, got {}",
                    scale, limits.lower
                )))
            }
            _ => Ok(Self { limits, scale }),
        }
    }

    pub fn slots(&self) -> usize {
        self.scale.slots(self.limits.bins)
    }

    #[inline(always)]
    pub fn to_bin<T: ToPrimitive>(&self, value: T) -> Option<usize> {
        to_bin(value, &self.limits, self.scale)
    }

    pub fn bounds(&self, slot: usize) -> (f64, f64) {
        bin_bounds(slot, &self.limits, self.scale)
    }
}
