extern crate byteorder;

pub mod errors;
pub mod modes;
pub mod options;
pub mod parsers;
pub mod correlation_tools;

pub use correlation_tools::correlator::{histogram, HistogramResult, Summary};
pub use correlation_tools::histogram::Histogram;
pub use options::Options;

use std::fmt::Debug;

/// A single t2 detection: channel and absolute arrival time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct T2Event {
    pub channel: u32,
    pub time: i64,
}

/// A single t3 detection: channel, sync pulse number and arrival time
/// relative to that pulse.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct T3Event {
    pub channel: u32,
    pub pulse: i64,
    pub time: i64,
}

/// Common view over t2 and t3 events used by the correlator.
pub trait Photon: Copy + Debug {
    /// Number of histogram axes each non-reference member of a tuple contributes.
    const AXES: usize;

    fn channel(&self) -> u32;

    /// Non-decreasing coordinate bounding the correlation window. Absolute time
    /// for t2, pulse number for t3.
    fn horizon(&self) -> i64;

    /// Appends the offsets of `self` relative to `reference`, one per axis.
    /// Returns false if an offset does not fit in an `i64`; such an offset
    /// lies outside every axis.
    fn offsets_from(&self, reference: &Self, out: &mut Vec<i64>) -> bool;

    /// Axis value for an order 1 histogram, if the record kind has one.
    fn lifetime(&self) -> Option<i64>;
}

impl Photon for T2Event {
    const AXES: usize = 1;

    #[inline]
    fn channel(&self) -> u32 {self.channel}
    #[inline]
    fn horizon(&self) -> i64 {self.time}

    #[inline]
    fn offsets_from(&self, reference: &Self, out: &mut Vec<i64>) -> bool {
        match self.time.checked_sub(reference.time) {
            Some(delta) => {
                out.push(delta);
                true
            }
            None => false,
        }
    }

    fn lifetime(&self) -> Option<i64> {None}
}

impl Photon for T3Event {
    const AXES: usize = 2;

    #[inline]
    fn channel(&self) -> u32 {self.channel}
    #[inline]
    fn horizon(&self) -> i64 {self.pulse}

    #[inline]
    fn offsets_from(&self, reference: &Self, out: &mut Vec<i64>) -> bool {
        match (
            self.pulse.checked_sub(reference.pulse),
            self.time.checked_sub(reference.time),
        ) {
            (Some(pulse), Some(time)) => {
                out.push(pulse);
                out.push(time);
                true
            }
            _ => false,
        }
    }

    fn lifetime(&self) -> Option<i64> {Some(self.time)}
}
