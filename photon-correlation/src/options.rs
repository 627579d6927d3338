use crate::correlation_tools::histogram::Layout;
use crate::correlation_tools::limits::{Axis, Limits, Scale};
use crate::errors::Error;
use crate::modes::Mode;

pub const DEFAULT_QUEUE_SIZE: usize = 1024 * 1024;

/// Parameters of a correlation histogram run
///
/// # Parameters
///    - mode: Encoding of the input records, t2 or t3
///    - channels: Number of detector channels, records on channels at or above it are dropped
///    - order: Number of photons per correlation
///    - time_limits / time_scale: Binning of time delays (t2) or pulse relative times (t3)
///    - pulse_limits / pulse_scale: Binning of pulse delays, t3 with order > 1 only
///    - queue_size: Most photons held in the correlation window
///    - max/min_time_distance: Bounds on the time span of a t2 correlation.
///      The maximum defaults to the span the time limits can cover.
///    - max/min_pulse_distance: Bounds on the pulse span of a t3 correlation.
///      The maximum defaults to the span the pulse limits can cover.
///    - positive_only: Count only the arrival ordering of each correlation
///    - start_stop: Correlate each photon only with the photons right before it
///    - suppressed_channels: Channels whose photons are ignored
///    - binary_in: Read packed little endian records instead of text
///    - print_every: Log progress every this many records, 0 disables it
#[derive(Debug, Clone)]
pub struct Options {
    pub mode: Mode,
    pub channels: u32,
    pub order: usize,
    pub time_limits: Limits,
    pub time_scale: Scale,
    pub pulse_limits: Option<Limits>,
    pub pulse_scale: Scale,
    pub queue_size: usize,
    pub max_time_distance: Option<i64>,
    pub min_time_distance: i64,
    pub max_pulse_distance: Option<i64>,
    pub min_pulse_distance: i64,
    pub positive_only: bool,
    pub start_stop: bool,
    pub suppressed_channels: Vec<u32>,
    pub binary_in: bool,
    pub print_every: u64,
}

impl Options {
    /// Options with every optional knob at its default.
    pub fn new(mode: Mode, channels: u32, order: usize, time_limits: Limits) -> Self {
        Self {
            mode,
            channels,
            order,
            time_limits,
            time_scale: Scale::Linear,
            pulse_limits: None,
            pulse_scale: Scale::Linear,
            queue_size: DEFAULT_QUEUE_SIZE,
            max_time_distance: None,
            min_time_distance: 0,
            max_pulse_distance: None,
            min_pulse_distance: 0,
            positive_only: false,
            start_stop: false,
            suppressed_channels: Vec::new(),
            binary_in: false,
            print_every: 0,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.channels == 0 {
            return Err(Error::InvalidConfiguration(String::from(
                "At least one channel is required",
            )));
        }
        if self.order == 0 {
            return Err(Error::InvalidConfiguration(String::from(
                "The correlation order must be at least 1",
            )));
        }
        if self.mode == Mode::T2 && self.order == 1 {
            return Err(Error::InvalidConfiguration(String::from(
                "Order 1 histograms are only defined for t3 data",
            )));
        }
        if self.order > 1 && self.queue_size < self.order {
            return Err(Error::InvalidConfiguration(format!(
                "A queue of {} photons cannot hold an order {} correlation",
                self.queue_size, self.order
            )));
        }
        if let Some(&channel) = self.suppressed_channels.iter().find(|&&c| c >= self.channels) {
            return Err(Error::InvalidConfiguration(format!(
                "Cannot suppress channel {}, there are only {} channels",
                channel, self.channels
            )));
        }

        let (min_distance, max_distance) = self.distance_bounds();
        if min_distance < 0 || max_distance < min_distance {
            return Err(Error::InvalidConfiguration(format!(
                "Invalid correlation distance bounds [{}, {}]",
                min_distance, max_distance
            )));
        }

        self.layout().map(|_| ())
    }

    /// Axes the histogram is built from.
    pub fn layout(&self) -> Result<Layout, Error> {
        let time = Axis::new(self.time_limits, self.time_scale)?;
        match self.mode {
            Mode::T2 => Ok(Layout::correlation(self.order, &[time])),
            Mode::T3 if self.order == 1 => Ok(Layout::standalone(vec![time])),
            Mode::T3 => {
                let pulse_limits = self.pulse_limits.ok_or_else(|| {
                    Error::InvalidConfiguration(String::from(
                        "t3 correlations of order 2 and above need pulse limits",
                    ))
                })?;
                let pulse = Axis::new(pulse_limits, self.pulse_scale)?;
                Ok(Layout::correlation(self.order, &[pulse, time]))
            }
        }
    }

    /// Inclusive `(min, max)` span allowed between the oldest and newest
    /// photon of a correlation, measured in time for t2 and pulses for t3.
    pub fn distance_bounds(&self) -> (i64, i64) {
        match self.mode {
            Mode::T2 => {
                let max = self
                    .max_time_distance
                    .unwrap_or_else(|| self.default_max_distance(&self.time_limits));
                (self.min_time_distance, max)
            }
            Mode::T3 => {
                let max = match (self.max_pulse_distance, self.pulse_limits) {
                    (Some(max), _) => max,
                    (None, Some(limits)) => self.default_max_distance(&limits),
                    (None, None) => 0,
                };
                (self.min_pulse_distance, max)
            }
        }
    }

    /// Widest span whose offsets can all land on `limits`. When every ordering
    /// is counted from order 3 up, the reference may sit between the oldest and
    /// newest photon, so the span reaches the full axis width.
    fn default_max_distance(&self, limits: &Limits) -> i64 {
        let middle_reference = self.order > 2 && !(self.positive_only || self.start_stop);
        let span = if middle_reference {
            limits.upper - limits.lower
        } else {
            limits.reach()
        };
        span.ceil() as i64
    }
}
