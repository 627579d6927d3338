use std::io::{BufReader, Read};

use tracing::{debug, info, warn};

use crate::correlation_tools::histogram::Histogram;
use crate::correlation_tools::permutations::Permutations;
use crate::correlation_tools::windowed_queue::WindowedQueue;
use crate::errors::Error;
use crate::modes::Mode;
use crate::options::Options;
use crate::parsers::{T2BinaryStream, T3BinaryStream, TextStream};
use crate::{Photon, T2Event, T3Event};

/// Counters reported at the end of a run.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Records read from the input.
    pub events: u64,
    /// Records ignored because of their channel.
    pub dropped: u64,
    /// Sets of photons that passed the distance bounds.
    pub tuples: u64,
    /// Orderings of those sets that landed inside the histogram.
    pub counted: u64,
}

/// Result from a correlation run
pub struct HistogramResult {
    pub histogram: Histogram,
    pub summary: Summary,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Priming,
    Steady,
    Draining,
    Done,
}

struct Correlator<E: Photon> {
    order: usize,
    channels: u32,
    suppressed: Vec<bool>,
    min_distance: i64,
    max_distance: i64,
    start_stop: bool,
    print_every: u64,
    permutations: Permutations,
    queue: WindowedQueue<E>,
    histogram: Histogram,
    // scratch space reused for every tuple
    subset: Vec<u64>,
    members: Vec<E>,
    member_channels: Vec<u32>,
    offsets: Vec<i64>,
    state: State,
    last_horizon: Option<i64>,
    truncation_reported: bool,
    summary: Summary,
}

impl<E: Photon> Correlator<E> {
    fn new(options: &Options) -> Result<Self, Error> {
        let order = options.order;
        let histogram = Histogram::new(options.channels, options.layout()?)?;
        // Order 1 histograms never look back.
        let capacity = if order > 1 { options.queue_size } else { 1 };
        let queue = WindowedQueue::allocate(capacity)?;
        let permutations = Permutations::new(order, options.positive_only || options.start_stop)?;
        let (min_distance, max_distance) = options.distance_bounds();
        debug!(capacity, min_distance, max_distance, "Correlator ready");

        let mut suppressed = vec![false; options.channels as usize];
        for &channel in &options.suppressed_channels {
            if let Some(flag) = suppressed.get_mut(channel as usize) {
                *flag = true;
            }
        }

        Ok(Self {
            order,
            channels: options.channels,
            suppressed,
            min_distance,
            max_distance,
            start_stop: options.start_stop,
            print_every: options.print_every,
            permutations,
            queue,
            histogram,
            subset: Vec::with_capacity(order),
            members: Vec::with_capacity(order),
            member_channels: Vec::with_capacity(order),
            offsets: Vec::with_capacity(order * E::AXES),
            state: State::Priming,
            last_horizon: None,
            truncation_reported: false,
            summary: Summary::default(),
        })
    }

    fn transition(&mut self, state: State) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "Correlator state change");
            self.state = state;
        }
    }

    fn run<I>(mut self, records: I) -> Result<HistogramResult, Error>
    where
        I: Iterator<Item = Result<E, Error>>,
    {
        for record in records {
            self.process(record?)?;
        }

        self.transition(State::Draining);
        while self.queue.pop_front().is_some() {}
        self.transition(State::Done);

        Ok(HistogramResult {
            histogram: self.histogram,
            summary: self.summary,
        })
    }

    fn process(&mut self, event: E) -> Result<(), Error> {
        self.summary.events += 1;
        if self.print_every > 0 && self.summary.events % self.print_every == 0 {
            info!(
                records = self.summary.events,
                counted = self.summary.counted,
                "Processed records"
            );
        }

        let horizon = event.horizon();
        if let Some(last) = self.last_horizon {
            if horizon < last {
                return Err(Error::MalformedRecord {
                    record: self.summary.events as usize,
                    reason: format!("coordinate {} goes back from {}", horizon, last),
                });
            }
        }
        self.last_horizon = Some(horizon);

        let channel = event.channel();
        if channel >= self.channels || self.suppressed[channel as usize] {
            self.summary.dropped += 1;
            return Ok(());
        }

        if self.order == 1 {
            self.transition(State::Steady);
            if let Some(time) = event.lifetime() {
                self.summary.tuples += 1;
                if self.histogram.record(&[channel], &[time]) {
                    self.summary.counted += 1;
                }
            }
            return Ok(());
        }

        while let Some(front) = self.queue.front() {
            match horizon.checked_sub(front.horizon()) {
                Some(distance) if distance <= self.max_distance => break,
                _ => {
                    self.queue.pop_front();
                }
            }
        }
        if self.queue.push(event).is_some() && !self.truncation_reported {
            warn!(
                capacity = self.queue.capacity(),
                "Correlation window is full, dropping photons before they leave the distance range"
            );
            self.truncation_reported = true;
        }

        if self.queue.len() < self.order {
            self.transition(State::Priming);
            return Ok(());
        }
        self.transition(State::Steady);
        self.correlate();
        Ok(())
    }

    /// Counts every tuple that ends in the newest entry of the window.
    fn correlate(&mut self) {
        let newest = match self.queue.back() {
            Some(&event) => event,
            None => return,
        };
        let others = (self.order - 1) as u64;
        let newest_index = self.queue.right_index() - 1;
        let first = if self.start_stop {
            newest_index - others
        } else {
            self.queue.left_index()
        };

        self.subset.clear();
        self.subset.extend(first..first + others);
        loop {
            self.count_subset(newest);
            if self.start_stop || !advance_subset(&mut self.subset, newest_index) {
                break;
            }
        }
    }

    fn count_subset(&mut self, newest: E) {
        self.members.clear();
        for &index in &self.subset {
            self.members.push(*self.queue.get(index));
        }
        self.members.push(newest);

        let span = newest.horizon().saturating_sub(self.members[0].horizon());
        if span < self.min_distance {
            return;
        }
        self.summary.tuples += 1;

        for permutation in self.permutations.iter() {
            let reference = self.members[permutation[0]];
            self.member_channels.clear();
            self.offsets.clear();
            for &member in permutation {
                self.member_channels.push(self.members[member].channel());
            }
            let mut representable = true;
            for &member in &permutation[1..] {
                if !self.members[member].offsets_from(&reference, &mut self.offsets) {
                    representable = false;
                    break;
                }
            }
            if representable && self.histogram.record(&self.member_channels, &self.offsets) {
                self.summary.counted += 1;
            }
        }
    }
}

/// Steps a strictly increasing set of indices drawn from `[subset[0], end)`
/// to the next one in lexicographic order. Returns false once exhausted.
fn advance_subset(subset: &mut [u64], end: u64) -> bool {
    let size = subset.len() as u64;
    for position in (0..subset.len()).rev() {
        let ceiling = end - (size - position as u64);
        if subset[position] < ceiling {
            subset[position] += 1;
            for next in position + 1..subset.len() {
                subset[next] = subset[next - 1] + 1;
            }
            return true;
        }
    }
    false
}

fn log_summary(result: &HistogramResult) {
    let summary = &result.summary;
    info!(
        events = summary.events,
        dropped = summary.dropped,
        tuples = summary.tuples,
        counted = summary.counted,
        "Correlation finished"
    );
}

/// Builds the correlation histogram of a stream of photon records.
///
/// The records are read once, text or packed binary according to
/// `options.binary_in`, and must be sorted by time (t2) or pulse (t3). The
/// histogram is only returned after the whole stream has been consumed.
pub fn histogram<R: Read>(input: R, options: &Options) -> Result<HistogramResult, Error> {
    options.validate()?;
    info!(
        mode = %options.mode,
        channels = options.channels,
        order = options.order,
        time = %options.time_limits,
        "Starting correlation"
    );

    let result = match (options.mode, options.binary_in) {
        (Mode::T2, false) => {
            Correlator::<T2Event>::new(options)?.run(TextStream::new(BufReader::new(input)))
        }
        (Mode::T3, false) => {
            Correlator::<T3Event>::new(options)?.run(TextStream::new(BufReader::new(input)))
        }
        (Mode::T2, true) => Correlator::<T2Event>::new(options)?.run(T2BinaryStream::new(input)),
        (Mode::T3, true) => Correlator::<T3Event>::new(options)?.run(T3BinaryStream::new(input)),
    }?;

    log_summary(&result);
    Ok(result)
}
