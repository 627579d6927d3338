use std::io::{Seek, Write};
use std::ops::Range;

use ndarray::{Array1, ArrayD, IxDyn};
use ndarray_npy::NpzWriter;
use tracing::debug;

use crate::correlation_tools::limits::Axis;
use crate::correlation_tools::permutations::Combinations;
use crate::errors::Error;

/// Axes of a histogram and which of them belong to each tuple member.
///
/// `members[i]` is the range of `axes` filled by the offsets of member `i`
/// relative to member 0. Member 0 owns no axes except in order 1 histograms,
/// where it owns all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub axes: Vec<Axis>,
    pub members: Vec<Range<usize>>,
}

impl Layout {
    /// `order - 1` members after the reference, each owning `per_member` axes
    /// cycling through `member_axes`.
    pub fn correlation(order: usize, member_axes: &[Axis]) -> Self {
        let per_member = member_axes.len();
        let mut axes = Vec::with_capacity(per_member * order.saturating_sub(1));
        let mut members = vec![0..0];
        for member in 1..order {
            axes.extend_from_slice(member_axes);
            members.push((member - 1) * per_member..member * per_member);
        }
        Self { axes, members }
    }

    /// A single member whose own value fills every axis.
    pub fn standalone(axes: Vec<Axis>) -> Self {
        let members = vec![0..axes.len()];
        Self { axes, members }
    }

    pub fn order(&self) -> usize {
        self.members.len()
    }
}

/// Counting tables for every channel tuple of a correlation.
///
/// There are `channels ^ order` tables, stored in the order [`Combinations`]
/// enumerates channel tuples, each shaped by the axis slot counts.
pub struct Histogram {
    channels: u32,
    layout: Layout,
    tables: Vec<ArrayD<u64>>,
    bins: Vec<usize>,
}

impl Histogram {
    pub fn new(channels: u32, layout: Layout) -> Result<Self, Error> {
        let order = layout.order();
        let n_tables = Combinations::new(order, channels as usize)
            .total()
            .ok_or_else(|| Error::Allocation(format!("{}^{} histograms", channels, order)))?;
        let shape: Vec<usize> = layout.axes.iter().map(Axis::slots).collect();
        let cells = shape
            .iter()
            .try_fold(1usize, |acc, &slots| acc.checked_mul(slots))
            .ok_or_else(|| Error::Allocation(format!("a histogram of shape {:?}", shape)))?;
        debug!(n_tables, ?shape, "Allocating histograms");

        let mut tables = Vec::new();
        tables
            .try_reserve_exact(n_tables)
            .map_err(|_| Error::Allocation(format!("{} histograms", n_tables)))?;
        for _ in 0..n_tables {
            let mut counts: Vec<u64> = Vec::new();
            counts
                .try_reserve_exact(cells)
                .map_err(|_| Error::Allocation(format!("a histogram of {} cells", cells)))?;
            counts.resize(cells, 0);
            let table = ArrayD::from_shape_vec(IxDyn(&shape), counts)
                .map_err(|e| Error::Allocation(format!("a histogram of shape {:?}: {}", shape, e)))?;
            tables.push(table);
        }

        Ok(Self {
            channels,
            bins: vec![0; layout.axes.len()],
            layout,
            tables,
        })
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    pub fn order(&self) -> usize {
        self.layout.order()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[inline(always)]
    fn table_index(&self, channels: &[u32]) -> Option<usize> {
        if channels.len() != self.order() {
            return None;
        }
        channels.iter().try_fold(0usize, |acc, &channel| {
            if channel < self.channels {
                Some(acc * self.channels as usize + channel as usize)
            } else {
                None
            }
        })
    }

    /// Counts one correlation. Returns false, without counting, if a channel
    /// has no table or any offset falls outside its axis.
    #[inline]
    pub fn record(&mut self, channels: &[u32], offsets: &[i64]) -> bool {
        let table = match self.table_index(channels) {
            Some(table) => table,
            None => return false,
        };
        if offsets.len() != self.layout.axes.len() {
            return false;
        }

        for (slot, (axis, &offset)) in self.layout.axes.iter().zip(offsets).enumerate() {
            match axis.to_bin(offset) {
                Some(bin) => self.bins[slot] = bin,
                None => return false,
            }
        }

        self.tables[table][IxDyn(&self.bins)] += 1;
        true
    }

    /// Table for a channel tuple, if it exists.
    pub fn table(&self, channels: &[u32]) -> Option<&ArrayD<u64>> {
        self.table_index(channels).map(|index| &self.tables[index])
    }

    pub fn total(&self) -> u64 {
        self.tables.iter().map(|table| table.sum()).sum()
    }

    /// Writes one line per channel tuple and bin, including empty bins.
    ///
    /// A line starts with channel 0 followed by the `lower,upper` bounds of any
    /// axes member 0 owns, then a `channel,lower,upper,...` group per further
    /// member, and ends with the count.
    pub fn write_records<W: Write>(&self, mut out: W) -> Result<(), Error> {
        let mut line = String::new();
        for (channels, table) in Combinations::new(self.order(), self.channels as usize).zip(&self.tables) {
            for (bins, count) in table.indexed_iter() {
                line.clear();
                for (member, channel) in channels.iter().enumerate() {
                    if member > 0 {
                        line.push(',');
                    }
                    line.push_str(&channel.to_string());
                    for axis in self.layout.members[member].clone() {
                        let (lower, upper) = self.layout.axes[axis].bounds(bins[axis]);
                        line.push_str(&format!(",{},{}", lower, upper));
                    }
                }
                writeln!(out, "{},{}", line, count)?;
            }
        }
        out.flush()?;
        Ok(())
    }

    /// Dumps every table, named by its channel tuple (`0_1`, ...), together
    /// with the slot bounds of each axis (`lower_<axis>`, `upper_<axis>`).
    pub fn write_npz<W: Write + Seek>(&self, writer: W) -> Result<(), Error> {
        let mut npz = NpzWriter::new(writer);
        for (channels, table) in Combinations::new(self.order(), self.channels as usize).zip(&self.tables) {
            let name = channels
                .iter()
                .map(|channel| channel.to_string())
                .collect::<Vec<_>>()
                .join("_");
            npz.add_array(name, table)?;
        }
        for (index, axis) in self.layout.axes.iter().enumerate() {
            let (lower, upper): (Vec<f64>, Vec<f64>) =
                (0..axis.slots()).map(|slot| axis.bounds(slot)).unzip();
            npz.add_array(format!("lower_{}", index), &Array1::from(lower))?;
            npz.add_array(format!("upper_{}", index), &Array1::from(upper))?;
        }
        npz.finish()?;
        Ok(())
    }
}
