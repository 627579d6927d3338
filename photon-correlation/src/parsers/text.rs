use std::convert::TryFrom;
use std::io::BufRead;
use std::marker::PhantomData;

use crate::errors::Error;
use crate::{T2Event, T3Event};

/// A record that can be built from one line of comma separated integers.
pub trait TextRecord: Sized {
    const FIELDS: usize;
    fn from_fields(fields: &[i64]) -> Result<Self, String>;
}

fn channel_from(field: i64) -> Result<u32, String> {
    u32::try_from(field).map_err(|_| format!("invalid channel {}", field))
}

impl TextRecord for T2Event {
    const FIELDS: usize = 2;

    fn from_fields(fields: &[i64]) -> Result<Self, String> {
        Ok(T2Event {
            channel: channel_from(fields[0])?,
            time: fields[1],
        })
    }
}

impl TextRecord for T3Event {
    const FIELDS: usize = 3;

    fn from_fields(fields: &[i64]) -> Result<Self, String> {
        Ok(T3Event {
            channel: channel_from(fields[0])?,
            pulse: fields[1],
            time: fields[2],
        })
    }
}

/// Line oriented photon records, `channel,time` for t2 and
/// `channel,pulse,time` for t3. Blank lines are skipped.
pub struct TextStream<R: BufRead, E: TextRecord> {
    source: R,
    line: String,
    fields: Vec<i64>,
    record_count: usize,
    _record: PhantomData<E>,
}

impl<R: BufRead, E: TextRecord> TextStream<R, E> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            line: String::new(),
            fields: Vec::with_capacity(E::FIELDS),
            record_count: 0,
            _record: PhantomData,
        }
    }

    /// Number of records pulled from the source so far.
    pub fn records_read(&self) -> usize {
        self.record_count
    }

    fn parse_line(&mut self) -> Result<E, String> {
        self.fields.clear();
        for field in self.line.trim().split(',') {
            let field = field.trim();
            let value = field
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not an integer", field))?;
            self.fields.push(value);
        }
        if self.fields.len() != E::FIELDS {
            return Err(format!(
                "expected {} fields, found {}",
                E::FIELDS,
                self.fields.len()
            ));
        }
        E::from_fields(&self.fields)
    }
}

impl<R: BufRead, E: TextRecord> Iterator for TextStream<R, E> {
    type Item = Result<E, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.source.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(Error::from(e))),
            }
            if self.line.trim().is_empty() {
                continue;
            }

            self.record_count += 1;
            let record = self.record_count;
            return Some(
                self.parse_line()
                    .map_err(|reason| Error::MalformedRecord { record, reason }),
            );
        }
    }
}
