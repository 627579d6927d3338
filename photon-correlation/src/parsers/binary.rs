const BUFFER_SIZE: usize = 1024 * 16;

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::Error;
use crate::{T2Event, T3Event};

use photon_correlation_proc_macros::make_binary_stream;

/// Fixed size, packed little endian photon records.
pub trait BinaryStream {
    type Record;
    const RECORD_SIZE: usize;
    fn parse_record(record: &[u8]) -> Self::Record;
}

// - - - - - - - - - - - - - - - - - - - - - //
// T2 Record Stream: u32 channel, i64 time   //
// - - - - - - - - - - - - - - - - - - - - - //
#[make_binary_stream(T2, 12)]
fn parse_record(record: &[u8]) -> T2Event {
    T2Event {
        channel: LittleEndian::read_u32(&record[0..4]),
        time: LittleEndian::read_i64(&record[4..12]),
    }
}

// - - - - - - - - - - - - - - - - - - - - - - - - - - //
// T3 Record Stream: u32 channel, i64 pulse, i64 time  //
// - - - - - - - - - - - - - - - - - - - - - - - - - - //
#[make_binary_stream(T3, 20)]
fn parse_record(record: &[u8]) -> T3Event {
    T3Event {
        channel: LittleEndian::read_u32(&record[0..4]),
        pulse: LittleEndian::read_i64(&record[4..12]),
        time: LittleEndian::read_i64(&record[12..20]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Cursor;

    fn t2_bytes(events: &[(u32, i64)]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for &(channel, time) in events {
            bytes.write_u32::<LittleEndian>(channel).unwrap();
            bytes.write_i64::<LittleEndian>(time).unwrap();
        }
        bytes
    }

    #[test]
    fn reads_t2_records() {
        let bytes = t2_bytes(&[(0, 5), (3, -2), (1, 1 << 40)]);
        let mut stream = T2BinaryStream::new(Cursor::new(bytes));
        let events: Vec<T2Event> = stream.by_ref().map(Result::unwrap).collect();
        assert_eq!(
            events,
            vec![
                T2Event { channel: 0, time: 5 },
                T2Event { channel: 3, time: -2 },
                T2Event { channel: 1, time: 1 << 40 },
            ]
        );
        assert_eq!(stream.records_read(), 3);
        assert_eq!(<T2BinaryStream<Cursor<Vec<u8>>> as BinaryStream>::RECORD_SIZE, 12);
    }

    #[test]
    fn reads_t3_records() {
        let mut bytes = Vec::new();
        bytes.write_u32::<LittleEndian>(2).unwrap();
        bytes.write_i64::<LittleEndian>(7).unwrap();
        bytes.write_i64::<LittleEndian>(350).unwrap();
        let events: Vec<T3Event> = T3BinaryStream::new(Cursor::new(bytes))
            .map(Result::unwrap)
            .collect();
        assert_eq!(events, vec![T3Event { channel: 2, pulse: 7, time: 350 }]);
    }

    #[test]
    fn truncated_record_is_malformed() {
        let mut bytes = t2_bytes(&[(0, 5)]);
        bytes.extend_from_slice(&[1, 0, 0]);
        let mut stream = T2BinaryStream::new(Cursor::new(bytes));
        assert!(stream.next().unwrap().is_ok());
        match stream.next() {
            Some(Err(Error::MalformedRecord { record, .. })) => assert_eq!(record, 2),
            other => panic!("expected a malformed record, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(stream.next().is_none());
    }

    struct Trickle(Cursor<Vec<u8>>);

    impl std::io::Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let end = buf.len().min(1);
            std::io::Read::read(&mut self.0, &mut buf[..end])
        }
    }

    #[test]
    fn records_split_across_reads_are_reassembled() {
        let mut bytes = t2_bytes(&[(1, 9), (2, 10)]);
        bytes.push(7);
        let mut stream = T2BinaryStream::new(Trickle(Cursor::new(bytes)));
        assert_eq!(stream.next().unwrap().unwrap(), T2Event { channel: 1, time: 9 });
        assert_eq!(stream.next().unwrap().unwrap(), T2Event { channel: 2, time: 10 });
        assert!(matches!(
            stream.next(),
            Some(Err(Error::MalformedRecord { record: 3, .. }))
        ));
        assert!(stream.next().is_none());
    }

    #[test]
    fn empty_input_has_no_records() {
        assert!(T3BinaryStream::new(Cursor::new(Vec::new())).next().is_none());
    }
}
