use std::io::Cursor;

use byteorder::{LittleEndian, WriteBytesExt};
use ndarray::{Array1, ArrayD, IxDyn};
use ndarray_npy::NpzReader;

use photon_correlation::correlation_tools::limits::Scale;
use photon_correlation::errors::Error;
use photon_correlation::modes::Mode;
use photon_correlation::{histogram, Options};

fn render(input: &[u8], options: &Options) -> String {
    let result = histogram(input, options).unwrap();
    let mut out = Vec::new();
    result.histogram.write_records(&mut out).unwrap();
    String::from_utf8(out).unwrap()
}

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[test]
fn t2_pairs_between_two_channels() {
    let options = Options::new(Mode::T2, 2, 2, "0,4,4".parse().unwrap());
    let text = render(b"0,0\n1,1\n0,2\n1,5\n", &options);
    assert_eq!(
        lines(&text),
        vec![
            "0,0,0,1,0", "0,0,1,2,0", "0,0,2,3,1", "0,0,3,4,0",
            "0,1,0,1,0", "0,1,1,2,1", "0,1,2,3,0", "0,1,3,4,1",
            "1,0,0,1,0", "1,0,1,2,1", "1,0,2,3,0", "1,0,3,4,0",
            "1,1,0,1,0", "1,1,1,2,0", "1,1,2,3,0", "1,1,3,4,0",
        ]
    );
}

#[test]
fn t3_order_one_is_a_lifetime_histogram() {
    let options = Options::new(Mode::T3, 2, 1, "0,4,8".parse().unwrap());
    let text = render(b"0,0,1\n0,1,3\n1,2,5\n0,3,9\n", &options);
    assert_eq!(
        lines(&text),
        vec![
            "0,0,2,1", "0,2,4,1", "0,4,6,0", "0,6,8,0",
            "1,0,2,0", "1,2,4,0", "1,4,6,1", "1,6,8,0",
        ]
    );
}

#[test]
fn t3_pairs_report_pulse_and_time_bounds() {
    let mut options = Options::new(Mode::T3, 1, 2, "0,2,10".parse().unwrap());
    options.pulse_limits = Some("-0.5,1,0.5".parse().unwrap());
    options.positive_only = true;
    let text = render(b"0,7,1\n0,7,8\n", &options);
    assert_eq!(lines(&text), vec!["0,0,-0.5,0.5,0,5,0", "0,0,-0.5,0.5,5,10,1"]);
}

#[test]
fn identical_runs_give_identical_output() {
    let mut options = Options::new(Mode::T2, 3, 3, "-20,8,20".parse().unwrap());
    options.max_time_distance = Some(15);
    let mut input = String::new();
    for i in 0..200i64 {
        input.push_str(&format!("{},{}\n", i % 3, i * 7 / 3));
    }

    let first = render(input.as_bytes(), &options);
    let second = render(input.as_bytes(), &options);
    assert_eq!(first, second);
    assert!(first.lines().any(|line| !line.ends_with(",0")));
}

#[test]
fn binary_and_text_inputs_agree() {
    let events: Vec<(u32, i64, i64)> = (0..60)
        .map(|i| ((i % 2) as u32, i / 4, (i * 13) % 50))
        .collect();

    let mut text = String::new();
    let mut binary = Vec::new();
    for &(channel, pulse, time) in &events {
        text.push_str(&format!("{},{},{}\n", channel, pulse, time));
        binary.write_u32::<LittleEndian>(channel).unwrap();
        binary.write_i64::<LittleEndian>(pulse).unwrap();
        binary.write_i64::<LittleEndian>(time).unwrap();
    }

    let mut options = Options::new(Mode::T3, 2, 2, "-50,10,50".parse().unwrap());
    options.pulse_limits = Some("-2.5,5,2.5".parse().unwrap());
    let from_text = render(text.as_bytes(), &options);
    options.binary_in = true;
    let from_binary = render(&binary, &options);
    assert_eq!(from_text, from_binary);
}

#[test]
fn malformed_input_is_reported() {
    let options = Options::new(Mode::T2, 2, 2, "0,4,4".parse().unwrap());
    assert!(matches!(
        histogram(&b"0,0\n1,1\n1\n"[..], &options),
        Err(Error::MalformedRecord { record: 3, .. })
    ));

    let mut binary = Options::new(Mode::T2, 2, 2, "0,4,4".parse().unwrap());
    binary.binary_in = true;
    assert!(matches!(
        histogram(&[0u8; 13][..], &binary),
        Err(Error::MalformedRecord { record: 2, .. })
    ));
}

#[test]
fn npz_export_contains_every_table() {
    let mut options = Options::new(Mode::T3, 2, 2, "0,2,10".parse().unwrap());
    options.pulse_limits = Some("-0.5,1,0.5".parse().unwrap());
    let result = histogram(&b"0,3,1\n1,3,8\n"[..], &options).unwrap();
    let mut archive = Cursor::new(Vec::new());
    result.histogram.write_npz(&mut archive).unwrap();

    let mut npz = NpzReader::new(Cursor::new(archive.into_inner())).unwrap();
    let mut names = npz.names().unwrap();
    names.sort();
    assert_eq!(
        names,
        vec!["0_0", "0_1", "1_0", "1_1", "lower_0", "lower_1", "upper_0", "upper_1"]
    );

    let forward: ArrayD<u64> = npz.by_name("0_1").unwrap();
    assert_eq!(forward.shape(), &[1, 2]);
    assert_eq!(forward[IxDyn(&[0, 1])], 1);
    assert_eq!(forward.sum(), 1);
    let backward: ArrayD<u64> = npz.by_name("1_0").unwrap();
    assert_eq!(backward.sum(), 0);

    let pulse_lower: Array1<f64> = npz.by_name("lower_0").unwrap();
    let time_upper: Array1<f64> = npz.by_name("upper_1").unwrap();
    assert_eq!(pulse_lower.to_vec(), vec![-0.5]);
    assert_eq!(time_upper.to_vec(), vec![5.0, 10.0]);
}

#[test]
fn log_zero_axis_keeps_zero_delays_apart() {
    let mut options = Options::new(Mode::T2, 1, 2, "1,2,4".parse().unwrap());
    options.time_scale = Scale::LogZero;
    options.positive_only = true;
    let text = render(b"0,0\n0,0\n0,3\n0,3\n", &options);
    let rows = lines(&text);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0], "0,0,0,0,2");
    let counts: Vec<&str> = rows.iter().map(|row| row.rsplit(',').next().unwrap()).collect();
    assert_eq!(counts, vec!["2", "0", "4"]);
    assert!(rows[1].starts_with("0,0,1,"));
}
