use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::str::FromStr;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{App, Arg, ArgMatches};
use tracing::{info, Level};

use photon_correlation::errors::Error;
use photon_correlation::modes::Mode;
use photon_correlation::options::DEFAULT_QUEUE_SIZE;
use photon_correlation::{histogram, Options};

fn parse_value<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match matches.value_of(name) {
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid --{} '{}': {}", name, value, e)),
        None => Ok(None),
    }
}

fn required<T>(matches: &ArgMatches, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_value(matches, name)?.ok_or_else(|| anyhow!("Missing --{}", name))
}

fn parse_channel_list(list: &str) -> Result<Vec<u32>> {
    list.split(',')
        .map(str::trim)
        .filter(|channel| !channel.is_empty())
        .map(|channel| {
            channel
                .parse::<u32>()
                .with_context(|| format!("Invalid channel '{}' in --suppress", channel))
        })
        .collect()
}

fn options_from(matches: &ArgMatches) -> Result<Options> {
    let mode: Mode = required(matches, "mode")?;
    let mut options = Options::new(
        mode,
        required(matches, "channels")?,
        required(matches, "order")?,
        required(matches, "time")?,
    );

    options.pulse_limits = parse_value(matches, "pulse")?;
    if let Some(scale) = parse_value(matches, "time-scale")? {
        options.time_scale = scale;
    }
    if let Some(scale) = parse_value(matches, "pulse-scale")? {
        options.pulse_scale = scale;
    }
    options.queue_size = parse_value(matches, "queue-size")?.unwrap_or(DEFAULT_QUEUE_SIZE);
    options.max_time_distance = parse_value(matches, "max-time-distance")?;
    options.min_time_distance = parse_value(matches, "min-time-distance")?.unwrap_or(0);
    options.max_pulse_distance = parse_value(matches, "max-pulse-distance")?;
    options.min_pulse_distance = parse_value(matches, "min-pulse-distance")?.unwrap_or(0);
    options.positive_only = matches.is_present("positive-only");
    options.start_stop = matches.is_present("start-stop");
    if let Some(list) = matches.value_of("suppress") {
        options.suppressed_channels = parse_channel_list(list)?;
    }
    options.binary_in = matches.is_present("binary-in");
    options.print_every = parse_value(matches, "print-every")?.unwrap_or(0);
    Ok(options)
}

fn cli() -> App<'static, 'static> {
    App::new("photon-gn")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Streaming multi-channel photon correlation histograms")
        .arg(Arg::with_name("file-in").short("i").long("file-in").takes_value(true)
            .help("Input records, stdin if absent"))
        .arg(Arg::with_name("file-out").short("o").long("file-out").takes_value(true)
            .help("Histogram destination, stdout if absent"))
        .arg(Arg::with_name("mode").short("m").long("mode").takes_value(true).required(true)
            .possible_values(&["t2", "t3"])
            .help("Record mode"))
        .arg(Arg::with_name("channels").short("c").long("channels").takes_value(true).required(true)
            .help("Number of detector channels"))
        .arg(Arg::with_name("order").short("g").long("order").takes_value(true).default_value("2")
            .help("Number of photons per correlation"))
        .arg(Arg::with_name("time").short("t").long("time").takes_value(true).required(true)
            .allow_hyphen_values(true)
            .help("Time axis as lower,bins,upper"))
        .arg(Arg::with_name("pulse").short("p").long("pulse").takes_value(true)
            .allow_hyphen_values(true)
            .help("Pulse axis as lower,bins,upper (t3, order 2 and above)"))
        .arg(Arg::with_name("time-scale").long("time-scale").takes_value(true)
            .help("linear, log or log-zero"))
        .arg(Arg::with_name("pulse-scale").long("pulse-scale").takes_value(true)
            .help("linear, log or log-zero"))
        .arg(Arg::with_name("queue-size").short("q").long("queue-size").takes_value(true)
            .help("Most photons held in the correlation window"))
        .arg(Arg::with_name("max-time-distance").long("max-time-distance").takes_value(true))
        .arg(Arg::with_name("min-time-distance").long("min-time-distance").takes_value(true))
        .arg(Arg::with_name("max-pulse-distance").long("max-pulse-distance").takes_value(true))
        .arg(Arg::with_name("min-pulse-distance").long("min-pulse-distance").takes_value(true))
        .arg(Arg::with_name("positive-only").long("positive-only")
            .help("Count only the arrival ordering of each correlation"))
        .arg(Arg::with_name("start-stop").long("start-stop")
            .help("Correlate each photon only with the photons right before it"))
        .arg(Arg::with_name("suppress").long("suppress").takes_value(true)
            .help("Comma separated channels to ignore"))
        .arg(Arg::with_name("binary-in").long("binary-in")
            .help("Read packed little endian records"))
        .arg(Arg::with_name("npz").long("npz").takes_value(true)
            .help("Also write the histogram as an npz archive"))
        .arg(Arg::with_name("print-every").long("print-every").takes_value(true)
            .help("Log progress every this many records"))
        .arg(Arg::with_name("verbose").short("v").long("verbose"))
}

pub fn main() -> Result<()> {
    let matches = cli().get_matches();

    let level = if matches.is_present("verbose") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();

    let options = options_from(&matches)?;

    let input: Box<dyn Read> = match matches.value_of("file-in") {
        Some(path) => Box::new(File::open(path).map_err(|_| Error::FileNotAvailable(path.to_string()))?),
        None => Box::new(io::stdin()),
    };

    let start = Instant::now();
    let result = histogram(input, &options).context("Correlation failed")?;
    info!("elapsed {:?}", start.elapsed());

    let output: Box<dyn Write> = match matches.value_of("file-out") {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Could not create {}", path))?,
        ),
        None => Box::new(io::stdout()),
    };
    result
        .histogram
        .write_records(BufWriter::new(output))
        .context("Could not write the histogram")?;

    if let Some(path) = matches.value_of("npz") {
        let archive = File::create(path).with_context(|| format!("Could not create {}", path))?;
        result
            .histogram
            .write_npz(archive)
            .with_context(|| format!("Could not write {}", path))?;
    }
    Ok(())
}
