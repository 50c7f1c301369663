use std::path::{Path, PathBuf};
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{info, warn};

use pcc_core::{ChannelConfig, DetectorKind, Polarity};
use pcc_detect::{build_detector, Detector};
use pcc_frame::{decode_data, DataFrame};
use pcc_hal::TimingSource;
use pcc_link::{receive_bits, Receiver, Window};
use pcc_linux::{CounterTimer, LinuxClock, PinnedSpammer, ReplaySource, SpamTimer};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Clone, Copy, ValueEnum)]
enum DetectorChoice { Threshold, Denstream }

#[derive(Clone, Copy, ValueEnum)]
enum Timer { Spam, Counter }

#[derive(Parser)]
struct Cli {
    /// Bytes to receive before reporting.
    #[arg(long, default_value_t = 100)] bytes: usize,
    #[arg(long, value_enum, default_value = "threshold")] detector: DetectorChoice,
    #[arg(long, value_enum, default_value = "spam")] timer: Timer,
    /// Kernel rounds per latency sample.
    #[arg(long, default_value_t = 256)] batch: usize,
    #[arg(long, default_value_t = 1)] bit_ms: u64,
    #[arg(long, default_value_t = 3)] median: usize,
    /// Contention lowers the measured value on this host pair.
    #[arg(long)] invert: bool,
    /// Core to pin the listening thread to.
    #[arg(long)] core: Option<usize>,
    /// Core for the counter thread (counter timer only).
    #[arg(long)] counter_core: Option<usize>,
    /// Cores to spam requests from (default: all).
    #[arg(long)] spam_cores: Option<usize>,
    /// Decode one recorded data frame from a timings file and exit.
    #[arg(long)] replay: Option<PathBuf>,
}

fn config_from(cli: &Cli) -> ChannelConfig {
    ChannelConfig {
        bit_duration: Duration::from_millis(cli.bit_ms),
        target_len: cli.bytes,
        median_window: cli.median,
        polarity: if cli.invert { Polarity::AboveIsZero } else { Polarity::AboveIsOne },
        detector: match cli.detector {
            DetectorChoice::Threshold => DetectorKind::Threshold,
            DetectorChoice::Denstream => DetectorKind::DenStream,
        },
        ..ChannelConfig::default()
    }
}

fn replay(path: &Path, config: &ChannelConfig) -> anyhow::Result<()> {
    let mut source = ReplaySource::open(path)?;
    info!("Replay: {} samples from {}", source.len(), path.display());

    let clock = LinuxClock::new();
    let mut detector: Box<dyn Detector> = build_detector(config)?;
    let window = Window {
        frame_len: config.data_frame_size,
        timeout: config.data_timeout,
        median_window: config.median_window,
    };
    let alphabet = config.alphabet;
    let bits = receive_bits(&mut source, &clock, &mut *detector, window, |b| {
        DataFrame::looks_valid(b, &alphabet)
    })?;

    let shown: String = bits.iter().map(|b| char::from(b'0' + b)).collect();
    println!("bits:      {}", shown);
    println!("threshold: {:.1}", detector.threshold());
    println!("bit size:  {:.1}/{:.1}", detector.bit_size().zero, detector.bit_size().one);
    match decode_data(&bits) {
        Ok(frame) if frame.is_valid(&alphabet) => println!(
            "{} seq={} payload={:?}",
            "FRAME".green().bold(), frame.sequence_number, frame.payload as char
        ),
        Ok(frame) => println!(
            "{} seq={} payload=0x{:02x} (outside alphabet)",
            "FRAME".yellow().bold(), frame.sequence_number, frame.payload
        ),
        Err(e) => println!("{} {}", "REJECTED".red().bold(), e),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = config_from(&cli);
    config.validate()?;

    if let Some(id) = cli.core {
        let core = core_affinity::get_core_ids()
            .and_then(|ids| ids.into_iter().find(|c| c.id == id))
            .ok_or_else(|| anyhow::anyhow!("no core {}", id))?;
        if !core_affinity::set_for_current(core) {
            warn!("Could not pin listener to core {}", id);
        }
    }

    if let Some(path) = &cli.replay {
        return replay(path, &config);
    }

    info!(">>> PCC RECEIVER: {} bytes, {} ms/bit <<<", cli.bytes, cli.bit_ms);

    let source: Box<dyn TimingSource> = match cli.timer {
        Timer::Spam => Box::new(SpamTimer::new(cli.batch)),
        Timer::Counter => Box::new(CounterTimer::start(cli.batch, cli.counter_core)?),
    };
    let spammer = PinnedSpammer::new(cli.spam_cores)?;
    info!("Spamming requests from {} cores", spammer.cores());

    let mut receiver =
        Receiver::new(source, Box::new(spammer), Box::new(LinuxClock::new()), config)?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Signal received. Stopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let report = receiver.run(|| running.load(Ordering::SeqCst))?;
    let text = String::from_utf8_lossy(receiver.state().data()).into_owned();
    println!("{} {}", "RECEIVED".green().bold(), text);

    let report = report.unwrap_or_else(|| receiver.report());
    println!("elapsed:  {:.3} s", report.elapsed_us as f64 / 1e6);
    println!("bytes:    {}", report.bytes);
    println!("bitrate:  {:.1} bit/s", report.bits_per_second);
    println!("failed:   {}", report.failed_packets.to_string().yellow());
    Ok(())
}
