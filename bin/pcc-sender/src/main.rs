use std::path::PathBuf;
use std::sync::{Arc, atomic::{AtomicBool, Ordering}};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use colored::Colorize;
use log::{info, warn};

use pcc_core::{ChannelConfig, Polarity};
use pcc_hal::TimingSource;
use pcc_link::Responder;
use pcc_linux::{CounterTimer, LinuxClock, PinnedSpammer, SpamTimer};

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Clone, Copy, ValueEnum)]
enum Timer { Spam, Counter }

#[derive(Parser)]
struct Cli {
    /// Text to serve.
    #[arg(long, conflicts_with = "file")] message: Option<String>,
    /// Serve the contents of a file instead.
    #[arg(long)] file: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "spam")] timer: Timer,
    #[arg(long, default_value_t = 256)] batch: usize,
    #[arg(long, default_value_t = 1)] bit_ms: u64,
    #[arg(long, default_value_t = 3)] median: usize,
    #[arg(long)] invert: bool,
    /// Core to pin the listening thread to.
    #[arg(long)] core: Option<usize>,
    #[arg(long)] counter_core: Option<usize>,
    /// Cores to spam from (default: all).
    #[arg(long)] spam_cores: Option<usize>,
}

const DEFAULT_MESSAGE: &str = "The quick brown fox jumps over the lazy dog. ";

fn load_message(cli: &Cli) -> anyhow::Result<Vec<u8>> {
    let message = match (&cli.message, &cli.file) {
        (Some(m), _) => m.clone().into_bytes(),
        (None, Some(path)) => std::fs::read(path)?,
        (None, None) => DEFAULT_MESSAGE.repeat(3).into_bytes(),
    };
    Ok(message)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = ChannelConfig {
        bit_duration: Duration::from_millis(cli.bit_ms),
        median_window: cli.median,
        polarity: if cli.invert { Polarity::AboveIsZero } else { Polarity::AboveIsOne },
        ..ChannelConfig::default()
    };
    config.validate()?;

    let message = load_message(&cli)?;
    let outside = message.iter().filter(|b| !config.alphabet.contains(**b)).count();
    if outside > 0 {
        warn!("{} message bytes are outside the alphabet; the receiver will reject them", outside);
    }

    if let Some(id) = cli.core {
        let core = core_affinity::get_core_ids()
            .and_then(|ids| ids.into_iter().find(|c| c.id == id))
            .ok_or_else(|| anyhow::anyhow!("no core {}", id))?;
        if !core_affinity::set_for_current(core) {
            warn!("Could not pin listener to core {}", id);
        }
    }

    info!(">>> PCC SENDER: {} bytes, {} ms/bit <<<", message.len(), cli.bit_ms);

    let source: Box<dyn TimingSource> = match cli.timer {
        Timer::Spam => Box::new(SpamTimer::new(cli.batch)),
        Timer::Counter => Box::new(CounterTimer::start(cli.batch, cli.counter_core)?),
    };
    let spammer = PinnedSpammer::new(cli.spam_cores)?;
    info!("Answering from {} cores", spammer.cores());

    let mut responder = Responder::new(
        source,
        Box::new(spammer),
        Box::new(LinuxClock::new()),
        config,
        message,
    )?;

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        warn!("Signal received. Stopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let exhausted = responder.run(|| running.load(Ordering::SeqCst))?;
    let stats = responder.stats();
    if exhausted {
        println!("{} all {} bytes served", "DONE".green().bold(), responder.cursor());
    } else {
        println!("{} after {} bytes", "STOPPED".yellow().bold(), responder.cursor());
    }
    println!("sent:     {}", stats.sent);
    println!("resent:   {}", stats.resent);
    println!("ignored:  {}", stats.ignored);
    println!("missed:   {}", stats.missed);
    Ok(())
}
