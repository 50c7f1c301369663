//! Stop-and-wait link over the timing channel.
//!
//! The receiver drives: it requests a sequence number, listens for the data
//! frame, and requests the same number again until a valid frame for it
//! arrives. The request for `n + 1` acknowledges `n`.

pub mod listen;
pub mod responder;
pub mod session;
pub mod transmit;

pub use listen::{listen, receive_bits, Window};
pub use responder::{Reply, Responder, ResponderStats};
pub use session::{LinkState, Outcome, SessionReport};
pub use transmit::transmit_frame;

use log::{debug, error, info, warn};

use pcc_core::{ChannelConfig, PcResult};
use pcc_detect::build_detector;
use pcc_frame::{decode_data, encode_request, DataFrame};
use pcc_hal::{PlatformClock, Spammer, TimingSource};

/// Receiving endpoint: owns its collaborators and the protocol state.
pub struct Receiver {
    source: Box<dyn TimingSource>,
    spammer: Box<dyn Spammer>,
    clock: Box<dyn PlatformClock>,
    config: ChannelConfig,
    state: LinkState,
    started_us: u64,
}

impl Receiver {
    pub fn new(
        source: Box<dyn TimingSource>,
        spammer: Box<dyn Spammer>,
        clock: Box<dyn PlatformClock>,
        config: ChannelConfig,
    ) -> PcResult<Self> {
        config.validate()?;
        let started_us = clock.now_us();
        info!(
            "Receiver: detector={:?} target={} bytes bit={:?}",
            config.detector, config.target_len, config.bit_duration
        );
        Ok(Self { source, spammer, clock, config, state: LinkState::default(), started_us })
    }

    /// Start from a sequence number other than 0.
    pub fn with_sequence(mut self, sequence_number: u8) -> Self {
        self.state = LinkState::new(sequence_number);
        self
    }

    /// One exchange: request the current sequence number, wait for the
    /// answer, fold it into the state.
    ///
    /// Errors that a retransmission cannot fix (`HalError`, `InvalidConfig`,
    /// `ShapeMismatch`) are returned and leave the state untouched.
    pub fn step(&mut self) -> PcResult<Outcome> {
        let seq = self.state.sequence_number();
        let request = encode_request(seq);
        debug!("Receiver: request seq={}", seq);
        transmit_frame(&mut *self.spammer, &request, &self.config);

        let answer = match self.wait_answer() {
            Err(e) if !e.is_recoverable() => {
                error!("Receiver: seq={} aborted: {}", seq, e);
                return Err(e);
            }
            answer => answer,
        };
        let outcome = self.state.apply(answer, &self.config.alphabet);
        match outcome {
            Outcome::Accepted(byte) => {
                debug!("Receiver: seq={} payload={:?}", seq, byte as char);
            }
            Outcome::TimedOut => warn!("Receiver: seq={} timed out", seq),
            Outcome::Rejected(e) => warn!("Receiver: seq={} rejected: {}", seq, e),
        }
        Ok(outcome)
    }

    fn wait_answer(&mut self) -> PcResult<DataFrame> {
        let mut detector = build_detector(&self.config)?;
        let window = Window {
            frame_len: self.config.data_frame_size,
            timeout: self.config.data_timeout,
            median_window: self.config.median_window,
        };
        let alphabet = self.config.alphabet;
        let bits = receive_bits(
            &mut *self.source,
            &*self.clock,
            &mut *detector,
            window,
            |bits| DataFrame::looks_valid(bits, &alphabet),
        )?;
        decode_data(&bits)
    }

    /// Exchange until `target_len` bytes arrived or `keep_running` says stop.
    /// Returns the statistics only for a completed session. A non-recoverable
    /// error ends the session early.
    pub fn run<F>(&mut self, mut keep_running: F) -> PcResult<Option<SessionReport>>
    where
        F: FnMut() -> bool,
    {
        self.started_us = self.clock.now_us();
        while self.state.data().len() < self.config.target_len {
            if !keep_running() {
                info!("Receiver: stopped after {} bytes", self.state.data().len());
                return Ok(None);
            }
            self.step()?;
        }
        let report = self.report();
        info!(
            "Receiver: {} bytes in {} us, {:.1} bit/s, {} failed",
            report.bytes, report.elapsed_us, report.bits_per_second, report.failed_packets
        );
        Ok(Some(report))
    }

    pub fn state(&self) -> &LinkState {
        &self.state
    }

    /// Statistics so far, measured from the start of the last `run`.
    pub fn report(&self) -> SessionReport {
        let elapsed = self.clock.now_us().saturating_sub(self.started_us);
        SessionReport::new(elapsed, self.state.data().len(), self.state.failed_packets())
    }
}
