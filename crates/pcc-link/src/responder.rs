use log::{debug, error, info, warn};

use pcc_core::{ChannelConfig, PcResult, SEQ_MODULUS};
use pcc_detect::ThresholdSegmenter;
use pcc_frame::{decode_request, DataFrame, RequestFrame};
use pcc_hal::{PlatformClock, Spammer, TimingSource};

use crate::listen::{receive_bits, Window};
use crate::transmit::transmit_frame;

/// What the responder did with one heard request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Next byte of the message.
    Sent(DataFrame),
    /// Same byte again; the receiver missed it.
    Resent(DataFrame),
    /// Neither the current nor the next sequence number.
    Ignored(u8),
    /// The receiver asked past the end of the message.
    Exhausted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponderStats {
    pub sent: usize,
    pub resent: usize,
    pub ignored: usize,
    pub missed: usize,
}

/// Sending endpoint: answers each request with the byte it names.
pub struct Responder {
    source: Box<dyn TimingSource>,
    spammer: Box<dyn Spammer>,
    clock: Box<dyn PlatformClock>,
    config: ChannelConfig,
    message: Vec<u8>,
    next: usize,
    last: Option<u8>,
    stats: ResponderStats,
}

impl Responder {
    pub fn new(
        source: Box<dyn TimingSource>,
        spammer: Box<dyn Spammer>,
        clock: Box<dyn PlatformClock>,
        config: ChannelConfig,
        message: Vec<u8>,
    ) -> PcResult<Self> {
        config.validate()?;
        info!("Responder: {} bytes to serve", message.len());
        Ok(Self {
            source,
            spammer,
            clock,
            config,
            message,
            next: 0,
            last: None,
            stats: ResponderStats::default(),
        })
    }

    /// Decide the answer to a request for `seq`. Moves the cursor only when
    /// the receiver asks for the byte after the last one sent.
    pub fn on_request(&mut self, seq: u8) -> Reply {
        if self.last == Some(seq) {
            if let Some(&byte) = self.next.checked_sub(1).and_then(|i| self.message.get(i)) {
                self.stats.resent += 1;
                return Reply::Resent(DataFrame::new(seq, byte));
            }
        }
        if seq != (self.next % SEQ_MODULUS as usize) as u8 {
            warn!("Responder: unexpected request seq={} (next={})", seq, self.next);
            self.stats.ignored += 1;
            return Reply::Ignored(seq);
        }
        match self.message.get(self.next) {
            Some(&byte) => {
                self.next += 1;
                self.last = Some(seq);
                self.stats.sent += 1;
                Reply::Sent(DataFrame::new(seq, byte))
            }
            None => Reply::Exhausted,
        }
    }

    /// Wait for one request and answer it.
    /// Only recoverable listening errors count as a missed request.
    pub fn step(&mut self) -> PcResult<Reply> {
        let request = match self.wait_request() {
            Ok(request) => request,
            Err(e) => {
                if e.is_recoverable() {
                    self.stats.missed += 1;
                }
                return Err(e);
            }
        };
        let reply = self.on_request(request.sequence_number);
        if let Reply::Sent(frame) | Reply::Resent(frame) = reply {
            debug!("Responder: seq={} payload={:?}", frame.sequence_number, frame.payload as char);
            self.spammer.idle_for(self.config.turnaround);
            transmit_frame(&mut *self.spammer, &frame.encode(), &self.config);
        }
        Ok(reply)
    }

    fn wait_request(&mut self) -> PcResult<RequestFrame> {
        let mut detector = ThresholdSegmenter::from_config(&self.config);
        let window = Window {
            frame_len: self.config.request_frame_size,
            timeout: self.config.request_timeout,
            median_window: self.config.median_window,
        };
        let bits = receive_bits(
            &mut *self.source,
            &*self.clock,
            &mut detector,
            window,
            RequestFrame::looks_valid,
        )?;
        decode_request(&bits)
    }

    /// Serve requests until the message is exhausted or `keep_running` says
    /// stop. True if the receiver asked past the end. Errors a new request
    /// cannot fix end the loop.
    pub fn run<F>(&mut self, mut keep_running: F) -> PcResult<bool>
    where
        F: FnMut() -> bool,
    {
        while keep_running() {
            match self.step() {
                Ok(Reply::Exhausted) => {
                    info!("Responder: message exhausted after {} bytes", self.next);
                    return Ok(true);
                }
                Err(e) if !e.is_recoverable() => {
                    error!("Responder: aborted: {}", e);
                    return Err(e);
                }
                _ => {}
            }
        }
        info!("Responder: stopped, {:?}", self.stats);
        Ok(false)
    }

    /// Bytes handed out so far.
    pub fn cursor(&self) -> usize {
        self.next
    }

    pub fn stats(&self) -> ResponderStats {
        self.stats
    }
}
