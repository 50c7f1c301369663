use pcc_core::{Alphabet, PcError, PcResult, SEQ_MODULUS};
use pcc_frame::DataFrame;

/// What one request/answer exchange ended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Payload byte appended.
    Accepted(u8),
    TimedOut,
    Rejected(PcError),
}

/// Receiver-side protocol state. Owned by exactly one session.
#[derive(Debug, Clone, Default)]
pub struct LinkState {
    sequence_number: u8,
    data: Vec<u8>,
    failed_packets: u32,
}

impl LinkState {
    pub fn new(sequence_number: u8) -> Self {
        Self { sequence_number: sequence_number % SEQ_MODULUS, data: Vec::new(), failed_packets: 0 }
    }

    /// Fold the result of one answer window into the state.
    ///
    /// Only a frame carrying the current sequence number and an allowed
    /// payload advances the state. Everything else costs one failure and
    /// leaves the sequence number where it was, so the same request goes out
    /// again.
    pub fn apply(&mut self, answer: PcResult<DataFrame>, alphabet: &Alphabet) -> Outcome {
        let outcome = match answer {
            Ok(frame) if frame.sequence_number == self.sequence_number && frame.is_valid(alphabet) => {
                self.data.push(frame.payload);
                self.sequence_number = (self.sequence_number + 1) % SEQ_MODULUS;
                return Outcome::Accepted(frame.payload);
            }
            Ok(_) => Outcome::Rejected(PcError::InvalidFrame),
            Err(PcError::Timeout) => Outcome::TimedOut,
            Err(e) => Outcome::Rejected(e),
        };
        self.failed_packets += 1;
        outcome
    }

    pub fn sequence_number(&self) -> u8 {
        self.sequence_number
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn failed_packets(&self) -> u32 {
        self.failed_packets
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Statistics of a finished session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionReport {
    pub elapsed_us: u64,
    pub bytes: usize,
    pub bits_per_second: f64,
    pub failed_packets: u32,
}

impl SessionReport {
    pub fn new(elapsed_us: u64, bytes: usize, failed_packets: u32) -> Self {
        let bits_per_second = if elapsed_us == 0 {
            0.0
        } else {
            (bytes as f64 * 8.0) / (elapsed_us as f64 / 1_000_000.0)
        };
        Self { elapsed_us, bytes, bits_per_second, failed_packets }
    }
}
