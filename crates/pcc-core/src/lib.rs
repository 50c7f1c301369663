#![no_std]
#[cfg(feature = "std")]
extern crate std;

pub mod config;

pub use config::{
    Alphabet, BitSize, ChannelConfig, DenStreamParams, DetectorKind, Polarity, ThresholdParams,
};

// Frame geometry (bits)
pub const DATA_FRAME_SIZE: usize = 21;
pub const REQUEST_FRAME_SIZE: usize = 12;
pub const INIT_SEQ_SIZE: usize = 4;
pub const SEQ_NB_SIZE: usize = 4;
pub const DATA_SIZE: usize = 8;
pub const CODE_SIZE: usize = 5;

/// The `1010` header opening every frame.
pub const INIT_SEQUENCE: [u8; INIT_SEQ_SIZE] = [1, 0, 1, 0];

/// Sequence numbers live in 4 bits.
pub const SEQ_MODULUS: u8 = 16;

// Protocol time (ms)
pub const BIT_DURATION_MS: u64 = 1;
pub const DATA_TIMEOUT_MS: u64 = 70;
pub const REQUEST_TIMEOUT_MS: u64 = 50;
pub const TURNAROUND_MS: u64 = 2;

/// Bytes moved before a session reports its statistics.
pub const DEFAULT_TARGET_LEN: usize = 100;

/// One latency measurement. `index` is an ordinal, not a timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub index: u64,
    pub value: f64,
}

impl Sample {
    pub const fn new(index: u64, value: f64) -> Self {
        Self { index, value }
    }
}

pub type PcResult<T> = Result<T, PcError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcError {
    // Recoverable: each one costs a retransmission.
    InvalidFrameSize,
    InvalidInitSequence,
    InvalidCode,
    InvalidFrame,
    Timeout,
    // Contract violations: reported, never retried.
    InvalidConfig,
    ShapeMismatch,
    HalError,
}

impl PcError {
    /// True for the errors the link layer answers with a retransmission.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PcError::InvalidFrameSize
                | PcError::InvalidInitSequence
                | PcError::InvalidCode
                | PcError::InvalidFrame
                | PcError::Timeout
        )
    }
}

impl core::fmt::Display for PcError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PcError {}
