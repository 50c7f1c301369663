use core::time::Duration;

use crate::{
    PcError, PcResult, BIT_DURATION_MS, DATA_FRAME_SIZE, DATA_TIMEOUT_MS, DEFAULT_TARGET_LEN,
    REQUEST_FRAME_SIZE, REQUEST_TIMEOUT_MS, TURNAROUND_MS,
};

/// Which side of the threshold carries a 1 bit.
/// Depends on the contention pair in use, so it is never hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    AboveIsOne,
    AboveIsZero,
}

impl Polarity {
    #[inline]
    pub fn bit_for(self, value: f64, threshold: f64) -> u8 {
        let above = value > threshold;
        match self {
            Polarity::AboveIsOne => above as u8,
            Polarity::AboveIsZero => (!above) as u8,
        }
    }

    /// True if `one` sits on the 1-side of `zero` by more than `ratio`.
    #[inline]
    pub fn separates(self, one: f64, zero: f64, ratio: f64) -> bool {
        match self {
            Polarity::AboveIsOne => one > ratio * zero,
            Polarity::AboveIsZero => ratio * one < zero,
        }
    }
}

/// Average number of detector points per bit, split by bit value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitSize {
    pub zero: f64,
    pub one: f64,
}

impl BitSize {
    pub const fn new(zero: f64, one: f64) -> Self {
        Self { zero, one }
    }

    #[inline]
    pub fn get(&self, bit: u8) -> f64 {
        if bit == 0 { self.zero } else { self.one }
    }

    pub fn is_usable(&self) -> bool {
        self.zero > 0.0 && self.one > 0.0 && self.zero.is_finite() && self.one.is_finite()
    }
}

impl Default for BitSize {
    fn default() -> Self {
        Self::new(11.0, 9.0)
    }
}

/// Closed set of payload bytes accepted on top of the checksum.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Alphabet {
    allowed: [bool; 128],
}

impl Alphabet {
    pub const DEFAULT_CHARS: &'static [u8] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ?,!. ";

    pub fn from_bytes(chars: &[u8]) -> Self {
        let mut allowed = [false; 128];
        for &c in chars {
            if (c as usize) < allowed.len() {
                allowed[c as usize] = true;
            }
        }
        Self { allowed }
    }

    #[inline]
    pub fn contains(&self, byte: u8) -> bool {
        (byte as usize) < self.allowed.len() && self.allowed[byte as usize]
    }

    pub fn len(&self) -> usize {
        self.allowed.iter().filter(|a| **a).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::from_bytes(Self::DEFAULT_CHARS)
    }
}

impl core::fmt::Debug for Alphabet {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Alphabet({} chars)", self.len())
    }
}

/// DenStream clustering and detector-integration parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenStreamParams {
    pub lambda: f64,
    pub eps: f64,
    pub beta: f64,
    pub mu: f64,
    /// x = index * index_scale, so time and latency share one metric.
    pub index_scale: f64,
    /// Pre-sync: a new cluster within this ratio of the last one is a split.
    pub merge_ratio: f64,
    /// Pre-sync: minimum 1/0 level ratio for the `101` window.
    pub jump_ratio: f64,
}

impl Default for DenStreamParams {
    fn default() -> Self {
        Self {
            lambda: 0.01,
            eps: 100.0,
            beta: 0.5,
            mu: 3.0,
            index_scale: 20.0,
            merge_ratio: 1.25,
            jump_ratio: 1.40,
        }
    }
}

impl DenStreamParams {
    pub fn validate(&self) -> PcResult<()> {
        if !(self.lambda >= 0.0) || !(self.eps > 0.0) || !(self.index_scale >= 0.0) {
            return Err(PcError::InvalidConfig);
        }
        // tp = ln(βμ / (βμ - 1)) / λ is only defined above 1.
        if !(self.beta * self.mu > 1.0) {
            return Err(PcError::InvalidConfig);
        }
        if !(self.merge_ratio >= 1.0) || !(self.jump_ratio >= 1.0) {
            return Err(PcError::InvalidConfig);
        }
        Ok(())
    }
}

/// Threshold detector tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdParams {
    pub jmp_threshold: f64,
    /// Closed segments this short are folded into their neighbour.
    pub merge_spike: usize,
    /// Bounds on a preamble segment's point count.
    pub min_spike: usize,
    pub max_spike: usize,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self { jmp_threshold: 1200.0, merge_spike: 2, min_spike: 5, max_spike: 20 }
    }
}

impl ThresholdParams {
    pub fn validate(&self) -> PcResult<()> {
        if self.min_spike > self.max_spike || !self.jmp_threshold.is_finite() {
            return Err(PcError::InvalidConfig);
        }
        // A preamble segment must never be short enough to smooth away.
        if self.merge_spike >= self.min_spike {
            return Err(PcError::InvalidConfig);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectorKind {
    #[default]
    Threshold,
    DenStream,
}

/// Everything a channel endpoint needs, passed explicitly to constructors.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    pub bit_duration: Duration,
    pub data_timeout: Duration,
    pub request_timeout: Duration,
    /// Pause between hearing a request and answering it.
    pub turnaround: Duration,
    pub data_frame_size: usize,
    pub request_frame_size: usize,
    pub target_len: usize,
    pub median_window: usize,
    /// Idle bits sent ahead of every frame.
    pub guard_bits: usize,
    pub polarity: Polarity,
    pub detector: DetectorKind,
    pub initial_bit_size: BitSize,
    pub denstream: DenStreamParams,
    pub threshold: ThresholdParams,
    pub alphabet: Alphabet,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            bit_duration: Duration::from_millis(BIT_DURATION_MS),
            data_timeout: Duration::from_millis(DATA_TIMEOUT_MS),
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_MS),
            turnaround: Duration::from_millis(TURNAROUND_MS),
            data_frame_size: DATA_FRAME_SIZE,
            request_frame_size: REQUEST_FRAME_SIZE,
            target_len: DEFAULT_TARGET_LEN,
            median_window: 3,
            guard_bits: 1,
            polarity: Polarity::default(),
            detector: DetectorKind::default(),
            initial_bit_size: BitSize::default(),
            denstream: DenStreamParams::default(),
            threshold: ThresholdParams::default(),
            alphabet: Alphabet::default(),
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> PcResult<()> {
        if self.bit_duration.is_zero() || self.median_window == 0 {
            return Err(PcError::InvalidConfig);
        }
        if self.data_frame_size != DATA_FRAME_SIZE || self.request_frame_size != REQUEST_FRAME_SIZE {
            return Err(PcError::InvalidConfig);
        }
        if !self.initial_bit_size.is_usable() {
            return Err(PcError::InvalidConfig);
        }
        self.denstream.validate()?;
        self.threshold.validate()
    }
}
