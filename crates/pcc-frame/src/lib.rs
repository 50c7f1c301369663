#![no_std]
#![forbid(unsafe_code)]

//! Frame formats of the channel.
//!
//! ```text
//! Data frame (21 bits, receiver <- sender)
//! | 1 0 1 0 | SEQ (4) | PAYLOAD (8) | BERGER (5) |
//!
//! Request frame (12 bits, receiver -> sender)
//! | 1 0 1 0 | HAMMING(8,4)(SEQ) |
//! ```
//! All fields are MSB first. The request doubles as the ack for the
//! previous sequence number.

pub mod berger;
pub mod hamming;

use pcc_core::{
    Alphabet, PcError, PcResult, CODE_SIZE, DATA_FRAME_SIZE, DATA_SIZE, INIT_SEQUENCE,
    INIT_SEQ_SIZE, REQUEST_FRAME_SIZE, SEQ_MODULUS, SEQ_NB_SIZE,
};

const SEQ_AT: usize = INIT_SEQ_SIZE;
const DATA_AT: usize = SEQ_AT + SEQ_NB_SIZE;
const CODE_AT: usize = DATA_AT + DATA_SIZE;

/// MSB-first bits of the low `N` bits of `value`.
pub(crate) fn to_bits<const N: usize>(value: u8) -> [u8; N] {
    let mut out = [0u8; N];
    for (i, b) in out.iter_mut().enumerate() {
        *b = (value >> (N - 1 - i)) & 1;
    }
    out
}

pub(crate) fn from_bits(bits: &[u8]) -> u8 {
    bits.iter().fold(0u8, |acc, b| (acc << 1) | (b & 1))
}

pub fn init_ok(bits: &[u8]) -> bool {
    bits.len() >= INIT_SEQ_SIZE && bits[..INIT_SEQ_SIZE] == INIT_SEQUENCE
}

/// Receiver -> sender: "send me `sequence_number`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestFrame {
    pub sequence_number: u8,
}

impl RequestFrame {
    pub fn new(sequence_number: u8) -> Self {
        Self { sequence_number: sequence_number % SEQ_MODULUS }
    }

    pub fn encode(&self) -> [u8; REQUEST_FRAME_SIZE] {
        let mut bits = [0u8; REQUEST_FRAME_SIZE];
        bits[..INIT_SEQ_SIZE].copy_from_slice(&INIT_SEQUENCE);
        let cw = hamming::encode(to_bits::<SEQ_NB_SIZE>(self.sequence_number));
        bits[SEQ_AT..].copy_from_slice(&cw);
        bits
    }

    /// Checks, in order: size, header, then the codeword (no correction).
    pub fn decode(bits: &[u8]) -> PcResult<Self> {
        if bits.len() != REQUEST_FRAME_SIZE {
            return Err(PcError::InvalidFrameSize);
        }
        if !init_ok(bits) {
            return Err(PcError::InvalidInitSequence);
        }
        let mut cw = [0u8; hamming::CODE_BITS];
        cw.copy_from_slice(&bits[SEQ_AT..]);
        let data = hamming::decode(&cw)?;
        Ok(Self { sequence_number: from_bits(&data) })
    }

    /// Acceptance test used while searching bit sizes.
    pub fn looks_valid(bits: &[u8]) -> bool {
        Self::decode(bits).is_ok()
    }
}

/// Sender -> receiver: one payload byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataFrame {
    pub sequence_number: u8,
    pub payload: u8,
}

impl DataFrame {
    pub fn new(sequence_number: u8, payload: u8) -> Self {
        Self { sequence_number: sequence_number % SEQ_MODULUS, payload }
    }

    pub fn encode(&self) -> [u8; DATA_FRAME_SIZE] {
        let mut bits = [0u8; DATA_FRAME_SIZE];
        bits[..INIT_SEQ_SIZE].copy_from_slice(&INIT_SEQUENCE);
        bits[SEQ_AT..DATA_AT].copy_from_slice(&to_bits::<SEQ_NB_SIZE>(self.sequence_number));
        bits[DATA_AT..CODE_AT].copy_from_slice(&to_bits::<DATA_SIZE>(self.payload));
        let code = to_bits::<CODE_SIZE>(berger::count_zeros(&bits[..CODE_AT]));
        bits[CODE_AT..].copy_from_slice(&code);
        bits
    }

    /// Checks, in order: size, Berger code, then header.
    pub fn decode(bits: &[u8]) -> PcResult<Self> {
        if bits.len() != DATA_FRAME_SIZE {
            return Err(PcError::InvalidFrameSize);
        }
        if !berger::valid_code(bits) {
            return Err(PcError::InvalidCode);
        }
        if !init_ok(bits) {
            return Err(PcError::InvalidInitSequence);
        }
        Ok(Self {
            sequence_number: from_bits(&bits[SEQ_AT..DATA_AT]),
            payload: from_bits(&bits[DATA_AT..CODE_AT]),
        })
    }

    /// Payload in the agreed alphabet. Code and header were checked by `decode`.
    pub fn is_valid(&self, alphabet: &Alphabet) -> bool {
        alphabet.contains(self.payload)
    }

    /// Full acceptance test on raw bits: code, header and alphabet.
    pub fn looks_valid(bits: &[u8], alphabet: &Alphabet) -> bool {
        Self::decode(bits).map_or(false, |f| f.is_valid(alphabet))
    }
}

pub fn encode_request(sequence_number: u8) -> [u8; REQUEST_FRAME_SIZE] {
    RequestFrame::new(sequence_number).encode()
}

pub fn decode_request(bits: &[u8]) -> PcResult<RequestFrame> {
    RequestFrame::decode(bits)
}

pub fn encode_data(sequence_number: u8, payload: u8) -> [u8; DATA_FRAME_SIZE] {
    DataFrame::new(sequence_number, payload).encode()
}

pub fn decode_data(bits: &[u8]) -> PcResult<DataFrame> {
    DataFrame::decode(bits)
}
