//! Extended Hamming (8,4) code over bit arrays.
//!
//! Layout: `p0 p1 d0 p3 d1 d2 d3 p7`. The code can locate a single flip,
//! but the link layer only ever uses it to detect: a misplaced segment
//! boundary looks exactly like a flip.

use pcc_core::{PcError, PcResult};

pub const DATA_BITS: usize = 4;
pub const CODE_BITS: usize = 8;

pub type Codeword = [u8; CODE_BITS];

const DATA_POS: [usize; DATA_BITS] = [2, 4, 5, 6];

pub fn encode(data: [u8; DATA_BITS]) -> Codeword {
    let [d0, d1, d2, d3] = data.map(|b| b & 1);
    let mut cw = [0u8; CODE_BITS];
    cw[2] = d0;
    cw[4] = d1;
    cw[5] = d2;
    cw[6] = d3;
    cw[0] = d0 ^ d1 ^ d3;
    cw[1] = d0 ^ d2 ^ d3;
    cw[3] = d1 ^ d2 ^ d3;
    cw[7] = cw[..7].iter().fold(0, |acc, b| acc ^ b);
    cw
}

/// Position check results as a 1-based index into bits 0..7; 0 if clean.
pub fn syndrome(cw: &Codeword) -> u8 {
    let s0 = cw[3] ^ cw[4] ^ cw[5] ^ cw[6];
    let s1 = cw[1] ^ cw[2] ^ cw[5] ^ cw[6];
    let s2 = cw[0] ^ cw[2] ^ cw[4] ^ cw[6];
    (s0 & 1) << 2 | (s1 & 1) << 1 | (s2 & 1)
}

fn overall_parity(cw: &Codeword) -> u8 {
    cw.iter().fold(0, |acc, b| acc ^ (b & 1))
}

/// 0: clean. 1: overall parity broken (one flip, or any odd number).
/// 2: parity holds but a position check fails (two flips or more).
pub fn error_count(cw: &Codeword) -> u8 {
    match (syndrome(cw), overall_parity(cw)) {
        (0, 0) => 0,
        (_, 1) => 1,
        _ => 2,
    }
}

/// Flip the bit a single error points at. A zero syndrome blames `p7`.
pub fn correct_single(cw: &mut Codeword) {
    match syndrome(cw) {
        0 => cw[7] ^= 1,
        s => cw[(s - 1) as usize] ^= 1,
    }
}

/// Data bits of a clean codeword. Anything else is `InvalidCode`.
pub fn decode(cw: &Codeword) -> PcResult<[u8; DATA_BITS]> {
    if error_count(cw) != 0 {
        return Err(PcError::InvalidCode);
    }
    Ok(DATA_POS.map(|p| cw[p]))
}
