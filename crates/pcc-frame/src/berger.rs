use pcc_core::CODE_SIZE;

/// Bits covered by the code: header, sequence number and payload.
pub const COVERED_BITS: usize = 16;

pub fn count_zeros(bits: &[u8]) -> u8 {
    bits.iter().filter(|b| **b == 0).count() as u8
}

/// 5-bit MSB-first count of zeros in `bits`.
pub fn encode(bits: &[u8; COVERED_BITS]) -> [u8; CODE_SIZE] {
    crate::to_bits(count_zeros(bits))
}

/// True if the trailing code matches the zero count of the first 16 bits.
/// Too-short input is never valid.
pub fn valid_code(frame: &[u8]) -> bool {
    if frame.len() < COVERED_BITS + CODE_SIZE {
        return false;
    }
    let code = crate::from_bits(&frame[COVERED_BITS..COVERED_BITS + CODE_SIZE]);
    code == count_zeros(&frame[..COVERED_BITS])
}
