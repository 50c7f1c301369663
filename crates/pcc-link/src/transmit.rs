use pcc_core::ChannelConfig;
use pcc_hal::Spammer;

/// Put a frame on the line: `guard_bits` of silence so the listener sees a
/// clean edge into the header, then one bit duration per bit.
pub fn transmit_frame(spammer: &mut dyn Spammer, bits: &[u8], config: &ChannelConfig) {
    if config.guard_bits > 0 {
        spammer.idle_for(config.bit_duration * config.guard_bits as u32);
    }
    spammer.transmit(bits, config.bit_duration);
}
