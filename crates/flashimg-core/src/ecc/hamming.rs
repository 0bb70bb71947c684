//! Hamming ECC over 256-byte spans
//!
//! This is the classic software ECC used by Linux MTD and U-Boot for small
//! page NAND: 22 parity bits (16 line parities, 6 column parities) stored in
//! 3 bytes, able to correct a single bit error and detect double bit errors
//! per 256 bytes.
//!
//! Byte layout of the result:
//! - byte 0: inverted line parities LP7..LP0
//! - byte 1: inverted line parities LP15..LP8
//! - byte 2: inverted column parities CP5..CP0 in bits 7..2, bits 1..0 set

/// Number of data bytes covered by one ECC group
pub const ECC_SPAN: usize = 256;

/// Number of ECC bytes produced per span
pub const ECC_BYTES: usize = 3;

/// Per-byte column parity lookup
///
/// Bits 0..5 hold CP0..CP5 for the byte value, bit 6 holds the parity of
/// the whole byte.
static COLUMN_PARITY: [u8; 256] = build_column_parity();

const fn parity(value: u8) -> u8 {
    (value.count_ones() & 1) as u8
}

const fn build_column_parity() -> [u8; 256] {
    // Bit groups covered by CP0..CP5
    const MASKS: [u8; 6] = [0x55, 0xAA, 0x33, 0xCC, 0x0F, 0xF0];

    let mut table = [0u8; 256];
    let mut value = 0;
    while value < 256 {
        let byte = value as u8;
        let mut entry = 0u8;
        let mut i = 0;
        while i < MASKS.len() {
            entry |= parity(byte & MASKS[i]) << (i as u32);
            i += 1;
        }
        entry |= parity(byte) << 6;
        table[value] = entry;
        value += 1;
    }
    table
}

/// Interleave the two line parity accumulators into the first two ECC bytes
fn interleave(reg2: u8, reg3: u8) -> [u8; 2] {
    let mut out = [0u8; 2];
    let mut a = 0x80u8;
    for byte in out.iter_mut() {
        let mut b = 0x80u8;
        for _ in 0..4 {
            if reg3 & a != 0 {
                *byte |= b;
            }
            b >>= 1;
            if reg2 & a != 0 {
                *byte |= b;
            }
            b >>= 1;
            a >>= 1;
        }
    }
    out
}

/// Compute the 3 ECC bytes of a 256-byte span
pub fn calculate(span: &[u8; ECC_SPAN]) -> [u8; ECC_BYTES] {
    let mut reg1 = 0u8;
    let mut reg2 = 0u8;
    let mut reg3 = 0u8;

    for (index, &byte) in span.iter().enumerate() {
        let entry = COLUMN_PARITY[byte as usize];
        reg1 ^= entry & 0x3F;
        if entry & 0x40 != 0 {
            reg3 ^= index as u8;
            reg2 ^= !(index as u8);
        }
    }

    let [lp_low, lp_high] = interleave(reg2, reg3);
    [!lp_low, !lp_high, ((!reg1) << 2) | 0x03]
}
