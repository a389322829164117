// Bit and byte helpers
//
// Small pure functions shared by the CPU, PPU and mappers for 8/16-bit
// masking, sign handling and flag packing.

/// Truncate to the low 8 bits.
#[inline]
pub const fn to_byte(value: u16) -> u8 {
    (value & 0xFF) as u8
}

/// Reinterpret an 8-bit value as two's complement.
#[inline]
pub const fn to_signed_byte(value: u8) -> i8 {
    value as i8
}

/// Reinterpret a signed 8-bit value as its raw byte.
#[inline]
pub const fn from_signed_byte(value: i8) -> u8 {
    value as u8
}

/// Build a 16-bit word from its high and low bytes.
#[inline]
pub const fn build_u16(high: u8, low: u8) -> u16 {
    ((high as u16) << 8) | low as u16
}

#[inline]
pub const fn high_byte(value: u16) -> u8 {
    (value >> 8) as u8
}

#[inline]
pub const fn low_byte(value: u16) -> u8 {
    (value & 0xFF) as u8
}

/// Whether bit `n` of `value` is set.
#[inline]
pub const fn get_bit(value: u8, n: u8) -> bool {
    value & (1 << n) != 0
}

/// Return `value` with bit `n` forced to `state`.
#[inline]
pub const fn set_bit(value: u8, n: u8, state: bool) -> u8 {
    if state {
        value | (1 << n)
    } else {
        value & !(1 << n)
    }
}

/// Extract `size` bits starting at bit `start`.
#[inline]
pub const fn get_bits(value: u8, start: u8, size: u8) -> u8 {
    (value >> start) & ((1u16 << size) - 1) as u8
}

/// Replace `size` bits starting at bit `start` with the low bits of `bits`.
#[inline]
pub const fn set_bits(value: u8, start: u8, size: u8, bits: u8) -> u8 {
    let mask = (((1u16 << size) - 1) as u8) << start;
    (value & !mask) | ((bits << start) & mask)
}

/// Whether two addresses lie in different 256-byte pages.
#[inline]
pub const fn crosses_page(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}
