//! Wire tag bytes.
//!
//! One byte precedes every value on the wire identifying its shape. Array
//! arity tags `ARRAY1..ARRAY5` exist as a size optimization over
//! `ARRAY_OPEN`/`ARRAY_CLOSE` for the overwhelmingly common case of small
//! fixed-size tuples (points are always `ARRAY2`).

pub const INT64: u8 = 0x01;
pub const DOUBLE: u8 = 0x02;
pub const RAW: u8 = 0x03;

pub const ARRAY1: u8 = 0x10;
pub const ARRAY2: u8 = 0x11;
pub const ARRAY3: u8 = 0x12;
pub const ARRAY4: u8 = 0x13;
pub const ARRAY5: u8 = 0x14;

pub const ARRAY_OPEN: u8 = 0x20;
pub const ARRAY_CLOSE: u8 = 0x21;
pub const MAP_OPEN: u8 = 0x22;
pub const MAP_CLOSE: u8 = 0x23;

pub const END: u8 = 0xFF;

/// Arity encoded by a fixed-size array tag, or `None` if not one.
pub fn array_arity(tag: u8) -> Option<usize> {
    match tag {
        ARRAY1 => Some(1),
        ARRAY2 => Some(2),
        ARRAY3 => Some(3),
        ARRAY4 => Some(4),
        ARRAY5 => Some(5),
        _ => None,
    }
}

/// Tag for a fixed array of the given arity (1..=5), if representable.
pub fn tag_for_arity(n: usize) -> Option<u8> {
    match n {
        1 => Some(ARRAY1),
        2 => Some(ARRAY2),
        3 => Some(ARRAY3),
        4 => Some(ARRAY4),
        5 => Some(ARRAY5),
        _ => None,
    }
}

/// RAW length-marker bytes. Values `0x00..=0xF9` in the marker position
/// encode their own length directly (0-249 bytes inline, no further bytes).
pub mod raw_len {
    /// Inline lengths occupy marker bytes `0x00..=INLINE_MAX`.
    pub const INLINE_MAX: u8 = 0xF9;
    /// Marker: length is a big-endian `u16` immediately following.
    pub const LEN16: u8 = 0xFA;
    /// Marker: length is a big-endian `u32` immediately following.
    pub const LEN32: u8 = 0xFB;
    /// Marker: value is terminated by a `0x00` byte rather than length-prefixed
    /// (the `push_raw_term` shortcut — used for series names).
    pub const TERMINATED: u8 = 0xFC;
}
