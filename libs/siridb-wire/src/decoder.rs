use crate::tag::{self, raw_len};
use siridb_errors::WireError;
use tracing::trace;

/// One decoded token. `Raw` borrows directly from the decoder's input
/// buffer — the decoder never allocates for scalars.
///
/// The borrow is tied to the input buffer's lifetime `'a`, not to the
/// `Decoder` itself, so a caller can hold decoded `Raw` slices alongside a
/// `Decoder` that has since advanced past them (see design note in
/// spec.md §9: "tie slice lifetimes to the decoded-message value").
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
    Int(i64),
    Double(f64),
    Raw(&'a [u8]),
    /// Fixed-arity array header, arity in `1..=5`.
    Array(usize),
    ArrayOpen,
    ArrayClose,
    MapOpen,
    MapClose,
    End,
}

impl<'a> Token<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            Token::Int(_) => "INT64",
            Token::Double(_) => "DOUBLE",
            Token::Raw(_) => "RAW",
            Token::Array(_) => "ARRAYn",
            Token::ArrayOpen => "ARRAY_OPEN",
            Token::ArrayClose => "ARRAY_CLOSE",
            Token::MapOpen => "MAP_OPEN",
            Token::MapClose => "MAP_CLOSE",
            Token::End => "END",
        }
    }
}

/// Pull parser over a byte slice.
///
/// `next()` advances exactly one token per call. Truncated input, an
/// unrecognized tag byte, or a length field that runs past the end of the
/// buffer all fail with `WireError`; the decoder never panics on malformed
/// input.
pub struct Decoder<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Decoder<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        trace!(len = buf.len(), "decoding wire payload");
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(n).ok_or(WireError::StructureUnderflow)?;
        if end > self.buf.len() {
            return Err(WireError::TruncatedInput);
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn take_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    /// Decode the next token.
    pub fn next(&mut self) -> Result<Token<'a>, WireError> {
        let tag = self.take_u8()?;
        match tag {
            tag::INT64 => {
                let bytes = self.take(8)?;
                let arr: [u8; 8] = bytes.try_into().expect("take(8) returns 8 bytes");
                Ok(Token::Int(i64::from_be_bytes(arr)))
            }
            tag::DOUBLE => {
                let bytes = self.take(8)?;
                let arr: [u8; 8] = bytes.try_into().expect("take(8) returns 8 bytes");
                Ok(Token::Double(f64::from_bits(u64::from_be_bytes(arr))))
            }
            tag::RAW => self.decode_raw(),
            tag::ARRAY_OPEN => Ok(Token::ArrayOpen),
            tag::ARRAY_CLOSE => Ok(Token::ArrayClose),
            tag::MAP_OPEN => Ok(Token::MapOpen),
            tag::MAP_CLOSE => Ok(Token::MapClose),
            tag::END => Ok(Token::End),
            t => {
                if let Some(arity) = tag::array_arity(t) {
                    Ok(Token::Array(arity))
                } else {
                    trace!(tag = t, "unknown tag byte");
                    Err(WireError::UnknownTag(t))
                }
            }
        }
    }

    fn decode_raw(&mut self) -> Result<Token<'a>, WireError> {
        let marker = self.take_u8()?;
        let len = match marker {
            0..=raw_len::INLINE_MAX => marker as usize,
            raw_len::LEN16 => {
                let b = self.take(2)?;
                u16::from_be_bytes([b[0], b[1]]) as usize
            }
            raw_len::LEN32 => {
                let b = self.take(4)?;
                u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize
            }
            raw_len::TERMINATED => {
                let start = self.pos;
                let rel = self.buf[start..]
                    .iter()
                    .position(|&b| b == 0)
                    .ok_or(WireError::TruncatedInput)?;
                self.pos = start + rel + 1; // consume terminator too
                return Ok(Token::Raw(&self.buf[start..start + rel]));
            }
            other => return Err(WireError::UnknownTag(other)),
        };
        Ok(Token::Raw(self.take(len)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Encoder;

    #[test]
    fn decodes_int_and_double() {
        let mut enc = Encoder::new();
        enc.push_int(-42);
        enc.push_double(3.5);
        let buf = enc.into_inner();

        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::Int(-42));
        assert_eq!(dec.next().unwrap(), Token::Double(3.5));
        assert!(dec.is_empty());
    }

    #[test]
    fn decodes_raw_inline_and_long() {
        let mut enc = Encoder::new();
        enc.push_raw(b"cpu.load");
        let long = vec![b'x'; 400];
        enc.push_raw(&long);
        let buf = enc.into_inner();

        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::Raw(b"cpu.load"));
        assert_eq!(dec.next().unwrap(), Token::Raw(long.as_slice()));
    }

    #[test]
    fn decodes_raw_term() {
        let mut enc = Encoder::new();
        enc.push_raw_term(b"cpu.load");
        let buf = enc.into_inner();

        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::Raw(b"cpu.load"));
        assert!(dec.is_empty());
    }

    #[test]
    fn truncated_input_is_malformed() {
        let buf = [tag::INT64, 0x00, 0x00];
        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next(), Err(WireError::TruncatedInput));
    }

    #[test]
    fn unknown_tag_is_malformed() {
        let buf = [0x77];
        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next(), Err(WireError::UnknownTag(0x77)));
    }

    #[test]
    fn fixed_array_header() {
        let mut enc = Encoder::new();
        enc.open_array_fixed(2);
        let buf = enc.into_inner();
        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::Array(2));
    }

    #[test]
    fn open_close_map_and_array() {
        let mut enc = Encoder::new();
        enc.open_map();
        enc.open_array();
        enc.close_array();
        enc.close_map();
        let buf = enc.into_inner();

        let mut dec = Decoder::new(&buf);
        assert_eq!(dec.next().unwrap(), Token::MapOpen);
        assert_eq!(dec.next().unwrap(), Token::ArrayOpen);
        assert_eq!(dec.next().unwrap(), Token::ArrayClose);
        assert_eq!(dec.next().unwrap(), Token::MapClose);
    }
}
