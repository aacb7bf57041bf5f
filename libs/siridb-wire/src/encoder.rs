use crate::tag::{self, raw_len};
use tracing::trace;

/// Appends tokens to a growable buffer. Mirrors `Decoder` one-for-one but
/// never inspects contents — it just writes what it's told.
#[derive(Debug, Default)]
pub struct Encoder {
    buf: Vec<u8>,
}

impl Encoder {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            buf: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8> {
        trace!(len = self.buf.len(), "finished encoding wire payload");
        self.buf
    }

    pub fn push_int(&mut self, value: i64) -> &mut Self {
        self.buf.push(tag::INT64);
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn push_double(&mut self, value: f64) -> &mut Self {
        self.buf.push(tag::DOUBLE);
        self.buf.extend_from_slice(&value.to_bits().to_be_bytes());
        self
    }

    /// Length-prefixed raw bytes, choosing the smallest length marker that
    /// fits.
    pub fn push_raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.push(tag::RAW);
        let len = data.len();
        if len as u64 <= raw_len::INLINE_MAX as u64 {
            self.buf.push(len as u8);
        } else if len <= u16::MAX as usize {
            self.buf.push(raw_len::LEN16);
            self.buf.extend_from_slice(&(len as u16).to_be_bytes());
        } else {
            self.buf.push(raw_len::LEN32);
            self.buf.extend_from_slice(&(len as u32).to_be_bytes());
        }
        self.buf.extend_from_slice(data);
        self
    }

    /// Zero-terminated raw bytes. Cheaper than `push_raw` for short,
    /// non-null-containing strings (series names) since it skips the length
    /// computation/marker choice. Caller must ensure `data` contains no
    /// `0x00` byte.
    pub fn push_raw_term(&mut self, data: &[u8]) -> &mut Self {
        debug_assert!(
            !data.contains(&0),
            "push_raw_term data must not contain a NUL byte"
        );
        self.buf.push(tag::RAW);
        self.buf.push(raw_len::TERMINATED);
        self.buf.extend_from_slice(data);
        self.buf.push(0);
        self
    }

    /// Fixed-arity array header (arity `1..=5`). Panics on out-of-range
    /// arity — this is a programmer error, not malformed input, since the
    /// arity is always a compile-time-known constant at call sites.
    pub fn open_array_fixed(&mut self, arity: usize) -> &mut Self {
        let t = tag::tag_for_arity(arity)
            .unwrap_or_else(|| panic!("fixed array arity must be 1..=5, got {arity}"));
        self.buf.push(t);
        self
    }

    pub fn open_array(&mut self) -> &mut Self {
        self.buf.push(tag::ARRAY_OPEN);
        self
    }

    pub fn close_array(&mut self) -> &mut Self {
        self.buf.push(tag::ARRAY_CLOSE);
        self
    }

    pub fn open_map(&mut self) -> &mut Self {
        self.buf.push(tag::MAP_OPEN);
        self
    }

    pub fn close_map(&mut self) -> &mut Self {
        self.buf.push(tag::MAP_CLOSE);
        self
    }

    pub fn push_end(&mut self) -> &mut Self {
        self.buf.push(tag::END);
        self
    }
}
