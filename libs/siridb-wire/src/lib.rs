//! Streaming tagged-binary wire codec.
//!
//! `Decoder` is a pull parser: each call to `next()` advances one token and
//! borrows scalars directly out of the input buffer — it never allocates.
//! `Encoder` is the mirror image, appending tokens to a growable buffer
//! without inspecting what it's given.

pub mod decoder;
pub mod encoder;
pub mod tag;

pub use decoder::{Decoder, Token};
pub use encoder::Encoder;
