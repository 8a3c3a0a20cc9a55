//! Decoding and encoding of Base 64.
//!
//! The Base 64 encoding is defined in [RFC 4648]. Only the original
//! *base64* alphabet is supported. It is what TSIG secrets and public key
//! pins are written in.
//!
//! [RFC 4648]: https://tools.ietf.org/html/rfc4648

use bytes::{BufMut, Bytes, BytesMut};
use core::fmt;

//------------ Convenience Functions -----------------------------------------

/// Decodes a string with *base64* encoded data.
///
/// The function attempts to decode the entire string.
pub fn decode(s: &str) -> Result<Bytes, DecodeError> {
    let mut decoder = Decoder::new();
    for ch in s.chars() {
        decoder.push(ch)?;
    }
    decoder.finalize()
}

/// Encodes binary data in *base64* and returns the encoded data as a string.
pub fn encode_string<B: AsRef<[u8]> + ?Sized>(bytes: &B) -> String {
    let bytes = bytes.as_ref();
    let mut res = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let group = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let sextets = [
            group[0] >> 2,
            (group[0] & 0x03) << 4 | group[1] >> 4,
            (group[1] & 0x0F) << 2 | group[2] >> 6,
            group[2] & 0x3F,
        ];
        for (i, sextet) in sextets.iter().enumerate() {
            if i <= chunk.len() {
                res.push(char::from(ENCODE_ALPHABET[usize::from(*sextet)]));
            } else {
                res.push(PAD);
            }
        }
    }
    res
}

//------------ Decoder -------------------------------------------------------

/// A base 64 decoder.
///
/// This type keeps all the state for decoding a sequence of characters
/// representing data encoded in base 64.
pub struct Decoder {
    /// A buffer for up to four characters.
    buf: [u8; 4],

    /// The index in `buf` where we place the next character.
    ///
    /// Set to 0xF0 once padding completed the final group.
    next: usize,

    /// The decoded data or an error if something went wrong.
    target: Result<BytesMut, DecodeError>,
}

impl Decoder {
    /// Creates a new empty decoder.
    pub fn new() -> Self {
        Decoder {
            buf: [0; 4],
            next: 0,
            target: Ok(BytesMut::new()),
        }
    }

    /// Finalizes decoding and returns the decoded data.
    pub fn finalize(self) -> Result<Bytes, DecodeError> {
        let next = self.next;
        self.target.and_then(|bytes| {
            if next & 0x0F != 0 {
                Err(DecodeError::ShortInput)
            } else {
                Ok(bytes.freeze())
            }
        })
    }

    /// Decodes one more character of data.
    ///
    /// Returns an error as soon as the encoded data is determined to be
    /// illegal.
    pub fn push(&mut self, ch: char) -> Result<(), DecodeError> {
        if self.next == 0xF0 {
            self.target = Err(DecodeError::TrailingInput);
            return Err(DecodeError::TrailingInput);
        }
        let target = match self.target.as_mut() {
            Ok(target) => target,
            Err(err) => return Err(*err),
        };

        let val = if ch == PAD {
            // Only up to two padding characters possible.
            if self.next < 2 {
                return Err(DecodeError::IllegalChar(ch));
            }
            0x80
        } else {
            match decode_char(ch) {
                Some(val) => val,
                None => return Err(DecodeError::IllegalChar(ch)),
            }
        };
        self.buf[self.next] = val;
        self.next += 1;

        if self.next == 4 {
            let [b0, b1, b2, b3] = self.buf;
            target.put_u8(b0 << 2 | b1 >> 4);
            if b2 != 0x80 {
                target.put_u8(b1 << 4 | b2 >> 2);
            }
            if b3 != 0x80 {
                if b2 == 0x80 {
                    return Err(DecodeError::TrailingInput);
                }
                target.put_u8(b2 << 6 | b3);
                self.next = 0
            } else {
                self.next = 0xF0
            }
        }

        Ok(())
    }
}

//--- Default

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the value of a single alphabet character.
fn decode_char(ch: char) -> Option<u8> {
    let val = match ch {
        'A'..='Z' => u32::from(ch) - u32::from('A'),
        'a'..='z' => u32::from(ch) - u32::from('a') + 26,
        '0'..='9' => u32::from(ch) - u32::from('0') + 52,
        '+' => 62,
        '/' => 63,
        _ => return None,
    };
    u8::try_from(val).ok()
}

//============ Error Types ===================================================

//------------ DecodeError ---------------------------------------------------

/// An error happened while decoding a base 64 encoded string.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DecodeError {
    /// A character was pushed that isn’t allowed in the encoding.
    IllegalChar(char),

    /// There was trailing data after a padding sequence.
    TrailingInput,

    /// The input ended with an incomplete sequence.
    ShortInput,
}

//--- Display and Error

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::TrailingInput => f.write_str("trailing input"),
            DecodeError::IllegalChar(ch) => {
                write!(f, "illegal character '{}'", ch)
            }
            DecodeError::ShortInput => f.write_str("incomplete input"),
        }
    }
}

impl std::error::Error for DecodeError {}

//============ Constants =====================================================

const ENCODE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// The padding character
const PAD: char = '=';

//============ Test ==========================================================

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decode_str() {
        assert_eq!(decode("").unwrap().as_ref(), b"");
        assert_eq!(decode("Zg==").unwrap().as_ref(), b"f");
        assert_eq!(decode("Zm8=").unwrap().as_ref(), b"fo");
        assert_eq!(decode("Zm9v").unwrap().as_ref(), b"foo");
        assert_eq!(decode("Zm9vYmFy").unwrap().as_ref(), b"foobar");

        assert_eq!(decode("FPucA").unwrap_err(), DecodeError::ShortInput);
        assert_eq!(
            decode("FPucA=").unwrap_err(),
            DecodeError::IllegalChar('=')
        );
        assert_eq!(
            decode("FPucAw=a").unwrap_err(),
            DecodeError::TrailingInput
        );
        assert_eq!(decode("Zm9v!").unwrap_err(), DecodeError::IllegalChar('!'));
    }

    #[test]
    fn encode_bytes() {
        assert_eq!(encode_string(b""), "");
        assert_eq!(encode_string(b"f"), "Zg==");
        assert_eq!(encode_string(b"fo"), "Zm8=");
        assert_eq!(encode_string(b"foo"), "Zm9v");
        assert_eq!(encode_string(b"fooba"), "Zm9vYmE=");
        assert_eq!(encode_string(b"foobar"), "Zm9vYmFy");
    }
}
