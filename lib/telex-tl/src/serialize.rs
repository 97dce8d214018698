// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::error::Error as StdError;
use std::fmt;

/// The error type for serialization.
///
/// Integer widths are enforced by the parameter types at compile time, so
/// the only values that can fail to fit their wire encoding at runtime are
/// the length prefixes of byte strings and vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The value is too long for the length prefix of its wire encoding:
    /// byte strings are limited to `0xff_ffff` bytes, vectors to
    /// `i32::MAX` elements.
    LengthTooLong {
        /// The length that did not fit.
        len: usize,
    },
}

impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::LengthTooLong { len } => {
                write!(f, "length {} too long for its wire encoding", len)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// This trait allows for concrete instances to be serialized into
/// binary data as specified by the [Binary Data Serialization].
///
/// The body is *bare*: no leading constructor identifier is emitted.
/// Writing a boxed value is the explicit composition of the identifier
/// followed by the body, and belongs to the call site.
///
/// [Binary Data Serialization]: https://core.telegram.org/mtproto/serialize
pub trait Serializable {
    /// Serializes the instance into the given buffer.
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()>;

    /// Convenience function to serialize the object into a new buffer
    /// and return its bytes. It is more efficient to reuse an existing
    /// buffer with [`Serializable::serialize`].
    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.serialize(&mut buffer)?;
        Ok(buffer)
    }
}

impl Serializable for bool {
    /// Serializes the boolean according to the following definitions:
    ///
    /// * `false` is serialized as `boolFalse#bc799737 = Bool;`.
    /// * `true` is serialized as `boolTrue#997275b5 = Bool;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!(true.to_bytes().unwrap(), [0xb5, 0x75, 0x72, 0x99]);
    /// assert_eq!(false.to_bytes().unwrap(), [0x37, 0x97, 0x79, 0xbc]);
    /// ```
    #[allow(clippy::unreadable_literal)]
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        if *self { 0x997275b5u32 } else { 0xbc799737u32 }.serialize(buf)
    }
}

impl Serializable for i32 {
    /// Serializes the 32-bit signed integer according to the following
    /// definition:
    ///
    /// * `int ? = Int;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!(0i32.to_bytes().unwrap(), [0x00, 0x00, 0x00, 0x00]);
    /// assert_eq!((-1i32).to_bytes().unwrap(), [0xff, 0xff, 0xff, 0xff]);
    /// assert_eq!(i32::MAX.to_bytes().unwrap(), [0xff, 0xff, 0xff, 0x7f]);
    /// assert_eq!(i32::MIN.to_bytes().unwrap(), [0x00, 0x00, 0x00, 0x80]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.to_le_bytes());
        Ok(())
    }
}

impl Serializable for u32 {
    /// Serializes the 32-bit unsigned integer according to the following
    /// definition:
    ///
    /// * `int ? = Int;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!(1u32.to_bytes().unwrap(), [0x01, 0x00, 0x00, 0x00]);
    /// assert_eq!(u32::MAX.to_bytes().unwrap(), [0xff, 0xff, 0xff, 0xff]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.to_le_bytes());
        Ok(())
    }
}

impl Serializable for i64 {
    /// Serializes the 64-bit signed integer according to the following
    /// definition:
    ///
    /// * `long ? = Long;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!(1i64.to_bytes().unwrap(), [0x1, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0]);
    /// assert_eq!(i64::MIN.to_bytes().unwrap(), [0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x80]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.to_le_bytes());
        Ok(())
    }
}

impl Serializable for i128 {
    /// Serializes the 128-bit signed integer according to the following
    /// definition:
    ///
    /// * `int128 4*[ int ] = Int128;`.
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.to_le_bytes());
        Ok(())
    }
}

impl Serializable for [u8; 16] {
    /// Serializes the 128-bit integer according to the following definition:
    ///
    /// * `int128 4*[ int ] = Int128;`.
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.iter().copied());
        Ok(())
    }
}

impl Serializable for [u8; 32] {
    /// Serializes the 256-bit integer according to the following definition:
    ///
    /// * `int256 8*[ int ] = Int256;`.
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.iter().copied());
        Ok(())
    }
}

impl Serializable for f64 {
    /// Serializes the 64-bit floating point according to the following
    /// definition:
    ///
    /// * `double ? = Double;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!(1.5f64.to_bytes().unwrap(), [0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0xf8, 0x3f]);
    /// assert_eq!(f64::INFINITY.to_bytes().unwrap(), [0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0xf0, 0x7f]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.to_le_bytes());
        Ok(())
    }
}

impl<T: Serializable> Serializable for Vec<T> {
    /// Serializes a vector of serializable items according to the following
    /// definition:
    ///
    /// * `vector#1cb5c415 {t:Type} # [ t ] = Vector t;`.
    ///
    /// The elements are written in their original order; this is a strict
    /// invariant of the format, mirrored on deserialization.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!(Vec::<i32>::new().to_bytes().unwrap(), [0x15, 0xc4, 0xb5, 0x1c, 0x0, 0x0, 0x0, 0x0]);
    /// assert_eq!(vec![0x7f_i32].to_bytes().unwrap(),
    ///            [0x15, 0xc4, 0xb5, 0x1c, 0x1, 0x0, 0x0, 0x0, 0x7f, 0x0, 0x0, 0x0]);
    /// ```
    #[allow(clippy::unreadable_literal)]
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        if self.len() > i32::MAX as usize {
            return Err(Error::LengthTooLong { len: self.len() });
        }
        0x1cb5c415u32.serialize(buf)?;
        (self.len() as i32).serialize(buf)?;
        self.iter().try_for_each(|x| x.serialize(buf))
    }
}

impl<T: Serializable> Serializable for crate::RawVec<T> {
    /// Serializes a bare vector of serializable items: like `Vec<T>`, but
    /// without the leading `vector#1cb5c415` constructor identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::{RawVec, Serializable};
    ///
    /// assert_eq!(RawVec(Vec::<i32>::new()).to_bytes().unwrap(), [0x0, 0x0, 0x0, 0x0]);
    /// assert_eq!(RawVec(vec![0x7f_i32]).to_bytes().unwrap(), [0x1, 0x0, 0x0, 0x0, 0x7f, 0x0, 0x0, 0x0]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        if self.0.len() > i32::MAX as usize {
            return Err(Error::LengthTooLong { len: self.0.len() });
        }
        (self.0.len() as i32).serialize(buf)?;
        self.0.iter().try_for_each(|x| x.serialize(buf))
    }
}

impl Serializable for crate::Blob {
    /// Serializes the blob as-is, with no length prefix or padding.
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        buf.extend(self.0.iter().copied());
        Ok(())
    }
}

impl Serializable for String {
    /// Serializes a UTF-8 string as a byte string according to the
    /// following definition:
    ///
    /// * `string ? = String;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!("".to_string().to_bytes().unwrap(), [0x00, 0x00, 0x00, 0x00]);
    /// assert_eq!("Hi".to_string().to_bytes().unwrap(), [0x02, 0x48, 0x69, 0x00]);
    /// assert_eq!("Hi!".to_string().to_bytes().unwrap(), [0x03, 0x48, 0x69, 0x21]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        self.as_bytes().serialize(buf)
    }
}

impl Serializable for Vec<u8> {
    /// Serializes a vector of bytes as a byte string according to the
    /// following definition:
    ///
    /// * `string ? = String;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!(Vec::<u8>::new().to_bytes().unwrap(), &[0x00, 0x00, 0x00, 0x00]);
    /// assert_eq!(vec![0x7f_u8].to_bytes().unwrap(), &[0x01, 0x7f, 0x00, 0x00]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        (&self[..]).serialize(buf)
    }
}

impl Serializable for &[u8] {
    /// Serializes a byte string according to the following definition:
    ///
    /// * `string ? = String;`.
    ///
    /// Short strings use a single length byte, long ones a `0xfe` marker
    /// followed by a 3-byte little-endian length. In both forms the field
    /// as a whole (prefix, data and padding) is zero-padded to a multiple
    /// of 4 bytes. Strings of `0x100_0000` bytes or more do not fit the
    /// 3-byte length and fail with [`Error::LengthTooLong`].
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Serializable;
    ///
    /// assert_eq!((&[0x7f_u8][..]).to_bytes().unwrap(), &[0x01, 0x7f, 0x00, 0x00]);
    /// assert_eq!((&[1u8, 2, 3][..]).to_bytes().unwrap(), &[0x03, 0x01, 0x02, 0x03]);
    /// ```
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<()> {
        let len = if self.len() <= 253 {
            buf.extend([self.len() as u8]);
            self.len() + 1
        } else if self.len() <= 0xff_ffff {
            buf.extend([
                254,
                (self.len() & 0xff) as u8,
                ((self.len() >> 8) & 0xff) as u8,
                ((self.len() >> 16) & 0xff) as u8,
            ]);
            self.len()
        } else {
            return Err(Error::LengthTooLong { len: self.len() });
        };
        let padding = (4 - len % 4) % 4;

        buf.extend(self.iter().copied());
        buf.extend((0..padding).map(|_| 0));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_strings_pad_to_four_bytes() {
        for len in [0usize, 1, 2, 3, 4, 5, 253, 254, 255, 1000] {
            let data = vec![0x5a_u8; len];
            let bytes = data.to_bytes().unwrap();
            assert_eq!(bytes.len() % 4, 0, "len {} not padded", len);
        }
    }

    #[test]
    fn long_byte_string_uses_marker_prefix() {
        let data = vec![1u8; 254];
        let bytes = data.to_bytes().unwrap();
        assert_eq!(&bytes[..4], &[254, 254, 0, 0]);
        // 4 prefix bytes + 254 data bytes + 2 padding bytes
        assert_eq!(bytes.len(), 260);
        assert_eq!(&bytes[258..], &[0, 0]);
    }

    #[test]
    fn oversized_byte_string_is_rejected() {
        let data = vec![0u8; 0x100_0000];
        assert_eq!(
            (&data[..]).to_bytes(),
            Err(Error::LengthTooLong { len: 0x100_0000 })
        );
    }
}
