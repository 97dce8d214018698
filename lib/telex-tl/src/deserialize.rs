// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::error::Error as StdError;
use std::fmt;

/// The error type for deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The end of the buffer was reached earlier than anticipated, which
    /// implies there is not enough data to complete the deserialization.
    ///
    /// No waiting occurs at this layer; if more bytes may arrive later,
    /// buffering them up is the caller's responsibility.
    UnexpectedEof,

    /// An unexpected constructor identifier was found, for example, when
    /// reading data that doesn't represent the correct type (e.g. reading
    /// a `bool` when we expect a `Vec`). In particular, it can occur:
    ///
    /// * When reading a boolean.
    /// * When reading a boxed vector.
    /// * When reading an arbitrary boxed type.
    ///
    /// It is important to note that bare values lack the constructor
    /// information, and as such they cannot be validated.
    UnexpectedConstructor {
        /// The unexpected constructor identifier.
        id: u32,
    },

    /// A vector count was negative or larger than the remaining buffer
    /// could possibly hold. Malformed or hostile input is detected here
    /// before any element is read.
    BadVectorLength {
        /// The count as read from the wire.
        got: i32,
    },

    /// A `string` field contained bytes that are not valid UTF-8.
    InvalidUtf8 {
        /// The number of valid bytes before the offending sequence.
        valid_up_to: usize,
    },
}

impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UnexpectedEof => write!(f, "unexpected eof"),
            Self::UnexpectedConstructor { id } => write!(f, "unexpected constructor: {:08x}", id),
            Self::BadVectorLength { got } => write!(f, "bad vector length (got {})", got),
            Self::InvalidUtf8 { valid_up_to } => {
                write!(f, "invalid utf-8 after {} valid bytes", valid_up_to)
            }
        }
    }
}

/// Re-implement `Cursor` to only work over in-memory buffers and greatly
/// narrow the possible error cases.
///
/// The cursor only ever advances. A fixed-size read that cannot be
/// satisfied fails with [`Error::UnexpectedEof`] and consumes nothing;
/// multi-part reads (a length prefix followed by data) keep whichever
/// complete parts they already consumed before failing.
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// The current position, in bytes, from the start of the buffer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// The number of bytes that remain to be read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        if self.pos < self.buf.len() {
            let byte = self.buf[self.pos];
            self.pos += 1;
            Ok(byte)
        } else {
            Err(Error::UnexpectedEof)
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.pos + buf.len() > self.buf.len() {
            Err(Error::UnexpectedEof)
        } else {
            buf.copy_from_slice(&self.buf[self.pos..self.pos + buf.len()]);
            self.pos += buf.len();
            Ok(())
        }
    }

    pub fn read_to_end(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        buf.extend(&self.buf[self.pos..]);
        let old = self.pos;
        self.pos = self.buf.len();
        Ok(self.pos - old)
    }
}

/// The problem with being generic over `std::io::Read` is that it's
/// fallible in ways an in-memory read never is, so the buffer is a plain
/// byte slice instead.
pub type Buffer<'a, 'b> = &'a mut Cursor<'b>;
pub type Result<T> = std::result::Result<T, Error>;

/// This trait allows for data serialized according to the
/// [Binary Data Serialization] to be deserialized into concrete instances.
///
/// The body is *bare*: any leading constructor identifier is assumed to
/// have been consumed by the caller already (or to be absent by context).
///
/// [Binary Data Serialization]: https://core.telegram.org/mtproto/serialize
pub trait Deserializable {
    /// Deserializes an instance of the type from a given buffer.
    fn deserialize(buf: Buffer) -> Result<Self>
    where
        Self: Sized;

    /// Convenience function to deserialize an instance from a given buffer.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(bool::from_bytes(&[0x37, 0x97, 0x79, 0xbc]).unwrap(), false);
    /// ```
    fn from_bytes(buf: &[u8]) -> Result<Self>
    where
        Self: Sized,
    {
        Self::deserialize(&mut Cursor::from_slice(buf))
    }
}

impl Deserializable for bool {
    /// Deserializes a boolean according to the following definitions:
    ///
    /// * `boolFalse#bc799737 = Bool;` deserializes into `false`.
    /// * `boolTrue#997275b5 = Bool;` deserializes into `true`.
    ///
    /// Any other constructor fails with [`Error::UnexpectedConstructor`];
    /// a boolean is never a raw byte on the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(bool::from_bytes(&[0xb5, 0x75, 0x72, 0x99]).unwrap(), true);
    /// assert_eq!(bool::from_bytes(&[0x37, 0x97, 0x79, 0xbc]).unwrap(), false);
    /// assert!(bool::from_bytes(&[0x00, 0x00, 0x00, 0x00]).is_err());
    /// ```
    #[allow(clippy::unreadable_literal)]
    fn deserialize(buf: Buffer) -> Result<Self> {
        let id = u32::deserialize(buf)?;
        match id {
            0x997275b5u32 => Ok(true),
            0xbc799737u32 => Ok(false),
            _ => Err(Error::UnexpectedConstructor { id }),
        }
    }
}

impl Deserializable for i32 {
    /// Deserializes a 32-bit signed integer according to the following
    /// definition:
    ///
    /// * `int ? = Int;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(i32::from_bytes(&[0x2a, 0x00, 0x00, 0x00]).unwrap(), 42i32);
    /// assert_eq!(i32::from_bytes(&[0xff, 0xff, 0xff, 0xff]).unwrap(), -1i32);
    /// assert_eq!(i32::from_bytes(&[0x00, 0x00, 0x00, 0x80]).unwrap(), i32::MIN);
    /// ```
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut buffer = [0u8; 4];
        buf.read_exact(&mut buffer)?;
        Ok(Self::from_le_bytes(buffer))
    }
}

impl Deserializable for u32 {
    /// Deserializes a 32-bit unsigned integer according to the following
    /// definition:
    ///
    /// * `int ? = Int;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(u32::from_bytes(&[0xff, 0xff, 0xff, 0xff]).unwrap(), u32::MAX);
    /// ```
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut buffer = [0u8; 4];
        buf.read_exact(&mut buffer)?;
        Ok(Self::from_le_bytes(buffer))
    }
}

impl Deserializable for i64 {
    /// Deserializes a 64-bit signed integer according to the following
    /// definition:
    ///
    /// * `long ? = Long;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(i64::from_bytes(&[0x1, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0]).unwrap(), 1i64);
    /// assert_eq!(i64::from_bytes(&[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x7f]).unwrap(), i64::MAX);
    /// ```
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut buffer = [0u8; 8];
        buf.read_exact(&mut buffer)?;
        Ok(Self::from_le_bytes(buffer))
    }
}

impl Deserializable for i128 {
    /// Deserializes a 128-bit signed integer according to the following
    /// definition:
    ///
    /// * `int128 4*[ int ] = Int128;`.
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut buffer = [0u8; 16];
        buf.read_exact(&mut buffer)?;
        Ok(Self::from_le_bytes(buffer))
    }
}

impl Deserializable for [u8; 16] {
    /// Deserializes the 128-bit integer according to the following
    /// definition:
    ///
    /// * `int128 4*[ int ] = Int128;`.
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut buffer = [0u8; 16];
        buf.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

impl Deserializable for [u8; 32] {
    /// Deserializes the 256-bit integer according to the following
    /// definition:
    ///
    /// * `int256 8*[ int ] = Int256;`.
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut buffer = [0u8; 32];
        buf.read_exact(&mut buffer)?;
        Ok(buffer)
    }
}

impl Deserializable for f64 {
    /// Deserializes a 64-bit floating point according to the
    /// following definition:
    ///
    /// * `double ? = Double;`.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(f64::from_bytes(&[0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0xf8, 0x3f]).unwrap(), 1.5f64);
    /// assert_eq!(f64::from_bytes(&[0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0xf0, 0xff]).unwrap(), f64::NEG_INFINITY);
    /// ```
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut buffer = [0u8; 8];
        buf.read_exact(&mut buffer)?;
        Ok(Self::from_le_bytes(buffer))
    }
}

impl<T: Deserializable> Deserializable for Vec<T> {
    /// Deserializes a vector of deserializable items according to the
    /// following definition:
    ///
    /// * `vector#1cb5c415 {t:Type} # [ t ] = Vector t;`.
    ///
    /// A leading constructor other than `vector#1cb5c415` fails with
    /// [`Error::UnexpectedConstructor`]. A negative count, or one larger
    /// than the remaining bytes could possibly hold (every element takes
    /// at least one byte on the wire), fails with
    /// [`Error::BadVectorLength`] before any element is read.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(Vec::<i32>::from_bytes(&[0x15, 0xc4, 0xb5, 0x1c, 0x0, 0x0, 0x0, 0x0]).unwrap(), Vec::new());
    /// assert_eq!(Vec::<i32>::from_bytes(&[0x15, 0xc4, 0xb5, 0x1c, 0x1, 0x0, 0x0, 0x0, 0x7f, 0x0, 0x0, 0x0]).unwrap(),
    ///            vec![0x7f_i32]);
    /// ```
    #[allow(clippy::unreadable_literal)]
    fn deserialize(buf: Buffer) -> Result<Self> {
        let id = u32::deserialize(buf)?;
        if id != 0x1cb5c415u32 {
            return Err(Error::UnexpectedConstructor { id });
        }
        let len = i32::deserialize(buf)?;
        if len < 0 || len as usize > buf.remaining() {
            return Err(Error::BadVectorLength { got: len });
        }
        (0..len).map(|_| T::deserialize(buf)).collect()
    }
}

impl<T: Deserializable> Deserializable for crate::RawVec<T> {
    /// Deserializes a bare vector of deserializable items: like `Vec<T>`,
    /// but without the leading `vector#1cb5c415` constructor identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::{Deserializable, RawVec};
    ///
    /// assert_eq!(RawVec::<i32>::from_bytes(&[0x0, 0x0, 0x0, 0x0]).unwrap().0, Vec::<i32>::new());
    /// assert_eq!(RawVec::<i32>::from_bytes(&[0x1, 0x0, 0x0, 0x0, 0x7f, 0x0, 0x0, 0x0]).unwrap().0, vec![0x7f_i32]);
    /// ```
    fn deserialize(buf: Buffer) -> Result<Self> {
        let len = i32::deserialize(buf)?;
        if len < 0 || len as usize > buf.remaining() {
            return Err(Error::BadVectorLength { got: len });
        }
        Ok(Self(
            (0..len)
                .map(|_| T::deserialize(buf))
                .collect::<Result<Vec<T>>>()?,
        ))
    }
}

impl Deserializable for crate::Blob {
    /// Reads all of the remaining bytes as-is.
    fn deserialize(buf: Buffer) -> Result<Self> {
        let mut bytes = Vec::with_capacity(buf.remaining());
        buf.read_to_end(&mut bytes)?;
        Ok(Self(bytes))
    }
}

impl Deserializable for String {
    /// Deserializes a UTF-8 string according to the following definition:
    ///
    /// * `string ? = String;`.
    ///
    /// Bytes that are not valid UTF-8 fail with [`Error::InvalidUtf8`]
    /// rather than being substituted; a lossy read would silently change
    /// the value on a write-read round trip.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(String::from_bytes(&[0x02, 0x48, 0x69, 0x00]).unwrap(), "Hi");
    /// assert!(String::from_bytes(&[0x01, 0xff, 0x00, 0x00]).is_err());
    /// ```
    fn deserialize(buf: Buffer) -> Result<Self> {
        String::from_utf8(Vec::<u8>::deserialize(buf)?).map_err(|e| Error::InvalidUtf8 {
            valid_up_to: e.utf8_error().valid_up_to(),
        })
    }
}

impl Deserializable for Vec<u8> {
    /// Deserializes a vector of bytes as a byte string according to the
    /// following definition:
    ///
    /// * `string ? = String;`.
    ///
    /// The zero padding that rounds the field up to a multiple of 4 bytes
    /// is consumed and discarded.
    ///
    /// # Examples
    ///
    /// ```
    /// use telex_tl::Deserializable;
    ///
    /// assert_eq!(Vec::<u8>::from_bytes(&[0x00, 0x00, 0x00, 0x00]).unwrap(), Vec::new());
    /// assert_eq!(Vec::<u8>::from_bytes(&[0x01, 0x7f, 0x00, 0x00]).unwrap(), vec![0x7f_u8]);
    /// ```
    fn deserialize(buf: Buffer) -> Result<Self> {
        let first = buf.read_byte()?;
        let (len, prefix) = if first == 254 {
            let mut bytes = [0u8; 3];
            buf.read_exact(&mut bytes)?;
            (
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0]) as usize,
                4,
            )
        } else {
            (first as usize, 1)
        };

        let mut result = vec![0u8; len];
        buf.read_exact(&mut result)?;

        let padding = (4 - (prefix + len) % 4) % 4;
        let mut pad = [0u8; 3];
        buf.read_exact(&mut pad[..padding])?;

        Ok(result)
    }
}
