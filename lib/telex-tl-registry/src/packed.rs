// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::io::Write;

use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;
use log::debug;
use telex_tl::{deserialize, serialize, Cursor, Deserializable, Identifiable, Serializable};

use crate::errors::DecodeError;
use crate::object::Object;
use crate::registry::Registry;

/// This struct represents the following TL definition:
///
/// ```tl
/// gzip_packed#3072cfa1 packed_data:string = Object;
/// ```
///
/// A transparent wrapper: the payload is the gzip-compressed boxed
/// serialization of some other object. Peers may substitute it for any
/// large object, so decoders should be prepared to [`unpack`] it wherever
/// a boxed object is expected.
///
/// [`unpack`]: Self::unpack
#[derive(Clone, Debug, PartialEq)]
pub struct GzipPacked {
    pub packed_data: Vec<u8>,
}

impl GzipPacked {
    /// Compresses the given boxed serialization into a new wrapper.
    pub fn new(unpacked_data: &[u8]) -> Self {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
        // Safe to unwrap, in-memory data should not fail.
        encoder.write_all(unpacked_data).unwrap();
        let packed_data = encoder.finish().unwrap();
        Self { packed_data }
    }

    /// Decompresses the payload back into the wrapped object's boxed
    /// serialization.
    pub fn decompress(&self) -> Result<Vec<u8>, DecodeError> {
        let mut decoder = GzDecoder::new(Vec::new());
        decoder
            .write_all(&self.packed_data[..])
            .map_err(|_| DecodeError::DecompressionFailed)?;
        decoder.finish().map_err(|_| DecodeError::DecompressionFailed)
    }

    /// Decompresses the payload and decodes the boxed object inside it
    /// through the given registry.
    pub fn unpack(&self, registry: &Registry) -> Result<Box<dyn Object>, DecodeError> {
        let data = self.decompress()?;
        debug!(
            "unpacked {} compressed bytes into {}",
            self.packed_data.len(),
            data.len()
        );
        registry.read_boxed(&mut Cursor::from_slice(&data))
    }
}

impl Identifiable for GzipPacked {
    #[allow(clippy::unreadable_literal)]
    const CONSTRUCTOR_ID: u32 = 0x3072cfa1;
    const NAME: &'static str = "gzip_packed";
}

impl Serializable for GzipPacked {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        self.packed_data.serialize(buf)
    }
}

impl Deserializable for GzipPacked {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let packed_data = Vec::<u8>::deserialize(buf)?;
        Ok(Self { packed_data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{self, Pong};

    #[test]
    fn compression_round_trips() {
        let payload = b"some payload long enough to be worth compressing".repeat(16);
        let packed = GzipPacked::new(&payload);
        assert!(packed.packed_data.len() < payload.len());
        assert_eq!(packed.decompress().unwrap(), payload);
    }

    #[test]
    fn garbage_fails_to_decompress() {
        let packed = GzipPacked {
            packed_data: vec![0xde, 0xad, 0xbe, 0xef],
        };
        assert_eq!(packed.decompress(), Err(DecodeError::DecompressionFailed));
    }

    #[test]
    fn wire_form_is_a_byte_string() {
        let packed = GzipPacked::new(b"hi");
        let bytes = packed.to_boxed_bytes().unwrap();
        assert_eq!(&bytes[..4], &[0xa1, 0xcf, 0x72, 0x30]);
        // Byte strings stay padded to 4 bytes inside the wrapper too.
        assert_eq!(bytes.len() % 4, 0);
        assert_eq!(
            GzipPacked::from_bytes(&bytes[4..]).unwrap().packed_data,
            packed.packed_data
        );
    }

    #[test]
    fn unpacks_the_wrapped_object_through_the_registry() {
        let mut registry = Registry::new();
        types::register_builtin(&mut registry).unwrap();

        let pong = Pong {
            msg_id: 3,
            ping_id: 4,
        };
        let packed = GzipPacked::new(&pong.to_boxed_bytes().unwrap());

        // What travels on the wire is the wrapper, boxed.
        let bytes = packed.to_boxed_bytes().unwrap();
        let obj = registry
            .read_boxed(&mut Cursor::from_slice(&bytes))
            .unwrap();
        let wrapper = obj.downcast_ref::<GzipPacked>().unwrap();
        let inner = wrapper.unpack(&registry).unwrap();
        assert_eq!(inner.downcast_ref::<Pong>(), Some(&pong));
    }
}
