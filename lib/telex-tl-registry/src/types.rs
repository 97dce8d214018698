// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A small built-in vocabulary of concrete objects.
//!
//! Real schemas define their types in bulk (usually generated from `.tl`
//! files); the handful here exists so that the registry is usable out of
//! the box for service-level plumbing, and doubles as the reference for
//! how concrete types implement the traits by hand: the TL definition
//! lives in the doc comment, the identifier and name in [`Identifiable`],
//! and `serialize`/`deserialize` walk the fields in declared order.
use telex_tl::{deserialize, serialize, Blob, Cursor, Deserializable, Identifiable, Serializable};

use crate::errors::RegisterError;
use crate::Registry;

/// Registers every object in this module (and the [`GzipPacked`] wrapper)
/// into the given registry.
///
/// [`GzipPacked`]: crate::GzipPacked
pub fn register_builtin(registry: &mut Registry) -> Result<(), RegisterError> {
    registry.register::<Ping>()?;
    registry.register::<Pong>()?;
    registry.register::<RpcError>()?;
    registry.register::<MsgsAck>()?;
    registry.register::<RpcResult>()?;
    registry.register::<PeerStatus>()?;
    registry.register::<crate::GzipPacked>()?;
    Ok(())
}

/// This struct represents the following TL definition:
///
/// ```tl
/// ping#7abe77ec ping_id:long = Pong;
/// ```
#[cfg_attr(
    feature = "impl-serde",
    derive(serde_derive::Serialize, serde_derive::Deserialize)
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Ping {
    pub ping_id: i64,
}

impl Identifiable for Ping {
    #[allow(clippy::unreadable_literal)]
    const CONSTRUCTOR_ID: u32 = 0x7abe77ec;
    const NAME: &'static str = "ping";
}

impl Serializable for Ping {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        self.ping_id.serialize(buf)
    }
}

impl Deserializable for Ping {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let ping_id = i64::deserialize(buf)?;
        Ok(Self { ping_id })
    }
}

/// This struct represents the following TL definition:
///
/// ```tl
/// pong#347773c5 msg_id:long ping_id:long = Pong;
/// ```
#[cfg_attr(
    feature = "impl-serde",
    derive(serde_derive::Serialize, serde_derive::Deserialize)
)]
#[derive(Clone, Debug, PartialEq)]
pub struct Pong {
    pub msg_id: i64,
    pub ping_id: i64,
}

impl Identifiable for Pong {
    #[allow(clippy::unreadable_literal)]
    const CONSTRUCTOR_ID: u32 = 0x347773c5;
    const NAME: &'static str = "pong";
}

impl Serializable for Pong {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        self.msg_id.serialize(buf)?;
        self.ping_id.serialize(buf)
    }
}

impl Deserializable for Pong {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let msg_id = i64::deserialize(buf)?;
        let ping_id = i64::deserialize(buf)?;
        Ok(Self { msg_id, ping_id })
    }
}

/// This struct represents the following TL definition:
///
/// ```tl
/// rpc_error#2144ca19 error_code:int error_message:string = RpcError;
/// ```
#[cfg_attr(
    feature = "impl-serde",
    derive(serde_derive::Serialize, serde_derive::Deserialize)
)]
#[derive(Clone, Debug, PartialEq)]
pub struct RpcError {
    pub error_code: i32,
    pub error_message: String,
}

impl Identifiable for RpcError {
    #[allow(clippy::unreadable_literal)]
    const CONSTRUCTOR_ID: u32 = 0x2144ca19;
    const NAME: &'static str = "rpc_error";
}

impl Serializable for RpcError {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        self.error_code.serialize(buf)?;
        self.error_message.serialize(buf)
    }
}

impl Deserializable for RpcError {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let error_code = i32::deserialize(buf)?;
        let error_message = String::deserialize(buf)?;
        Ok(Self {
            error_code,
            error_message,
        })
    }
}

/// This struct represents the following TL definition:
///
/// ```tl
/// msgs_ack#62d6b459 msg_ids:Vector<long> = MsgsAck;
/// ```
#[cfg_attr(
    feature = "impl-serde",
    derive(serde_derive::Serialize, serde_derive::Deserialize)
)]
#[derive(Clone, Debug, PartialEq)]
pub struct MsgsAck {
    pub msg_ids: Vec<i64>,
}

impl Identifiable for MsgsAck {
    #[allow(clippy::unreadable_literal)]
    const CONSTRUCTOR_ID: u32 = 0x62d6b459;
    const NAME: &'static str = "msgs_ack";
}

impl Serializable for MsgsAck {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        self.msg_ids.serialize(buf)
    }
}

impl Deserializable for MsgsAck {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let msg_ids = Vec::<i64>::deserialize(buf)?;
        Ok(Self { msg_ids })
    }
}

/// This struct represents the following TL definition:
///
/// ```tl
/// rpc_result#f35c6d01 req_msg_id:long result:Object = RpcResult;
/// ```
///
/// The result is kept as an unparsed blob: which concrete type it holds
/// is only known to whoever issued the request, so interpretation is
/// deferred to the caller (typically another [`Registry::read_boxed`]
/// over the blob's bytes).
///
/// [`Registry::read_boxed`]: crate::Registry::read_boxed
#[derive(Clone, Debug, PartialEq)]
pub struct RpcResult {
    pub req_msg_id: i64,
    pub result: Blob,
}

impl Identifiable for RpcResult {
    #[allow(clippy::unreadable_literal)]
    const CONSTRUCTOR_ID: u32 = 0xf35c6d01;
    const NAME: &'static str = "rpc_result";
}

impl Serializable for RpcResult {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        self.req_msg_id.serialize(buf)?;
        self.result.serialize(buf)
    }
}

impl Deserializable for RpcResult {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let req_msg_id = i64::deserialize(buf)?;
        let result = Blob::deserialize(buf)?;
        Ok(Self { req_msg_id, result })
    }
}

/// This struct represents the following TL definition:
///
/// ```tl
/// peerStatus#d8f1a3c6 flags:# online:flags.0?true muted:flags.1?true
///     last_seen:flags.2?int title:flags.3?string = PeerStatus;
/// ```
///
/// `online` and `muted` are signaled purely by their bit in the flags
/// word and consume no further bytes; `last_seen` and `title` follow
/// inline when their bit is set.
#[cfg_attr(
    feature = "impl-serde",
    derive(serde_derive::Serialize, serde_derive::Deserialize)
)]
#[derive(Clone, Debug, PartialEq)]
pub struct PeerStatus {
    pub online: bool,
    pub muted: bool,
    pub last_seen: Option<i32>,
    pub title: Option<String>,
}

impl Identifiable for PeerStatus {
    #[allow(clippy::unreadable_literal)]
    const CONSTRUCTOR_ID: u32 = 0xd8f1a3c6;
    const NAME: &'static str = "peerStatus";
}

impl Serializable for PeerStatus {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        (0u32
            | if self.online { 1 } else { 0 }
            | if self.muted { 2 } else { 0 }
            | if self.last_seen.is_some() { 4 } else { 0 }
            | if self.title.is_some() { 8 } else { 0 })
        .serialize(buf)?;
        if let Some(ref x) = self.last_seen {
            x.serialize(buf)?;
        }
        if let Some(ref x) = self.title {
            x.serialize(buf)?;
        }
        Ok(())
    }
}

impl Deserializable for PeerStatus {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let flags = u32::deserialize(buf)?;
        let online = (flags & 1) != 0;
        let muted = (flags & 2) != 0;
        let last_seen = if (flags & 4) != 0 {
            Some(i32::deserialize(buf)?)
        } else {
            None
        };
        let title = if (flags & 8) != 0 {
            Some(String::deserialize(buf)?)
        } else {
            None
        };
        Ok(Self {
            online,
            muted,
            last_seen,
            title,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Object;

    #[test]
    fn ping_pong_are_byte_exact() {
        let ping = Ping { ping_id: 42 };
        assert_eq!(
            ping.to_boxed_bytes().unwrap(),
            [0xec, 0x77, 0xbe, 0x7a, 0x2a, 0, 0, 0, 0, 0, 0, 0]
        );
        assert_eq!(ping.to_bytes().unwrap(), [0x2a, 0, 0, 0, 0, 0, 0, 0]);

        let pong = Pong {
            msg_id: 1,
            ping_id: 2,
        };
        assert_eq!(
            pong.to_boxed_bytes().unwrap(),
            [0xc5, 0x73, 0x77, 0x34, 1, 0, 0, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn msgs_ack_round_trips_in_order() {
        let ack = MsgsAck {
            msg_ids: vec![3, 1, 2],
        };
        let decoded = MsgsAck::from_bytes(&ack.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.msg_ids, [3, 1, 2]);
    }

    #[test]
    fn rpc_result_keeps_the_raw_tail() {
        let inner = Ping { ping_id: 9 }.to_boxed_bytes().unwrap();
        let result = RpcResult {
            req_msg_id: 100,
            result: Blob(inner.clone()),
        };
        let decoded = RpcResult::from_bytes(&result.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.req_msg_id, 100);
        assert_eq!(decoded.result.0, inner);
    }

    #[test]
    fn every_flag_combination_round_trips() {
        for mask in 0u32..16 {
            let status = PeerStatus {
                online: (mask & 1) != 0,
                muted: (mask & 2) != 0,
                last_seen: if (mask & 4) != 0 { Some(1700000000) } else { None },
                title: if (mask & 8) != 0 {
                    Some("downstairs".to_string())
                } else {
                    None
                },
            };
            let bytes = status.to_bytes().unwrap();
            assert_eq!(
                PeerStatus::from_bytes(&bytes).unwrap(),
                status,
                "mask {:04b}",
                mask
            );
        }
    }

    #[test]
    fn presence_only_flags_consume_no_bytes() {
        let status = PeerStatus {
            online: true,
            muted: true,
            last_seen: None,
            title: None,
        };
        // Both booleans live entirely inside the flags word.
        assert_eq!(status.to_bytes().unwrap(), [0x03, 0, 0, 0]);

        let status = PeerStatus {
            online: false,
            muted: false,
            last_seen: Some(60),
            title: None,
        };
        assert_eq!(status.to_bytes().unwrap(), [0x04, 0, 0, 0, 60, 0, 0, 0]);
    }

    #[test]
    fn absent_fields_decode_to_their_default() {
        let decoded = PeerStatus::from_bytes(&[0, 0, 0, 0]).unwrap();
        assert_eq!(
            decoded,
            PeerStatus {
                online: false,
                muted: false,
                last_seen: None,
                title: None,
            }
        );
    }
}
