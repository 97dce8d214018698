// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::sync::Arc;
use std::thread;

use telex_tl::{deserialize, serialize, Cursor, Deserializable, Identifiable, Serializable};
use telex_tl_registry::errors::DecodeError;
use telex_tl_registry::types::{self, Ping};
use telex_tl_registry::{write_boxed, Object, Registry};

include!("../../includes/check_deps_documented.rs");

/// This struct represents the following TL definition:
///
/// ```tl
/// note#00000001 flags:# value:int note:flags.0?string urgent:flags.1?Bool = Note;
/// ```
#[derive(Clone, Debug, PartialEq)]
struct Note {
    value: i32,
    note: Option<String>,
    urgent: Option<bool>,
}

impl Identifiable for Note {
    const CONSTRUCTOR_ID: u32 = 0x00000001;
    const NAME: &'static str = "note";
}

impl Serializable for Note {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        (0u32
            | if self.note.is_some() { 1 } else { 0 }
            | if self.urgent.is_some() { 2 } else { 0 })
        .serialize(buf)?;
        self.value.serialize(buf)?;
        if let Some(ref x) = self.note {
            x.serialize(buf)?;
        }
        if let Some(ref x) = self.urgent {
            x.serialize(buf)?;
        }
        Ok(())
    }
}

impl Deserializable for Note {
    fn deserialize(buf: &mut Cursor) -> Result<Self, deserialize::Error> {
        let flags = u32::deserialize(buf)?;
        let value = i32::deserialize(buf)?;
        let note = if (flags & 1) != 0 {
            Some(String::deserialize(buf)?)
        } else {
            None
        };
        let urgent = if (flags & 2) != 0 {
            Some(bool::deserialize(buf)?)
        } else {
            None
        };
        Ok(Self {
            value,
            note,
            urgent,
        })
    }
}

#[test]
fn boxed_object_end_to_end() {
    let mut registry = Registry::new();
    registry.register::<Note>().unwrap();

    let original = Note {
        value: 42,
        note: Some("hi".to_string()),
        urgent: None,
    };

    // id | flags (bit 0 set) | int | "hi" padded with one zero byte.
    let bytes = original.to_boxed_bytes().unwrap();
    assert_eq!(
        bytes,
        [0x01, 0, 0, 0, 0x01, 0, 0, 0, 0x2a, 0, 0, 0, 0x02, 0x68, 0x69, 0x00]
    );

    let decoded = registry
        .read_boxed(&mut Cursor::from_slice(&bytes))
        .unwrap();
    assert_eq!(decoded.downcast_ref::<Note>(), Some(&original));
}

#[test]
fn every_optional_combination_survives_the_registry() {
    let mut registry = Registry::new();
    registry.register::<Note>().unwrap();

    for mask in 0u32..4 {
        for urgent in [true, false] {
            let original = Note {
                value: -7,
                note: if (mask & 1) != 0 {
                    Some("remember the milk".to_string())
                } else {
                    None
                },
                urgent: if (mask & 2) != 0 { Some(urgent) } else { None },
            };
            let bytes = original.to_boxed_bytes().unwrap();
            let decoded = registry
                .read_boxed(&mut Cursor::from_slice(&bytes))
                .unwrap();
            assert_eq!(decoded.downcast_ref::<Note>(), Some(&original));
        }
    }
}

/// An object holding another boxed object of a type only known at
/// runtime; reading it back requires dispatching through the registry
/// from inside the reader.
#[derive(Debug)]
struct Envelope {
    inner: Box<dyn Object>,
}

impl Identifiable for Envelope {
    const CONSTRUCTOR_ID: u32 = 0x00000002;
    const NAME: &'static str = "envelope";
}

impl Serializable for Envelope {
    fn serialize(&self, buf: &mut impl Extend<u8>) -> Result<(), serialize::Error> {
        buf.extend(self.inner.to_boxed_bytes()?);
        Ok(())
    }
}

fn read_envelope(registry: &Registry, buf: &mut Cursor) -> Result<Box<dyn Object>, DecodeError> {
    let inner = registry.read_boxed(buf)?;
    Ok(Box::new(Envelope { inner }))
}

#[test]
fn nested_boxed_fields_dispatch_recursively() {
    let mut registry = Registry::new();
    registry.register::<Ping>().unwrap();
    registry
        .register_with(Envelope::CONSTRUCTOR_ID, Envelope::NAME, read_envelope)
        .unwrap();

    let envelope = Envelope {
        inner: Box::new(Ping { ping_id: 1234 }),
    };
    let mut bytes = Vec::new();
    write_boxed(&mut bytes, &envelope).unwrap();

    let decoded = registry
        .read_boxed(&mut Cursor::from_slice(&bytes))
        .unwrap();
    let envelope = decoded.downcast_ref::<Envelope>().unwrap();
    assert_eq!(
        envelope.inner.downcast_ref::<Ping>(),
        Some(&Ping { ping_id: 1234 })
    );
}

#[test]
fn nested_unknown_constructor_aborts_the_whole_decode() {
    let mut registry = Registry::new();
    registry
        .register_with(Envelope::CONSTRUCTOR_ID, Envelope::NAME, read_envelope)
        .unwrap();

    // An envelope whose inner object was never registered.
    let envelope = Envelope {
        inner: Box::new(Ping { ping_id: 0 }),
    };
    let mut bytes = Vec::new();
    write_boxed(&mut bytes, &envelope).unwrap();

    let err = registry
        .read_boxed(&mut Cursor::from_slice(&bytes))
        .unwrap_err();
    assert_eq!(
        err,
        DecodeError::UnknownConstructor {
            id: Ping::CONSTRUCTOR_ID
        }
    );
}

#[test]
fn decode_failures_name_the_type() {
    let mut registry = Registry::new();
    registry.register::<Note>().unwrap();

    // Flags claim a note string follows, but the bytes end after `value`.
    let bytes = [0x01, 0, 0, 0, 0x01, 0, 0, 0, 0x2a, 0, 0, 0];
    let err = registry
        .read_boxed(&mut Cursor::from_slice(&bytes))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "failed to decode note#00000001 at offset 12: unexpected eof"
    );
}

#[test]
fn concurrent_reads_share_one_registry() {
    let mut registry = Registry::new();
    types::register_builtin(&mut registry).unwrap();
    let registry = Arc::new(registry);
    let bytes = Arc::new(Ping { ping_id: 1 }.to_boxed_bytes().unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let bytes = Arc::clone(&bytes);
            thread::spawn(move || {
                for _ in 0..1000 {
                    let obj = registry
                        .read_boxed(&mut Cursor::from_slice(&bytes))
                        .unwrap();
                    assert!(obj.is::<Ping>());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}
