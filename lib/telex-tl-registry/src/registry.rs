// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::any::Any;
use std::collections::hash_map::Entry as MapEntry;
use std::collections::HashMap;
use std::fmt;

use log::{debug, trace};
use telex_tl::{Cursor, Deserializable, Identifiable, Serializable};

use crate::errors::{DecodeError, RegisterError};
use crate::object::Object;

/// The signature of a registered reader. Readers receive the registry
/// itself so that objects with nested boxed fields can recursively
/// dispatch on them.
pub type ReadFn = fn(&Registry, &mut Cursor) -> Result<Box<dyn Object>, DecodeError>;

struct Entry {
    name: &'static str,
    read: ReadFn,
}

/// Maps constructor identifiers to the readers that can decode their
/// bodies, enabling decode of boxed values without prior knowledge of
/// their concrete type.
///
/// There is deliberately no process-wide instance: whatever component
/// needs decode capability constructs and owns one, which keeps tests
/// isolated and makes the set of known constructors explicit. Populate it
/// once on startup (registration needs `&mut self`), then share it freely;
/// lookups only take `&self` and are safe from any number of threads.
///
/// # Examples
///
/// ```
/// use telex_tl::Cursor;
/// use telex_tl_registry::types::{self, Ping};
/// use telex_tl_registry::Registry;
///
/// let mut registry = Registry::new();
/// types::register_builtin(&mut registry).unwrap();
///
/// let bytes = [0xec, 0x77, 0xbe, 0x7a, 0x2a, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0, 0x0];
/// let obj = registry.read_boxed(&mut Cursor::from_slice(&bytes)).unwrap();
/// assert_eq!(obj.downcast_ref::<Ping>(), Some(&Ping { ping_id: 42 }));
/// ```
pub struct Registry {
    entries: HashMap<u32, Entry>,
}

impl Registry {
    /// Creates a new, empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Registers `T` under its own constructor identifier.
    ///
    /// Fails with [`RegisterError::DuplicateConstructor`] if the
    /// identifier is already taken; identifiers must be unique within one
    /// registry, or dispatch would be ambiguous.
    pub fn register<T>(&mut self) -> Result<(), RegisterError>
    where
        T: Identifiable + Serializable + Deserializable + fmt::Debug + Any,
    {
        self.register_with(T::CONSTRUCTOR_ID, T::NAME, read_body::<T>)
    }

    /// Registers a custom reader for a constructor identifier.
    ///
    /// This is the escape hatch for objects whose body cannot be read by
    /// a plain [`Deserializable`] impl, typically because a field is
    /// itself a boxed object that must be dispatched through the registry.
    pub fn register_with(
        &mut self,
        id: u32,
        name: &'static str,
        read: ReadFn,
    ) -> Result<(), RegisterError> {
        match self.entries.entry(id) {
            MapEntry::Occupied(entry) => Err(RegisterError::DuplicateConstructor {
                id,
                existing: entry.get().name,
                rejected: name,
            }),
            MapEntry::Vacant(entry) => {
                entry.insert(Entry { name, read });
                Ok(())
            }
        }
    }

    /// The schema name registered for an identifier, if any.
    pub fn name_for_id(&self, id: u32) -> Option<&'static str> {
        self.entries.get(&id).map(|entry| entry.name)
    }

    /// Whether an identifier has been registered.
    pub fn contains(&self, id: u32) -> bool {
        self.entries.contains_key(&id)
    }

    /// The number of registered constructors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads one boxed object: the leading 4-byte constructor identifier,
    /// then the body, dispatched to whichever reader the identifier was
    /// registered with.
    ///
    /// Fails with [`DecodeError::UnknownConstructor`] for identifiers
    /// nothing was registered for. Since TL carries no self-describing
    /// byte length, the unknown body cannot be skipped, so this is fatal
    /// to the enclosing decode.
    pub fn read_boxed(&self, buf: &mut Cursor) -> Result<Box<dyn Object>, DecodeError> {
        let id = u32::deserialize(buf).map_err(|_| DecodeError::UnexpectedEof)?;
        let entry = self
            .entries
            .get(&id)
            .ok_or(DecodeError::UnknownConstructor { id })?;

        trace!("dispatching constructor {:08x} to {}", id, entry.name);
        match (entry.read)(self, buf) {
            Ok(obj) => Ok(obj),
            Err(err) => {
                debug!("decode failed: {}", err);
                Err(err)
            }
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

fn read_body<T>(_registry: &Registry, buf: &mut Cursor) -> Result<Box<dyn Object>, DecodeError>
where
    T: Identifiable + Serializable + Deserializable + fmt::Debug + Any,
{
    match T::deserialize(buf) {
        Ok(body) => Ok(Box::new(body)),
        Err(source) => Err(DecodeError::Body {
            constructor: T::NAME,
            id: T::CONSTRUCTOR_ID,
            offset: buf.pos(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Ping, Pong, RpcError};
    use telex_tl::deserialize;

    fn registry() -> Registry {
        let mut registry = Registry::new();
        registry.register::<Ping>().unwrap();
        registry.register::<Pong>().unwrap();
        registry
    }

    #[test]
    fn dispatches_to_the_registered_reader() {
        let registry = registry();

        let ping = Ping { ping_id: -1 };
        let obj = registry
            .read_boxed(&mut Cursor::from_slice(&ping.to_boxed_bytes().unwrap()))
            .unwrap();
        assert_eq!(obj.downcast_ref::<Ping>(), Some(&ping));
        assert!(obj.downcast_ref::<Pong>().is_none());

        let pong = Pong {
            msg_id: 7,
            ping_id: -1,
        };
        let obj = registry
            .read_boxed(&mut Cursor::from_slice(&pong.to_boxed_bytes().unwrap()))
            .unwrap();
        assert_eq!(obj.downcast_ref::<Pong>(), Some(&pong));
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = registry();
        assert_eq!(
            registry.register::<Ping>(),
            Err(RegisterError::DuplicateConstructor {
                id: Ping::CONSTRUCTOR_ID,
                existing: "ping",
                rejected: "ping",
            })
        );
        // The original entry must survive the rejected registration.
        assert_eq!(registry.name_for_id(Ping::CONSTRUCTOR_ID), Some("ping"));
    }

    #[test]
    fn unknown_constructor_carries_the_id() {
        let registry = registry();
        let err = registry
            .read_boxed(&mut Cursor::from_slice(&[0xde, 0xc0, 0xad, 0x0b, 0, 0]))
            .unwrap_err();
        assert_eq!(err, DecodeError::UnknownConstructor { id: 0x0badc0de });
    }

    #[test]
    fn missing_header_is_eof() {
        let registry = registry();
        let err = registry
            .read_boxed(&mut Cursor::from_slice(&[0xec, 0x77]))
            .unwrap_err();
        assert_eq!(err, DecodeError::UnexpectedEof);
    }

    #[test]
    fn truncated_body_names_the_constructor() {
        let mut registry = registry();
        registry.register::<RpcError>().unwrap();

        // rpc_error with its error_message cut off mid-string.
        let mut bytes = RpcError {
            error_code: 420,
            error_message: "FLOOD_WAIT_3".to_string(),
        }
        .to_boxed_bytes()
        .unwrap();
        bytes.truncate(bytes.len() - 4);

        let err = registry
            .read_boxed(&mut Cursor::from_slice(&bytes))
            .unwrap_err();
        match err {
            DecodeError::Body {
                constructor,
                id,
                source,
                ..
            } => {
                assert_eq!(constructor, "rpc_error");
                assert_eq!(id, RpcError::CONSTRUCTOR_ID);
                assert_eq!(source, deserialize::Error::UnexpectedEof);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn name_lookup() {
        let registry = registry();
        assert_eq!(registry.name_for_id(Ping::CONSTRUCTOR_ID), Some("ping"));
        assert_eq!(registry.name_for_id(0x0badc0de), None);
        assert!(registry.contains(Pong::CONSTRUCTOR_ID));
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }
}
