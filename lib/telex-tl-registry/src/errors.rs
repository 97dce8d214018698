// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Errors that can occur when registering constructors or decoding
//! boxed objects through a [`Registry`].
//!
//! [`Registry`]: crate::Registry
use std::error::Error;
use std::fmt;

use telex_tl::deserialize;

/// The error type for constructor registration. Colliding identifiers are
/// a build-time misconfiguration of the schema, so this is always a bug
/// in the registering code, never in the wire data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterError {
    /// Two different types tried to register the same constructor
    /// identifier.
    DuplicateConstructor {
        /// The contested constructor identifier.
        id: u32,

        /// The name of the type that registered the identifier first.
        existing: &'static str,

        /// The name of the type whose registration was rejected.
        rejected: &'static str,
    },
}

impl Error for RegisterError {}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::DuplicateConstructor {
                id,
                existing,
                rejected,
            } => write!(
                f,
                "constructor {:08x} already registered by {} (rejected {})",
                id, existing, rejected
            ),
        }
    }
}

/// The error type for decoding a boxed object.
///
/// TL does not generally carry a self-describing byte length, so an
/// unknown or partially-decoded nested value cannot be skipped safely:
/// every variant here is fatal to the enclosing decode. Recovering by
/// re-synchronizing on the stream is deliberately not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The stream ended before the leading constructor identifier could
    /// be read.
    UnexpectedEof,

    /// The leading constructor identifier is not present in the registry.
    /// This is the principal forward-compatibility failure: an older
    /// registry meeting a newer schema's type.
    UnknownConstructor {
        /// The identifier nothing was registered for.
        id: u32,
    },

    /// The dispatched reader failed while decoding the object's body.
    Body {
        /// The schema name of the type being decoded.
        constructor: &'static str,

        /// The constructor identifier being decoded.
        id: u32,

        /// The cursor position, in bytes, where decoding stopped.
        offset: usize,

        /// The underlying deserialization failure.
        source: deserialize::Error,
    },

    /// A transparently-wrapped payload failed to decompress.
    DecompressionFailed,
}

impl Error for DecodeError {}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::UnexpectedEof => write!(f, "unexpected eof reading constructor id"),
            Self::UnknownConstructor { id } => write!(f, "unknown constructor: {:08x}", id),
            Self::Body {
                constructor,
                id,
                offset,
                source,
            } => write!(
                f,
                "failed to decode {}#{:08x} at offset {}: {}",
                constructor, id, offset, source
            ),
            Self::DecompressionFailed => write!(f, "failed to decompress packed data"),
        }
    }
}
