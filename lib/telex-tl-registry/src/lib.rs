// Copyright 2024 - developers of the `telex` project.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Polymorphic decoding for TL-serialized objects.
//!
//! A boxed TL value is self-describing: it leads with the 32-bit
//! constructor identifier of its concrete type. This crate provides the
//! [`Registry`] that maps those identifiers to readers, the dynamic
//! [`Object`] trait decoded values come back as, and a small built-in
//! vocabulary of concrete [`types`] (plus the transparent [`GzipPacked`]
//! wrapper).
//!
//! ```
//! use telex_tl::Cursor;
//! use telex_tl_registry::types::{self, Ping};
//! use telex_tl_registry::{write_boxed, Registry};
//!
//! // Built once at startup, read-only afterward.
//! let mut registry = Registry::new();
//! types::register_builtin(&mut registry).unwrap();
//!
//! let mut buffer = Vec::new();
//! write_boxed(&mut buffer, &Ping { ping_id: 7 }).unwrap();
//!
//! let obj = registry.read_boxed(&mut Cursor::from_slice(&buffer)).unwrap();
//! assert_eq!(obj.downcast_ref::<Ping>(), Some(&Ping { ping_id: 7 }));
//! ```
//!
//! # Features
//!
//! * `impl-serde`: implements `serde`'s `Serialize` and `Deserialize`
//!   for the built-in [`types`].

pub mod errors;
mod object;
mod packed;
mod registry;
pub mod types;

pub use object::{write_boxed, Object};
pub use packed::GzipPacked;
pub use registry::{ReadFn, Registry};
