//! An RFC 8949 CBOR codec over an owned [`Value`] model.
//!
//! [`encode`] turns a [`Value`] tree into CBOR bytes, picking minimum-width
//! headers and emitting map pairs in the deterministic order of their
//! encoded keys. [`decode`] reads exactly one item off the front of a byte
//! slice and hands back the remainder, bounding nesting depth along the way.
//! Tagged items pass through a pluggable interpreter registry
//! ([`default_tag_interpreters`]) that turns timestamps, bignums, embedded
//! CBOR, and base64 payloads into semantic values.
//!
//! ```
//! use cbor_codec::{decode, encode, Value};
//!
//! let value = Value::map([("a", 1u64), ("b", 2u64)]);
//! let bytes = encode(&value).unwrap();
//! assert_eq!(bytes, [0xA2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x02]);
//!
//! let (decoded, rest) = decode(&bytes).unwrap();
//! assert_eq!(decoded, value);
//! assert!(rest.is_empty());
//! ```

pub mod decode;
pub mod encode;
pub mod tags;
pub mod value;

pub use decode::{decode, decode_hex, decode_hex_with, decode_with, Options};
pub use encode::{encode, encode_hex};
pub use tags::{default_tag_interpreters, TagInterpreter};
pub use value::Value;



#[cfg(test)]
mod tags_tests;
