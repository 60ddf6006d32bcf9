//! The tag-interpreter registry.
//!
//! After the decoder has produced the inner value of a tagged item, the
//! registry may transform `(tag, inner)` into a semantic value: epoch
//! timestamps become nanosecond integers, bignum byte strings become
//! integers, embedded CBOR is decoded in place, and so on. Tags with no
//! registered interpreter come back verbatim as [`Value::Tagged`].

use crate::decode::{self, Error, Options};
use crate::value::Value;
use base64::prelude::*;
use num_bigint::{BigInt, Sign};
use num_traits::FromPrimitive;
use std::collections::HashMap;

/// A per-tag transform, invoked with the decoded inner value.
///
/// `depth` is the nesting level the inner value was decoded at; an
/// interpreter that re-enters the decoder (tag 24) passes it through so
/// embedded nesting still counts against `options.max_depth`.
pub type TagInterpreter =
    fn(tag: u64, inner: Value, options: &Options, depth: u32) -> Result<Value, Error>;

/// The registry the default [`Options`] carry.
///
/// | Tag | Meaning |
/// |-----|---------|
/// | 0 | RFC 3339 datetime text, passed through |
/// | 1 | epoch seconds, converted to a nanosecond integer |
/// | 2, 3 | positive / negative bignum |
/// | 24 | embedded CBOR item, decoded in place |
/// | 32, 35, 36 | URI / regex / MIME text, passed through |
/// | 33, 34 | base64url / base64 text, decoded to bytes |
/// | 55799 | self-described CBOR marker, stripped |
pub fn default_tag_interpreters() -> HashMap<u64, TagInterpreter> {
    let mut m: HashMap<u64, TagInterpreter> = HashMap::new();
    m.insert(0, interpret_text);
    m.insert(1, interpret_epoch_time);
    m.insert(2, interpret_positive_bignum);
    m.insert(3, interpret_negative_bignum);
    m.insert(24, interpret_embedded_cbor);
    m.insert(32, interpret_text);
    m.insert(33, interpret_base64url);
    m.insert(34, interpret_base64);
    m.insert(35, interpret_text);
    m.insert(36, interpret_text);
    m.insert(55799, interpret_self_described);
    m
}

/// Tags 0, 32, 35, 36: the payload must be text and stays as-is.
fn interpret_text(tag: u64, inner: Value, _options: &Options, _depth: u32) -> Result<Value, Error> {
    match inner {
        Value::Text(_) => Ok(inner),
        inner => Err(Error::InvalidTaggedValue(tag, Box::new(inner))),
    }
}

/// Tag 1: epoch seconds (integer or float) to nanoseconds since the epoch.
///
/// Float seconds are rounded to whole nanoseconds in f64 arithmetic;
/// sub-nanosecond precision does not survive.
fn interpret_epoch_time(
    tag: u64,
    inner: Value,
    _options: &Options,
    _depth: u32,
) -> Result<Value, Error> {
    match inner {
        Value::Integer(n) => Ok(Value::Integer(n * 1_000_000_000)),
        Value::Float(f) => match BigInt::from_f64((f * 1e9).round()) {
            Some(n) => Ok(Value::Integer(n)),
            None => Err(Error::InvalidTaggedValue(tag, Box::new(Value::Float(f)))),
        },
        inner => Err(Error::InvalidTaggedValue(tag, Box::new(inner))),
    }
}

/// Tag 2: big-endian unsigned magnitude bytes.
fn interpret_positive_bignum(
    tag: u64,
    inner: Value,
    _options: &Options,
    _depth: u32,
) -> Result<Value, Error> {
    match inner {
        Value::Bytes(b) => Ok(Value::Integer(BigInt::from_bytes_be(Sign::Plus, &b))),
        inner => Err(Error::InvalidTaggedValue(tag, Box::new(inner))),
    }
}

/// Tag 3: -1 - magnitude.
fn interpret_negative_bignum(
    tag: u64,
    inner: Value,
    _options: &Options,
    _depth: u32,
) -> Result<Value, Error> {
    match inner {
        Value::Bytes(b) => Ok(Value::Integer(
            BigInt::from(-1) - BigInt::from_bytes_be(Sign::Plus, &b),
        )),
        inner => Err(Error::InvalidTaggedValue(tag, Box::new(inner))),
    }
}

/// Tag 24: the byte string holds one complete encoded CBOR item.
///
/// Decoding restarts at the depth this interpreter was given, so nesting
/// inside the embedded item composes with the outer `max_depth` bound.
fn interpret_embedded_cbor(
    tag: u64,
    inner: Value,
    options: &Options,
    depth: u32,
) -> Result<Value, Error> {
    match inner {
        Value::Bytes(b) => {
            let (value, len) = decode::decode_item(&b, options, depth)
                .map_err(|e| Error::InvalidCborData(Box::new(e)))?;
            if len < b.len() {
                return Err(Error::InvalidTrailingData(b[len..].to_vec()));
            }
            Ok(value)
        }
        inner => Err(Error::InvalidTaggedValue(tag, Box::new(inner))),
    }
}

/// Tag 33: base64url text (unpadded) to bytes.
fn interpret_base64url(
    tag: u64,
    inner: Value,
    _options: &Options,
    _depth: u32,
) -> Result<Value, Error> {
    match inner {
        Value::Text(s) => BASE64_URL_SAFE_NO_PAD
            .decode(s.as_bytes())
            .map(Value::Bytes)
            .map_err(Error::InvalidBase64UrlData),
        inner => Err(Error::InvalidTaggedValue(tag, Box::new(inner))),
    }
}

/// Tag 34: classic base64 text to bytes.
fn interpret_base64(
    tag: u64,
    inner: Value,
    _options: &Options,
    _depth: u32,
) -> Result<Value, Error> {
    match inner {
        Value::Text(s) => BASE64_STANDARD
            .decode(s.as_bytes())
            .map(Value::Bytes)
            .map_err(Error::InvalidBase64Data),
        inner => Err(Error::InvalidTaggedValue(tag, Box::new(inner))),
    }
}

/// Tag 55799: the self-described CBOR envelope adds nothing.
fn interpret_self_described(
    _tag: u64,
    inner: Value,
    _options: &Options,
    _depth: u32,
) -> Result<Value, Error> {
    Ok(inner)
}
