use crate::tags::{self, TagInterpreter};
use crate::value::Value;
use num_bigint::BigInt;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No input provided")]
    NoInput,

    #[error("Invalid initial byte {0:#04x}")]
    InvalidTypeTag(u8),

    #[error("Truncated unsigned integer")]
    TruncatedUnsignedInteger,

    #[error("Truncated negative integer")]
    TruncatedNegativeInteger,

    #[error("Truncated byte string")]
    TruncatedByteString,

    #[error("Truncated UTF-8 string")]
    TruncatedUtf8String,

    #[error("Truncated array")]
    TruncatedArray,

    #[error("Truncated map")]
    TruncatedMap,

    #[error("Truncated simple value")]
    TruncatedSimpleValue,

    #[error("Truncated float")]
    TruncatedFloat,

    #[error("Truncated tagged value")]
    TruncatedTaggedValue,

    #[error("Map item count is odd")]
    OddNumberOfMapValues,

    #[error("Invalid UTF-8 sequence in {0:02x?}")]
    InvalidUtf8String(Vec<u8>),

    #[error("UTF-8 sequence cut short at the end of {0:02x?}")]
    IncompleteUtf8String(Vec<u8>),

    #[error("Invalid simple value {0}")]
    InvalidSimpleValue(u8),

    #[error("Maximum recursion depth reached")]
    MaxDepthReached,

    #[error("Tag {0} cannot interpret {1:?}")]
    InvalidTaggedValue(u64, Box<Value>),

    #[error("Invalid base64 data")]
    InvalidBase64Data(#[source] base64::DecodeError),

    #[error("Invalid base64url data")]
    InvalidBase64UrlData(#[source] base64::DecodeError),

    #[error("Invalid embedded CBOR data")]
    InvalidCborData(#[source] Box<Error>),

    #[error("Trailing bytes after embedded CBOR item: {0:02x?}")]
    InvalidTrailingData(Vec<u8>),

    #[error(transparent)]
    InvalidHexString(#[from] hex::FromHexError),
}

/// Knobs for a decode call.
///
/// `tag_interpreters` replaces the default registry wholesale; callers who
/// want the defaults plus their own entries start from
/// [`tags::default_tag_interpreters`] and insert into it.
#[derive(Debug, Clone)]
pub struct Options {
    /// Maximum nesting depth. Opening an array, map, or tagged value at this
    /// depth fails with [`Error::MaxDepthReached`].
    pub max_depth: u32,

    pub tag_interpreters: HashMap<u64, TagInterpreter>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: 1024,
            tag_interpreters: tags::default_tag_interpreters(),
        }
    }
}

/// Decodes one CBOR item from the head of `data` with default [`Options`],
/// returning the value and the unconsumed remainder.
pub fn decode(data: &[u8]) -> Result<(Value, &[u8]), Error> {
    decode_with(data, &Options::default())
}

/// Decodes one CBOR item from the head of `data`.
pub fn decode_with<'a>(data: &'a [u8], options: &Options) -> Result<(Value, &'a [u8]), Error> {
    let (value, len) = decode_item(data, options, 0)?;
    Ok((value, &data[len..]))
}

/// Hex-decodes `text`, then decodes one CBOR item from it with default
/// [`Options`]. The remainder comes back hex-encoded.
pub fn decode_hex(text: &str) -> Result<(Value, String), Error> {
    decode_hex_with(text, &Options::default())
}

/// Hex-decodes `text`, then decodes one CBOR item from it.
pub fn decode_hex_with(text: &str, options: &Options) -> Result<(Value, String), Error> {
    let data = hex::decode(text)?;
    let (value, len) = decode_item(&data, options, 0)?;
    Ok((value, hex::encode(&data[len..])))
}

/// Bare truncation from the low-level readers; every call site renames this
/// to the kind of the item being read.
struct Truncated;

fn read_be<const N: usize>(data: &[u8]) -> Result<[u8; N], Truncated> {
    data.get(..N)
        .map(|s| s.try_into().unwrap())
        .ok_or(Truncated)
}

/// Reads the additional-info payload for a definite-length header. `minor`
/// is always <= 27 here; the dispatch in [`decode_item`] never routes the
/// reserved codes this way.
fn read_uint_minor(minor: u8, data: &[u8]) -> Result<(u64, usize), Truncated> {
    match minor {
        24 => data.first().map(|&b| (b as u64, 1)).ok_or(Truncated),
        25 => Ok((u16::from_be_bytes(read_be(data)?) as u64, 2)),
        26 => Ok((u32::from_be_bytes(read_be(data)?) as u64, 4)),
        27 => Ok((u64::from_be_bytes(read_be(data)?), 8)),
        val => Ok((val as u64, 0)),
    }
}

/// Reads a length header followed by that many payload bytes.
fn read_data_minor(minor: u8, data: &[u8]) -> Result<(&[u8], usize), Truncated> {
    let (data_len, len) = read_uint_minor(minor, data)?;
    let end = (len as u64).checked_add(data_len).ok_or(Truncated)?;
    if end > data.len() as u64 {
        return Err(Truncated);
    }
    let end = end as usize;
    Ok((&data[len..end], end))
}

enum ChunkError {
    Truncated,
    BadChunk(u8),
}

/// Reads an indefinite-length string body: definite-length chunks of the
/// same major type, terminated by 0xFF.
fn read_chunked(major: u8, data: &[u8]) -> Result<(Vec<u8>, usize), ChunkError> {
    let mut payload = Vec::new();
    let mut offset = 0;
    loop {
        let Some(&b) = data.get(offset) else {
            return Err(ChunkError::Truncated);
        };
        offset += 1;

        if b == 0xFF {
            return Ok((payload, offset));
        }
        if b >> 5 != major || b & 0x1F > 27 {
            return Err(ChunkError::BadChunk(b));
        }

        let (chunk, len) =
            read_data_minor(b & 0x1F, &data[offset..]).map_err(|_| ChunkError::Truncated)?;
        payload.extend_from_slice(chunk);
        offset += len;
    }
}

fn into_string(bytes: Vec<u8>) -> Result<String, Error> {
    String::from_utf8(bytes).map_err(|e| {
        // error_len() is None when more input could have completed the
        // sequence, i.e. the string was cut mid-character
        let incomplete = e.utf8_error().error_len().is_none();
        let bytes = e.into_bytes();
        if incomplete {
            Error::IncompleteUtf8String(bytes)
        } else {
            Error::InvalidUtf8String(bytes)
        }
    })
}

fn map_insert(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) {
    // A repeated key keeps its first position but takes the last value
    if let Some(slot) = pairs.iter_mut().find(|(k, _)| *k == key) {
        slot.1 = value;
    } else {
        pairs.push((key, value));
    }
}

/// Decodes one item, returning it and the number of bytes consumed.
///
/// `depth` is the current nesting level; descending into an array element,
/// map key/value, or tagged content adds one, and a container whose content
/// would exceed `options.max_depth` fails at the open.
pub(crate) fn decode_item(
    data: &[u8],
    options: &Options,
    depth: u32,
) -> Result<(Value, usize), Error> {
    let Some(&initial) = data.first() else {
        return Err(Error::NoInput);
    };
    let minor = initial & 0x1F;

    match initial {
        0x00..=0x1B => {
            let (n, len) =
                read_uint_minor(minor, &data[1..]).map_err(|_| Error::TruncatedUnsignedInteger)?;
            Ok((Value::Integer(BigInt::from(n)), len + 1))
        }
        0x20..=0x3B => {
            let (n, len) =
                read_uint_minor(minor, &data[1..]).map_err(|_| Error::TruncatedNegativeInteger)?;
            Ok((Value::Integer(BigInt::from(-1) - BigInt::from(n)), len + 1))
        }
        0x40..=0x5B => {
            let (payload, len) =
                read_data_minor(minor, &data[1..]).map_err(|_| Error::TruncatedByteString)?;
            Ok((Value::Bytes(payload.to_vec()), len + 1))
        }
        0x5F => {
            let (payload, len) = read_chunked(2, &data[1..]).map_err(|e| match e {
                ChunkError::Truncated => Error::TruncatedByteString,
                ChunkError::BadChunk(b) => Error::InvalidTypeTag(b),
            })?;
            Ok((Value::Bytes(payload), len + 1))
        }
        0x60..=0x7B => {
            let (payload, len) =
                read_data_minor(minor, &data[1..]).map_err(|_| Error::TruncatedUtf8String)?;
            Ok((Value::Text(into_string(payload.to_vec())?), len + 1))
        }
        0x7F => {
            let (payload, len) = read_chunked(3, &data[1..]).map_err(|e| match e {
                ChunkError::Truncated => Error::TruncatedUtf8String,
                ChunkError::BadChunk(b) => Error::InvalidTypeTag(b),
            })?;
            Ok((Value::Text(into_string(payload)?), len + 1))
        }
        0x80..=0x9B => {
            if depth >= options.max_depth {
                return Err(Error::MaxDepthReached);
            }
            let (count, len) =
                read_uint_minor(minor, &data[1..]).map_err(|_| Error::TruncatedArray)?;
            let mut offset = len + 1;
            // Every item is at least one byte, so cap the preallocation
            let mut items = Vec::with_capacity(count.min(data.len() as u64) as usize);
            for _ in 0..count {
                let (item, len) =
                    decode_item(&data[offset..], options, depth + 1).map_err(|e| match e {
                        Error::NoInput => Error::TruncatedArray,
                        e => e,
                    })?;
                items.push(item);
                offset += len;
            }
            Ok((Value::Array(items), offset))
        }
        0x9F => {
            if depth >= options.max_depth {
                return Err(Error::MaxDepthReached);
            }
            let mut offset = 1;
            let mut items = Vec::new();
            loop {
                match data.get(offset) {
                    None => return Err(Error::TruncatedArray),
                    Some(0xFF) => {
                        offset += 1;
                        return Ok((Value::Array(items), offset));
                    }
                    Some(_) => {
                        let (item, len) = decode_item(&data[offset..], options, depth + 1)?;
                        items.push(item);
                        offset += len;
                    }
                }
            }
        }
        0xA0..=0xBB => {
            if depth >= options.max_depth {
                return Err(Error::MaxDepthReached);
            }
            let (count, len) =
                read_uint_minor(minor, &data[1..]).map_err(|_| Error::TruncatedMap)?;
            let mut offset = len + 1;
            let mut pairs = Vec::new();
            for _ in 0..count {
                let (key, len) =
                    decode_item(&data[offset..], options, depth + 1).map_err(|e| match e {
                        Error::NoInput => Error::TruncatedMap,
                        e => e,
                    })?;
                offset += len;
                let (value, len) =
                    decode_item(&data[offset..], options, depth + 1).map_err(|e| match e {
                        Error::NoInput => Error::TruncatedMap,
                        e => e,
                    })?;
                offset += len;
                map_insert(&mut pairs, key, value);
            }
            Ok((Value::Map(pairs), offset))
        }
        0xBF => {
            if depth >= options.max_depth {
                return Err(Error::MaxDepthReached);
            }
            let mut offset = 1;
            let mut pairs = Vec::new();
            loop {
                match data.get(offset) {
                    None => return Err(Error::TruncatedMap),
                    Some(0xFF) => {
                        offset += 1;
                        return Ok((Value::Map(pairs), offset));
                    }
                    Some(_) => {
                        let (key, len) = decode_item(&data[offset..], options, depth + 1)?;
                        offset += len;
                        match data.get(offset) {
                            None => return Err(Error::TruncatedMap),
                            Some(0xFF) => return Err(Error::OddNumberOfMapValues),
                            Some(_) => {
                                let (value, len) =
                                    decode_item(&data[offset..], options, depth + 1)?;
                                offset += len;
                                map_insert(&mut pairs, key, value);
                            }
                        }
                    }
                }
            }
        }
        0xC0..=0xDB => {
            if depth >= options.max_depth {
                return Err(Error::MaxDepthReached);
            }
            let (tag, len) =
                read_uint_minor(minor, &data[1..]).map_err(|_| Error::TruncatedTaggedValue)?;
            let offset = len + 1;
            let (inner, inner_len) =
                decode_item(&data[offset..], options, depth + 1).map_err(|e| match e {
                    Error::NoInput => Error::TruncatedTaggedValue,
                    e => e,
                })?;
            let value = match options.tag_interpreters.get(&tag) {
                Some(interpret) => interpret(tag, inner, options, depth + 1)?,
                None => Value::Tagged(tag, Box::new(inner)),
            };
            Ok((value, offset + inner_len))
        }
        0xE0..=0xF3 => Ok((Value::Simple(minor), 1)),
        0xF4 => Ok((Value::Bool(false), 1)),
        0xF5 => Ok((Value::Bool(true), 1)),
        0xF6 => Ok((Value::Null, 1)),
        0xF7 => Ok((Value::Undefined, 1)),
        0xF8 => {
            let Some(&v) = data.get(1) else {
                return Err(Error::TruncatedSimpleValue);
            };
            if v < 32 {
                return Err(Error::InvalidSimpleValue(v));
            }
            Ok((Value::Simple(v), 2))
        }
        0xF9 => {
            let v =
                half::f16::from_be_bytes(read_be(&data[1..]).map_err(|_| Error::TruncatedFloat)?);
            Ok((Value::Float(v.into()), 3))
        }
        0xFA => {
            let v = f32::from_be_bytes(read_be(&data[1..]).map_err(|_| Error::TruncatedFloat)?);
            Ok((Value::Float(v.into()), 5))
        }
        0xFB => {
            let v = f64::from_be_bytes(read_be(&data[1..]).map_err(|_| Error::TruncatedFloat)?);
            Ok((Value::Float(v), 9))
        }
        _ => Err(Error::InvalidTypeTag(initial)),
    }
}
