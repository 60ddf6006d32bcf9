use crate::value::Value;
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Two map keys encode to the same bytes")]
    DuplicateMapKey,

    #[error("Value cannot be encoded: {0:?}")]
    UnencodableValue(Value),

    #[error("Datetime cannot be formatted as RFC 3339")]
    InvalidDateTime(#[from] time::error::Format),
}

#[derive(Default)]
struct Encoder {
    data: Vec<u8>,
}

impl Encoder {
    /// Writes a major-type header with the minimum-width additional info.
    fn emit_uint_minor(&mut self, major: u8, val: u64) {
        if val < 24 {
            self.data.push((major << 5) | (val as u8));
        } else if val <= u8::MAX as u64 {
            self.data.push((major << 5) | 24u8);
            self.data.push(val as u8);
        } else if val <= u16::MAX as u64 {
            self.data.push((major << 5) | 25u8);
            self.data.extend(&(val as u16).to_be_bytes());
        } else if val <= u32::MAX as u64 {
            self.data.push((major << 5) | 26u8);
            self.data.extend(&(val as u32).to_be_bytes());
        } else {
            self.data.push((major << 5) | 27u8);
            self.data.extend(&val.to_be_bytes());
        }
    }

    fn emit_value(&mut self, value: &Value) -> Result<(), Error> {
        match value {
            Value::Integer(n) => self.emit_integer(n),
            Value::Float(f) => self.emit_float(*f),
            Value::Bool(b) => self.data.push((7 << 5) | if *b { 21 } else { 20 }),
            Value::Null => self.data.push((7 << 5) | 22),
            Value::Undefined => self.data.push((7 << 5) | 23),
            Value::Bytes(b) => {
                self.emit_uint_minor(2, b.len() as u64);
                self.data.extend_from_slice(b);
            }
            Value::Text(s) => {
                self.emit_uint_minor(3, s.len() as u64);
                self.data.extend(s.as_bytes());
            }
            Value::Array(items) => {
                self.emit_uint_minor(4, items.len() as u64);
                for item in items {
                    self.emit_value(item)?;
                }
            }
            Value::Map(pairs) => self.emit_map(pairs)?,
            Value::Simple(v) => match v {
                0..=19 => self.data.push((7 << 5) | v),
                // 20..=23 are the named constants, 24..=31 are reserved
                20..=31 => return Err(Error::UnencodableValue(value.clone())),
                _ => {
                    self.data.push((7 << 5) | 24);
                    self.data.push(*v);
                }
            },
            Value::Tagged(tag, inner) => {
                self.emit_uint_minor(6, *tag);
                self.emit_value(inner)?;
            }
            Value::DateTime(dt) => {
                let text = dt.format(&Rfc3339)?;
                self.emit_uint_minor(6, 0);
                self.emit_uint_minor(3, text.len() as u64);
                self.data.extend(text.as_bytes());
            }
            Value::Timestamp(dt) => {
                self.emit_uint_minor(6, 1);
                let nanos = dt.unix_timestamp_nanos();
                if nanos.rem_euclid(1_000_000_000) == 0 {
                    self.emit_integer(&BigInt::from(nanos / 1_000_000_000));
                } else {
                    self.emit_float(nanos as f64 / 1e9);
                }
            }
        }
        Ok(())
    }

    fn emit_integer(&mut self, n: &BigInt) {
        if let Some(v) = n.to_u64() {
            self.emit_uint_minor(0, v);
        } else {
            // -1 - n is both the major-type-1 payload and the tag-3 magnitude
            let m = BigInt::from(-1) - n;
            if let Some(v) = m.to_u64() {
                self.emit_uint_minor(1, v);
            } else if m.sign() == num_bigint::Sign::Minus {
                // n > u64::MAX
                self.emit_uint_minor(6, 2);
                let magnitude = n.to_bytes_be().1;
                self.emit_uint_minor(2, magnitude.len() as u64);
                self.data.extend(magnitude);
            } else {
                // n < -(2^64)
                self.emit_uint_minor(6, 3);
                let magnitude = m.to_bytes_be().1;
                self.emit_uint_minor(2, magnitude.len() as u64);
                self.data.extend(magnitude);
            }
        }
    }

    fn emit_float(&mut self, f: f64) {
        if f.is_nan() {
            self.data.push((7 << 5) | 25);
            self.data.extend(&0x7E00u16.to_be_bytes());
        } else if f.is_infinite() {
            self.data.push((7 << 5) | 25);
            let bits: u16 = if f.is_sign_positive() { 0x7C00 } else { 0xFC00 };
            self.data.extend(&bits.to_be_bytes());
        } else {
            // Finite doubles always go at full width
            self.data.push((7 << 5) | 27);
            self.data.extend(&f.to_be_bytes());
        }
    }

    /// Emits a map with pairs ordered by the unsigned lexicographic
    /// comparison of their encoded keys.
    fn emit_map(&mut self, pairs: &[(Value, Value)]) -> Result<(), Error> {
        let mut encoded = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let mut k = Encoder::default();
            k.emit_value(key)?;
            let mut v = Encoder::default();
            v.emit_value(value)?;
            encoded.push((k.data, v.data));
        }
        encoded.sort_by(|(a, _), (b, _)| a.cmp(b));
        if encoded.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(Error::DuplicateMapKey);
        }
        self.emit_uint_minor(5, encoded.len() as u64);
        for (k, v) in encoded {
            self.data.extend(k);
            self.data.extend(v);
        }
        Ok(())
    }
}

/// Encodes a single value as a CBOR byte sequence.
pub fn encode(value: &Value) -> Result<Vec<u8>, Error> {
    let mut e = Encoder::default();
    e.emit_value(value)?;
    Ok(e.data)
}

/// Encodes a single value and hex-encodes the result.
pub fn encode_hex(value: &Value) -> Result<String, Error> {
    Ok(hex::encode(encode(value)?))
}
