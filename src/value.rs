use num_bigint::BigInt;

/// A single CBOR data item.
///
/// `Value` is the type the codec exchanges with callers: [`crate::encode()`]
/// consumes one, [`crate::decode()`] produces one. Values are trees; nothing
/// in the decoder can produce a cycle, and the encoder never inspects a value
/// twice.
#[derive(Debug, Clone)]
pub enum Value {
    /// An arbitrary-precision signed integer.
    ///
    /// Values inside `[-(2^64), 2^64 - 1]` travel as native major-type 0/1
    /// items; anything wider is wrapped in a bignum tag (2 or 3).
    Integer(BigInt),

    /// An IEEE-754 double, including `±INFINITY` and `NAN`.
    ///
    /// All NaNs are the same logical value: the encoder emits the canonical
    /// half-precision pattern and [`PartialEq`] treats any two NaNs as equal.
    Float(f64),

    Bool(bool),
    Null,
    Undefined,

    /// An opaque byte string (major type 2).
    Bytes(Vec<u8>),

    /// A UTF-8 text string (major type 3).
    Text(String),

    /// An ordered sequence of values (major type 4).
    Array(Vec<Value>),

    /// Key/value pairs with pairwise-distinct keys (major type 5).
    ///
    /// The encoder orders pairs by the unsigned lexicographic comparison of
    /// their encoded keys, so the pair order held here does not survive a
    /// round trip; equality therefore ignores it.
    Map(Vec<(Value, Value)>),

    /// A major-type-7 simple value other than the named constants and floats.
    ///
    /// Valid codes are 0..=19 and 32..=255; the reserved codes 20..=31 are
    /// rejected by the encoder.
    Simple(u8),

    /// A tagged item the registry had no interpreter for, or a caller-built
    /// `(tag, inner)` envelope for the encoder.
    Tagged(u64, Box<Value>),

    /// Encode-only: a calendar datetime, emitted as tag 0 over an RFC 3339
    /// text string. Decoding tag 0 yields the text itself.
    DateTime(time::OffsetDateTime),

    /// Encode-only: an instant in time, emitted as tag 1 over epoch seconds
    /// (an integer when the sub-second part is zero, a double otherwise).
    Timestamp(time::OffsetDateTime),
}

impl Value {
    /// Builds a map value from any pair iterator.
    pub fn map<K, V, I>(pairs: I) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps a value in a tag envelope.
    pub fn tagged(tag: u64, inner: impl Into<Value>) -> Self {
        Value::Tagged(tag, Box::new(inner.into()))
    }

}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            // NaN is one logical value, so it must equal itself here
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            // Pair order is an encoding artifact, not part of the value
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.iter().any(|(k2, v2)| k == k2 && v == v2))
            }
            (Value::Simple(a), Value::Simple(b)) => a == b,
            (Value::Tagged(t1, v1), Value::Tagged(t2, v2)) => t1 == t2 && v1 == v2,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            _ => false,
        }
    }
}

impl From<BigInt> for Value {
    fn from(n: BigInt) -> Self {
        Value::Integer(n)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Integer(BigInt::from(n))
            }
        }
    )*};
}

impl_from_int!(u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<Vec<Value>> for Value {
    fn from(a: Vec<Value>) -> Self {
        Value::Array(a)
    }
}
