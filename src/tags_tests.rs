use super::decode::*;
use super::tags::*;
use super::value::Value;
use hex_literal::hex;
use num_bigint::BigInt;

fn dec(data: &[u8]) -> Value {
    let (v, rest) = decode(data).unwrap();
    assert!(rest.is_empty());
    v
}

#[test]
fn default_registry_contents() {
    let registry = default_tag_interpreters();
    assert_eq!(registry.len(), 11);
    for tag in [0, 1, 2, 3, 24, 32, 33, 34, 35, 36, 55799] {
        assert!(registry.contains_key(&tag), "tag {tag}");
    }
}

#[test]
fn datetime_text() {
    assert_eq!(
        dec(&hex!("c074323031332d30332d32315432303a30343a30305a")),
        Value::from("2013-03-21T20:04:00Z")
    );
    assert!(matches!(
        decode(&hex!("c000")),
        Err(Error::InvalidTaggedValue(0, _))
    ));
}

#[test]
fn epoch_time_to_nanoseconds() {
    assert_eq!(
        dec(&hex!("c11a514b67b0")),
        Value::from(1363896240000000000u64)
    );
    assert_eq!(
        dec(&hex!("c1fb41d452d9ec200000")),
        Value::from(1363896240500000000u64)
    );
    assert_eq!(dec(&hex!("c120")), Value::from(-1000000000));
    assert_eq!(dec(&hex!("c1f93e00")), Value::from(1500000000));

    assert!(matches!(
        decode(&hex!("c16161")),
        Err(Error::InvalidTaggedValue(1, _))
    ));
    // Non-finite seconds have no nanosecond representation
    assert!(matches!(
        decode(&hex!("c1f97e00")),
        Err(Error::InvalidTaggedValue(1, _))
    ));
    assert!(matches!(
        decode(&hex!("c1f97c00")),
        Err(Error::InvalidTaggedValue(1, _))
    ));
}

#[test]
fn bignums() {
    assert_eq!(
        dec(&hex!("c249010000000000000000")),
        Value::from(18446744073709551616u128)
    );
    assert_eq!(
        dec(&hex!("c349010000000000000000")),
        Value::from(-18446744073709551617i128)
    );
    assert_eq!(dec(&hex!("c240")), Value::from(0));
    assert_eq!(dec(&hex!("c340")), Value::from(-1));
    assert_eq!(dec(&hex!("c24101")), Value::from(1));

    // An indefinite-length payload is still a byte string
    assert_eq!(
        dec(&hex!("c25f42010243030405ff")),
        Value::Integer(BigInt::from_bytes_be(
            num_bigint::Sign::Plus,
            &hex!("0102030405")
        ))
    );

    assert!(matches!(
        decode(&hex!("c26161")),
        Err(Error::InvalidTaggedValue(2, _))
    ));
    assert!(matches!(
        decode(&hex!("c300")),
        Err(Error::InvalidTaggedValue(3, _))
    ));
}

#[test]
fn embedded_cbor() {
    assert_eq!(dec(&hex!("d818456449455446")), Value::from("IETF"));
    assert_eq!(
        dec(&hex!("d8184c83a201020304f64401020304")),
        Value::Array(vec![
            Value::map([(1, 2), (3, 4)]),
            Value::Null,
            Value::Bytes(hex!("01020304").to_vec()),
        ])
    );

    assert!(matches!(
        decode(&hex!("d8186449455446")),
        Err(Error::InvalidTaggedValue(24, _))
    ));
    assert!(matches!(
        decode(&hex!("d81846644945544600")),
        Err(Error::InvalidTrailingData(b)) if b == hex!("00")
    ));
    assert!(matches!(
        decode(&hex!("d81841ff")),
        Err(Error::InvalidCborData(_))
    ));
    assert!(matches!(
        decode(&hex!("d8184118")),
        Err(Error::InvalidCborData(_))
    ));
}

#[test]
fn embedded_cbor_respects_depth() {
    // The embedded item keeps counting from the tag's content depth: the
    // outer envelope is one level, its inner array two, the nested one three
    let input = hex!("d818449f9fffff");

    let options = Options {
        max_depth: 3,
        ..Default::default()
    };
    assert_eq!(
        decode_with(&input, &options).unwrap().0,
        Value::Array(vec![Value::Array(vec![])])
    );

    let options = Options {
        max_depth: 2,
        ..Default::default()
    };
    assert!(matches!(
        decode_with(&input, &options),
        Err(Error::InvalidCborData(e)) if matches!(*e, Error::MaxDepthReached)
    ));
}

#[test]
fn uri_and_friends_pass_through() {
    assert_eq!(
        dec(&hex!("d82076687474703a2f2f7777772e6578616d706c652e636f6d")),
        Value::from("http://www.example.com")
    );
    // Tags 35 (regex) and 36 (MIME message) behave the same way
    assert_eq!(dec(&hex!("d823626161")), Value::from("aa"));
    assert_eq!(dec(&hex!("d824626161")), Value::from("aa"));

    assert!(matches!(
        decode(&hex!("d8204401020304")),
        Err(Error::InvalidTaggedValue(32, _))
    ));
}

#[test]
fn base64url_blobs() {
    // "aGVsbG8" is unpadded base64url for b"hello"
    assert_eq!(
        dec(&hex!("d8216761475673624738")),
        Value::Bytes(b"hello".to_vec())
    );
    assert!(matches!(
        decode(&hex!("d82163212121")),
        Err(Error::InvalidBase64UrlData(_))
    ));
    assert!(matches!(
        decode(&hex!("d82100")),
        Err(Error::InvalidTaggedValue(33, _))
    ));
}

#[test]
fn base64_blobs() {
    // "aGVsbG8=" is padded base64 for b"hello"
    assert_eq!(
        dec(&hex!("d82268614756736247383d")),
        Value::Bytes(b"hello".to_vec())
    );
    assert!(matches!(
        decode(&hex!("d82263212121")),
        Err(Error::InvalidBase64Data(_))
    ));
    assert!(matches!(
        decode(&hex!("d82200")),
        Err(Error::InvalidTaggedValue(34, _))
    ));
}

#[test]
fn self_described_cbor() {
    assert_eq!(
        dec(&hex!("d9d9f783010203")),
        Value::Array(vec![Value::from(1), Value::from(2), Value::from(3)])
    );
    assert_eq!(dec(&hex!("d9d9f700")), Value::from(0));
}

#[test]
fn unknown_tags_come_back_verbatim() {
    assert_eq!(
        dec(&hex!("d74401020304")),
        Value::tagged(23, Value::Bytes(hex!("01020304").to_vec()))
    );
    assert_eq!(dec(&hex!("d86f01")), Value::tagged(111, 1));
    assert_eq!(
        dec(&hex!("dbffffffffffffffff00")),
        Value::tagged(u64::MAX, 0)
    );
}

#[test]
fn registry_replacement() {
    // An empty registry leaves every tag uninterpreted
    let options = Options {
        tag_interpreters: Default::default(),
        ..Default::default()
    };
    assert_eq!(
        decode_with(&hex!("c11a514b67b0"), &options).unwrap().0,
        Value::tagged(1, 1363896240)
    );

    // A custom entry wins over nothing; merging with the defaults is the
    // caller's business
    fn shout(_tag: u64, _inner: Value, _options: &Options, _depth: u32) -> Result<Value, Error> {
        Ok(Value::from("custom"))
    }
    let mut tag_interpreters = default_tag_interpreters();
    tag_interpreters.insert(1, shout);
    let options = Options {
        tag_interpreters,
        ..Default::default()
    };
    assert_eq!(
        decode_with(&hex!("c11a514b67b0"), &options).unwrap().0,
        Value::from("custom")
    );
    // The rest of the defaults still apply
    assert_eq!(
        decode_with(&hex!("d818456449455446"), &options).unwrap().0,
        Value::from("IETF")
    );
}
