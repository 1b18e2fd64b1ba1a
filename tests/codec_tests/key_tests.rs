//! Tests for the composite key codec
//!
//! These tests verify:
//! - Head encode/decode for every db, tag and name length
//! - Contiguity of a collection's records in key order
//! - Rejection of over-long names
//! - Typed record decoding and its error cases

use frostkv::codec::{
    db_prefix, decode_head, decode_record, encode_head, encode_member, head_prefix, tag_prefix, Record, TypeTag,
    ZsetMember, MAX_NAME_LEN,
};
use frostkv::FrostError;
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn any_tag() -> impl Strategy<Value = TypeTag> {
    prop_oneof![
        Just(TypeTag::String),
        Just(TypeTag::Hash),
        Just(TypeTag::Set),
        Just(TypeTag::SortedSet),
        Just(TypeTag::FrozenMarker),
    ]
}

fn member_tag() -> impl Strategy<Value = TypeTag> {
    prop_oneof![Just(TypeTag::Hash), Just(TypeTag::Set), Just(TypeTag::SortedSet)]
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_head_decodes_to_its_parts(
        db in any::<u8>(),
        tag in any_tag(),
        name in proptest::collection::vec(any::<u8>(), 0..=MAX_NAME_LEN),
    ) {
        let head = encode_head(db, tag, &name).unwrap();
        let (got_db, got_tag, name_len) = decode_head(&head).unwrap();

        prop_assert_eq!(got_db, db);
        prop_assert_eq!(got_tag, tag.as_byte());
        prop_assert_eq!(name_len, name.len());
        prop_assert_eq!(&head[3..3 + name_len], &name[..]);
    }

    #[test]
    fn prop_members_sort_inside_their_collection(
        db in any::<u8>(),
        tag in member_tag(),
        name in proptest::collection::vec(any::<u8>(), 1..32),
        members in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 1..8),
        other in proptest::collection::vec(any::<u8>(), 1..32),
    ) {
        prop_assume!(other != name);
        let head = encode_head(db, tag, &name).unwrap();
        let other_head = encode_head(db, tag, &other).unwrap();
        let other_key = encode_member(&other_head, b"x");

        let mut keys: Vec<Vec<u8>> = members.iter().map(|m| encode_member(&head, m)).collect();
        keys.push(other_key.clone());
        keys.sort();

        // The other collection sorts entirely before or entirely after
        let position = keys.iter().position(|k| *k == other_key).unwrap();
        prop_assert!(position == 0 || position == keys.len() - 1);
        for key in keys.iter().filter(|k| **k != other_key) {
            prop_assert!(key.starts_with(&head));
        }
    }
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_string_head_layout() {
    let head = encode_head(2, TypeTag::String, b"greeting").unwrap();
    assert_eq!(head, b"\x02c\x08greeting".to_vec());
}

#[test]
fn test_member_head_layout() {
    let head = encode_head(0, TypeTag::Hash, b"user:1").unwrap();
    assert_eq!(head, b"\x00h\x06user:1=".to_vec());
    assert_eq!(encode_member(&head, b"name"), b"\x00h\x06user:1=name".to_vec());
    assert_eq!(head_prefix(0, TypeTag::Hash, b"user:1").unwrap(), head);
}

#[test]
fn test_prefixes() {
    assert_eq!(tag_prefix(5, TypeTag::FrozenMarker), [5, b'f']);
    assert_eq!(db_prefix(7), [7]);
}

#[test]
fn test_name_of_255_bytes_is_accepted() {
    let name = vec![b'n'; MAX_NAME_LEN];
    let head = encode_head(0, TypeTag::Set, &name).unwrap();
    assert_eq!(head[2], 255);
}

#[test]
fn test_name_of_256_bytes_is_rejected() {
    let name = vec![b'n'; MAX_NAME_LEN + 1];
    let err = encode_head(0, TypeTag::String, &name).unwrap_err();
    assert!(matches!(err, FrostError::NameTooLong(256)));
}

#[test]
fn test_integer_member_renders_as_decimal_text() {
    let mut by_int = b"\x00z\x01k=".to_vec();
    ZsetMember::Int(-42).append_to(&mut by_int);
    let mut by_bytes = b"\x00z\x01k=".to_vec();
    ZsetMember::from(&b"-42"[..]).append_to(&mut by_bytes);
    assert_eq!(by_int, by_bytes);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_each_record_type() {
    let string = decode_record(b"\x00c\x01k", b"v").unwrap();
    assert_eq!(string.tag(), TypeTag::String);
    assert!(matches!(string, Record::String { db: 0, ref name, ref value } if name == "k" && value == "v"));

    let field = decode_record(b"\x01h\x01k=f", b"v").unwrap();
    assert!(matches!(field, Record::HashField { db: 1, ref field, .. } if field == "f"));

    let member = decode_record(b"\x02s\x01k=m", b"").unwrap();
    assert!(matches!(member, Record::SetMember { db: 2, ref member, .. } if member == "m"));

    let scored = decode_record(b"\x03z\x01k=m", b"2.5").unwrap();
    assert!(matches!(scored, Record::ZsetMember { db: 3, score, .. } if score == 2.5));

    let marker = decode_record(b"\x04f\x01k", b"h").unwrap();
    assert!(matches!(marker, Record::FrozenMarker { db: 4, tag: TypeTag::Hash, .. }));
}

#[test]
fn test_member_may_contain_separator_and_nul() {
    let head = encode_head(0, TypeTag::Hash, b"a=b").unwrap();
    let key = encode_member(&head, b"x=\x00y");
    let record = decode_record(&key, b"v").unwrap();

    assert_eq!(record.name().as_ref(), b"a=b");
    assert!(matches!(record, Record::HashField { ref field, .. } if field.as_ref() == b"x=\x00y"));
}

#[test]
fn test_decode_rejects_short_key() {
    assert!(matches!(decode_head(b"\x00c"), Err(FrostError::Corruption(_))));
}

#[test]
fn test_decode_rejects_unknown_tag() {
    let err = decode_record(b"\x00x\x01k", b"").unwrap_err();
    assert!(matches!(err, FrostError::UnknownTypeTag { db: 0, tag: b'x' }));
    assert!(err.is_fatal());
}

#[test]
fn test_decode_rejects_truncated_name() {
    let err = decode_record(b"\x00c\x05ab", b"").unwrap_err();
    assert!(matches!(err, FrostError::Corruption(_)));
}

#[test]
fn test_decode_rejects_missing_separator() {
    assert!(matches!(decode_record(b"\x00h\x01k", b"v"), Err(FrostError::Corruption(_))));
    assert!(matches!(decode_record(b"\x00s\x01kXm", b""), Err(FrostError::Corruption(_))));
}

#[test]
fn test_decode_rejects_bad_marker_and_score() {
    assert!(matches!(decode_record(b"\x00f\x01k", b""), Err(FrostError::Corruption(_))));
    assert!(matches!(decode_record(b"\x00f\x01k", b"f"), Err(FrostError::Corruption(_))));
    assert!(matches!(decode_record(b"\x00z\x01k=m", b"abc"), Err(FrostError::Corruption(_))));
}
