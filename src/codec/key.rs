//! Composite key encoding and decoding

use bytes::Bytes;

use crate::error::{FrostError, Result};

use super::{parse_score, DbId, TypeTag, HEAD_LEN, MAX_NAME_LEN, SEPARATOR};

// =============================================================================
// Encoding
// =============================================================================

/// Build the head of a key: `[db][tag][len][name]`, followed by the separator
/// for types that carry members.
///
/// Fails with `NameTooLong` when `name` does not fit the one-byte length.
pub fn encode_head(db: DbId, tag: TypeTag, name: &[u8]) -> Result<Vec<u8>> {
    if name.len() > MAX_NAME_LEN {
        return Err(FrostError::NameTooLong(name.len()));
    }

    let mut key = Vec::with_capacity(HEAD_LEN + name.len() + 1);
    key.push(db);
    key.push(tag.as_byte());
    key.push(name.len() as u8);
    key.extend_from_slice(name);
    if tag.has_members() {
        key.push(SEPARATOR);
    }
    Ok(key)
}

/// Append a member to a head built by [`encode_head`]
pub fn encode_member(head: &[u8], member: &[u8]) -> Vec<u8> {
    let mut key = Vec::with_capacity(head.len() + member.len());
    key.extend_from_slice(head);
    key.extend_from_slice(member);
    key
}

/// Prefix shared by every record of one collection
pub fn head_prefix(db: DbId, tag: TypeTag, name: &[u8]) -> Result<Vec<u8>> {
    encode_head(db, tag, name)
}

/// Prefix shared by every record of one type within a database
pub fn tag_prefix(db: DbId, tag: TypeTag) -> [u8; 2] {
    [db, tag.as_byte()]
}

/// Prefix shared by every record of a database
pub fn db_prefix(db: DbId) -> [u8; 1] {
    [db]
}

// =============================================================================
// Decoding
// =============================================================================

/// Read the fixed head: `(db, raw tag byte, name length)`
///
/// The name length comes from the head byte, never from scanning for the
/// separator, so names and members may contain any byte.
pub fn decode_head(key: &[u8]) -> Result<(DbId, u8, usize)> {
    if key.len() < HEAD_LEN {
        return Err(FrostError::Corruption(format!(
            "key of {} bytes is shorter than the {}-byte head",
            key.len(),
            HEAD_LEN
        )));
    }
    Ok((key[0], key[1], key[2] as usize))
}

/// A persisted record, parsed
///
/// Name, member and value slices share one copy of the raw key/value.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    String {
        db: DbId,
        name: Bytes,
        value: Bytes,
    },
    HashField {
        db: DbId,
        name: Bytes,
        field: Bytes,
        value: Bytes,
    },
    SetMember {
        db: DbId,
        name: Bytes,
        member: Bytes,
    },
    ZsetMember {
        db: DbId,
        name: Bytes,
        member: Bytes,
        score: f64,
    },
    FrozenMarker {
        db: DbId,
        name: Bytes,
        tag: TypeTag,
    },
}

impl Record {
    pub fn db(&self) -> DbId {
        match self {
            Record::String { db, .. }
            | Record::HashField { db, .. }
            | Record::SetMember { db, .. }
            | Record::ZsetMember { db, .. }
            | Record::FrozenMarker { db, .. } => *db,
        }
    }

    pub fn name(&self) -> &Bytes {
        match self {
            Record::String { name, .. }
            | Record::HashField { name, .. }
            | Record::SetMember { name, .. }
            | Record::ZsetMember { name, .. }
            | Record::FrozenMarker { name, .. } => name,
        }
    }

    pub fn tag(&self) -> TypeTag {
        match self {
            Record::String { .. } => TypeTag::String,
            Record::HashField { .. } => TypeTag::Hash,
            Record::SetMember { .. } => TypeTag::Set,
            Record::ZsetMember { .. } => TypeTag::SortedSet,
            Record::FrozenMarker { .. } => TypeTag::FrozenMarker,
        }
    }
}

/// Parse one stored key/value pair
///
/// An unknown tag is reported as `UnknownTypeTag`; any structural problem
/// (truncated name, missing separator, unparsable score, bad marker) is
/// `Corruption`.
pub fn decode_record(key: &[u8], value: &[u8]) -> Result<Record> {
    let (db, tag_byte, name_len) = decode_head(key)?;
    let tag = TypeTag::from_byte(tag_byte).ok_or(FrostError::UnknownTypeTag { db, tag: tag_byte })?;

    let name_end = HEAD_LEN + name_len;
    if key.len() < name_end {
        return Err(FrostError::Corruption(format!(
            "key declares a {}-byte name but holds {} bytes after the head",
            name_len,
            key.len() - HEAD_LEN
        )));
    }

    let key = Bytes::copy_from_slice(key);
    let name = key.slice(HEAD_LEN..name_end);

    match tag {
        TypeTag::String => {
            expect_no_member(&key, name_end, tag)?;
            Ok(Record::String {
                db,
                name,
                value: Bytes::copy_from_slice(value),
            })
        }
        TypeTag::FrozenMarker => {
            expect_no_member(&key, name_end, tag)?;
            let frozen = match value {
                [byte] => TypeTag::from_byte(*byte).filter(|t| *t != TypeTag::FrozenMarker),
                _ => None,
            };
            let frozen = frozen.ok_or_else(|| {
                FrostError::Corruption(format!(
                    "frozen marker holds {:?}, expected a single collection tag",
                    value
                ))
            })?;
            Ok(Record::FrozenMarker {
                db,
                name,
                tag: frozen,
            })
        }
        TypeTag::Hash => Ok(Record::HashField {
            db,
            name,
            field: member_of(&key, name_end, tag)?,
            value: Bytes::copy_from_slice(value),
        }),
        TypeTag::Set => Ok(Record::SetMember {
            db,
            name,
            member: member_of(&key, name_end, tag)?,
        }),
        TypeTag::SortedSet => {
            let member = member_of(&key, name_end, tag)?;
            let score = parse_score(value).ok_or_else(|| {
                FrostError::Corruption(format!(
                    "sorted set score {:?} is not a number",
                    String::from_utf8_lossy(value)
                ))
            })?;
            Ok(Record::ZsetMember {
                db,
                name,
                member,
                score,
            })
        }
    }
}

fn expect_no_member(key: &Bytes, name_end: usize, tag: TypeTag) -> Result<()> {
    if key.len() != name_end {
        return Err(FrostError::Corruption(format!(
            "{} key carries {} trailing bytes",
            tag.name(),
            key.len() - name_end
        )));
    }
    Ok(())
}

fn member_of(key: &Bytes, name_end: usize, tag: TypeTag) -> Result<Bytes> {
    if key.len() <= name_end || key[name_end] != SEPARATOR {
        return Err(FrostError::Corruption(format!(
            "{} key is missing the member separator",
            tag.name()
        )));
    }
    Ok(key.slice(name_end + 1..))
}

// =============================================================================
// Sorted Set Members
// =============================================================================

/// A sorted-set member as the in-memory server may hold it
///
/// Members kept in the compact integer form are persisted as their decimal
/// text, so removal by integer and removal by bytes address the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZsetMember<'a> {
    Bytes(&'a [u8]),
    Int(i64),
}

impl ZsetMember<'_> {
    /// Append the canonical member bytes to `key`
    pub fn append_to(&self, key: &mut Vec<u8>) {
        match self {
            ZsetMember::Bytes(bytes) => key.extend_from_slice(bytes),
            ZsetMember::Int(value) => key.extend_from_slice(value.to_string().as_bytes()),
        }
    }
}

impl<'a> From<&'a [u8]> for ZsetMember<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        ZsetMember::Bytes(bytes)
    }
}
