//! Key Codec Module
//!
//! Maps `{database id, type, name, member}` tuples onto one flat, ordered
//! keyspace.
//!
//! ## Key Layout
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────┬─────┬────────────────┐
//! │ DbId (1) │ Tag (1)  │ Len (1)  │ Name (Len)   │ '=' │ Member bytes   │
//! └──────────┴──────────┴──────────┴──────────────┴─────┴────────────────┘
//!  \_____________ head ___________/
//! ```
//!
//! Strings and frozen markers stop after the name; hashes, sets and sorted
//! sets append the separator and the member. Every record of one collection
//! shares the prefix up to and including the separator, so "all members of
//! this collection" is a single contiguous range.
//!
//! ## Values
//! - String: the full value
//! - Hash: the field value
//! - Set: empty
//! - Sorted set: the score as `%.17g` decimal text
//! - Frozen marker: one byte, the frozen collection's tag

mod key;
mod score;

pub use key::{
    db_prefix, decode_head, decode_record, encode_head, encode_member, head_prefix, tag_prefix,
    Record, ZsetMember,
};
pub use score::{format_score, parse_score, SCORE_PRECISION};

/// Numeric database id, stored as the first key byte
pub type DbId = u8;

/// Number of database ids a one-byte [`DbId`] can address
pub const MAX_DATABASES: usize = DbId::MAX as usize + 1;

/// Size of the fixed head: db id + type tag + name length
pub const HEAD_LEN: usize = 3;

/// `name_len` is a single byte
pub const MAX_NAME_LEN: usize = u8::MAX as usize;

/// Byte between a collection name and its member
pub const SEPARATOR: u8 = b'=';

/// Logical record type, stored as the second key byte
///
/// The byte values are part of the on-disk format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeTag {
    String = b'c',
    Hash = b'h',
    Set = b's',
    SortedSet = b'z',
    FrozenMarker = b'f',
}

impl TypeTag {
    /// Parse a tag byte; `None` for bytes this format does not define
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'c' => Some(TypeTag::String),
            b'h' => Some(TypeTag::Hash),
            b's' => Some(TypeTag::Set),
            b'z' => Some(TypeTag::SortedSet),
            b'f' => Some(TypeTag::FrozenMarker),
            _ => None,
        }
    }

    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Whether keys of this type carry a separator and member after the name
    pub fn has_members(self) -> bool {
        match self {
            TypeTag::Hash | TypeTag::Set | TypeTag::SortedSet => true,
            TypeTag::String | TypeTag::FrozenMarker => false,
        }
    }

    /// Name reported by `TYPE` and frozen-key listings
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::String => "string",
            TypeTag::Hash => "hash",
            TypeTag::Set => "set",
            TypeTag::SortedSet => "zset",
            TypeTag::FrozenMarker => "frozen",
        }
    }
}
