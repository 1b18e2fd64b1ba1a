//! Sorted-set mutations
//!
//! The member is the key suffix and the score is the value, as `%.17g`
//! text. Removals address members through [`ZsetMember`] so integer-encoded
//! members land on the same key as their decimal text.

use crate::codec::{encode_head, format_score, DbId, TypeTag, ZsetMember};
use crate::error::Result;
use crate::store::WriteBatch;

use super::{Mirror, Op};

impl Mirror<'_> {
    /// `ZADD key score member [score member ...]`
    pub fn zset_add<M: AsRef<[u8]>>(&self, db: DbId, key: &[u8], entries: &[(M, f64)]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::SortedSet, key)?;

        if let [(member, score)] = entries {
            let record = member_key(&head, ZsetMember::Bytes(member.as_ref()));
            self.put(Op::new("zadd", db, key), &record, format_score(*score).as_bytes());
        } else {
            let mut batch = WriteBatch::new();
            for (member, score) in entries {
                let record = member_key(&head, ZsetMember::Bytes(member.as_ref()));
                batch.put(record, format_score(*score).into_bytes());
            }
            self.write(Op::new("zadd", db, key), batch);
        }
        self.handle.record_op();
        Ok(())
    }

    /// Direct score update of one member (`ZINCRBY`)
    pub fn zset_add_one(&self, db: DbId, key: &[u8], member: &[u8], score: f64) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::SortedSet, key)?;
        let record = member_key(&head, ZsetMember::Bytes(member));
        self.put(Op::new("zadd direct", db, key), &record, format_score(score).as_bytes());
        self.handle.record_op();
        Ok(())
    }

    /// `ZREM key m1 m2 ...`, also used by the range removals
    pub fn zset_rem(&self, db: DbId, key: &[u8], members: &[ZsetMember<'_>]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::SortedSet, key)?;

        if let [member] = members {
            self.delete(Op::new("zrem", db, key), &member_key(&head, *member));
        } else {
            let mut batch = WriteBatch::new();
            for member in members {
                batch.delete(member_key(&head, *member));
            }
            self.write(Op::new("zrem", db, key), batch);
        }
        self.handle.record_op();
        Ok(())
    }

    /// Remove a single member without batching
    pub fn zset_rem_one(&self, db: DbId, key: &[u8], member: ZsetMember<'_>) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::SortedSet, key)?;
        self.delete(Op::new("zrem one", db, key), &member_key(&head, member));
        self.handle.record_op();
        Ok(())
    }

    /// Remove every member of the sorted set
    pub fn zset_clear(&self, db: DbId, key: &[u8]) -> Result<()> {
        self.clear("zclear", db, TypeTag::SortedSet, key)
    }
}

fn member_key(head: &[u8], member: ZsetMember<'_>) -> Vec<u8> {
    let mut key = head.to_vec();
    member.append_to(&mut key);
    key
}
