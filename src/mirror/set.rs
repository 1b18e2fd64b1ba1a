//! Set mutations
//!
//! Members are stored presence-only: the key is the member, the value empty.

use crate::codec::{encode_head, encode_member, DbId, TypeTag};
use crate::error::Result;
use crate::store::WriteBatch;

use super::{Mirror, Op};

impl Mirror<'_> {
    /// `SADD key m1 m2 ...`
    pub fn set_add<M: AsRef<[u8]>>(&self, db: DbId, key: &[u8], members: &[M]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::Set, key)?;

        if let [member] = members {
            self.put(Op::new("sadd", db, key), &encode_member(&head, member.as_ref()), b"");
        } else {
            let mut batch = WriteBatch::new();
            for member in members {
                batch.put(encode_member(&head, member.as_ref()), Vec::<u8>::new());
            }
            self.write(Op::new("sadd", db, key), batch);
        }
        self.handle.record_op();
        Ok(())
    }

    /// `SREM key m1 m2 ...`
    pub fn set_rem<M: AsRef<[u8]>>(&self, db: DbId, key: &[u8], members: &[M]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::Set, key)?;

        if let [member] = members {
            self.delete(Op::new("srem", db, key), &encode_member(&head, member.as_ref()));
        } else {
            let mut batch = WriteBatch::new();
            for member in members {
                batch.delete(encode_member(&head, member.as_ref()));
            }
            self.write(Op::new("srem", db, key), batch);
        }
        self.handle.record_op();
        Ok(())
    }

    /// Remove every member of the set
    pub fn set_clear(&self, db: DbId, key: &[u8]) -> Result<()> {
        self.clear("sclear", db, TypeTag::Set, key)
    }
}
