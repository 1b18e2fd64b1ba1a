//! Hash mutations

use crate::codec::{encode_head, encode_member, DbId, TypeTag};
use crate::error::Result;
use crate::store::WriteBatch;

use super::{Mirror, Op};

impl Mirror<'_> {
    /// Single field write (`HSET key field value`)
    pub fn hash_set(&self, db: DbId, key: &[u8], field: &[u8], value: &[u8]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::Hash, key)?;
        self.put(Op::new("hset", db, key), &encode_member(&head, field), value);
        self.handle.record_op();
        Ok(())
    }

    /// Multi field write (`HMSET key f1 v1 f2 v2 ...`), atomic in the store
    pub fn hash_set_many<F, V>(&self, db: DbId, key: &[u8], fields: &[(F, V)]) -> Result<()>
    where
        F: AsRef<[u8]>,
        V: AsRef<[u8]>,
    {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::Hash, key)?;

        if let [(field, value)] = fields {
            self.put(Op::new("hmset", db, key), &encode_member(&head, field.as_ref()), value.as_ref());
        } else {
            let mut batch = WriteBatch::new();
            for (field, value) in fields {
                batch.put(encode_member(&head, field.as_ref()), value.as_ref());
            }
            self.write(Op::new("hmset", db, key), batch);
        }
        self.handle.record_op();
        Ok(())
    }

    /// `HDEL key f1 f2 ...`
    pub fn hash_del<F: AsRef<[u8]>>(&self, db: DbId, key: &[u8], fields: &[F]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::Hash, key)?;

        if let [field] = fields {
            self.delete(Op::new("hdel", db, key), &encode_member(&head, field.as_ref()));
        } else {
            let mut batch = WriteBatch::new();
            for field in fields {
                batch.delete(encode_member(&head, field.as_ref()));
            }
            self.write(Op::new("hdel", db, key), batch);
        }
        self.handle.record_op();
        Ok(())
    }

    /// Remove every field of the hash
    pub fn hash_clear(&self, db: DbId, key: &[u8]) -> Result<()> {
        self.clear("hclear", db, TypeTag::Hash, key)
    }
}
