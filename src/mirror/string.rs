//! String mutations

use crate::codec::{encode_head, DbId, TypeTag};
use crate::error::Result;

use super::{Mirror, Op};

impl Mirror<'_> {
    /// `SET key value`
    pub fn string_set(&self, db: DbId, key: &[u8], value: &[u8]) -> Result<()> {
        if !self.active() {
            return Ok(());
        }
        let head = encode_head(db, TypeTag::String, key)?;
        self.put(Op::new("set", db, key), &head, value);
        self.handle.record_op();
        Ok(())
    }

    /// `DEL key` on a string
    pub fn string_del(&self, db: DbId, key: &[u8]) -> Result<()> {
        self.clear("del", db, TypeTag::String, key)
    }
}
