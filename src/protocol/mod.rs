//! Protocol Module
//!
//! The command surface of the engine: argument vectors in, replies out.
//!
//! ## Command Groups
//! - Keys and strings: `GET`, `SET`, `DEL`, `TYPE`, `DBSIZE`
//! - Hashes: `HSET`, `HMSET`, `HGET`, `HGETALL`, `HDEL`
//! - Sets: `SADD`, `SREM`, `SMEMBERS`
//! - Sorted sets: `ZADD`, `ZINCRBY`, `ZREM`, `ZREMRANGEBYSCORE`, `ZSCORE`,
//!   `ZRANGE`
//! - Databases: `FLUSHDB`, `FLUSHALL`
//! - Administration: `FREEZE`, `MELT`, `FREEZED`, `BACKUP`, `PING`
//!
//! ### Replies
//! ```text
//! Status   OK / PONG / type names
//! Integer  counts
//! Bulk     values, or nil
//! Array    listings (nested for FREEZED key/type pairs)
//! ```

mod command;
mod response;

pub use command::Command;
pub use response::Reply;
