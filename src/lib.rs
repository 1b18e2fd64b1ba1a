//! # frostkv
//!
//! A durability and tiering layer between an in-memory, multi-type
//! key-value dataset and an embedded ordered key-value store:
//! - Every mutation is mirrored into one flat, ordered keyspace
//! - The dataset is rebuilt by replaying that keyspace at startup
//! - Whole collections can be frozen out of memory and melted back
//! - The store can be copied online into a backup directory
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Engine (Command → Reply)                    │
//! └───────┬──────────────────┬──────────────────┬───────────────┘
//!         │                  │                  │
//!         ▼                  ▼                  ▼
//!   ┌───────────┐     ┌─────────────┐     ┌───────────┐
//!   │  Dataset  │◄────│ Replay/Tier │     │  Backup   │
//!   │ (memory)  │     │  (Keyspace) │     │ (worker)  │
//!   └─────┬─────┘     └──────┬──────┘     └─────┬─────┘
//!         │ Mirror           │ scan             │ scan
//!         ▼                  ▼                  ▼
//!   ┌─────────────────────────────────────────────────────┐
//!   │        OrderedStore  (RocksDB / in-memory)          │
//!   │   [db][tag][len][name] '=' member  →  value         │
//!   └─────────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod backup;
pub mod codec;
pub mod dataset;
pub mod engine;
pub mod mirror;
pub mod protocol;
pub mod replay;
pub mod store;
pub mod tier;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::{DbId, TypeTag};
pub use config::{Config, StoreOptions};
pub use engine::Engine;
pub use error::{FrostError, Result};
pub use protocol::{Command, Reply};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of frostkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
