//! RocksDB backend

use std::path::Path;

use rocksdb::{DBCompressionType, DBRawIterator, Options, ReadOptions, WriteOptions, DB};

use crate::config::StoreOptions;
use crate::error::{FrostError, Result};

use super::{BatchOp, OrderedStore, StoreIterator, WriteBatch};

/// Ordered store backed by a RocksDB instance
pub struct RocksStore {
    db: DB,
    fill_cache: bool,
    sync_writes: bool,
}

impl RocksStore {
    /// Open the store at `path`
    ///
    /// Any failure is reported as `FrostError::Open`: a store that cannot be
    /// opened cleanly is unusable.
    pub fn open(path: &Path, options: &StoreOptions) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(options.create_if_missing);
        opts.set_error_if_exists(options.error_if_exists);
        opts.set_compression_type(if options.compression {
            DBCompressionType::Snappy
        } else {
            DBCompressionType::None
        });
        opts.set_write_buffer_size(options.write_buffer_size);
        opts.set_max_open_files(options.max_open_files);

        let db = DB::open(&opts, path).map_err(|e| FrostError::Open {
            path: path.display().to_string(),
            reason: e.into_string(),
        })?;

        Ok(Self {
            db,
            fill_cache: options.fill_cache,
            sync_writes: options.sync_writes,
        })
    }

    fn read_options(&self) -> ReadOptions {
        let mut opts = ReadOptions::default();
        opts.fill_cache(self.fill_cache);
        opts
    }

    fn write_options(&self) -> WriteOptions {
        let mut opts = WriteOptions::default();
        opts.set_sync(self.sync_writes);
        opts
    }
}

impl OrderedStore for RocksStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get_opt(key, &self.read_options())?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        Ok(self.db.put_opt(key, value, &self.write_options())?)
    }

    fn delete(&self, key: &[u8]) -> Result<()> {
        Ok(self.db.delete_opt(key, &self.write_options())?)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        let mut rocks_batch = rocksdb::WriteBatch::default();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => rocks_batch.put(key, value),
                BatchOp::Delete { key } => rocks_batch.delete(key),
            }
        }
        Ok(self.db.write_opt(rocks_batch, &self.write_options())?)
    }

    fn iter(&self) -> Box<dyn StoreIterator + '_> {
        Box::new(RocksIterator {
            inner: self.db.raw_iterator_opt(self.read_options()),
        })
    }

    fn flush(&self) -> Result<()> {
        Ok(self.db.flush()?)
    }
}

/// Raw RocksDB iterator behind the [`StoreIterator`] interface
struct RocksIterator<'a> {
    inner: DBRawIterator<'a>,
}

impl StoreIterator for RocksIterator<'_> {
    fn seek_to_first(&mut self) {
        self.inner.seek_to_first();
    }

    fn seek(&mut self, key: &[u8]) {
        self.inner.seek(key);
    }

    fn valid(&self) -> bool {
        self.inner.valid()
    }

    fn next(&mut self) {
        self.inner.next();
    }

    fn key(&self) -> Option<&[u8]> {
        self.inner.key()
    }

    fn value(&self) -> Option<&[u8]> {
        self.inner.value()
    }

    fn status(&self) -> Result<()> {
        self.inner
            .status()
            .map_err(|e| FrostError::Iterator(e.into_string()))
    }
}
