//! Shared string table (SST)
//!
//! Every distinct string written anywhere in a workbook is stored once and
//! referenced by a `u32` id. Ids are handed out in insertion order starting
//! at 0 and are never reused, so the table can be streamed back out in id
//! order when the package is assembled.
//!
//! Strings live in an append-only store on disk (see [`store`]). The table
//! keeps only what it needs to deduplicate in memory:
//!
//! - a [`BloomFilter`] that rules out most new strings without any lookup
//! - a [`PrimitiveIndexMap`] from 64-bit string hash to the first id with
//!   that hash, plus an exact map for the rare strings whose hash collides
//! - the strings interned since the last commit
//! - a [`BoundedLruCache`] of recently read pages of committed strings
//!
//! One mutex guards all of it, so concurrent worksheet writers can share a
//! table through an `Arc` and two writers interning the same new string
//! always end up with the same id.

mod store;

use std::path::Path;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::bloom::{BloomFilter, Hash128};
use crate::error::{Error, Result};
use crate::index_map::PrimitiveIndexMap;
use crate::lru::BoundedLruCache;
use store::StringStore;

pub use store::{INDEX_FILE, VALUES_FILE};

/// Tuning knobs for a [`SharedStringTable`]
#[derive(Debug, Clone)]
pub struct SstOptions {
    /// Number of distinct strings the Bloom filter is sized for
    pub expected_strings: u64,
    /// Target Bloom filter false-positive rate
    pub false_positive_rate: f64,
    /// Consecutive strings per cached page
    pub page_size: usize,
    /// Pages kept in the hot cache
    pub cache_pages: usize,
    /// Uncommitted strings that trigger an automatic commit
    pub commit_threshold: usize,
    /// Call `fsync` on every commit
    pub sync_on_commit: bool,
}

impl Default for SstOptions {
    fn default() -> Self {
        Self {
            expected_strings: 1 << 20,
            false_positive_rate: 0.003,
            page_size: 64,
            cache_pages: 256,
            commit_threshold: 4096,
            sync_on_commit: false,
        }
    }
}

/// Deduplicating, disk-backed string interner shared by a workbook
#[derive(Debug)]
pub struct SharedStringTable {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    /// `None` once closed
    store: Option<StringStore>,
    bloom: BloomFilter,
    by_hash: PrimitiveIndexMap<u64, u32>,
    /// Strings whose hash is already taken by a different string
    collisions: AHashMap<String, u32>,
    /// Strings interned since the last commit; ids `committed..`
    pending: Vec<String>,
    committed: u32,
    pages: BoundedLruCache<u32, Arc<[String]>>,
    options: SstOptions,
    poisoned: bool,
}

impl SharedStringTable {
    /// Create an empty table backed by a temporary directory
    ///
    /// The directory and its files are removed when the table is dropped.
    pub fn new(options: SstOptions) -> Result<Self> {
        let store = StringStore::temp()?;
        Ok(Self::from_parts(store, options))
    }

    /// Create an empty table whose files live in `dir`
    ///
    /// Existing store files in `dir` are truncated. The files are kept after
    /// the table is closed and can be reloaded with [`SharedStringTable::open`].
    pub fn create_in<P: AsRef<Path>>(dir: P, options: SstOptions) -> Result<Self> {
        let store = StringStore::create_in(dir.as_ref())?;
        Ok(Self::from_parts(store, options))
    }

    /// Reopen a table previously written to `dir`
    ///
    /// The dedup index and Bloom filter are rebuilt from the value file; a
    /// missing or stale id index is regenerated.
    pub fn open<P: AsRef<Path>>(dir: P, options: SstOptions) -> Result<Self> {
        let (store, strings) = StringStore::open(dir.as_ref())?;
        let count = u32::try_from(strings.len())
            .map_err(|_| Error::StringTableFull(u32::MAX))?;

        let mut inner = Inner::new(store, options);
        for (id, value) in strings.iter().enumerate() {
            inner.index_new(value, Hash128::of_bytes(value.as_bytes()), id as u32);
        }
        inner.committed = count;
        log::debug!("reopened shared string table with {count} strings");

        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    fn from_parts(store: StringStore, options: SstOptions) -> Self {
        Self {
            inner: Mutex::new(Inner::new(store, options)),
        }
    }

    /// Return the id of `value`, inserting it with the next id if new
    pub fn intern(&self, value: &str) -> Result<u32> {
        let mut inner = self.inner.lock();
        inner.ensure_usable()?;

        let hash = Hash128::of_bytes(value.as_bytes());
        if inner.bloom.might_contain_hash(hash) {
            if let Some(id) = inner.find(value, hash)? {
                return Ok(id);
            }
        }
        inner.append(value, hash)
    }

    /// Look up an id without inserting
    pub fn lookup(&self, value: &str) -> Result<Option<u32>> {
        let mut inner = self.inner.lock();
        inner.ensure_usable()?;
        let hash = Hash128::of_bytes(value.as_bytes());
        if !inner.bloom.might_contain_hash(hash) {
            return Ok(None);
        }
        inner.find(value, hash)
    }

    /// Fetch the string for `id`
    ///
    /// Fails with [`Error::StringNotFound`] for ids that were never assigned.
    pub fn get(&self, id: u32) -> Result<String> {
        let mut inner = self.inner.lock();
        inner.ensure_usable()?;
        inner.check_id(id)?;
        if id >= inner.committed {
            return Ok(inner.pending[(id - inner.committed) as usize].clone());
        }
        let (page, slot) = inner.page_for(id)?;
        Ok(page[slot].clone())
    }

    /// Fill `out` with consecutive strings starting at `from_id`
    ///
    /// `out` is cleared first and filled up to its capacity; the return value
    /// is the number of strings written, which is smaller than the capacity
    /// only at the end of the table. Committed strings are read straight from
    /// disk without disturbing the hot cache.
    pub fn batch(&self, from_id: u32, out: &mut Vec<String>) -> Result<usize> {
        let wanted = out.capacity();
        out.clear();

        let mut inner = self.inner.lock();
        inner.ensure_usable()?;
        let total = inner.len();
        if from_id > total {
            return Err(Error::StringNotFound {
                id: from_id,
                len: total,
            });
        }

        let end = (u64::from(from_id) + wanted as u64).min(u64::from(total)) as u32;
        let disk_end = end.min(inner.committed);
        if from_id < disk_end {
            let count = (disk_end - from_id) as usize;
            let store = inner.store_mut()?;
            let offset = store.offset_of(from_id)?;
            out.extend(store.read_run(offset, count)?);
        }

        let pending_start = from_id.max(inner.committed);
        if pending_start < end {
            let lo = (pending_start - inner.committed) as usize;
            let hi = (end - inner.committed) as usize;
            out.extend_from_slice(&inner.pending[lo..hi]);
        }

        Ok(out.len())
    }

    /// Flush buffered strings to the backing store
    ///
    /// After a commit every id resolves from disk. A failed commit leaves the
    /// table unusable.
    pub fn commit(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.ensure_usable()?;
        inner.commit()
    }

    /// Flush and release the backing store; calling again is a no-op
    pub fn close(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        let Some(mut store) = inner.store.take() else {
            return Ok(());
        };
        inner.pages.clear();
        if inner.poisoned {
            return Ok(());
        }
        let sync = inner.options.sync_on_commit;
        if let Err(e) = store.flush(sync) {
            inner.poisoned = true;
            return Err(e.into());
        }
        let flushed = inner.pending.len() as u32;
        inner.committed += flushed;
        inner.pending.clear();
        log::debug!("closed shared string table ({} strings)", inner.committed);
        Ok(())
    }

    /// Regenerate the on-disk id index from the value file
    pub fn rebuild_index(&self) -> Result<usize> {
        let mut inner = self.inner.lock();
        inner.ensure_usable()?;
        inner.commit()?;
        let entries = inner.store_mut()?.rebuild_index()?;
        inner.pages.clear();
        log::debug!("rebuilt shared string index ({entries} entries)");
        Ok(entries)
    }

    /// Drop every cached page
    pub fn clear_cache(&self) {
        self.inner.lock().pages.clear();
    }

    /// Number of distinct strings
    pub fn len(&self) -> u32 {
        self.inner.lock().len()
    }

    /// Check if no string has been interned
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of strings already flushed to the store
    pub fn committed_len(&self) -> u32 {
        self.inner.lock().committed
    }

    /// Directory holding the store files, while open
    pub fn store_dir(&self) -> Option<std::path::PathBuf> {
        self.inner
            .lock()
            .store
            .as_ref()
            .map(|store| store.dir().to_path_buf())
    }
}

impl Inner {
    fn new(store: StringStore, options: SstOptions) -> Self {
        let page_size = options.page_size.max(1);
        let options = SstOptions {
            page_size,
            ..options
        };
        Self {
            store: Some(store),
            bloom: BloomFilter::new(options.expected_strings, options.false_positive_rate),
            by_hash: PrimitiveIndexMap::with_capacity(1024),
            collisions: AHashMap::new(),
            pending: Vec::new(),
            committed: 0,
            pages: BoundedLruCache::new(options.cache_pages),
            options,
            poisoned: false,
        }
    }

    fn len(&self) -> u32 {
        self.committed + self.pending.len() as u32
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        if self.store.is_none() {
            return Err(Error::Closed);
        }
        Ok(())
    }

    fn store_mut(&mut self) -> Result<&mut StringStore> {
        self.store.as_mut().ok_or(Error::Closed)
    }

    fn check_id(&self, id: u32) -> Result<()> {
        let len = self.len();
        if id >= len {
            return Err(Error::StringNotFound { id, len });
        }
        Ok(())
    }

    /// Exact lookup after the Bloom filter said "maybe"
    fn find(&mut self, value: &str, hash: Hash128) -> Result<Option<u32>> {
        let Some(candidate) = self.by_hash.get(hash.as_u64()) else {
            return Ok(None);
        };
        if self.value_equals(candidate, value)? {
            return Ok(Some(candidate));
        }
        Ok(self.collisions.get(value).copied())
    }

    fn value_equals(&mut self, id: u32, value: &str) -> Result<bool> {
        if id >= self.committed {
            return Ok(self.pending[(id - self.committed) as usize] == value);
        }
        let (page, slot) = self.page_for(id)?;
        Ok(page[slot] == value)
    }

    fn append(&mut self, value: &str, hash: Hash128) -> Result<u32> {
        let id = self.len();
        if id == u32::MAX {
            return Err(Error::StringTableFull(id));
        }

        let appended = self.store_mut()?.append(value);
        if let Err(e) = appended {
            self.poisoned = true;
            return Err(e.into());
        }

        self.index_new(value, hash, id);
        self.pending.push(value.to_owned());

        if self.pending.len() >= self.options.commit_threshold.max(1) {
            self.commit()?;
        }
        Ok(id)
    }

    fn index_new(&mut self, value: &str, hash: Hash128, id: u32) {
        if self.by_hash.contains_key(hash.as_u64()) {
            self.collisions.insert(value.to_owned(), id);
        } else {
            self.by_hash.insert(hash.as_u64(), id);
        }
        self.bloom.put_hash(hash);
    }

    fn commit(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let sync = self.options.sync_on_commit;
        let flushed = self.store_mut()?.flush(sync);
        if let Err(e) = flushed {
            self.poisoned = true;
            return Err(e.into());
        }
        let count = self.pending.len() as u32;
        self.committed += count;
        self.pending.clear();
        log::debug!(
            "committed {count} shared strings ({} total)",
            self.committed
        );
        Ok(())
    }

    /// Cached page holding committed `id`, loading it from disk on a miss
    fn page_for(&mut self, id: u32) -> Result<(Arc<[String]>, usize)> {
        let page_size = self.options.page_size as u32;
        let page_no = id / page_size;
        let slot = (id % page_size) as usize;

        if let Some(page) = self.pages.get(&page_no) {
            // A page cached before the last commit may be short.
            if slot < page.len() {
                return Ok((Arc::clone(page), slot));
            }
        }

        let start = page_no * page_size;
        let end = (start + page_size).min(self.committed);
        let store = self.store_mut()?;
        let offset = store.offset_of(start)?;
        let strings = store.read_run(offset, (end - start) as usize)?;
        let page: Arc<[String]> = Arc::from(strings);
        self.pages.put(page_no, Arc::clone(&page));
        Ok((page, slot))
    }
}
