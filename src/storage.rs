//! Bounded multi-slot storage beneath the cache.
//!
//! [`BackingStore`] is the contract the cache consumes: exclusive per-key
//! editors that commit several slots at once, read-only snapshots of
//! committed entries, and size-bounded eviction owned by the store.
//!
//! [`FsStore`] is the bundled implementation. Each slot is a plain file named
//! `<key>.<slot>`; an editor writes `<key>.<slot>.tmp` files and commit renames
//! them into place while holding the store lock, so a reader either opens the
//! previous slots or the new ones, never a mixture. Recency is tracked in an
//! `IndexMap` (front = least recently used); there is no on-disk journal, so
//! a reopened store orders entries by file modification time.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};
use crate::hasher::InternalKey;

/// File holding the store's format marker, app version and slot count.
const VERSION_FILE: &str = "VERSION";
const MAGIC: &str = "annotated-disk-cache";
const TMP_SUFFIX: &str = "tmp";

/// A bounded key/value store with atomic multi-slot writes.
pub trait BackingStore: Send + Sync + Sized {
    /// Exclusive write handle for one key.
    type Editor: StoreEditor;
    /// Read-only view of one committed entry.
    type Snapshot: StoreSnapshot;

    /// Open (or create) a store in `dir`.
    fn open(dir: &Path, version: u32, slot_count: usize, max_size: u64) -> CacheResult<Self>;

    /// Start editing `key`. Returns `Ok(None)` if another edit is outstanding.
    fn edit(&self, key: &InternalKey) -> CacheResult<Option<Self::Editor>>;

    /// Snapshot the committed entry for `key`, if any.
    fn get(&self, key: &InternalKey) -> CacheResult<Option<Self::Snapshot>>;

    /// Drop the committed entry for `key`. Returns `false` if there was none
    /// or it is currently being edited.
    fn remove(&self, key: &InternalKey) -> CacheResult<bool>;

    /// Bytes currently used by committed entries.
    fn size(&self) -> u64;

    /// Size bound in bytes.
    fn max_size(&self) -> u64;

    fn directory(&self) -> &Path;

    fn flush(&self) -> CacheResult<()>;

    /// Close the store. Closing twice is a no-op.
    fn close(&self) -> CacheResult<()>;

    fn is_closed(&self) -> bool;

    /// Close the store and delete everything in its directory.
    fn delete(&self) -> CacheResult<()>;
}

/// Exclusive write handle spanning every slot of one entry.
///
/// `commit` and `abort` consume the editor, so each editor reaches exactly one
/// terminal state. Implementations abort when dropped without either.
pub trait StoreEditor {
    type Output: Write;

    /// Open slot `slot` for writing, truncating anything written before.
    fn new_output(&mut self, slot: usize) -> CacheResult<Self::Output>;

    /// Publish every slot. Fails if a slot was never opened.
    fn commit(self) -> CacheResult<()>;

    /// Discard everything written through this editor.
    fn abort(self) -> CacheResult<()>;
}

/// Read-only view of a committed entry. Holds its slot handles until closed.
pub trait StoreSnapshot {
    /// Reader over slot `slot`. Fails with [`CacheError::Closed`] after `close`.
    fn reader(&mut self, slot: usize) -> CacheResult<&mut dyn Read>;

    /// Committed length of slot `slot` in bytes.
    fn slot_len(&self, slot: usize) -> u64;

    /// Release the slot handles. Closing twice is a no-op.
    fn close(&mut self);

    /// Read slot `slot` to the end.
    fn read_to_end(&mut self, slot: usize) -> CacheResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.slot_len(slot) as usize);
        self.reader(slot)?.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Committed entry bookkeeping: the length of each slot file.
#[derive(Debug, Clone)]
struct Record {
    lengths: Vec<u64>,
}

impl Record {
    fn total(&self) -> u64 {
        self.lengths.iter().sum()
    }
}

#[derive(Debug, Default)]
struct State {
    /// Committed entries in recency order; the first entry is the LRU.
    entries: IndexMap<InternalKey, Record>,

    /// Keys with an outstanding editor.
    editing: HashSet<InternalKey>,
}

#[derive(Debug)]
struct Inner {
    directory: PathBuf,
    slot_count: usize,
    max_size: u64,
    size: AtomicU64,
    closed: AtomicBool,
    state: Mutex<State>,
}

/// Filesystem-backed [`BackingStore`].
#[derive(Debug)]
pub struct FsStore {
    inner: Arc<Inner>,
}

impl BackingStore for FsStore {
    type Editor = FsEditor;
    type Snapshot = FsSnapshot;

    fn open(dir: &Path, version: u32, slot_count: usize, max_size: u64) -> CacheResult<Self> {
        if slot_count == 0 {
            return Err(CacheError::InvalidConfig("slot count must be > 0".to_string()));
        }
        if max_size == 0 {
            return Err(CacheError::InvalidConfig("max size must be > 0".to_string()));
        }

        fs::create_dir_all(dir)?;
        if !version_matches(dir, version, slot_count)? {
            debug!(dir = %dir.display(), version, "resetting store with stale or missing version");
            wipe_directory(dir)?;
            fs::write(
                dir.join(VERSION_FILE),
                format!("{}\n{}\n{}\n", MAGIC, version, slot_count),
            )?;
        }

        let entries = scan_entries(dir, slot_count)?;
        let size = entries.values().map(Record::total).sum();
        let inner = Arc::new(Inner {
            directory: dir.to_path_buf(),
            slot_count,
            max_size,
            size: AtomicU64::new(size),
            closed: AtomicBool::new(false),
            state: Mutex::new(State {
                entries,
                editing: HashSet::new(),
            }),
        });

        {
            let mut state = inner.lock_state();
            inner.trim_to_size(&mut state);
        }

        debug!(
            dir = %dir.display(),
            entries = inner.lock_state().entries.len(),
            size = inner.size.load(Ordering::Relaxed),
            "opened store"
        );
        Ok(Self { inner })
    }

    fn edit(&self, key: &InternalKey) -> CacheResult<Option<FsEditor>> {
        self.inner.ensure_open()?;
        let mut state = self.inner.lock_state();
        if !state.editing.insert(key.clone()) {
            return Ok(None);
        }
        Ok(Some(FsEditor {
            inner: Arc::clone(&self.inner),
            key: key.clone(),
            written: vec![false; self.inner.slot_count],
            done: false,
        }))
    }

    fn get(&self, key: &InternalKey) -> CacheResult<Option<FsSnapshot>> {
        self.inner.ensure_open()?;
        let mut state = self.inner.lock_state();

        let idx = match state.entries.get_index_of(key) {
            Some(idx) => idx,
            None => return Ok(None),
        };

        let mut readers = Vec::with_capacity(self.inner.slot_count);
        for slot in 0..self.inner.slot_count {
            match File::open(self.inner.slot_path(key, slot)) {
                Ok(file) => readers.push(Some(BufReader::new(file))),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    // A slot vanished underneath us; the entry is unusable.
                    warn!(key = %key, slot, "dropping entry with missing slot file");
                    self.inner.discard(&mut state, key);
                    return Ok(None);
                }
                Err(err) => return Err(err.into()),
            }
        }

        let lengths = state.entries[idx].lengths.clone();
        // Move to end for LRU (most recently used)
        let last = state.entries.len() - 1;
        state.entries.move_index(idx, last);

        Ok(Some(FsSnapshot { readers, lengths }))
    }

    fn remove(&self, key: &InternalKey) -> CacheResult<bool> {
        self.inner.ensure_open()?;
        let mut state = self.inner.lock_state();
        if state.editing.contains(key) || !state.entries.contains_key(key) {
            return Ok(false);
        }
        self.inner.discard(&mut state, key);
        Ok(true)
    }

    fn size(&self) -> u64 {
        self.inner.size.load(Ordering::Relaxed)
    }

    fn max_size(&self) -> u64 {
        self.inner.max_size
    }

    fn directory(&self) -> &Path {
        &self.inner.directory
    }

    fn flush(&self) -> CacheResult<()> {
        // Every commit is already a completed rename; nothing is buffered.
        Ok(())
    }

    fn close(&self) -> CacheResult<()> {
        if !self.inner.closed.swap(true, Ordering::AcqRel) {
            debug!(dir = %self.inner.directory.display(), "closed store");
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn delete(&self) -> CacheResult<()> {
        self.close()?;
        {
            let mut state = self.inner.lock_state();
            state.entries.clear();
            self.inner.size.store(0, Ordering::Relaxed);
        }
        match fs::remove_dir_all(&self.inner.directory) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

impl Inner {
    /// Acquire the state lock, recovering the data if a writer panicked.
    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> CacheResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    fn slot_path(&self, key: &InternalKey, slot: usize) -> PathBuf {
        self.directory.join(format!("{}.{}", key, slot))
    }

    fn tmp_path(&self, key: &InternalKey, slot: usize) -> PathBuf {
        self.directory.join(format!("{}.{}.{}", key, slot, TMP_SUFFIX))
    }

    /// Remove a committed entry and its files.
    fn discard(&self, state: &mut State, key: &InternalKey) {
        if let Some(record) = state.entries.shift_remove(key) {
            self.size.fetch_sub(record.total(), Ordering::Relaxed);
        }
        for slot in 0..self.slot_count {
            remove_quietly(&self.slot_path(key, slot));
        }
    }

    /// Evict least recently used entries until the size bound holds.
    fn trim_to_size(&self, state: &mut State) {
        while self.size.load(Ordering::Relaxed) > self.max_size {
            // IndexMap maintains recency order; the first entry is the LRU
            let key = match state.entries.first() {
                Some((key, _)) => key.clone(),
                None => break,
            };
            self.discard(state, &key);
        }
    }
}

/// Editor for [`FsStore`].
#[derive(Debug)]
pub struct FsEditor {
    inner: Arc<Inner>,
    key: InternalKey,
    written: Vec<bool>,
    done: bool,
}

impl FsEditor {
    fn finish(&mut self, publish: bool) -> CacheResult<()> {
        if self.done {
            return Ok(());
        }
        self.done = true;

        let mut state = self.inner.lock_state();
        state.editing.remove(&self.key);

        if publish {
            if let Err(err) = self.publish(&mut state) {
                self.remove_tmp_files();
                return Err(err);
            }
            return Ok(());
        }

        self.remove_tmp_files();
        Ok(())
    }

    fn publish(&self, state: &mut State) -> CacheResult<()> {
        self.inner.ensure_open()?;
        if let Some(slot) = self.written.iter().position(|w| !w) {
            return Err(CacheError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("edit of '{}' never wrote slot {}", self.key, slot),
            )));
        }

        let mut lengths = Vec::with_capacity(self.written.len());
        for slot in 0..self.written.len() {
            lengths.push(fs::metadata(self.inner.tmp_path(&self.key, slot))?.len());
        }

        // The previous version (if any) is replaced wholesale.
        self.inner.discard(state, &self.key);
        for slot in 0..self.written.len() {
            let renamed = fs::rename(
                self.inner.tmp_path(&self.key, slot),
                self.inner.slot_path(&self.key, slot),
            );
            if let Err(err) = renamed {
                self.inner.discard(state, &self.key);
                return Err(err.into());
            }
        }

        let record = Record { lengths };
        if record.total() > self.inner.max_size {
            warn!(
                key = %self.key,
                size = record.total(),
                max_size = self.inner.max_size,
                "entry exceeds the size bound and is evicted on commit"
            );
        }
        self.inner.size.fetch_add(record.total(), Ordering::Relaxed);
        state.entries.insert(self.key.clone(), record);
        self.inner.trim_to_size(state);
        Ok(())
    }

    fn remove_tmp_files(&self) {
        for (slot, written) in self.written.iter().enumerate() {
            if *written {
                remove_quietly(&self.inner.tmp_path(&self.key, slot));
            }
        }
    }
}

impl StoreEditor for FsEditor {
    type Output = BufWriter<File>;

    fn new_output(&mut self, slot: usize) -> CacheResult<BufWriter<File>> {
        if slot >= self.written.len() {
            return Err(CacheError::InvalidConfig(format!(
                "slot {} out of range (store has {})",
                slot,
                self.written.len()
            )));
        }
        let file = File::create(self.inner.tmp_path(&self.key, slot))?;
        self.written[slot] = true;
        Ok(BufWriter::new(file))
    }

    fn commit(mut self) -> CacheResult<()> {
        self.finish(true)
    }

    fn abort(mut self) -> CacheResult<()> {
        self.finish(false)
    }
}

impl Drop for FsEditor {
    fn drop(&mut self) {
        if let Err(err) = self.finish(false) {
            warn!(key = %self.key, error = %err, "failed to abort dropped editor");
        }
    }
}

/// Snapshot for [`FsStore`].
#[derive(Debug)]
pub struct FsSnapshot {
    readers: Vec<Option<BufReader<File>>>,
    lengths: Vec<u64>,
}

impl StoreSnapshot for FsSnapshot {
    fn reader(&mut self, slot: usize) -> CacheResult<&mut dyn Read> {
        match self.readers.get_mut(slot) {
            Some(Some(reader)) => Ok(reader),
            Some(None) => Err(CacheError::Closed),
            None => Err(CacheError::InvalidConfig(format!("slot {} out of range", slot))),
        }
    }

    fn slot_len(&self, slot: usize) -> u64 {
        self.lengths.get(slot).copied().unwrap_or(0)
    }

    fn close(&mut self) {
        for reader in &mut self.readers {
            reader.take();
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        if err.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), error = %err, "failed to remove file");
        }
    }
}

fn version_matches(dir: &Path, version: u32, slot_count: usize) -> CacheResult<bool> {
    let contents = match fs::read_to_string(dir.join(VERSION_FILE)) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    let mut lines = contents.lines();
    Ok(lines.next() == Some(MAGIC)
        && lines.next() == Some(version.to_string().as_str())
        && lines.next() == Some(slot_count.to_string().as_str()))
}

/// Remove every file in `dir`, keeping the directory itself.
fn wipe_directory(dir: &Path) -> CacheResult<()> {
    for dirent in fs::read_dir(dir)? {
        let path = dirent?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Rebuild the entry table from the slot files in `dir`.
///
/// Leftover temp files and entries missing a slot are deleted. Entries are
/// ordered oldest-modified first.
fn scan_entries(dir: &Path, slot_count: usize) -> CacheResult<IndexMap<InternalKey, Record>> {
    let mut found: IndexMap<InternalKey, (Vec<Option<u64>>, SystemTime)> = IndexMap::new();

    for dirent in fs::read_dir(dir)? {
        let dirent = dirent?;
        let path = dirent.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };
        if name == VERSION_FILE {
            continue;
        }
        if name.ends_with(TMP_SUFFIX) {
            remove_quietly(&path);
            continue;
        }

        let parsed = name.split_once('.').and_then(|(stem, slot)| {
            let key = InternalKey::parse(stem)?;
            let slot: usize = slot.parse().ok()?;
            (slot < slot_count).then_some((key, slot))
        });
        let (key, slot) = match parsed {
            Some(parsed) => parsed,
            None => continue,
        };

        let meta = dirent.metadata()?;
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let (lengths, newest) = found
            .entry(key)
            .or_insert_with(|| (vec![None; slot_count], SystemTime::UNIX_EPOCH));
        lengths[slot] = Some(meta.len());
        if modified > *newest {
            *newest = modified;
        }
    }

    let mut complete = Vec::with_capacity(found.len());
    for (key, (lengths, modified)) in found {
        match lengths.iter().copied().collect::<Option<Vec<u64>>>() {
            Some(lengths) => complete.push((modified, key, Record { lengths })),
            None => {
                warn!(key = %key, "discarding incomplete entry");
                for slot in 0..slot_count {
                    remove_quietly(&dir.join(format!("{}.{}", key, slot)));
                }
            }
        }
    }
    complete.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(complete
        .into_iter()
        .map(|(_, key, record)| (key, record))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_entry(store: &FsStore, key: &InternalKey, slots: &[&[u8]]) {
        let mut editor = store.edit(key).unwrap().expect("editor available");
        for (slot, bytes) in slots.iter().enumerate() {
            let mut out = editor.new_output(slot).unwrap();
            out.write_all(bytes).unwrap();
            out.flush().unwrap();
        }
        editor.commit().unwrap();
    }

    fn read_slot(store: &FsStore, key: &InternalKey, slot: usize) -> Option<Vec<u8>> {
        let mut snapshot = store.get(key).unwrap()?;
        Some(snapshot.read_to_end(slot).unwrap())
    }

    #[test]
    fn test_commit_makes_entry_visible() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
        let key = InternalKey::of("k");

        assert!(store.get(&key).unwrap().is_none());
        write_entry(&store, &key, &[b"payload", b"meta"]);

        assert_eq!(read_slot(&store, &key, 0), Some(b"payload".to_vec()));
        assert_eq!(read_slot(&store, &key, 1), Some(b"meta".to_vec()));
        assert_eq!(store.size(), 11);
    }

    #[test]
    fn test_abort_and_drop_leave_nothing() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
        let key = InternalKey::of("k");

        let mut editor = store.edit(&key).unwrap().unwrap();
        editor.new_output(0).unwrap().write_all(b"x").unwrap();
        editor.abort().unwrap();
        assert!(store.get(&key).unwrap().is_none());

        {
            let mut editor = store.edit(&key).unwrap().unwrap();
            editor.new_output(0).unwrap().write_all(b"x").unwrap();
        }
        assert!(store.get(&key).unwrap().is_none());
        // The dropped editor released the key.
        assert!(store.edit(&key).unwrap().is_some());
    }

    #[test]
    fn test_second_editor_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
        let key = InternalKey::of("k");

        let _first = store.edit(&key).unwrap().unwrap();
        assert!(store.edit(&key).unwrap().is_none());
        assert!(store.edit(&InternalKey::of("other")).unwrap().is_some());
    }

    #[test]
    fn test_commit_without_every_slot_fails() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
        let key = InternalKey::of("k");

        let mut editor = store.edit(&key).unwrap().unwrap();
        editor.new_output(0).unwrap().write_all(b"only payload").unwrap();
        assert!(editor.commit().is_err());
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_lru_eviction_by_size() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 1, 10).unwrap();
        let (a, b, c) = (InternalKey::of("a"), InternalKey::of("b"), InternalKey::of("c"));

        write_entry(&store, &a, &[b"1234"]);
        write_entry(&store, &b, &[b"1234"]);
        // Touch a so that b becomes the LRU
        assert!(read_slot(&store, &a, 0).is_some());
        write_entry(&store, &c, &[b"1234"]);

        assert!(store.get(&a).unwrap().is_some());
        assert!(store.get(&b).unwrap().is_none());
        assert!(store.get(&c).unwrap().is_some());
        assert_eq!(store.size(), 8);
    }

    #[test]
    fn test_remove() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
        let key = InternalKey::of("k");

        assert!(!store.remove(&key).unwrap());
        write_entry(&store, &key, &[b"a", b"b"]);
        assert!(store.remove(&key).unwrap());
        assert!(store.get(&key).unwrap().is_none());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_snapshot_survives_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 1, 1024).unwrap();
        let key = InternalKey::of("k");

        write_entry(&store, &key, &[b"old"]);
        let mut snapshot = store.get(&key).unwrap().unwrap();
        write_entry(&store, &key, &[b"new"]);

        if cfg!(unix) {
            assert_eq!(snapshot.read_to_end(0).unwrap(), b"old");
        }
        snapshot.close();
        snapshot.close();
        assert!(matches!(snapshot.reader(0), Err(CacheError::Closed)));
        assert_eq!(read_slot(&store, &key, 0), Some(b"new".to_vec()));
    }

    #[test]
    fn test_reopen_recovers_entries() {
        let dir = TempDir::new().unwrap();
        let key = InternalKey::of("k");
        {
            let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
            write_entry(&store, &key, &[b"payload", b"meta"]);
            // Leave a stray temp file behind.
            let mut editor = store.edit(&InternalKey::of("half")).unwrap().unwrap();
            editor.new_output(0).unwrap().write_all(b"x").unwrap();
            std::mem::forget(editor);
            store.close().unwrap();
        }

        let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
        assert_eq!(read_slot(&store, &key, 0), Some(b"payload".to_vec()));
        assert_eq!(store.size(), 11);
        assert!(store.get(&InternalKey::of("half")).unwrap().is_none());
    }

    #[test]
    fn test_version_change_wipes_store() {
        let dir = TempDir::new().unwrap();
        let key = InternalKey::of("k");
        {
            let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
            write_entry(&store, &key, &[b"a", b"b"]);
        }
        let store = FsStore::open(dir.path(), 2, 2, 1024).unwrap();
        assert!(store.get(&key).unwrap().is_none());
        assert_eq!(store.size(), 0);
    }

    #[test]
    fn test_closed_store_rejects_operations() {
        let dir = TempDir::new().unwrap();
        let store = FsStore::open(dir.path(), 1, 2, 1024).unwrap();
        store.close().unwrap();
        store.close().unwrap();
        assert!(store.is_closed());
        assert!(matches!(store.get(&InternalKey::of("k")), Err(CacheError::Closed)));
        assert!(matches!(store.edit(&InternalKey::of("k")), Err(CacheError::Closed)));
    }

    #[test]
    fn test_delete_removes_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");
        let store = FsStore::open(&path, 1, 2, 1024).unwrap();
        write_entry(&store, &InternalKey::of("k"), &[b"a", b"b"]);
        store.delete().unwrap();
        assert!(!path.exists());
        assert!(store.is_closed());
    }

    #[test]
    fn test_invalid_arguments() {
        let dir = TempDir::new().unwrap();
        assert!(FsStore::open(dir.path(), 1, 0, 1024).is_err());
        assert!(FsStore::open(dir.path(), 1, 2, 0).is_err());
    }
}
