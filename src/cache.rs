//! The annotated disk cache.
//!
//! [`AnnotatedCache`] stores every entry as two slots in a [`BackingStore`]:
//! slot 0 holds the payload, slot 1 a JSON-encoded [`Metadata`] map. Both are
//! written through one store editor and published by a single commit, so a
//! reader sees either the whole entry or nothing.
//!
//! All writes (`put_*`, `remove`, `clear`) are serialized by one lock per
//! instance. Reads do not take that lock.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};

use crate::entry::{Entry, MetaValue, Metadata, StreamEntry, METADATA_SLOT, PAYLOAD_SLOT, SLOT_COUNT};
use crate::error::{CacheError, CacheResult};
use crate::hasher::InternalKey;
use crate::registry::UsedDirectories;
use crate::stats::{CacheStats, StatsSnapshot};
use crate::storage::{BackingStore, FsStore, StoreEditor, StoreSnapshot};

/// Version of the envelope wrapping object payloads.
const OBJECT_FORMAT: u32 = 1;

#[derive(Serialize)]
struct ObjectEnvelope<'a, T: ?Sized> {
    format: u32,
    value: &'a T,
}

#[derive(Deserialize)]
struct StoredObject {
    format: u32,
    value: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    /// Remove any committed entry, then write.
    Replace,
    /// Write only if no entry is committed.
    IfNone,
}

/// A disk-backed cache whose entries carry a metadata map.
///
/// # Example
/// ```
/// use annotated_disk_cache::{metadata, AnnotatedCache, MetaValue, UsedDirectories};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let dirs = UsedDirectories::new();
/// let cache: AnnotatedCache = AnnotatedCache::open(&dirs, dir.path(), 1, 1024 * 1024)?;
///
/// let meta = metadata([("lang", MetaValue::from("en"))]);
/// cache.put_text("greeting", "hello", &meta)?;
///
/// let entry = cache.get_text_entry("greeting")?.expect("just written");
/// assert_eq!(entry.data(), "hello");
/// assert_eq!(entry.meta("lang").and_then(|v| v.as_str()), Some("en"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct AnnotatedCache<S: BackingStore = FsStore> {
    /// The underlying store; replaced wholesale by `clear`.
    store: RwLock<S>,

    /// Serializes every write-path operation across all keys.
    write_lock: Mutex<()>,

    directory: PathBuf,
    version: u32,
    stats: CacheStats,
}

impl<S: BackingStore> AnnotatedCache<S> {
    /// Open a cache in `directory`, claiming the directory in `dirs`.
    ///
    /// Fails with [`CacheError::DuplicateDirectory`] if the directory is
    /// already claimed. The claim outlives this instance; only the registry
    /// that owns `dirs` releases it.
    pub fn open(
        dirs: &UsedDirectories,
        directory: impl AsRef<Path>,
        version: u32,
        max_size: u64,
    ) -> CacheResult<Self> {
        let directory = directory.as_ref().to_path_buf();
        dirs.claim(&directory)?;

        let store = match S::open(&directory, version, SLOT_COUNT, max_size) {
            Ok(store) => store,
            Err(err) => {
                dirs.release(&directory);
                return Err(err);
            }
        };

        debug!(dir = %directory.display(), version, max_size, "opened annotated cache");
        Ok(Self {
            store: RwLock::new(store),
            write_lock: Mutex::new(()),
            directory,
            version,
            stats: CacheStats::new(),
        })
    }

    // Write path

    /// Store raw bytes under `key`, replacing any existing entry.
    ///
    /// An entry larger than [`max_size`](Self::max_size) is evicted as soon
    /// as it commits, so a later read finds nothing.
    pub fn put_bytes(&self, key: &str, value: impl AsRef<[u8]>, metadata: &Metadata) -> CacheResult<()> {
        self.write_entry(key, metadata, WriteMode::Replace, |out| {
            out.write_all(value.as_ref())?;
            Ok(())
        })
        .map(|_| ())
    }

    /// Store UTF-8 text under `key`, replacing any existing entry.
    pub fn put_text(&self, key: &str, value: &str, metadata: &Metadata) -> CacheResult<()> {
        self.put_bytes(key, value.as_bytes(), metadata)
    }

    /// Serialize `value` under `key`, replacing any existing entry.
    pub fn put_object<T>(&self, key: &str, value: &T, metadata: &Metadata) -> CacheResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.write_entry(key, metadata, WriteMode::Replace, |out| write_object(out, value))
            .map(|_| ())
    }

    /// Copy everything from `reader` under `key`, replacing any existing entry.
    ///
    /// A read error aborts the edit; the key is left without an entry.
    pub fn put_stream<R: Read>(&self, key: &str, mut reader: R, metadata: &Metadata) -> CacheResult<()> {
        self.write_entry(key, metadata, WriteMode::Replace, |out| {
            io::copy(&mut reader, out)?;
            Ok(())
        })
        .map(|_| ())
    }

    /// Like [`put_bytes`](Self::put_bytes) but only if no entry exists.
    ///
    /// Returns `Ok(false)` when an entry is already committed and
    /// [`CacheError::ConcurrentEdit`] when another edit is outstanding.
    pub fn put_bytes_if_none(
        &self,
        key: &str,
        value: impl AsRef<[u8]>,
        metadata: &Metadata,
    ) -> CacheResult<bool> {
        self.write_entry(key, metadata, WriteMode::IfNone, |out| {
            out.write_all(value.as_ref())?;
            Ok(())
        })
    }

    /// Like [`put_text`](Self::put_text) but only if no entry exists.
    pub fn put_text_if_none(&self, key: &str, value: &str, metadata: &Metadata) -> CacheResult<bool> {
        self.put_bytes_if_none(key, value.as_bytes(), metadata)
    }

    /// Like [`put_object`](Self::put_object) but only if no entry exists.
    pub fn put_object_if_none<T>(&self, key: &str, value: &T, metadata: &Metadata) -> CacheResult<bool>
    where
        T: Serialize + ?Sized,
    {
        self.write_entry(key, metadata, WriteMode::IfNone, |out| write_object(out, value))
    }

    /// Like [`put_stream`](Self::put_stream) but only if no entry exists.
    pub fn put_stream_if_none<R: Read>(
        &self,
        key: &str,
        mut reader: R,
        metadata: &Metadata,
    ) -> CacheResult<bool> {
        self.write_entry(key, metadata, WriteMode::IfNone, |out| {
            io::copy(&mut reader, out)?;
            Ok(())
        })
    }

    /// Start a streaming write for `key`.
    ///
    /// The metadata slot is written immediately; the payload is whatever is
    /// written to the returned [`EntryWriter`] before
    /// [`commit`](EntryWriter::commit). Dropping the writer aborts the edit.
    /// This handle does not take the instance write lock, so it conflicts
    /// with other writers only through the store's per-key editor.
    pub fn open_writer(&self, key: &str, metadata: &Metadata) -> CacheResult<EntryWriter<'_, S::Editor>> {
        check_metadata(metadata)?;
        let internal = InternalKey::of(key);
        let mut editor = self.acquire_editor(&self.read_store(), key, &internal)?;

        let payload = write_metadata(&mut editor, metadata)
            .and_then(|()| editor.new_output(PAYLOAD_SLOT));
        match payload {
            Ok(out) => Ok(EntryWriter {
                key: key.to_string(),
                editor: Some(editor),
                out: Some(out),
                failed: false,
                stats: &self.stats,
            }),
            Err(err) => {
                self.abort_quietly(key, editor);
                self.stats.record_failed_write();
                Err(err)
            }
        }
    }

    /// Remove the entry for `key`. Returns `false` if there was none.
    pub fn remove(&self, key: &str) -> CacheResult<bool> {
        let _writer = self.lock_writes();
        let removed = self.read_store().remove(&InternalKey::of(key))?;
        if removed {
            self.stats.record_removal();
        }
        Ok(removed)
    }

    /// Delete every entry and reopen the store empty with the same bound.
    ///
    /// The caller must make sure no editor or snapshot is outstanding.
    pub fn clear(&self) -> CacheResult<()> {
        let _writer = self.lock_writes();
        let mut store = self.write_store();
        if store.is_closed() {
            return Err(CacheError::Closed);
        }
        let max_size = store.max_size();
        store.delete()?;
        *store = S::open(&self.directory, self.version, SLOT_COUNT, max_size)?;
        debug!(dir = %self.directory.display(), "cleared annotated cache");
        Ok(())
    }

    // Read path

    /// Open the entry for `key` with a lazily read payload.
    pub fn get_stream_entry(&self, key: &str) -> CacheResult<Option<StreamEntry<S::Snapshot>>> {
        let snapshot = self.read_store().get(&InternalKey::of(key))?;
        let mut snapshot = match snapshot {
            Some(snapshot) => snapshot,
            None => {
                self.stats.record_miss();
                return Ok(None);
            }
        };
        let metadata = read_metadata(&mut snapshot)?;
        self.stats.record_hit();
        Ok(Some(StreamEntry::new(snapshot, metadata)))
    }

    /// Read the entry for `key` with its payload as bytes.
    pub fn get_bytes_entry(&self, key: &str) -> CacheResult<Option<Entry<Bytes>>> {
        self.read_entry(key, |snapshot| Ok(Bytes::from(snapshot.read_to_end(PAYLOAD_SLOT)?)))
    }

    /// Read the entry for `key` with its payload as UTF-8 text.
    pub fn get_text_entry(&self, key: &str) -> CacheResult<Option<Entry<String>>> {
        self.read_entry(key, |snapshot| {
            String::from_utf8(snapshot.read_to_end(PAYLOAD_SLOT)?)
                .map_err(|err| CacheError::Decode(format!("payload is not UTF-8: {}", err)))
        })
    }

    /// Read the entry for `key` and decode its payload as a `T`.
    pub fn get_object_entry<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<Entry<T>>> {
        self.read_entry(key, |snapshot| read_object(snapshot))
    }

    pub fn get_bytes(&self, key: &str) -> CacheResult<Option<Bytes>> {
        Ok(self.get_bytes_entry(key)?.map(Entry::into_data))
    }

    pub fn get_text(&self, key: &str) -> CacheResult<Option<String>> {
        Ok(self.get_text_entry(key)?.map(Entry::into_data))
    }

    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        Ok(self.get_object_entry(key)?.map(Entry::into_data))
    }

    /// Read only the metadata of the entry for `key`.
    pub fn get_metadata(&self, key: &str) -> CacheResult<Option<Metadata>> {
        Ok(self.get_stream_entry(key)?.map(|entry| entry.metadata().clone()))
    }

    /// Whether a committed entry exists for `key`. Leaves no handle open.
    pub fn contains(&self, key: &str) -> CacheResult<bool> {
        match self.read_store().get(&InternalKey::of(key))? {
            Some(mut snapshot) => {
                snapshot.close();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // Lifecycle

    /// Flush the store. A no-op on a closed cache.
    pub fn flush(&self) -> CacheResult<()> {
        let store = self.read_store();
        if store.is_closed() {
            return Ok(());
        }
        store.flush()
    }

    /// Close the cache. Closing twice is a no-op.
    pub fn close(&self) -> CacheResult<()> {
        self.read_store().close()
    }

    pub fn is_closed(&self) -> bool {
        self.read_store().is_closed()
    }

    /// Close the cache and delete its directory.
    pub fn delete(&self) -> CacheResult<()> {
        let _writer = self.lock_writes();
        self.read_store().delete()
    }

    /// Bytes used by committed entries.
    pub fn size(&self) -> u64 {
        self.read_store().size()
    }

    pub fn max_size(&self) -> u64 {
        self.read_store().max_size()
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Get a snapshot of the cache statistics.
    pub fn stats(&self) -> StatsSnapshot {
        let store = self.read_store();
        self.stats.snapshot(store.size(), store.max_size())
    }

    // Private helper methods

    fn write_entry<F>(&self, key: &str, metadata: &Metadata, mode: WriteMode, write_payload: F) -> CacheResult<bool>
    where
        F: FnOnce(&mut dyn Write) -> CacheResult<()>,
    {
        check_metadata(metadata)?;
        let internal = InternalKey::of(key);
        let _writer = self.lock_writes();
        let store = self.read_store();

        match mode {
            WriteMode::Replace => {
                store.remove(&internal)?;
            }
            WriteMode::IfNone => {
                if let Some(mut snapshot) = store.get(&internal)? {
                    snapshot.close();
                    self.stats.record_skipped_write();
                    return Ok(false);
                }
            }
        }

        let mut editor = self.acquire_editor(&store, key, &internal)?;
        if let Err(err) = write_slots(&mut editor, metadata, write_payload) {
            self.abort_quietly(key, editor);
            self.stats.record_failed_write();
            return Err(err);
        }
        editor.commit()?;
        self.stats.record_write();
        trace!(key, internal = %internal, "committed entry");
        Ok(true)
    }

    fn acquire_editor(&self, store: &S, key: &str, internal: &InternalKey) -> CacheResult<S::Editor> {
        match store.edit(internal)? {
            Some(editor) => Ok(editor),
            None => {
                self.stats.record_conflict();
                Err(CacheError::ConcurrentEdit {
                    key: key.to_string(),
                })
            }
        }
    }

    fn abort_quietly(&self, key: &str, editor: S::Editor) {
        if let Err(err) = editor.abort() {
            warn!(key, error = %err, "failed to abort edit");
        }
    }

    fn read_entry<T, F>(&self, key: &str, decode: F) -> CacheResult<Option<Entry<T>>>
    where
        F: FnOnce(&mut S::Snapshot) -> CacheResult<T>,
    {
        let mut entry = match self.get_stream_entry(key)? {
            Some(entry) => entry,
            None => return Ok(None),
        };
        let data = entry.with_snapshot(decode)?;
        let metadata = entry.metadata().clone();
        entry.close();
        Ok(Some(Entry::new(data, metadata)))
    }

    /// Acquire the write lock, recovering it if a writer panicked.
    fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_store(&self) -> RwLockReadGuard<'_, S> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, S> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Streaming writer returned by [`AnnotatedCache::open_writer`].
///
/// Nothing becomes visible until [`commit`](Self::commit) succeeds. A failed
/// write poisons the writer: `commit` then aborts and reports the failure.
pub struct EntryWriter<'a, E: StoreEditor> {
    key: String,
    editor: Option<E>,
    out: Option<E::Output>,
    failed: bool,
    stats: &'a CacheStats,
}

impl<E: StoreEditor> EntryWriter<'_, E> {
    /// Publish the entry.
    pub fn commit(mut self) -> CacheResult<()> {
        let (editor, out) = match (self.editor.take(), self.out.take()) {
            (Some(editor), Some(out)) => (editor, out),
            _ => return Err(CacheError::Closed),
        };

        let flushed = if self.failed {
            Err(CacheError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("an earlier write to '{}' failed", self.key),
            )))
        } else {
            finish_output(out)
        };

        match flushed {
            Ok(()) => {
                editor.commit()?;
                self.stats.record_write();
                Ok(())
            }
            Err(err) => {
                if let Err(abort_err) = editor.abort() {
                    warn!(key = %self.key, error = %abort_err, "failed to abort edit");
                }
                self.stats.record_failed_write();
                Err(err)
            }
        }
    }

    /// Discard everything written so far.
    pub fn abort(mut self) -> CacheResult<()> {
        self.out.take();
        match self.editor.take() {
            Some(editor) => editor.abort(),
            None => Ok(()),
        }
    }

    fn output(&mut self) -> io::Result<&mut E::Output> {
        self.out
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "entry writer is finished"))
    }
}

impl<E: StoreEditor> Write for EntryWriter<'_, E> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.output()?.write(buf);
        self.failed |= result.is_err();
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.output()?.flush();
        self.failed |= result.is_err();
        result
    }
}

impl<E: StoreEditor> Drop for EntryWriter<'_, E> {
    fn drop(&mut self) {
        self.out.take();
        if let Some(editor) = self.editor.take() {
            if let Err(err) = editor.abort() {
                warn!(key = %self.key, error = %err, "failed to abort dropped entry writer");
            }
        }
    }
}

/// Write the metadata slot, then the payload slot.
fn write_slots<E, F>(editor: &mut E, metadata: &Metadata, write_payload: F) -> CacheResult<()>
where
    E: StoreEditor,
    F: FnOnce(&mut dyn Write) -> CacheResult<()>,
{
    write_metadata(editor, metadata)?;
    let mut out = editor.new_output(PAYLOAD_SLOT)?;
    write_payload(&mut out)?;
    finish_output(out)
}

/// JSON has no NaN or infinity; such floats would be written as `null`.
fn check_metadata(metadata: &Metadata) -> CacheResult<()> {
    for (name, value) in metadata {
        if let MetaValue::Float(f) = value {
            if !f.is_finite() {
                return Err(CacheError::Encode(format!(
                    "metadata field '{}' is not a finite number: {}",
                    name, f
                )));
            }
        }
    }
    Ok(())
}

fn write_metadata<E: StoreEditor>(editor: &mut E, metadata: &Metadata) -> CacheResult<()> {
    let mut out = editor.new_output(METADATA_SLOT)?;
    serde_json::to_writer(&mut out, metadata).map_err(encode_error)?;
    finish_output(out)
}

fn finish_output<W: Write>(mut out: W) -> CacheResult<()> {
    out.flush()?;
    Ok(())
}

fn write_object<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> CacheResult<()> {
    let envelope = ObjectEnvelope {
        format: OBJECT_FORMAT,
        value,
    };
    serde_json::to_writer(out, &envelope).map_err(encode_error)
}

fn read_metadata<S: StoreSnapshot>(snapshot: &mut S) -> CacheResult<Metadata> {
    let reader = snapshot.reader(METADATA_SLOT)?;
    serde_json::from_reader(reader).map_err(decode_error)
}

fn read_object<T: DeserializeOwned, S: StoreSnapshot>(snapshot: &mut S) -> CacheResult<T> {
    let bytes = snapshot.read_to_end(PAYLOAD_SLOT)?;
    let stored: StoredObject = serde_json::from_slice(&bytes).map_err(decode_error)?;
    if stored.format != OBJECT_FORMAT {
        return Err(CacheError::Decode(format!(
            "unsupported object format {} (expected {})",
            stored.format, OBJECT_FORMAT
        )));
    }
    serde_json::from_value(stored.value).map_err(decode_error)
}

fn encode_error(err: serde_json::Error) -> CacheError {
    if err.is_io() {
        CacheError::Io(err.into())
    } else {
        CacheError::Encode(err.to_string())
    }
}

fn decode_error(err: serde_json::Error) -> CacheError {
    if err.is_io() {
        CacheError::Io(err.into())
    } else {
        CacheError::Decode(err.to_string())
    }
}
