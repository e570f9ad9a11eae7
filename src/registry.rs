//! Named cache instances and the directories they occupy.
//!
//! A [`CacheRegistry`] owns at most one [`AnnotatedCache`] per name. Instances
//! are created lazily on first lookup and shared through `Arc`. The registry
//! is an ordinary value: two registries never see each other's instances,
//! but they must not be pointed at the same directories.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::cache::AnnotatedCache;
use crate::config::CacheConfig;
use crate::error::{CacheError, CacheResult};
use crate::storage::{BackingStore, FsStore};

/// Set of directories claimed by open caches.
///
/// Clones share the same set. A claim is permanent until released, which
/// only happens when a registry removes the instance or a failed open rolls
/// back its own claim.
#[derive(Debug, Clone, Default)]
pub struct UsedDirectories {
    inner: Arc<Mutex<HashSet<PathBuf>>>,
}

impl UsedDirectories {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `dir`, failing with [`CacheError::DuplicateDirectory`] if it is taken.
    pub fn claim(&self, dir: &Path) -> CacheResult<()> {
        if self.lock().insert(dir.to_path_buf()) {
            Ok(())
        } else {
            Err(CacheError::DuplicateDirectory(dir.to_path_buf()))
        }
    }

    /// Release a claim. Returns `false` if `dir` was not claimed.
    pub fn release(&self, dir: &Path) -> bool {
        self.lock().remove(dir)
    }

    pub fn contains(&self, dir: &Path) -> bool {
        self.lock().contains(dir)
    }

    /// Claimed directories, sorted.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.lock().iter().cloned().collect();
        dirs.sort();
        dirs
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<PathBuf>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Decides where a named cache lives and how large it may grow.
pub trait DirectoryProvider: Send + Sync {
    fn directory_for(&self, name: &str) -> PathBuf;

    /// Size bound for `name`; `fallback` is the registry's default.
    fn max_size_for(&self, _name: &str, fallback: u64) -> u64 {
        fallback
    }
}

/// Places every cache in a subdirectory of one base directory.
#[derive(Debug, Clone)]
pub struct BaseDirProvider {
    base: PathBuf,
}

impl BaseDirProvider {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl DirectoryProvider for BaseDirProvider {
    fn directory_for(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }
}

/// Manager of named [`AnnotatedCache`] instances.
///
/// # Example
/// ```
/// use annotated_disk_cache::{BaseDirProvider, CacheConfig, CacheRegistry, Metadata};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let base = tempfile::tempdir()?;
/// let registry: CacheRegistry = CacheRegistry::new(CacheConfig::new(), BaseDirProvider::new(base.path()));
///
/// let pages = registry.get_instance("pages", true)?.expect("created on demand");
/// pages.put_text("home", "<html/>", &Metadata::new())?;
///
/// let again = registry.get_instance("pages", false)?.expect("already tracked");
/// assert!(std::sync::Arc::ptr_eq(&pages, &again));
/// # Ok(())
/// # }
/// ```
pub struct CacheRegistry<S: BackingStore = FsStore> {
    config: CacheConfig,
    provider: Box<dyn DirectoryProvider>,
    dirs: UsedDirectories,

    /// Held across construction so each name is opened at most once.
    instances: Mutex<HashMap<String, Arc<AnnotatedCache<S>>>>,
}

impl<S: BackingStore> CacheRegistry<S> {
    pub fn new(config: CacheConfig, provider: impl DirectoryProvider + 'static) -> Self {
        Self {
            config,
            provider: Box::new(provider),
            dirs: UsedDirectories::new(),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Look up `name`, opening it with the computed size bound if needed.
    ///
    /// Returns `Ok(None)` when the name is untracked and `create_if_none`
    /// is false.
    pub fn get_instance(&self, name: &str, create_if_none: bool) -> CacheResult<Option<Arc<AnnotatedCache<S>>>> {
        let max_size = self.compute_max_size(name, self.config.default_max_size);
        self.get_instance_with_size(name, max_size, create_if_none)
    }

    /// Look up `name`, opening it with `max_size` if needed.
    ///
    /// `max_size` only applies when the instance is created here.
    pub fn get_instance_with_size(
        &self,
        name: &str,
        max_size: u64,
        create_if_none: bool,
    ) -> CacheResult<Option<Arc<AnnotatedCache<S>>>> {
        let mut instances = self.lock_instances();
        if let Some(cache) = instances.get(name) {
            return Ok(Some(Arc::clone(cache)));
        }
        if !create_if_none {
            return Ok(None);
        }

        let directory = self.provider.directory_for(name);
        debug!(name, dir = %directory.display(), max_size, "creating named cache");
        let cache = Arc::new(AnnotatedCache::open(
            &self.dirs,
            &directory,
            self.config.app_version,
            max_size,
        )?);
        instances.insert(name.to_string(), Arc::clone(&cache));
        Ok(Some(cache))
    }

    /// Flush and close `name` but keep tracking it.
    ///
    /// Later lookups return the closed instance until it is removed.
    pub fn close(&self, name: &str) -> bool {
        match self.lock_instances().get(name) {
            Some(cache) => {
                close_quietly(name, cache);
                true
            }
            None => false,
        }
    }

    /// Close `name`, delete its directory and forget it.
    ///
    /// Returns `false` if the name was not tracked. A later lookup with
    /// `create_if_none` opens a fresh, empty instance.
    pub fn close_and_remove(&self, name: &str) -> bool {
        let removed = self.lock_instances().remove(name);
        match removed {
            Some(cache) => {
                self.teardown(name, &cache);
                true
            }
            None => false,
        }
    }

    /// [`close_and_remove`](Self::close_and_remove) every tracked name.
    pub fn close_and_remove_all(&self) {
        let drained: Vec<(String, Arc<AnnotatedCache<S>>)> = self.lock_instances().drain().collect();
        if drained.is_empty() {
            return;
        }
        debug!(count = drained.len(), "closing and removing all named caches");
        for (name, cache) in drained {
            self.teardown(&name, &cache);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock_instances().contains_key(name)
    }

    /// Tracked names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock_instances().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn count(&self) -> usize {
        self.lock_instances().len()
    }

    pub fn default_max_size(&self) -> u64 {
        self.config.default_max_size
    }

    pub fn directory_for(&self, name: &str) -> PathBuf {
        self.provider.directory_for(name)
    }

    /// Size bound `name` would be created with; `fallback` when the
    /// provider has no opinion.
    pub fn compute_max_size(&self, name: &str, fallback: u64) -> u64 {
        self.provider.max_size_for(name, fallback)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Directories currently claimed by this registry's caches.
    pub fn used_directories(&self) -> &UsedDirectories {
        &self.dirs
    }

    fn teardown(&self, name: &str, cache: &AnnotatedCache<S>) {
        close_quietly(name, cache);
        if let Err(err) = cache.delete() {
            warn!(name, error = %err, "failed to delete cache directory");
        }
        self.dirs.release(cache.directory());
        debug!(name, "removed named cache");
    }

    fn lock_instances(&self) -> MutexGuard<'_, HashMap<String, Arc<AnnotatedCache<S>>>> {
        self.instances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S: BackingStore> fmt::Debug for CacheRegistry<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("config", &self.config)
            .field("names", &self.names())
            .finish()
    }
}

impl<S: BackingStore> Drop for CacheRegistry<S> {
    fn drop(&mut self) {
        for (name, cache) in self.lock_instances().iter() {
            close_quietly(name, cache);
        }
    }
}

fn close_quietly<S: BackingStore>(name: &str, cache: &AnnotatedCache<S>) {
    if cache.is_closed() {
        return;
    }
    debug!(name, "closing named cache");
    if let Err(err) = cache.flush() {
        warn!(name, error = %err, "failed to flush cache");
    }
    if let Err(err) = cache.close() {
        warn!(name, error = %err, "failed to close cache");
    }
}
