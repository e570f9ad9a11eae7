//! # Annotated Disk Cache
//!
//! A disk-resident key/value cache whose entries carry a metadata map,
//! committed atomically with the payload, plus a bounded token index that
//! can live in memory or on top of the cache.
//!
//! ## Features
//!
//! - **Atomic entries**: payload and metadata become visible together or not at all
//! - **Named instances**: a [`CacheRegistry`] opens each named cache at most once
//! - **Size-bounded**: the bundled [`FsStore`] evicts least-recently-used entries by size
//! - **Token index**: per-token insertion-ordered sets with FIFO eviction and pagination
//! - **Statistics**: hits, misses, writes and conflicts per cache
//!
//! ## Quick Start
//!
//! ```rust
//! use annotated_disk_cache::{metadata, BaseDirProvider, CacheConfig, CacheRegistry, MetaValue};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let base = tempfile::tempdir()?;
//! let registry: CacheRegistry = CacheRegistry::new(
//!     CacheConfig::new().default_max_size(64 * 1024 * 1024),
//!     BaseDirProvider::new(base.path()),
//! );
//!
//! let articles = registry.get_instance("articles", true)?.expect("created on demand");
//! articles.put_text(
//!     "post:1",
//!     "Hello, disk!",
//!     &metadata([("author", MetaValue::from("ada")), ("views", MetaValue::from(10))]),
//! )?;
//!
//! if let Some(entry) = articles.get_text_entry("post:1")? {
//!     println!("{} by {}", entry.data(), entry.meta("author").map_or("?".into(), |a| a.to_string()));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Indexing
//!
//! ```rust
//! use annotated_disk_cache::{IndexConfig, ListCollector, MemoryIndex};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index: MemoryIndex<u32> = MemoryIndex::in_memory(&IndexConfig::new())?;
//! index.index("quick brown fox", &[1, 2])?;
//! index.index("lazy brown dog", &[3])?;
//!
//! let mut hits = ListCollector::new();
//! index.find_with("brown", &mut hits, 0, 10)?;
//! assert_eq!(hits.values(), &[1, 2, 3]);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod entry;
pub mod error;
pub mod hasher;
pub mod index;
pub mod registry;
pub mod stats;
pub mod storage;
pub mod tokenizer;

pub use cache::{AnnotatedCache, EntryWriter};
pub use config::{CacheConfig, IndexConfig};
pub use entry::{metadata, Entry, MetaValue, Metadata, StreamEntry};
pub use error::{CacheError, CacheResult, IndexError, IndexResult};
pub use hasher::InternalKey;
pub use index::{
    BoundedTokenIndex, CacheMapping, DiskIndex, DistinctCollector, IndexConsumer, ListCollector, MapCollector,
    MemoryIndex, MemoryMapping, RangeCollector, TokenMapping,
};
pub use registry::{BaseDirProvider, CacheRegistry, DirectoryProvider, UsedDirectories};
pub use stats::{CacheStats, StatsSnapshot};
pub use storage::{BackingStore, FsStore, StoreEditor, StoreSnapshot};
pub use tokenizer::{SimpleTokenizer, Tokenizer, WholePhrase};

pub mod cli;
pub use cli::{Cli, Command};
