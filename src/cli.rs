//! Command-line interface definitions.
//!
//! This module defines the CLI structure for the `diskcache` admin tool
//! using clap, and runs a parsed command against one cache directory.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::AnnotatedCache;
use crate::config::{IndexConfig, DEFAULT_MAX_ENTRIES_PER_KEY, DEFAULT_MAX_SIZE_BYTES, DEFAULT_MIN_TOKEN_CHARS};
use crate::entry::{MetaValue, Metadata};
use crate::index::{BoundedTokenIndex, CacheMapping};
use crate::registry::UsedDirectories;
use crate::storage::FsStore;

/// Key prefix under which the CLI keeps its token index.
pub const INDEX_PREFIX: &str = "index:";

/// Annotated disk cache admin tool.
///
/// Operates on one cache directory.
#[derive(Parser, Debug)]
#[command(name = "diskcache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// The cache directory.
    #[arg(long, short = 'd')]
    pub dir: PathBuf,

    /// Size bound of the cache in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE_BYTES)]
    pub max_size: u64,

    /// Version stamped on the store; opening with another version wipes it.
    #[arg(long, default_value_t = 1)]
    pub app_version: u32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a text value.
    ///
    /// Replaces any existing entry for the key.
    Put {
        key: String,
        value: String,
        /// Metadata as `name=value`; repeatable.
        #[arg(long = "meta", value_parser = parse_meta)]
        meta: Vec<(String, MetaValue)>,
    },

    /// Print the value stored at a key.
    Get {
        key: String,
        /// Also print the metadata as JSON.
        #[arg(long)]
        with_meta: bool,
    },

    /// Remove a key.
    Remove { key: String },

    /// Report whether a key has an entry.
    Contains { key: String },

    /// Show cache statistics.
    ///
    /// Shows size, bound, hits, misses and writes.
    Stats,

    /// Delete every entry.
    Clear,

    /// Index values under the tokens of a phrase.
    Index {
        phrase: String,
        #[arg(required = true)]
        values: Vec<String>,
        /// Capacity of each token's result set.
        #[arg(long, default_value_t = DEFAULT_MAX_ENTRIES_PER_KEY)]
        max_entries: usize,
        /// Minimum token length in characters.
        #[arg(long, default_value_t = DEFAULT_MIN_TOKEN_CHARS)]
        min_chars: usize,
    },

    /// Search the index.
    Find {
        phrase: String,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        /// Minimum token length in characters.
        #[arg(long, default_value_t = DEFAULT_MIN_TOKEN_CHARS)]
        min_chars: usize,
    },
}

/// Parse `name=value` into a metadata pair.
///
/// `true`/`false` become booleans, integers and floats become numbers,
/// anything else is text.
pub fn parse_meta(raw: &str) -> Result<(String, MetaValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{}'", raw))?;
    if name.is_empty() {
        return Err(format!("empty metadata name in '{}'", raw));
    }
    let value = if let Ok(b) = value.parse::<bool>() {
        MetaValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        MetaValue::Int(i)
    } else if let Ok(f) = value.parse::<f64>() {
        MetaValue::Float(f)
    } else {
        MetaValue::Text(value.to_string())
    };
    Ok((name.to_string(), value))
}

/// Run `cli` against its cache directory, writing results to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), Box<dyn Error>> {
    let dirs = UsedDirectories::new();
    let cache: Arc<AnnotatedCache<FsStore>> =
        Arc::new(AnnotatedCache::open(&dirs, &cli.dir, cli.app_version, cli.max_size)?);

    match cli.command {
        Command::Put { key, value, meta } => {
            let meta: Metadata = meta.into_iter().collect();
            cache.put_text(&key, &value, &meta)?;
            writeln!(out, "Stored key '{}'", key)?;
        }

        Command::Get { key, with_meta } => match cache.get_bytes_entry(&key)? {
            Some(entry) => {
                if with_meta {
                    writeln!(out, "{}", serde_json::to_string(entry.metadata())?)?;
                }
                writeln!(out, "{}", String::from_utf8_lossy(entry.data()))?;
            }
            None => writeln!(out, "Key '{}' not found", key)?,
        },

        Command::Remove { key } => {
            if cache.remove(&key)? {
                writeln!(out, "Removed key '{}'", key)?;
            } else {
                writeln!(out, "Key '{}' not found", key)?;
            }
        }

        Command::Contains { key } => {
            writeln!(out, "{}", cache.contains(&key)?)?;
        }

        Command::Stats => {
            let stats = cache.stats();
            writeln!(out, "Cache Statistics:")?;
            writeln!(out, "  directory: {}", cache.directory().display())?;
            writeln!(out, "  size: {}", stats.size)?;
            writeln!(out, "  max_size: {}", stats.max_size)?;
            writeln!(out, "  hits: {}", stats.hits)?;
            writeln!(out, "  misses: {}", stats.misses)?;
            writeln!(out, "  writes: {}", stats.writes)?;
        }

        Command::Clear => {
            cache.clear()?;
            writeln!(out, "Cleared {}", cache.directory().display())?;
        }

        Command::Index {
            phrase,
            values,
            max_entries,
            min_chars,
        } => {
            let config = IndexConfig::new().min_token_chars(min_chars).max_entries_per_key(max_entries);
            let index = open_index(&cache, &config)?;
            let added = index.index(&phrase, &values)?;
            writeln!(out, "Indexed {} values", added)?;
        }

        Command::Find {
            phrase,
            offset,
            limit,
            min_chars,
        } => {
            let config = IndexConfig::new().min_token_chars(min_chars);
            let index = open_index(&cache, &config)?;
            for (token, values) in index.find(&phrase, offset, limit)? {
                for value in values {
                    writeln!(out, "{}\t{}", token, value)?;
                }
            }
        }
    }

    cache.close()?;
    Ok(())
}

fn open_index(
    cache: &Arc<AnnotatedCache<FsStore>>,
    config: &IndexConfig,
) -> Result<BoundedTokenIndex<String, CacheMapping<FsStore>>, Box<dyn Error>> {
    let mapping = CacheMapping::with_prefix(Arc::clone(cache), INDEX_PREFIX);
    Ok(BoundedTokenIndex::with_config(mapping, config)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run_args(dir: &TempDir, args: &[&str]) -> String {
        let mut argv = vec!["diskcache", "--dir", dir.path().to_str().unwrap()];
        argv.extend_from_slice(args);
        let mut out = Vec::new();
        run(Cli::parse_from(argv), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_put_with_meta() {
        let cli = Cli::parse_from([
            "test", "--dir", "/tmp/c", "put", "k", "v", "--meta", "lang=en", "--meta", "n=3",
        ]);
        match cli.command {
            Command::Put { key, value, meta } => {
                assert_eq!(key, "k");
                assert_eq!(value, "v");
                assert_eq!(
                    meta,
                    vec![
                        ("lang".to_string(), MetaValue::from("en")),
                        ("n".to_string(), MetaValue::from(3)),
                    ]
                );
            }
            _ => panic!("Expected Put command"),
        }
    }

    #[test]
    fn test_parse_find_defaults() {
        let cli = Cli::parse_from(["test", "-d", "/tmp/c", "find", "red fox", "-vv"]);
        assert_eq!(cli.max_size, DEFAULT_MAX_SIZE_BYTES);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Find { phrase, offset, limit, .. } => {
                assert_eq!(phrase, "red fox");
                assert_eq!(offset, 0);
                assert_eq!(limit, 20);
            }
            _ => panic!("Expected Find command"),
        }
    }

    #[test]
    fn test_parse_index_requires_values() {
        assert!(Cli::try_parse_from(["test", "-d", "/tmp/c", "index", "phrase"]).is_err());
    }

    #[test]
    fn test_parse_meta_values() {
        assert_eq!(parse_meta("a=true").unwrap().1, MetaValue::Bool(true));
        assert_eq!(parse_meta("a=-4").unwrap().1, MetaValue::Int(-4));
        assert_eq!(parse_meta("a=0.5").unwrap().1, MetaValue::Float(0.5));
        assert_eq!(parse_meta("a=x=y").unwrap().1, MetaValue::from("x=y"));
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=v").is_err());
    }

    #[test]
    fn test_run_put_get_remove() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["put", "greeting", "hello", "--meta", "lang=en"]);

        assert_eq!(run_args(&dir, &["get", "greeting"]), "hello\n");
        assert_eq!(
            run_args(&dir, &["get", "greeting", "--with-meta"]),
            "{\"lang\":\"en\"}\nhello\n"
        );
        assert_eq!(run_args(&dir, &["contains", "greeting"]), "true\n");
        assert_eq!(run_args(&dir, &["remove", "greeting"]), "Removed key 'greeting'\n");
        assert_eq!(run_args(&dir, &["get", "greeting"]), "Key 'greeting' not found\n");
    }

    #[test]
    fn test_run_index_and_find() {
        let dir = TempDir::new().unwrap();
        run_args(&dir, &["index", "red fox", "doc1", "doc2"]);
        run_args(&dir, &["index", "brown fox", "doc3"]);

        assert_eq!(
            run_args(&dir, &["find", "fox", "--offset", "1"]),
            "fox\tdoc2\nfox\tdoc3\n"
        );
    }
}
