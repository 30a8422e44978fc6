use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{Corpus, Program};
use crate::services::cache::content_hash;

/// Errors that can occur while loading the program corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid corpus JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Accepted corpus file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum CorpusFile {
    Versioned {
        #[serde(default)]
        version: Option<String>,
        programs: Vec<Value>,
    },
    Bare(Vec<Value>),
}

/// Holds the current corpus snapshot
///
/// Readers take a cheap `Arc` clone; `reload` swaps in a new snapshot without
/// disturbing requests already holding the old one.
#[derive(Debug)]
pub struct CorpusStore {
    path: PathBuf,
    current: RwLock<Arc<Corpus>>,
}

impl CorpusStore {
    /// Load the corpus at `path`
    ///
    /// A missing file yields an empty corpus so the service can still start.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CorpusError> {
        let path = path.into();
        let corpus = read_corpus(&path)?;
        Ok(Self {
            path,
            current: RwLock::new(Arc::new(corpus)),
        })
    }

    /// Wrap an in-memory corpus, mostly for tests and benches
    pub fn from_corpus(corpus: Corpus) -> Self {
        Self {
            path: PathBuf::new(),
            current: RwLock::new(Arc::new(corpus)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<Corpus> {
        self.current.read().clone()
    }

    /// Re-read the corpus file and swap it in; the old snapshot stays on error
    pub fn reload(&self) -> Result<Arc<Corpus>, CorpusError> {
        let corpus = Arc::new(read_corpus(&self.path)?);
        *self.current.write() = corpus.clone();
        tracing::info!("Reloaded corpus version {} ({} programs)", corpus.version, corpus.len());
        Ok(corpus)
    }
}

fn read_corpus(path: &Path) -> Result<Corpus, CorpusError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::warn!("Corpus file {} not found, starting with no programs", path.display());
            return Ok(Corpus::new("empty", Vec::new()));
        }
        Err(e) => return Err(e.into()),
    };
    parse_corpus(&bytes)
}

/// Parse a corpus from JSON bytes
///
/// Accepts a bare array of programs or `{ "version": ..., "programs": [...] }`. Without
/// an explicit version, the content hash of the bytes is used. Records that do not
/// deserialize as a program are skipped.
pub fn parse_corpus(bytes: &[u8]) -> Result<Corpus, CorpusError> {
    let (version, records) = match serde_json::from_slice::<CorpusFile>(bytes)? {
        CorpusFile::Versioned { version, programs } => (version, programs),
        CorpusFile::Bare(programs) => (None, programs),
    };

    let total = records.len();
    let programs: Vec<Program> = records
        .into_iter()
        .enumerate()
        .filter_map(|(i, record)| match serde_json::from_value::<Program>(record) {
            Ok(program) => Some(program),
            Err(e) => {
                tracing::warn!("Skipping malformed program record {}: {}", i, e);
                None
            }
        })
        .collect();

    let version = version
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| content_hash(bytes));

    tracing::info!("Loaded {} of {} program records (version {})", programs.len(), total, version);
    Ok(Corpus::new(version, programs))
}
