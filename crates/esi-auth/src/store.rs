//! Token cache
//!
//! `TokenStore` is the capability the manager needs from persistence: load
//! the single cached record, and overwrite it. The file-backed store keeps
//! exactly one JSON record on disk; the in-memory store backs tests and
//! runs that must not touch the filesystem.
//!
//! The cache file is not locked. Two processes refreshing at the same time
//! race and the last writer wins; this tool assumes one user and one process.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::token::TokenRecord;

/// Persistence for the most recent token record.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility (`Arc<dyn TokenStore>`).
pub trait TokenStore: Send + Sync {
    /// The cached record, or `None` when absent, empty, or unreadable.
    /// Never fails: a damaged cache only means the user must re-authorize.
    fn load(&self) -> Pin<Box<dyn Future<Output = Option<TokenRecord>> + Send + '_>>;

    /// Replace the cached record.
    fn save<'a>(
        &'a self,
        record: &'a TokenRecord,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Token cache backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Option<TokenRecord> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no token cache file");
                return None;
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable token cache, ignoring");
                return None;
            }
        };

        if contents.trim().is_empty() {
            debug!(path = %self.path.display(), "token cache file is empty");
            return None;
        }

        match serde_json::from_str::<TokenRecord>(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt token cache, ignoring");
                None
            }
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Pin<Box<dyn Future<Output = Option<TokenRecord>> + Send + '_>> {
        Box::pin(self.read())
    }

    fn save<'a>(
        &'a self,
        record: &'a TokenRecord,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(write_atomic(&self.path, record))
    }
}

/// Write the record to a temp file next to `path`, then rename it over the
/// target so a crash never leaves a half-written cache. The temp file is
/// created 0600 on unix since it holds a refresh token, and removed again if
/// the write or rename fails.
async fn write_atomic(path: &Path, record: &TokenRecord) -> Result<()> {
    let json = serde_json::to_string_pretty(record)
        .map_err(|e| Error::Cache(format!("serializing token record: {e}")))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Cache(format!("cache path {} has no file name", path.display())))?;
    let tmp_path = path.with_file_name(format!(
        ".{}.tmp.{}",
        file_name.to_string_lossy(),
        std::process::id()
    ));

    let result = async {
        write_private(&tmp_path, json.as_bytes())
            .await
            .map_err(|e| Error::Cache(format!("writing temp token cache: {e}")))?;
        tokio::fs::rename(&tmp_path, path)
            .await
            .map_err(|e| Error::Cache(format!("renaming temp token cache: {e}")))
    }
    .await;

    if let Err(e) = &result {
        warn!(path = %tmp_path.display(), error = %e, "discarding temp token cache");
        match tokio::fs::remove_file(&tmp_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(path = %tmp_path.display(), error = %e, "could not remove temp token cache")
            }
        }
        return result;
    }

    debug!(path = %path.display(), "persisted token record");
    Ok(())
}

/// Create `path` fresh with owner-only permissions and write `contents`.
async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    // A leftover from a crashed run would keep its old mode.
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

/// Token cache held in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: Mutex<Option<TokenRecord>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: TokenRecord) -> Self {
        Self {
            record: Mutex::new(Some(record)),
        }
    }

    /// Current record, for assertions.
    pub async fn get(&self) -> Option<TokenRecord> {
        self.record.lock().await.clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Pin<Box<dyn Future<Output = Option<TokenRecord>> + Send + '_>> {
        Box::pin(async move { self.record.lock().await.clone() })
    }

    fn save<'a>(
        &'a self,
        record: &'a TokenRecord,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            *self.record.lock().await = Some(record.clone());
            Ok(())
        })
    }
}
