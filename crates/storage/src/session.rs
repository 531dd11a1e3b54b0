//! Per-request upload session directories.

use crate::error::StorageResult;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Allocates uniquely named directories for in-flight signing requests.
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    /// Create a new session store rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root directory holding all session directories.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a fresh session directory.
    pub async fn create(&self) -> StorageResult<SessionDir> {
        let id = Uuid::new_v4();
        let path = self.root.join(id.to_string());
        fs::create_dir_all(&path).await?;
        tracing::debug!(session_id = %id, "session directory created");
        Ok(SessionDir { id, path })
    }
}

/// One upload session's directory, holding the request's input files until
/// the signing invocation has run.
pub struct SessionDir {
    id: Uuid,
    path: PathBuf,
}

impl SessionDir {
    /// Session identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Filesystem path of the session directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path a named file will occupy inside the session directory.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Open a writer for a named file inside the session directory.
    ///
    /// `name` must be one of the fixed stored names chosen by the caller,
    /// never client input.
    pub async fn begin_file(&self, name: &str) -> StorageResult<SessionFileWriter> {
        let path = self.file_path(name);
        let file = fs::File::create(&path).await?;
        Ok(SessionFileWriter {
            file,
            path,
            bytes_written: 0,
        })
    }

    /// Remove the session directory and everything in it.
    ///
    /// Best effort: runs on success and failure paths alike, tolerates files
    /// that never arrived, and never propagates deletion errors.
    pub async fn teardown(&self) {
        match fs::remove_dir_all(&self.path).await {
            Ok(()) => tracing::debug!(session_id = %self.id, "session directory removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "failed to remove session directory");
            }
        }
    }
}

/// Incremental writer for one session file.
pub struct SessionFileWriter {
    file: fs::File,
    path: PathBuf,
    bytes_written: u64,
}

impl SessionFileWriter {
    /// Append a chunk to the file.
    pub async fn write(&mut self, data: &[u8]) -> StorageResult<()> {
        self.file.write_all(data).await?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Total bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Flush and close, returning the final path and size.
    pub async fn finish(mut self) -> StorageResult<(PathBuf, u64)> {
        self.file.flush().await?;
        Ok((self.path, self.bytes_written))
    }
}
