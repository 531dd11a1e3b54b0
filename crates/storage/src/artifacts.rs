//! Artifact registry over the shared output directory.
//!
//! The output directory IS the registry: no separate index is kept, and
//! artifact metadata is recomputed from stat calls on every listing. The
//! trait boundary exists so a real index could later replace the directory
//! walk without touching handlers.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use time::OffsetDateTime;
use tokio::fs;
use tracing::instrument;

/// Chunk size for streaming reads (64 KiB).
const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Maximum accepted artifact name length in bytes.
const MAX_NAME_LEN: usize = 255;

/// Extension of files the registry manages.
const ARTIFACT_EXT: &str = "ipa";

/// Stream of artifact bytes.
pub type ByteStream = Pin<Box<dyn Stream<Item = StorageResult<Bytes>> + Send>>;

/// Metadata for one produced artifact.
#[derive(Clone, Debug)]
pub struct ArtifactMeta {
    /// File name inside the output directory.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation time, recomputed from the filesystem.
    pub created: OffsetDateTime,
}

/// Registry of produced artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Resolve the path a new artifact with this name must be written to.
    ///
    /// Validates the name; the caller hands the path to the signing tool.
    fn staging_path(&self, name: &str) -> StorageResult<PathBuf>;

    /// Stat one artifact by name.
    async fn stat(&self, name: &str) -> StorageResult<ArtifactMeta>;

    /// List all artifacts, newest-created first.
    async fn list(&self) -> StorageResult<Vec<ArtifactMeta>>;

    /// Delete one artifact by name.
    async fn delete(&self, name: &str) -> StorageResult<()>;

    /// Open a streaming read of one artifact.
    async fn get_stream(&self, name: &str) -> StorageResult<ByteStream>;
}

/// Validate a client-supplied artifact name before any filesystem access.
///
/// Rejects anything that could address a path outside the output directory:
/// path separators, `..`, leading dots, and characters outside
/// `[A-Za-z0-9._-]`.
pub fn validate_name(name: &str) -> StorageResult<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    if name.starts_with('.') || name.contains("..") {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Directory-backed artifact registry.
pub struct FilesystemArtifacts {
    root: PathBuf,
}

impl FilesystemArtifacts {
    /// Create a new registry rooted at `root`.
    pub async fn new(root: impl AsRef<Path>) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    /// Root output directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate a name and join it onto the root.
    fn entry_path(&self, name: &str) -> StorageResult<PathBuf> {
        validate_name(name)?;
        Ok(self.root.join(name))
    }

    async fn meta_for(&self, name: &str, path: &Path) -> StorageResult<ArtifactMeta> {
        let metadata = fs::metadata(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(name.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Artifacts are written once and never rewritten, so the modified
        // time doubles as the creation time on filesystems without birthtime.
        let created = metadata
            .modified()
            .map(OffsetDateTime::from)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH);

        Ok(ArtifactMeta {
            name: name.to_string(),
            size: metadata.len(),
            created,
        })
    }
}

#[async_trait]
impl ArtifactStore for FilesystemArtifacts {
    fn staging_path(&self, name: &str) -> StorageResult<PathBuf> {
        self.entry_path(name)
    }

    #[instrument(skip(self))]
    async fn stat(&self, name: &str) -> StorageResult<ArtifactMeta> {
        let path = self.entry_path(name)?;
        self.meta_for(name, &path).await
    }

    #[instrument(skip(self))]
    async fn list(&self) -> StorageResult<Vec<ArtifactMeta>> {
        let mut results = Vec::new();
        let mut entries = fs::read_dir(&self.root).await?;

        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if !file_type.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            let is_artifact = Path::new(&name)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(ARTIFACT_EXT));
            if !is_artifact || validate_name(&name).is_err() {
                continue;
            }

            match self.meta_for(&name, &entry.path()).await {
                Ok(meta) => results.push(meta),
                // Raced with a concurrent delete; skip the vanished entry.
                Err(StorageError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        results.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete(&self, name: &str) -> StorageResult<()> {
        let path = self.entry_path(name)?;
        fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(name.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;
        tracing::info!(artifact = %name, "artifact deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_stream(&self, name: &str) -> StorageResult<ByteStream> {
        use tokio::io::AsyncReadExt;

        let path = self.entry_path(name)?;
        let file = fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound(name.to_string())
            } else {
                StorageError::Io(e)
            }
        })?;

        // Stream the file in chunks instead of loading it into memory
        let stream = async_stream::try_stream! {
            let mut file = file;
            let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(Box::pin(stream))
    }
}
