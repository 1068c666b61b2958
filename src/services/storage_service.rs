use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::{StorageError, StorageResult};

/// Content type served when the file name gives no usable hint
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/png";

/// File loaded back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResource {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl StoredResource {
    /// Guess the content type from the file name, falling back to PNG
    pub fn content_type(&self) -> String {
        match probe_content_type(&self.filename) {
            Some(content_type) => content_type,
            None => {
                crate::warn_with_trace!(
                    filename = %self.filename,
                    "Could not determine content type, using {}",
                    DEFAULT_IMAGE_CONTENT_TYPE
                );
                DEFAULT_IMAGE_CONTENT_TYPE.to_string()
            }
        }
    }
}

/// Storage backend for uploaded files, addressed by paths relative to a root
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Store the bytes below `directory` and return the generated file name
    async fn store(
        &self,
        bytes: &[u8],
        original_name: &str,
        directory: &str,
    ) -> StorageResult<String>;

    /// Load a previously stored file
    async fn load_as_resource(&self, path: &str) -> StorageResult<StoredResource>;
}

/// Local filesystem storage
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root directory if it does not exist yet
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn init(&self) -> StorageResult<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        info!("Storage root ready");
        Ok(())
    }

    /// Map a relative storage path onto the root, refusing anything that escapes it
    fn resolve(&self, relative: &str) -> StorageResult<PathBuf> {
        let mut resolved = self.root.clone();

        for component in Path::new(relative.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(StorageError::InvalidPath {
                        path: relative.to_string(),
                    });
                }
            }
        }

        Ok(resolved)
    }
}

#[async_trait]
impl StorageService for FileSystemStorage {
    #[instrument(skip(self, bytes), fields(size = bytes.len(), directory = %directory))]
    async fn store(
        &self,
        bytes: &[u8],
        original_name: &str,
        directory: &str,
    ) -> StorageResult<String> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile {
                filename: original_name.to_string(),
            });
        }

        let target_dir = self.resolve(directory)?;
        tokio::fs::create_dir_all(&target_dir).await?;

        let filename = generate_filename(original_name);
        tokio::fs::write(target_dir.join(&filename), bytes).await?;

        info!(filename = %filename, "Stored file");
        Ok(filename)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn load_as_resource(&self, path: &str) -> StorageResult<StoredResource> {
        let resolved = self.resolve(path)?;

        let bytes = match tokio::fs::read(&resolved).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Stored file is missing");
                return Err(StorageError::FileNotFound {
                    path: path.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let filename = resolved
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(StoredResource { filename, bytes })
    }
}

/// `{uuid}.{ext}` where the extension is taken from the uploaded name
fn generate_filename(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension {
        Some(ext) if !ext.is_empty() => format!("{}.{}", Uuid::new_v4(), ext),
        _ => Uuid::new_v4().to_string(),
    }
}

/// Guess a MIME type from a file name
pub fn probe_content_type(filename: &str) -> Option<String> {
    mime_guess::from_path(filename)
        .first()
        .map(|mime| mime.essence_str().to_string())
}
