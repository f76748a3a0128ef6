//! Applicant document uploads.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::UploadConfig;

const ALLOWED_TYPES: [&str; 5] = [
    "application/pdf",
    "image/jpeg",
    "image/png",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Response body of `POST /api/upload`. `filename` is the client's name, `url` the stored one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub filename: String,
    pub url: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file uploaded")]
    NoFile,
    #[error("File too large. Maximum size is {limit} bytes")]
    TooLarge { limit: usize },
    #[error("Invalid file type. Only PDF, images, and Word documents are allowed")]
    UnsupportedType(String),
    #[error("file storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Where accepted files end up.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist `bytes` under `filename` and return the public URL.
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError>;

    async fn fetch(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError>;
}

#[derive(Debug, Clone)]
pub struct LocalFileStore {
    directory: PathBuf,
}

impl LocalFileStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn put(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
        tokio::fs::create_dir_all(&self.directory).await?;
        let path = self.directory.join(filename);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "upload written");
        Ok(format!("/uploads/{filename}"))
    }

    async fn fetch(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
        match tokio::fs::read(self.directory.join(filename)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Size and type gate in front of a [`FileStore`].
#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn FileStore>,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(store: Arc<dyn FileStore>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    pub fn local(config: &UploadConfig) -> Self {
        Self::new(
            Arc::new(LocalFileStore::new(config.directory.clone())),
            config.max_bytes,
        )
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Check and store one file. The stored name is random; only the extension is kept.
    pub async fn accept(
        &self,
        original_name: Option<&str>,
        declared_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::NoFile);
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }
        let mime_type = resolve_type(original_name, declared_type)?;

        let stored_name = match extension(original_name, &mime_type) {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let url = self.store.put(&stored_name, bytes).await?;
        info!(%stored_name, size = bytes.len(), %mime_type, "file uploaded");

        Ok(StoredFile {
            filename: original_name.unwrap_or(&stored_name).to_string(),
            url,
            size: bytes.len(),
            mime_type,
        })
    }

    /// Read back a stored file with its content type. Names are generated, never paths.
    pub async fn open(&self, stored_name: &str) -> Result<Option<(Vec<u8>, String)>, UploadError> {
        if !is_stored_name(stored_name) {
            return Ok(None);
        }
        let content_type = mime_guess::from_path(stored_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Ok(self
            .store
            .fetch(stored_name)
            .await?
            .map(|bytes| (bytes, content_type)))
    }
}

fn is_stored_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        && !name.starts_with('.')
}

/// The declared content type wins when allowed; a generic or missing one falls back to the
/// file extension.
fn resolve_type(original_name: Option<&str>, declared: Option<&str>) -> Result<String, UploadError> {
    let declared = declared
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map(|mime| mime.essence_str().to_string());
    if let Some(declared) = declared.as_deref() {
        if is_allowed(declared) {
            return Ok(declared.to_string());
        }
        if declared != mime::APPLICATION_OCTET_STREAM.essence_str() {
            return Err(UploadError::UnsupportedType(declared.to_string()));
        }
    }

    let guessed = original_name
        .and_then(|name| mime_guess::from_path(name).first())
        .map(|mime| mime.essence_str().to_string())
        .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.essence_str().to_string());
    if is_allowed(&guessed) {
        Ok(guessed)
    } else {
        Err(UploadError::UnsupportedType(guessed))
    }
}

fn is_allowed(mime_type: &str) -> bool {
    ALLOWED_TYPES.contains(&mime_type)
}

/// The client's extension survives only when it maps back to the accepted type, so the
/// content type guessed on download always matches what was checked on upload.
fn extension(original_name: Option<&str>, mime_type: &str) -> Option<String> {
    let from_name = original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(str::to_ascii_lowercase)
        .filter(|ext| {
            mime_guess::from_ext(ext)
                .iter()
                .any(|guess| guess.essence_str() == mime_type)
        });
    from_name.or_else(|| {
        mime_guess::get_mime_extensions_str(mime_type)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryFiles {
        files: Mutex<Vec<(String, usize)>>,
    }

    #[async_trait]
    impl FileStore for MemoryFiles {
        async fn put(&self, filename: &str, bytes: &[u8]) -> Result<String, UploadError> {
            self.files
                .lock()
                .unwrap()
                .push((filename.to_string(), bytes.len()));
            Ok(format!("/uploads/{filename}"))
        }

        async fn fetch(&self, filename: &str) -> Result<Option<Vec<u8>>, UploadError> {
            let known = self
                .files
                .lock()
                .unwrap()
                .iter()
                .any(|(name, _)| name == filename);
            Ok(known.then(|| b"%PDF-1.7".to_vec()))
        }
    }

    fn service(max_bytes: usize) -> (Arc<MemoryFiles>, UploadService) {
        let files = Arc::new(MemoryFiles::default());
        (Arc::clone(&files), UploadService::new(files, max_bytes))
    }

    #[tokio::test]
    async fn pdf_is_stored_under_random_name() {
        let (files, uploads) = service(1024);
        let stored = uploads
            .accept(Some("KCSE Certificate.PDF"), Some("application/pdf"), b"%PDF-1.7")
            .await
            .expect("accepted");

        assert_eq!(stored.filename, "KCSE Certificate.PDF");
        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(".pdf"));
        assert!(!stored.url.contains("KCSE"));
        assert_eq!(stored.size, 8);
        assert_eq!(stored.mime_type, "application/pdf");
        let files = files.files.lock().unwrap();
        assert_eq!(stored.url, format!("/uploads/{}", files[0].0));
    }

    #[tokio::test]
    async fn octet_stream_falls_back_to_extension() {
        let (_, uploads) = service(1024);
        let stored = uploads
            .accept(
                Some("cv.docx"),
                Some("application/octet-stream"),
                b"PK\x03\x04",
            )
            .await
            .expect("accepted");
        assert_eq!(
            stored.mime_type,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
        );
    }

    #[tokio::test]
    async fn stored_extension_follows_accepted_type() {
        let (_, uploads) = service(1024);
        let stored = uploads
            .accept(Some("x.html"), Some("image/png"), b"<script>alert(1)</script>")
            .await
            .expect("accepted as png");
        assert!(stored.url.ends_with(".png"));
        assert_eq!(stored.filename, "x.html");

        let stored_name = stored.url.trim_start_matches("/uploads/");
        let (_, content_type) = uploads
            .open(stored_name)
            .await
            .expect("read")
            .expect("present");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn disallowed_type_is_refused() {
        let (files, uploads) = service(1024);
        let err = uploads
            .accept(Some("payload.exe"), Some("application/x-msdownload"), b"MZ")
            .await
            .expect_err("executable");
        assert!(matches!(err, UploadError::UnsupportedType(_)));
        assert!(files.files.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn oversize_and_empty_files_are_refused() {
        let (_, uploads) = service(4);
        assert!(matches!(
            uploads
                .accept(Some("scan.png"), Some("image/png"), b"\x89PNG\r\n")
                .await,
            Err(UploadError::TooLarge { limit: 4 })
        ));
        assert!(matches!(
            uploads.accept(Some("scan.png"), Some("image/png"), b"").await,
            Err(UploadError::NoFile)
        ));
    }

    #[tokio::test]
    async fn stored_file_can_be_read_back_but_paths_cannot() {
        let (_, uploads) = service(1024);
        let stored = uploads
            .accept(Some("offer.pdf"), Some("application/pdf"), b"%PDF-1.7")
            .await
            .expect("accepted");
        let stored_name = stored.url.trim_start_matches("/uploads/");

        let (bytes, content_type) = uploads
            .open(stored_name)
            .await
            .expect("read")
            .expect("present");
        assert_eq!(bytes, b"%PDF-1.7");
        assert_eq!(content_type, "application/pdf");

        assert!(uploads.open("../.env").await.expect("read").is_none());
    }
}
