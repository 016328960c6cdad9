//! # Document Storage
//!
//! Per-user PDF documents. Objects are addressed by `<user_id>/<file_name>`;
//! [`LocalDocumentStore`] maps that key onto a directory tree below the
//! configured document root.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;
use utoipa::ToSchema;
use uuid::Uuid;

/// Every stored document must start with this signature
pub const PDF_MAGIC: &[u8] = b"%PDF-";

const MAX_FILE_NAME_LEN: usize = 128;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name '{0}'")]
    InvalidFileName(String),
    #[error("document is not a PDF")]
    NotPdf,
    #[error("document is {size} bytes, the limit is {max}")]
    TooLarge { size: usize, max: usize },
    #[error("document '{0}' not found")]
    NotFound(String),
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Metadata about a stored document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DocumentInfo {
    pub file_name: String,
    pub size_bytes: u64,
    /// Hex SHA-256 of the content, only computed when the content is at hand
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[schema(value_type = Option<String>)]
    pub modified_at: Option<DateTime<Utc>>,
}

/// A document with its content
#[derive(Debug, Clone)]
pub struct Document {
    pub info: DocumentInfo,
    pub bytes: Vec<u8>,
}

/// Storage backend for user documents
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of one user, sorted by file name
    async fn list(&self, owner_id: Uuid) -> Result<Vec<DocumentInfo>, StorageError>;

    /// Store (or replace) a document
    async fn put(
        &self,
        owner_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentInfo, StorageError>;

    async fn get(&self, owner_id: Uuid, file_name: &str) -> Result<Document, StorageError>;

    async fn delete(&self, owner_id: Uuid, file_name: &str) -> Result<(), StorageError>;
}

/// Checks a client supplied file name.
///
/// Only `[A-Za-z0-9._-]` is accepted, the name must end in `.pdf` and must
/// not contain `..`, so it can never leave the owner's directory.
pub fn validate_file_name(file_name: &str) -> Result<(), StorageError> {
    let valid = !file_name.is_empty()
        && file_name.len() <= MAX_FILE_NAME_LEN
        && !file_name.starts_with('.')
        && !file_name.contains("..")
        && file_name.to_ascii_lowercase().ends_with(".pdf")
        && file_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidFileName(file_name.to_string()))
    }
}

/// Checks size and PDF signature of an upload
pub fn validate_pdf(bytes: &[u8], max_bytes: usize) -> Result<(), StorageError> {
    if bytes.len() > max_bytes {
        return Err(StorageError::TooLarge {
            size: bytes.len(),
            max: max_bytes,
        });
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(StorageError::NotPdf);
    }
    Ok(())
}

pub fn content_etag(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Filesystem-backed [`DocumentStore`]
#[derive(Debug, Clone)]
pub struct LocalDocumentStore {
    root: PathBuf,
    max_bytes: usize,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_bytes,
        }
    }

    fn owner_dir(&self, owner_id: Uuid) -> PathBuf {
        self.root.join(owner_id.to_string())
    }

    fn document_path(&self, owner_id: Uuid, file_name: &str) -> Result<PathBuf, StorageError> {
        validate_file_name(file_name)?;
        Ok(self.owner_dir(owner_id).join(file_name))
    }

    async fn describe(
        path: &Path,
        file_name: &str,
        content: Option<&[u8]>,
    ) -> Result<DocumentInfo, StorageError> {
        let metadata = fs::metadata(path).await?;
        Ok(DocumentInfo {
            file_name: file_name.to_string(),
            size_bytes: metadata.len(),
            etag: content.map(content_etag),
            modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }
}

fn not_found_or_io(err: std::io::Error, file_name: &str) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::NotFound(file_name.to_string())
    } else {
        StorageError::Io(err)
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn list(&self, owner_id: Uuid) -> Result<Vec<DocumentInfo>, StorageError> {
        let mut entries = match fs::read_dir(self.owner_dir(owner_id)).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut documents = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            // Skips partial uploads and anything not written through `put`
            if validate_file_name(&file_name).is_err() || !entry.file_type().await?.is_file() {
                continue;
            }

            documents.push(Self::describe(&entry.path(), &file_name, None).await?);
        }

        documents.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(documents)
    }

    async fn put(
        &self,
        owner_id: Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<DocumentInfo, StorageError> {
        let path = self.document_path(owner_id, file_name)?;
        validate_pdf(bytes, self.max_bytes)?;

        fs::create_dir_all(self.owner_dir(owner_id)).await?;

        // Write next to the target and rename so readers never see a partial file
        let staging = self
            .owner_dir(owner_id)
            .join(format!(".{}.{}.part", file_name, Uuid::new_v4()));
        let written = match fs::write(&staging, bytes).await {
            Ok(()) => fs::rename(&staging, &path).await,
            Err(err) => Err(err),
        };
        if let Err(err) = written {
            let _ = fs::remove_file(&staging).await;
            return Err(err.into());
        }

        let info = Self::describe(&path, file_name, Some(bytes)).await?;
        tracing::info!(
            owner_id = %owner_id,
            file_name,
            size_bytes = info.size_bytes,
            "Document stored"
        );
        Ok(info)
    }

    async fn get(&self, owner_id: Uuid, file_name: &str) -> Result<Document, StorageError> {
        let path = self.document_path(owner_id, file_name)?;
        let bytes = fs::read(&path)
            .await
            .map_err(|err| not_found_or_io(err, file_name))?;
        let info = Self::describe(&path, file_name, Some(bytes.as_slice())).await?;

        Ok(Document { info, bytes })
    }

    async fn delete(&self, owner_id: Uuid, file_name: &str) -> Result<(), StorageError> {
        let path = self.document_path(owner_id, file_name)?;
        fs::remove_file(&path)
            .await
            .map_err(|err| not_found_or_io(err, file_name))?;

        tracing::info!(owner_id = %owner_id, file_name, "Document deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(body: &str) -> Vec<u8> {
        format!("%PDF-1.7\n{body}\n%%EOF").into_bytes()
    }

    #[test]
    fn test_validate_file_name() {
        assert!(validate_file_name("lease-2026_v2.pdf").is_ok());
        assert!(validate_file_name("SCAN.PDF").is_ok());

        for bad in [
            "",
            "../secret.pdf",
            "a..b.pdf",
            "notes.txt",
            "dir/file.pdf",
            ".hidden.pdf",
            "with space.pdf",
        ] {
            assert!(validate_file_name(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_validate_pdf() {
        assert!(validate_pdf(&pdf("x"), 1024).is_ok());
        assert!(matches!(validate_pdf(b"hello", 1024), Err(StorageError::NotPdf)));
        assert!(matches!(
            validate_pdf(&pdf(&"x".repeat(100)), 16),
            Err(StorageError::TooLarge { max: 16, .. })
        ));
    }

    #[tokio::test]
    async fn test_put_get_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path(), 1024);
        let owner = Uuid::new_v4();

        assert!(store.list(owner).await.unwrap().is_empty());

        let content = pdf("lease");
        let info = store.put(owner, "lease.pdf", &content).await.unwrap();
        assert_eq!(info.size_bytes, content.len() as u64);
        assert_eq!(info.etag, Some(content_etag(&content)));

        store.put(owner, "a-receipt.pdf", &pdf("receipt")).await.unwrap();
        let names: Vec<_> = store
            .list(owner)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.file_name)
            .collect();
        assert_eq!(names, vec!["a-receipt.pdf", "lease.pdf"]);

        let fetched = store.get(owner, "lease.pdf").await.unwrap();
        assert_eq!(fetched.bytes, content);
        assert_eq!(fetched.info.etag, Some(content_etag(&content)));

        store.delete(owner, "lease.pdf").await.unwrap();
        assert!(matches!(
            store.get(owner, "lease.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_documents_are_scoped_per_owner() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path(), 1024);
        let owner = Uuid::new_v4();

        store.put(owner, "lease.pdf", &pdf("lease")).await.unwrap();
        assert!(store.list(Uuid::new_v4()).await.unwrap().is_empty());
        assert!(matches!(
            store.get(Uuid::new_v4(), "lease.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_reports_metadata_without_hashing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path(), 1024);
        let owner = Uuid::new_v4();

        let lease = pdf("lease");
        let receipt = pdf(&"receipt".repeat(20));
        store.put(owner, "lease.pdf", &lease).await.unwrap();
        store.put(owner, "receipt.pdf", &receipt).await.unwrap();
        // Leftover staging file from an interrupted upload
        fs::write(dir.path().join(owner.to_string()).join(".lease.pdf.x.part"), b"%PDF-")
            .await
            .unwrap();

        let listed = store.list(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].file_name, "lease.pdf");
        assert_eq!(listed[0].size_bytes, lease.len() as u64);
        assert_eq!(listed[1].file_name, "receipt.pdf");
        assert_eq!(listed[1].size_bytes, receipt.len() as u64);
        assert!(listed.iter().all(|d| d.etag.is_none() && d.modified_at.is_some()));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalDocumentStore::new(dir.path(), 1024);
        let owner = Uuid::new_v4();

        // A directory in place of the target makes the rename fail
        let owner_dir = dir.path().join(owner.to_string());
        fs::create_dir_all(owner_dir.join("lease.pdf")).await.unwrap();

        let result = store.put(owner, "lease.pdf", &pdf("lease")).await;
        assert!(matches!(result, Err(StorageError::Io(_))));

        let mut entries = fs::read_dir(&owner_dir).await.unwrap();
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().into_string().unwrap());
        }
        assert_eq!(names, vec!["lease.pdf"]);
    }
}
