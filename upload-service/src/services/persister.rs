//! Turns buffered multipart file parts into stored files.
//!
//! Every part gets a fresh v4 UUID; the stored name is the UUID followed by
//! the extension of the client-supplied filename. A batch is written
//! sequentially and, if any write fails, the files already written for that
//! batch are removed again before the error is returned.

use crate::models::{FilePart, UploadedFile};
use crate::services::metrics;
use crate::services::storage::{Storage, StorageError};
use std::sync::Arc;
use uuid::Uuid;

pub struct FilePersister {
    storage: Arc<dyn Storage>,
    public_path: String,
}

impl FilePersister {
    pub fn new(storage: Arc<dyn Storage>, public_path: impl Into<String>) -> Self {
        let public_path = public_path.into().trim_end_matches('/').to_string();
        Self {
            storage,
            public_path,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Store a single part and describe it.
    pub async fn persist(&self, part: FilePart) -> Result<UploadedFile, StorageError> {
        let id = Uuid::new_v4().to_string();
        let name = storage_name(&id, &part.file_name);
        let size = part.size();

        self.storage.put(&name, part.data).await?;

        tracing::info!(
            file_id = %id,
            original_name = %part.file_name,
            stored_name = %name,
            size = size,
            "File stored"
        );

        Ok(UploadedFile {
            url: format!("{}/{}", self.public_path, name),
            id,
            name,
            content_type: part.content_type,
            size,
        })
    }

    /// Store every part in order. The first failure aborts the batch and
    /// removes the files this call already wrote.
    pub async fn persist_all(
        &self,
        parts: Vec<FilePart>,
    ) -> Result<Vec<UploadedFile>, StorageError> {
        let mut stored = Vec::with_capacity(parts.len());

        for part in parts {
            match self.persist(part).await {
                Ok(file) => stored.push(file),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        already_stored = stored.len(),
                        "Failed to store file, rolling back batch"
                    );
                    metrics::record_upload_failure();
                    self.rollback(&stored).await;
                    return Err(e);
                }
            }
        }

        metrics::record_uploaded_files(&stored);
        Ok(stored)
    }

    async fn rollback(&self, stored: &[UploadedFile]) {
        for file in stored {
            if let Err(e) = self.storage.delete(&file.name).await {
                tracing::warn!(
                    file_id = %file.id,
                    error = %e,
                    "Failed to remove file from aborted batch"
                );
            }
        }
    }
}

/// Stored filename for `id`: the id followed by the extension of `original`.
pub fn storage_name(id: &str, original: &str) -> String {
    format!("{}{}", id, extension_of(original))
}

/// Suffix of the final path element starting at its last `.`, dot included.
/// Empty when the element has no dot. Never contains a path separator.
pub fn extension_of(file_name: &str) -> &str {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);

    match base.rfind('.') {
        Some(idx) => &base[idx..],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Bytes;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// In-memory storage that fails the n-th `put` (1-based) when configured.
    #[derive(Default)]
    struct MemoryStorage {
        objects: Mutex<HashMap<String, Bytes>>,
        fail_on_put: Option<usize>,
        puts: Mutex<usize>,
    }

    impl MemoryStorage {
        fn failing_on(n: usize) -> Self {
            Self {
                fail_on_put: Some(n),
                ..Self::default()
            }
        }

        fn keys(&self) -> Vec<String> {
            self.objects.lock().unwrap().keys().cloned().collect()
        }
    }

    #[async_trait]
    impl Storage for MemoryStorage {
        async fn put(&self, key: &str, data: Bytes) -> Result<(), StorageError> {
            let attempt = {
                let mut puts = self.puts.lock().unwrap();
                *puts += 1;
                *puts
            };
            if self.fail_on_put == Some(attempt) {
                return Err(StorageError::Create {
                    path: PathBuf::from(key),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
                });
            }
            self.objects.lock().unwrap().insert(key.to_string(), data);
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<(), StorageError> {
            self.objects.lock().unwrap().remove(key);
            Ok(())
        }

        async fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn extension_is_taken_from_last_dot() {
        assert_eq!(extension_of("a.txt"), ".txt");
        assert_eq!(extension_of("b.png"), ".png");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
        assert_eq!(extension_of(".bashrc"), ".bashrc");
        assert_eq!(extension_of("trailing."), ".");
        assert_eq!(extension_of("README"), "");
        assert_eq!(extension_of(""), "");
    }

    #[test]
    fn extension_never_contains_path_separators() {
        assert_eq!(extension_of("dir.d/file"), "");
        assert_eq!(extension_of("../../etc/passwd"), "");
        assert_eq!(extension_of("..\\evil.exe"), ".exe");
        assert_eq!(extension_of("x/../y.sh"), ".sh");
    }

    #[test]
    fn storage_name_appends_extension() {
        assert_eq!(storage_name("abc", "photo.png"), "abc.png");
        assert_eq!(storage_name("abc", "Makefile"), "abc");
    }

    #[tokio::test]
    async fn persist_describes_stored_file() {
        let storage = Arc::new(MemoryStorage::default());
        let persister = FilePersister::new(storage.clone(), "/api/uploads/");

        let file = persister
            .persist(FilePart::new("a.txt", "text/plain", b"hello".to_vec()))
            .await
            .unwrap();

        assert!(Uuid::parse_str(&file.id).is_ok());
        assert_eq!(file.name, format!("{}.txt", file.id));
        assert_eq!(file.content_type, "text/plain");
        assert_eq!(file.size, 5);
        assert_eq!(file.url, format!("/api/uploads/{}", file.name));
        assert_eq!(storage.keys(), vec![file.name.clone()]);
    }

    #[tokio::test]
    async fn same_original_name_gets_distinct_ids() {
        let storage = Arc::new(MemoryStorage::default());
        let persister = FilePersister::new(storage.clone(), "/api/uploads");

        let files = persister
            .persist_all(vec![
                FilePart::new("same.txt", "text/plain", b"one".to_vec()),
                FilePart::new("same.txt", "text/plain", b"two".to_vec()),
            ])
            .await
            .unwrap();

        assert_eq!(files.len(), 2);
        assert_ne!(files[0].id, files[1].id);
        assert_ne!(files[0].name, files[1].name);
        assert_eq!(storage.keys().len(), 2);
    }

    #[tokio::test]
    async fn failure_rolls_back_earlier_files() {
        let storage = Arc::new(MemoryStorage::failing_on(3));
        let persister = FilePersister::new(storage.clone(), "/api/uploads");

        let err = persister
            .persist_all(vec![
                FilePart::new("a.txt", "text/plain", b"a".to_vec()),
                FilePart::new("b.txt", "text/plain", b"b".to_vec()),
                FilePart::new("c.txt", "text/plain", b"c".to_vec()),
            ])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("disk full"));
        assert!(storage.keys().is_empty());
    }
}
