use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use listo_core::error::CoreError;
use listo_core::storage::KeyValueStore;

/// File-per-key store: the blob for key `k` lives at `<dir>/<k>`.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Io(e)),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<(), CoreError> {
        fs::create_dir_all(&self.dir).await?;
        // Write-then-rename so a crash mid-write cannot truncate the blob.
        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
