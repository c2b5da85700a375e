use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, TrackerError};
use crate::models::Dataset;

/// Key under which the working dataset is cached.
pub const STORAGE_KEY: &str = "studentProgressData";

/// Persistence gateway for the whole dataset.
///
/// `load` returns the saved dataset, or bootstraps one from a known source
/// and caches it. Neither call validates invariants; the tracker does.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    async fn load(&self) -> Result<Dataset>;
    async fn save(&self, dataset: &Dataset) -> Result<()>;
}

#[async_trait]
impl<T: DatasetStore + ?Sized> DatasetStore for Box<T> {
    async fn load(&self) -> Result<Dataset> {
        (**self).load().await
    }

    async fn save(&self, dataset: &Dataset) -> Result<()> {
        (**self).save(dataset).await
    }
}

/// Key-value store backed by one JSON file per key in a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
    bootstrap: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>, bootstrap: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            bootstrap: bootstrap.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.data_dir.join(format!("{STORAGE_KEY}.json"))
    }
}

#[async_trait]
impl DatasetStore for FileStore {
    async fn load(&self) -> Result<Dataset> {
        let path = self.path();
        if let Some(bytes) = read_if_exists(&path).await? {
            tracing::debug!(path = %path.display(), "loaded saved dataset");
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let dataset = read_bootstrap(&self.bootstrap).await?;
        self.save(&dataset).await?;
        tracing::info!(
            bootstrap = %self.bootstrap.display(),
            path = %path.display(),
            "cached bootstrap dataset"
        );
        Ok(dataset)
    }

    async fn save(&self, dataset: &Dataset) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|err| TrackerError::io("create", &self.data_dir, err))?;

        let path = self.path();
        let staging = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(dataset)?;
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|err| TrackerError::io("write", &staging, err))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|err| TrackerError::io("replace", &path, err))?;

        tracing::debug!(path = %path.display(), students = dataset.students.len(), "saved dataset");
        Ok(())
    }
}

async fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(TrackerError::io("read", path, err)),
    }
}

/// Reads the bootstrap dataset shared by every backend.
pub async fn read_bootstrap(path: &Path) -> Result<Dataset> {
    let bytes = read_if_exists(path)
        .await?
        .ok_or_else(|| TrackerError::NoDataset(path.to_path_buf()))?;
    Ok(serde_json::from_slice(&bytes)?)
}
