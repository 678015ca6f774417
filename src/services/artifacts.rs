use crate::constants::INDEX_FILE_NAME;
use crate::error::{Error, Result};
use crate::utils::sanitize_file_stem;
use std::path::{Path, PathBuf};

/// Where a run reads and writes its files
#[derive(Debug, Clone)]
pub struct ArtifactLayout {
    data_dir: PathBuf,
    out_dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(data_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Raw CSV for the `index`-th tab of `name`
    pub fn csv_path(&self, name: &str, index: usize) -> PathBuf {
        self.data_dir.join(artifact_file_name(name, index, "csv"))
    }

    /// Rendered chart for the `index`-th tab of `name`
    pub fn html_path(&self, name: &str, index: usize) -> PathBuf {
        self.out_dir.join(artifact_file_name(name, index, "html"))
    }

    pub fn index_path(&self) -> PathBuf {
        self.out_dir.join(INDEX_FILE_NAME)
    }

    pub async fn ensure_data_dir(&self) -> Result<()> {
        create_dir(&self.data_dir).await
    }

    pub async fn ensure_out_dir(&self) -> Result<()> {
        create_dir(&self.out_dir).await
    }
}

async fn create_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        Error::Io(format!(
            "The folder '{}' could not be created: {}",
            dir.display(),
            e
        ))
    })
}

/// `<name>-<index>.<ext>` with `.`, space and `\` in the name replaced by `-`
pub fn artifact_file_name(name: &str, index: usize, extension: &str) -> String {
    format!("{}-{}.{}", sanitize_file_stem(name), index, extension)
}

/// Replace the contents of `path` with `bytes`
pub async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| Error::Io(format!("Failed to write '{}': {}", path.display(), e)))
}

pub async fn read_artifact(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| Error::Io(format!("Failed to read '{}': {}", path.display(), e)))
}
