//! Filesystem artifact store
//!
//! One directory per artifact name under a configured root. Writes are staged
//! in a temporary directory inside the root and renamed into place, so the
//! runtime never observes a half-written artifact.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use common::error::{Error, Result};
use common::models::ModelId;

use crate::package::{ArtifactFile, PackagedArtifact};

/// Checksum record of one stored file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub path: PathBuf,
    pub size: u64,
    pub sha256: String,
}

/// Manifest of a stored artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredArtifact {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<StoredFile>,
}

impl StoredArtifact {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }
}

/// Filesystem-backed storage of runtime-loadable artifacts
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    /// Root directory shared with the runtime's model repository
    root: PathBuf,
}

impl ArtifactStore {
    /// Creates the store, creating the root directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }

        info!("Artifact store rooted at {:?}", root);

        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of an artifact; rejects names that would escape the root
    pub fn artifact_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.starts_with('.')
            || name.contains(['/', '\\', '\0'])
        {
            return Err(Error::Validation(format!("Invalid artifact name: '{}'", name)));
        }

        Ok(self.root.join(name))
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.artifact_path(name) {
            Ok(path) => tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Writes an artifact, replacing any previous contents under the same name
    pub async fn put(&self, name: &str, files: &[ArtifactFile]) -> Result<StoredArtifact> {
        let target = self.artifact_path(name)?;
        for file in files {
            file.validate()?;
        }

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.root)?;

        let mut stored = Vec::with_capacity(files.len());
        for file in files {
            let path = staging.path().join(&file.path);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &file.contents).await?;

            stored.push(StoredFile {
                path: file.path.clone(),
                size: file.contents.len() as u64,
                sha256: hex::encode(Sha256::digest(&file.contents)),
            });
        }

        match tokio::fs::remove_dir_all(&target).await {
            Ok(()) => debug!("Replacing existing artifact {}", name),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let staged = staging.into_path();
        if let Err(e) = tokio::fs::rename(&staged, &target).await {
            let _ = tokio::fs::remove_dir_all(&staged).await;
            return Err(Error::Storage(format!(
                "Failed to move artifact {} into place: {}",
                name, e
            )));
        }

        debug!(artifact = %name, files = stored.len(), "Stored artifact");

        Ok(StoredArtifact {
            name: name.to_string(),
            path: target,
            files: stored,
        })
    }

    /// Stores every artifact of a model version, all or nothing
    ///
    /// On failure the artifacts written so far are removed again before the
    /// error is returned.
    pub async fn put_version(
        &self,
        model_id: ModelId,
        version: u32,
        artifacts: &[PackagedArtifact],
    ) -> Result<Vec<StoredArtifact>> {
        let mut stored = Vec::with_capacity(artifacts.len());

        for artifact in artifacts {
            match self.put(&artifact.name, &artifact.files).await {
                Ok(manifest) => stored.push(manifest),
                Err(e) => {
                    warn!(
                        model_id,
                        version,
                        artifact = %artifact.name,
                        "Failed to store artifact, rolling back: {}",
                        e
                    );
                    for manifest in &stored {
                        if let Err(cleanup) = self.remove(&manifest.name).await {
                            warn!("Rollback of artifact {} failed: {}", manifest.name, cleanup);
                        }
                    }
                    return Err(e);
                }
            }
        }

        info!(model_id, version, artifacts = stored.len(), "Stored model version artifacts");

        Ok(stored)
    }

    /// Recursively deletes an artifact directory; a missing directory is success
    pub async fn remove(&self, name: &str) -> Result<()> {
        let path = self.artifact_path(name)?;

        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                debug!("Removed artifact {}", name);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Storage(format!("Failed to remove artifact {}: {}", name, e))),
        }
    }
}
