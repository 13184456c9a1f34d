//! Upload packages
//!
//! An upload is a directory laid out like a runtime model repository: one
//! sub-directory per constituent model, each holding a `config.pbtxt` and
//! numbered version directories. Exactly one constituent declares
//! `platform: "ensemble"` and acts as the inference entry point.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use common::error::{Error, Result};

/// Name of the per-artifact runtime configuration file
pub const CONFIG_FILE: &str = "config.pbtxt";

/// A file belonging to an artifact, addressed relative to the artifact root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub path: PathBuf,
    pub contents: Vec<u8>,
}

impl ArtifactFile {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }

    /// Rejects absolute paths and any `..` component
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::Validation("Artifact file path is empty".to_string()));
        }

        for component in self.path.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(Error::Validation(format!(
                        "Artifact file path must be relative and stay inside the artifact: {:?}",
                        self.path
                    )))
                }
            }
        }

        Ok(())
    }
}

/// One constituent of an upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedArtifact {
    /// Artifact name: the component directory name before [`UploadPackage::into_named`]
    pub name: String,
    /// Whether this is the ensemble entry point
    pub ensemble: bool,
    /// Highest numbered version directory, 1 if there is none
    pub runtime_version: u32,
    pub files: Vec<ArtifactFile>,
}

/// Set of artifacts making up one model version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPackage {
    artifacts: Vec<PackagedArtifact>,
}

/// Runtime-unique artifact name for a component of a model version
///
/// # Examples
///
/// ```
/// use storage_adapter::package::artifact_name;
///
/// assert_eq!(
///     artifact_name("users/local-user", "resnet", "infer", 3),
///     "local-user#resnet#infer#3"
/// );
/// ```
pub fn artifact_name(namespace: &str, model: &str, component: &str, version: u32) -> String {
    let owner = namespace.rsplit('/').next().unwrap_or(namespace);
    format!("{}#{}#{}#{}", owner, model, component, version)
}

impl UploadPackage {
    /// Builds a package from in-memory artifacts
    pub fn new(artifacts: Vec<PackagedArtifact>) -> Result<Self> {
        let ensembles = artifacts.iter().filter(|a| a.ensemble).count();
        if ensembles != 1 {
            return Err(Error::Validation(format!(
                "Upload must contain exactly one ensemble artifact, found {}",
                ensembles
            )));
        }

        for artifact in &artifacts {
            for file in &artifact.files {
                file.validate()?;
            }
        }

        Ok(Self { artifacts })
    }

    /// Reads a package from a model-repository directory
    pub fn from_dir(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(Error::Validation(format!("Upload path is not a directory: {:?}", root)));
        }

        let mut component_dirs: Vec<PathBuf> = std::fs::read_dir(root)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter(|path| {
                !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map_or(true, |n| n.starts_with('.'))
            })
            .collect();
        component_dirs.sort();

        let mut artifacts = Vec::with_capacity(component_dirs.len());

        for dir in component_dirs {
            let name = dir
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| Error::Validation(format!("Invalid component directory: {:?}", dir)))?
                .to_string();

            let mut files = Vec::new();
            for entry in WalkDir::new(&dir).sort_by_file_name() {
                let entry = entry.map_err(|e| Error::Storage(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let relative = entry
                    .path()
                    .strip_prefix(&dir)
                    .map_err(|e| Error::Internal(e.to_string()))?
                    .to_path_buf();
                files.push(ArtifactFile::new(relative, std::fs::read(entry.path())?));
            }

            let config = files
                .iter()
                .find(|f| f.path == Path::new(CONFIG_FILE))
                .ok_or_else(|| {
                    Error::Validation(format!("Component '{}' has no {}", name, CONFIG_FILE))
                })?;
            let ensemble = is_ensemble_config(&String::from_utf8_lossy(&config.contents));
            let runtime_version = highest_version_dir(&files);

            debug!(component = %name, ensemble, runtime_version, files = files.len(), "Scanned upload component");

            artifacts.push(PackagedArtifact {
                name,
                ensemble,
                runtime_version,
                files,
            });
        }

        Self::new(artifacts)
    }

    pub fn artifacts(&self) -> &[PackagedArtifact] {
        &self.artifacts
    }

    /// The ensemble entry point
    pub fn ensemble(&self) -> &PackagedArtifact {
        // `new` guarantees exactly one
        self.artifacts
            .iter()
            .find(|a| a.ensemble)
            .unwrap_or(&self.artifacts[0])
    }

    /// Renames every artifact to its runtime-unique name for a model version
    ///
    /// The `name:` field of each `config.pbtxt` and the ensemble's
    /// `model_name:` references are rewritten to match.
    pub fn into_named(self, namespace: &str, model: &str, version: u32) -> Vec<PackagedArtifact> {
        let renames: HashMap<String, String> = self
            .artifacts
            .iter()
            .map(|a| (a.name.clone(), artifact_name(namespace, model, &a.name, version)))
            .collect();

        self.artifacts
            .into_iter()
            .map(|mut artifact| {
                let new_name = renames[&artifact.name].clone();
                for file in &mut artifact.files {
                    if file.path == Path::new(CONFIG_FILE) {
                        let rewritten = rewrite_config(
                            &String::from_utf8_lossy(&file.contents),
                            &new_name,
                            &renames,
                        );
                        file.contents = rewritten.into_bytes();
                    }
                }
                artifact.name = new_name;
                artifact
            })
            .collect()
    }
}

/// Returns the unquoted value of a `key: "value"` line
fn field_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let rest = line.trim().strip_prefix(key)?.trim_start();
    let rest = rest.strip_prefix(':')?.trim();
    Some(rest.trim_matches('"'))
}

fn is_ensemble_config(config: &str) -> bool {
    config
        .lines()
        .any(|line| field_value(line, "platform") == Some("ensemble"))
}

fn highest_version_dir(files: &[ArtifactFile]) -> u32 {
    files
        .iter()
        .filter_map(|f| match f.path.components().next() {
            Some(Component::Normal(first)) if f.path.components().count() > 1 => {
                first.to_str().and_then(|s| s.parse::<u32>().ok())
            }
            _ => None,
        })
        .max()
        .unwrap_or(1)
}

fn rewrite_config(config: &str, new_name: &str, renames: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(config.len() + 64);

    for line in config.lines() {
        let indent = &line[..line.len() - line.trim_start().len()];
        let top_level = indent.is_empty();

        if top_level && field_value(line, "name").is_some() {
            out.push_str(&format!("name: \"{}\"", new_name));
        } else if let Some(target) = field_value(line, "model_name").and_then(|v| renames.get(v)) {
            out.push_str(&format!("{}model_name: \"{}\"", indent, target));
        } else {
            out.push_str(line);
        }
        out.push('\n');
    }

    out
}
