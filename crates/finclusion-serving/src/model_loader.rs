//! Model artifact loading.
//!
//! The artifact is read exactly once, at process start. The outcome is a [`ModelStatus`]:
//! either a ready [`LoadedModel`] shared read-only by every request, or the [`LoadError`]
//! that halts the page for the rest of the session. There is no retry and no fallback.

use crate::error::LoadError;
use crate::model::{Classifier, ModelArtifact};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// A model ready for serving.
pub struct LoadedModel {
    /// Path the artifact was read from
    pub path: PathBuf,

    /// Model name from the artifact, or the file stem when absent
    pub name: String,

    /// Artifact format version
    pub format_version: u32,

    /// Feature names recorded by the exporter (may be empty)
    pub feature_names: Vec<String>,

    /// When the model was loaded
    pub loaded_at: std::time::Instant,

    classifier: Arc<dyn Classifier>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("format_version", &self.format_version)
            .field("feature_names", &self.feature_names)
            .field("loaded_at", &self.loaded_at)
            .field("n_features", &self.classifier.n_features())
            .finish()
    }
}

impl LoadedModel {
    /// Wraps an already constructed classifier, e.g. a substitute model in tests.
    pub fn from_classifier(name: impl Into<String>, classifier: Arc<dyn Classifier>) -> Self {
        Self {
            path: PathBuf::new(),
            name: name.into(),
            format_version: crate::model::ARTIFACT_FORMAT_VERSION,
            feature_names: Vec::new(),
            loaded_at: std::time::Instant::now(),
            classifier,
        }
    }

    /// The shared classifier handle.
    pub fn classifier(&self) -> Arc<dyn Classifier> {
        Arc::clone(&self.classifier)
    }
}

/// Result of the one-time artifact load.
#[derive(Debug, Clone)]
pub enum ModelStatus {
    /// The model is loaded and serving.
    Ready(Arc<LoadedModel>),
    /// Loading failed; the page stays halted.
    Failed {
        /// Artifact path that was attempted.
        path: PathBuf,
        /// Why it failed.
        error: Arc<LoadError>,
    },
}

impl ModelStatus {
    /// Returns the loaded model, if any.
    pub fn model(&self) -> Option<&Arc<LoadedModel>> {
        match self {
            Self::Ready(model) => Some(model),
            Self::Failed { .. } => None,
        }
    }

    /// Returns the load error, if any.
    pub fn error(&self) -> Option<&LoadError> {
        match self {
            Self::Ready(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// Whether a model is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Reads model artifacts from disk.
///
/// # Example
///
/// ```no_run
/// use finclusion_serving::model_loader::ModelLoader;
///
/// let loader = ModelLoader::new(vec!["country".to_string(), "year".to_string()]);
/// let model = loader.load("financial_model.json")?;
/// println!("Loaded {} from {:?}", model.name, model.path);
/// # Ok::<(), finclusion_serving::error::LoadError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    /// Column order the service will feed the model.
    expected_columns: Vec<String>,
}

impl ModelLoader {
    /// Create a loader that checks recorded feature names against `expected_columns`.
    pub fn new(expected_columns: Vec<String>) -> Self {
        Self { expected_columns }
    }

    /// Load the artifact at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NotFound`] for a missing file, [`LoadError::Corrupt`] for a
    /// malformed document, [`LoadError::UnsupportedVersion`] for an artifact written by a
    /// different exporter version and [`LoadError::Invalid`] for inconsistent contents.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<LoadedModel, LoadError> {
        let path = path.as_ref().to_path_buf();
        info!("Loading model from: {:?}", path);

        let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => LoadError::NotFound(path.clone()),
            _ => LoadError::Unreadable {
                path: path.clone(),
                source,
            },
        })?;
        let artifact: ModelArtifact =
            serde_json::from_slice(&bytes).map_err(|e| LoadError::Corrupt {
                path: path.clone(),
                message: e.to_string(),
            })?;
        debug!(
            "Parsed artifact: name={:?}, format_version={}",
            artifact.name, artifact.format_version
        );

        self.check_feature_names(&artifact.feature_names)?;
        let classifier = artifact.build()?;

        let name = if artifact.name.is_empty() {
            path.file_stem()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string()
        } else {
            artifact.name
        };

        info!(
            "Model {:?} loaded successfully ({} features)",
            name,
            classifier.n_features()
        );
        Ok(LoadedModel {
            path,
            name,
            format_version: artifact.format_version,
            feature_names: artifact.feature_names,
            loaded_at: std::time::Instant::now(),
            classifier: Arc::from(classifier),
        })
    }

    /// Load the artifact and capture the outcome as a [`ModelStatus`].
    pub fn load_status(&self, path: impl AsRef<Path>) -> ModelStatus {
        let path = path.as_ref();
        match self.load(path) {
            Ok(model) => ModelStatus::Ready(Arc::new(model)),
            Err(e) => {
                error!("Could not load model from {:?}: {}", path, e);
                ModelStatus::Failed {
                    path: path.to_path_buf(),
                    error: Arc::new(e),
                }
            }
        }
    }

    fn check_feature_names(&self, names: &[String]) -> Result<(), LoadError> {
        if names.is_empty() || self.expected_columns.is_empty() {
            return Ok(());
        }
        if names != self.expected_columns.as_slice() {
            return Err(LoadError::invalid(format!(
                "artifact feature order {:?} does not match form columns {:?}",
                names, self.expected_columns
            )));
        }
        Ok(())
    }
}
