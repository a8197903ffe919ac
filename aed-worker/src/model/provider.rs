//! Model Provider
//!
//! Locates the newest classifier artifact in a directory and normalizes the
//! wrapper and bare document shapes into a [`LoadedModel`].

use super::artifact::{ArtifactDocument, ClassifierSpec};
use super::{Classifier, Scaler};
use crate::error::{Result, WorkerError};
use crate::features::FEATURE_COUNT;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

/// Sibling scaler consulted for bare artifacts
pub const SCALER_FILE_NAME: &str = "scaler.json";

const ARTIFACT_EXTENSION: &str = "json";

/// Classifier and scaler ready for scoring
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub classifier: Arc<dyn Classifier>,
    pub scaler: Option<Scaler>,
    pub display_name: String,
    pub path: PathBuf,
}

/// Source of the model used for the lifetime of the worker
pub trait ModelProvider: Send + Sync {
    fn load(&self) -> Result<LoadedModel>;
}

/// Loads the most recently modified artifact from a directory
#[derive(Debug, Clone)]
pub struct DirectoryModelProvider {
    dir: PathBuf,
}

impl DirectoryModelProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Newest `.json` file whose name does not mention "scaler"
    ///
    /// Equal modification times resolve to the lexicographically greatest path.
    pub fn find_latest_model(&self) -> Result<PathBuf> {
        let not_found = || WorkerError::ArtifactNotFound {
            dir: self.dir.clone(),
        };

        let entries = fs::read_dir(&self.dir).map_err(|e| {
            warn!("Cannot read model directory {}: {}", self.dir.display(), e);
            not_found()
        })?;

        let mut candidates: Vec<(SystemTime, PathBuf)> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !is_candidate(&path) {
                continue;
            }
            match entry.metadata().and_then(|m| m.modified()) {
                Ok(modified) => candidates.push((modified, path)),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        candidates
            .into_iter()
            .max()
            .map(|(_, path)| path)
            .ok_or_else(not_found)
    }

    fn load_sibling_scaler(&self) -> Option<Scaler> {
        let path = self.dir.join(SCALER_FILE_NAME);
        if !path.is_file() {
            debug!("No scaler at {}; scoring unscaled features", path.display());
            return None;
        }

        match read_scaler(&path) {
            Ok(scaler) => {
                info!("Loaded scaler: {}", path.display());
                Some(scaler)
            }
            Err(e) => {
                error!("Could not load scaler {}: {}", path.display(), e);
                None
            }
        }
    }
}

impl ModelProvider for DirectoryModelProvider {
    fn load(&self) -> Result<LoadedModel> {
        let path = self.find_latest_model()?;
        info!("Loading model artifact: {}", path.display());

        let load_error = |reason: String| WorkerError::ArtifactLoad {
            path: path.clone(),
            reason,
        };

        let text = fs::read_to_string(&path).map_err(|e| load_error(e.to_string()))?;
        let document = ArtifactDocument::parse(&text).map_err(|e| load_error(e.to_string()))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let (spec, scaler, display_name) = match document {
            ArtifactDocument::Wrapped(wrapped) => {
                if let Some(scaler) = &wrapped.scaler {
                    scaler
                        .validate()
                        .map_err(|e| load_error(format!("invalid scaler: {}", e)))?;
                }
                let name = wrapped.model_name.unwrap_or_else(|| file_name.clone());
                (wrapped.model, wrapped.scaler, name)
            }
            ArtifactDocument::Bare(spec) => (spec, self.load_sibling_scaler(), file_name),
        };

        let classifier = build_classifier(spec).map_err(load_error)?;
        check_widths(classifier.as_ref(), scaler.as_ref());

        info!(
            kind = classifier.kind(),
            n_features = classifier.n_features(),
            scaled = scaler.is_some(),
            "Model ready: {}",
            display_name
        );

        Ok(LoadedModel {
            classifier,
            scaler,
            display_name,
            path,
        })
    }
}

fn is_candidate(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let has_extension = path
        .extension()
        .map_or(false, |ext| ext == ARTIFACT_EXTENSION);
    let is_scaler = path
        .file_name()
        .map_or(false, |name| name.to_string_lossy().to_lowercase().contains("scaler"));
    has_extension && !is_scaler
}

fn build_classifier(spec: ClassifierSpec) -> std::result::Result<Arc<dyn Classifier>, String> {
    spec.build().map_err(|e| format!("invalid classifier: {}", e))
}

fn read_scaler(path: &Path) -> std::result::Result<Scaler, String> {
    let text = fs::read_to_string(path).map_err(|e| e.to_string())?;
    let scaler: Scaler = serde_json::from_str(&text).map_err(|e| e.to_string())?;
    scaler.validate()?;
    Ok(scaler)
}

/// Width disagreements surface per request; flag them once at startup
fn check_widths(classifier: &dyn Classifier, scaler: Option<&Scaler>) {
    if classifier.n_features() != FEATURE_COUNT {
        warn!(
            "Classifier expects {} features but the extractor produces {}",
            classifier.n_features(),
            FEATURE_COUNT
        );
    }
    if let Some(scaler) = scaler {
        if scaler.n_features() != FEATURE_COUNT {
            warn!(
                "Scaler expects {} features but the extractor produces {}",
                scaler.n_features(),
                FEATURE_COUNT
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;

    fn stump_json(feature: usize) -> String {
        format!(
            r#"{{"kind": "decision_stump", "n_features": 114, "feature": {}, "threshold": 0.5, "below": 0, "at_or_above": 1}}"#,
            feature
        )
    }

    fn write_with_mtime(dir: &Path, name: &str, contents: &str, secs: u64) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        let file = File::options().write(true).open(&path).unwrap();
        file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
        path
    }

    #[test]
    fn test_newest_artifact_wins() {
        let temp = TempDir::new().unwrap();
        write_with_mtime(temp.path(), "old.json", &stump_json(0), 1_000);
        let newest = write_with_mtime(temp.path(), "new.json", &stump_json(1), 2_000);

        let provider = DirectoryModelProvider::new(temp.path());
        assert_eq!(provider.find_latest_model().unwrap(), newest);
    }

    #[test]
    fn test_mtime_tie_prefers_greater_path() {
        let temp = TempDir::new().unwrap();
        write_with_mtime(temp.path(), "a.json", &stump_json(0), 5_000);
        let b = write_with_mtime(temp.path(), "b.json", &stump_json(0), 5_000);

        let provider = DirectoryModelProvider::new(temp.path());
        assert_eq!(provider.find_latest_model().unwrap(), b);
    }

    #[test]
    fn test_scaler_files_and_other_extensions_ignored() {
        let temp = TempDir::new().unwrap();
        let model = write_with_mtime(temp.path(), "model.json", &stump_json(0), 1_000);
        write_with_mtime(temp.path(), "Feature_Scaler.json", "{}", 9_000);
        write_with_mtime(temp.path(), "notes.txt", "hello", 9_000);
        fs::create_dir(temp.path().join("zzz.json")).unwrap();

        let provider = DirectoryModelProvider::new(temp.path());
        assert_eq!(provider.find_latest_model().unwrap(), model);
    }

    #[test]
    fn test_empty_directory_is_not_found() {
        let temp = TempDir::new().unwrap();
        let provider = DirectoryModelProvider::new(temp.path());
        let err = provider.load().unwrap_err();
        assert!(matches!(err, WorkerError::ArtifactNotFound { .. }));
        assert!(err.to_string().starts_with("No .json model artifact found in"));
    }

    #[test]
    fn test_missing_directory_is_not_found() {
        let provider = DirectoryModelProvider::new("/nonexistent/model/dir");
        assert!(matches!(
            provider.load(),
            Err(WorkerError::ArtifactNotFound { .. })
        ));
    }

    #[test]
    fn test_bare_artifact_uses_sibling_scaler() {
        let temp = TempDir::new().unwrap();
        write_with_mtime(temp.path(), "stump.json", &stump_json(0), 1_000);
        let scaler = format!(
            r#"{{"kind": "standard", "mean": {:?}, "scale": {:?}}}"#,
            vec![0.0; FEATURE_COUNT],
            vec![1.0; FEATURE_COUNT]
        );
        fs::write(temp.path().join(SCALER_FILE_NAME), scaler).unwrap();

        let loaded = DirectoryModelProvider::new(temp.path()).load().unwrap();
        assert_eq!(loaded.display_name, "stump.json");
        assert_eq!(loaded.classifier.kind(), "decision_stump");
        assert_eq!(loaded.scaler.map(|s| s.n_features()), Some(FEATURE_COUNT));
    }

    #[test]
    fn test_bare_artifact_without_scaler() {
        let temp = TempDir::new().unwrap();
        write_with_mtime(temp.path(), "stump.json", &stump_json(0), 1_000);

        let loaded = DirectoryModelProvider::new(temp.path()).load().unwrap();
        assert!(loaded.scaler.is_none());
    }

    #[test]
    fn test_broken_sibling_scaler_is_ignored() {
        let temp = TempDir::new().unwrap();
        write_with_mtime(temp.path(), "stump.json", &stump_json(0), 1_000);
        fs::write(temp.path().join(SCALER_FILE_NAME), "{ broken").unwrap();

        let loaded = DirectoryModelProvider::new(temp.path()).load().unwrap();
        assert!(loaded.scaler.is_none());
    }

    #[test]
    fn test_wrapped_artifact() {
        let temp = TempDir::new().unwrap();
        let wrapped = format!(
            r#"{{"model": {}, "model_name": "glass-break-v2"}}"#,
            stump_json(3)
        );
        write_with_mtime(temp.path(), "bundle.json", &wrapped, 1_000);
        // Wrapper artifacts never consult the sibling scaler
        fs::write(
            temp.path().join(SCALER_FILE_NAME),
            r#"{"kind": "standard", "mean": [0.0], "scale": [1.0]}"#,
        )
        .unwrap();

        let loaded = DirectoryModelProvider::new(temp.path()).load().unwrap();
        assert_eq!(loaded.display_name, "glass-break-v2");
        assert!(loaded.scaler.is_none());
    }

    #[test]
    fn test_wrapper_name_defaults_to_file_name() {
        let temp = TempDir::new().unwrap();
        let wrapped = format!(r#"{{"model": {}}}"#, stump_json(0));
        write_with_mtime(temp.path(), "bundle.json", &wrapped, 1_000);

        let loaded = DirectoryModelProvider::new(temp.path()).load().unwrap();
        assert_eq!(loaded.display_name, "bundle.json");
    }

    #[test]
    fn test_corrupt_artifact_is_load_error() {
        let temp = TempDir::new().unwrap();
        write_with_mtime(temp.path(), "model.json", "{\"kind\": ", 1_000);

        let err = DirectoryModelProvider::new(temp.path()).load().unwrap_err();
        assert!(matches!(err, WorkerError::ArtifactLoad { .. }));
    }

    #[test]
    fn test_invalid_classifier_is_load_error() {
        let temp = TempDir::new().unwrap();
        let bad = r#"{"kind": "decision_stump", "n_features": 2, "feature": 5, "threshold": 0.5, "below": 0, "at_or_above": 1}"#;
        write_with_mtime(temp.path(), "model.json", bad, 1_000);

        let err = DirectoryModelProvider::new(temp.path()).load().unwrap_err();
        assert!(err.to_string().contains("invalid classifier"));
    }
}
