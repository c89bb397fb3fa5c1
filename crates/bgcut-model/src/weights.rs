//! Checkpoint resolution: local file or Hugging Face Hub download.

use std::path::{Path, PathBuf};

use hf_hub::api::sync::Api;
use hf_hub::{Repo, RepoType};

use crate::error::{ModelError, Result};
use crate::u2net::U2NetVariant;

/// Default Hub repo hosting the converted safetensors checkpoints.
///
/// The published u2net/u2netp checkpoints are torch pickles; this repo
/// carries a tensor-name-preserving safetensors conversion. Override with
/// a local path or another repo when deploying air-gapped.
const DEFAULT_REPO: &str = "bgcut/u2net-safetensors";

/// Returns the path of the weight file for `variant`.
///
/// An explicit `path` wins and must exist. Otherwise the file is fetched
/// from `repo` (or [`DEFAULT_REPO`]) via the Hub cache, so repeated starts
/// do not re-download.
pub fn resolve(
    variant: U2NetVariant,
    path: Option<&Path>,
    repo: Option<&str>,
) -> Result<PathBuf> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(ModelError::weight_load(format!(
                "weight file not found: {}",
                path.display()
            )));
        }
        return Ok(path.to_path_buf());
    }

    let repo_id = repo.unwrap_or(DEFAULT_REPO);
    tracing::info!(repo = repo_id, file = variant.weight_file(), "fetching weights from the Hub");

    let api = Api::new().map_err(|e| ModelError::weight_load(e.to_string()))?;
    let repo = api.repo(Repo::new(repo_id.to_string(), RepoType::Model));
    repo.get(variant.weight_file())
        .map_err(|e| ModelError::weight_load(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_explicit_path_is_an_error() {
        let err = resolve(
            U2NetVariant::Full,
            Some(Path::new("/nonexistent/u2net.safetensors")),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::WeightLoad { .. }));
    }

    #[test]
    fn explicit_file_is_used_verbatim() {
        let dir = std::env::temp_dir().join("bgcut-weights-test");
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("u2net.safetensors");
        std::fs::write(&file, b"stub").unwrap();

        let resolved = resolve(U2NetVariant::Full, Some(&file), None).unwrap();
        assert_eq!(resolved, file);
    }
}
