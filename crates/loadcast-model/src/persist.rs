//! Model blob persistence.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::forest::BaggedTreeRegressor;

/// Serialize a fitted regressor to a JSON blob.
pub fn save_model(model: &BaggedTreeRegressor, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating model directory '{}'", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("creating model file '{}'", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), model)
        .with_context(|| format!("serializing model to '{}'", path.display()))?;
    info!(path = %path.display(), trees = model.n_trees(), "model saved");
    Ok(())
}

/// Load a regressor blob saved by [`save_model`].
pub fn load_model(path: &Path) -> Result<BaggedTreeRegressor> {
    let file =
        File::open(path).with_context(|| format!("opening model file '{}'", path.display()))?;
    let model: BaggedTreeRegressor = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("deserializing model from '{}'", path.display()))?;
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::Estimator;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_roundtrip_preserves_predictions() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| 3.0 * i as f64).collect();
        let mut model = BaggedTreeRegressor::new(8).with_seed(11);
        model.fit(&x, &y).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("models").join("demand.json");
        save_model(&model, &path).unwrap();

        let restored = load_model(&path).unwrap();
        assert_eq!(restored.n_trees(), model.n_trees());
        assert_eq!(restored.predict(&x).unwrap(), model.predict(&x).unwrap());
    }

    #[test]
    fn loading_missing_file_fails_with_context() {
        let dir = tempdir().unwrap();
        let err = load_model(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("absent.json"));
    }
}
