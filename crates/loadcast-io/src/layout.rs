//! On-disk layout of the pipeline's data directories.
//!
//! Everything lives under one root: `raw/` holds fetched indicator files,
//! `processed/` holds the hourly and feature tables, `predictions/` holds
//! forecast output and `models/` holds serialized estimators. Stages are
//! chained by file-name stems, so `featurize` picks up the newest raw file
//! and `forecast` picks up the newest feature file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};

/// Directory layout rooted at a single data directory.
#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.root.join("processed")
    }

    pub fn predictions_dir(&self) -> PathBuf {
        self.root.join("predictions")
    }

    pub fn models_dir(&self) -> PathBuf {
        self.root.join("models")
    }

    /// Create all layout directories.
    pub fn ensure(&self) -> Result<()> {
        for dir in [
            self.raw_dir(),
            self.processed_dir(),
            self.predictions_dir(),
            self.models_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating directory '{}'", dir.display()))?;
        }
        Ok(())
    }

    /// Raw file path for one indicator fetch, keyed by indicator and dates.
    pub fn raw_file(
        &self,
        indicator_id: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> PathBuf {
        self.raw_dir().join(format!(
            "{}_{}_{}.parquet",
            indicator_id,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        ))
    }

    pub fn hourly_file(&self, stem: &str) -> PathBuf {
        self.processed_dir().join(format!("hourly_{stem}.parquet"))
    }

    pub fn features_file(&self, stem: &str) -> PathBuf {
        self.processed_dir().join(format!("features_{stem}.parquet"))
    }

    /// Raw copy placed next to the processed outputs for traceability.
    pub fn raw_copy_file(&self, stem: &str) -> PathBuf {
        self.processed_dir().join(format!("raw_{stem}.parquet"))
    }

    pub fn predictions_file(&self, stem: &str) -> PathBuf {
        self.predictions_dir()
            .join(format!("predictions_{stem}.parquet"))
    }

    pub fn model_file(&self, name: &str) -> PathBuf {
        self.models_dir().join(format!("{name}.json"))
    }

    /// Newest raw parquet file, by lexicographic file name.
    pub fn latest_raw(&self) -> Result<PathBuf> {
        latest_matching(&self.raw_dir(), "")
            .ok_or_else(|| anyhow!("no raw parquet files in '{}'", self.raw_dir().display()))
    }

    /// Newest processed file with the given stem prefix (`features_`, `raw_`).
    pub fn latest_processed(&self, prefix: &str) -> Result<PathBuf> {
        latest_matching(&self.processed_dir(), prefix).ok_or_else(|| {
            anyhow!(
                "no '{}*.parquet' files in '{}'",
                prefix,
                self.processed_dir().display()
            )
        })
    }
}

fn latest_matching(dir: &Path, prefix: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    let mut matches: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().and_then(|e| e.to_str()) == Some("parquet")
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.starts_with(prefix))
        })
        .collect();
    matches.sort();
    matches.pop()
}

/// File stem of a path, for chaining stage outputs by name.
pub fn stem_of(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("path '{}' has no usable file stem", path.display()))
}
