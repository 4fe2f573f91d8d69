pub mod featurize;
pub mod fetch;
pub mod forecast;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use loadcast_core::PipelineConfig;

/// Load a pipeline configuration from a JSON file, or fall back to defaults.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    let cfg = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file '{}'", path.display()))?;
            let cfg: PipelineConfig = serde_json::from_str(&raw)
                .with_context(|| format!("parsing config file '{}'", path.display()))?;
            info!(path = %path.display(), "loaded pipeline config");
            cfg
        }
        None => PipelineConfig::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}
