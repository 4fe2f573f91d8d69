use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use loadcast_core::FillPolicy;
use loadcast_io::{
    features_to_frame, frame_to_series, grid_to_frame, read_frame, series_to_frame, stem_of,
    write_frame, DataLayout,
};
use loadcast_ts::{build_features, ensure_hourly_index};

use super::load_config;

pub fn handle(
    input: Option<&Path>,
    config: Option<&Path>,
    fill: Option<&str>,
    data_dir: &Path,
) -> Result<()> {
    let layout = DataLayout::new(data_dir);
    layout.ensure()?;

    let input = match input {
        Some(path) => path.to_path_buf(),
        None => layout.latest_raw()?,
    };
    info!(path = %input.display(), "using raw input");

    let mut cfg = load_config(config)?;
    if let Some(fill) = fill {
        cfg.fill = fill
            .parse::<FillPolicy>()
            .with_context(|| format!("invalid fill policy '{fill}'"))?;
    }

    let series = frame_to_series(&read_frame(&input)?)?;
    info!(
        rows = series.len(),
        first = %series[0].timestamp,
        last = %series[series.len() - 1].timestamp,
        "loaded raw series"
    );

    let stem = stem_of(&input)?;

    // Raw copy next to the processed outputs, so later stages can anchor
    // forecasts without reaching back into the raw store.
    let mut raw_copy = series_to_frame(&series)?;
    write_frame(&mut raw_copy, &layout.raw_copy_file(&stem))?;

    let grid = ensure_hourly_index(&series, cfg.fill)?;
    let mut hourly = grid_to_frame(&grid)?;
    write_frame(&mut hourly, &layout.hourly_file(&stem))?;
    info!(rows = grid.len(), "hourly grid written");

    let table = build_features(&grid, &cfg)?;
    let features_path = layout.features_file(&stem);
    let mut features = features_to_frame(&table)?;
    write_frame(&mut features, &features_path)?;
    info!(
        rows = table.len(),
        features = table.feature_names().len(),
        path = %features_path.display(),
        "feature table written"
    );
    Ok(())
}
