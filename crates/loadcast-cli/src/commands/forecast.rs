use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use loadcast_io::{
    forecast_to_frame, frame_to_features, frame_to_series, read_frame, stem_of, write_frame,
    DataLayout,
};
use loadcast_model::{
    build_anchor, evaluate, recursive_forecast, save_model, train_estimator, BaggedTreeRegressor,
};
use loadcast_ts::train_val_split_time;

#[allow(clippy::too_many_arguments)]
pub fn handle(
    features: Option<&Path>,
    raw: Option<&Path>,
    horizon: usize,
    val_hours: i64,
    trees: usize,
    seed: u64,
    model_name: &str,
    data_dir: &Path,
) -> Result<()> {
    let layout = DataLayout::new(data_dir);
    layout.ensure()?;

    let features_path = match features {
        Some(path) => path.to_path_buf(),
        None => layout.latest_processed("features_")?,
    };
    let raw_path = match raw {
        Some(path) => path.to_path_buf(),
        None => layout.latest_processed("raw_")?,
    };

    let table = frame_to_features(&read_frame(&features_path)?)?;
    info!(
        path = %features_path.display(),
        rows = table.len(),
        features = table.feature_names().len(),
        "loaded feature table"
    );

    let raw_series = frame_to_series(&read_frame(&raw_path)?)?;
    let last_observed = raw_series
        .last()
        .context("raw series is empty")?
        .timestamp;
    info!(%last_observed, "anchoring forecast at the last observed timestamp");

    let (train, val) = train_val_split_time(&table, val_hours);
    info!(train_rows = train.len(), val_rows = val.len(), "time-based split");
    if train.is_empty() {
        bail!("no training rows after the validation split; shrink --val-hours");
    }

    let mut model = BaggedTreeRegressor::new(trees).with_seed(seed);
    train_estimator(&mut model, &train)?;

    match evaluate(&model, &val)? {
        Some(mae) => info!(mae, "validation MAE"),
        None => warn!("validation window is empty; skipping evaluation"),
    }

    let model_path = layout.model_file(model_name);
    save_model(&model, &model_path)?;

    let anchor = build_anchor(last_observed, &table, table.feature_names())?;
    let points = recursive_forecast(&model, &anchor, horizon)?;
    for point in &points {
        info!(step = point.step, datetime = %point.datetime, prediction = point.prediction, "forecast");
    }

    let out = layout.predictions_file(&stem_of(&features_path)?);
    let mut df = forecast_to_frame(&points)?;
    write_frame(&mut df, &out)?;
    info!(path = %out.display(), "saved predictions");
    Ok(())
}
