use std::path::Path;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{info, warn};

use loadcast_io::{frame_to_series, read_frame, series_to_frame, write_frame, DataLayout, EsiosClient};

pub fn handle(
    indicator: u32,
    days: i64,
    token: Option<String>,
    fallback_csv: Option<&Path>,
    data_dir: &Path,
) -> Result<()> {
    let layout = DataLayout::new(data_dir);
    layout.ensure()?;

    let end = Utc::now();
    let start = end - Duration::days(days);
    let token = token
        .or_else(|| std::env::var("ESIOS_API_KEY").ok())
        .unwrap_or_default();

    let client = EsiosClient::new(token);
    let series = match client.fetch_indicator(indicator, start, end) {
        Ok(series) => series,
        Err(err) => match fallback_csv {
            Some(path) => {
                warn!("API fetch failed ({err:#}); loading local CSV fallback");
                info!(path = %path.display(), "loading local CSV");
                frame_to_series(&read_frame(path)?)?
            }
            None => return Err(err),
        },
    };

    if series.is_empty() {
        warn!(indicator, "no data returned; nothing to write");
        return Ok(());
    }

    let out = layout.raw_file(indicator, start, end);
    let mut df = series_to_frame(&series)?;
    write_frame(&mut df, &out)?;
    info!(rows = series.len(), path = %out.display(), "saved raw indicator data");
    Ok(())
}
