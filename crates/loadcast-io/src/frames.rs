//! Extension-keyed DataFrame readers and writers.

use std::fs::File;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use polars::prelude::*;

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

/// Read a DataFrame from a `.csv` or `.parquet` file, keyed on extension.
pub fn read_frame(path: &Path) -> Result<DataFrame> {
    let mut file = File::open(path).with_context(|| format!("opening '{}'", path.display()))?;
    match extension_of(path).as_str() {
        "parquet" => {
            let reader = ParquetReader::new(&mut file);
            reader.finish().context("reading Parquet file")
        }
        "csv" => {
            let reader = CsvReader::new(&mut file);
            reader
                .has_header(true)
                .finish()
                .context("reading CSV file")
        }
        other => Err(anyhow!(
            "unsupported file extension '{}'; use .csv or .parquet",
            other
        )),
    }
}

/// Write a DataFrame to a `.csv` or `.parquet` file, keyed on extension.
///
/// Parent directories are created as needed; Parquet output uses Snappy
/// compression.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory '{}'", parent.display()))?;
        }
    }
    let mut file =
        File::create(path).with_context(|| format!("creating '{}'", path.display()))?;
    match extension_of(path).as_str() {
        "parquet" => {
            ParquetWriter::new(&mut file)
                .with_compression(ParquetCompression::Snappy)
                .finish(df)
                .context("writing Parquet file")?;
        }
        "csv" => {
            CsvWriter::new(&mut file)
                .finish(df)
                .context("writing CSV file")?;
        }
        other => {
            return Err(anyhow!(
                "unsupported file extension '{}'; use .csv or .parquet",
                other
            ))
        }
    }
    Ok(())
}
