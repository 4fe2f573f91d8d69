//! Shared types for the loadcast forecasting pipeline.
//!
//! This crate holds the pieces every other loadcast crate needs: the unified
//! error type [`LoadcastError`], the raw/hourly series types, and the pipeline
//! configuration validated once at construction.

pub mod config;
pub mod error;
pub mod series;

pub use config::{FillPolicy, PipelineConfig};
pub use error::{LoadcastError, LoadcastResult};
pub use series::{
    ceil_to_hour, floor_to_hour, is_hour_boundary, HourlyGrid, HourlyPoint, Observation,
};
