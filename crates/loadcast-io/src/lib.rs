//! File and network I/O for the loadcast pipeline: CSV/Parquet frames, typed
//! table conversions, the ESIOS indicator client, and the on-disk data
//! layout. Everything here is a replaceable collaborator of the core; the
//! pipeline itself only consumes pre-fetched, typed data.

pub mod esios;
pub mod frames;
pub mod layout;
pub mod tables;

pub use esios::EsiosClient;
pub use frames::{read_frame, write_frame};
pub use layout::{stem_of, DataLayout};
pub use tables::{
    features_to_frame, forecast_to_frame, frame_to_features, frame_to_grid, frame_to_series,
    grid_to_frame, series_to_frame,
};
