//! Time-series preparation for the loadcast pipeline: hourly grid
//! normalization, feature construction, and the time-ordered train/validation
//! split.

pub mod features;
pub mod grid;
pub mod split;

pub use features::{build_features, lag_offsets_from_names, FeatureTable, LAG_PREFIX};
pub use grid::ensure_hourly_index;
pub use split::train_val_split_time;
