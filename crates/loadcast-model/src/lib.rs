//! Estimator capability, the bagged-tree regressor, evaluation metrics, model
//! persistence, and the recursive forecast state machine.

pub mod estimator;
pub mod forecast;
pub mod forest;
pub mod metrics;
pub mod persist;

pub use estimator::{train_estimator, Estimator};
pub use forecast::{build_anchor, recursive_forecast, AnchorRow, ForecastPoint};
pub use forest::BaggedTreeRegressor;
pub use metrics::{evaluate, mean_absolute_error};
pub use persist::{load_model, save_model};
