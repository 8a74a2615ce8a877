//! Iteration batches, statistics and stat weights
//!
//! Everything in here sits above single iterations: it runs many of them
//! (in parallel), folds their results into mergeable aggregates and derives
//! stat weights from perturbed batches.

pub mod batch;
pub mod output;
pub mod progress;
pub mod summary;
pub mod weights;

pub use batch::{run_batch, BatchAccumulator};
pub use output::{BatchOutput, DpsSummary};
pub use progress::{stat_weights_with_progress, ProgressSnapshot};
pub use summary::{Histogram, RunningStats};
pub use weights::{compute_stat_weights, equivalence_point, StatWeightsRequest, StatWeightsResult};
