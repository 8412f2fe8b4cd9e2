//! Verification statistics and the names that identify them.
//!
//! Every metric produces exactly one [`Statistic`] per pool. Statistics for one
//! pool travel together in a [`Statistics`] blob.
mod blob;
mod names;
mod types;


pub use blob::Statistics;
pub use names::{ComponentName, MetricName, StatisticShape};
pub use types::{
    BoxplotBox, BoxplotStatistic, DiagramComponent, DiagramStatistic, DoubleScoreComponent,
    DoubleScoreStatistic, DurationDiagramStatistic, DurationScoreComponent,
    DurationScoreStatistic, InstantDuration, ScoreBounds, Statistic,
};
