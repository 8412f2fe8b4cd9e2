//! Summary statistics across many pools.
//!
//! Statistics of each pool are folded into per-component sample stores by
//! [`SummaryStatisticsCalculator::accept`]; [`SummaryStatisticsCalculator::get`]
//! reduces them once per requested [`SummaryStatistic`].
mod calculator;
mod function;
mod store;
mod types;


pub use calculator::SummaryStatisticsCalculator;
pub use types::{
    DurationUnit, MetadataAggregator, StatisticsFilter, SummaryDimension, SummaryOptions,
    SummaryPolicy, SummaryStatistic, SummaryStatisticName, union_features,
};
