use crate::error::MetricResult;
use crate::functions;
use crate::pool::{EnsemblePair, Pool};
use crate::statistics::{DoubleScoreStatistic, MetricName};

use super::{Metric, main_score};

/// Energy form of the CRPS for one ensemble forecast:
/// `mean|x_i - y| - 0.5 * mean|x_i - x_j|`.
fn crps(pair: &EnsemblePair) -> f64 {
    let members = &pair.members;
    let count = members.len() as f64;
    let spread_to_observation =
        members.iter().map(|m| (m - pair.observed).abs()).sum::<f64>() / count;
    let spread_among_members = members
        .iter()
        .flat_map(|a| members.iter().map(move |b| (a - b).abs()))
        .sum::<f64>()
        / (count * count);
    spread_to_observation - 0.5 * spread_among_members
}

/// Continuous ranked probability score, averaged over the pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContinuousRankedProbabilityScore;

impl Metric<DoubleScoreStatistic> for ContinuousRankedProbabilityScore {
    fn name(&self) -> MetricName {
        MetricName::ContinuousRankedProbabilityScore
    }

    fn apply(&self, pool: &Pool) -> MetricResult<DoubleScoreStatistic> {
        let pairs = pool.ensemble(self.name())?;
        let scores: Vec<f64> = pairs.iter().map(crps).collect();
        Ok(main_score(
            self.name(),
            pool.shared_metadata(),
            functions::mean(&scores),
        ))
    }
}
