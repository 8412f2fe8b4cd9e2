use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use super::{
    BiasFraction, BoxPlotOfErrors, BrierScore, BrierSkillScore, CoefficientOfDetermination,
    Collectable, ContingencyTable, ContinuousRankedProbabilityScore, EquitableThreatScore,
    FrequencyBias, MeanAbsoluteError, MeanError, MeanSquareError, MeanSquareErrorSkillScore,
    Metric, MetricFactory, PearsonCorrelationCoefficient, PeirceSkillScore,
    ProbabilityOfDetection, ProbabilityOfFalseDetection, QuantileQuantileDiagram,
    ReliabilityDiagram, RootMeanSquareError, SampleSize, SumOfSquareError, ThreatScore,
    TimeToPeakError, TimeToPeakErrorStatistic,
};
use crate::error::{MetricError, ParameterError, PoolError};
use crate::functions::{DOUBLE_TOLERANCE, double_equals};
use crate::pool::{
    DichotomousPair, EnsemblePair, PairKind, Pairs, Pool, PoolMetadata, ProbabilityPair,
    SingleValuedPair, TimeSeriesPairs, TimedPair,
};
use crate::statistics::{ComponentName, DoubleScoreStatistic, MetricName};

const OBSERVED_PREDICTED: [(f64, f64); 10] = [
    (22.9, 22.8),
    (75.2, 80.0),
    (63.2, 65.0),
    (29.0, 30.0),
    (5.0, 2.0),
    (2.1, 3.1),
    (35000.0, 37000.0),
    (8.0, 7.0),
    (12.0, 12.0),
    (93.0, 94.0),
];

const BASELINE: [(f64, f64); 10] = [
    (20.9, 23.8),
    (71.2, 83.2),
    (69.2, 66.0),
    (20.0, 30.5),
    (5.8, 2.1),
    (1.1, 3.4),
    (33020.0, 37500.0),
    (8.8, 7.1),
    (12.1, 13.0),
    (93.2, 94.8),
];

fn metadata() -> PoolMetadata {
    PoolMetadata::for_feature("DRRC2", "CMS")
}

fn single_valued(values: &[(f64, f64)]) -> Result<Pool, MetricError> {
    let pairs = values
        .iter()
        .map(|&(observed, predicted)| SingleValuedPair::new(observed, predicted))
        .collect();
    Ok(Pool::new(Pairs::SingleValued(pairs), metadata())?)
}

fn with_baseline() -> Result<Pool, MetricError> {
    Ok(single_valued(&OBSERVED_PREDICTED)?.with_baseline(single_valued(&BASELINE)?)?)
}

/// Dichotomous pool with 82 hits, 38 false alarms, 23 misses and 222
/// correct negatives.
fn contingency_pool() -> Result<Pool, MetricError> {
    let cells = [
        (true, true, 82),
        (false, true, 38),
        (true, false, 23),
        (false, false, 222),
    ];
    let pairs = cells
        .iter()
        .flat_map(|&(observed, predicted, count)| {
            std::iter::repeat_n(DichotomousPair::new(observed, predicted), count)
        })
        .collect();
    Ok(Pool::new(Pairs::Dichotomous(pairs), metadata())?)
}

fn main_of(statistic: &DoubleScoreStatistic) -> Result<f64, MetricError> {
    statistic
        .main()
        .ok_or_else(|| MetricError::from(format!("{} has no main component", statistic.metric)))
}

fn check(metric: MetricName, actual: f64, expected: f64) -> Result<(), MetricError> {
    if double_equals(actual, expected, DOUBLE_TOLERANCE) {
        Ok(())
    } else {
        Err(MetricError::from(format!(
            "{metric}: expected {expected}, got {actual}"
        )))
    }
}

fn at(hours: i64) -> Result<DateTime<Utc>, MetricError> {
    let origin = Utc
        .with_ymd_and_hms(1985, 1, 1, 0, 0, 0)
        .single()
        .ok_or(MetricError::from("Invalid origin"))?;
    Ok(origin + TimeDelta::hours(hours))
}

#[test]
fn single_valued_scores_match_reference_values() -> Result<(), MetricError> {
    let pool = single_valued(&OBSERVED_PREDICTED)?;
    let cases: [(Box<dyn Metric<DoubleScoreStatistic>>, f64); 8] = [
        (Box::new(MeanError), 200.55),
        (Box::new(MeanAbsoluteError), 201.37),
        (Box::new(MeanSquareError), 400_003.929),
        (Box::new(RootMeanSquareError), 632.458_638_173_280_1),
        (Box::new(PearsonCorrelationCoefficient), 0.999_999_991_014_897_9),
        (Box::new(CoefficientOfDetermination), 0.999_999_982_029_795_9),
        (Box::new(BiasFraction), 0.056_796_297_974_534_414),
        (Box::new(SampleSize), 10.0),
    ];
    for (metric, expected) in cases {
        let statistic = metric.apply(&pool)?;
        check(metric.name(), main_of(&statistic)?, expected)?;
    }
    Ok(())
}

#[test]
fn skill_score_against_baseline() -> Result<(), MetricError> {
    let statistic = MeanSquareErrorSkillScore.apply(&with_baseline()?)?;
    check(
        MetricName::MeanSquareErrorSkillScore,
        main_of(&statistic)?,
        0.800_702_533_509_379_9,
    )
}

#[test]
fn skill_scores_without_baseline_fail_with_pool_error() -> Result<(), MetricError> {
    let pool = single_valued(&OBSERVED_PREDICTED)?;
    match MeanSquareErrorSkillScore.apply(&pool) {
        Err(err)
            if matches!(
                err.pool_error(),
                Some(PoolError::MissingBaseline {
                    metric: MetricName::MeanSquareErrorSkillScore
                })
            ) => {}
        other => return Err(MetricError::from(format!("Unexpected result: {other:?}"))),
    }

    let probabilities = Pool::new(
        Pairs::DiscreteProbability(vec![ProbabilityPair::new(true, 0.7)]),
        metadata(),
    )?;
    match BrierSkillScore.apply(&probabilities) {
        Err(err) if matches!(err.pool_error(), Some(PoolError::MissingBaseline { .. })) => Ok(()),
        other => Err(MetricError::from(format!("Unexpected result: {other:?}"))),
    }
}

#[test]
fn collectable_aggregate_matches_apply() -> Result<(), MetricError> {
    let pool = with_baseline()?;
    let sse = SumOfSquareError.intermediate_statistic(&pool)?;
    let metrics: [&dyn Collectable<DoubleScoreStatistic, DoubleScoreStatistic>; 3] = [
        &MeanSquareError,
        &RootMeanSquareError,
        &MeanSquareErrorSkillScore,
    ];
    for metric in metrics {
        if metric.collection_of() != MetricName::SumOfSquareError {
            return Err(MetricError::from(format!("{} is not in the SSE group", metric.name())));
        }
        let aggregated = metric.aggregate(&sse, &pool)?;
        let applied = metric.apply(&pool)?;
        check(metric.name(), main_of(&aggregated)?, main_of(&applied)?)?;
    }
    Ok(())
}

#[test]
fn aggregate_rejects_a_foreign_intermediate() -> Result<(), MetricError> {
    let pool = single_valued(&OBSERVED_PREDICTED)?;
    let wrong = MeanError.apply(&pool)?;
    match RootMeanSquareError.aggregate(&wrong, &pool) {
        Err(MetricError::Calculation(_)) => Ok(()),
        other => Err(MetricError::from(format!("Unexpected result: {other:?}"))),
    }
}

#[test]
fn dichotomous_scores_match_reference_values() -> Result<(), MetricError> {
    let pool = contingency_pool()?;
    let table = ContingencyTable.apply(&pool)?;
    for (component, expected) in [
        (ComponentName::TruePositives, 82.0),
        (ComponentName::FalsePositives, 38.0),
        (ComponentName::FalseNegatives, 23.0),
        (ComponentName::TrueNegatives, 222.0),
    ] {
        let actual = table
            .value(component)
            .ok_or(MetricError::from("Missing table cell"))?;
        check(MetricName::ContingencyTable, actual, expected)?;
    }

    let cases: [(&dyn Collectable<DoubleScoreStatistic, DoubleScoreStatistic>, f64); 6] = [
        (&ThreatScore, 0.573_426_573_426_573_4),
        (&ProbabilityOfDetection, 0.780_952_380_952_381),
        (&ProbabilityOfFalseDetection, 0.146_153_846_153_846_16),
        (&PeirceSkillScore, 0.634_798_534_798_534_8),
        (&EquitableThreatScore, 0.437_681_525_445_131_95),
        (&FrequencyBias, 120.0 / 105.0),
    ];
    for (metric, expected) in cases {
        let statistic = metric.aggregate(&table, &pool)?;
        check(metric.name(), main_of(&statistic)?, expected)?;
    }
    Ok(())
}

#[test]
fn incremental_combination_matches_a_single_pass() -> Result<(), MetricError> {
    let first = [(1.0, 2.0), (3.0, 5.0), (2.0, 2.0)];
    let second = [(4.0, 1.0), (0.0, 0.5)];
    let all: Vec<(f64, f64)> = first.iter().chain(&second).copied().collect();

    for metric in [MetricName::SumOfSquareError, MetricName::MeanSquareError] {
        let incremental = MetricFactory::incremental(metric)?;
        let mut running = incremental.initial();
        for part in [&first[..], &second[..]] {
            running = incremental.combine(&single_valued(part)?, &running)?;
        }
        let combined = incremental.complete(&running)?;
        let single = incremental.apply(&single_valued(&all)?)?;
        check(metric, main_of(&combined)?, main_of(&single)?)?;
    }

    let table = MetricFactory::incremental(MetricName::ContingencyTable)?;
    let pool = contingency_pool()?;
    let twice = table.combine(&pool, &table.combine(&pool, &table.initial())?)?;
    let hits = table
        .complete(&twice)?
        .value(ComponentName::TruePositives)
        .ok_or(MetricError::from("Missing hits"))?;
    check(MetricName::ContingencyTable, hits, 164.0)
}

#[test]
fn factory_rejects_names_it_cannot_serve() -> Result<(), MetricError> {
    match MetricFactory::resolve(MetricName::Histogram) {
        Err(ParameterError::SummaryOnly {
            metric: MetricName::Histogram,
        }) => {}
        Err(other) => return Err(MetricError::from(format!("Unexpected error: {other}"))),
        Ok(_) => return Err(MetricError::from("HISTOGRAM must not resolve")),
    }
    match MetricFactory::diagram(MetricName::MeanError) {
        Err(ParameterError::WrongShape {
            metric: MetricName::MeanError,
            ..
        }) => {}
        Err(other) => return Err(MetricError::from(format!("Unexpected error: {other}"))),
        Ok(_) => return Err(MetricError::from("MEAN_ERROR is not a diagram")),
    }
    match MetricFactory::incremental(MetricName::PearsonCorrelationCoefficient) {
        Err(ParameterError::NotIncremental { .. }) => Ok(()),
        Err(other) => Err(MetricError::from(format!("Unexpected error: {other}"))),
        Ok(_) => Err(MetricError::from("Pearson is not incremental")),
    }
}

#[test]
fn metrics_name_the_metric_on_wrong_pair_kind() -> Result<(), MetricError> {
    let pool = contingency_pool()?;
    match MeanError.apply(&pool) {
        Err(err)
            if matches!(
                err.pool_error(),
                Some(PoolError::WrongPairKind {
                    metric: MetricName::MeanError,
                    expected: PairKind::SingleValued,
                    actual: PairKind::Dichotomous,
                })
            ) =>
        {
            Ok(())
        }
        other => Err(MetricError::from(format!("Unexpected result: {other:?}"))),
    }
}

#[test]
fn crps_averages_over_ensemble_forecasts() -> Result<(), MetricError> {
    let pool = Pool::new(
        Pairs::Ensemble(vec![
            EnsemblePair {
                observed: 1.0,
                members: vec![0.0, 2.0],
            },
            EnsemblePair {
                observed: 3.0,
                members: vec![3.0],
            },
        ]),
        metadata(),
    )?;
    let statistic = ContinuousRankedProbabilityScore.apply(&pool)?;
    check(
        MetricName::ContinuousRankedProbabilityScore,
        main_of(&statistic)?,
        0.25,
    )
}

#[test]
fn brier_score_and_skill() -> Result<(), MetricError> {
    let main = Pool::new(
        Pairs::DiscreteProbability(vec![
            ProbabilityPair::new(true, 0.8),
            ProbabilityPair::new(false, 0.2),
            ProbabilityPair::new(true, 0.5),
        ]),
        metadata(),
    )?;
    let baseline = Pool::new(
        Pairs::DiscreteProbability(vec![ProbabilityPair::new(true, 0.5); 3]),
        metadata(),
    )?;
    check(
        MetricName::BrierScore,
        main_of(&BrierScore.apply(&main)?)?,
        0.11,
    )?;
    let pool = main.with_baseline(baseline)?;
    check(
        MetricName::BrierSkillScore,
        main_of(&BrierSkillScore.apply(&pool)?)?,
        0.56,
    )
}

#[test]
fn reliability_diagram_bins_by_forecast_probability() -> Result<(), MetricError> {
    let pool = Pool::new(
        Pairs::DiscreteProbability(vec![
            ProbabilityPair::new(false, 0.05),
            ProbabilityPair::new(true, 0.15),
            ProbabilityPair::new(true, 0.95),
            ProbabilityPair::new(false, 1.0),
        ]),
        metadata(),
    )?;
    let diagram = ReliabilityDiagram::default().apply(&pool)?;
    let values = |name: ComponentName| -> Result<Vec<f64>, MetricError> {
        diagram
            .component(name)
            .map(|c| c.values.clone())
            .ok_or(MetricError::from("Missing reliability component"))
    };
    let counts = values(ComponentName::SampleSize)?;
    let observed = values(ComponentName::ObservedRelativeFrequency)?;
    let forecast = values(ComponentName::ForecastProbability)?;
    if counts != vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0] {
        return Err(MetricError::from(format!("Counts {counts:?}")));
    }
    if !observed.get(2).is_some_and(|v| v.is_nan()) {
        return Err(MetricError::from("Empty bins must be missing"));
    }
    check(
        MetricName::ReliabilityDiagram,
        observed.get(9).copied().unwrap_or(f64::NAN),
        0.5,
    )?;
    check(
        MetricName::ReliabilityDiagram,
        forecast.get(9).copied().unwrap_or(f64::NAN),
        0.975,
    )
}

#[test]
fn quantile_quantile_diagram_has_one_row_per_pair() -> Result<(), MetricError> {
    let pool = single_valued(&OBSERVED_PREDICTED)?;
    let diagram = QuantileQuantileDiagram::default().apply(&pool)?;
    for name in [
        ComponentName::ObservedQuantiles,
        ComponentName::PredictedQuantiles,
    ] {
        let component = diagram
            .component(name)
            .ok_or(MetricError::from("Missing quantiles"))?;
        if component.values.len() != OBSERVED_PREDICTED.len() {
            return Err(MetricError::from(format!(
                "{name}: {} rows",
                component.values.len()
            )));
        }
        if !crate::functions::is_sorted(&component.values) {
            return Err(MetricError::from(format!("{name} is not sorted")));
        }
    }
    Ok(())
}

#[test]
fn box_plot_of_errors_holds_one_box_per_pool() -> Result<(), MetricError> {
    let pool = single_valued(&[(0.0, 5.0), (0.0, 1.0), (0.0, 3.0), (0.0, 2.0), (0.0, 4.0)])?;
    let boxplot = BoxPlotOfErrors::default().apply(&pool)?;
    let [only] = boxplot.boxes.as_slice() else {
        return Err(MetricError::from("Expected a single box"));
    };
    if only.linked_value.is_some() || only.quantiles != vec![1.0, 1.5, 3.0, 4.5, 5.0] {
        return Err(MetricError::from(format!("Unexpected box {only:?}")));
    }
    Ok(())
}

#[test]
fn time_to_peak_errors_and_their_summary() -> Result<(), MetricError> {
    let event = |hours: i64, observed: f64, predicted: f64| -> Result<TimedPair, MetricError> {
        Ok(TimedPair {
            valid_time: at(hours)?,
            observed,
            predicted,
        })
    };
    let late = TimeSeriesPairs {
        reference_time: at(0)?,
        events: vec![event(1, 5.0, 1.0)?, event(2, 3.0, 8.0)?],
    };
    let early = TimeSeriesPairs {
        reference_time: at(-24)?,
        events: vec![
            event(-23, 1.0, 9.0)?,
            event(-22, 2.0, 2.0)?,
            event(-21, 7.0, 2.0)?,
        ],
    };
    let pool = Pool::new(Pairs::TimeSeries(vec![late, early]), metadata())?;

    let diagram = TimeToPeakError.apply(&pool)?;
    let errors: Vec<(DateTime<Utc>, TimeDelta)> = diagram
        .pairs
        .iter()
        .map(|pair| (pair.instant, pair.duration))
        .collect();
    let expected = vec![(at(-24)?, TimeDelta::hours(-2)), (at(0)?, TimeDelta::hours(1))];
    if errors != expected {
        return Err(MetricError::from(format!("Timing errors {errors:?}")));
    }

    let summary = TimeToPeakErrorStatistic::default().aggregate(&diagram, &pool)?;
    for (component, expected) in [
        (ComponentName::Mean, TimeDelta::minutes(-30)),
        (ComponentName::Median, TimeDelta::minutes(-30)),
        (ComponentName::Minimum, TimeDelta::hours(-2)),
        (ComponentName::Maximum, TimeDelta::hours(1)),
        (ComponentName::MeanAbsolute, TimeDelta::minutes(90)),
    ] {
        if summary.value(component) != Some(expected) {
            return Err(MetricError::from(format!(
                "{component}: {:?}",
                summary.value(component)
            )));
        }
    }
    let applied = TimeToPeakErrorStatistic::default().apply(&pool)?;
    if applied != summary {
        return Err(MetricError::from("apply differs from aggregate"));
    }
    Ok(())
}
