//! Threshold evaluation.

use hostwatch_types::{AlertBatch, AlertLine, MetricKind, Sample};

use super::Thresholds;

/// Build the alert batch for `kind`: every sample of that kind whose value is
/// strictly greater than `threshold`, in sample order.
pub fn evaluate(samples: &[Sample], kind: MetricKind, threshold: f64) -> AlertBatch {
    let mut batch = AlertBatch::new(kind);
    for sample in samples
        .iter()
        .filter(|s| s.kind == kind && s.exceeds(threshold))
    {
        batch.push(AlertLine::from_sample(sample));
    }
    batch
}

/// Evaluate every metric kind present in `samples` against its own threshold.
///
/// Batches come back in the order each kind first appears, so process
/// sections stay ahead of weather sections when process samplers run first.
/// Kinds without a configured threshold are left out.
pub fn evaluate_all(samples: &[Sample], thresholds: &Thresholds) -> Vec<AlertBatch> {
    let mut kinds: Vec<MetricKind> = Vec::new();
    for sample in samples {
        if !kinds.contains(&sample.kind) {
            kinds.push(sample.kind);
        }
    }

    kinds
        .into_iter()
        .filter_map(|kind| {
            thresholds
                .for_kind(kind)
                .map(|threshold| evaluate(samples, kind, threshold))
        })
        .collect()
}
