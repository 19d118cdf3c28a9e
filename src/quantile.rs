use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{ChartPoint, QuantileTable};

/// Summarizes a point sequence into quartile buckets plus a median.
///
/// Bucket values come from the y values sorted ascending, split into
/// contiguous chunks of `len / 4`; the trailing partial chunk gets its own
/// label past 75. With fewer than four points the chunk size is zero and the
/// table holds the single empty bucket `(0, 0)`.
///
/// The median is different on purpose: it indexes the point list in the
/// order given (chart position order), not the sorted values, and adds half
/// of the upper neighbor to the lower one. Fewer than two points leave it
/// NaN.
pub fn quantile_table(points: &[ChartPoint]) -> QuantileTable {
    let mut incomes: Vec<f64> = points.iter().map(|point| point.y).collect();
    incomes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let bucket_size = incomes.len() / 4;
    let mut buckets = BTreeMap::new();

    if bucket_size == 0 {
        buckets.insert(0, 0);
    } else {
        for (index, chunk) in incomes.chunks(bucket_size).enumerate() {
            let sum: f64 = chunk.iter().sum();
            let value = (sum / chunk.len() as f64).floor() as i64;
            buckets.insert(25 * index as u32, value);
        }
    }

    QuantileTable {
        buckets,
        median: position_median(points),
    }
}

fn position_median(points: &[ChartPoint]) -> f64 {
    let half = points.len() as f64 / 2.0;
    let lower = half.floor() as usize;
    let upper = half.ceil() as usize;
    let y_at = |index: usize| points.get(index).map(|point| point.y).unwrap_or(f64::NAN);
    y_at(lower) + y_at(upper) / 2.0
}
