use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::diet;
use crate::models::{Analysis, ChartPoint, Chick, GrowthRecord, MILLIS_IN_WEEK};
use crate::quantile;

/// Keyed store of per-chick accumulators for one run. Chicks are created on
/// first sighting and listed in sighting order.
#[derive(Debug, Default)]
struct ChickRegistry {
    index: HashMap<i64, usize>,
    chicks: Vec<Chick>,
}

impl ChickRegistry {
    fn find_or_create(&mut self, chick_id: i64, diet_id: i64) -> &mut Chick {
        if let Some(&index) = self.index.get(&chick_id) {
            return &mut self.chicks[index];
        }
        let index = self.chicks.len();
        self.index.insert(chick_id, index);
        self.chicks.push(Chick::new(chick_id, diet_id));
        &mut self.chicks[index]
    }

    fn into_chicks(self) -> Vec<Chick> {
        self.chicks
    }
}

/// Runs the full derivation pipeline over one batch of raw records.
pub fn analyze(records: &[GrowthRecord]) -> Analysis {
    analyze_at(records, Utc::now())
}

/// Same as [`analyze`] with an explicit clock, read once and threaded
/// through every derivation.
///
/// Two sequential passes over the input: the first finalizes each chick's
/// max age and baseline weight, the second derives incomes and timestamps
/// against that finalized state. A streaming single pass cannot work here
/// since a chick's baseline may arrive with its last record.
pub fn analyze_at(records: &[GrowthRecord], now: DateTime<Utc>) -> Analysis {
    let mut registry = ChickRegistry::default();

    for record in records {
        registry
            .find_or_create(record.chick_id, record.diet_id)
            .register_record(record);
    }

    let mut derived = Vec::with_capacity(records.len());
    let mut earliest = now;
    let mut max_income = 0.0_f64;

    for record in records {
        let chick = registry.find_or_create(record.chick_id, record.diet_id);
        let record = record.with_income_and_week(chick, now);
        earliest = earliest.min(record.observed_at);
        // NaN incomes (missing baseline) never become the global maximum
        max_income = max_income.max(record.income);
        derived.push(record);
    }

    let span_millis = (now - earliest).num_milliseconds() as f64;

    let mut points: Vec<ChartPoint> = derived
        .iter()
        .map(|record| project(record, earliest, span_millis, max_income))
        .collect();
    points.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));

    let trimmed: Vec<ChartPoint> = points.iter().copied().filter(|point| point.y < 90.0).collect();
    let quantiles = quantile::quantile_table(&points);
    let quantiles_trimmed = quantile::quantile_table(&trimmed);
    let quantile_change_in_percent = quantiles.bucket(75) - quantiles_trimmed.bucket(75);

    let line_chart_points = dedupe_points(&points);
    let chicks = registry.into_chicks();
    let diet_shares = diet::diet_shares(&chicks);
    let max_number_of_weeks = (span_millis / MILLIS_IN_WEEK).ceil() as i64;

    debug!(
        records = derived.len(),
        chicks = chicks.len(),
        points = line_chart_points.len(),
        max_number_of_weeks,
        "analysis complete"
    );

    Analysis {
        records: derived,
        chicks,
        line_chart_points,
        quantiles,
        quantiles_trimmed,
        diet_shares,
        max_number_of_weeks,
        quantile_change_in_percent,
    }
}

/// Projects one derived record into the 0–100 chart space. A zero time span
/// or zero maximum income divides by zero here and yields non-finite
/// coordinates; the run still completes.
fn project(
    record: &GrowthRecord,
    earliest: DateTime<Utc>,
    span_millis: f64,
    max_income: f64,
) -> ChartPoint {
    let elapsed = (record.observed_at - earliest).num_milliseconds() as f64;
    ChartPoint {
        x: (elapsed / span_millis * 100.0).ceil(),
        y: ((1.0 - record.income / max_income) * 100.0).ceil(),
    }
}

/// Merges points sharing the same integer x bucket into one point whose y is
/// the floored mean of the group, ascending by x. Non-finite x saturates
/// under the `as i64` cast (NaN lands in bucket 0), so degenerate runs
/// collapse into sentinel buckets instead of failing.
fn dedupe_points(points: &[ChartPoint]) -> Vec<ChartPoint> {
    let mut buckets: BTreeMap<i64, (f64, usize)> = BTreeMap::new();

    for point in points {
        let entry = buckets.entry(point.x as i64).or_insert((0.0, 0));
        entry.0 += point.y;
        entry.1 += 1;
    }

    buckets
        .into_iter()
        .map(|(x, (sum, count))| ChartPoint {
            x: x as f64,
            y: (sum / count as f64).floor(),
        })
        .collect()
}
