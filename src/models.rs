use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

pub(crate) const MILLIS_IN_WEEK: f64 = 7.0 * 86_400_000.0;

/// One weight observation for one chick on one diet.
///
/// `income` and `observed_at` are placeholders (`0.0` and the construction
/// time) until [`GrowthRecord::with_income_and_week`] produces the derived
/// copy. A derived record is never mutated again.
#[derive(Debug, Clone)]
pub struct GrowthRecord {
    pub id: i64,
    pub chick_id: i64,
    pub diet_id: i64,
    /// Week offset on the chick's own timeline. 0 is the earliest
    /// observation, the one whose weight becomes the chick's baseline.
    pub age_weeks: i64,
    pub weight: f64,
    pub income: f64,
    pub observed_at: DateTime<Utc>,
}

impl GrowthRecord {
    pub fn new(id: i64, chick_id: i64, diet_id: i64, age_weeks: i64, weight: f64) -> Self {
        GrowthRecord {
            id,
            chick_id,
            diet_id,
            age_weeks,
            weight,
            income: 0.0,
            observed_at: Utc::now(),
        }
    }

    /// Returns a derived copy carrying the income against the chick's
    /// baseline weight and the record's absolute timestamp, anchored so the
    /// chick's latest observation lands on `now`.
    ///
    /// Only valid once the chick has seen all of its records; the income is
    /// also absorbed into the chick's running maximum. A chick without an
    /// age-0 record yields NaN income, which propagates.
    pub fn with_income_and_week(&self, chick: &mut Chick, now: DateTime<Utc>) -> GrowthRecord {
        let income = chick.income_for(self.weight);
        chick.absorb_income(income);
        GrowthRecord {
            income,
            observed_at: chick.week_of(self.age_weeks, now),
            ..self.clone()
        }
    }
}

/// Per-chick accumulator, created on first sighting and kept for the
/// duration of one pipeline run.
#[derive(Debug, Clone)]
pub struct Chick {
    pub id: i64,
    pub diet_id: i64,
    /// Highest `age_weeks` registered so far; starts at negative infinity.
    pub max_age_weeks: f64,
    /// Highest derived income so far; starts at negative infinity. NaN
    /// incomes are ignored rather than absorbed.
    pub max_income: f64,
    /// Weight of the age-0 record, NaN until one is registered. The last
    /// age-0 record wins if there are several.
    pub initial_weight: f64,
}

impl Chick {
    pub fn new(id: i64, diet_id: i64) -> Self {
        Chick {
            id,
            diet_id,
            max_age_weeks: f64::NEG_INFINITY,
            max_income: f64::NEG_INFINITY,
            initial_weight: f64::NAN,
        }
    }

    pub fn register_record(&mut self, record: &GrowthRecord) {
        self.max_age_weeks = self.max_age_weeks.max(record.age_weeks as f64);
        if record.age_weeks == 0 {
            self.initial_weight = record.weight;
        }
    }

    pub fn absorb_income(&mut self, income: f64) {
        self.max_income = self.max_income.max(income);
    }

    pub fn income_for(&self, weight: f64) -> f64 {
        weight - self.initial_weight
    }

    /// Maps an `age_weeks` offset to an absolute timestamp: the chick's
    /// latest observation is `now`, older ones sit proportionally earlier.
    pub fn week_of(&self, age_weeks: i64, now: DateTime<Utc>) -> DateTime<Utc> {
        let weeks = self.max_age_weeks - age_weeks as f64;
        now - Duration::milliseconds((weeks * MILLIS_IN_WEEK) as i64)
    }
}

/// A point in the normalized 0–100 chart space. x is the time position, y
/// the income position inverted so higher income sits higher on the chart.
/// Degenerate runs (single timestamp, zero income spread) produce non-finite
/// coordinates instead of failing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

/// Bucketed quantile summary of one point sequence. Buckets are keyed by
/// percent label (0, 25, 50, 75, plus trailing labels when the point count
/// does not divide evenly).
#[derive(Debug, Clone, Default)]
pub struct QuantileTable {
    pub buckets: BTreeMap<u32, i64>,
    pub median: f64,
}

impl QuantileTable {
    /// Bucket value for a label, 0 when the label is absent (fewer than
    /// four points).
    pub fn bucket(&self, label: u32) -> i64 {
        self.buckets.get(&label).copied().unwrap_or(0)
    }
}

/// Share of the total mean peak income held by one diet group. Percentages
/// are rounded independently and need not sum to exactly 100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DietShare {
    pub diet_id: i64,
    pub percent: i64,
}

/// Everything one pipeline run produces for the rendering layer.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub records: Vec<GrowthRecord>,
    pub chicks: Vec<Chick>,
    /// Deduplicated chart series, one point per distinct x, ascending.
    pub line_chart_points: Vec<ChartPoint>,
    /// Quantile table over all projected points.
    pub quantiles: QuantileTable,
    /// Same table with the lowest-income decile of points (y >= 90) removed.
    pub quantiles_trimmed: QuantileTable,
    pub diet_shares: Vec<DietShare>,
    /// Global time span in weeks, rounded up.
    pub max_number_of_weeks: i64,
    /// Difference between the two tables' 75-buckets.
    pub quantile_change_in_percent: i64,
}
