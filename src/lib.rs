//! Growth and income analytics over per-chick, per-diet weight observations.
//!
//! One refresh delivers a flat batch of raw observations; [`pipeline::analyze`]
//! reconstructs per-chick state in two passes, derives income and absolute
//! timestamps, projects the records into a normalized 0–100 chart space, and
//! summarizes the series as quantile tables and diet percentage shares. The
//! crate produces data structures only; chart rendering belongs to the caller.

pub mod diet;
pub mod models;
pub mod pipeline;
pub mod quantile;
pub mod source;

pub use models::{Analysis, ChartPoint, Chick, DietShare, GrowthRecord, QuantileTable};
pub use pipeline::{analyze, analyze_at};
pub use source::{CsvSource, GrowthDataSource, JsonSource, MockSource, RawObservation};

/// Fetches one batch from the source and runs the pipeline over it. The
/// fetch is the only asynchronous boundary; the analysis itself runs to
/// completion synchronously.
pub async fn refresh<S>(source: &S) -> anyhow::Result<Analysis>
where
    S: GrowthDataSource + ?Sized,
{
    let records = source.fetch().await?;
    Ok(pipeline::analyze(&records))
}
