use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::models::GrowthRecord;

/// One raw observation row as delivered by upstream data.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawObservation {
    pub chick: i64,
    pub diet: i64,
    pub time: i64,
    pub weight: f64,
}

/// Turns raw rows into records, assigning sequential ids in delivery order.
pub fn to_records(rows: impl IntoIterator<Item = RawObservation>) -> Vec<GrowthRecord> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            GrowthRecord::new(index as i64 + 1, row.chick, row.diet, row.time, row.weight)
        })
        .collect()
}

/// Delivers one batch of raw records per refresh. The pipeline runs once per
/// successful delivery; a failed fetch means no run.
#[async_trait]
pub trait GrowthDataSource {
    async fn fetch(&self) -> anyhow::Result<Vec<GrowthRecord>>;
}

/// Built-in dataset for running without any files, with an optional
/// artificial delay standing in for server latency.
#[derive(Debug, Default)]
pub struct MockSource {
    pause: Option<Duration>,
}

impl MockSource {
    pub fn new() -> Self {
        MockSource { pause: None }
    }

    pub fn with_pause(pause: Duration) -> Self {
        MockSource { pause: Some(pause) }
    }
}

#[async_trait]
impl GrowthDataSource for MockSource {
    async fn fetch(&self) -> anyhow::Result<Vec<GrowthRecord>> {
        if let Some(pause) = self.pause {
            tokio::time::sleep(pause).await;
        }
        let rows = MOCK_OBSERVATIONS
            .iter()
            .map(|&(chick, diet, time, weight)| RawObservation {
                chick,
                diet,
                time,
                weight,
            });
        Ok(to_records(rows))
    }
}

/// Reads observations from a CSV file with a `chick,diet,time,weight`
/// header row.
#[derive(Debug)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvSource { path: path.into() }
    }
}

#[async_trait]
impl GrowthDataSource for CsvSource {
    async fn fetch(&self) -> anyhow::Result<Vec<GrowthRecord>> {
        let mut reader = csv::Reader::from_path(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let mut rows = Vec::new();
        for result in reader.deserialize::<RawObservation>() {
            rows.push(result?);
        }

        debug!(rows = rows.len(), path = %self.path.display(), "csv batch loaded");
        Ok(to_records(rows))
    }
}

/// Reads observations from a JSON file holding an array of row objects.
#[derive(Debug)]
pub struct JsonSource {
    path: PathBuf,
}

impl JsonSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonSource { path: path.into() }
    }
}

#[async_trait]
impl GrowthDataSource for JsonSource {
    async fn fetch(&self) -> anyhow::Result<Vec<GrowthRecord>> {
        let raw = std::fs::read(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let rows: Vec<RawObservation> =
            serde_json::from_slice(&raw).context("malformed observation JSON")?;

        debug!(rows = rows.len(), path = %self.path.display(), "json batch loaded");
        Ok(to_records(rows))
    }
}

// (chick, diet, age week, weight) — six chicks across four diets.
const MOCK_OBSERVATIONS: &[(i64, i64, i64, f64)] = &[
    (1, 1, 0, 42.0),
    (1, 1, 1, 66.0),
    (1, 1, 2, 106.0),
    (1, 1, 3, 171.0),
    (2, 1, 0, 40.0),
    (2, 1, 1, 62.0),
    (2, 1, 2, 98.0),
    (2, 1, 3, 155.0),
    (3, 2, 0, 43.0),
    (3, 2, 1, 75.0),
    (3, 2, 2, 132.0),
    (3, 2, 3, 205.0),
    (4, 2, 0, 41.0),
    (4, 2, 1, 69.0),
    (4, 2, 2, 118.0),
    (4, 2, 3, 188.0),
    (5, 3, 0, 42.0),
    (5, 3, 1, 80.0),
    (5, 3, 2, 148.0),
    (5, 3, 3, 233.0),
    (6, 4, 0, 40.0),
    (6, 4, 1, 77.0),
    (6, 4, 2, 144.0),
    (6, 4, 3, 226.0),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_sequential_and_records_start_underived() {
        let rows = vec![
            RawObservation { chick: 7, diet: 2, time: 0, weight: 41.0 },
            RawObservation { chick: 7, diet: 2, time: 1, weight: 65.0 },
        ];
        let records = to_records(rows);

        assert_eq!(records[0].id, 1);
        assert_eq!(records[1].id, 2);
        assert_eq!(records[1].chick_id, 7);
        assert_eq!(records[1].age_weeks, 1);
        assert!(records.iter().all(|record| record.income == 0.0));
    }

    #[tokio::test]
    async fn mock_source_delivers_the_full_dataset() {
        let records = MockSource::new().fetch().await.unwrap();

        assert_eq!(records.len(), MOCK_OBSERVATIONS.len());
        assert_eq!(records.first().unwrap().id, 1);
        assert_eq!(records.last().unwrap().id, records.len() as i64);
    }

    #[tokio::test]
    async fn csv_source_parses_header_and_rows() {
        let path = std::env::temp_dir().join("chick-diet-insights-source-test.csv");
        std::fs::write(&path, "chick,diet,time,weight\n1,1,0,42.0\n1,1,1,66.5\n").unwrap();

        let records = CsvSource::new(&path).fetch().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].weight, 66.5);
        assert_eq!(records[1].age_weeks, 1);
    }

    #[tokio::test]
    async fn json_source_parses_an_array_of_rows() {
        let path = std::env::temp_dir().join("chick-diet-insights-source-test.json");
        std::fs::write(
            &path,
            r#"[{"chick":1,"diet":1,"time":0,"weight":42.0},{"chick":1,"diet":1,"time":1,"weight":66.0}]"#,
        )
        .unwrap();

        let records = JsonSource::new(&path).fetch().await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].diet_id, 1);
    }

    #[tokio::test]
    async fn missing_file_surfaces_as_an_error() {
        let result = CsvSource::new("/definitely/not/here.csv").fetch().await;
        assert!(result.is_err());
    }
}
