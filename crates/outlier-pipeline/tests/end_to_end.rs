use outlier_core::{AggregateKind, PipelineConfig, Record, TransformKind, WindowConfig};
use outlier_pipeline::{AnalysisPipeline, CsvIngester, CsvSource, MemoryIngester};
use outlier_score::ScoredPoint;
use rand::prelude::*;
use rand_distr::Normal;
use std::fs;
use std::path::Path;

/// One record per second for 200 seconds; seconds 150..160 spike
fn spiky_series() -> Vec<Record> {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.1).unwrap();
    (0..200)
        .map(|t| {
            let base = if (150..160).contains(&t) { 50.0 } else { 1.0 };
            Record::with_attributes(
                vec![t as f64, base + noise.sample(&mut rng)],
                vec![format!("shard-{}", t % 4)],
            )
        })
        .collect()
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn windowed_run_with_every_dump() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::new()
        .with_query_name("e2e")
        .with_time_column(0)
        .with_window(WindowConfig::tumbling(10.0).with_aggregate(AggregateKind::Sum))
        .with_target_percentile(0.9)
        .with_classifier_dump(true)
        .with_dump_directory(dir.path())
        .with_score_grid_dump("grid.json", 5)
        .with_mixture_dump("e2e")
        .with_before_after_dump("e2e");

    let mut pipeline = AnalysisPipeline::new(config);
    pipeline.initialize().unwrap();
    let result = pipeline.run(&mut MemoryIngester::new(spiky_series())).unwrap();

    // 20 tumbling windows
    assert_eq!(result.total_records(), 20);
    assert!(result.num_outliers >= 1);

    let flags = lines(&dir.path().join("dump_classifier_e2e.txt"));
    assert_eq!(flags.len(), 20);
    assert_eq!(flags[15], "15,1");
    let flagged = flags.iter().filter(|l| l.ends_with(",1")).count();
    assert_eq!(flagged, result.num_outliers);

    let before = lines(&dir.path().join("before-e2e.csv"));
    let after = lines(&dir.path().join("after-e2e.csv"));
    assert_eq!(before.len(), 20);
    assert_eq!(after.len(), 20);
    assert!(before[3].starts_with("30,"));

    let grid: Vec<ScoredPoint> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("grid.json")).unwrap()).unwrap();
    // Time is not a feature, so the grid is one-dimensional
    assert_eq!(grid.len(), 5);
    assert!(grid.iter().all(|p| p.metrics.data.len() == 1));

    let weights: Vec<f64> =
        serde_json::from_str(&fs::read_to_string(dir.path().join("weights-e2e")).unwrap()).unwrap();
    assert_eq!(weights, vec![1.0]);
}

#[test]
fn unwindowed_run_explains_outliers() {
    let mut records = Vec::new();
    for i in 0..200 {
        let (host, latency) = if i % 20 == 0 {
            ("edge-7", 900.0 + i as f64)
        } else {
            ("core", 20.0 + (i % 13) as f64)
        };
        records.push(Record::with_attributes(
            vec![latency],
            vec![host.to_string(), "eu-west".to_string()],
        ));
    }

    let config = PipelineConfig::new()
        .with_transform(TransformKind::Mad)
        .with_target_percentile(0.9)
        .with_explanation_thresholds(0.2, 3.0);
    let mut pipeline = AnalysisPipeline::new(config);
    pipeline.initialize().unwrap();
    let result = pipeline.run(&mut MemoryIngester::new(records)).unwrap();

    assert_eq!(result.total_records(), 200);
    assert!(result.num_outliers >= 10);
    let top = &result.itemsets[0];
    assert_eq!(top.items[0].column, 0);
    assert_eq!(top.items[0].value, "edge-7");
    assert!(result.itemsets.iter().all(|i| i.items[0].value != "eu-west"));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["num_outliers"], result.num_outliers);
}

#[test]
fn csv_source_through_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metrics.csv");
    let mut body = String::from("ts,cpu,region\n");
    for t in 0..60 {
        let cpu = if t == 42 { 99.0 } else { 10.0 + (t % 5) as f64 };
        body.push_str(&format!("{},{},r{}\n", t, cpu, t % 2));
    }
    fs::write(&path, body).unwrap();

    let mut ingester = CsvIngester::new(CsvSource {
        path,
        metrics: vec!["cpu".to_string()],
        attributes: vec!["region".to_string()],
    });
    let mut pipeline = AnalysisPipeline::new(PipelineConfig::new().with_target_percentile(0.98));
    pipeline.initialize().unwrap();
    let result = pipeline.run(&mut ingester).unwrap();
    assert_eq!(result.total_records(), 60);
    assert!(result.num_outliers >= 1);
}

#[test]
fn config_file_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pipeline.json");
    fs::write(
        &path,
        r#"{"query_name": "from-file", "window": {"window_size": 10.0, "slide_size": 5.0, "aggregate": "count"}}"#,
    )
    .unwrap();
    let config = PipelineConfig::from_path(&path).unwrap();
    assert_eq!(config.target_percentile, 0.99);

    let records: Vec<Record> = [0.0, 1.0, 6.0, 11.0, 16.0, 21.0]
        .iter()
        .map(|t| Record::new(vec![*t, 1.0]))
        .collect();
    let mut pipeline = AnalysisPipeline::new(config);
    pipeline.initialize().unwrap();
    let result = pipeline.run(&mut MemoryIngester::new(records)).unwrap();
    // Windows start at 0, 5, 10, 15, 20
    assert_eq!(result.total_records(), 5);
}
