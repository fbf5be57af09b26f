//! JSON artifacts written by the reporting decorators

use nalgebra::{DMatrix, DVector};
use outlier_core::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// `{"data": ...}` wrapper used for every vector and matrix in a dump
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataArray<T> {
    pub data: T,
}

impl<T> DataArray<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// One scored grid point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPoint {
    pub metrics: DataArray<Vec<f64>>,
    pub score: f64,
}

impl ScoredPoint {
    pub fn new(point: Vec<f64>, score: f64) -> Self {
        Self {
            metrics: DataArray::new(point),
            score,
        }
    }
}

pub fn vector_data(v: &DVector<f64>) -> DataArray<Vec<f64>> {
    DataArray::new(v.iter().copied().collect())
}

/// Row-major nested rows
pub fn matrix_data(m: &DMatrix<f64>) -> DataArray<Vec<Vec<f64>>> {
    DataArray::new(
        m.row_iter()
            .map(|row| row.iter().copied().collect())
            .collect(),
    )
}

/// Serialize `value` as JSON to `path`, creating parent directories
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(writer, value)?;
    debug!(path = %path.display(), "dump written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scored_point_shape() {
        let value = serde_json::to_value(vec![ScoredPoint::new(vec![1.0, 2.0], 0.5)]).unwrap();
        assert_eq!(value, json!([{"metrics": {"data": [1.0, 2.0]}, "score": 0.5}]));
    }

    #[test]
    fn test_matrix_rows() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(matrix_data(&m).data, vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
    }

    #[test]
    fn test_write_json_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("weights.json");
        write_json(&path, &[0.25, 0.75]).unwrap();
        let back: Vec<f64> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![0.25, 0.75]);
    }
}
