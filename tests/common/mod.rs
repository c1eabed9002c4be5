//! Common test utilities for spm-globals integration tests

use std::fs;
use std::path::{Path, PathBuf};

use ndarray::{Array4, Axis};
use spm_globals::nifti_io::save_nifti_series_to_file;

pub const IDENTITY: [f64; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// (2, 2, 2, 3) series: all 8s, all 0s, seven zeros and a 16
pub fn three_volume_series() -> Array4<f64> {
    let mut series = Array4::<f64>::zeros((2, 2, 2, 3));
    series.index_axis_mut(Axis(3), 0).fill(8.0);
    series[[1, 1, 1, 2]] = 16.0;
    series
}

/// Synthetic BOLD-like series: a bright ellipsoid on a dim background,
/// intensity drifting over time
pub fn phantom_series(shape: (usize, usize, usize, usize)) -> Array4<f64> {
    let (nx, ny, nz, _) = shape;
    let centre = |n: usize| (n as f64 - 1.0) / 2.0;
    Array4::from_shape_fn(shape, |(i, j, k, t)| {
        let dx = (i as f64 - centre(nx)) / (nx as f64 / 2.0);
        let dy = (j as f64 - centre(ny)) / (ny as f64 / 2.0);
        let dz = (k as f64 - centre(nz)) / (nz as f64 / 2.0);
        if dx * dx + dy * dy + dz * dz < 0.8 {
            900.0 + 5.0 * t as f64 + ((i * 7 + j * 3 + k) % 11) as f64
        } else {
            ((i + j + k + t) % 3) as f64
        }
    })
}

/// Write a series as a NIfTI file in `dir`
pub fn write_series(dir: &Path, name: &str, series: &Array4<f64>) -> PathBuf {
    let path = dir.join(name);
    save_nifti_series_to_file(&path, series, (3.0, 3.0, 3.0), 2.0, &IDENTITY).unwrap();
    path
}

/// Write reference values one per line, as numpy's savetxt does
pub fn write_reference(dir: &Path, name: &str, values: &[f64]) -> PathBuf {
    let path = dir.join(name);
    let text: String = values.iter().map(|v| format!("{:.18e}\n", v)).collect();
    fs::write(&path, text).unwrap();
    path
}
