//! SPM global signal
//!
//! SPM summarises each volume of a series by a thresholded mean: voxels at or
//! below one eighth of the volume mean are treated as background and dropped,
//! and the remaining voxels are averaged. The resulting per-volume values are
//! used to spot scanner artifacts and outlier timepoints.

use ndarray::{ArrayBase, Axis, Data, Dimension, RemoveAxis};
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Fraction of the volume mean used as the background threshold (mean / 8).
pub const SPM_THRESHOLD_DIVISOR: f64 = 8.0;

/// Mean of the values, `None` when there are none.
///
/// Sums left to right, unlike numpy's pairwise summation, so results can
/// differ from numpy-produced references in the last few digits.
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0_f64, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Background threshold of a volume: its mean intensity divided by 8.
///
/// NaN for an array with no elements.
pub fn spm_threshold<S, D>(vol: &ArrayBase<S, D>) -> f64
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: Dimension,
{
    mean(vol.iter().map(|&v| -> f64 { v.into() })).unwrap_or(f64::NAN) / SPM_THRESHOLD_DIVISOR
}

/// SPM global metric of `vol`, or `None` if no voxel lies strictly above
/// the threshold.
///
/// Elements are promoted to `f64` before accumulation, so integer images
/// give the same result as their floating point equivalents.
pub fn try_spm_global<S, D>(vol: &ArrayBase<S, D>) -> Option<f64>
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: Dimension,
{
    let threshold = spm_threshold(vol);
    mean(
        vol.iter()
            .map(|&v| -> f64 { v.into() })
            .filter(|&v| v > threshold),
    )
}

/// SPM global metric of `vol`.
///
/// Returns `f64::NAN` when no voxel exceeds the threshold (all-zero or
/// all-negative volumes, empty arrays). Use [`try_spm_global`] to handle
/// that case explicitly.
pub fn spm_global<S, D>(vol: &ArrayBase<S, D>) -> f64
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: Dimension,
{
    try_spm_global(vol).unwrap_or(f64::NAN)
}

fn last_axis(ndim: usize) -> Result<Axis> {
    match ndim.checked_sub(1) {
        Some(last) => Ok(Axis(last)),
        None => Err(Error::InvalidShape(
            "a zero-dimensional array has no volume axis".to_string(),
        )),
    }
}

fn global_for_volume<S, D>(index: usize, vol: &ArrayBase<S, D>) -> f64
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: Dimension,
{
    match try_spm_global(vol) {
        Some(value) => value,
        None => {
            tracing::warn!(volume = index, "no voxels above SPM threshold");
            f64::NAN
        }
    }
}

/// SPM global metric for every volume of `series`.
///
/// Volumes are the slices along the last axis, so a 4D (X, Y, Z, T) series
/// gives T values in acquisition order.
pub fn spm_globals<S, D>(series: &ArrayBase<S, D>) -> Result<Vec<f64>>
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: RemoveAxis,
{
    let axis = last_axis(series.ndim())?;
    let globals: Vec<f64> = series
        .axis_iter(axis)
        .enumerate()
        .map(|(t, vol)| global_for_volume(t, &vol))
        .collect();

    tracing::debug!(shape = ?series.shape(), volumes = globals.len(), "computed SPM globals");
    Ok(globals)
}

/// Parallel variant of [`spm_globals`].
///
/// Volumes are computed on the rayon thread pool and collected by index, so
/// the output is identical to the sequential version.
pub fn spm_globals_par<S, D>(series: &ArrayBase<S, D>) -> Result<Vec<f64>>
where
    S: Data + Sync,
    S::Elem: Copy + Into<f64> + Sync,
    D: RemoveAxis,
{
    let axis = last_axis(series.ndim())?;
    let n_volumes = series.len_of(axis);
    let globals: Vec<f64> = (0..n_volumes)
        .into_par_iter()
        .map(|t| global_for_volume(t, &series.index_axis(axis, t)))
        .collect();

    tracing::debug!(
        shape = ?series.shape(),
        volumes = globals.len(),
        "computed SPM globals in parallel"
    );
    Ok(globals)
}
