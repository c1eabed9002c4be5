//! spm-globals: SPM global signal for 4D NIfTI images
//!
//! Computes SPM's per-volume global metric (mean of the voxels above one
//! eighth of the volume mean) and checks the result against reference values.
//!
//! # Modules
//! - `globals`: per-volume and per-series global metric
//! - `nifti_io`: loading and writing NIfTI series
//! - `reference`: reading reference value files
//! - `compare`: tolerance comparison of computed and reference values
//! - `logging`: tracing setup for the command-line tool

pub mod error;

// Core metric
pub mod globals;

// I/O and validation
pub mod compare;
pub mod nifti_io;
pub mod reference;

pub mod logging;

pub use compare::{compare_globals, Comparison, Tolerance};
pub use error::{Error, Result};
pub use globals::{spm_global, spm_globals, spm_globals_par, try_spm_global};
pub use nifti_io::{read_nifti_series_file, NiftiSeries};
