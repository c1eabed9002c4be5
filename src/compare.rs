//! Tolerance comparison of computed and reference globals
//!
//! Follows numpy's `allclose`: `|a - b| <= atol + rtol * |b|` with the
//! reference as `b`. NaN is never close to anything.

/// Comparison tolerances
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Relative tolerance, scaled by the reference magnitude
    pub rtol: f64,
    /// Absolute tolerance
    pub atol: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            rtol: 1e-4,
            atol: 1e-8,
        }
    }
}

/// A value that fell outside tolerance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub computed: f64,
    pub reference: f64,
}

/// Outcome of comparing two sequences
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    /// Same length, every value within tolerance
    Close,
    /// Same length, the listed values are outside tolerance
    Differ { mismatches: Vec<Mismatch> },
    /// Sequences have different lengths
    ShapeMismatch { computed: usize, reference: usize },
}

impl Comparison {
    /// True only for [`Comparison::Close`].
    pub fn is_close(&self) -> bool {
        matches!(self, Comparison::Close)
    }
}

/// Whether `a` is within tolerance of the reference `b`.
pub fn is_close(a: f64, b: f64, tol: Tolerance) -> bool {
    if a.is_infinite() || b.is_infinite() {
        return a == b;
    }
    (a - b).abs() <= tol.atol + tol.rtol * b.abs()
}

/// Compare computed globals against reference values.
pub fn compare_globals(computed: &[f64], reference: &[f64], tol: Tolerance) -> Comparison {
    if computed.len() != reference.len() {
        return Comparison::ShapeMismatch {
            computed: computed.len(),
            reference: reference.len(),
        };
    }

    let mismatches: Vec<Mismatch> = computed
        .iter()
        .zip(reference)
        .enumerate()
        .filter(|&(_, (&a, &b))| !is_close(a, b, tol))
        .map(|(index, (&computed, &reference))| Mismatch {
            index,
            computed,
            reference,
        })
        .collect();

    if mismatches.is_empty() {
        Comparison::Close
    } else {
        Comparison::Differ { mismatches }
    }
}

/// Console report for a comparison.
///
/// One line when close; otherwise the differ banner followed by both
/// sequences, for value and length mismatches alike.
pub fn report_lines(comparison: &Comparison, computed: &[f64], reference: &[f64]) -> Vec<String> {
    match comparison {
        Comparison::Close => vec!["OK: your values and SPMs are close".to_string()],
        Comparison::Differ { .. } | Comparison::ShapeMismatch { .. } => vec![
            "SPM and your values differ".to_string(),
            format!("Yours: {:?}", computed),
            format!("SPMs: {:?}", reference),
        ],
    }
}
