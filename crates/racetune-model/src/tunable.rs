//! The parameter-vector contract shared by every optimizable module.
//!
//! A [`Tunable`] exposes a fixed-length vector of real parameters together
//! with box constraints. Unrelated modules (thresholds, sensor weights, a
//! feed-forward network) are tuned together by concatenating their vectors in
//! a fixed order; [`concat_parameters`] and [`split_parameters`] implement that
//! mapping and [`TunableStack`] packages it as a `Tunable` of its own.
//!
//! The concatenation order is the order of the module list. It must be the
//! same on every get/set/save/load, which is why the helpers take slices
//! rather than unordered collections.

use std::{fmt, ops::Range};

/// A supplied parameter vector does not match the module's parameter count.
///
/// Nothing is applied when this error is returned.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("parameter vector length mismatch: expected {expected}, got {actual}")]
pub struct ParameterError {
    pub expected: usize,
    pub actual: usize,
}

impl ParameterError {
    /// Returns `Ok(())` when `actual` matches `expected`.
    pub fn check(expected: usize, actual: usize) -> Result<(), Self> {
        if expected == actual {
            Ok(())
        } else {
            Err(Self { expected, actual })
        }
    }
}

/// Invalid box constraints.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum BoundsError {
    #[display("lower bounds have {lower} entries but upper bounds have {upper}")]
    LengthMismatch { lower: usize, upper: usize },
    #[display("bound {index} is NaN")]
    NotANumber { index: usize },
    #[display("bound {index} is inverted: lower {lower} > upper {upper}")]
    Inverted { index: usize, lower: f64, upper: f64 },
}

/// Elementwise box constraints `lower[i] <= x[i] <= upper[i]`.
///
/// Zero-width ranges (`lower[i] == upper[i]`) are allowed and pin the
/// dimension to a constant.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl Bounds {
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self, BoundsError> {
        if lower.len() != upper.len() {
            return Err(BoundsError::LengthMismatch {
                lower: lower.len(),
                upper: upper.len(),
            });
        }
        for (index, (&lo, &hi)) in lower.iter().zip(&upper).enumerate() {
            if lo.is_nan() || hi.is_nan() {
                return Err(BoundsError::NotANumber { index });
            }
            if lo > hi {
                return Err(BoundsError::Inverted {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Same `[lower, upper]` range for every one of `len` dimensions.
    pub fn uniform(len: usize, lower: f64, upper: f64) -> Result<Self, BoundsError> {
        Self::new(vec![lower; len], vec![upper; len])
    }

    /// `(-∞, +∞)` in every dimension.
    #[must_use]
    pub fn unbounded(len: usize) -> Self {
        Self {
            lower: vec![f64::NEG_INFINITY; len],
            upper: vec![f64::INFINITY; len],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lower.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Iterates over `(lower, upper)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.lower.iter().copied().zip(self.upper.iter().copied())
    }

    /// Index of the first dimension with an infinite bound, if any.
    #[must_use]
    pub fn first_unbounded(&self) -> Option<usize> {
        self.iter()
            .position(|(lo, hi)| !lo.is_finite() || !hi.is_finite())
    }

    /// Whether every component of `values` lies within the bounds.
    ///
    /// Returns `false` on a length mismatch.
    #[must_use]
    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.len()
            && self
                .iter()
                .zip(values)
                .all(|((lo, hi), &x)| lo <= x && x <= hi)
    }

    /// Clamps each component of `values` into its range.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not have the same length as the bounds.
    pub fn clip(&self, values: &mut [f64]) {
        assert_eq!(values.len(), self.len());
        for ((lo, hi), x) in self.iter().zip(values) {
            *x = x.clamp(lo, hi);
        }
    }

    /// Concatenates bounds in order.
    #[must_use]
    pub fn concat<'a, I>(parts: I) -> Self
    where
        I: IntoIterator<Item = &'a Bounds>,
    {
        let mut lower = vec![];
        let mut upper = vec![];
        for part in parts {
            lower.extend_from_slice(&part.lower);
            upper.extend_from_slice(&part.upper);
        }
        Self { lower, upper }
    }
}

/// A module whose behaviour is controlled by a fixed-length parameter vector.
pub trait Tunable {
    /// Number of parameters. Must not change over the module's lifetime.
    fn parameter_count(&self) -> usize;

    /// Lower box constraints, `parameter_count()` entries.
    fn lower_bounds(&self) -> Vec<f64>;

    /// Upper box constraints, `parameter_count()` entries.
    fn upper_bounds(&self) -> Vec<f64>;

    /// Current parameter values.
    fn parameters(&self) -> Vec<f64>;

    /// Replaces the parameter values.
    ///
    /// Fails without side effects when `parameters.len() != parameter_count()`.
    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError>;

    /// Validated lower and upper bounds together.
    fn bounds(&self) -> Result<Bounds, BoundsError> {
        Bounds::new(self.lower_bounds(), self.upper_bounds())
    }
}

/// Position of one module's parameters inside an aggregate vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub offset: usize,
    pub len: usize,
}

impl Segment {
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Offsets of each module's block in the concatenated vector.
#[must_use]
pub fn segments(modules: &[&dyn Tunable]) -> Vec<Segment> {
    let mut offset = 0;
    modules
        .iter()
        .map(|m| {
            let len = m.parameter_count();
            let segment = Segment { offset, len };
            offset += len;
            segment
        })
        .collect()
}

/// Sum of the members' parameter counts.
#[must_use]
pub fn total_parameter_count(modules: &[&dyn Tunable]) -> usize {
    modules.iter().map(|m| m.parameter_count()).sum()
}

/// Concatenates the members' parameters in list order.
#[must_use]
pub fn concat_parameters(modules: &[&dyn Tunable]) -> Vec<f64> {
    modules.iter().flat_map(|m| m.parameters()).collect()
}

/// Concatenates the members' lower bounds in list order.
#[must_use]
pub fn concat_lower_bounds(modules: &[&dyn Tunable]) -> Vec<f64> {
    modules.iter().flat_map(|m| m.lower_bounds()).collect()
}

/// Concatenates the members' upper bounds in list order.
#[must_use]
pub fn concat_upper_bounds(modules: &[&dyn Tunable]) -> Vec<f64> {
    modules.iter().flat_map(|m| m.upper_bounds()).collect()
}

/// Distributes a concatenated vector back onto the members.
///
/// The total length is checked before any member is touched, so a mismatch
/// leaves every module unchanged.
pub fn split_parameters(
    modules: &mut [&mut dyn Tunable],
    parameters: &[f64],
) -> Result<(), ParameterError> {
    let expected = modules.iter().map(|m| m.parameter_count()).sum();
    ParameterError::check(expected, parameters.len())?;

    let mut rest = parameters;
    for module in modules.iter_mut() {
        let (head, tail) = rest.split_at(module.parameter_count());
        module.set_parameters(head)?;
        rest = tail;
    }
    Ok(())
}

/// A standalone parameter vector with its own bounds.
///
/// Useful for plain numeric blocks that have no behaviour attached, and for
/// benchmarking the optimizer on synthetic objectives.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBlock {
    values: Vec<f64>,
    bounds: Bounds,
}

impl ParameterBlock {
    /// Creates a block whose initial values are the lower bounds.
    #[must_use]
    pub fn new(bounds: Bounds) -> Self {
        Self {
            values: bounds.lower().to_vec(),
            bounds,
        }
    }

    /// Creates a block with explicit initial values.
    pub fn with_values(values: Vec<f64>, bounds: Bounds) -> Result<Self, ParameterError> {
        ParameterError::check(bounds.len(), values.len())?;
        Ok(Self { values, bounds })
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl Tunable for ParameterBlock {
    fn parameter_count(&self) -> usize {
        self.values.len()
    }

    fn lower_bounds(&self) -> Vec<f64> {
        self.bounds.lower().to_vec()
    }

    fn upper_bounds(&self) -> Vec<f64> {
        self.bounds.upper().to_vec()
    }

    fn parameters(&self) -> Vec<f64> {
        self.values.clone()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        ParameterError::check(self.values.len(), parameters.len())?;
        self.values.copy_from_slice(parameters);
        Ok(())
    }
}

/// An ordered, heterogeneous list of tunable modules acting as one.
#[derive(Default)]
pub struct TunableStack {
    modules: Vec<Box<dyn Tunable>>,
}

impl fmt::Debug for TunableStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunableStack")
            .field(
                "parameter_counts",
                &self
                    .modules
                    .iter()
                    .map(|m| m.parameter_count())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl TunableStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a module at the end of the concatenation order.
    pub fn push<T>(&mut self, module: T)
    where
        T: Tunable + 'static,
    {
        self.modules.push(Box::new(module));
    }

    #[must_use]
    pub fn with<T>(mut self, module: T) -> Self
    where
        T: Tunable + 'static,
    {
        self.push(module);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Members in concatenation order.
    #[must_use]
    pub fn members(&self) -> Vec<&dyn Tunable> {
        self.modules.iter().map(|m| &**m).collect()
    }

    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        segments(&self.members())
    }
}

impl Tunable for TunableStack {
    fn parameter_count(&self) -> usize {
        total_parameter_count(&self.members())
    }

    fn lower_bounds(&self) -> Vec<f64> {
        concat_lower_bounds(&self.members())
    }

    fn upper_bounds(&self) -> Vec<f64> {
        concat_upper_bounds(&self.members())
    }

    fn parameters(&self) -> Vec<f64> {
        concat_parameters(&self.members())
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), ParameterError> {
        let mut members = self
            .modules
            .iter_mut()
            .map(|m| &mut **m as &mut dyn Tunable)
            .collect::<Vec<_>>();
        split_parameters(&mut members, parameters)
    }
}
