//! Random and elementwise helpers for parameter vectors.
//!
//! All sampling functions take the random source explicitly so that callers
//! (tests in particular) can inject a seeded generator and reproduce a run.

use rand::Rng;
use rand_distr::{Distribution as _, Normal, NormalError};

use crate::tunable::Bounds;

/// Creates a vector by applying a function to each index.
///
/// # Examples
///
/// ```
/// use racetune_model::vector;
///
/// let v = vector::from_fn(|i| i as f64 * 0.5, 3);
/// assert_eq!(v, vec![0.0, 0.5, 1.0]);
/// ```
pub fn from_fn<F>(mut f: F, len: usize) -> Vec<f64>
where
    F: FnMut(usize) -> f64,
{
    let mut values = Vec::with_capacity(len);
    for i in 0..len {
        values.push(f(i));
    }
    values
}

/// Samples `len` values independently from `U[0, 1]`.
pub fn unit_uniform<R>(rng: &mut R, len: usize) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    from_fn(|_| rng.random_range(0.0..=1.0), len)
}

/// Samples one value per dimension uniformly in `[lower[i], upper[i]]`.
///
/// Zero-width dimensions yield their single admissible value.
///
/// # Panics
///
/// Panics if a bound is infinite.
pub fn uniform_in<R>(rng: &mut R, bounds: &Bounds) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    bounds
        .iter()
        .map(|(lo, hi)| rng.random_range(lo..=hi))
        .collect()
}

/// Samples one value per dimension uniformly in `[-(upper[i] - lower[i]), upper[i] - lower[i]]`.
///
/// Used to give freshly initialized particles a velocity on the scale of the
/// search range.
pub fn symmetric_uniform_in<R>(rng: &mut R, bounds: &Bounds) -> Vec<f64>
where
    R: Rng + ?Sized,
{
    bounds
        .iter()
        .map(|(lo, hi)| rng.random_range(-1.0..=1.0) * (hi - lo))
        .collect()
}

/// Samples `len` values from `N(mean, std_dev²)`.
pub fn gaussian<R>(
    rng: &mut R,
    len: usize,
    mean: f64,
    std_dev: f64,
) -> Result<Vec<f64>, NormalError>
where
    R: Rng + ?Sized,
{
    let normal = Normal::new(mean, std_dev)?;
    Ok(from_fn(|_| normal.sample(&mut *rng), len))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_uniform_in_respects_bounds() {
        let mut rng = Pcg32::seed_from_u64(7);
        let bounds = Bounds::new(vec![-3.0, 0.0, 5.0], vec![-1.0, 100.0, 5.0]).unwrap();
        for _ in 0..200 {
            let v = uniform_in(&mut rng, &bounds);
            assert!(bounds.contains(&v));
            assert_eq!(v[2], 5.0);
        }
    }

    #[test]
    fn test_symmetric_uniform_scales_with_range() {
        let mut rng = Pcg32::seed_from_u64(11);
        let bounds = Bounds::new(vec![0.0, 2.0], vec![4.0, 2.0]).unwrap();
        for _ in 0..200 {
            let v = symmetric_uniform_in(&mut rng, &bounds);
            assert!((-4.0..=4.0).contains(&v[0]));
            assert_eq!(v[1], 0.0);
        }
    }

    #[test]
    fn test_unit_uniform_in_unit_interval() {
        let mut rng = Pcg32::seed_from_u64(3);
        let v = unit_uniform(&mut rng, 500);
        assert!(v.iter().all(|x| (0.0..=1.0).contains(x)));
    }

    #[test]
    fn test_gaussian_rejects_invalid_std_dev() {
        let mut rng = Pcg32::seed_from_u64(3);
        assert!(gaussian(&mut rng, 4, 0.0, f64::NAN).is_err());
        assert_eq!(gaussian(&mut rng, 4, 0.0, 1.0).unwrap().len(), 4);
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let a = gaussian(&mut Pcg32::seed_from_u64(42), 8, 0.0, 1.0).unwrap();
        let b = gaussian(&mut Pcg32::seed_from_u64(42), 8, 0.0, 1.0).unwrap();
        assert_eq!(a, b);
    }
}
