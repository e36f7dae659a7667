use rand::{distributions::Distribution, distributions::Uniform, Rng};
use tenex_core::error::{Error, Result};

const BOUNDARY_WINDOW: f32 = 1e-6;
const NUDGE: f32 = 1e-5;

/// `shape.product()` samples from `[low, high)`, drawn in f64 and stored as f32.
pub fn uniform<R: Rng + ?Sized>(shape: &[usize], low: f64, high: f64, rng: &mut R) -> Result<Vec<f32>> {
    if !(low.is_finite() && high.is_finite() && low < high) {
        return Err(Error::InvalidArgument(format!("empty sampling range [{}, {})", low, high)));
    }

    let dist = Uniform::new(low, high);
    let size = shape.iter().product::<usize>();
    Ok((0..size).map(|_| dist.sample(rng) as f32).collect())
}

/// Pushes values sitting on a half-integer up, so every rounding
/// implementation agrees on which way they go.
///
/// The step is at least one ulp, since at larger magnitudes `NUDGE` would
/// be absorbed by f32 rounding.
pub fn nudge_rounding_boundaries(values: &mut [f32]) {
    for v in values.iter_mut() {
        if (v.rem_euclid(1.0) - 0.5).abs() < BOUNDARY_WINDOW {
            *v += NUDGE.max(ulp(*v));
        }
    }
}

fn ulp(x: f32) -> f32 {
    let x = x.abs();
    f32::from_bits(x.to_bits() + 1) - x
}
