use tenex_core::error::{Error, Result};

/// Elementwise `|actual - expected| <= atol + rtol * |expected|`.
///
/// Infinities match only an infinity of the same sign, and NaN matches NaN.
/// On failure the error carries the number of mismatches and the element
/// that missed by the most.
pub fn allclose(actual: &[f64], expected: &[f64], rtol: f64, atol: f64) -> Result<()> {
    if actual.len() != expected.len() {
        return Err(Error::ShapeMismatch {
            expected: format!("{} elements", expected.len()),
            got: format!("{} elements", actual.len()),
            msg: "allclose operands".into(),
        });
    }

    let mut mismatched = 0;
    let mut worst: Option<(usize, f64)> = None;
    for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
        let excess = excess(a, e, rtol, atol);
        if excess > 0.0 {
            mismatched += 1;
            if worst.map_or(true, |(_, w)| excess > w) {
                worst = Some((i, excess));
            }
        }
    }

    match worst {
        None => Ok(()),
        Some((index, _)) => Err(Error::NumericMismatch {
            target: None,
            mismatched,
            total: actual.len(),
            index,
            actual: actual[index],
            expected: expected[index],
        }),
    }
}

/// Panicking form of [`allclose`] for tests.
#[track_caller]
pub fn assert_allclose(actual: &[f64], expected: &[f64], rtol: f64, atol: f64) {
    if let Err(e) = allclose(actual, expected, rtol, atol) {
        panic!("{}", e);
    }
}

// how far outside the tolerance band `a` lies; zero or less is a match
fn excess(a: f64, e: f64, rtol: f64, atol: f64) -> f64 {
    if a.is_nan() || e.is_nan() {
        return if a.is_nan() && e.is_nan() { 0.0 } else { f64::INFINITY };
    }
    if a.is_infinite() || e.is_infinite() {
        return if a == e { 0.0 } else { f64::INFINITY };
    }
    (a - e).abs() - (atol + rtol * e.abs())
}
