#![allow(clippy::excessive_precision)]

mod utils;

use tenex_core::{dtype::DType, error::Result};
use utils::{assert_close, run_unary, tolerance};

mod test_functions {
    use super::*;
    use tenex_te::Tensor;

    const ROUNDING_DATA: [f64; 8] = [-2.5, -1.5, -0.5, 0.0, 0.5, 1.5, 2.5, 3.75];
    const INT_DATA: [f64; 8] = [-3.0, -1.0, 0.0, 2.0, 5.0, 7.0, -8.0, 4.0];
    const SMALL_DATA: [f64; 8] = [-1.0, -0.5, 0.0, 0.25, 0.5, 1.0, 2.0, -2.0];
    const POSITIVE_DATA: [f64; 8] = [0.25, 0.5, 1.0, 2.0, 4.0, 9.0, 16.0, 100.0];

    fn check(op: impl Fn(&Tensor) -> Result<Tensor>, reference: fn(f64) -> f64, data: &[f64], dtype: DType) -> Result<()> {
        let (input, output) = run_unary(op, data, 2, dtype)?;
        let expected: Vec<f64> = input.iter().map(|&x| reference(x)).collect();
        assert_close(&output, &expected, tolerance(dtype));
        Ok(())
    }

    fn sign(x: f64) -> f64 {
        if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    pub fn floor_test(dtype: DType) -> Result<()> {
        check(|t| t.floor(), f64::floor, &ROUNDING_DATA, dtype)
    }

    pub fn ceil_test(dtype: DType) -> Result<()> {
        check(|t| t.ceil(), f64::ceil, &ROUNDING_DATA, dtype)
    }

    pub fn trunc_test(dtype: DType) -> Result<()> {
        check(|t| t.trunc(), f64::trunc, &ROUNDING_DATA, dtype)
    }

    pub fn round_test(dtype: DType) -> Result<()> {
        let (_, output) = run_unary(|t| t.round(), &ROUNDING_DATA, 2, dtype)?;
        assert_eq!(output, vec![-2.0, -2.0, -0.0, 0.0, 0.0, 2.0, 2.0, 4.0]);
        Ok(())
    }

    pub fn sign_test(dtype: DType) -> Result<()> {
        let data = if dtype.is_int() { &INT_DATA } else { &ROUNDING_DATA };
        check(|t| t.sign(), sign, data, dtype)
    }

    pub fn abs_test(dtype: DType) -> Result<()> {
        let data = if dtype.is_int() { &INT_DATA } else { &ROUNDING_DATA };
        check(|t| t.abs(), f64::abs, data, dtype)
    }

    pub fn exp_test(dtype: DType) -> Result<()> {
        check(|t| t.exp(), f64::exp, &SMALL_DATA, dtype)
    }

    pub fn tanh_test(dtype: DType) -> Result<()> {
        check(|t| t.tanh(), f64::tanh, &SMALL_DATA, dtype)
    }

    pub fn sigmoid_test(dtype: DType) -> Result<()> {
        check(|t| t.sigmoid(), |x| 1.0 / (1.0 + (-x).exp()), &SMALL_DATA, dtype)
    }

    pub fn log_test(dtype: DType) -> Result<()> {
        check(|t| t.log(), f64::ln, &POSITIVE_DATA, dtype)
    }

    pub fn sqrt_test(dtype: DType) -> Result<()> {
        check(|t| t.sqrt(), f64::sqrt, &POSITIVE_DATA, dtype)
    }

    pub fn rsqrt_test(dtype: DType) -> Result<()> {
        check(|t| t.rsqrt(), |x| 1.0 / x.sqrt(), &POSITIVE_DATA, dtype)
    }
}

test_ops!(
    [floor, ceil, trunc, round, exp, tanh, sigmoid, log, sqrt, rsqrt],
    [BF16, F16, F32, F64]
);
test_ops!([sign, abs], [BF16, F16, F32, F64, I32, I64]);

mod graph {
    use tenex_core::{
        dtype::DType,
        error::{Error, Result},
        expr::{var, Expr},
    };
    use tenex_te::{placeholder, placeholder_with_dtype, Operation, UnaryOp};

    #[test]
    fn result_keeps_shape_and_names_the_operator() -> Result<()> {
        let m = var("m");
        let l = var("l");
        let a = placeholder([Expr::from(&m), Expr::from(&l)], "A")?;

        for kind in UnaryOp::ALL {
            let b = a.apply(kind)?;
            assert_eq!(b.shape(), a.shape());
            assert_eq!(b.dtype(), DType::F32);
            assert_eq!(b.input(), Some(&a));
            assert_eq!(b.name(), format!("T_{}", kind.canonical_name()));
            assert!(matches!(b.op(), Operation::Compute { kind: k, .. } if *k == kind));
        }
        Ok(())
    }

    #[test]
    fn abs_is_named_fabs() -> Result<()> {
        let a = placeholder([4usize], "A")?;
        assert_eq!(a.abs()?.op().canonical_name(), Some("fabs"));
        assert_eq!(a.op().canonical_name(), None);
        Ok(())
    }

    #[test]
    fn chains_walk_back_to_their_source() -> Result<()> {
        let a = placeholder([8usize], "A")?;
        let c = a.exp()?.log()?.sqrt()?;
        assert_eq!(c.source(), &a);
        assert_eq!(c.name(), "T_sqrt");
        Ok(())
    }

    #[test]
    fn float_only_ops_reject_integers() -> Result<()> {
        let a = placeholder_with_dtype([4usize], "A", DType::I32)?;
        assert!(a.abs().is_ok());
        assert!(a.sign().is_ok());
        assert!(matches!(a.exp(), Err(Error::UnsupportedDType { dtype: DType::I32, .. })));
        assert!(matches!(a.round(), Err(Error::UnsupportedDType { .. })));
        Ok(())
    }

    #[test]
    fn placeholder_validation() {
        assert!(placeholder([2usize], "").is_err());
        assert!(matches!(
            placeholder([Expr::int(-1)], "A"),
            Err(Error::InvalidShape { .. })
        ));
    }
}
