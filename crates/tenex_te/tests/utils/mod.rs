#![allow(dead_code)]

use half::{bf16, f16};
use tenex_core::{
    device::Target,
    dtype::{DType, Element},
    error::Result,
    expr::{var, Expr},
};
use tenex_te::{build, placeholder_with_dtype, schedule_injective_for, Context, NDArray, Tensor};

pub fn array_from_f64(data: &[f64], shape: &[usize], dtype: DType) -> Result<NDArray> {
    fn convert<T: Element>(data: &[f64], shape: &[usize]) -> Result<NDArray> {
        let values: Vec<T> = data.iter().map(|&v| T::from_f64(v)).collect();
        NDArray::from_vec(values, shape, Context::cpu(0))
    }

    match dtype {
        DType::BF16 => convert::<bf16>(data, shape),
        DType::F16 => convert::<f16>(data, shape),
        DType::F32 => convert::<f32>(data, shape),
        DType::F64 => convert::<f64>(data, shape),
        DType::I32 => convert::<i32>(data, shape),
        DType::I64 => convert::<i64>(data, shape),
    }
}

/// Builds `op` over a `(n, cols)` placeholder for llvm and runs it on `data`.
/// Returns the input as stored (after conversion to `dtype`) and the output.
pub fn run_unary(
    op: impl Fn(&Tensor) -> Result<Tensor>,
    data: &[f64],
    cols: usize,
    dtype: DType,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let n = var("n");
    let a = placeholder_with_dtype([Expr::from(n), Expr::from(cols)], "A", dtype)?;
    let b = op(&a)?;
    let s = schedule_injective_for(Target::Llvm, &[b.clone()])?;
    let module = build(&s, &[a, b], Target::Llvm, "unary")?;

    let shape = [data.len() / cols, cols];
    let mut input = array_from_f64(data, &shape, dtype)?;
    let mut output = NDArray::empty(&shape, dtype, Context::cpu(0))?;
    module.call(&mut [&mut input, &mut output])?;

    Ok((input.to_f64_vec()?, output.to_f64_vec()?))
}

pub fn tolerance(dtype: DType) -> f64 {
    match dtype {
        DType::BF16 => 1e-2,
        DType::F16 => 2e-3,
        DType::F32 => 1e-6,
        DType::F64 | DType::I32 | DType::I64 => 1e-12,
    }
}

pub fn assert_close(actual: &[f64], expected: &[f64], tol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tol + tol * e.abs(),
            "element {}: got {}, expected {} (tol {})",
            i,
            a,
            e,
            tol
        );
    }
}

#[macro_export]
macro_rules! test_ops {
    ([$($op:ident),*], $dtypes:tt) => {
        $(
            test_ops!(@op $op, $dtypes);
        )*
    };
    (@op $op:ident, [$($dtype:ident),*]) => {
        mod $op {
            use super::*;
            use paste::paste;

            paste! {
                $(
                    #[test]
                    fn [<$dtype:lower>]() -> Result<()> {
                        test_functions::[<$op _test>](DType::$dtype)
                    }
                )*
            }
        }
    };
}
