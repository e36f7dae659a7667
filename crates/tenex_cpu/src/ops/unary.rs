#![allow(clippy::comparison_chain)]

use crate::utils::{get_strided_index, is_contiguous, strided_extent};
use half::{bf16, f16};
use rayon::prelude::*;

macro_rules! unary_op {
    ($name:ident, $type:ty, $func:expr) => {
        /// # Safety
        ///
        /// * `metadata` must be either:
        ///   - null, indicating a contiguous input starting at element 0
        ///   - a valid pointer to an array of `2 * num_dims + 1` elements containing:
        ///     * dims[num_dims]: array dimensions
        ///     * strides[num_dims]: strides for the input array
        ///     * offset: first input element
        /// * `input` must be either:
        ///   - null, in which case `output` is updated in place (and must be contiguous)
        ///   - a valid pointer covering every index reachable through dims/strides/offset
        /// * `output` must be a valid pointer to an array of at least `num_els` elements
        /// * The memory regions of input (if not null) and output must not overlap
        /// * The alignment requirements of the type must be respected
        pub unsafe fn $name(
            num_els: usize,
            num_dims: usize,
            metadata: *const usize,
            input: *const $type,
            output: *mut $type,
            grain: usize,
        ) {
            let grain = grain.max(1);
            let output_slice = std::slice::from_raw_parts_mut(output, num_els);

            if input.is_null() {
                output_slice.par_iter_mut().with_min_len(grain).for_each(|out_val| {
                    *out_val = $func(*out_val);
                });
                return;
            }

            let (dims, strides, offset) = if metadata.is_null() {
                (None, None, 0)
            } else {
                let dims = std::slice::from_raw_parts(metadata, num_dims);
                let strides = std::slice::from_raw_parts(metadata.add(num_dims), num_dims);
                (Some(dims), Some(strides), *metadata.add(2 * num_dims))
            };

            let is_cont = match (dims, strides) {
                (Some(dims), Some(strides)) => is_contiguous(num_dims, dims, strides),
                _ => true,
            };

            let extent = match (dims, strides) {
                (Some(dims), Some(strides)) if !is_cont => strided_extent(num_dims, dims, strides),
                _ => num_els,
            };
            let input_slice = std::slice::from_raw_parts(input, offset + extent);

            output_slice
                .par_iter_mut()
                .with_min_len(grain)
                .enumerate()
                .for_each(|(i, out_val)| {
                    let idx = match (dims, strides) {
                        (Some(dims), Some(strides)) if !is_cont => offset + get_strided_index(i, num_dims, dims, strides),
                        _ => offset + i,
                    };

                    let x = input_slice[idx];
                    *out_val = $func(x);
                });
        }
    };
}

#[inline]
fn sign_f(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        // keeps 0.0, -0.0 and NaN as they are
        x
    }
}

#[inline]
fn sigmoid_f(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

unary_op!(floor_f32, f32, |x: f32| x.floor());
unary_op!(floor_f64, f64, |x: f64| x.floor());
unary_op!(floor_f16, f16, |x: f16| f16::from_f32(x.to_f32().floor()));
unary_op!(floor_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().floor()));

unary_op!(ceil_f32, f32, |x: f32| x.ceil());
unary_op!(ceil_f64, f64, |x: f64| x.ceil());
unary_op!(ceil_f16, f16, |x: f16| f16::from_f32(x.to_f32().ceil()));
unary_op!(ceil_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().ceil()));

unary_op!(sign_f32, f32, |x: f32| sign_f(x as f64) as f32);
unary_op!(sign_f64, f64, sign_f);
unary_op!(sign_f16, f16, |x: f16| f16::from_f64(sign_f(x.to_f64())));
unary_op!(sign_bf16, bf16, |x: bf16| bf16::from_f64(sign_f(x.to_f64())));
unary_op!(sign_i32, i32, |x: i32| x.signum());
unary_op!(sign_i64, i64, |x: i64| x.signum());

unary_op!(trunc_f32, f32, |x: f32| x.trunc());
unary_op!(trunc_f64, f64, |x: f64| x.trunc());
unary_op!(trunc_f16, f16, |x: f16| f16::from_f32(x.to_f32().trunc()));
unary_op!(trunc_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().trunc()));

unary_op!(abs_f32, f32, |x: f32| x.abs());
unary_op!(abs_f64, f64, |x: f64| x.abs());
unary_op!(abs_f16, f16, |x: f16| f16::from_f32(x.to_f32().abs()));
unary_op!(abs_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().abs()));
unary_op!(abs_i32, i32, |x: i32| x.wrapping_abs());
unary_op!(abs_i64, i64, |x: i64| x.wrapping_abs());

// Round half to even.
unary_op!(round_f32, f32, |x: f32| x.round_ties_even());
unary_op!(round_f64, f64, |x: f64| x.round_ties_even());
unary_op!(round_f16, f16, |x: f16| f16::from_f32(x.to_f32().round_ties_even()));
unary_op!(round_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().round_ties_even()));

unary_op!(exp_f32, f32, |x: f32| x.exp());
unary_op!(exp_f64, f64, |x: f64| x.exp());
unary_op!(exp_f16, f16, |x: f16| f16::from_f32(x.to_f32().exp()));
unary_op!(exp_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().exp()));

unary_op!(tanh_f32, f32, |x: f32| x.tanh());
unary_op!(tanh_f64, f64, |x: f64| x.tanh());
unary_op!(tanh_f16, f16, |x: f16| f16::from_f32(x.to_f32().tanh()));
unary_op!(tanh_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().tanh()));

unary_op!(sigmoid_f32, f32, |x: f32| 1.0 / (1.0 + (-x).exp()));
unary_op!(sigmoid_f64, f64, sigmoid_f);
unary_op!(sigmoid_f16, f16, |x: f16| f16::from_f64(sigmoid_f(x.to_f64())));
unary_op!(sigmoid_bf16, bf16, |x: bf16| bf16::from_f64(sigmoid_f(x.to_f64())));

unary_op!(log_f32, f32, |x: f32| x.ln());
unary_op!(log_f64, f64, |x: f64| x.ln());
unary_op!(log_f16, f16, |x: f16| f16::from_f32(x.to_f32().ln()));
unary_op!(log_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().ln()));

unary_op!(sqrt_f32, f32, |x: f32| x.sqrt());
unary_op!(sqrt_f64, f64, |x: f64| x.sqrt());
unary_op!(sqrt_f16, f16, |x: f16| f16::from_f32(x.to_f32().sqrt()));
unary_op!(sqrt_bf16, bf16, |x: bf16| bf16::from_f32(x.to_f32().sqrt()));

unary_op!(rsqrt_f32, f32, |x: f32| 1.0 / x.sqrt());
unary_op!(rsqrt_f64, f64, |x: f64| 1.0 / x.sqrt());
unary_op!(rsqrt_f16, f16, |x: f16| f16::from_f32(1.0 / x.to_f32().sqrt()));
unary_op!(rsqrt_bf16, bf16, |x: bf16| bf16::from_f32(1.0 / x.to_f32().sqrt()));

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn run_f32(f: unsafe fn(usize, usize, *const usize, *const f32, *mut f32, usize), input: &[f32]) -> Vec<f32> {
        let mut output = vec![0.0f32; input.len()];
        unsafe { f(input.len(), 0, ptr::null(), input.as_ptr(), output.as_mut_ptr(), 1) };
        output
    }

    #[test]
    fn rounding_family() {
        let x = [-2.5f32, -1.5, -0.4, 0.5, 1.5, 2.7];
        assert_eq!(run_f32(floor_f32, &x), vec![-3.0, -2.0, -1.0, 0.0, 1.0, 2.0]);
        assert_eq!(run_f32(ceil_f32, &x), vec![-2.0, -1.0, -0.0, 1.0, 2.0, 3.0]);
        assert_eq!(run_f32(trunc_f32, &x), vec![-2.0, -1.0, -0.0, 0.0, 1.0, 2.0]);
        assert_eq!(run_f32(round_f32, &x), vec![-2.0, -2.0, -0.0, 0.0, 2.0, 3.0]);
    }

    #[test]
    fn sign_and_abs() {
        let x = [-3.0f32, 0.0, 4.5];
        assert_eq!(run_f32(sign_f32, &x), vec![-1.0, 0.0, 1.0]);
        assert_eq!(run_f32(abs_f32, &x), vec![3.0, 0.0, 4.5]);
        assert!(run_f32(sign_f32, &[f32::NAN])[0].is_nan());

        let xi = [-7i32, 0, 9, i32::MIN];
        let mut out = [0i32; 4];
        unsafe { abs_i32(4, 0, ptr::null(), xi.as_ptr(), out.as_mut_ptr(), 1) };
        assert_eq!(out, [7, 0, 9, i32::MIN]);
        unsafe { sign_i32(4, 0, ptr::null(), xi.as_ptr(), out.as_mut_ptr(), 1) };
        assert_eq!(out, [-1, 0, 1, -1]);
    }

    #[test]
    fn transcendental() {
        let x = [0.0f32, 1.0, 4.0];
        let sig = run_f32(sigmoid_f32, &x);
        assert!((sig[0] - 0.5).abs() < 1e-7);
        assert_eq!(run_f32(sqrt_f32, &x), vec![0.0, 1.0, 2.0]);
        assert_eq!(run_f32(rsqrt_f32, &[4.0, 0.25]), vec![0.5, 2.0]);
        assert_eq!(run_f32(rsqrt_f32, &[0.0])[0], f32::INFINITY);
        assert_eq!(run_f32(log_f32, &[1.0])[0], 0.0);
        assert!((run_f32(exp_f32, &[1.0])[0] - std::f32::consts::E).abs() < 1e-6);
    }

    #[test]
    fn strided_input() {
        // logical (3, 2) transposed view of row-major [[0, 1, 2], [3, 4, 5]] - 0.5
        let input = [-0.5f32, 0.5, 1.5, 2.5, 3.5, 4.5];
        let metadata = [3usize, 2, 1, 3, 0];
        let mut output = [0.0f32; 6];
        unsafe { floor_f32(6, 2, metadata.as_ptr(), input.as_ptr(), output.as_mut_ptr(), 2) };
        assert_eq!(output, [-1.0, 2.0, 0.0, 3.0, 1.0, 4.0]);
    }

    #[test]
    fn offset_input() {
        let input = [9.0f32, 9.0, 1.2, 2.8];
        let metadata = [2usize, 1, 2];
        let mut output = [0.0f32; 2];
        unsafe { floor_f32(2, 1, metadata.as_ptr(), input.as_ptr(), output.as_mut_ptr(), 1) };
        assert_eq!(output, [1.0, 2.0]);
    }

    #[test]
    fn in_place_chain() {
        let mut data = vec![-1.7f32, 2.2, 0.4];
        unsafe { floor_f32(3, 0, ptr::null(), ptr::null(), data.as_mut_ptr(), 1) };
        assert_eq!(data, vec![-2.0, 2.0, 0.0]);
        unsafe { abs_f32(3, 0, ptr::null(), ptr::null(), data.as_mut_ptr(), 1) };
        assert_eq!(data, vec![2.0, 2.0, 0.0]);
    }

    #[test]
    fn half_precision() {
        let input = [f16::from_f32(2.5), f16::from_f32(-0.75)];
        let mut output = [f16::ZERO; 2];
        unsafe { round_f16(2, 0, ptr::null(), input.as_ptr(), output.as_mut_ptr(), 1) };
        assert_eq!(output[0].to_f32(), 2.0);
        assert_eq!(output[1].to_f32(), -1.0);

        let input = [bf16::from_f32(16.0)];
        let mut output = [bf16::ZERO; 1];
        unsafe { sqrt_bf16(1, 0, ptr::null(), input.as_ptr(), output.as_mut_ptr(), 1) };
        assert_eq!(output[0].to_f32(), 4.0);
    }
}
