#![allow(unreachable_patterns)]

use crate::{
    buffer::Buffer,
    device::DeviceKind,
    dtype::DType,
    error::{Error, Result},
};
use half::{bf16, f16};
use std::ptr;
use tenex_cpu::{ops::unary::*, utils::strided_extent};

fn validate(
    op: &str,
    output: &dyn Buffer,
    input: Option<&dyn Buffer>,
    num_els: usize,
    num_dims: usize,
    metadata: Option<&[usize]>,
) -> Result<()> {
    if output.len() < num_els {
        return Err(Error::InvalidArgument(format!(
            "{}: output holds {} elements, {} requested",
            op,
            output.len(),
            num_els
        )));
    }

    let Some(input) = input else {
        if metadata.is_some() {
            return Err(Error::InvalidArgument(format!("{}: in-place update cannot be strided", op)));
        }
        return Ok(());
    };

    if input.dtype() != output.dtype() {
        return Err(Error::DTypeMismatch {
            expected: output.dtype(),
            got: input.dtype(),
        });
    }
    if input.device() != output.device() {
        return Err(Error::DeviceMismatch {
            expected: output.device(),
            got: input.device(),
        });
    }

    let required = match metadata {
        Some(metadata) => {
            if metadata.len() != 2 * num_dims + 1 {
                return Err(Error::InvalidArgument(format!(
                    "{}: metadata for {} dims must hold {} entries, got {}",
                    op,
                    num_dims,
                    2 * num_dims + 1,
                    metadata.len()
                )));
            }
            let (dims, rest) = metadata.split_at(num_dims);
            let (strides, offset) = rest.split_at(num_dims);
            if dims.iter().product::<usize>() != num_els {
                return Err(Error::InvalidArgument(format!("{}: dims {:?} do not cover {} elements", op, dims, num_els)));
            }
            offset[0] + strided_extent(num_dims, dims, strides)
        }
        None => num_els,
    };
    if input.len() < required {
        return Err(Error::InvalidArgument(format!(
            "{}: input holds {} elements, {} required",
            op,
            input.len(),
            required
        )));
    }

    Ok(())
}

#[macro_export]
macro_rules! declare_unary_op {
    ($name:ident, [$($dtype:ident),* $(,)?]) => {
        paste::paste! {
            /// Runs the kernel matching the output buffer's device and dtype.
            ///
            /// `input = None` updates `output` in place.
            ///
            /// # Safety
            /// This function is unsafe because it performs raw pointer operations.
            /// `input` and `output` must not share memory.
            pub unsafe fn $name(
                output: &mut dyn Buffer,
                input: Option<&dyn Buffer>,
                num_els: usize,
                num_dims: usize,
                metadata: Option<&[usize]>,
                grain: usize,
            ) -> Result<()> {
                validate(stringify!($name), output, input, num_els, num_dims, metadata)?;

                let device = output.device();
                match device.kind {
                    DeviceKind::Cpu => {
                        let metadata = metadata.map_or(ptr::null(), |m| m.as_ptr());
                        let input = input.map_or(ptr::null(), |b| b.as_ptr());
                        match output.dtype() {
                            $(
                                DType::$dtype => {
                                    [<$name _ $dtype:lower>](
                                        num_els,
                                        num_dims,
                                        metadata,
                                        input as *const [<$dtype:lower>],
                                        output.as_mut_ptr() as *mut [<$dtype:lower>],
                                        grain,
                                    )
                                }
                            )*
                            dtype => return Err(Error::UnsupportedDType { op: stringify!($name).to_string(), dtype }),
                        }
                    }
                    _ => return Err(Error::UnsupportedDevice(device)),
                }

                Ok(())
            }
        }
    };
}

declare_unary_op!(floor, [F32, F64, F16, BF16]);
declare_unary_op!(ceil, [F32, F64, F16, BF16]);
declare_unary_op!(sign, [F32, F64, F16, BF16, I32, I64]);
declare_unary_op!(trunc, [F32, F64, F16, BF16]);
declare_unary_op!(abs, [F32, F64, F16, BF16, I32, I64]);
declare_unary_op!(round, [F32, F64, F16, BF16]);
declare_unary_op!(exp, [F32, F64, F16, BF16]);
declare_unary_op!(tanh, [F32, F64, F16, BF16]);
declare_unary_op!(sigmoid, [F32, F64, F16, BF16]);
declare_unary_op!(log, [F32, F64, F16, BF16]);
declare_unary_op!(sqrt, [F32, F64, F16, BF16]);
declare_unary_op!(rsqrt, [F32, F64, F16, BF16]);
