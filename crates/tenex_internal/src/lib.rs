pub mod prelude;

pub use tenex_core as core;
pub use tenex_te as te;
pub use tenex_testing as testing;

pub use tenex_core::dtype::{bfloat16, float16, float32, float64, half, int32, int64};
pub use crate::core::{
    device::{get_current_target, Device, DeviceKind, Target, TargetGuard},
    dtype::*,
    error::{Error, Result},
    expr::{var, Expr, Var},
};
pub use crate::te::{
    build, context, create_schedule, placeholder, placeholder_with_dtype, schedule_injective, Context, Module, NDArray,
    Tensor, UnaryOp,
};
