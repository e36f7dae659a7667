pub use crate::{
    build, context, create_schedule, placeholder, schedule_injective, var, Context, DType, Error, Expr, NDArray, Result,
    Target, TargetGuard, Tensor, UnaryOp,
};
