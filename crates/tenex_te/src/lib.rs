pub mod backend;
mod build;
pub mod context;
mod lower;
mod ndarray;
pub mod ops;
pub mod schedule;
pub mod util;

pub use build::{build, Module};
pub use context::{context, Context};
pub use lower::{lower, LoopPlan, LoweredFunc, Param, ParamRole, Pass, Slot, TempBuffer};
pub use ndarray::NDArray;
pub use ops::unary::UnaryOp;
pub use schedule::{create_schedule, schedule_injective, schedule_injective_for, Schedule};

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use tenex_core::{
    dtype::{get_default_dtype, DType},
    error::{Error, Result},
    expr::{format_shape, Expr},
};

// ────────────────────────────────────────────────────────────────────────────
//  Tensor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TensorId(usize);
static TENSOR_COUNTER: AtomicUsize = AtomicUsize::new(1);
#[inline]
fn next_tensor_id() -> TensorId {
    TensorId(TENSOR_COUNTER.fetch_add(1, Ordering::Relaxed))
}

#[derive(Clone, Debug)]
pub enum Operation {
    Placeholder,
    Compute { kind: UnaryOp, input: Tensor },
}

impl Operation {
    /// The identity string of the operator that produced this tensor.
    pub fn canonical_name(&self) -> Option<&'static str> {
        match self {
            Self::Placeholder => None,
            Self::Compute { kind, .. } => Some(kind.canonical_name()),
        }
    }

    pub fn kind(&self) -> Option<UnaryOp> {
        match self {
            Self::Placeholder => None,
            Self::Compute { kind, .. } => Some(*kind),
        }
    }

    /// Every output element depends on exactly one input element at the same index.
    pub fn is_injective(&self) -> bool {
        matches!(self, Self::Compute { .. })
    }
}

struct TensorInner {
    id: TensorId,
    name: String,
    shape: Vec<Expr>,
    dtype: DType,
    op: Operation,
}

/// A symbolic tensor: either a placeholder or the result of an operator.
/// Cloning is cheap and keeps identity.
#[derive(Clone)]
pub struct Tensor(Arc<TensorInner>);

impl Tensor {
    pub fn id(&self) -> TensorId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn shape(&self) -> &[Expr] {
        &self.0.shape
    }

    pub fn ndim(&self) -> usize {
        self.0.shape.len()
    }

    pub fn dtype(&self) -> DType {
        self.0.dtype
    }

    pub fn op(&self) -> &Operation {
        &self.0.op
    }

    pub fn input(&self) -> Option<&Tensor> {
        match &self.0.op {
            Operation::Placeholder => None,
            Operation::Compute { input, .. } => Some(input),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.0.op, Operation::Placeholder)
    }

    /// Walks producers back to the placeholder this tensor is computed from.
    pub fn source(&self) -> &Tensor {
        let mut current = self;
        while let Some(input) = current.input() {
            current = input;
        }
        current
    }

    pub(crate) fn compute(kind: UnaryOp, input: &Tensor) -> Self {
        Self(Arc::new(TensorInner {
            id: next_tensor_id(),
            name: format!("T_{}", kind.canonical_name()),
            shape: input.shape().to_vec(),
            dtype: input.dtype(),
            op: Operation::Compute {
                kind,
                input: input.clone(),
            },
        }))
    }
}

impl PartialEq for Tensor {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Tensor {}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tensor({}: {}{}", self.name(), self.dtype(), format_shape(self.shape()))?;
        if let Some(name) = self.op().canonical_name() {
            write!(f, " = {}", name)?;
        }
        write!(f, ")")
    }
}

pub fn placeholder<E: Into<Expr>>(shape: impl IntoIterator<Item = E>, name: &str) -> Result<Tensor> {
    placeholder_with_dtype(shape, name, get_default_dtype())
}

pub fn placeholder_with_dtype<E: Into<Expr>>(shape: impl IntoIterator<Item = E>, name: &str, dtype: DType) -> Result<Tensor> {
    if name.is_empty() {
        return Err(Error::InvalidArgument("placeholder name must not be empty".into()));
    }

    let shape: Vec<Expr> = shape.into_iter().map(Into::into).collect();
    if let Some(bad) = shape.iter().find(|e| e.as_const().is_some_and(|v| v < 0)) {
        return Err(Error::InvalidShape {
            message: format!("negative dimension {} in placeholder '{}'", bad, name),
        });
    }

    Ok(Tensor(Arc::new(TensorInner {
        id: next_tensor_id(),
        name: name.to_string(),
        shape,
        dtype,
        op: Operation::Placeholder,
    })))
}
