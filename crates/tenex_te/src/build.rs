use crate::{
    backend::{backend_for_target, Kernel},
    lower, LoweredFunc, NDArray, ParamRole, Schedule, Tensor,
};
use std::{fmt, sync::Arc};
use tenex_core::{
    device::{DeviceKind, Target},
    error::{Error, Result},
    expr::{format_shape, Bindings, Expr},
};

/// A compiled function bound to one target.
#[derive(Clone)]
pub struct Module {
    func: Arc<LoweredFunc>,
    kernel: Arc<dyn Kernel>,
    target: Target,
    device_kind: DeviceKind,
}

/// Lowers `schedule` with calling convention `args` and compiles it for `target`.
pub fn build(schedule: &Schedule, args: &[Tensor], target: Target, name: &str) -> Result<Module> {
    let backend = backend_for_target(target).ok_or(Error::TargetUnavailable(target))?;

    let func = lower(schedule, args, name)?;
    tracing::debug!(%target, backend = backend.name(), "lowered {}:\n{}", name, func);

    let kernel = backend.compile(&func, target)?;
    Ok(Module {
        func: Arc::new(func),
        kernel,
        target,
        device_kind: backend.device_kind(),
    })
}

impl Module {
    pub fn entry_name(&self) -> &str {
        self.func.name()
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn lowered(&self) -> &LoweredFunc {
        &self.func
    }

    /// Runs the function. `args` follow the order given to [`build`].
    pub fn call(&self, args: &mut [&mut NDArray]) -> Result<()> {
        let params = self.func.params();
        if args.len() != params.len() {
            return Err(Error::InvalidArgument(format!(
                "{} expects {} arguments, got {}",
                self.entry_name(),
                params.len(),
                args.len()
            )));
        }

        let mut bindings = Bindings::new();
        for (param, arg) in params.iter().zip(args.iter()) {
            if arg.dtype() != param.dtype {
                return Err(Error::DTypeMismatch {
                    expected: param.dtype,
                    got: arg.dtype(),
                });
            }
            if arg.context().kind() != self.device_kind {
                return Err(Error::InvalidDevice(format!(
                    "argument '{}' lives on {}, {} runs on {}",
                    param.name,
                    arg.context(),
                    self.target,
                    self.device_kind.as_str()
                )));
            }
            if arg.ndim() != param.shape.len() {
                return Err(Error::ShapeMismatch {
                    expected: format_shape(&param.shape),
                    got: format!("{:?}", arg.shape()),
                    msg: format!("rank of argument '{}'", param.name),
                });
            }
            if param.role == ParamRole::Output && !arg.is_contiguous() {
                return Err(Error::InvalidArgument(format!("output '{}' must be contiguous", param.name)));
            }
            bind_shape(&param.shape, arg.shape(), &mut bindings)?;
        }

        let num_els = self
            .func
            .output_shape()
            .iter()
            .map(|e| e.evaluate(&bindings).map(|v| v as usize))
            .product::<Result<usize>>()?;

        let (inputs, outputs): (Vec<_>, Vec<_>) = params
            .iter()
            .zip(args.iter_mut())
            .partition(|(param, _)| param.role == ParamRole::Input);
        let inputs: Vec<&NDArray> = inputs.into_iter().map(|(_, a)| &**a).collect();
        let Some((_, output)) = outputs.into_iter().next() else {
            return Err(Error::Internal {
                message: format!("{} has no output parameter", self.entry_name()),
            });
        };

        tracing::trace!(func = self.entry_name(), target = %self.target, num_els, "launch");
        self.kernel.launch(&inputs, output, num_els)
    }
}

fn bind_shape(shape: &[Expr], actual: &[usize], bindings: &mut Bindings) -> Result<()> {
    for (dim, &extent) in shape.iter().zip(actual) {
        match dim {
            Expr::Var(v) => bindings.bind(v, extent as i64)?,
            Expr::Int { value, .. } => {
                if *value != extent as i64 {
                    // symbolic dims take whatever was passed
                    let expected = shape
                        .iter()
                        .zip(actual)
                        .map(|(e, &a)| e.as_const().map_or(a, |v| v as usize))
                        .collect();
                    return Err(Error::DimensionMismatch {
                        expected,
                        got: actual.to_vec(),
                    });
                }
            }
        }
    }
    Ok(())
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("entry", &self.entry_name())
            .field("target", &self.target)
            .finish()
    }
}
