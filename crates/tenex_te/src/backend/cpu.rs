use super::{Backend, Kernel};
use crate::{schedule::ForKind, LoopPlan, LoweredFunc, NDArray, Pass, Slot, UnaryOp};
use std::sync::Arc;
use tenex_core::{
    be::ops::unary,
    buffer::{Buffer, BufferManager},
    device::{Device, DeviceKind, Target},
    dtype::DType,
    error::{Error, Result},
};

/// Host backend for the `llvm` target. Loop nests run on the rayon pool.
pub struct CpuBackend;

impl Backend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn targets(&self) -> &[Target] {
        &[Target::Llvm]
    }

    fn device_kind(&self) -> DeviceKind {
        DeviceKind::Cpu
    }

    fn device_count(&self) -> usize {
        1
    }

    fn alloc(&self, size: usize, dtype: DType, device: Device) -> Result<Box<dyn Buffer>> {
        if device.kind != DeviceKind::Cpu || device.id >= self.device_count() {
            return Err(Error::InvalidDevice(format!("cpu backend cannot allocate on {}", device)));
        }
        BufferManager::create(size, device, dtype)
    }

    fn compile(&self, func: &LoweredFunc, target: Target) -> Result<Arc<dyn Kernel>> {
        if !self.targets().contains(&target) {
            return Err(Error::InvalidTarget(format!("cpu backend does not generate code for {}", target)));
        }
        if let Some(pass) = func.passes().iter().find(|p| p.loops.is_thread_bound()) {
            return Err(Error::InvalidSchedule(format!(
                "'{}' binds GPU thread axes, which {} cannot launch",
                pass.name, target
            )));
        }
        for pass in func.passes() {
            if let Slot::Temp(n) = pass.dst {
                if n >= func.temps().len() {
                    return Err(Error::Internal {
                        message: format!("pass '{}' writes to undeclared temporary {}", pass.name, n),
                    });
                }
            }
        }

        tracing::trace!(func = func.name(), passes = func.passes().len(), "compiled cpu kernel");
        Ok(Arc::new(CpuKernel {
            passes: func.passes().to_vec(),
            temps: func.temps().iter().map(|t| t.dtype).collect(),
        }))
    }
}

struct CpuKernel {
    passes: Vec<Pass>,
    temps: Vec<DType>,
}

impl Kernel for CpuKernel {
    fn launch(&self, inputs: &[&NDArray], output: &mut NDArray, num_els: usize) -> Result<()> {
        // the chain is linear, so a temporary is read only by the pass right after it
        let mut prev_temp: Option<Box<dyn Buffer>> = None;
        let device = output.context().device();

        for pass in &self.passes {
            let mut fresh = match pass.dst {
                Slot::Temp(n) => Some(BufferManager::create(num_els, device, self.temps[n])?),
                Slot::Output => None,
                Slot::Input(_) => {
                    return Err(Error::Internal {
                        message: format!("pass '{}' writes to an input", pass.name),
                    })
                }
            };

            {
                let (src, metadata) = match pass.src {
                    Slot::Input(n) => {
                        let array = inputs.get(n).ok_or_else(|| Error::Internal {
                            message: format!("pass '{}' reads missing input {}", pass.name, n),
                        })?;
                        let layout = array.layout();
                        let metadata = (!layout.is_contiguous()).then(|| layout.metadata());
                        (array.buffer(), metadata)
                    }
                    Slot::Temp(_) => {
                        let temp = prev_temp.as_deref().ok_or_else(|| Error::Internal {
                            message: format!("pass '{}' reads a temporary that was never written", pass.name),
                        })?;
                        (temp, None)
                    }
                    Slot::Output => {
                        return Err(Error::Internal {
                            message: format!("pass '{}' reads the output", pass.name),
                        })
                    }
                };
                let dst: &mut dyn Buffer = match fresh.as_deref_mut() {
                    Some(temp) => temp,
                    None => output.buffer_mut(),
                };
                run_pass(pass, dst, src, metadata.as_deref(), num_els)?;
            }

            if fresh.is_some() {
                prev_temp = fresh.take();
            }
        }

        Ok(())
    }
}

fn run_pass(pass: &Pass, dst: &mut dyn Buffer, src: &dyn Buffer, metadata: Option<&[usize]>, num_els: usize) -> Result<()> {
    let grain = pass.loops.grain(num_els);
    let num_dims = metadata.map_or(0, |m| (m.len() - 1) / 2);

    for (i, &op) in pass.ops.iter().enumerate() {
        // first op reads the source, the rest update the destination in place
        unsafe {
            if i == 0 {
                dispatch(op, dst, Some(src), num_els, num_dims, metadata, grain)?;
            } else {
                dispatch(op, dst, None, num_els, 0, None, grain)?;
            }
        }
    }

    tracing::trace!(pass = %pass.name, ops = pass.ops.len(), grain, vectorized = is_vectorized(&pass.loops), "ran pass");
    Ok(())
}

fn is_vectorized(loops: &LoopPlan) -> bool {
    loops.split.is_some_and(|s| s.inner == ForKind::Vectorized)
}

type UnaryFn = unsafe fn(&mut dyn Buffer, Option<&dyn Buffer>, usize, usize, Option<&[usize]>, usize) -> Result<()>;

/// # Safety
/// `input` and `output` must not share memory.
unsafe fn dispatch(
    op: UnaryOp,
    output: &mut dyn Buffer,
    input: Option<&dyn Buffer>,
    num_els: usize,
    num_dims: usize,
    metadata: Option<&[usize]>,
    grain: usize,
) -> Result<()> {
    let kernel: UnaryFn = match op {
        UnaryOp::Floor => unary::floor,
        UnaryOp::Ceil => unary::ceil,
        UnaryOp::Sign => unary::sign,
        UnaryOp::Trunc => unary::trunc,
        UnaryOp::Abs => unary::abs,
        UnaryOp::Round => unary::round,
        UnaryOp::Exp => unary::exp,
        UnaryOp::Tanh => unary::tanh,
        UnaryOp::Sigmoid => unary::sigmoid,
        UnaryOp::Log => unary::log,
        UnaryOp::Sqrt => unary::sqrt,
        UnaryOp::Rsqrt => unary::rsqrt,
    };
    kernel(output, input, num_els, num_dims, metadata, grain)
}
