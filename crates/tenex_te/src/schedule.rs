//! Per-target execution plans for computation graphs.
//!
//! A [`Schedule`] holds one [`Stage`] per compute tensor. A stage is either
//! attached at the root (it gets its own loop nest and buffer) or inlined
//! into its consumer. Root stages describe their loop nest with a small set
//! of primitives: fusing every axis into one, splitting the fused axis, and
//! giving each resulting loop a kind (serial, parallel, vectorized, or bound
//! to a GPU thread axis).

use crate::{Tensor, TensorId};
use std::fmt;
use tenex_core::{
    device::{get_current_target, Target},
    error::{Error, Result},
};

/// Inner tile on CPU targets: the vectorized loop length and rayon chunk size.
pub const CPU_INNER_TILE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThreadAxis {
    BlockIdxX,
    ThreadIdxX,
}

impl ThreadAxis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockIdxX => "blockIdx.x",
            Self::ThreadIdxX => "threadIdx.x",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForKind {
    Serial,
    Parallel,
    Vectorized,
    ThreadBinding(ThreadAxis),
}

impl fmt::Display for ForKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial => f.write_str("for"),
            Self::Parallel => f.write_str("parallel"),
            Self::Vectorized => f.write_str("vectorized"),
            Self::ThreadBinding(axis) => write!(f, "launch {}", axis.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attach {
    Root,
    Inline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split {
    pub factor: usize,
    pub outer: ForKind,
    pub inner: ForKind,
}

#[derive(Debug, Clone)]
pub struct Stage {
    tensor: Tensor,
    attach: Attach,
    fused: bool,
    outer: ForKind,
    split: Option<Split>,
    is_output: bool,
}

impl Stage {
    fn new(tensor: Tensor, is_output: bool) -> Self {
        Self {
            tensor,
            attach: Attach::Root,
            fused: false,
            outer: ForKind::Serial,
            split: None,
            is_output,
        }
    }

    pub fn tensor(&self) -> &Tensor {
        &self.tensor
    }
    pub fn attach(&self) -> Attach {
        self.attach
    }
    pub fn is_fused(&self) -> bool {
        self.fused
    }
    /// Kind of the outermost loop.
    pub fn outer(&self) -> ForKind {
        self.split.map_or(self.outer, |s| s.outer)
    }
    pub fn split_info(&self) -> Option<Split> {
        self.split
    }
    pub fn is_output(&self) -> bool {
        self.is_output
    }

    fn ensure_root(&self, what: &str) -> Result<()> {
        if self.attach == Attach::Inline {
            return Err(Error::InvalidSchedule(format!(
                "cannot {} inlined stage '{}'",
                what,
                self.tensor.name()
            )));
        }
        Ok(())
    }

    /// Fuses all axes into one.
    pub fn fuse(&mut self) -> Result<&mut Self> {
        self.ensure_root("fuse")?;
        if self.split.is_some() {
            return Err(Error::InvalidSchedule(format!(
                "stage '{}' is already split; fuse before splitting",
                self.tensor.name()
            )));
        }
        self.fused = true;
        Ok(self)
    }

    /// Marks the outermost loop parallel.
    pub fn parallel(&mut self) -> Result<&mut Self> {
        self.ensure_root("parallelize")?;
        match &mut self.split {
            Some(split) => split.outer = ForKind::Parallel,
            None => self.outer = ForKind::Parallel,
        }
        Ok(self)
    }

    /// Splits the fused axis into `outer x factor`. The outer loop keeps the
    /// kind the fused loop had.
    pub fn split(&mut self, factor: usize, inner: ForKind) -> Result<&mut Self> {
        self.ensure_root("split")?;
        if !self.fused {
            return Err(Error::InvalidSchedule(format!(
                "stage '{}' must be fused before it can be split",
                self.tensor.name()
            )));
        }
        if factor == 0 {
            return Err(Error::InvalidSchedule("split factor must be positive".into()));
        }
        if self.split.is_some() {
            return Err(Error::InvalidSchedule(format!("stage '{}' is already split", self.tensor.name())));
        }
        self.split = Some(Split {
            factor,
            outer: self.outer,
            inner,
        });
        Ok(self)
    }

    /// Binds the split loops to GPU block and thread axes.
    pub fn bind(&mut self, block: ThreadAxis, thread: ThreadAxis) -> Result<&mut Self> {
        self.ensure_root("bind")?;
        let Some(split) = &mut self.split else {
            return Err(Error::InvalidSchedule(format!(
                "stage '{}' must be split before binding thread axes",
                self.tensor.name()
            )));
        };
        if block == thread {
            return Err(Error::InvalidSchedule(format!("both loops bound to {}", block.as_str())));
        }
        split.outer = ForKind::ThreadBinding(block);
        split.inner = ForKind::ThreadBinding(thread);
        Ok(self)
    }

    /// Computes this stage inside its consumer's loop instead of materializing it.
    pub fn compute_inline(&mut self) -> Result<&mut Self> {
        if self.is_output {
            return Err(Error::InvalidSchedule(format!(
                "cannot inline output stage '{}'",
                self.tensor.name()
            )));
        }
        if self.fused || self.split.is_some() || self.outer != ForKind::Serial {
            return Err(Error::InvalidSchedule(format!(
                "stage '{}' already has a loop nest",
                self.tensor.name()
            )));
        }
        self.attach = Attach::Inline;
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct Schedule {
    outputs: Vec<Tensor>,
    stages: Vec<Stage>,
}

impl Schedule {
    pub fn outputs(&self) -> &[Tensor] {
        &self.outputs
    }

    /// Stages in producer-first order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    fn position(&self, id: TensorId) -> Option<usize> {
        self.stages.iter().position(|s| s.tensor.id() == id)
    }

    pub fn stage(&self, tensor: &Tensor) -> Result<&Stage> {
        let idx = self.position(tensor.id()).ok_or_else(|| not_scheduled(tensor))?;
        Ok(&self.stages[idx])
    }

    pub fn stage_mut(&mut self, tensor: &Tensor) -> Result<&mut Stage> {
        let idx = self.position(tensor.id()).ok_or_else(|| not_scheduled(tensor))?;
        Ok(&mut self.stages[idx])
    }

    /// Inlines every injective stage that is not an output.
    pub fn auto_inline_injective(&mut self) {
        for stage in self.stages.iter_mut() {
            if !stage.is_output && stage.tensor.op().is_injective() && stage.attach == Attach::Root {
                stage.attach = Attach::Inline;
            }
        }
    }
}

fn not_scheduled(tensor: &Tensor) -> Error {
    Error::InvalidSchedule(format!("tensor '{}' has no stage in this schedule", tensor.name()))
}

/// One root stage per compute tensor reachable from `outs`, default loops.
pub fn create_schedule(outs: &[Tensor]) -> Result<Schedule> {
    if outs.is_empty() {
        return Err(Error::InvalidSchedule("a schedule needs at least one output".into()));
    }
    if let Some(p) = outs.iter().find(|t| t.is_placeholder()) {
        return Err(Error::InvalidSchedule(format!(
            "placeholder '{}' cannot be a schedule output",
            p.name()
        )));
    }

    let mut stages: Vec<Stage> = Vec::new();
    for out in outs {
        // collect the chain of producers, then append the ones not seen yet producer-first
        let mut chain = Vec::new();
        let mut current = Some(out);
        while let Some(t) = current {
            if t.is_placeholder() {
                break;
            }
            chain.push(t.clone());
            current = t.input();
        }
        for t in chain.into_iter().rev() {
            if !stages.iter().any(|s| s.tensor.id() == t.id()) {
                stages.push(Stage::new(t, false));
            }
        }
    }
    for stage in stages.iter_mut() {
        stage.is_output = outs.iter().any(|o| o.id() == stage.tensor.id());
    }

    Ok(Schedule {
        outputs: outs.to_vec(),
        stages,
    })
}

/// Injective schedule for the current target (see [`tenex_core::device::TargetGuard`]).
pub fn schedule_injective(outs: &[Tensor]) -> Result<Schedule> {
    let target = get_current_target().ok_or(Error::NoTarget)?;
    schedule_injective_for(target, outs)
}

pub fn schedule_injective_for(target: Target, outs: &[Tensor]) -> Result<Schedule> {
    let mut s = create_schedule(outs)?;
    s.auto_inline_injective();

    for out in outs {
        let stage = s.stage_mut(out)?;
        stage.fuse()?;
        if target.is_gpu() {
            stage
                .split(target.max_num_threads(), ForKind::Serial)?
                .bind(ThreadAxis::BlockIdxX, ThreadAxis::ThreadIdxX)?;
        } else {
            stage.parallel()?.split(CPU_INNER_TILE, ForKind::Vectorized)?;
        }
    }

    Ok(s)
}
