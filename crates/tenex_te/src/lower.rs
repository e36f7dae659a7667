use crate::{
    schedule::{Attach, ForKind, Schedule, Split, Stage},
    Tensor, UnaryOp,
};
use std::fmt;
use tenex_core::{
    dtype::DType,
    error::{Error, Result},
    expr::{format_shape, Expr},
};

/// rayon chunk length for parallel loops the schedule did not split.
pub const DEFAULT_PARALLEL_GRAIN: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    Input,
    Output,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub shape: Vec<Expr>,
    pub dtype: DType,
    pub role: ParamRole,
}

/// Where a pass reads from or writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The n-th input parameter (counting inputs only).
    Input(usize),
    Output,
    Temp(usize),
}

#[derive(Debug, Clone)]
pub struct TempBuffer {
    pub name: String,
    pub dtype: DType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPlan {
    pub fused: bool,
    pub outer: ForKind,
    pub split: Option<Split>,
}

impl LoopPlan {
    fn from_stage(stage: &Stage) -> Self {
        Self {
            fused: stage.is_fused(),
            outer: stage.outer(),
            split: stage.split_info(),
        }
    }

    pub fn is_thread_bound(&self) -> bool {
        let bound = |k: ForKind| matches!(k, ForKind::ThreadBinding(_));
        bound(self.outer) || self.split.is_some_and(|s| bound(s.outer) || bound(s.inner))
    }

    /// Minimum number of consecutive elements one worker handles.
    pub fn grain(&self, num_els: usize) -> usize {
        match (self.outer, self.split) {
            (ForKind::Parallel, Some(split)) => split.factor,
            (ForKind::Parallel, None) => DEFAULT_PARALLEL_GRAIN,
            _ => num_els.max(1),
        }
    }
}

/// One loop nest. Applies `ops` in order to every element of `src` and
/// stores into `dst`.
#[derive(Debug, Clone)]
pub struct Pass {
    pub name: String,
    pub ops: Vec<UnaryOp>,
    pub src: Slot,
    pub dst: Slot,
    pub loops: LoopPlan,
}

#[derive(Debug, Clone)]
pub struct LoweredFunc {
    name: String,
    params: Vec<Param>,
    temps: Vec<TempBuffer>,
    passes: Vec<Pass>,
    output_shape: Vec<Expr>,
}

impl LoweredFunc {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn params(&self) -> &[Param] {
        &self.params
    }
    pub fn temps(&self) -> &[TempBuffer] {
        &self.temps
    }
    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }
    pub fn output_shape(&self) -> &[Expr] {
        &self.output_shape
    }
    pub fn num_inputs(&self) -> usize {
        self.params.iter().filter(|p| p.role == ParamRole::Input).count()
    }

    fn slot_name(&self, slot: Slot) -> &str {
        match slot {
            Slot::Input(n) => self
                .params
                .iter()
                .filter(|p| p.role == ParamRole::Input)
                .nth(n)
                .map_or("?", |p| p.name.as_str()),
            Slot::Output => self
                .params
                .iter()
                .find(|p| p.role == ParamRole::Output)
                .map_or("?", |p| p.name.as_str()),
            Slot::Temp(n) => self.temps.get(n).map_or("?", |t| t.name.as_str()),
        }
    }
}

/// Turns a schedule into a flat list of passes over the arguments in `args`.
///
/// `args` fixes the calling convention: placeholders become inputs and the
/// single scheduled output becomes the output parameter.
pub fn lower(schedule: &Schedule, args: &[Tensor], name: &str) -> Result<LoweredFunc> {
    if args.is_empty() {
        return Err(Error::InvalidArgument("lower needs at least one argument".into()));
    }
    if name.is_empty() {
        return Err(Error::InvalidArgument("function name must not be empty".into()));
    }
    for (i, a) in args.iter().enumerate() {
        if args[..i].iter().any(|b| b.id() == a.id()) {
            return Err(Error::InvalidArgument(format!("tensor '{}' passed twice", a.name())));
        }
        if args[..i].iter().any(|b| b.name() == a.name()) {
            return Err(Error::InvalidArgument(format!("two arguments named '{}'", a.name())));
        }
    }

    let mut outputs = args.iter().filter(|a| !a.is_placeholder());
    let output = outputs
        .next()
        .ok_or_else(|| Error::InvalidArgument("no output tensor among the arguments".into()))?;
    if let Some(extra) = outputs.next() {
        return Err(Error::InvalidArgument(format!(
            "only one output per function is supported; got '{}' and '{}'",
            output.name(),
            extra.name()
        )));
    }
    if !schedule.outputs().iter().any(|o| o.id() == output.id()) {
        return Err(Error::InvalidSchedule(format!(
            "'{}' is not an output of this schedule",
            output.name()
        )));
    }

    let source = output.source();
    let input_index = args
        .iter()
        .filter(|a| a.is_placeholder())
        .position(|a| a.id() == source.id())
        .ok_or_else(|| {
            Error::InvalidArgument(format!(
                "'{}' depends on placeholder '{}', which is not an argument",
                output.name(),
                source.name()
            ))
        })?;

    // producer-first chain of compute tensors ending at the output
    let mut chain = Vec::new();
    let mut current = output;
    while let Some(input) = current.input() {
        chain.push(current.clone());
        current = input;
    }
    chain.reverse();

    let mut temps = Vec::new();
    let mut passes = Vec::new();
    let mut pending: Vec<UnaryOp> = Vec::new();
    let mut src = Slot::Input(input_index);
    for tensor in &chain {
        let stage = schedule.stage(tensor)?;
        let kind = tensor
            .op()
            .kind()
            .ok_or_else(|| Error::Internal {
                message: format!("'{}' in compute chain has no operator", tensor.name()),
            })?;
        pending.push(kind);

        if stage.attach() == Attach::Inline {
            continue;
        }

        let dst = if tensor.id() == output.id() {
            Slot::Output
        } else {
            temps.push(TempBuffer {
                name: tensor.name().to_string(),
                dtype: tensor.dtype(),
            });
            Slot::Temp(temps.len() - 1)
        };
        passes.push(Pass {
            name: tensor.name().to_string(),
            ops: std::mem::take(&mut pending),
            src,
            dst,
            loops: LoopPlan::from_stage(stage),
        });
        src = dst;
    }

    let params = args
        .iter()
        .map(|a| Param {
            name: a.name().to_string(),
            shape: a.shape().to_vec(),
            dtype: a.dtype(),
            role: if a.is_placeholder() {
                ParamRole::Input
            } else {
                ParamRole::Output
            },
        })
        .collect();

    Ok(LoweredFunc {
        name: name.to_string(),
        params,
        temps,
        passes,
        output_shape: output.shape().to_vec(),
    })
}

fn extent(shape: &[Expr]) -> String {
    if shape.is_empty() {
        return "1".to_string();
    }
    let dims: Vec<String> = shape.iter().map(|e| e.to_string()).collect();
    dims.join("*")
}

impl fmt::Display for LoweredFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| format!("{}: {}{}", p.name, p.dtype, format_shape(&p.shape)))
            .collect();
        writeln!(f, "func {}({}) {{", self.name, params.join(", "))?;

        for t in &self.temps {
            writeln!(f, "  allocate {}: {}{}", t.name, t.dtype, format_shape(&self.output_shape))?;
        }

        for pass in &self.passes {
            let total = extent(&self.output_shape);
            let mut depth = 1;
            let mut open = |f: &mut fmt::Formatter<'_>, kind: ForKind, var: &str, ext: String| -> fmt::Result {
                writeln!(f, "{}{} ({}, 0, {}) {{", "  ".repeat(depth), kind, var, ext)?;
                depth += 1;
                Ok(())
            };

            let index = match (pass.loops.fused, pass.loops.split) {
                (true, Some(split)) => {
                    open(f, split.outer, "i.outer", format!("ceildiv({}, {})", total, split.factor))?;
                    open(f, split.inner, "i.inner", split.factor.to_string())?;
                    format!("i.outer*{} + i.inner", split.factor)
                }
                (true, None) => {
                    open(f, pass.loops.outer, "i", total)?;
                    "i".to_string()
                }
                (false, _) => {
                    for (axis, dim) in self.output_shape.iter().enumerate() {
                        let kind = if axis == 0 { pass.loops.outer } else { ForKind::Serial };
                        open(f, kind, &format!("ax{}", axis), dim.to_string())?;
                    }
                    let axes: Vec<String> = (0..self.output_shape.len()).map(|a| format!("ax{}", a)).collect();
                    axes.join(", ")
                }
            };

            let mut body = format!("{}[{}]", self.slot_name(pass.src), index);
            for op in &pass.ops {
                body = op.render(&body);
            }
            writeln!(f, "{}{}[{}] = {}", "  ".repeat(depth), self.slot_name(pass.dst), index, body)?;

            for level in (1..depth).rev() {
                writeln!(f, "{}}}", "  ".repeat(level))?;
            }
        }

        write!(f, "}}")
    }
}
