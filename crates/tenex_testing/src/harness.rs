use crate::{allclose::allclose, random, reference};
use rand::{rngs::StdRng, SeedableRng};
use std::env;
use tenex_core::{
    device::{Target, TargetGuard},
    dtype::DType,
    error::{Error, Result},
    expr::{format_shape, var, Expr},
};
use tenex_te::{backend::backend_for_target, build, placeholder_with_dtype, schedule_injective, Context, NDArray, Tensor};

pub const SEED_ENV: &str = "TENEX_TEST_SEED";
pub const TARGETS_ENV: &str = "TENEX_TEST_TARGETS";

pub type OpFn = fn(&Tensor) -> Result<Tensor>;
pub type ReferenceFn = fn(f64) -> f64;

// ────────────────────────────────────────────────────────────────────────────
//  Cases
// ────────────────────────────────────────────────────────────────────────────

/// One operator to verify, with the range its inputs are drawn from
/// (before scaling).
#[derive(Clone, Copy)]
pub struct UnaryCase {
    op: OpFn,
    name: &'static str,
    reference: ReferenceFn,
    low: f64,
    high: f64,
    check_round: bool,
    skip_name_check: bool,
}

impl UnaryCase {
    pub fn new(op: OpFn, name: &'static str, reference: ReferenceFn, low: f64, high: f64) -> Self {
        Self {
            op,
            name,
            reference,
            low,
            high,
            check_round: false,
            skip_name_check: false,
        }
    }

    /// Move inputs off half-integers before comparing.
    pub fn check_round(mut self) -> Self {
        self.check_round = true;
        self
    }

    /// For composite operators, whose node name is not the one they lower to.
    pub fn skip_name_check(mut self) -> Self {
        self.skip_name_check = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn range(&self) -> (f64, f64) {
        (self.low, self.high)
    }

    pub fn is_round_sensitive(&self) -> bool {
        self.check_round
    }

    pub fn checks_name(&self) -> bool {
        !self.skip_name_check
    }
}

impl std::fmt::Debug for UnaryCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnaryCase")
            .field("name", &self.name)
            .field("range", &(self.low, self.high))
            .field("check_round", &self.check_round)
            .field("skip_name_check", &self.skip_name_check)
            .finish()
    }
}

/// The twelve standard operators with their sampling ranges.
pub fn default_cases() -> Vec<UnaryCase> {
    vec![
        UnaryCase::new(Tensor::floor, "floor", reference::floor, -100.0, 100.0),
        UnaryCase::new(Tensor::ceil, "ceil", reference::ceil, -100.0, 100.0),
        UnaryCase::new(Tensor::sign, "sign", reference::sign, -100.0, 100.0).skip_name_check(),
        UnaryCase::new(Tensor::trunc, "trunc", reference::trunc, -100.0, 100.0),
        UnaryCase::new(Tensor::abs, "fabs", reference::abs, -100.0, 100.0),
        UnaryCase::new(Tensor::round, "round", reference::round, -100.0, 100.0).check_round(),
        UnaryCase::new(Tensor::exp, "exp", reference::exp, -1.0, 1.0),
        UnaryCase::new(Tensor::tanh, "tanh", reference::tanh, -10.0, 10.0),
        UnaryCase::new(Tensor::sigmoid, "sigmoid", reference::sigmoid, -1.0, 1.0),
        UnaryCase::new(Tensor::log, "log", reference::log, 0.0, 100.0),
        UnaryCase::new(Tensor::sqrt, "sqrt", reference::sqrt, 0.0, 100.0),
        UnaryCase::new(Tensor::rsqrt, "rsqrt", reference::rsqrt, 0.0, 100.0).skip_name_check(),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
//  Config
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct HarnessConfig {
    pub shape: Vec<usize>,
    /// Applied to samples after drawing.
    pub scale: f64,
    pub rtol: f64,
    pub atol: f64,
    /// `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,
    /// Probed in order.
    pub targets: Vec<Target>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            shape: vec![20, 3],
            scale: 10.0,
            rtol: 1e-5,
            atol: 1e-5,
            seed: None,
            targets: Target::ALL.to_vec(),
        }
    }
}

impl HarnessConfig {
    /// Defaults, with the seed and target list taken from the environment when set.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(seed) = env::var(SEED_ENV) {
            let seed = seed
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::InvalidArgument(format!("{}={:?}: {}", SEED_ENV, seed, e)))?;
            config.seed = Some(seed);
        }
        if let Ok(targets) = env::var(TARGETS_ENV) {
            config.targets = targets
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<Result<Vec<Target>>>()?;
        }

        Ok(config)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
//  Harness
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarnessReport {
    pub ran: Vec<Target>,
    pub skipped: Vec<Target>,
}

fn is_enabled(target: Target) -> bool {
    Context::new(target.device_kind(), 0).exists() && backend_for_target(target).is_some()
}

/// Builds `case` for every enabled target in `config` and compares it with
/// the reference. Targets whose backend is missing are skipped.
pub fn check_unary(case: &UnaryCase, config: &HarnessConfig) -> Result<HarnessReport> {
    let mut rng = config.rng();
    let mut data = random::uniform(&config.shape, case.low, case.high, &mut rng)?;
    for v in data.iter_mut() {
        *v = (*v as f64 * config.scale) as f32;
    }
    check_unary_with_inputs(case, config, data)
}

/// Like [`check_unary`] on caller-supplied inputs laid out as `config.shape`.
/// The inputs are used as given: no scaling, but rounding-sensitive cases
/// still get their boundaries nudged.
pub fn check_unary_with_inputs(case: &UnaryCase, config: &HarnessConfig, mut data: Vec<f32>) -> Result<HarnessReport> {
    let size = config.shape.iter().product::<usize>();
    if data.len() != size {
        return Err(Error::ShapeMismatch {
            expected: format!("{:?}", config.shape),
            got: format!("{} elements", data.len()),
            msg: format!("inputs for {}", case.name),
        });
    }

    // one symbolic extent per dim, bound by the array at call time
    let dims: Vec<Expr> = (0..config.shape.len()).map(|i| Expr::from(var(&format!("n{}", i)))).collect();
    let a = placeholder_with_dtype(dims, "A", DType::F32)?;
    let b = (case.op)(&a)?;

    if b.shape() != a.shape() {
        return Err(Error::ShapeMismatch {
            expected: format_shape(a.shape()),
            got: format_shape(b.shape()),
            msg: format!("{} must preserve the input shape", case.name),
        });
    }
    if case.checks_name() {
        let got = b.op().canonical_name().unwrap_or_default();
        if got != case.name {
            return Err(Error::NameMismatch {
                expected: case.name.to_string(),
                got: got.to_string(),
            });
        }
    }

    if case.check_round {
        random::nudge_rounding_boundaries(&mut data);
    }
    // evaluated in f64, stored as f32 like the device output
    let expected: Vec<f64> = data.iter().map(|&x| (case.reference)(x as f64) as f32 as f64).collect();

    let mut report = HarnessReport::default();
    for &target in &config.targets {
        if !is_enabled(target) {
            tracing::info!("Skip because {} is not enabled", target);
            report.skipped.push(target);
            continue;
        }
        tracing::info!("Running on target: {}", target);

        let ctx = Context::new(target.device_kind(), 0);
        let _guard = TargetGuard::new(target);
        let s = schedule_injective(&[b.clone()])?;
        let module = build(&s, &[a.clone(), b.clone()], target, case.name)?;

        let mut input = NDArray::from_slice(&data, &config.shape, ctx)?;
        let mut output = NDArray::empty(&config.shape, DType::F32, ctx)?;
        module.call(&mut [&mut input, &mut output])?;

        allclose(&output.to_f64_vec()?, &expected, config.rtol, config.atol).map_err(|e| e.on_target(target))?;
        tracing::debug!(case = case.name, %target, "matched reference");
        report.ran.push(target);
    }

    Ok(report)
}
