use crate::Tensor;
use tenex_core::{
    dtype::DType,
    error::{Error, Result},
};

/// Elementwise operator kinds, fixed when a compute node is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Floor,
    Ceil,
    Sign,
    Trunc,
    Abs,
    Round,
    Exp,
    Tanh,
    Sigmoid,
    Log,
    Sqrt,
    Rsqrt,
}

impl UnaryOp {
    pub const ALL: [UnaryOp; 12] = [
        UnaryOp::Floor,
        UnaryOp::Ceil,
        UnaryOp::Sign,
        UnaryOp::Trunc,
        UnaryOp::Abs,
        UnaryOp::Round,
        UnaryOp::Exp,
        UnaryOp::Tanh,
        UnaryOp::Sigmoid,
        UnaryOp::Log,
        UnaryOp::Sqrt,
        UnaryOp::Rsqrt,
    ];

    pub fn canonical_name(&self) -> &'static str {
        match self {
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Sign => "sign",
            Self::Trunc => "trunc",
            Self::Abs => "fabs",
            Self::Round => "round",
            Self::Exp => "exp",
            Self::Tanh => "tanh",
            Self::Sigmoid => "sigmoid",
            Self::Log => "log",
            Self::Sqrt => "sqrt",
            Self::Rsqrt => "rsqrt",
        }
    }

    /// Composite operators lower to more than one primitive and have no
    /// single intrinsic in the loop body.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Sign | Self::Rsqrt)
    }

    pub fn supports(&self, dtype: DType) -> bool {
        match self {
            Self::Abs | Self::Sign => true,
            _ => dtype.is_float(),
        }
    }

    /// Loop-body expression applying this operator to `operand`.
    pub fn render(&self, operand: &str) -> String {
        match self {
            Self::Sign => format!("select(({0} > 0), 1, select(({0} < 0), -1, 0))", operand),
            Self::Rsqrt => format!("(1 / sqrt({}))", operand),
            other => format!("{}({})", other.canonical_name(), operand),
        }
    }
}

macro_rules! unary_ops {
    ($($(#[$meta:meta])* $method:ident => $kind:ident),* $(,)?) => {
        impl Tensor {
            $(
                $(#[$meta])*
                pub fn $method(&self) -> Result<Tensor> {
                    self.apply(UnaryOp::$kind)
                }
            )*
        }
    };
}

impl Tensor {
    pub fn apply(&self, kind: UnaryOp) -> Result<Tensor> {
        if !kind.supports(self.dtype()) {
            return Err(Error::UnsupportedDType {
                op: kind.canonical_name().to_string(),
                dtype: self.dtype(),
            });
        }
        Ok(Tensor::compute(kind, self))
    }
}

unary_ops!(
    floor => Floor,
    ceil => Ceil,
    /// `-1`, `0` or `1` by the sign of each element. Also defined for integers.
    sign => Sign,
    trunc => Trunc,
    /// Also defined for integers.
    abs => Abs,
    /// Rounds half to even.
    round => Round,
    exp => Exp,
    tanh => Tanh,
    /// `1 / (1 + exp(-x))`
    sigmoid => Sigmoid,
    /// Natural logarithm.
    log => Log,
    sqrt => Sqrt,
    /// `1 / sqrt(x)`
    rsqrt => Rsqrt,
);
