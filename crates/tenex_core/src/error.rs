use crate::{
    device::{Device, Target},
    dtype::DType,
};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    DTypeMismatch {
        expected: DType,
        got: DType,
    },
    DeviceMismatch {
        expected: Device,
        got: Device,
    },
    UnsupportedDType {
        op: String,
        dtype: DType,
    },
    UnsupportedDevice(Device),
    InvalidArgument(String),
    InvalidDevice(String),
    InvalidTarget(String),
    TargetUnavailable(Target),
    NoTarget,
    InvalidSchedule(String),
    //
    InvalidShape {
        message: String,
    },
    ShapeMismatch {
        expected: String,
        got: String,
        msg: String,
    },
    DimensionMismatch {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    UnboundVariable(String),
    NotConstant(String),
    // verification
    NameMismatch {
        expected: String,
        got: String,
    },
    NumericMismatch {
        target: Option<Target>,
        mismatched: usize,
        total: usize,
        index: usize,
        actual: f64,
        expected: f64,
    },
    //
    Internal {
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DTypeMismatch { expected, got } => {
                write!(f, "DType mismatch: expected {}, got {}", expected, got)
            }
            Self::DeviceMismatch { expected, got } => {
                write!(f, "Device mismatch: expected {}, got {}", expected, got)
            }
            Self::UnsupportedDType { op, dtype } => write!(f, "Unsupported data type {} for {}", dtype, op),
            Self::UnsupportedDevice(device) => write!(f, "Unsupported device: {}", device),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::InvalidDevice(msg) => write!(f, "Invalid device: {}", msg),
            Self::InvalidTarget(name) => write!(f, "Invalid target: '{}'", name),
            Self::TargetUnavailable(target) => write!(f, "No backend registered for target {}", target),
            Self::NoTarget => write!(f, "No current target; wrap the call in a TargetGuard"),
            Self::InvalidSchedule(msg) => write!(f, "Invalid schedule: {}", msg),

            Self::InvalidShape { message } => {
                write!(f, "Invalid shape: {}", message)
            }
            Self::ShapeMismatch { expected, got, msg } => {
                write!(f, "Shape mismatch ({}): expected {}, got {}", msg, expected, got)
            }
            Self::DimensionMismatch { expected, got } => {
                write!(f, "Dimension mismatch: expected {:?}, got {:?}", expected, got)
            }
            Self::UnboundVariable(name) => write!(f, "Unbound variable '{}'", name),
            Self::NotConstant(expr) => write!(f, "Expression '{}' is not a constant", expr),

            Self::NameMismatch { expected, got } => {
                write!(f, "Operator name mismatch: expected '{}', got '{}'", expected, got)
            }
            Self::NumericMismatch {
                target,
                mismatched,
                total,
                index,
                actual,
                expected,
            } => {
                if let Some(target) = target {
                    write!(f, "[{}] ", target)?;
                }
                write!(
                    f,
                    "Not close: {}/{} elements mismatched; worst at index {}: actual {}, expected {}",
                    mismatched, total, index, actual, expected
                )
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Attaches the target a numeric comparison ran on. Other errors pass through.
    pub fn on_target(self, on: Target) -> Self {
        match self {
            Self::NumericMismatch {
                mismatched,
                total,
                index,
                actual,
                expected,
                ..
            } => Self::NumericMismatch {
                target: Some(on),
                mismatched,
                total,
                index,
                actual,
                expected,
            },
            other => other,
        }
    }
}
