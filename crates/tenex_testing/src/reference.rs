//! Host reference implementations, evaluated in f64.

use tenex_te::UnaryOp;

pub fn floor(x: f64) -> f64 {
    x.floor()
}

pub fn ceil(x: f64) -> f64 {
    x.ceil()
}

/// `0` for zero, NaN for NaN.
pub fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

pub fn trunc(x: f64) -> f64 {
    x.trunc()
}

pub fn abs(x: f64) -> f64 {
    x.abs()
}

/// Half to even.
pub fn round(x: f64) -> f64 {
    x.round_ties_even()
}

pub fn exp(x: f64) -> f64 {
    x.exp()
}

pub fn tanh(x: f64) -> f64 {
    x.tanh()
}

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub fn log(x: f64) -> f64 {
    x.ln()
}

pub fn sqrt(x: f64) -> f64 {
    x.sqrt()
}

pub fn rsqrt(x: f64) -> f64 {
    1.0 / x.sqrt()
}

pub fn for_op(op: UnaryOp) -> fn(f64) -> f64 {
    match op {
        UnaryOp::Floor => floor,
        UnaryOp::Ceil => ceil,
        UnaryOp::Sign => sign,
        UnaryOp::Trunc => trunc,
        UnaryOp::Abs => abs,
        UnaryOp::Round => round,
        UnaryOp::Exp => exp,
        UnaryOp::Tanh => tanh,
        UnaryOp::Sigmoid => sigmoid,
        UnaryOp::Log => log,
        UnaryOp::Sqrt => sqrt,
        UnaryOp::Rsqrt => rsqrt,
    }
}
