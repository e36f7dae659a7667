//! Symbolic integer expressions used for tensor shapes.
//!
//! A dimension is either a constant or a named [`Var`] that gets bound to a
//! concrete value when a compiled function is called.

use crate::{
    dtype::DType,
    error::{Error, Result},
};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);
static VAR_COUNTER: AtomicUsize = AtomicUsize::new(1);
#[inline]
fn next_var_id() -> VarId {
    VarId(VAR_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// A named symbolic integer. Two vars are the same only if they share an id,
/// regardless of name.
#[derive(Clone, Debug)]
pub struct Var {
    id: VarId,
    name: Arc<str>,
}

impl Var {
    pub fn new(name: &str) -> Self {
        Self {
            id: next_var_id(),
            name: Arc::from(name),
        }
    }

    pub fn id(&self) -> VarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Var {}

impl std::hash::Hash for Var {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

pub fn var(name: &str) -> Var {
    Var::new(name)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    Int { value: i64, dtype: DType },
    Var(Var),
}

impl Expr {
    /// An `int32` constant.
    pub fn int(value: i64) -> Self {
        Self::Int {
            value,
            dtype: DType::I32,
        }
    }

    pub fn constant(value: i64, dtype: DType) -> Result<Self> {
        if !dtype.is_int() {
            return Err(Error::UnsupportedDType {
                op: "const".to_string(),
                dtype,
            });
        }
        Ok(Self::Int { value, dtype })
    }

    pub fn as_const(&self) -> Option<i64> {
        match self {
            Self::Int { value, .. } => Some(*value),
            Self::Var(_) => None,
        }
    }

    pub fn as_var(&self) -> Option<&Var> {
        match self {
            Self::Var(v) => Some(v),
            Self::Int { .. } => None,
        }
    }

    pub fn evaluate(&self, bindings: &Bindings) -> Result<i64> {
        match self {
            Self::Int { value, .. } => Ok(*value),
            Self::Var(v) => bindings.get(v).ok_or_else(|| Error::UnboundVariable(v.name().to_string())),
        }
    }
}

impl From<i64> for Expr {
    fn from(value: i64) -> Self {
        Self::int(value)
    }
}

impl From<i32> for Expr {
    fn from(value: i32) -> Self {
        Self::int(value as i64)
    }
}

impl From<usize> for Expr {
    fn from(value: usize) -> Self {
        Self::int(value as i64)
    }
}

impl From<Var> for Expr {
    fn from(v: Var) -> Self {
        Self::Var(v)
    }
}

impl From<&Var> for Expr {
    fn from(v: &Var) -> Self {
        Self::Var(v.clone())
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { value, .. } => write!(f, "{}", value),
            Self::Var(v) => f.write_str(v.name()),
        }
    }
}

pub fn format_shape(shape: &[Expr]) -> String {
    let dims: Vec<String> = shape.iter().map(|e| e.to_string()).collect();
    format!("({})", dims.join(", "))
}

/// Concrete values for symbolic vars, collected while matching argument shapes.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    values: HashMap<VarId, (Arc<str>, i64)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, v: &Var) -> Option<i64> {
        self.values.get(&v.id).map(|(_, value)| *value)
    }

    /// Binds `v` to `value`. Rebinding to a different value is an error.
    pub fn bind(&mut self, v: &Var, value: i64) -> Result<()> {
        match self.values.get(&v.id) {
            Some((_, bound)) if *bound != value => Err(Error::InvalidShape {
                message: format!("variable '{}' bound to both {} and {}", v.name(), bound, value),
            }),
            Some(_) => Ok(()),
            None => {
                self.values.insert(v.id, (v.name.clone(), value));
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vars_compare_by_identity() {
        let a = var("n");
        let b = var("n");
        assert_ne!(a, b);
        assert_eq!(Expr::from(&a), Expr::from(a.clone()));
    }

    #[test]
    fn evaluate_requires_binding() -> Result<()> {
        let m = var("m");
        let mut bindings = Bindings::new();
        assert!(matches!(Expr::from(&m).evaluate(&bindings), Err(Error::UnboundVariable(_))));

        bindings.bind(&m, 20)?;
        assert_eq!(Expr::from(&m).evaluate(&bindings)?, 20);
        assert_eq!(Expr::int(3).evaluate(&bindings)?, 3);
        Ok(())
    }

    #[test]
    fn conflicting_binding_is_rejected() -> Result<()> {
        let m = var("m");
        let mut bindings = Bindings::new();
        bindings.bind(&m, 4)?;
        bindings.bind(&m, 4)?;
        assert!(bindings.bind(&m, 5).is_err());
        assert_eq!(bindings.len(), 1);
        Ok(())
    }

    #[test]
    fn float_constants_are_rejected() {
        assert!(Expr::constant(1, DType::F32).is_err());
    }

    #[test]
    fn shape_formatting() {
        let m = var("m");
        assert_eq!(format_shape(&[Expr::from(&m), Expr::int(3)]), "(m, 3)");
    }
}
