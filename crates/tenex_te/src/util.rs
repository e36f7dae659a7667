use tenex_core::{
    error::{Error, Result},
    expr::Expr,
};

/// The value of a constant integer expression.
pub fn get_const_int(expr: &Expr) -> Result<i64> {
    expr.as_const()
        .ok_or_else(|| Error::NotConstant(expr.to_string()))
}

/// Converts a shape made of constant expressions into plain integers.
pub fn get_const_tuple(exprs: &[Expr]) -> Result<Vec<i64>> {
    exprs.iter().map(get_const_int).collect()
}
