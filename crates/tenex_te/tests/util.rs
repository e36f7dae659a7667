use tenex_core::{
    error::{Error, Result},
    expr::{var, Expr},
};
use tenex_te::util::{get_const_int, get_const_tuple};

#[test]
fn const_int() -> Result<()> {
    assert_eq!(get_const_int(&Expr::int(100))?, 100);
    assert_eq!(get_const_int(&Expr::from(-7i64))?, -7);
    Ok(())
}

#[test]
fn const_tuple() -> Result<()> {
    let x = Expr::int(100);
    assert_eq!(get_const_tuple(&[x.clone(), x])?, vec![100, 100]);
    assert_eq!(get_const_tuple(&[])?, Vec::<i64>::new());
    Ok(())
}

#[test]
fn symbolic_dims_are_not_constant() {
    let n = var("n");
    match get_const_tuple(&[Expr::int(3), Expr::from(&n)]) {
        Err(Error::NotConstant(name)) => assert_eq!(name, "n"),
        other => panic!("expected NotConstant, got {:?}", other),
    }
}
