pub mod unary;
