pub mod be;
pub mod buffer;
pub mod device;
pub mod dtype;
pub mod error;
pub mod expr;
pub mod layout;

pub use tenex_cpu as cpu;
