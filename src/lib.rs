pub use tenex_internal::*;
