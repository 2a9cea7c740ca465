pub mod convert;

mod env;
pub use env::*;

#[cfg(test)]
mod utils_test;
