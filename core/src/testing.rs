pub mod bounded;
pub mod result;
pub mod runner;
pub mod testcase;

pub use bounded::*;
pub use result::*;
pub use runner::*;
pub use testcase::*;
