mod builtin;
mod catalog;
mod matcher;

pub use builtin::*;
pub use catalog::*;
pub use matcher::*;
