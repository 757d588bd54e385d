//! Exception clustering for records the matcher left behind

pub mod builder;
pub mod rules;

pub use builder::*;
pub use rules::*;
