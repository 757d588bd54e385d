//! Four-pass matching pipeline over the two transaction lists

pub mod engine;
pub mod state;

pub use engine::*;
pub use state::*;
