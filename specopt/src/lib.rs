//! Variant enumeration and scoring for choosing speculation offsets.

mod optimizer;
mod variants;

pub use optimizer::{Evaluable, SimpleOptimizer};
pub use variants::VariantsGenerator;
