pub mod analysis;
pub mod data;
pub mod rules;

pub use analysis::*;
pub use data::*;
pub use rules::*;
