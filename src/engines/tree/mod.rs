//! Tree-based pricing engines.

pub mod binomial;
pub mod discrete_div_tree;

pub use binomial::LatticePricer;
pub use discrete_div_tree::{DiscreteDividendTree, RecombiningTree};
