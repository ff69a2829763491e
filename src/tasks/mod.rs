pub mod solvency;

pub use solvency::{run_solvency_checker, SolvencyCheckerConfig};
