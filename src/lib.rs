pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod plot;
pub mod solver;
pub mod surface;

pub use error::{KurticError, KurticResult};
