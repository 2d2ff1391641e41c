//! Tabular simulation output: loading and per-subplot slicing.

pub mod blocks;
pub mod table;
