//! Moment-matching solver: Newton iteration per point and the (k, σ) sweep.

pub mod newton;
pub mod sweep;
