//! Re-export public algorithms.

pub mod cell_loop;

pub use cell_loop::{CellLoopStats, cell_loop};
